use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use autocams::app::App;
use autocams::cli::Cli;
use autocams::config::Config;
use autocams::transfer::connect_remote;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config_path = match &cli.config {
        Some(p) => p.clone(),
        None => Config::default_path()?,
    };
    let app = App::init(Config::load(&config_path)?);

    if let Some(night_dir) = &cli.open {
        return app.open_viewer(night_dir);
    }

    if let Some(night_dir) = &cli.data_dir {
        let mut remote = connect_remote(&app.get_config().remote)?;
        match app.upload_single(remote.as_mut(), night_dir)? {
            Some(receipt) if receipt.verified => println!("Uploaded {}", receipt.remote_path),
            Some(receipt) => println!("Uploaded {} (checksum mismatch)", receipt.remote_path),
            None => println!("Nothing uploaded from {}", night_dir.display()),
        }
        return Ok(());
    }

    let stations = if cli.stations.is_empty() {
        app.get_config().default_stations()
    } else {
        cli.stations.clone()
    };
    if stations.is_empty() {
        anyhow::bail!("no stations given and none configured in {}", config_path.display());
    }
    let today = chrono::Local::now().date_naive();
    app.run_stations(&stations, today, cli.skip_confirmation)
}

/// stderr logging filtered by `RUST_LOG` (default info, debug with
/// `--verbose`), plus a plain file copy when `--log-file` is given. The guard
/// must live until exit so buffered file lines get flushed.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().context("--log-file needs a file name")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();
    Ok(guard)
}
