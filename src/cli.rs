use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Confirm RMS meteor nights and upload them to the CAMS server", long_about = None)]
pub struct Cli {
    #[clap(help = "RMS station ids (default: `stations` from the config file)")]
    pub stations: Vec<String>,
    #[clap(short, long, help = "Config file (default: ~/.autocams/config.json)")]
    pub config: Option<PathBuf>,
    #[clap(short, long, help = "Skip confirmation, upload all ArchivedFiles")]
    pub skip_confirmation: bool,
    #[clap(
        short,
        long,
        conflicts_with_all = ["stations", "open"],
        help = "Just upload this night directory"
    )]
    pub data_dir: Option<PathBuf>,
    #[clap(long, conflicts_with = "stations", help = "Open a night directory in the viewer (-c)")]
    pub open: Option<PathBuf>,
    #[clap(short, long, help = "Debug logging")]
    pub verbose: bool,
    #[clap(long, help = "Also write the log to this file")]
    pub log_file: Option<PathBuf>,
}
