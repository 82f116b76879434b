use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::archive;
use crate::config::Config;
use crate::confirm::{BinViewer, Prompt, StdinPrompt, Viewer};
use crate::error::is_recoverable;
use crate::night::NightDir;
use crate::parse::{months_to_reconcile, parse_night_station};
use crate::reconcile::{MonthSummary, Reconciler};
use crate::station::resolve_cams_id;
use crate::transfer::{RemoteStore, UploadReceipt, connect_remote, upload_archive};

pub struct App {
    config: Config,
}

impl App {
    pub fn init(config: Config) -> Self {
        Self { config }
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Reconcile last month and this month for every station, each over its
    /// own SFTP session. A failing station is logged and the others still
    /// run; the result is an error if any station failed.
    pub fn run_stations(
        &self,
        stations: &[String],
        today: NaiveDate,
        skip_confirmation: bool,
    ) -> Result<()> {
        let viewer = BinViewer::new(&self.config.viewer_path);
        let mut prompt = StdinPrompt;
        let mut failed = Vec::new();
        for station in stations {
            let result = connect_remote(&self.config.remote).and_then(|mut remote| {
                self.reconcile_station(
                    remote.as_mut(),
                    &mut prompt,
                    &viewer,
                    station,
                    today,
                    skip_confirmation,
                )
            });
            if let Err(e) = result {
                tracing::error!("station {} failed: {:#}", station, e);
                failed.push(station.as_str());
            }
        }
        if !failed.is_empty() {
            anyhow::bail!("stations failed: {}", failed.join(", "));
        }
        Ok(())
    }

    /// Reconcile the month before `today` and the month of `today` for one
    /// station. An error in the first month stops the station.
    pub fn reconcile_station(
        &self,
        remote: &mut dyn RemoteStore,
        prompt: &mut dyn Prompt,
        viewer: &dyn Viewer,
        station: &str,
        today: NaiveDate,
        skip_confirmation: bool,
    ) -> Result<Vec<MonthSummary>> {
        let mut summaries = Vec::new();
        for (year, month) in months_to_reconcile(today) {
            let mut reconciler = Reconciler::new(&self.config, &mut *remote, &mut *prompt, viewer)
                .skip_confirmation(skip_confirmation);
            let summary = reconciler
                .reconcile_month(year, month, station)
                .with_context(|| format!("{} {}-{:02}", station, year, month))?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Package and upload a single night directory as sequence 1, without
    /// any remote duplicate check. Returns `None` when the night cannot be
    /// packaged.
    pub fn upload_single(
        &self,
        remote: &mut dyn RemoteStore,
        night_dir: &Path,
    ) -> Result<Option<UploadReceipt>> {
        let night = NightDir::from_path(night_dir)?;
        let cams_id = match self.config.cams_id {
            Some(id) => id,
            None => resolve_cams_id(&self.config.rms_dir, &parse_night_station(&night.name)?)?,
        };
        let archive = match archive::package(&night, cams_id, 1) {
            Ok(p) => p,
            Err(e) if is_recoverable(&e) => {
                tracing::warn!("not uploading {}: {}", night.name, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        upload_archive(remote, &self.config.remote, &archive, &night.start).map(Some)
    }

    /// Start the viewer on a night directory for manual review.
    pub fn open_viewer(&self, night_dir: &Path) -> Result<()> {
        BinViewer::new(&self.config.viewer_path).open_night(night_dir)
    }
}

pub(crate) trait StorageObject {
    fn pretty_json(&self) -> Result<String>;
    fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()>
    where
        Self: Serialize;
    fn read_from<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T>;
}

impl<T: Serialize> StorageObject for T {
    fn pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("cannot serialize to JSON")
    }

    fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.pretty_json()?)
            .with_context(|| format!("cannot write {}", path.display()))
    }

    fn read_from<R: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<R> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str::<R>(&text).with_context(|| format!("cannot parse {}", path.display()))
    }
}
