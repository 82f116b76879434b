//! Month reconciliation: decides per night directory whether it is already
//! on the server, must be confirmed by a human first, can go up unattended,
//! or is confirmed and ready, and assigns per-day sequence ids to uploads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::archive;
use crate::config::Config;
use crate::confirm::{Prompt, Viewer};
use crate::error::is_recoverable;
use crate::night::{NightDir, list_month_dirs};
use crate::report::{ReportLookup, count_detections, resolve_viewer_report};
use crate::station::resolve_cams_id;
use crate::transfer::{RemoteStore, list_uploaded_days, upload_archive};
use crate::util::{print_month_summary, print_to_be_confirmed};

/// Per-day sequence ids for one run. Not persisted: a rerun starts at 1 and
/// relies on the remote listing to avoid duplicates.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    counts: BTreeMap<NaiveDate, u32>,
}

impl SequenceCounter {
    /// Increment the counter of `date` and return the new value (1 on first use).
    pub fn bump(&mut self, date: NaiveDate) -> u32 {
        let c = self.counts.entry(date).or_insert(0);
        *c += 1;
        *c
    }

    pub fn current(&self, date: NaiveDate) -> u32 {
        self.counts.get(&date).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Archived,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NightOutcome {
    /// The night's day is already on the server; only the counter moved
    AlreadyUploaded { sequence_id: u32 },
    /// Also present in ConfirmedFiles, left for the confirmed pass
    LeftForConfirmedPass,
    Uploaded { archive: String, sequence_id: u32, verified: bool },
    /// Packaging found no calibration file or no single report
    NotPackaged { reason: String },
    /// Report count unavailable, night left alone
    CountUnknown,
    Declined { detections: u32 },
    ViewerLaunched { detections: u32 },
    /// The viewer's input report did not resolve to exactly one file
    ViewerReportUnresolved { candidates: usize },
    EmptyDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightRecord {
    pub name: String,
    pub pass: Pass,
    pub outcome: NightOutcome,
}

#[derive(Debug, Clone)]
pub struct MonthSummary {
    pub station: String,
    pub year: i32,
    pub month: u32,
    pub cams_id: u32,
    pub uploaded_days: BTreeSet<u32>,
    pub nights: Vec<NightRecord>,
}

impl MonthSummary {
    /// Archive names uploaded during this run, in upload order.
    pub fn uploaded_archives(&self) -> Vec<&str> {
        self.nights
            .iter()
            .filter_map(|n| match &n.outcome {
                NightOutcome::Uploaded { archive, .. } => Some(archive.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Nights still waiting for a human after this run.
    pub fn pending(&self) -> usize {
        self.nights
            .iter()
            .filter(|n| {
                matches!(
                    n.outcome,
                    NightOutcome::Declined { .. } | NightOutcome::ViewerReportUnresolved { .. }
                )
            })
            .count()
    }

    pub fn outcome_of(&self, name: &str, pass: Pass) -> Option<&NightOutcome> {
        self.nights.iter().find(|n| n.name == name && n.pass == pass).map(|n| &n.outcome)
    }
}

/// Drives one station/month through the review and upload workflow over a
/// single remote session.
pub struct Reconciler<'a> {
    config: &'a Config,
    remote: &'a mut dyn RemoteStore,
    prompt: &'a mut dyn Prompt,
    viewer: &'a dyn Viewer,
    skip_confirmation: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        config: &'a Config,
        remote: &'a mut dyn RemoteStore,
        prompt: &'a mut dyn Prompt,
        viewer: &'a dyn Viewer,
    ) -> Self {
        Self { config, remote, prompt, viewer, skip_confirmation: false }
    }

    /// Treat archived nights as confirmed: no prompts, everything not yet on
    /// the server is uploaded.
    pub fn skip_confirmation(mut self, skip: bool) -> Self {
        self.skip_confirmation = skip;
        self
    }

    pub fn reconcile_month(&mut self, year: i32, month: u32, station: &str) -> Result<MonthSummary> {
        let cams_id = resolve_cams_id(&self.config.rms_dir, station)?;
        let uploaded_days =
            list_uploaded_days(&mut *self.remote, &self.config.remote.base_dir, cams_id, year, month)?;
        tracing::info!(
            "{} {}-{:02}: CAMS id {:06}, days on server {:?}",
            station,
            year,
            month,
            cams_id,
            uploaded_days
        );

        let mut summary = MonthSummary {
            station: station.to_string(),
            year,
            month,
            cams_id,
            uploaded_days,
            nights: Vec::new(),
        };
        let mut sequences = SequenceCounter::default();
        let archived_root = self.config.archived_dir();
        let confirmed_root = self.config.confirmed_dir();

        if !self.skip_confirmation {
            let confirmed = list_month_dirs(&confirmed_root, station, year, month);
            for name in list_month_dirs(&archived_root, station, year, month) {
                let night = NightDir::from_path(&archived_root.join(&name))?;
                let outcome = if summary.uploaded_days.contains(&night.date().day()) {
                    NightOutcome::AlreadyUploaded { sequence_id: sequences.bump(night.date()) }
                } else if confirmed.contains(&name) {
                    NightOutcome::LeftForConfirmedPass
                } else {
                    self.review_archived(&night, station, cams_id, &mut sequences)?
                };
                tracing::debug!("{}: {:?}", name, outcome);
                summary.nights.push(NightRecord { name, pass: Pass::Archived, outcome });
            }
        }

        // listed again: the viewer may have confirmed nights during the first pass
        let ready_root = if self.skip_confirmation { &archived_root } else { &confirmed_root };
        for name in list_month_dirs(ready_root, station, year, month) {
            let night = NightDir::from_path(&ready_root.join(&name))?;
            let outcome = self.upload_confirmed(&night, cams_id, &summary.uploaded_days, &mut sequences)?;
            tracing::debug!("{}: {:?}", name, outcome);
            summary.nights.push(NightRecord { name, pass: Pass::Confirmed, outcome });
        }

        print_month_summary(station, year, month, summary.uploaded_archives().len(), summary.pending());
        Ok(summary)
    }

    fn review_archived(
        &mut self,
        night: &NightDir,
        station: &str,
        cams_id: u32,
        sequences: &mut SequenceCounter,
    ) -> Result<NightOutcome> {
        let detections = match count_detections(&night.path, cams_id)? {
            Some(0) => {
                tracing::info!("Uploading zero: {}", night.name);
                let sequence_id = sequences.bump(night.date());
                return self.package_and_upload(night, cams_id, sequence_id);
            }
            Some(n) => n,
            None => return Ok(NightOutcome::CountUnknown),
        };

        print_to_be_confirmed(&night.path, detections);
        if !self.prompt.confirm("Confirm now?")? {
            return Ok(NightOutcome::Declined { detections });
        }
        match resolve_viewer_report(&night.path, station) {
            ReportLookup::Found(report) => {
                self.viewer.confirm_night(&night.path, &report)?;
                Ok(NightOutcome::ViewerLaunched { detections })
            }
            other => {
                let candidates = match other {
                    ReportLookup::Ambiguous(ps) => ps.len(),
                    _ => 0,
                };
                println!("{} viewer report candidates in {}", candidates, night.name);
                tracing::warn!("not starting viewer for {}: {} report candidates", night.name, candidates);
                Ok(NightOutcome::ViewerReportUnresolved { candidates })
            }
        }
    }

    fn upload_confirmed(
        &mut self,
        night: &NightDir,
        cams_id: u32,
        uploaded_days: &BTreeSet<u32>,
        sequences: &mut SequenceCounter,
    ) -> Result<NightOutcome> {
        if night.is_empty()? {
            // CMN_binviewer sometimes leaves empty directories behind
            tracing::info!("Skipping {} because it's empty", night.name);
            return Ok(NightOutcome::EmptyDirectory);
        }
        let sequence_id = sequences.bump(night.date());
        let detections = count_detections(&night.path, cams_id)?;
        if uploaded_days.contains(&night.date().day()) {
            return Ok(NightOutcome::AlreadyUploaded { sequence_id });
        }
        match detections {
            Some(n) => tracing::info!("Uploading {} ({} detections)", night.name, n),
            None => tracing::info!("Uploading {} (unknown detections)", night.name),
        }
        self.package_and_upload(night, cams_id, sequence_id)
    }

    fn package_and_upload(
        &mut self,
        night: &NightDir,
        cams_id: u32,
        sequence_id: u32,
    ) -> Result<NightOutcome> {
        let archive = match archive::package(night, cams_id, sequence_id) {
            Ok(p) => p,
            Err(e) if is_recoverable(&e) => {
                tracing::warn!("not uploading {}: {}", night.name, e);
                return Ok(NightOutcome::NotPackaged { reason: e.to_string() });
            }
            Err(e) => return Err(e),
        };
        let receipt = upload_archive(&mut *self.remote, &self.config.remote, &archive, &night.start)?;
        Ok(NightOutcome::Uploaded {
            archive: archive_name(&archive),
            sequence_id,
            verified: receipt.verified,
        })
    }
}

fn archive_name(p: &Path) -> String {
    p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}
