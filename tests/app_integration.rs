mod common;

use autocams::app::App;
use chrono::NaiveDate;
use common::*;

#[test]
fn station_run_covers_last_and_current_month() {
    let root = rms_root();
    make_night(root.path(), NightFixture::archived("AB1234_20231231_170000_000001", 0));
    make_night(root.path(), NightFixture::archived("AB1234_20240101_170000_000001", 0));
    make_night(root.path(), NightFixture::archived("AB1234_20231130_170000_000001", 0));
    let app = App::init(test_config(root.path()));
    let mut remote = MemoryRemote::new();
    let mut prompt = ScriptedPrompt::new(&[]);
    let viewer = RecordingViewer::default();
    let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

    let summaries = app
        .reconcile_station(&mut remote, &mut prompt, &viewer, STATION, today, false)
        .unwrap();

    let months: Vec<(i32, u32)> = summaries.iter().map(|s| (s.year, s.month)).collect();
    assert_eq!(months, vec![(2023, 12), (2024, 1)]);
    assert_eq!(summaries[0].uploaded_archives(), vec!["2023_12_31_000371_17_00_00_01.zip"]);
    assert_eq!(summaries[1].uploaded_archives(), vec!["2024_01_01_000371_17_00_00_01.zip"]);
    assert_eq!(remote.stores.len(), 2);
}

#[test]
fn single_directory_upload_uses_configured_cams_id() {
    let root = rms_root();
    let dir = make_night(root.path(), NightFixture::archived("AB1234_20240305_180000_000001", 6));
    let mut cfg = test_config(root.path());
    // the fixture's files are numbered with the station's real id
    cfg.cams_id = Some(CAMS_ID);
    let app = App::init(cfg);
    let mut remote = MemoryRemote::new();

    let receipt = app.upload_single(&mut remote, &dir).unwrap().unwrap();
    assert_eq!(receipt.remote_path, "/incoming/2024_03_05_000371_18_00_00_01.zip");
    assert!(receipt.verified);
}

#[test]
fn single_directory_upload_resolves_cams_id_from_station() {
    let root = rms_root();
    let dir = make_night(root.path(), NightFixture::archived("AB1234_20240305_180000_000001", 6));
    let app = App::init(test_config(root.path()));
    let mut remote = MemoryRemote::new();

    let receipt = app.upload_single(&mut remote, &dir).unwrap();
    assert!(receipt.is_some());
}

#[test]
fn single_directory_without_calibration_uploads_nothing() {
    let root = rms_root();
    let dir = make_night(
        root.path(),
        NightFixture { calibration: false, ..NightFixture::archived("AB1234_20240305_180000_000001", 6) },
    );
    let app = App::init(test_config(root.path()));
    let mut remote = MemoryRemote::new();

    assert!(app.upload_single(&mut remote, &dir).unwrap().is_none());
    assert!(remote.stores.is_empty());
}
