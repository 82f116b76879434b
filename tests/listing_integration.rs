mod common;

use autocams::transfer::list_uploaded_days;
use common::*;

fn days(remote: &mut MemoryRemote, year: i32, month: u32) -> Vec<u32> {
    list_uploaded_days(remote, BASE_DIR, CAMS_ID, year, month).unwrap().into_iter().collect()
}

#[test]
fn root_only_when_year_dir_missing() {
    let mut remote = MemoryRemote::new();
    remote.add_file(BASE_DIR, "2024_03_05_000371_18_00_00_01.zip");
    remote.add_file(BASE_DIR, "20240307_000371_18_00_00_01.zip");
    // other station, other month, not a zip
    remote.add_file(BASE_DIR, "2024_03_08_000372_18_00_00_01.zip");
    remote.add_file(BASE_DIR, "2024_04_09_000371_18_00_00_01.zip");
    remote.add_file(BASE_DIR, "2024_03_10_000371_18_00_00_01.txt");

    assert_eq!(days(&mut remote, 2024, 3), vec![5, 7]);
}

#[test]
fn all_three_levels_are_scanned() {
    let mut remote = MemoryRemote::new();
    remote.add_file(BASE_DIR, "2024_03_01_000371_18_00_00_01.zip");
    remote.add_file("/incoming/2024", "2024_03_02_000371_18_00_00_01.zip");
    remote.add_file("/incoming/2024/2024_03", "2024_03_03_000371_18_00_00_01.zip");
    remote.add_file("/incoming/2024/2024_03", "2024_03_03_000371_22_00_00_02.zip");
    // archives for this month in a sibling month dir are not looked at
    remote.add_file("/incoming/2024/2024_04", "2024_03_04_000371_18_00_00_01.zip");

    assert_eq!(days(&mut remote, 2024, 3), vec![1, 2, 3]);
}

#[test]
fn month_dir_missing_keeps_year_results() {
    let mut remote = MemoryRemote::new();
    remote.add_dir("/incoming/2024");
    remote.add_file("/incoming/2024", "2024_12_24_000371_18_00_00_01.zip");

    assert_eq!(days(&mut remote, 2024, 12), vec![24]);
}

#[test]
fn empty_server_gives_empty_set() {
    let mut remote = MemoryRemote::new();
    assert!(days(&mut remote, 2024, 3).is_empty());
}

#[test]
fn missing_base_dir_is_an_error() {
    let mut remote = MemoryRemote::new();
    assert!(list_uploaded_days(&mut remote, "/absent", CAMS_ID, 2024, 3).is_err());
}
