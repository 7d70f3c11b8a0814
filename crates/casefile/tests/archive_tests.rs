//! Archive and unarchive against a directory-backed store.

mod common;

use chrono::{Local, TimeZone};

use casefile::archive::{archive_child_name, ArchiveScope};
use common::*;

fn seed_case(harness: &TestHarness) {
    harness.seed(
        "RS3-24-0001",
        FolderBuilder::new()
            .record("New RS3: RS3-24-0001 RFP")
            .pdf("RFP.pdf", "body")
            .pdf("RS3-24-0001-report.pdf", "report"),
    );
    harness.put("RS3-24-0001/attachments/map.pdf", &pdf("map"));
}

// ── Archive ──

#[test]
fn test_archive_root_files_leaves_subfolders() {
    let harness = TestHarness::new();
    seed_case(&harness);
    let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();

    let report = harness
        .archiver()
        .archive_at("RS3-24-0001", ArchiveScope::RootFiles, &at)
        .unwrap();

    assert_eq!(report.moved.len(), 3);
    assert!(report.failures.is_empty());
    let keys = harness.keys("RS3-24-0001/");
    assert!(keys.contains(&"RS3-24-0001/03-05-2024-1407-archive/RFP.pdf".to_string()));
    assert!(keys.contains(&"RS3-24-0001/attachments/map.pdf".to_string()));
}

#[test]
fn test_archive_with_subfolders_nests_them() {
    let harness = TestHarness::new();
    seed_case(&harness);
    let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
    let child = archive_child_name(&at);

    harness
        .archiver()
        .archive_at("RS3-24-0001/", ArchiveScope::WithSubfolders, &at)
        .unwrap();

    let keys = harness.keys("RS3-24-0001/");
    assert_eq!(keys.len(), 4);
    assert!(keys.contains(&format!("RS3-24-0001/{}attachments/map.pdf", child)));
}

#[test]
fn test_archive_twice_in_same_minute_renames() {
    let harness = TestHarness::new();
    harness.put("A/RFP.pdf", b"one");
    let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
    let archiver = harness.archiver();

    archiver.archive_at("A", ArchiveScope::RootFiles, &at).unwrap();
    harness.put("A/RFP.pdf", b"two");
    let second = archiver.archive_at("A", ArchiveScope::RootFiles, &at).unwrap();

    assert_eq!(second.moved[0].1, "A/03-05-2024-1407-archive/RFP_2.pdf");
}

// ── Unarchive ──

#[test]
fn test_archive_then_unarchive_keeps_report_archived() {
    let harness = TestHarness::new();
    seed_case(&harness);
    let archiver = harness.archiver();

    archiver.archive("RS3-24-0001", ArchiveScope::RootFiles).unwrap();
    let report = archiver.unarchive("RS3-24-0001").unwrap();

    assert_eq!(report.moved.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    let keys = harness.keys("RS3-24-0001/");
    assert!(keys.contains(&"RS3-24-0001/email.json".to_string()));
    assert!(keys.contains(&"RS3-24-0001/RFP.pdf".to_string()));
    assert!(keys.iter().any(|k| k.contains("-archive/") && k.ends_with("-report.pdf")));
}

#[test]
fn test_unarchive_without_archive_is_noop() {
    let harness = TestHarness::new();
    harness.put("A/RFP.pdf", b"x");

    let report = harness.archiver().unarchive("A").unwrap();

    assert!(report.moved.is_empty());
    assert_eq!(harness.keys("A/"), vec!["A/RFP.pdf".to_string()]);
}

// ── Bulk ──

#[test]
fn test_archive_all_then_unarchive_first_folder() {
    let harness = TestHarness::new();
    harness.put("A/a.pdf", b"a");
    harness.put("B/b.pdf", b"b");
    let archiver = harness.archiver();

    let archived = archiver.archive_all().unwrap();
    assert_eq!(archived.moved.len(), 2);

    let restored = archiver.unarchive_folders(1).unwrap();
    assert_eq!(restored.moved.len(), 1);
    assert_eq!(harness.keys("A/"), vec!["A/a.pdf".to_string()]);
    assert!(harness.keys("B/")[0].contains("-archive/"));
}
