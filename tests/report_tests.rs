//! Integration tests for run report I/O.

use chrono::Utc;
use site_rollback::models::result::{
    load_report, save_report, PreventiveBackupRecord, RollbackOutcome, RollbackResult, Step,
    StepOutcome, StepRecord,
};
use tempfile::TempDir;

fn sample_result() -> RollbackResult {
    let now = Utc::now();
    RollbackResult {
        run_id: uuid::Uuid::new_v4(),
        site_name: "shop".to_string(),
        outcome: RollbackOutcome::Failed,
        failed_step: Some(Step::Replacing),
        error: Some("copy into /srv/www/shop failed: short write".to_string()),
        started_at: now,
        finished_at: now,
        backup_kind: Some(site_rollback::models::result::BackupKind::Archive),
        preventive_backup: Some(PreventiveBackupRecord {
            path: "/srv/backups/shop/pre_rollback_20240101_000000".to_string(),
            created_at: now,
            site_was_empty: false,
        }),
        staging_used: true,
        steps: vec![StepRecord {
            step: Step::Locating,
            started_at: now,
            finished_at: now,
            outcome: StepOutcome::Ok,
        }],
    }
}

#[test]
fn test_save_load_report() {
    let result = sample_result();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("reports").join("run.json");

    save_report(&result, &path).unwrap();
    assert!(path.exists());

    let loaded = load_report(&path).unwrap();
    assert_eq!(loaded.run_id, result.run_id);
    assert_eq!(loaded.outcome, RollbackOutcome::Failed);
    assert_eq!(loaded.failed_step, Some(Step::Replacing));
    assert_eq!(
        loaded.preventive_backup.unwrap().path,
        result.preventive_backup.unwrap().path
    );
    assert_eq!(loaded.steps.len(), 1);
}

#[test]
fn test_load_rejects_malformed_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = load_report(&path).unwrap_err();
    assert!(matches!(err, site_rollback::Error::InvalidReportFile(_)));
}

#[test]
fn test_load_missing_report_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nope.json");

    let err = load_report(&path).unwrap_err();
    assert!(matches!(err, site_rollback::Error::Io(_)));
}
