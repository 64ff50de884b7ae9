//! End-to-end behavior of tracker creation and read recording against a
//! real SQLite file.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use mailtrack::db::{read_log_repo, tracker_repo};
use mailtrack::{Database, ReadOutcome, ReadRecorder, TrackError};
use tempfile::TempDir;

fn file_recorder() -> (TempDir, std::path::PathBuf, ReadRecorder) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("emails.db");
    let db = Database::open(&path).expect("Failed to open database");
    (dir, path, ReadRecorder::new(db))
}

#[test]
fn test_open_dedup_scenario() {
    let (_dir, _path, recorder) = file_recorder();

    recorder.create_tracker("abc", "1.1.1.1").unwrap();

    assert_eq!(
        recorder.track_pixel("abc", "1.1.1.1").unwrap(),
        ReadOutcome::SkippedOrigin
    );
    assert!(recorder.read_logs("abc").unwrap().is_empty());

    let first = recorder.track_pixel("abc", "2.2.2.2").unwrap();
    let second = recorder.track_pixel("abc", "2.2.2.2").unwrap();
    assert!(first.is_recorded());
    assert!(second.is_recorded());

    let logs = recorder.read_logs("abc").unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.ip == "2.2.2.2" && l.tracker_id == "abc"));
    assert!(logs[0].timestamp >= logs[1].timestamp);
    assert_ne!(logs[0].id, logs[1].id);

    if let ReadOutcome::Recorded(latest) = second {
        assert_eq!(logs[0], latest);
    }
}

#[test]
fn test_unknown_tracker_has_no_side_effects() {
    let (_dir, _path, recorder) = file_recorder();

    let err = recorder.track_pixel("nope", "2.2.2.2").unwrap_err();
    assert!(matches!(err, TrackError::NotFound(_)));

    let (trackers, logs): (u64, u64) = recorder
        .database()
        .with_conn(|conn| {
            let trackers = conn.query_row("SELECT COUNT(*) FROM emails", [], |r| r.get(0))?;
            let logs = conn.query_row("SELECT COUNT(*) FROM logs", [], |r| r.get(0))?;
            Ok((trackers, logs))
        })
        .unwrap();
    assert_eq!((trackers, logs), (0, 0));
}

#[test]
fn test_data_survives_reopen() {
    let (_dir, path, recorder) = file_recorder();
    recorder.create_tracker("abc", "1.1.1.1").unwrap();
    recorder.record_read("abc", "3.3.3.3").unwrap();
    drop(recorder);

    let reopened = ReadRecorder::new(Database::open(&path).unwrap());
    let tracker = reopened.tracker("abc").unwrap();
    assert_eq!(tracker.origin_ip, "1.1.1.1");
    assert!(tracker.last_read_at.is_some());
    assert_eq!(reopened.read_logs("abc").unwrap().len(), 1);

    let err = reopened.create_tracker("abc", "4.4.4.4").unwrap_err();
    assert!(matches!(err, TrackError::Conflict(_)));
}

#[test]
fn test_concurrent_reads_on_one_handle() {
    let (_dir, _path, recorder) = file_recorder();
    recorder.create_tracker("abc", "1.1.1.1").unwrap();
    let recorder = Arc::new(recorder);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || {
                for i in 0..10 {
                    let outcome = recorder.record_read("abc", &format!("10.{t}.0.{i}")).unwrap();
                    assert!(outcome.is_recorded());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let logs = recorder.read_logs("abc").unwrap();
    assert_eq!(logs.len(), 80);
    let ids: HashSet<_> = logs.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids.len(), 80);
}

#[test]
fn test_concurrent_reads_across_connections() {
    let (_dir, path, recorder) = file_recorder();
    recorder.create_tracker("abc", "1.1.1.1").unwrap();

    // Separate connections to the same file contend on SQLite's write lock
    // rather than on the in-process mutex.
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let path = path.clone();
            thread::spawn(move || {
                let recorder = ReadRecorder::new(Database::open(&path).unwrap());
                for i in 0..10 {
                    recorder.record_read("abc", &format!("172.16.{t}.{i}")).unwrap();
                    // Origin reads interleaved with real ones stay invisible.
                    recorder.record_read("abc", "1.1.1.1").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let logs = recorder.read_logs("abc").unwrap();
    assert_eq!(logs.len(), 40);
    assert!(logs.iter().all(|l| l.ip != "1.1.1.1"));
    assert!(logs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

    let tracker = recorder.tracker("abc").unwrap();
    assert_eq!(tracker.last_read_at, Some(logs[0].timestamp));
}

#[test]
fn test_deleting_tracker_cascades() {
    let (_dir, _path, recorder) = file_recorder();
    recorder.create_tracker("abc", "1.1.1.1").unwrap();
    recorder.record_read("abc", "2.2.2.2").unwrap();
    recorder.record_read("abc", "3.3.3.3").unwrap();

    let remaining = recorder
        .database()
        .with_conn(|conn| {
            assert!(tracker_repo::delete(conn, "abc")?);
            read_log_repo::count_for_tracker(conn, "abc")
        })
        .unwrap();
    assert_eq!(remaining, 0);

    assert!(matches!(
        recorder.read_logs("abc"),
        Err(TrackError::NotFound(_))
    ));
}

#[test]
fn test_failed_insert_rolls_back_last_read() {
    let (_dir, _path, recorder) = file_recorder();
    recorder.create_tracker("abc", "1.1.1.1").unwrap();

    // Make every log insert fail so the read transaction aborts after the
    // last_read update.
    recorder
        .database()
        .with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_logs BEFORE INSERT ON logs
                 BEGIN SELECT RAISE(ABORT, 'logs are read-only'); END;",
            )?;
            Ok(())
        })
        .unwrap();

    let err = recorder.record_read("abc", "2.2.2.2").unwrap_err();
    assert!(matches!(err, TrackError::Storage(_)));
    assert_eq!(recorder.tracker("abc").unwrap().last_read_at, None);
}
