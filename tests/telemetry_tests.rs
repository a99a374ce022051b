// Integration tests for the asynchronous latency log

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tx_cost_simulator::telemetry::{LatencyLogger, LatencyRecord, CSV_HEADER};

fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read latency log")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_rows_written_in_submission_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latency.csv");
    let logger = LatencyLogger::start(&path, Duration::from_secs(60)).unwrap();

    for i in 0..25 {
        logger.log(LatencyRecord::now(i as f64, 0.5, i as f64 + 0.5));
    }
    assert_eq!(logger.flush().unwrap(), 25);
    logger.stop();

    let lines = read_lines(&path);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.len(), 26);
    for (i, line) in lines[1..].iter().enumerate() {
        let columns: Vec<&str> = line.split(',').collect();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[1], format!("{:.2}", i as f64));
        assert_eq!(columns[3], format!("{:.2}", i as f64 + 0.5));
    }
}

#[test]
fn test_stop_drains_records_queued_after_last_flush() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latency.csv");
    let logger = LatencyLogger::start(&path, Duration::from_secs(3600)).unwrap();

    logger.log(LatencyRecord::now(1.0, 2.0, 3.0));
    logger.log(LatencyRecord::now(4.0, 5.0, 6.0));
    logger.stop();

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with(",1.00,2.00,3.00"));
    assert!(lines[2].ends_with(",4.00,5.00,6.00"));
    assert_eq!(logger.stats().rows_written, 2);
    assert!(!logger.is_running());
}

#[test]
fn test_periodic_flush_without_stop() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latency.csv");
    let logger = LatencyLogger::start(&path, Duration::from_millis(20)).unwrap();

    logger.log(LatencyRecord::now(0.1, 0.2, 0.3));

    let mut waited = Duration::ZERO;
    while read_lines(&path).len() < 2 && waited < Duration::from_secs(5) {
        thread::sleep(Duration::from_millis(10));
        waited += Duration::from_millis(10);
    }
    assert_eq!(read_lines(&path).len(), 2);
    logger.stop();
}

#[test]
fn test_concurrent_producers_lose_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latency.csv");
    let logger = Arc::new(LatencyLogger::start(&path, Duration::from_millis(5)).unwrap());

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for _ in 0..250 {
                    logger.log(LatencyRecord::now(0.01, 0.02, 0.03));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    logger.stop();

    assert_eq!(read_lines(&path).len(), 1001);
    assert_eq!(logger.stats().rows_written, 1000);
    assert_eq!(logger.stats().dropped_records, 0);
}

#[test]
fn test_restart_truncates_previous_run() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("latency.csv");

    let first = LatencyLogger::start(&path, Duration::from_secs(60)).unwrap();
    first.log(LatencyRecord::now(1.0, 1.0, 2.0));
    first.stop();
    assert_eq!(read_lines(&path).len(), 2);

    let second = LatencyLogger::start(&path, Duration::from_secs(60)).unwrap();
    second.stop();
    assert_eq!(read_lines(&path), vec![CSV_HEADER.to_string()]);
}

#[test]
fn test_unwritable_path_fails_at_start() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing-dir").join("latency.csv");
    assert!(LatencyLogger::start(&path, Duration::from_secs(1)).is_err());
}
