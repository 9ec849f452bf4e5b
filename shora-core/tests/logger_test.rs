//! Integration test for [`shora_core::init_tracing`]; alone in its binary because it installs the global subscriber.

use tempfile::TempDir;

/// **Test: init_tracing creates missing directories, writes events to the file, and refuses a second install.**
#[test]
fn test_init_tracing_writes_to_file() {
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("logs").join("shora.log");
    let path = log_file.to_str().unwrap();

    shora_core::init_tracing(path).unwrap();
    tracing::info!(user = "Awa", "step: logger test");

    let content = std::fs::read_to_string(&log_file).unwrap();
    assert!(content.contains("step: logger test"));
    assert!(content.contains("Awa"));

    assert!(shora_core::init_tracing(path).is_err());
}
