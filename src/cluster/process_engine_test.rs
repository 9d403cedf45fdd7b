use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use super::*;
use crate::EngineConfig;

fn engine_config(binary: impl Into<PathBuf>) -> EngineConfig {
    EngineConfig {
        binary: binary.into(),
        ready_timeout_in_ms: 2_000,
        poll_interval_in_ms: 25,
        stop_grace_in_ms: 200,
    }
}

fn unused_addr() -> SocketAddr {
    // Bind to an ephemeral port and release it; nothing will listen there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[cfg(unix)]
fn write_script(
    dir: &Path,
    body: &str,
) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn init_should_succeed_when_the_binary_exits_cleanly() {
    let temp = tempfile::tempdir().unwrap();
    let engine = ProcessEngine::new(engine_config("true"), unused_addr());

    assert!(engine.init(temp.path()).await.is_ok());
}

#[tokio::test]
async fn init_should_report_a_failing_binary() {
    let temp = tempfile::tempdir().unwrap();
    let engine = ProcessEngine::new(engine_config("false"), unused_addr());

    let err = engine.init(temp.path()).await.unwrap_err();
    assert!(matches!(err, EngineError::Exited(_)));
}

#[tokio::test]
async fn start_should_detect_an_engine_that_dies_before_ready() {
    let temp = tempfile::tempdir().unwrap();
    let engine = ProcessEngine::new(engine_config("false"), unused_addr());

    let err = engine.start(temp.path()).await.unwrap_err();
    assert!(matches!(err, EngineError::Exited(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn start_should_time_out_when_the_engine_never_listens() {
    let temp = tempfile::tempdir().unwrap();
    let script = write_script(temp.path(), "sleep 30");

    let mut config = engine_config(script);
    config.ready_timeout_in_ms = 300;
    let engine = ProcessEngine::new(config, unused_addr());

    let err = engine.start(temp.path()).await.unwrap_err();
    assert!(matches!(err, EngineError::ReadyTimeout(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn start_should_become_ready_and_stop_should_force_kill_an_unresponsive_engine() {
    let temp = tempfile::tempdir().unwrap();
    let script = write_script(temp.path(), "sleep 30");

    // Stand in for the engine's listener; the scripted child only sleeps.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let engine = ProcessEngine::new(engine_config(script), addr);
    engine.start(temp.path()).await.unwrap();

    // The scripted engine ignores the stop command, so the grace period
    // elapses and the child is force-killed.
    assert!(engine.stop(temp.path()).await.is_ok());
}

#[tokio::test]
async fn stop_without_a_running_engine_should_fail() {
    let temp = tempfile::tempdir().unwrap();
    let engine = ProcessEngine::new(engine_config("true"), unused_addr());

    let err = engine.stop(temp.path()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotRunning));
}

#[tokio::test]
async fn destroy_should_remove_the_directory_and_stay_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let data_dir = temp.path().join("instance");
    std::fs::create_dir(&data_dir).unwrap();
    std::fs::write(data_dir.join("state.db"), b"payload").unwrap();

    let engine = ProcessEngine::new(engine_config("true"), unused_addr());

    engine.destroy(&data_dir).await.unwrap();
    assert!(!data_dir.exists());

    // Already absent: still fine.
    assert!(engine.destroy(&data_dir).await.is_ok());
}
