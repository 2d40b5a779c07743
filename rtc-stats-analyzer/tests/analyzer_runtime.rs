/// Integration tests for the tokio driver.
///
/// These tests verify that:
/// - ticks fire on the analyzer interval and each fetch result is processed
/// - fetches are skipped while the connection is failed or closed
/// - a failed fetch skips only its own tick
/// - results arriving after stop are discarded
use rtc_stats_analyzer::analyzer::{MediaStatus, StatsAnalyzerBuilder};
use rtc_stats_analyzer::config::AnalyzerConfigBuilder;
use rtc_stats_analyzer::error::{Error, Result};
use rtc_stats_analyzer::event::AnalyzerEvent;
use rtc_stats_analyzer::runtime::{ConnectionHandle, spawn_analyzer};
use rtc_stats_analyzer::transceiver::{RTCPeerConnectionState, TransceiverStats};
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

const INTERVAL: Duration = Duration::from_millis(5000);

struct MockConnection {
    state: Mutex<RTCPeerConnectionState>,
    /// One entry per fetch; the last entry repeats.
    snapshots: Vec<Result<TransceiverStats>>,
    fetch_delay: Duration,
    fetches: AtomicUsize,
}

impl MockConnection {
    fn new(snapshots: Vec<Result<TransceiverStats>>) -> Self {
        MockConnection {
            state: Mutex::new(RTCPeerConnectionState::Connected),
            snapshots,
            fetch_delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: RTCPeerConnectionState) {
        *self.state.lock().unwrap() = state;
    }
}

impl ConnectionHandle for MockConnection {
    fn connection_state(&self) -> RTCPeerConnectionState {
        *self.state.lock().unwrap()
    }

    fn transceiver_stats(&self) -> impl Future<Output = Result<TransceiverStats>> + Send {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.snapshots[n.min(self.snapshots.len() - 1)].clone();
        let delay = self.fetch_delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            snapshot
        }
    }
}

fn audio_sender(packets_sent: u64) -> Result<TransceiverStats> {
    Ok(serde_json::from_value(json!({
        "audio": {
            "senders": [{
                "isRequested": true,
                "report": [{"type": "outbound-rtp", "id": "OT01A", "packetsSent": packets_sent}]
            }]
        }
    }))
    .unwrap())
}

fn analyzer() -> rtc_stats_analyzer::analyzer::StatsAnalyzer {
    let config = AnalyzerConfigBuilder::new()
        .with_analyzer_interval(INTERVAL)
        .build()
        .unwrap();
    StatsAnalyzerBuilder::new().with_config(config).build().unwrap()
}

fn drain(events: &mut mpsc::UnboundedReceiver<AnalyzerEvent>) -> Vec<&'static str> {
    let mut names = vec![];
    while let Ok(event) = events.try_recv() {
        names.push(event.name());
    }
    names
}

fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

#[tokio::test(start_paused = true)]
async fn test_ticks_drive_activity_events() -> Result<()> {
    init_logger();
    let connection = Arc::new(MockConnection::new(vec![
        audio_sender(100),
        audio_sender(200),
        audio_sender(200),
    ]));
    let (handle, mut events) = spawn_analyzer(Arc::clone(&connection), analyzer())?;

    // Ticks at 0s, 5s and 10s.
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(connection.fetches(), 3);
    assert_eq!(
        drain(&mut events),
        vec!["LOCAL_MEDIA_STARTED", "LOCAL_MEDIA_STOPPED"]
    );

    handle.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_closed_connection_is_not_sampled() -> Result<()> {
    init_logger();
    let connection = Arc::new(MockConnection::new(vec![audio_sender(100)]));
    connection.set_state(RTCPeerConnectionState::Closed);
    let (handle, mut events) = spawn_analyzer(Arc::clone(&connection), analyzer())?;

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(connection.fetches(), 0);
    assert!(drain(&mut events).is_empty());

    connection.set_state(RTCPeerConnectionState::Connected);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(connection.fetches(), 1);
    assert_eq!(drain(&mut events), vec!["LOCAL_MEDIA_STARTED"]);

    handle.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_skips_one_tick() -> Result<()> {
    init_logger();
    let connection = Arc::new(MockConnection::new(vec![
        Err(Error::ErrStatsFetch("transport busy".to_string())),
        audio_sender(100),
    ]));
    let (handle, mut events) = spawn_analyzer(Arc::clone(&connection), analyzer())?;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(connection.fetches(), 1);
    assert!(drain(&mut events).is_empty());

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(connection.fetches(), 2);
    assert_eq!(drain(&mut events), vec!["LOCAL_MEDIA_STARTED"]);

    handle.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_results_after_stop_are_discarded() -> Result<()> {
    init_logger();
    let connection = Arc::new(MockConnection {
        fetch_delay: Duration::from_secs(3),
        ..MockConnection::new(vec![audio_sender(100)])
    });
    let (handle, mut events) = spawn_analyzer(Arc::clone(&connection), analyzer())?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(connection.fetches(), 1);
    handle.stop().await?;

    // The in-flight fetch completes after stop, and no further tick runs.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(connection.fetches(), 1);
    assert!(events.recv().await.is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_media_status_reaches_analyzer() -> Result<()> {
    init_logger();
    let connection = Arc::new(MockConnection::new(vec![audio_sender(0)]));
    let (handle, _events) = spawn_analyzer(Arc::clone(&connection), analyzer())?;

    handle.update_media_status(MediaStatus {
        send_audio: true,
        ..Default::default()
    })?;
    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert!(!handle.is_finished());

    handle.stop().await?;
    Ok(())
}
