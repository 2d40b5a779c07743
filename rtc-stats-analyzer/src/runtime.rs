//! Tokio driver for [`StatsAnalyzer`].
//!
//! The driver owns the analyzer on one task. The analyzer's timer decides
//! when a tick is due; every tick's fetch runs on its own task and reports
//! back over a channel, so a slow fetch delays only its own tick and never
//! overlaps another tick's processing.

use crate::analyzer::{AnalyzerCommand, MediaStatus, StatsAnalyzer, StatsRequest, StatsSample};
use crate::error::{Error, Result};
use crate::event::AnalyzerEvent;
use crate::transceiver::{RTCPeerConnectionState, TransceiverStats};
use log::{debug, trace, warn};
use sansio::Protocol;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The peer connection the analyzer samples.
pub trait ConnectionHandle: Send + Sync + 'static {
    fn connection_state(&self) -> RTCPeerConnectionState;

    /// Fetches a full snapshot. No timeout is applied by the driver.
    fn transceiver_stats(&self) -> impl Future<Output = Result<TransceiverStats>> + Send;
}

/// Controls a running analyzer task.
pub struct AnalyzerHandle {
    commands: mpsc::UnboundedSender<AnalyzerCommand>,
    task: JoinHandle<()>,
}

impl AnalyzerHandle {
    pub fn update_media_status(&self, status: MediaStatus) -> Result<()> {
        self.commands
            .send(AnalyzerCommand::UpdateMediaStatus(status))
            .map_err(|_| Error::ErrConnectionClosed)
    }

    /// Stops the schedule and waits for the task to exit. Fetches still in
    /// flight are left to finish; their results are discarded.
    pub async fn stop(self) -> Result<()> {
        if self.commands.send(AnalyzerCommand::Stop).is_err() {
            trace!("analyzer task already exited");
        }
        if let Err(err) = self.task.await {
            warn!("analyzer task failed: {err}");
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Starts `analyzer` unless it is already running and drives it on a new
/// task. Events arrive on the returned receiver in emission order.
pub fn spawn_analyzer<C: ConnectionHandle>(
    connection: Arc<C>,
    mut analyzer: StatsAnalyzer,
) -> Result<(AnalyzerHandle, mpsc::UnboundedReceiver<AnalyzerEvent>)> {
    if !analyzer.is_running() {
        analyzer.start(Instant::now().into_std())?;
    }
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(connection, analyzer, command_rx, event_tx));

    Ok((
        AnalyzerHandle {
            commands: command_tx,
            task,
        },
        event_rx,
    ))
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn dispatch_fetch<C: ConnectionHandle>(
    connection: &Arc<C>,
    request: StatsRequest,
    sample_tx: &mpsc::UnboundedSender<StatsSample>,
) {
    let state = connection.connection_state();
    if !state.can_sample() {
        debug!("skipping stats fetch {request:?}, connection is {state}");
        return;
    }

    let connection = Arc::clone(connection);
    let sample_tx = sample_tx.clone();
    tokio::spawn(async move {
        match connection.transceiver_stats().await {
            Ok(stats) => {
                let sample = StatsSample {
                    request,
                    timestamp_ms: epoch_millis(),
                    stats,
                };
                if sample_tx.send(sample).is_err() {
                    trace!("analyzer gone, dropping sample {request:?}");
                }
            }
            Err(err) => warn!("stats fetch {request:?} failed: {err}"),
        }
    });
}

fn forward_events(analyzer: &mut StatsAnalyzer, event_tx: &mpsc::UnboundedSender<AnalyzerEvent>) {
    while let Some(event) = analyzer.poll_event() {
        if event_tx.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }
}

async fn run<C: ConnectionHandle>(
    connection: Arc<C>,
    mut analyzer: StatsAnalyzer,
    mut command_rx: mpsc::UnboundedReceiver<AnalyzerCommand>,
    event_tx: mpsc::UnboundedSender<AnalyzerEvent>,
) {
    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<StatsSample>();

    'EventLoop: loop {
        while let Some(request) = analyzer.poll_write() {
            dispatch_fetch(&connection, request, &sample_tx);
        }
        forward_events(&mut analyzer, &event_tx);

        let Some(deadline) = analyzer.poll_timeout() else {
            break 'EventLoop;
        };
        let deadline = Instant::from_std(deadline);
        if deadline <= Instant::now() {
            if let Err(err) = analyzer.handle_timeout(Instant::now().into_std()) {
                warn!("analyzer timeout failed: {err}");
            }
            continue;
        }

        let timer = tokio::time::sleep_until(deadline);
        tokio::pin!(timer);

        tokio::select! {
            biased;

            command = command_rx.recv() => {
                match command {
                    Some(command) => {
                        if let Err(err) = analyzer.handle_event(command) {
                            warn!("analyzer command failed: {err}");
                        }
                    }
                    None => {
                        trace!("analyzer handle dropped, exit loop");
                        break 'EventLoop;
                    }
                }
            }
            sample = sample_rx.recv() => {
                if let Some(sample) = sample {
                    if let Err(err) = analyzer.handle_read(sample) {
                        warn!("analyzer failed to process sample: {err}");
                    }
                }
            }
            _ = timer.as_mut() => {
                if let Err(err) = analyzer.handle_timeout(Instant::now().into_std()) {
                    warn!("analyzer timeout failed: {err}");
                }
            }
        }
    }

    if let Err(err) = analyzer.close() {
        warn!("analyzer close failed: {err}");
    }
    forward_events(&mut analyzer, &event_tx);
}
