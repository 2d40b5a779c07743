use anyhow::Result;
use clap::Parser;
use env_logger::Target;
use log::{error, info};
use rtc_stats_analyzer::analyzer::{MediaStatus, StatsAnalyzerBuilder};
use rtc_stats_analyzer::config::AnalyzerConfigBuilder;
use rtc_stats_analyzer::error::Error;
use rtc_stats_analyzer::runtime::{ConnectionHandle, spawn_analyzer};
use rtc_stats_analyzer::transceiver::{RTCPeerConnectionState, TransceiverStats};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use std::{fs::OpenOptions, io::Write, str::FromStr};
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "synthetic-call")]
#[command(author = "Rusty Rain <y@liu.mx>")]
#[command(version = "0.0.0")]
#[command(about = "Runs the stats analyzer against a synthetic two-party call.")]
struct Cli {
    #[arg(short, long)]
    debug: bool,
    #[arg(short, long, default_value_t = format!("INFO"))]
    log_level: String,
    #[arg(short, long, default_value_t = format!(""))]
    output_log_file: String,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    #[arg(long, default_value_t = 10000)]
    quality_interval_ms: u64,
    /// Local microphone goes silent after this many fetches, 0 keeps it live.
    #[arg(long, default_value_t = 15)]
    mute_after: u64,
}

/// A call whose counters grow at a constant rate.
struct SyntheticCall {
    fetches: AtomicU64,
    mute_after: u64,
}

impl SyntheticCall {
    fn snapshot(&self, n: u64) -> serde_json::Value {
        let muted = self.mute_after > 0 && n >= self.mute_after;
        let audio_packets = if muted { self.mute_after * 50 } else { n * 50 };
        json!({
            "audio": {
                "senders": [{
                    "localTrackLabel": "Built-in Microphone",
                    "isRequested": true,
                    "report": [
                        {
                            "type": "outbound-rtp", "id": "OT01A", "ssrc": 1001,
                            "packetsSent": audio_packets,
                            "headerBytesSent": audio_packets * 12,
                            "bytesSent": audio_packets * 160
                        },
                        {
                            "type": "remote-inbound-rtp", "id": "RI01A", "localId": "OT01A",
                            "packetsReceived": audio_packets * 99 / 100,
                            "packetsLost": audio_packets / 100,
                            "fractionLost": 0.01, "jitter": 0.004, "roundTripTime": 0.042
                        },
                        {"type": "media-source", "id": "SA01", "kind": "audio", "audioLevel": 0.2},
                        {
                            "type": "candidate-pair", "id": "CP01", "state": "succeeded",
                            "nominated": true, "localCandidateId": "LC01"
                        },
                        {
                            "type": "local-candidate", "id": "LC01", "address": "192.168.1.20",
                            "port": 50000, "protocol": "udp", "candidateType": "host"
                        }
                    ]
                }],
                "receivers": [{
                    "isRequested": true,
                    "isActiveSpeaker": true,
                    "report": [{
                        "type": "inbound-rtp", "id": "IT01A", "ssrc": 2001,
                        "packetsReceived": n * 50, "packetsLost": n / 4,
                        "bytesReceived": n * 8000, "headerBytesReceived": n * 600,
                        "jitter": 0.006, "jitterBufferDelay": n as f64 * 2.5,
                        "jitterBufferEmittedCount": n * 50
                    }]
                }]
            },
            "video": {
                "senders": [{
                    "localTrackLabel": "FaceTime HD Camera",
                    "isRequested": true,
                    "report": [{
                        "type": "outbound-rtp", "id": "OT01V", "ssrc": 1002,
                        "packetsSent": n * 120, "bytesSent": n * 120_000,
                        "headerBytesSent": n * 1440, "framesSent": n * 30,
                        "framesEncoded": n * 30, "frameWidth": 640, "frameHeight": 360
                    }]
                }],
                "receivers": [{
                    "isRequested": true,
                    "report": [{
                        "type": "inbound-rtp", "id": "IT01V", "ssrc": 2002,
                        "packetsReceived": n * 110, "packetsLost": n,
                        "bytesReceived": n * 110_000, "headerBytesReceived": n * 1320,
                        "framesReceived": n * 24, "framesDecoded": n * 24,
                        "frameWidth": 1280, "frameHeight": 720
                    }]
                }]
            }
        })
    }
}

impl ConnectionHandle for SyntheticCall {
    fn connection_state(&self) -> RTCPeerConnectionState {
        RTCPeerConnectionState::Connected
    }

    fn transceiver_stats(&self) -> impl Future<Output = Result<TransceiverStats, Error>> + Send {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let stats = serde_json::from_value::<TransceiverStats>(self.snapshot(n))
            .map_err(|err| Error::ErrStatsFetch(err.to_string()));
        async move { stats }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_log_file = cli.output_log_file;
    let log_level = log::LevelFilter::from_str(&cli.log_level)?;
    if cli.debug {
        env_logger::Builder::new()
            .target(if !output_log_file.is_empty() {
                Target::Pipe(Box::new(
                    OpenOptions::new()
                        .create(true)
                        .write(true)
                        .truncate(true)
                        .open(output_log_file)?,
                ))
            } else {
                Target::Stdout
            })
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} [{}] {} - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.level(),
                    chrono::Local::now().format("%H:%M:%S.%6f"),
                    record.args()
                )
            })
            .filter(None, log_level)
            .init();
    }

    let (stop_tx, stop_rx) = broadcast::channel::<()>(1);

    println!("Press Ctrl-C to stop");
    std::thread::spawn(move || {
        let mut stop_tx = Some(stop_tx);
        ctrlc::set_handler(move || {
            if let Some(stop_tx) = stop_tx.take() {
                let _ = stop_tx.send(());
            }
        })
        .expect("Error setting Ctrl-C handler");
    });

    let config = AnalyzerConfigBuilder::new()
        .with_analyzer_interval(Duration::from_millis(cli.interval_ms))
        .with_quality_interval(Duration::from_millis(cli.quality_interval_ms))
        .build()?;
    let connection = Arc::new(SyntheticCall {
        fetches: AtomicU64::new(0),
        mute_after: cli.mute_after,
    });

    if let Err(err) = run(stop_rx, connection, config).await {
        eprintln!("run got error: {}", err);
    }

    Ok(())
}

async fn run(
    mut stop_rx: broadcast::Receiver<()>,
    connection: Arc<SyntheticCall>,
    config: rtc_stats_analyzer::config::AnalyzerConfig,
) -> Result<()> {
    let analyzer = StatsAnalyzerBuilder::new().with_config(config).build()?;
    let (handle, mut event_rx) = spawn_analyzer(connection, analyzer)?;
    handle.update_media_status(MediaStatus {
        send_audio: true,
        send_video: true,
        receive_audio: true,
        receive_video: true,
        ..Default::default()
    })?;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                info!("received stop signal");
                break;
            }
            event = event_rx.recv() => {
                let Some(event) = event else {
                    error!("analyzer task exited");
                    break;
                };
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    handle.stop().await?;
    while let Ok(event) = event_rx.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
