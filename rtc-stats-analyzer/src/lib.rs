//! # rtc-stats-analyzer - Sans-I/O WebRTC media statistics analyzer
//!
//! Samples the statistics of a live peer connection on a fixed interval,
//! reconciles every sample with the previous one and turns the result into
//! events:
//!
//! - `LOCAL_MEDIA_STARTED` / `LOCAL_MEDIA_STOPPED` and their `REMOTE_*`
//!   counterparts when media starts or stops flowing,
//! - `NETWORK_QUALITY` when the uplink quality of a send line changes,
//! - `MEDIA_QUALITY` once per quality window, with per-stream rates, loss,
//!   round trip time and jitter.
//!
//! The core, [`StatsAnalyzer`](analyzer::StatsAnalyzer), performs no I/O. It
//! implements [`sansio::Protocol`]: the caller feeds it timeouts and fetched
//! snapshots and drains fetch requests and events. [`runtime`] provides a
//! tokio driver for the common case.
//!
//! ```
//! use rtc_stats_analyzer::analyzer::{StatsAnalyzerBuilder, StatsSample};
//! use rtc_stats_analyzer::sansio::Protocol;
//! use rtc_stats_analyzer::transceiver::TransceiverStats;
//! use std::time::Instant;
//!
//! # fn example() -> rtc_stats_analyzer::error::Result<()> {
//! let mut analyzer = StatsAnalyzerBuilder::new().build()?;
//! let now = Instant::now();
//! analyzer.start(now)?;
//!
//! analyzer.handle_timeout(now)?;
//! while let Some(request) = analyzer.poll_write() {
//!     // Fetch the snapshot from the peer connection.
//!     let stats = TransceiverStats::from_json(r#"{"audio": {"senders": []}}"#)?;
//!     analyzer.handle_read(StatsSample {
//!         request,
//!         timestamp_ms: 0,
//!         stats,
//!     })?;
//! }
//! while let Some(event) = analyzer.poll_event() {
//!     println!("{}", event.name());
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(rust_2018_idioms)]

pub use sansio;

pub mod activity;
pub mod analyzer;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;
pub mod media_line;
pub mod parser;
pub mod quality;
pub mod rate;
pub mod report;
pub mod runtime;
pub mod store;
pub mod transceiver;
pub(crate) mod util;
