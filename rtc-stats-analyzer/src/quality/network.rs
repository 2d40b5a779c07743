//! Uplink network quality.
//!
//! Each remote receiver report of a send line is handed to a
//! [`NetworkQualityMonitor`]. The monitor decides whether the uplink of that
//! line is currently good (score 1) or bad (score 0) and reports a verdict
//! only when the score changes.

use crate::config::AnalyzerConfig;
use crate::media_line::MediaLineId;
use crate::report::rtp_stream::RTCRemoteInboundRtpFragment;
use crate::store::SampleStore;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

pub const NETWORK_QUALITY_GOOD: u8 = 1;
pub const NETWORK_QUALITY_BAD: u8 = 0;

/// One remote receiver report together with the store it was merged into.
#[derive(Debug, Clone, Copy)]
pub struct UplinkQualityInput<'a> {
    pub media_line: MediaLineId,
    pub remote_rtp_results: &'a RTCRemoteInboundRtpFragment,
    pub current_stats: &'a SampleStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkQualityVerdict {
    pub media_type: MediaLineId,
    pub network_quality_score: u8,
}

pub trait NetworkQualityMonitor: Send {
    fn determine_uplink_network_quality(
        &mut self,
        input: UplinkQualityInput<'_>,
    ) -> Option<NetworkQualityVerdict>;
}

/// Indicators a verdict is based on. Missing indicators are not held against
/// the line.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct UplinkIndicators {
    /// Percent.
    pub packet_loss: Option<f64>,
    /// Milliseconds.
    pub round_trip_time: Option<f64>,
    /// Milliseconds.
    pub jitter: Option<f64>,
}

impl UplinkIndicators {
    pub fn from_input(input: &UplinkQualityInput<'_>) -> Self {
        let remote = input.remote_rtp_results;
        let merged_loss = input
            .current_stats
            .get(&input.media_line)
            .and_then(|result| result.send.as_ref())
            .filter(|send| send.reports_received > 0 || send.total_packets_sent > 0)
            .map(|send| send.current_packet_loss_ratio * 100.0);

        UplinkIndicators {
            packet_loss: merged_loss.or(remote.fraction_lost.map(|f| f * 100.0)),
            round_trip_time: remote.round_trip_time.map(|rtt| rtt * 1000.0),
            jitter: remote.jitter.map(|jitter| jitter * 1000.0),
        }
    }
}

/// Scores a line bad when loss, round trip time or jitter is above its
/// configured threshold.
#[derive(Debug, Clone)]
pub struct ThresholdNetworkQualityMonitor {
    packet_loss_threshold: f64,
    rtt_threshold: f64,
    jitter_threshold: f64,
    scores: HashMap<MediaLineId, u8>,
}

impl ThresholdNetworkQualityMonitor {
    pub fn new(config: &AnalyzerConfig) -> Self {
        ThresholdNetworkQualityMonitor {
            packet_loss_threshold: config.video_packet_loss_ratio_threshold,
            rtt_threshold: config.rtt_threshold as f64,
            jitter_threshold: config.jitter_threshold as f64,
            scores: HashMap::new(),
        }
    }

    pub fn score(&self, indicators: &UplinkIndicators) -> u8 {
        let over = |value: Option<f64>, threshold: f64| value.is_some_and(|v| v > threshold);
        if over(indicators.packet_loss, self.packet_loss_threshold)
            || over(indicators.round_trip_time, self.rtt_threshold)
            || over(indicators.jitter, self.jitter_threshold)
        {
            NETWORK_QUALITY_BAD
        } else {
            NETWORK_QUALITY_GOOD
        }
    }

    /// Last score reported for `media_line`.
    pub fn last_score(&self, media_line: &MediaLineId) -> Option<u8> {
        self.scores.get(media_line).copied()
    }
}

impl Default for ThresholdNetworkQualityMonitor {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

impl NetworkQualityMonitor for ThresholdNetworkQualityMonitor {
    fn determine_uplink_network_quality(
        &mut self,
        input: UplinkQualityInput<'_>,
    ) -> Option<NetworkQualityVerdict> {
        let indicators = UplinkIndicators::from_input(&input);
        let score = self.score(&indicators);
        debug!("{}: uplink indicators {:?} score {}", input.media_line, indicators, score);

        if self.scores.insert(input.media_line, score) == Some(score) {
            return None;
        }
        info!("{}: uplink network quality is now {}", input.media_line, score);
        Some(NetworkQualityVerdict {
            media_type: input.media_line,
            network_quality_score: score,
        })
    }
}
