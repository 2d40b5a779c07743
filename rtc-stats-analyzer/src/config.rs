//! Analyzer configuration.
//!
//! [`AnalyzerConfig`] can be built with [`AnalyzerConfigBuilder`] or decoded
//! from the camelCase JSON shape used by the calling SDK:
//!
//! ```
//! use rtc_stats_analyzer::config::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::from_json(r#"{"analyzerInterval": 1000}"#).unwrap();
//! assert_eq!(config.analyzer_interval().as_millis(), 1000);
//! assert_eq!(config.video_packet_loss_ratio_threshold, 9.0);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ANALYZER_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_QUALITY_INTERVAL_MS: u64 = 60000;
pub const DEFAULT_VIDEO_PACKET_LOSS_RATIO_THRESHOLD: f64 = 9.0;
pub const DEFAULT_RTT_THRESHOLD_MS: u64 = 500;
pub const DEFAULT_JITTER_THRESHOLD_MS: u64 = 500;
pub const DEFAULT_REQUESTED_RECENCY_WINDOW_MS: u64 = 30000;

/// Sampling and quality thresholds consumed by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    /// Sampling period in milliseconds.
    pub analyzer_interval: u64,
    /// Length of one media quality window in milliseconds.
    pub quality_interval: u64,
    /// Packet loss percentage above which a line is considered lossy.
    pub video_packet_loss_ratio_threshold: f64,
    /// Round trip time in milliseconds above which uplink quality is bad.
    pub rtt_threshold: u64,
    /// Remote jitter in milliseconds above which uplink quality is bad.
    pub jitter_threshold: u64,
    /// How long an unrequested stream keeps counting as requested after its
    /// last request update, in milliseconds.
    pub requested_recency_window: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            analyzer_interval: DEFAULT_ANALYZER_INTERVAL_MS,
            quality_interval: DEFAULT_QUALITY_INTERVAL_MS,
            video_packet_loss_ratio_threshold: DEFAULT_VIDEO_PACKET_LOSS_RATIO_THRESHOLD,
            rtt_threshold: DEFAULT_RTT_THRESHOLD_MS,
            jitter_threshold: DEFAULT_JITTER_THRESHOLD_MS,
            requested_recency_window: DEFAULT_REQUESTED_RECENCY_WINDOW_MS,
        }
    }
}

impl AnalyzerConfig {
    /// Decodes and validates a JSON config. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.analyzer_interval == 0 {
            return Err(Error::ErrInvalidAnalyzerInterval);
        }
        if self.quality_interval < self.analyzer_interval {
            return Err(Error::ErrInvalidQualityInterval);
        }
        if !self.video_packet_loss_ratio_threshold.is_finite()
            || self.video_packet_loss_ratio_threshold < 0.0
        {
            return Err(Error::ErrInvalidConfig(format!(
                "videoPacketLossRatioThreshold {} out of range",
                self.video_packet_loss_ratio_threshold
            )));
        }
        Ok(())
    }

    pub fn analyzer_interval(&self) -> Duration {
        Duration::from_millis(self.analyzer_interval)
    }

    pub fn quality_interval(&self) -> Duration {
        Duration::from_millis(self.quality_interval)
    }
}

#[derive(Default)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn new() -> Self {
        AnalyzerConfigBuilder {
            config: AnalyzerConfig::default(),
        }
    }

    /// with_analyzer_interval sets how often the connection is sampled.
    pub fn with_analyzer_interval(mut self, interval: Duration) -> Self {
        self.config.analyzer_interval = interval.as_millis() as u64;
        self
    }

    /// with_quality_interval sets the length of a media quality window.
    pub fn with_quality_interval(mut self, interval: Duration) -> Self {
        self.config.quality_interval = interval.as_millis() as u64;
        self
    }

    pub fn with_video_packet_loss_ratio_threshold(mut self, threshold: f64) -> Self {
        self.config.video_packet_loss_ratio_threshold = threshold;
        self
    }

    pub fn with_rtt_threshold(mut self, threshold: Duration) -> Self {
        self.config.rtt_threshold = threshold.as_millis() as u64;
        self
    }

    pub fn with_jitter_threshold(mut self, threshold: Duration) -> Self {
        self.config.jitter_threshold = threshold.as_millis() as u64;
        self
    }

    pub fn with_requested_recency_window(mut self, window: Duration) -> Self {
        self.config.requested_recency_window = window.as_millis() as u64;
        self
    }

    pub fn build(self) -> Result<AnalyzerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
