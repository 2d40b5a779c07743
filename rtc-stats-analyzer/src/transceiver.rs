//! Transceiver statistics snapshot consumed from the connection handle.

use crate::media_line::MediaKind;
use crate::report::{RTCStatsReportFragment, deserialize_fragments};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection state of the peer connection being sampled.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCPeerConnectionState {
    #[default]
    #[serde(rename = "new")]
    New,
    #[serde(rename = "connecting")]
    Connecting,
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "disconnected")]
    Disconnected,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "closed")]
    Closed,
}

impl RTCPeerConnectionState {
    /// Whether statistics can still be fetched in this state.
    pub fn can_sample(&self) -> bool {
        !matches!(
            self,
            RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
        )
    }
}

impl fmt::Display for RTCPeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCPeerConnectionState::New => "new",
            RTCPeerConnectionState::Connecting => "connecting",
            RTCPeerConnectionState::Connected => "connected",
            RTCPeerConnectionState::Disconnected => "disconnected",
            RTCPeerConnectionState::Failed => "failed",
            RTCPeerConnectionState::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Statistics of one local sender.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderStats {
    /// Label of the local track, e.g. the microphone or camera name.
    pub local_track_label: Option<String>,
    pub is_requested: Option<bool>,
    /// Epoch milliseconds of the last change of `is_requested`.
    pub last_requested_update_timestamp: Option<u64>,
    #[serde(deserialize_with = "deserialize_fragments")]
    pub report: Vec<RTCStatsReportFragment>,
}

/// Statistics of one remote receiver.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiverStats {
    pub is_requested: Option<bool>,
    /// Epoch milliseconds of the last change of `is_requested`.
    pub last_requested_update_timestamp: Option<u64>,
    pub is_active_speaker: Option<bool>,
    #[serde(deserialize_with = "deserialize_fragments")]
    pub report: Vec<RTCStatsReportFragment>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaKindStats {
    pub senders: Vec<SenderStats>,
    pub receivers: Vec<ReceiverStats>,
}

/// Full snapshot returned by the connection handle, one entry per media kind.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransceiverStats {
    pub audio: MediaKindStats,
    pub video: MediaKindStats,
    pub screen_share_audio: MediaKindStats,
    pub screen_share_video: MediaKindStats,
}

impl TransceiverStats {
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn kind(&self, kind: MediaKind) -> &MediaKindStats {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
            MediaKind::ScreenShareAudio => &self.screen_share_audio,
            MediaKind::ScreenShareVideo => &self.screen_share_video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transceiver_stats_from_json_skips_bad_fragments() {
        let stats = TransceiverStats::from_json(
            r#"{
                "audio": {
                    "senders": [{
                        "localTrackLabel": "Built-in Microphone",
                        "isRequested": true,
                        "report": [
                            {"type": "outbound-rtp", "id": "OA", "packetsSent": 10},
                            {"type": "outbound-rtp", "id": "OB", "packetsSent": -1},
                            {"type": "codec", "id": "C1", "mimeType": "audio/opus"}
                        ]
                    }],
                    "receivers": []
                },
                "screenShareVideo": {"senders": [], "receivers": [{"report": []}]}
            }"#,
        )
        .unwrap();

        let sender = &stats.audio.senders[0];
        assert_eq!(sender.local_track_label.as_deref(), Some("Built-in Microphone"));
        assert_eq!(sender.is_requested, Some(true));
        assert_eq!(sender.report.len(), 2);
        assert_eq!(sender.report[1], RTCStatsReportFragment::Unknown);
        assert_eq!(stats.kind(MediaKind::ScreenShareVideo).receivers.len(), 1);
        assert!(stats.video.senders.is_empty());
    }

    #[test]
    fn test_connection_state_sampling() {
        assert!(RTCPeerConnectionState::Connected.can_sample());
        assert!(RTCPeerConnectionState::Disconnected.can_sample());
        assert!(!RTCPeerConnectionState::Failed.can_sample());
        assert!(!RTCPeerConnectionState::Closed.can_sample());
    }
}
