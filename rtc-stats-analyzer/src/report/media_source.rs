use serde::{Deserialize, Serialize};

/// A local capture source feeding a sender.
///
/// See [RTCAudioSourceStats](https://www.w3.org/TR/webrtc-stats/#audiosourcestats-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCMediaSourceFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub kind: Option<String>,
    pub track_identifier: Option<String>,

    /// Instantaneous audio level (0.0 to 1.0).
    pub audio_level: Option<f64>,
    pub total_audio_energy: Option<f64>,
    /// Total duration of captured audio in seconds.
    pub total_samples_duration: Option<f64>,

    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frames_per_second: Option<f64>,
}
