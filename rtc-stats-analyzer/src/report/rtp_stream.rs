//! RTP stream report fragments.
//!
//! These mirror the W3C `RTCOutboundRtpStreamStats`, `RTCInboundRtpStreamStats`,
//! `RTCRemoteInboundRtpStreamStats` and `RTCRemoteOutboundRtpStreamStats`
//! dictionaries. Browsers omit members they do not track, so every member is
//! optional and absent members leave the previously accumulated value alone.

use serde::{Deserialize, Serialize};

/// A locally sent RTP stream.
///
/// See [RTCOutboundRtpStreamStats](https://www.w3.org/TR/webrtc-stats/#outboundrtpstats-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCOutboundRtpFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub ssrc: Option<u32>,
    pub kind: Option<String>,

    /// Total payload bytes sent.
    pub bytes_sent: Option<u64>,
    /// Total RTP header and padding bytes sent.
    pub header_bytes_sent: Option<u64>,
    /// Total RTP packets sent.
    pub packets_sent: Option<u64>,
    pub retransmitted_bytes_sent: Option<u64>,
    pub retransmitted_packets_sent: Option<u64>,

    /// NACK packets received for this stream.
    pub nack_count: Option<u32>,
    /// PLI packets received for this stream.
    pub pli_count: Option<u32>,
    /// FIR packets received for this stream.
    pub fir_count: Option<u32>,

    pub frames_sent: Option<u64>,
    pub frames_encoded: Option<u64>,
    pub key_frames_encoded: Option<u64>,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub frames_per_second: Option<f64>,

    pub target_bitrate: Option<f64>,
    /// Bitrate requested by the receiving side, passed through by the SDK.
    pub requested_bitrate: Option<f64>,
    /// Frame size (in macroblocks) requested by the receiving side.
    pub requested_frame_size: Option<u32>,
    pub encoder_implementation: Option<String>,
    pub quality_limitation_reason: Option<String>,
}

/// A locally received RTP stream.
///
/// See [RTCInboundRtpStreamStats](https://www.w3.org/TR/webrtc-stats/#inboundrtpstats-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCInboundRtpFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub ssrc: Option<u32>,
    pub kind: Option<String>,

    pub bytes_received: Option<u64>,
    pub header_bytes_received: Option<u64>,
    pub packets_received: Option<u64>,
    /// Total packets lost. Can be negative when duplicates arrive.
    pub packets_lost: Option<i64>,
    pub packets_discarded: Option<u64>,
    pub fec_packets_received: Option<u64>,
    pub fec_packets_discarded: Option<u64>,
    pub retransmitted_bytes_received: Option<u64>,
    pub retransmitted_packets_received: Option<u64>,

    /// Inter-arrival jitter in seconds.
    pub jitter: Option<f64>,
    /// Sum of jitter buffer delays in seconds.
    pub jitter_buffer_delay: Option<f64>,
    pub jitter_buffer_emitted_count: Option<u64>,

    pub nack_count: Option<u32>,
    pub pli_count: Option<u32>,
    pub fir_count: Option<u32>,

    pub frames_received: Option<u64>,
    pub frames_decoded: Option<u64>,
    pub frames_dropped: Option<u64>,
    pub key_frames_decoded: Option<u64>,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub frames_per_second: Option<f64>,

    pub audio_level: Option<f64>,
    pub total_audio_energy: Option<f64>,
    pub total_samples_received: Option<u64>,
    pub total_samples_duration: Option<f64>,
    pub concealed_samples: Option<u64>,
    pub concealment_events: Option<u64>,

    pub requested_bitrate: Option<f64>,
    pub decoder_implementation: Option<String>,
}

/// The remote endpoint's view of a stream we send, from RTCP receiver reports.
///
/// See [RTCRemoteInboundRtpStreamStats](https://www.w3.org/TR/webrtc-stats/#remoteinboundrtpstats-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCRemoteInboundRtpFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub ssrc: Option<u32>,
    pub local_id: Option<String>,

    /// Cumulative packets lost as reported by the remote receiver.
    pub packets_lost: Option<i64>,
    pub packets_received: Option<u64>,
    /// Fraction of packets lost (0.0 to 1.0) in the last report interval.
    pub fraction_lost: Option<f64>,
    /// Remote jitter in seconds.
    pub jitter: Option<f64>,
    /// Most recent round trip time in seconds.
    pub round_trip_time: Option<f64>,
    pub total_round_trip_time: Option<f64>,
    pub round_trip_time_measurements: Option<u64>,
    pub reports_received: Option<u64>,
}

/// The remote endpoint's view of a stream it sends us, from RTCP sender reports.
///
/// See [RTCRemoteOutboundRtpStreamStats](https://www.w3.org/TR/webrtc-stats/#remoteoutboundrtpstats-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCRemoteOutboundRtpFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub ssrc: Option<u32>,
    pub local_id: Option<String>,
    pub packets_sent: Option<u64>,
    pub bytes_sent: Option<u64>,
    pub reports_sent: Option<u64>,
    pub round_trip_time: Option<f64>,
    pub total_round_trip_time: Option<f64>,
}
