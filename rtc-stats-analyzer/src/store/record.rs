use serde::Serialize;

/// Last-known state of a send line.
///
/// Cumulative members hold the most recent value reported by the browser;
/// `*_per_tick` and `bitrate` are derived from the previous tick.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRecord {
    pub ssrc: Option<u32>,

    // Packet counters
    pub total_bytes_sent: u64,
    pub header_bytes_sent: u64,
    pub total_packets_sent: u64,
    pub retransmitted_bytes_sent: u64,
    pub retransmitted_packets_sent: u64,

    // RTCP feedback received
    pub total_nack_count: u32,
    pub total_pli_count: u32,
    pub total_fir_count: u32,

    // Video encoding
    pub frames_sent: u64,
    pub frames_encoded: u64,
    pub total_key_frames_encoded: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames_per_second: f64,
    pub target_bitrate: f64,
    pub requested_bitrate: f64,
    pub requested_frame_size: u32,
    pub encoder_implementation: Option<String>,
    pub quality_limitation_reason: Option<String>,

    // Media source (audio only)
    pub audio_level: f64,
    pub total_audio_energy: f64,
    pub total_samples_duration: f64,

    // Remote receiver view, from remote-inbound-rtp
    pub total_packets_lost_on_receiver: i64,
    pub packets_lost_on_receiver: i64,
    /// Remote jitter in seconds.
    pub remote_jitter: f64,
    /// Round trip time in seconds.
    pub round_trip_time: f64,
    pub fraction_lost: f64,
    pub reports_received: u64,
    pub current_packet_loss_ratio: f64,
    pub overall_packet_loss_ratio: f64,
    pub max_packet_loss_ratio: f64,

    // Derived per tick
    pub packets_sent_per_tick: u64,
    pub bitrate: f64,

    /// `total_packets_sent` when the last remote report was merged.
    #[serde(skip)]
    pub(crate) packets_sent_at_last_remote_report: u64,
}

/// Last-known state of a receive line.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecvRecord {
    pub ssrc: Option<u32>,

    // Packet counters
    pub total_bytes_received: u64,
    pub header_bytes_received: u64,
    pub total_packets_received: u64,
    pub total_packets_lost: i64,
    pub packets_discarded: u64,
    pub fec_packets_received: u64,
    pub fec_packets_discarded: u64,
    pub retransmitted_bytes_received: u64,
    pub retransmitted_packets_received: u64,

    /// Inter-arrival jitter in seconds.
    pub jitter: f64,
    pub jitter_buffer_delay: f64,
    pub jitter_buffer_emitted_count: u64,

    // RTCP feedback sent
    pub total_nack_count: u32,
    pub total_pli_count: u32,
    pub total_fir_count: u32,

    // Video decoding
    pub frames_received: u64,
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub key_frames_decoded: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frames_per_second: f64,
    pub requested_bitrate: f64,
    pub decoder_implementation: Option<String>,

    // Audio playout
    pub audio_level: f64,
    pub total_audio_energy: f64,
    pub total_samples_received: u64,
    pub total_samples_duration: f64,
    pub concealed_samples: u64,
    pub concealment_events: u64,

    /// Round trip time in seconds from remote-outbound-rtp.
    pub remote_round_trip_time: f64,

    // Derived per tick
    pub packets_received_per_tick: u64,
    pub bitrate: f64,
    pub current_packet_loss_ratio: f64,
    pub mean_jitter_buffer_delay_ms: f64,
}
