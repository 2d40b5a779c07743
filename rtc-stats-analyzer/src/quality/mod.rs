//! Media quality events.
//!
//! A [`MediaQualityEvent`] summarizes one quality window: for every requested
//! line it carries the counters moved since the window started, the mean and
//! max round trip time and jitter sampled during the window, and a few host
//! details. The event is rebuilt from the store each window; only the
//! baseline counters persist between windows.

pub mod network;

use crate::environment::HostEnvironment;
use crate::media_line::{MediaDirection, MediaKind, MediaLineId};
use crate::rate::{CounterDeltas, IntervalRates};
use crate::report::ice::TransportType;
use crate::store::{
    CounterSnapshot, IntervalBaseline, RecvRecord, SampleStore, SendRecord, StatsResult,
};
use log::debug;
use serde::Serialize;
use std::time::Duration;

/// Reported when a peripheral has no track label.
pub const UNKNOWN_PERIPHERAL: &str = "unknown";
pub const PERIPHERAL_MICROPHONE: &str = "microphone";
pub const PERIPHERAL_CAMERA: &str = "camera";

/// Pixels per macroblock.
const MACROBLOCK_PIXELS: u32 = 256;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaQualityEvent {
    pub interval_metadata: IntervalMetadata,
    pub audio_transmit: Vec<TransmitEntry>,
    pub audio_receive: Vec<ReceiveEntry>,
    pub video_transmit: Vec<TransmitEntry>,
    pub video_receive: Vec<ReceiveEntry>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Peripheral {
    pub name: String,
    pub information: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalMetadata {
    pub peripherals: Vec<Peripheral>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub screen_resolution: u64,
    pub app_window_width: u32,
    pub app_window_height: u32,
    /// Local address of the selected candidate pair.
    pub peer_reflexive_ip: String,
    pub interval_seconds: u64,
}

/// Members shared by transmit and receive entries.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonBlock {
    pub transport_type: TransportType,
    pub rtp_packets: u64,
    pub fec_packets: u64,
    pub media_hop_by_hop_lost: u64,
    pub rtp_hop_by_hop_lost: u64,
    /// Percent.
    pub remote_loss_rate: f64,
    pub is_main: bool,
    /// Bits per second.
    pub rtp_bitrate: f64,
    pub ssrc: Option<u32>,
    /// Milliseconds, mean over the window.
    pub round_trip_time: f64,
    pub max_round_trip_time: f64,
    /// Milliseconds, mean over the window.
    pub jitter: f64,
    pub max_jitter: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmitStream {
    pub frame_width: u32,
    pub frame_height: u32,
    pub transmitted_frame_rate: u32,
    /// Macroblocks.
    pub transmitted_frame_size: u32,
    pub requested_bitrate: f64,
    pub requested_frame_size: u32,
    pub transmitted_key_frames: u64,
    pub nack_count: u64,
    pub pli_count: u64,
    pub local_track_label: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveStream {
    pub frame_width: u32,
    pub frame_height: u32,
    pub received_frame_rate: u32,
    /// Macroblocks.
    pub received_frame_size: u32,
    pub is_active_speaker: bool,
    pub received_key_frames: u64,
    pub frames_dropped: u64,
    pub requested_bitrate: f64,
    /// Milliseconds.
    pub mean_jitter_buffer_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmitEntry {
    pub media_line: MediaLineId,
    pub common: CommonBlock,
    pub stream: TransmitStream,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveEntry {
    pub media_line: MediaLineId,
    pub common: CommonBlock,
    pub stream: ReceiveStream,
}

/// Everything a quality event is assembled from.
pub struct QualityInputs<'a> {
    pub store: &'a SampleStore,
    /// Counters at the start of the window, `None` for the first window.
    pub window_start: Option<&'a IntervalBaseline>,
    pub window: Duration,
    pub transport_type: TransportType,
    pub local_ip: &'a str,
    /// Sample timestamp, epoch milliseconds.
    pub now_ms: u64,
    pub recency_window_ms: u64,
    pub environment: &'a dyn HostEnvironment,
}

impl MediaQualityEvent {
    pub fn assemble(inputs: &QualityInputs<'_>) -> Self {
        let mut event = MediaQualityEvent {
            interval_metadata: IntervalMetadata::collect(inputs),
            ..Default::default()
        };
        let window_start_tick = inputs.window_start.map(|baseline| baseline.tick);

        // Store order puts main kinds before share kinds and lower indexes first.
        for (id, result) in inputs.store.iter() {
            if window_start_tick.is_some_and(|tick| result.internal.last_seen_tick <= tick) {
                debug!("{id}: not seen during the window, excluded from media quality");
                continue;
            }
            if !result
                .internal
                .is_requested_at(inputs.now_ms, inputs.recency_window_ms)
            {
                debug!("{id}: not requested, excluded from media quality");
                continue;
            }

            let current = CounterSnapshot::capture(result);
            let previous = inputs.window_start.and_then(|baseline| baseline.get(id));
            let deltas = CounterDeltas::between(&current, previous);
            let rates = IntervalRates::compute(id, &deltas, inputs.window);
            let common = CommonBlock::build(id, result, &rates, inputs.transport_type);

            match id.direction {
                MediaDirection::Send => {
                    let Some(send) = result.send.as_ref() else {
                        continue;
                    };
                    let entry = TransmitEntry {
                        media_line: *id,
                        common,
                        stream: TransmitStream::build(send, result, &deltas, &rates),
                    };
                    if id.kind.is_audio() {
                        event.audio_transmit.push(entry);
                    } else {
                        event.video_transmit.push(entry);
                    }
                }
                MediaDirection::Recv => {
                    let Some(recv) = result.recv.as_ref() else {
                        continue;
                    };
                    let entry = ReceiveEntry {
                        media_line: *id,
                        common,
                        stream: ReceiveStream::build(recv, result, &deltas, &rates),
                    };
                    if id.kind.is_audio() {
                        event.audio_receive.push(entry);
                    } else {
                        event.video_receive.push(entry);
                    }
                }
            }
        }

        event
    }

    pub fn is_empty(&self) -> bool {
        self.audio_transmit.is_empty()
            && self.audio_receive.is_empty()
            && self.video_transmit.is_empty()
            && self.video_receive.is_empty()
    }
}

impl IntervalMetadata {
    fn collect(inputs: &QualityInputs<'_>) -> Self {
        let screen = inputs.environment.screen_geometry().unwrap_or_default();
        let app_window = inputs.environment.app_window_geometry().unwrap_or_default();

        IntervalMetadata {
            peripherals: vec![
                Peripheral::of(PERIPHERAL_MICROPHONE, inputs.store, MediaKind::Audio),
                Peripheral::of(PERIPHERAL_CAMERA, inputs.store, MediaKind::Video),
            ],
            screen_width: screen.width,
            screen_height: screen.height,
            screen_resolution: screen.area(),
            app_window_width: app_window.width,
            app_window_height: app_window.height,
            peer_reflexive_ip: inputs.local_ip.to_string(),
            interval_seconds: inputs.window.as_secs_f64().round() as u64,
        }
    }
}

impl Peripheral {
    /// Names the peripheral after the track label of the main sender of `kind`.
    fn of(name: &str, store: &SampleStore, kind: MediaKind) -> Self {
        let information = store
            .get(&MediaLineId::send(kind, 0))
            .and_then(|result| result.internal.local_track_label.clone())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| UNKNOWN_PERIPHERAL.to_string());
        Peripheral {
            name: name.to_string(),
            information,
        }
    }
}

fn mean_and_max_ms(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let sum: f64 = samples.iter().sum();
    let max = samples.iter().copied().fold(0.0, f64::max);
    (sum * 1000.0 / samples.len() as f64, max * 1000.0)
}

fn frame_size(width: u32, height: u32) -> u32 {
    width.saturating_mul(height) / MACROBLOCK_PIXELS
}

impl CommonBlock {
    fn build(
        id: &MediaLineId,
        result: &StatsResult,
        rates: &IntervalRates,
        transport_type: TransportType,
    ) -> Self {
        let (round_trip_time, max_round_trip_time) =
            mean_and_max_ms(&result.internal.round_trip_times);
        let (jitter, max_jitter) = mean_and_max_ms(&result.internal.jitters);
        let ssrc = match id.direction {
            MediaDirection::Send => result.send.as_ref().and_then(|send| send.ssrc),
            MediaDirection::Recv => result.recv.as_ref().and_then(|recv| recv.ssrc),
        };

        CommonBlock {
            transport_type,
            rtp_packets: rates.rtp_packets,
            fec_packets: rates.fec_packets,
            media_hop_by_hop_lost: rates.media_hop_by_hop_lost,
            rtp_hop_by_hop_lost: rates.rtp_hop_by_hop_lost,
            remote_loss_rate: rates.remote_loss_rate,
            is_main: id.kind.is_main(),
            rtp_bitrate: rates.bitrate,
            ssrc,
            round_trip_time,
            max_round_trip_time,
            jitter,
            max_jitter,
        }
    }
}

impl TransmitStream {
    fn build(
        send: &SendRecord,
        result: &StatsResult,
        deltas: &CounterDeltas,
        rates: &IntervalRates,
    ) -> Self {
        TransmitStream {
            frame_width: send.frame_width,
            frame_height: send.frame_height,
            transmitted_frame_rate: rates.transmitted_frame_rate,
            transmitted_frame_size: frame_size(send.frame_width, send.frame_height),
            requested_bitrate: send.requested_bitrate,
            requested_frame_size: send.requested_frame_size,
            transmitted_key_frames: deltas.key_frames_encoded,
            nack_count: deltas.nack_received,
            pli_count: deltas.pli_received,
            local_track_label: result.internal.local_track_label.clone(),
        }
    }
}

impl ReceiveStream {
    fn build(
        recv: &RecvRecord,
        result: &StatsResult,
        deltas: &CounterDeltas,
        rates: &IntervalRates,
    ) -> Self {
        ReceiveStream {
            frame_width: recv.frame_width,
            frame_height: recv.frame_height,
            received_frame_rate: rates.received_frame_rate,
            received_frame_size: frame_size(recv.frame_width, recv.frame_height),
            is_active_speaker: result.internal.is_active_speaker,
            received_key_frames: deltas.key_frames_decoded,
            frames_dropped: deltas.frames_dropped,
            requested_bitrate: recv.requested_bitrate,
            mean_jitter_buffer_delay: rates.mean_jitter_buffer_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{FixedEnvironment, Geometry, UnknownEnvironment};

    fn inputs<'a>(
        store: &'a SampleStore,
        window_start: Option<&'a IntervalBaseline>,
        environment: &'a dyn HostEnvironment,
    ) -> QualityInputs<'a> {
        QualityInputs {
            store,
            window_start,
            window: Duration::from_secs(60),
            transport_type: TransportType::Udp,
            local_ip: "192.0.2.10",
            now_ms: 1_000_000,
            recency_window_ms: 30_000,
            environment,
        }
    }

    fn requested(result: &mut StatsResult) {
        result.internal.is_requested = Some(true);
        result.internal.last_seen_tick = 2;
    }

    #[test]
    fn test_receive_entry_rates_over_window() {
        let mut store = SampleStore::new();
        let id = MediaLineId::recv(MediaKind::Video, 0);
        let result = store.get_or_create(id);
        requested(result);
        let recv = result.recv_mut();
        recv.frames_decoded = 100;
        recv.frame_width = 640;
        recv.frame_height = 360;
        let window_start = IntervalBaseline::capture(&store, 1, 940_000);

        let result = store.get_or_create(id);
        result.recv_mut().frames_decoded = 400;
        result.internal.round_trip_times = vec![0.1, 0.3];

        let event = MediaQualityEvent::assemble(&inputs(
            &store,
            Some(&window_start),
            &UnknownEnvironment,
        ));
        assert_eq!(event.video_receive.len(), 1);
        let entry = &event.video_receive[0];
        assert_eq!(entry.stream.received_frame_rate, 5);
        assert_eq!(entry.stream.received_frame_size, 900);
        assert!(entry.common.is_main);
        assert_eq!(entry.common.transport_type, TransportType::Udp);
        assert_eq!(entry.common.round_trip_time, 200.0);
        assert_eq!(entry.common.max_round_trip_time, 300.0);
    }

    #[test]
    fn test_main_streams_come_first() {
        let mut store = SampleStore::new();
        for id in [
            MediaLineId::send(MediaKind::ScreenShareVideo, 0),
            MediaLineId::send(MediaKind::Video, 1),
            MediaLineId::send(MediaKind::Video, 0),
        ] {
            requested(store.get_or_create(id));
        }

        let event = MediaQualityEvent::assemble(&inputs(&store, None, &UnknownEnvironment));
        let order: Vec<String> = event
            .video_transmit
            .iter()
            .map(|entry| entry.media_line.to_string())
            .collect();
        assert_eq!(order, vec!["video-send", "video-send-1", "video-share-send"]);
        assert!(event.video_transmit[0].common.is_main);
        assert!(!event.video_transmit[2].common.is_main);
    }

    #[test]
    fn test_unrequested_lines_are_excluded() {
        let mut store = SampleStore::new();
        let kept = MediaLineId::recv(MediaKind::Audio, 0);
        let dropped = MediaLineId::recv(MediaKind::Audio, 1);
        requested(store.get_or_create(kept));
        store.get_or_create(dropped).internal.is_requested = Some(false);

        let event = MediaQualityEvent::assemble(&inputs(&store, None, &UnknownEnvironment));
        assert_eq!(event.audio_receive.len(), 1);
        assert_eq!(event.audio_receive[0].media_line, kept);
    }

    #[test]
    fn test_interval_metadata() {
        let mut store = SampleStore::new();
        store
            .get_or_create(MediaLineId::send(MediaKind::Audio, 0))
            .internal
            .local_track_label = Some("USB Microphone".to_string());
        let environment = FixedEnvironment {
            screen: Some(Geometry::new(1920, 1080)),
            app_window: Some(Geometry::new(1280, 720)),
        };

        let event = MediaQualityEvent::assemble(&inputs(&store, None, &environment));
        let metadata = &event.interval_metadata;
        assert_eq!(metadata.peripherals[0].name, PERIPHERAL_MICROPHONE);
        assert_eq!(metadata.peripherals[0].information, "USB Microphone");
        assert_eq!(metadata.peripherals[1].name, PERIPHERAL_CAMERA);
        assert_eq!(metadata.peripherals[1].information, UNKNOWN_PERIPHERAL);
        assert_eq!(metadata.screen_resolution, 1920 * 1080);
        assert_eq!(metadata.app_window_height, 720);
        assert_eq!(metadata.peer_reflexive_ip, "192.0.2.10");
        assert_eq!(metadata.interval_seconds, 60);
        assert!(event.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut store = SampleStore::new();
        requested(store.get_or_create(MediaLineId::send(MediaKind::Audio, 0)));

        let event = MediaQualityEvent::assemble(&inputs(&store, None, &UnknownEnvironment));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["audioTransmit"][0]["mediaLine"], "audio-send");
        assert_eq!(value["audioTransmit"][0]["common"]["transportType"], "UDP");
        assert_eq!(value["intervalMetadata"]["peerReflexiveIp"], "192.0.2.10");
    }
}
