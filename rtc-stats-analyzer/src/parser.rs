//! Report parser.
//!
//! Folds the fragments of one transceiver snapshot into the [`SampleStore`].
//! Local stream fragments are applied before the remote views of the same
//! report, so loss reported by the remote receiver is always compared with
//! the packet count of the same sweep.

use crate::media_line::{MediaKind, MediaLineId};
use crate::rate::{counter_delta, loss_ratio, signed_counter_delta};
use crate::report::RTCStatsReportFragment;
use crate::report::ice::{
    RTCIceCandidateFragment, RTCIceCandidatePairFragment, RTCIceCandidateType,
    RTCIceServerTransportProtocol, RTCStatsIceCandidatePairState, TransportType,
};
use crate::report::media_source::RTCMediaSourceFragment;
use crate::report::rtp_stream::{
    RTCInboundRtpFragment, RTCOutboundRtpFragment, RTCRemoteInboundRtpFragment,
};
use crate::store::{RecvRecord, SampleStore, SendRecord, StatsResult};
use crate::transceiver::TransceiverStats;
use log::{debug, info, trace};
use std::collections::HashMap;

/// Overwrites each destination with its source when the source is present.
macro_rules! assign_present {
    ($($dst:expr => $src:expr),* $(,)?) => {
        $(
            if let Some(value) = $src {
                $dst = value;
            }
        )*
    };
}

/// Local end of the selected candidate pair.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalPath {
    /// Empty when the candidate type carries no usable address.
    pub ip: String,
    pub transport_type: Option<TransportType>,
}

/// What a sweep learned besides per-line counters.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepOutcome {
    /// First succeeded candidate pair of the sweep.
    pub selected_path: Option<LocalPath>,
    /// Remote receiver reports of send lines, in sweep order.
    pub remote_reports: Vec<(MediaLineId, RTCRemoteInboundRtpFragment)>,
    /// Lines that carried at least one recognized fragment.
    pub observed: Vec<MediaLineId>,
}

/// Parses snapshots into a store.
#[derive(Debug, Clone, Copy)]
pub struct ReportParser {
    /// Percent.
    packet_loss_threshold: f64,
}

impl ReportParser {
    pub fn new(packet_loss_threshold: f64) -> Self {
        ReportParser {
            packet_loss_threshold,
        }
    }

    /// Parses every sender and receiver of `stats`. Lines are keyed by kind,
    /// direction and position in the snapshot.
    pub fn parse_transceiver_stats(
        &self,
        store: &mut SampleStore,
        stats: &TransceiverStats,
        tick: u64,
    ) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        for kind in MediaKind::ALL {
            let kind_stats = stats.kind(kind);
            for (index, sender) in kind_stats.senders.iter().enumerate() {
                let id = MediaLineId::send(kind, index);
                self.parse_report(store, id, &sender.report, tick, &mut outcome);
                if let Some(result) = store.get_mut(&id) {
                    let internal = &mut result.internal;
                    internal.is_requested = sender.is_requested;
                    internal.last_requested_update_timestamp =
                        sender.last_requested_update_timestamp;
                    if sender.local_track_label.is_some() {
                        internal.local_track_label = sender.local_track_label.clone();
                    }
                }
            }
            for (index, receiver) in kind_stats.receivers.iter().enumerate() {
                let id = MediaLineId::recv(kind, index);
                self.parse_report(store, id, &receiver.report, tick, &mut outcome);
                if let Some(result) = store.get_mut(&id) {
                    let internal = &mut result.internal;
                    internal.is_requested = receiver.is_requested;
                    internal.last_requested_update_timestamp =
                        receiver.last_requested_update_timestamp;
                    internal.is_active_speaker = receiver.is_active_speaker.unwrap_or(false);
                }
            }
        }

        outcome
    }

    /// Parses the `report` array of one line.
    pub fn parse_report(
        &self,
        store: &mut SampleStore,
        id: MediaLineId,
        report: &[RTCStatsReportFragment],
        tick: u64,
        outcome: &mut SweepOutcome,
    ) {
        let candidates: HashMap<&str, &RTCIceCandidateFragment> = report
            .iter()
            .filter_map(|fragment| match fragment {
                RTCStatsReportFragment::LocalCandidate(candidate) => {
                    Some((candidate.id.as_str(), candidate))
                }
                _ => None,
            })
            .collect();

        let mut observed = false;
        let mut outbound: Vec<&RTCOutboundRtpFragment> = vec![];

        for fragment in report {
            match fragment {
                RTCStatsReportFragment::OutboundRtp(stats) => {
                    if id.is_send() {
                        outbound.push(stats);
                    } else {
                        trace!("{id}: ignoring outbound-rtp {} on a receive line", stats.id);
                    }
                }
                RTCStatsReportFragment::InboundRtp(stats) => {
                    if id.is_send() {
                        trace!("{id}: ignoring inbound-rtp {} on a send line", stats.id);
                    } else {
                        let result = store.get_or_create(id);
                        self.process_inbound(&id, result.recv_mut(), stats);
                        observed = true;
                    }
                }
                RTCStatsReportFragment::MediaSource(stats) => {
                    if id.is_send() && id.kind.is_audio() {
                        process_media_source(store.get_or_create(id).send_mut(), stats);
                        observed = true;
                    }
                }
                RTCStatsReportFragment::CandidatePair(pair) => {
                    if outcome.selected_path.is_none() {
                        outcome.selected_path = resolve_local_path(pair, &candidates);
                    }
                }
                RTCStatsReportFragment::RemoteInboundRtp(_)
                | RTCStatsReportFragment::RemoteOutboundRtp(_)
                | RTCStatsReportFragment::LocalCandidate(_)
                | RTCStatsReportFragment::Unknown => {}
            }
        }

        if let Some(merged) = merge_layers(&outbound) {
            process_outbound(store.get_or_create(id).send_mut(), &merged);
            observed = true;
        }

        for fragment in report {
            match fragment {
                RTCStatsReportFragment::RemoteInboundRtp(stats) => {
                    let result = store.get_or_create(id);
                    if id.is_send() {
                        self.compare_sent_and_received(&id, result, stats);
                        outcome.remote_reports.push((id, stats.clone()));
                    } else {
                        record_remote_round_trip_time(result, stats.round_trip_time);
                    }
                    observed = true;
                }
                RTCStatsReportFragment::RemoteOutboundRtp(stats) => {
                    if id.is_send() {
                        trace!("{id}: ignoring remote-outbound-rtp {} on a send line", stats.id);
                    } else {
                        record_remote_round_trip_time(store.get_or_create(id), stats.round_trip_time);
                        observed = true;
                    }
                }
                _ => {}
            }
        }

        if observed {
            if let Some(result) = store.get_mut(&id) {
                result.internal.last_seen_tick = tick;
            }
            outcome.observed.push(id);
        }
    }

    fn process_inbound(&self, id: &MediaLineId, recv: &mut RecvRecord, stats: &RTCInboundRtpFragment) {
        let lost_delta = stats
            .packets_lost
            .map(|lost| signed_counter_delta(lost, recv.total_packets_lost))
            .unwrap_or(0);
        let received_delta = stats
            .packets_received
            .map(|received| counter_delta(received, recv.total_packets_received))
            .unwrap_or(0);
        recv.current_packet_loss_ratio = loss_ratio(lost_delta, received_delta);
        if id.kind.is_video() && recv.current_packet_loss_ratio * 100.0 > self.packet_loss_threshold {
            info!(
                "{id}: packet loss {:.2}% above threshold {}%",
                recv.current_packet_loss_ratio * 100.0,
                self.packet_loss_threshold
            );
        }

        if stats.ssrc.is_some() {
            recv.ssrc = stats.ssrc;
        }
        assign_present!(
            recv.total_bytes_received => stats.bytes_received,
            recv.header_bytes_received => stats.header_bytes_received,
            recv.total_packets_received => stats.packets_received,
            recv.total_packets_lost => stats.packets_lost,
            recv.packets_discarded => stats.packets_discarded,
            recv.fec_packets_received => stats.fec_packets_received,
            recv.fec_packets_discarded => stats.fec_packets_discarded,
            recv.retransmitted_bytes_received => stats.retransmitted_bytes_received,
            recv.retransmitted_packets_received => stats.retransmitted_packets_received,
            recv.jitter => stats.jitter,
            recv.jitter_buffer_delay => stats.jitter_buffer_delay,
            recv.jitter_buffer_emitted_count => stats.jitter_buffer_emitted_count,
            recv.total_nack_count => stats.nack_count,
            recv.total_pli_count => stats.pli_count,
            recv.total_fir_count => stats.fir_count,
            recv.frames_received => stats.frames_received,
            recv.frames_decoded => stats.frames_decoded,
            recv.frames_dropped => stats.frames_dropped,
            recv.key_frames_decoded => stats.key_frames_decoded,
            recv.frame_width => stats.frame_width,
            recv.frame_height => stats.frame_height,
            recv.frames_per_second => stats.frames_per_second,
            recv.audio_level => stats.audio_level,
            recv.total_audio_energy => stats.total_audio_energy,
            recv.total_samples_received => stats.total_samples_received,
            recv.total_samples_duration => stats.total_samples_duration,
            recv.concealed_samples => stats.concealed_samples,
            recv.concealment_events => stats.concealment_events,
            recv.requested_bitrate => stats.requested_bitrate,
        );
        if stats.decoder_implementation.is_some() {
            recv.decoder_implementation = stats.decoder_implementation.clone();
        }
    }

    /// Merges the remote receiver's view into a send line.
    fn compare_sent_and_received(
        &self,
        id: &MediaLineId,
        result: &mut StatsResult,
        stats: &RTCRemoteInboundRtpFragment,
    ) {
        let StatsResult { send, internal, .. } = result;
        let send = send.get_or_insert_with(SendRecord::default);

        if let Some(lost) = stats.packets_lost {
            let lost_since = signed_counter_delta(lost, send.total_packets_lost_on_receiver);
            let sent_since = counter_delta(
                send.total_packets_sent,
                send.packets_sent_at_last_remote_report,
            );
            send.packets_lost_on_receiver = lost_since as i64;
            send.total_packets_lost_on_receiver = lost;
            send.current_packet_loss_ratio = if sent_since > 0 {
                (lost_since as f64 / sent_since as f64).min(1.0)
            } else {
                0.0
            };
            send.overall_packet_loss_ratio = if send.total_packets_sent > 0 {
                (lost.max(0) as f64 / send.total_packets_sent as f64).min(1.0)
            } else {
                0.0
            };
            send.max_packet_loss_ratio = send
                .max_packet_loss_ratio
                .max(send.current_packet_loss_ratio);
            send.packets_sent_at_last_remote_report = send.total_packets_sent;

            if send.current_packet_loss_ratio * 100.0 > self.packet_loss_threshold {
                info!(
                    "{id}: receiver reports {:.2}% packet loss, {lost_since} of {sent_since} packets",
                    send.current_packet_loss_ratio * 100.0
                );
            }
        }

        if let Some(jitter) = stats.jitter {
            send.remote_jitter = jitter;
            internal.jitters.push(jitter);
        }
        if let Some(rtt) = stats.round_trip_time {
            send.round_trip_time = rtt;
            internal.round_trip_times.push(rtt);
        }
        assign_present!(
            send.fraction_lost => stats.fraction_lost,
            send.reports_received => stats.reports_received,
        );
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        ReportParser::new(crate::config::DEFAULT_VIDEO_PACKET_LOSS_RATIO_THRESHOLD)
    }
}

fn sum<T: std::ops::Add<Output = T>>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

fn max<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b > a { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Combines the outbound streams of one sender (simulcast layers) into one.
/// Counters add up; dimensions and frame rate follow the largest layer.
fn merge_layers(layers: &[&RTCOutboundRtpFragment]) -> Option<RTCOutboundRtpFragment> {
    let (first, rest) = layers.split_first()?;
    let mut merged = (*first).clone();
    for layer in rest {
        merged.bytes_sent = sum(merged.bytes_sent, layer.bytes_sent);
        merged.header_bytes_sent = sum(merged.header_bytes_sent, layer.header_bytes_sent);
        merged.packets_sent = sum(merged.packets_sent, layer.packets_sent);
        merged.retransmitted_bytes_sent =
            sum(merged.retransmitted_bytes_sent, layer.retransmitted_bytes_sent);
        merged.retransmitted_packets_sent =
            sum(merged.retransmitted_packets_sent, layer.retransmitted_packets_sent);
        merged.nack_count = sum(merged.nack_count, layer.nack_count);
        merged.pli_count = sum(merged.pli_count, layer.pli_count);
        merged.fir_count = sum(merged.fir_count, layer.fir_count);
        merged.frames_sent = sum(merged.frames_sent, layer.frames_sent);
        merged.frames_encoded = sum(merged.frames_encoded, layer.frames_encoded);
        merged.key_frames_encoded = sum(merged.key_frames_encoded, layer.key_frames_encoded);
        merged.target_bitrate = sum(merged.target_bitrate, layer.target_bitrate);
        merged.frame_width = max(merged.frame_width, layer.frame_width);
        merged.frame_height = max(merged.frame_height, layer.frame_height);
        merged.frames_per_second = max(merged.frames_per_second, layer.frames_per_second);
        merged.requested_bitrate = merged.requested_bitrate.or(layer.requested_bitrate);
        merged.requested_frame_size = merged.requested_frame_size.or(layer.requested_frame_size);
        if merged.quality_limitation_reason.is_none() {
            merged.quality_limitation_reason = layer.quality_limitation_reason.clone();
        }
    }
    Some(merged)
}

fn process_outbound(send: &mut SendRecord, stats: &RTCOutboundRtpFragment) {
    if stats.ssrc.is_some() {
        send.ssrc = stats.ssrc;
    }
    assign_present!(
        send.total_bytes_sent => stats.bytes_sent,
        send.header_bytes_sent => stats.header_bytes_sent,
        send.total_packets_sent => stats.packets_sent,
        send.retransmitted_bytes_sent => stats.retransmitted_bytes_sent,
        send.retransmitted_packets_sent => stats.retransmitted_packets_sent,
        send.total_nack_count => stats.nack_count,
        send.total_pli_count => stats.pli_count,
        send.total_fir_count => stats.fir_count,
        send.frames_sent => stats.frames_sent,
        send.frames_encoded => stats.frames_encoded,
        send.total_key_frames_encoded => stats.key_frames_encoded,
        send.frame_width => stats.frame_width,
        send.frame_height => stats.frame_height,
        send.frames_per_second => stats.frames_per_second,
        send.target_bitrate => stats.target_bitrate,
        send.requested_bitrate => stats.requested_bitrate,
        send.requested_frame_size => stats.requested_frame_size,
    );
    if stats.encoder_implementation.is_some() {
        send.encoder_implementation = stats.encoder_implementation.clone();
    }
    if stats.quality_limitation_reason.is_some() {
        send.quality_limitation_reason = stats.quality_limitation_reason.clone();
    }
}

fn process_media_source(send: &mut SendRecord, stats: &RTCMediaSourceFragment) {
    assign_present!(
        send.audio_level => stats.audio_level,
        send.total_audio_energy => stats.total_audio_energy,
        send.total_samples_duration => stats.total_samples_duration,
    );
}

fn record_remote_round_trip_time(result: &mut StatsResult, rtt: Option<f64>) {
    let Some(rtt) = rtt else {
        return;
    };
    let StatsResult { recv, internal, .. } = result;
    recv.get_or_insert_with(RecvRecord::default).remote_round_trip_time = rtt;
    internal.round_trip_times.push(rtt);
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Resolves the local address and transport of a succeeded candidate pair
/// from the local candidates of the same report.
pub fn resolve_local_path(
    pair: &RTCIceCandidatePairFragment,
    candidates: &HashMap<&str, &RTCIceCandidateFragment>,
) -> Option<LocalPath> {
    if pair.pair_state() != RTCStatsIceCandidatePairState::Succeeded {
        return None;
    }
    let local_id = pair.local_candidate_id.as_deref()?;
    let Some(candidate) = candidates.get(local_id) else {
        debug!("candidate pair {} references unknown local candidate {local_id}", pair.id);
        return None;
    };

    let mut transport_type = candidate.transport_type();
    let ip = match candidate.typ() {
        RTCIceCandidateType::Host => non_empty(&candidate.address).unwrap_or_default(),
        RTCIceCandidateType::Prflx => non_empty(&candidate.related_address)
            .or_else(|| non_empty(&candidate.address))
            .unwrap_or_else(|| {
                // No address at all: a relayed path, typed by its relay protocol.
                if candidate.relay_protocol.is_some() {
                    transport_type = Some(
                        TransportType::classify(
                            RTCIceServerTransportProtocol::Unspecified,
                            candidate.relay_transport_protocol(),
                        )
                        .unwrap_or(TransportType::Tls),
                    );
                }
                String::new()
            }),
        _ => String::new(),
    };

    Some(LocalPath { ip, transport_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragments(value: serde_json::Value) -> Vec<RTCStatsReportFragment> {
        serde_json::from_value::<Vec<serde_json::Value>>(value)
            .unwrap()
            .into_iter()
            .filter_map(RTCStatsReportFragment::from_value)
            .collect()
    }

    fn parse(store: &mut SampleStore, id: MediaLineId, report: serde_json::Value) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        ReportParser::default().parse_report(store, id, &fragments(report), 1, &mut outcome);
        outcome
    }

    #[test]
    fn test_outbound_creates_send_line() {
        let mut store = SampleStore::new();
        let id = MediaLineId::send(MediaKind::Audio, 0);
        let outcome = parse(
            &mut store,
            id,
            json!([{"type": "outbound-rtp", "id": "OT01", "packetsSent": 3600, "headerBytesSent": 25000}]),
        );

        let send = store.get(&id).unwrap().send.as_ref().unwrap();
        assert_eq!(send.total_packets_sent, 3600);
        assert_eq!(send.header_bytes_sent, 25000);
        assert_eq!(store.get(&id).unwrap().internal.last_seen_tick, 1);
        assert_eq!(outcome.observed, vec![id]);
    }

    #[test]
    fn test_unknown_fragments_create_nothing() {
        let mut store = SampleStore::new();
        let outcome = parse(
            &mut store,
            MediaLineId::recv(MediaKind::Video, 0),
            json!([{"type": "codec", "id": "C1"}, {"type": "transport", "id": "T1"}, {"id": "no-type"}]),
        );
        assert!(store.is_empty());
        assert!(outcome.observed.is_empty());
    }

    #[test]
    fn test_simulcast_layers_are_summed() {
        let mut store = SampleStore::new();
        let id = MediaLineId::send(MediaKind::Video, 0);
        parse(
            &mut store,
            id,
            json!([
                {"type": "outbound-rtp", "id": "l", "packetsSent": 100, "framesSent": 30, "frameWidth": 320, "frameHeight": 180},
                {"type": "outbound-rtp", "id": "h", "packetsSent": 400, "framesSent": 30, "frameWidth": 1280, "frameHeight": 720},
            ]),
        );

        let send = store.get(&id).unwrap().send.as_ref().unwrap();
        assert_eq!(send.total_packets_sent, 500);
        assert_eq!(send.frames_sent, 60);
        assert_eq!(send.frame_width, 1280);
        assert_eq!(send.frame_height, 720);
    }

    #[test]
    fn test_remote_inbound_merges_loss() {
        let mut store = SampleStore::new();
        let id = MediaLineId::send(MediaKind::Video, 0);
        let outcome = parse(
            &mut store,
            id,
            json!([
                {"type": "remote-inbound-rtp", "id": "RI1", "packetsLost": 10, "roundTripTime": 0.12, "jitter": 0.004},
                {"type": "outbound-rtp", "id": "OT1", "packetsSent": 200},
            ]),
        );

        let result = store.get(&id).unwrap();
        let send = result.send.as_ref().unwrap();
        assert_eq!(send.total_packets_lost_on_receiver, 10);
        assert_eq!(send.packets_lost_on_receiver, 10);
        assert_eq!(send.current_packet_loss_ratio, 0.05);
        assert_eq!(send.max_packet_loss_ratio, 0.05);
        assert_eq!(send.round_trip_time, 0.12);
        assert_eq!(result.internal.round_trip_times, vec![0.12]);
        assert_eq!(result.internal.jitters, vec![0.004]);
        assert_eq!(outcome.remote_reports.len(), 1);
        assert_eq!(outcome.remote_reports[0].0, id);
    }

    #[test]
    fn test_remote_reports_on_receive_lines_only_record_rtt() {
        let mut store = SampleStore::new();
        let id = MediaLineId::recv(MediaKind::Audio, 0);
        let outcome = parse(
            &mut store,
            id,
            json!([{"type": "remote-outbound-rtp", "id": "RO1", "roundTripTime": 0.08}]),
        );

        let result = store.get(&id).unwrap();
        assert_eq!(result.recv.as_ref().unwrap().remote_round_trip_time, 0.08);
        assert!(result.send.is_none());
        assert!(outcome.remote_reports.is_empty());
    }

    #[test]
    fn test_remote_outbound_on_send_line_is_ignored() {
        let mut store = SampleStore::new();
        let id = MediaLineId::send(MediaKind::Audio, 0);
        let outcome = parse(
            &mut store,
            id,
            json!([{"type": "remote-outbound-rtp", "id": "RO1", "roundTripTime": 0.08}]),
        );
        assert!(store.is_empty());
        assert!(outcome.observed.is_empty());

        parse(
            &mut store,
            id,
            json!([
                {"type": "remote-inbound-rtp", "id": "RI1", "roundTripTime": 0.05},
                {"type": "remote-outbound-rtp", "id": "RO1", "roundTripTime": 0.08}
            ]),
        );
        let result = store.get(&id).unwrap();
        assert_eq!(result.send.as_ref().unwrap().round_trip_time, 0.05);
        assert_eq!(result.internal.round_trip_times, vec![0.05]);
    }

    #[test]
    fn test_inbound_loss_ratio_per_report() {
        let mut store = SampleStore::new();
        let id = MediaLineId::recv(MediaKind::Video, 0);
        parse(
            &mut store,
            id,
            json!([{"type": "inbound-rtp", "id": "IT1", "packetsReceived": 90, "packetsLost": 10}]),
        );
        let recv = store.get(&id).unwrap().recv.as_ref().unwrap();
        assert_eq!(recv.current_packet_loss_ratio, 0.1);

        parse(
            &mut store,
            id,
            json!([{"type": "inbound-rtp", "id": "IT1", "packetsReceived": 190, "packetsLost": 10}]),
        );
        let recv = store.get(&id).unwrap().recv.as_ref().unwrap();
        assert_eq!(recv.current_packet_loss_ratio, 0.0);
        assert_eq!(recv.total_packets_received, 190);
    }

    #[test]
    fn test_media_source_only_for_audio_senders() {
        let mut store = SampleStore::new();
        let audio = MediaLineId::send(MediaKind::Audio, 0);
        let video = MediaLineId::send(MediaKind::Video, 0);
        let report = json!([{"type": "media-source", "id": "S1", "audioLevel": 0.5}]);
        parse(&mut store, audio, report.clone());
        parse(&mut store, video, report);

        assert_eq!(store.get(&audio).unwrap().send.as_ref().unwrap().audio_level, 0.5);
        assert!(!store.contains(&video));
    }

    fn local_path(candidate: serde_json::Value) -> Option<LocalPath> {
        let mut candidate = candidate;
        candidate["type"] = json!("local-candidate");
        candidate["id"] = json!("L1");
        let report = fragments(json!([
            {"type": "candidate-pair", "id": "CP1", "state": "succeeded", "localCandidateId": "L1"},
            candidate,
        ]));
        let mut store = SampleStore::new();
        let mut outcome = SweepOutcome::default();
        ReportParser::default().parse_report(
            &mut store,
            MediaLineId::send(MediaKind::Audio, 0),
            &report,
            1,
            &mut outcome,
        );
        outcome.selected_path
    }

    #[test]
    fn test_local_ip_resolution() {
        let tests = vec![
            (json!({"candidateType": "host", "address": "test"}), "test"),
            (
                json!({"candidateType": "prflx", "relayProtocol": "test", "address": "test2"}),
                "test2",
            ),
            (
                json!({"candidateType": "prflx", "relatedAddress": "10.0.0.1", "address": "test2"}),
                "10.0.0.1",
            ),
            (json!({"candidateType": "invalid", "address": "test"}), ""),
            (json!({"candidateType": "srflx", "address": "test"}), ""),
        ];

        for (candidate, expected) in tests {
            let path = local_path(candidate.clone()).unwrap();
            assert_eq!(path.ip, expected, "{candidate}");
        }
    }

    #[test]
    fn test_transport_type_from_local_candidate() {
        let tests = vec![
            (json!({"candidateType": "host", "protocol": "udp"}), Some(TransportType::Udp)),
            (json!({"candidateType": "host", "protocol": "tcp"}), Some(TransportType::Tcp)),
            (
                json!({"candidateType": "relay", "protocol": "udp", "relayProtocol": "tls"}),
                Some(TransportType::Tls),
            ),
            (json!({"candidateType": "prflx", "relayProtocol": "tcp"}), Some(TransportType::Tcp)),
            (json!({"candidateType": "prflx", "relayProtocol": "test"}), Some(TransportType::Tls)),
            (json!({"candidateType": "host"}), None),
        ];

        for (candidate, expected) in tests {
            let path = local_path(candidate.clone()).unwrap();
            assert_eq!(path.transport_type, expected, "{candidate}");
        }
    }

    #[test]
    fn test_pair_must_succeed() {
        let report = fragments(json!([
            {"type": "candidate-pair", "id": "CP1", "state": "in-progress", "localCandidateId": "L1"},
            {"type": "local-candidate", "id": "L1", "candidateType": "host", "address": "test"},
        ]));
        let mut store = SampleStore::new();
        let mut outcome = SweepOutcome::default();
        ReportParser::default().parse_report(
            &mut store,
            MediaLineId::send(MediaKind::Audio, 0),
            &report,
            1,
            &mut outcome,
        );
        assert_eq!(outcome.selected_path, None);
    }
}
