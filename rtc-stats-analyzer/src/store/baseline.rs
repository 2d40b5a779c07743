use super::{SampleStore, StatsResult};
use crate::media_line::{MediaDirection, MediaLineId};
use std::collections::BTreeMap;

/// Cumulative counters of one line at a point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CounterSnapshot {
    // Send side
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub frames_sent: u64,
    pub key_frames_encoded: u64,
    pub nack_received: u64,
    pub pli_received: u64,
    pub remote_packets_lost: i64,

    // Receive side
    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_lost: i64,
    pub fec_packets_received: u64,
    pub fec_packets_discarded: u64,
    pub frames_received: u64,
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub key_frames_decoded: u64,
    pub jitter_buffer_delay: f64,
    pub jitter_buffer_emitted_count: u64,
}

impl CounterSnapshot {
    pub fn capture(result: &StatsResult) -> Self {
        let mut snapshot = CounterSnapshot::default();
        if let Some(send) = &result.send {
            snapshot.packets_sent = send.total_packets_sent;
            snapshot.bytes_sent = send.total_bytes_sent;
            snapshot.frames_sent = send.frames_sent;
            snapshot.key_frames_encoded = send.total_key_frames_encoded;
            snapshot.nack_received = u64::from(send.total_nack_count);
            snapshot.pli_received = u64::from(send.total_pli_count);
            snapshot.remote_packets_lost = send.total_packets_lost_on_receiver;
        }
        if let Some(recv) = &result.recv {
            snapshot.packets_received = recv.total_packets_received;
            snapshot.bytes_received = recv.total_bytes_received;
            snapshot.packets_lost = recv.total_packets_lost;
            snapshot.fec_packets_received = recv.fec_packets_received;
            snapshot.fec_packets_discarded = recv.fec_packets_discarded;
            snapshot.frames_received = recv.frames_received;
            snapshot.frames_decoded = recv.frames_decoded;
            snapshot.frames_dropped = recv.frames_dropped;
            snapshot.key_frames_decoded = recv.key_frames_decoded;
            snapshot.jitter_buffer_delay = recv.jitter_buffer_delay;
            snapshot.jitter_buffer_emitted_count = recv.jitter_buffer_emitted_count;
        }
        snapshot
    }

    /// The counter whose growth proves media is flowing on `id`: packets for
    /// audio, frames for video.
    pub fn liveness(&self, id: &MediaLineId) -> u64 {
        match (id.direction, id.kind.is_audio()) {
            (MediaDirection::Send, true) => self.packets_sent,
            (MediaDirection::Send, false) => self.frames_sent,
            (MediaDirection::Recv, true) => self.packets_received,
            (MediaDirection::Recv, false) => self.frames_decoded,
        }
    }

    /// Packets sent or received, depending on direction.
    pub fn rtp_packets(&self, id: &MediaLineId) -> u64 {
        match id.direction {
            MediaDirection::Send => self.packets_sent,
            MediaDirection::Recv => self.packets_received,
        }
    }
}

/// Counters of every line captured at the end of a tick or quality window.
///
/// The analyzer keeps one of these as the previous tick and one as the start
/// of the current quality window, and replaces each wholesale.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IntervalBaseline {
    /// Sequence number of the tick the baseline was captured at.
    pub tick: u64,
    /// Timestamp of the sample the baseline was captured from, epoch ms.
    pub timestamp_ms: u64,
    lines: BTreeMap<MediaLineId, CounterSnapshot>,
}

impl IntervalBaseline {
    pub fn capture(store: &SampleStore, tick: u64, timestamp_ms: u64) -> Self {
        IntervalBaseline {
            tick,
            timestamp_ms,
            lines: store
                .iter()
                .map(|(id, result)| (*id, CounterSnapshot::capture(result)))
                .collect(),
        }
    }

    pub fn get(&self, id: &MediaLineId) -> Option<&CounterSnapshot> {
        self.lines.get(id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_line::MediaKind;

    #[test]
    fn test_liveness_counter_per_line() {
        let snapshot = CounterSnapshot {
            packets_sent: 1,
            frames_sent: 2,
            packets_received: 3,
            frames_decoded: 4,
            ..Default::default()
        };

        assert_eq!(snapshot.liveness(&MediaLineId::send(MediaKind::Audio, 0)), 1);
        assert_eq!(snapshot.liveness(&MediaLineId::send(MediaKind::Video, 0)), 2);
        assert_eq!(
            snapshot.liveness(&MediaLineId::send(MediaKind::ScreenShareVideo, 0)),
            2
        );
        assert_eq!(snapshot.liveness(&MediaLineId::recv(MediaKind::Audio, 0)), 3);
        assert_eq!(snapshot.liveness(&MediaLineId::recv(MediaKind::Video, 1)), 4);
    }

    #[test]
    fn test_capture_copies_every_line() {
        let mut store = SampleStore::new();
        let id = MediaLineId::send(MediaKind::Audio, 0);
        store.get_or_create(id).send_mut().total_packets_sent = 42;
        store.get_or_create(MediaLineId::recv(MediaKind::Audio, 0));

        let baseline = IntervalBaseline::capture(&store, 7, 35_000);
        assert_eq!(baseline.tick, 7);
        assert_eq!(baseline.timestamp_ms, 35_000);
        assert_eq!(baseline.len(), 2);
        assert_eq!(baseline.get(&id).unwrap().packets_sent, 42);
    }
}
