//! Sample store.
//!
//! Holds the last-known raw and derived values of every media line observed
//! so far. Entries are created lazily on the first recognized report of a
//! line and are never removed: a line missing from a sweep keeps its values.

use crate::media_line::{MediaDirection, MediaLineId};
use serde::Serialize;
use std::collections::BTreeMap;

mod baseline;
mod record;

pub use baseline::{CounterSnapshot, IntervalBaseline};
pub use record::{RecvRecord, SendRecord};

/// Bookkeeping that is not exposed in quality events.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalRecord {
    /// Sequence number of the last tick that carried this line.
    pub last_seen_tick: u64,
    pub is_requested: Option<bool>,
    /// Epoch milliseconds of the last change of `is_requested`.
    pub last_requested_update_timestamp: Option<u64>,
    pub local_track_label: Option<String>,
    pub is_active_speaker: bool,

    /// Set once "no packets" has been logged, cleared when packets flow again.
    pub rtp_silent: bool,
    /// Set once "no frames" has been logged, cleared when frames flow again.
    pub frames_silent: bool,

    /// Round trip time samples (seconds) of the current quality window.
    pub round_trip_times: Vec<f64>,
    /// Jitter samples (seconds) of the current quality window.
    pub jitters: Vec<f64>,
}

impl InternalRecord {
    fn requested_recently(&self, now_ms: u64, window_ms: u64) -> bool {
        self.last_requested_update_timestamp
            .is_some_and(|ts| now_ms.saturating_sub(ts) <= window_ms)
    }

    /// Whether the stream belongs in the quality event: explicitly requested,
    /// or its request flag changed within the recency window.
    pub fn is_requested_at(&self, now_ms: u64, window_ms: u64) -> bool {
        self.is_requested == Some(true) || self.requested_recently(now_ms, window_ms)
    }

    /// Whether the stream takes part in start/stop detection. Only an
    /// explicit, settled `is_requested == false` excludes it.
    pub fn is_active_at(&self, now_ms: u64, window_ms: u64) -> bool {
        self.is_requested != Some(false) || self.requested_recently(now_ms, window_ms)
    }

    pub(crate) fn clear_window_samples(&mut self) {
        self.round_trip_times.clear();
        self.jitters.clear();
    }
}

/// Last-known values of one media line.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StatsResult {
    pub send: Option<SendRecord>,
    pub recv: Option<RecvRecord>,
    pub internal: InternalRecord,
}

impl StatsResult {
    fn new(direction: MediaDirection) -> Self {
        match direction {
            MediaDirection::Send => StatsResult {
                send: Some(SendRecord::default()),
                ..Default::default()
            },
            MediaDirection::Recv => StatsResult {
                recv: Some(RecvRecord::default()),
                ..Default::default()
            },
        }
    }

    pub fn send_mut(&mut self) -> &mut SendRecord {
        self.send.get_or_insert_with(SendRecord::default)
    }

    pub fn recv_mut(&mut self) -> &mut RecvRecord {
        self.recv.get_or_insert_with(RecvRecord::default)
    }
}

/// Mapping from media line to its [`StatsResult`], exclusively owned by the
/// analyzer.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SampleStore {
    results: BTreeMap<MediaLineId, StatsResult>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn contains(&self, id: &MediaLineId) -> bool {
        self.results.contains_key(id)
    }

    pub fn get(&self, id: &MediaLineId) -> Option<&StatsResult> {
        self.results.get(id)
    }

    pub fn get_mut(&mut self, id: &MediaLineId) -> Option<&mut StatsResult> {
        self.results.get_mut(id)
    }

    /// Gets or creates the entry of a media line.
    pub fn get_or_create(&mut self, id: MediaLineId) -> &mut StatsResult {
        self.results
            .entry(id)
            .or_insert_with(|| StatsResult::new(id.direction))
    }

    /// Iterates lines in key order: kind, direction, then index.
    pub fn iter(&self) -> impl Iterator<Item = (&MediaLineId, &StatsResult)> {
        self.results.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&MediaLineId, &mut StatsResult)> {
        self.results.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MediaLineId> {
        self.results.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_line::MediaKind;

    #[test]
    fn test_get_or_create_sets_direction_record() {
        let mut store = SampleStore::new();
        let send = MediaLineId::send(MediaKind::Audio, 0);
        let recv = MediaLineId::recv(MediaKind::Video, 1);

        store.get_or_create(send).send_mut().total_packets_sent = 10;
        store.get_or_create(recv);

        assert_eq!(store.len(), 2);
        let send_result = store.get(&send).unwrap();
        assert!(send_result.recv.is_none());
        assert_eq!(send_result.send.as_ref().unwrap().total_packets_sent, 10);
        assert!(store.get(&recv).unwrap().recv.is_some());

        store.get_or_create(send);
        assert_eq!(
            store.get(&send).unwrap().send.as_ref().unwrap().total_packets_sent,
            10
        );
    }

    #[test]
    fn test_requested_gating() {
        let window = 30_000;
        let now = 1_000_000;
        let tests = vec![
            (None, None, false, true),
            (Some(true), None, true, true),
            (Some(false), None, false, false),
            (Some(false), Some(now - 10_000), true, true),
            (Some(false), Some(now - 40_000), false, false),
            (None, Some(now - 5_000), true, true),
        ];

        for (is_requested, updated, requested, active) in tests {
            let internal = InternalRecord {
                is_requested,
                last_requested_update_timestamp: updated,
                ..Default::default()
            };
            assert_eq!(
                internal.is_requested_at(now, window),
                requested,
                "{is_requested:?}/{updated:?}"
            );
            assert_eq!(
                internal.is_active_at(now, window),
                active,
                "{is_requested:?}/{updated:?}"
            );
        }
    }
}
