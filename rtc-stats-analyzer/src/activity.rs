//! Media start/stop detection.
//!
//! Every tick the liveness counter of each line (packets for audio, frames for
//! video and share) is compared with the previous tick. Lines are grouped by
//! media type and locality; a group is live when any of its active lines
//! moved. Each group runs a small state machine:
//!
//! ```text
//! NotStarted --live--> Started --idle--> Stopped --live--> Started
//! ```
//!
//! so a Stopped transition is reported once, however many idle ticks follow.

use crate::media_line::{Locality, MediaLineId, MediaType};
use crate::rate::counter_delta;
use crate::store::{CounterSnapshot, IntervalBaseline, SampleStore};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MediaActivityState {
    #[default]
    NotStarted,
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityTransition {
    Started,
    Stopped,
}

/// Lines whose activity is reported together, e.g. all remote video streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivityGroup {
    pub media_type: MediaType,
    pub locality: Locality,
}

impl ActivityGroup {
    pub fn of(id: &MediaLineId) -> Option<Self> {
        id.kind.media_type().map(|media_type| ActivityGroup {
            media_type,
            locality: id.locality(),
        })
    }
}

#[derive(Debug, Default)]
pub struct ActivityDetector {
    states: BTreeMap<ActivityGroup, MediaActivityState>,
}

impl ActivityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, group: &ActivityGroup) -> MediaActivityState {
        self.states.get(group).copied().unwrap_or_default()
    }

    /// Feeds one tick of a group and returns the transition it caused, if any.
    pub fn observe(&mut self, group: ActivityGroup, live: bool) -> Option<ActivityTransition> {
        let state = self.states.entry(group).or_default();
        match (*state, live) {
            (MediaActivityState::NotStarted | MediaActivityState::Stopped, true) => {
                *state = MediaActivityState::Started;
                Some(ActivityTransition::Started)
            }
            (MediaActivityState::Started, false) => {
                *state = MediaActivityState::Stopped;
                Some(ActivityTransition::Stopped)
            }
            _ => None,
        }
    }

    /// Compares the store against the previous tick and returns the
    /// transitions of this tick in group order.
    ///
    /// `is_active` decides which lines take part; see
    /// [`InternalRecord::is_active_at`](crate::store::InternalRecord::is_active_at).
    pub fn detect<F>(
        &mut self,
        store: &SampleStore,
        previous: Option<&IntervalBaseline>,
        is_active: F,
    ) -> Vec<(ActivityGroup, ActivityTransition)>
    where
        F: Fn(&MediaLineId) -> bool,
    {
        let mut live: BTreeMap<ActivityGroup, bool> = self
            .states
            .keys()
            .map(|group| (*group, false))
            .collect();

        for (id, result) in store.iter() {
            let Some(group) = ActivityGroup::of(id) else {
                continue;
            };
            if !is_active(id) {
                continue;
            }
            let current = CounterSnapshot::capture(result).liveness(id);
            let before = previous
                .and_then(|baseline| baseline.get(id))
                .map(|snapshot| snapshot.liveness(id))
                .unwrap_or(0);
            let moved = counter_delta(current, before) > 0;
            *live.entry(group).or_insert(false) |= moved;
        }

        live.into_iter()
            .filter_map(|(group, live)| {
                self.observe(group, live)
                    .map(|transition| (group, transition))
            })
            .collect()
    }
}
