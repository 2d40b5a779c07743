//! Delta and rate computation between two counter snapshots.
//!
//! Counters only move forward unless the stream was reset (new SSRC or
//! track). A counter that went backwards is measured against a zero baseline,
//! so deltas and rates are never negative. A missing previous snapshot is a
//! zero baseline as well.

use crate::media_line::{MediaDirection, MediaLineId};
use crate::store::{CounterSnapshot, IntervalBaseline, SampleStore};
use std::time::Duration;

/// Growth of a cumulative counter.
pub fn counter_delta(current: u64, previous: u64) -> u64 {
    if current < previous {
        current
    } else {
        current - previous
    }
}

/// Growth of a signed cumulative counter such as packets lost, floored at 0.
pub fn signed_counter_delta(current: i64, previous: i64) -> u64 {
    if current < previous {
        current.max(0) as u64
    } else {
        (current - previous) as u64
    }
}

pub fn per_second(delta: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        delta as f64 / secs
    } else {
        0.0
    }
}

/// Time from a baseline taken at `baseline_ms` to a sample taken at `now_ms`.
/// Without a baseline, or when the clock did not move forward, `fallback` is
/// assumed.
pub fn elapsed_since(baseline_ms: Option<u64>, now_ms: u64, fallback: Duration) -> Duration {
    match baseline_ms {
        Some(start) if now_ms > start => Duration::from_millis(now_ms - start),
        _ => fallback,
    }
}

/// Frames per second over `elapsed`, rounded to the nearest integer.
pub fn frame_rate(frames_delta: u64, elapsed: Duration) -> u32 {
    per_second(frames_delta, elapsed).round() as u32
}

/// Bits per second from a byte delta.
pub fn bitrate(bytes_delta: u64, elapsed: Duration) -> f64 {
    per_second(bytes_delta.saturating_mul(8), elapsed)
}

/// Percentage of sent packets the remote receiver reported lost.
pub fn remote_loss_rate(lost_delta: u64, sent_delta: u64) -> f64 {
    if sent_delta == 0 {
        return 0.0;
    }
    let rate = lost_delta as f64 * 100.0 / sent_delta as f64;
    if rate.is_finite() { rate.max(0.0) } else { 0.0 }
}

/// Lost share of expected packets (received + lost), as a ratio.
pub fn loss_ratio(lost_delta: u64, received_delta: u64) -> f64 {
    loss_percentage(lost_delta, received_delta) / 100.0
}

/// Lost share of expected packets (received + lost), in percent.
pub fn loss_percentage(lost_delta: u64, received_delta: u64) -> f64 {
    let expected = lost_delta + received_delta;
    if expected == 0 {
        0.0
    } else {
        lost_delta as f64 * 100.0 / expected as f64
    }
}

/// FEC packets that were actually used to repair the stream.
pub fn fec_packets(received_delta: u64, discarded_delta: u64) -> u64 {
    received_delta.saturating_sub(discarded_delta)
}

/// Counter growth of one line between two snapshots.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CounterDeltas {
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub frames_sent: u64,
    pub key_frames_encoded: u64,
    pub nack_received: u64,
    pub pli_received: u64,
    pub remote_packets_lost: u64,

    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_lost: u64,
    pub fec_packets_received: u64,
    pub fec_packets_discarded: u64,
    pub frames_received: u64,
    pub frames_decoded: u64,
    pub frames_dropped: u64,
    pub key_frames_decoded: u64,
    /// Seconds.
    pub jitter_buffer_delay: f64,
    pub jitter_buffer_emitted_count: u64,
}

impl CounterDeltas {
    pub fn between(current: &CounterSnapshot, previous: Option<&CounterSnapshot>) -> Self {
        let zero = CounterSnapshot::default();
        let prev = previous.unwrap_or(&zero);

        // jitterBufferDelay resets together with its emitted count.
        let jitter_buffer_delay = if current.jitter_buffer_emitted_count
            < prev.jitter_buffer_emitted_count
            || current.jitter_buffer_delay < prev.jitter_buffer_delay
        {
            current.jitter_buffer_delay
        } else {
            current.jitter_buffer_delay - prev.jitter_buffer_delay
        };

        CounterDeltas {
            packets_sent: counter_delta(current.packets_sent, prev.packets_sent),
            bytes_sent: counter_delta(current.bytes_sent, prev.bytes_sent),
            frames_sent: counter_delta(current.frames_sent, prev.frames_sent),
            key_frames_encoded: counter_delta(current.key_frames_encoded, prev.key_frames_encoded),
            nack_received: counter_delta(current.nack_received, prev.nack_received),
            pli_received: counter_delta(current.pli_received, prev.pli_received),
            remote_packets_lost: signed_counter_delta(
                current.remote_packets_lost,
                prev.remote_packets_lost,
            ),
            packets_received: counter_delta(current.packets_received, prev.packets_received),
            bytes_received: counter_delta(current.bytes_received, prev.bytes_received),
            packets_lost: signed_counter_delta(current.packets_lost, prev.packets_lost),
            fec_packets_received: counter_delta(
                current.fec_packets_received,
                prev.fec_packets_received,
            ),
            fec_packets_discarded: counter_delta(
                current.fec_packets_discarded,
                prev.fec_packets_discarded,
            ),
            frames_received: counter_delta(current.frames_received, prev.frames_received),
            frames_decoded: counter_delta(current.frames_decoded, prev.frames_decoded),
            frames_dropped: counter_delta(current.frames_dropped, prev.frames_dropped),
            key_frames_decoded: counter_delta(current.key_frames_decoded, prev.key_frames_decoded),
            jitter_buffer_delay: jitter_buffer_delay.max(0.0),
            jitter_buffer_emitted_count: counter_delta(
                current.jitter_buffer_emitted_count,
                prev.jitter_buffer_emitted_count,
            ),
        }
    }
}

/// Rates of one line over one interval.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct IntervalRates {
    pub transmitted_frame_rate: u32,
    pub received_frame_rate: u32,
    /// Percent. On receive lines, the locally observed loss of the stream.
    pub remote_loss_rate: f64,
    pub rtp_packets: u64,
    pub fec_packets: u64,
    pub media_hop_by_hop_lost: u64,
    pub rtp_hop_by_hop_lost: u64,
    /// Bits per second.
    pub bitrate: f64,
    /// Milliseconds per emitted sample.
    pub mean_jitter_buffer_delay: f64,
}

impl IntervalRates {
    pub fn compute(id: &MediaLineId, deltas: &CounterDeltas, elapsed: Duration) -> Self {
        match id.direction {
            MediaDirection::Send => IntervalRates {
                transmitted_frame_rate: frame_rate(deltas.frames_sent, elapsed),
                remote_loss_rate: remote_loss_rate(deltas.remote_packets_lost, deltas.packets_sent),
                rtp_packets: deltas.packets_sent,
                media_hop_by_hop_lost: deltas.remote_packets_lost,
                rtp_hop_by_hop_lost: deltas.remote_packets_lost,
                bitrate: bitrate(deltas.bytes_sent, elapsed),
                ..Default::default()
            },
            MediaDirection::Recv => IntervalRates {
                received_frame_rate: frame_rate(deltas.frames_decoded, elapsed),
                remote_loss_rate: loss_percentage(deltas.packets_lost, deltas.packets_received),
                rtp_packets: deltas.packets_received,
                fec_packets: fec_packets(deltas.fec_packets_received, deltas.fec_packets_discarded),
                media_hop_by_hop_lost: deltas.packets_lost,
                rtp_hop_by_hop_lost: deltas.packets_lost,
                bitrate: bitrate(deltas.bytes_received, elapsed),
                mean_jitter_buffer_delay: if deltas.jitter_buffer_emitted_count > 0 {
                    deltas.jitter_buffer_delay * 1000.0 / deltas.jitter_buffer_emitted_count as f64
                } else {
                    0.0
                },
                ..Default::default()
            },
        }
    }
}

/// Refreshes the per-tick derived members of `lines` against the previous
/// tick, `elapsed` ago.
pub fn apply_tick_rates(
    store: &mut SampleStore,
    lines: &[MediaLineId],
    previous: Option<&IntervalBaseline>,
    elapsed: Duration,
) {
    for id in lines {
        let Some(result) = store.get_mut(id) else {
            continue;
        };
        let current = CounterSnapshot::capture(result);
        let deltas = CounterDeltas::between(&current, previous.and_then(|p| p.get(id)));
        let rates = IntervalRates::compute(id, &deltas, elapsed);

        match id.direction {
            MediaDirection::Send => {
                let send = result.send_mut();
                send.packets_sent_per_tick = deltas.packets_sent;
                send.bitrate = rates.bitrate;
            }
            MediaDirection::Recv => {
                let recv = result.recv_mut();
                recv.packets_received_per_tick = deltas.packets_received;
                recv.bitrate = rates.bitrate;
                recv.mean_jitter_buffer_delay_ms = rates.mean_jitter_buffer_delay;
            }
        }
    }
}
