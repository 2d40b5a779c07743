//! The analyzer loop, without I/O.
//!
//! [`StatsAnalyzer`] is driven through [`sansio::Protocol`]:
//!
//! - `handle_timeout` runs the tick schedule and queues a [`StatsRequest`]
//!   per tick, read back with `poll_write`;
//! - the caller fetches a snapshot for each request and hands it back with
//!   `handle_read` as a [`StatsSample`];
//! - events are drained with `poll_event`.
//!
//! Ticks are scheduled from the timer, not from fetch completion. Samples are
//! processed one at a time; a sample of an earlier run, or one older than the
//! last processed sample, is dropped without touching the store.

use crate::activity::{ActivityDetector, ActivityTransition};
use crate::config::AnalyzerConfig;
use crate::environment::{HostEnvironment, UnknownEnvironment};
use crate::error::{Error, Result};
use crate::event::AnalyzerEvent;
use crate::media_line::{MediaDirection, MediaKind, MediaLineId};
use crate::parser::ReportParser;
use crate::quality::network::{
    NetworkQualityMonitor, ThresholdNetworkQualityMonitor, UplinkQualityInput,
};
use crate::quality::{MediaQualityEvent, QualityInputs};
use crate::rate::{apply_tick_rates, counter_delta, elapsed_since};
use crate::report::ice::TransportType;
use crate::store::{CounterSnapshot, IntervalBaseline, SampleStore};
use crate::transceiver::TransceiverStats;
use crate::util::log_payload;
use log::{Level, debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Which media the application currently expects to flow. Silence on an
/// expected line is logged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaStatus {
    pub send_audio: bool,
    pub send_video: bool,
    pub send_share: bool,
    pub receive_audio: bool,
    pub receive_video: bool,
    pub receive_share: bool,
}

impl MediaStatus {
    pub fn expects(&self, id: &MediaLineId) -> bool {
        match (id.direction, id.kind) {
            (MediaDirection::Send, MediaKind::Audio) => self.send_audio,
            (MediaDirection::Send, MediaKind::Video) => self.send_video,
            (MediaDirection::Send, MediaKind::ScreenShareAudio | MediaKind::ScreenShareVideo) => {
                self.send_share
            }
            (MediaDirection::Recv, MediaKind::Audio) => self.receive_audio,
            (MediaDirection::Recv, MediaKind::Video) => self.receive_video,
            (MediaDirection::Recv, MediaKind::ScreenShareAudio | MediaKind::ScreenShareVideo) => {
                self.receive_share
            }
        }
    }
}

/// Asks the caller for one transceiver snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsRequest {
    /// Incremented on every start; samples of an older run are stale.
    pub generation: u64,
    /// Increases with every request.
    pub seq: u64,
}

/// A fetched snapshot, answering a [`StatsRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSample {
    pub request: StatsRequest,
    /// Epoch milliseconds at which the snapshot was taken.
    pub timestamp_ms: u64,
    pub stats: TransceiverStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerCommand {
    UpdateMediaStatus(MediaStatus),
    Stop,
}

pub struct StatsAnalyzerBuilder {
    config: AnalyzerConfig,
    monitor: Option<Box<dyn NetworkQualityMonitor>>,
    environment: Box<dyn HostEnvironment>,
}

impl Default for StatsAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAnalyzerBuilder {
    pub fn new() -> Self {
        StatsAnalyzerBuilder {
            config: AnalyzerConfig::default(),
            monitor: None,
            environment: Box::new(UnknownEnvironment),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default [`ThresholdNetworkQualityMonitor`].
    pub fn with_network_quality_monitor(mut self, monitor: Box<dyn NetworkQualityMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_host_environment(mut self, environment: Box<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn build(self) -> Result<StatsAnalyzer> {
        self.config.validate()?;
        let monitor = self
            .monitor
            .unwrap_or_else(|| Box::new(ThresholdNetworkQualityMonitor::new(&self.config)));
        Ok(StatsAnalyzer::new(self.config, monitor, self.environment))
    }
}

pub struct StatsAnalyzer {
    config: AnalyzerConfig,
    parser: ReportParser,
    monitor: Box<dyn NetworkQualityMonitor>,
    environment: Box<dyn HostEnvironment>,

    store: SampleStore,
    activity: ActivityDetector,
    previous_tick: Option<IntervalBaseline>,
    quality_baseline: Option<IntervalBaseline>,
    /// Sample clock at which the current quality window started, epoch ms.
    window_started_ms: Option<u64>,
    ticks_processed: u64,

    media_status: MediaStatus,
    local_ip: String,
    transport_type: TransportType,

    running: bool,
    generation: u64,
    next_seq: u64,
    last_processed_seq: Option<u64>,
    next_tick: Option<Instant>,
    requests: VecDeque<StatsRequest>,
    events: VecDeque<AnalyzerEvent>,
}

impl StatsAnalyzer {
    fn new(
        config: AnalyzerConfig,
        monitor: Box<dyn NetworkQualityMonitor>,
        environment: Box<dyn HostEnvironment>,
    ) -> Self {
        StatsAnalyzer {
            parser: ReportParser::new(config.video_packet_loss_ratio_threshold),
            config,
            monitor,
            environment,
            store: SampleStore::new(),
            activity: ActivityDetector::new(),
            previous_tick: None,
            quality_baseline: None,
            window_started_ms: None,
            ticks_processed: 0,
            media_status: MediaStatus::default(),
            local_ip: String::new(),
            transport_type: TransportType::default(),
            running: false,
            generation: 0,
            next_seq: 0,
            last_processed_seq: None,
            next_tick: None,
            requests: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    /// Starts sampling; the first tick is due at `now`.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        if self.running {
            return Err(Error::ErrAnalyzerAlreadyStarted);
        }
        self.running = true;
        self.generation += 1;
        self.next_tick = Some(now);
        info!(
            "stats analyzer started, interval {:?}, quality window {:?}",
            self.config.analyzer_interval(),
            self.config.quality_interval()
        );
        Ok(())
    }

    /// Cancels the schedule. Queued requests are dropped, queued events kept.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Err(Error::ErrAnalyzerNotStarted);
        }
        self.running = false;
        self.next_tick = None;
        self.requests.clear();
        info!("stats analyzer stopped");
        Ok(())
    }

    pub fn update_media_status(&mut self, status: MediaStatus) {
        log_payload(Level::Info, "media status updated", &status);
        self.media_status = status;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn media_status(&self) -> &MediaStatus {
        &self.media_status
    }

    /// Local address of the selected candidate pair, empty until resolved.
    pub fn local_ip_address(&self) -> &str {
        &self.local_ip
    }

    pub fn transport_type(&self) -> TransportType {
        self.transport_type
    }

    pub fn stats_results(&self) -> &SampleStore {
        &self.store
    }

    fn accepts(&self, request: &StatsRequest) -> bool {
        if !self.running || request.generation != self.generation {
            debug!("discarding sample {request:?} of a stopped run");
            return false;
        }
        if self
            .last_processed_seq
            .is_some_and(|last| request.seq <= last)
        {
            debug!("discarding out of order sample {request:?}");
            return false;
        }
        true
    }

    fn process_sample(&mut self, sample: StatsSample) {
        self.ticks_processed += 1;
        let tick = self.ticks_processed;
        let now_ms = sample.timestamp_ms;
        let recency_window = self.config.requested_recency_window;
        let interval = self.config.analyzer_interval();
        // The first sample covers one interval ending at its timestamp.
        let window_started_ms = *self
            .window_started_ms
            .get_or_insert(now_ms.saturating_sub(self.config.analyzer_interval));
        trace!("processing sample {:?} as tick {tick}", sample.request);

        let outcome = self
            .parser
            .parse_transceiver_stats(&mut self.store, &sample.stats, tick);

        if let Some(path) = outcome.selected_path {
            if path.ip != self.local_ip {
                debug!("local ip address is now {:?}", path.ip);
            }
            self.local_ip = path.ip;
            if let Some(transport_type) = path.transport_type {
                self.transport_type = transport_type;
            }
        }

        for (media_line, remote_rtp_results) in &outcome.remote_reports {
            let input = UplinkQualityInput {
                media_line: *media_line,
                remote_rtp_results,
                current_stats: &self.store,
            };
            if let Some(verdict) = self.monitor.determine_uplink_network_quality(input) {
                self.events.push_back(AnalyzerEvent::NetworkQuality(verdict));
            }
        }

        let since_previous = elapsed_since(
            self.previous_tick.as_ref().map(|baseline| baseline.timestamp_ms),
            now_ms,
            interval,
        );
        apply_tick_rates(
            &mut self.store,
            &outcome.observed,
            self.previous_tick.as_ref(),
            since_previous,
        );

        let store = &self.store;
        let transitions = self.activity.detect(store, self.previous_tick.as_ref(), |id| {
            store
                .get(id)
                .is_some_and(|result| result.internal.is_active_at(now_ms, recency_window))
        });
        for (group, transition) in transitions {
            let event = match transition {
                ActivityTransition::Started => {
                    AnalyzerEvent::started(group.locality, group.media_type)
                }
                ActivityTransition::Stopped => {
                    AnalyzerEvent::stopped(group.locality, group.media_type)
                }
            };
            info!("{}: {} {}", event.name(), group.locality, group.media_type);
            self.events.push_back(event);
        }

        self.log_silent_lines(tick, now_ms);

        // A window closes on the tick nearest to its nominal end.
        let window = elapsed_since(Some(window_started_ms), now_ms, interval);
        if window + interval / 2 >= self.config.quality_interval() {
            self.emit_media_quality(tick, now_ms, window);
        }

        self.previous_tick = Some(IntervalBaseline::capture(&self.store, tick, now_ms));
        self.last_processed_seq = Some(sample.request.seq);
    }

    /// Logs once when an expected line stops carrying packets or frames.
    fn log_silent_lines(&mut self, tick: u64, now_ms: u64) {
        let recency_window = self.config.requested_recency_window;
        let previous = self.previous_tick.as_ref();

        for (id, result) in self.store.iter_mut() {
            if result.internal.last_seen_tick != tick
                || !self.media_status.expects(id)
                || !result.internal.is_active_at(now_ms, recency_window)
            {
                continue;
            }
            let current = CounterSnapshot::capture(result);
            let before = previous.and_then(|baseline| baseline.get(id));
            let verb = match id.direction {
                MediaDirection::Send => "sent",
                MediaDirection::Recv => "received",
            };

            let packets = counter_delta(
                current.rtp_packets(id),
                before.map_or(0, |snapshot| snapshot.rtp_packets(id)),
            );
            if packets == 0 {
                if !result.internal.rtp_silent {
                    info!("No {} RTP packets {verb}: {packets}", id.kind);
                    result.internal.rtp_silent = true;
                }
            } else {
                result.internal.rtp_silent = false;
            }

            if id.kind.is_video() {
                let frames = counter_delta(
                    current.liveness(id),
                    before.map_or(0, |snapshot| snapshot.liveness(id)),
                );
                let verb = match id.direction {
                    MediaDirection::Send => "sent",
                    MediaDirection::Recv => "decoded",
                };
                if frames == 0 {
                    if !result.internal.frames_silent {
                        info!("No {} frames {verb}: {frames}", id.kind);
                        result.internal.frames_silent = true;
                    }
                } else {
                    result.internal.frames_silent = false;
                }
            }
        }
    }

    fn emit_media_quality(&mut self, tick: u64, now_ms: u64, window: Duration) {
        let event = MediaQualityEvent::assemble(&QualityInputs {
            store: &self.store,
            window_start: self.quality_baseline.as_ref(),
            window,
            transport_type: self.transport_type,
            local_ip: &self.local_ip,
            now_ms,
            recency_window_ms: self.config.requested_recency_window,
            environment: self.environment.as_ref(),
        });
        if event.is_empty() {
            debug!("media quality window ending at tick {tick} has no requested streams");
        }
        log_payload(Level::Debug, "media quality", &event);
        self.events.push_back(AnalyzerEvent::MediaQuality(event));

        self.quality_baseline = Some(IntervalBaseline::capture(&self.store, tick, now_ms));
        for (_, result) in self.store.iter_mut() {
            result.internal.clear_window_samples();
        }
        self.window_started_ms = Some(now_ms);
    }
}

impl sansio::Protocol<StatsSample, (), AnalyzerCommand> for StatsAnalyzer {
    type Rout = ();
    type Wout = StatsRequest;
    type Eout = AnalyzerEvent;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, sample: StatsSample) -> Result<()> {
        if self.accepts(&sample.request) {
            self.process_sample(sample);
        }
        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    fn handle_write(&mut self, _msg: ()) -> Result<()> {
        Ok(())
    }

    /// Returns the next snapshot to fetch.
    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.requests.pop_front()
    }

    fn handle_event(&mut self, command: AnalyzerCommand) -> Result<()> {
        match command {
            AnalyzerCommand::UpdateMediaStatus(status) => {
                self.update_media_status(status);
                Ok(())
            }
            AnalyzerCommand::Stop => self.stop(),
        }
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        let Some(deadline) = self.next_tick else {
            return Ok(());
        };
        if now < deadline {
            return Ok(());
        }
        let request = StatsRequest {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.requests.push_back(request);
        self.next_tick = Some(now + self.config.analyzer_interval());
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        self.next_tick
    }

    fn close(&mut self) -> Result<()> {
        if self.running {
            self.stop()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sansio::Protocol;

    fn analyzer() -> StatsAnalyzer {
        StatsAnalyzerBuilder::new().build().unwrap()
    }

    #[test]
    fn test_start_twice_fails() {
        let mut analyzer = analyzer();
        let now = Instant::now();
        assert_eq!(analyzer.start(now), Ok(()));
        assert_eq!(analyzer.start(now), Err(Error::ErrAnalyzerAlreadyStarted));
        assert_eq!(analyzer.stop(), Ok(()));
        assert_eq!(analyzer.stop(), Err(Error::ErrAnalyzerNotStarted));
    }

    #[test]
    fn test_schedule_runs_from_timer() {
        let mut analyzer = analyzer();
        let now = Instant::now();
        assert_eq!(analyzer.poll_timeout(), None);
        analyzer.start(now).unwrap();
        assert_eq!(analyzer.poll_timeout(), Some(now));

        analyzer.handle_timeout(now).unwrap();
        let first = analyzer.poll_write().unwrap();
        assert_eq!(analyzer.poll_write(), None);
        let interval = Duration::from_millis(5000);
        assert_eq!(analyzer.poll_timeout(), Some(now + interval));

        // Not yet due.
        analyzer.handle_timeout(now + Duration::from_millis(10)).unwrap();
        assert_eq!(analyzer.poll_write(), None);

        // Due again without the first fetch having completed.
        analyzer.handle_timeout(now + interval).unwrap();
        let second = analyzer.poll_write().unwrap();
        assert_eq!(second.generation, first.generation);
        assert!(second.seq > first.seq);
    }

    #[test]
    fn test_stop_drops_queued_requests() {
        let mut analyzer = analyzer();
        let now = Instant::now();
        analyzer.start(now).unwrap();
        analyzer.handle_timeout(now).unwrap();
        analyzer.handle_event(AnalyzerCommand::Stop).unwrap();

        assert!(!analyzer.is_running());
        assert_eq!(analyzer.poll_write(), None);
        assert_eq!(analyzer.poll_timeout(), None);
        analyzer.handle_timeout(now + Duration::from_secs(60)).unwrap();
        assert_eq!(analyzer.poll_write(), None);
    }

    #[test]
    fn test_builder_validates_config() {
        let config = AnalyzerConfig {
            analyzer_interval: 0,
            ..Default::default()
        };
        let result = StatsAnalyzerBuilder::new().with_config(config).build();
        assert!(matches!(result, Err(Error::ErrInvalidAnalyzerInterval)));
    }

    #[test]
    fn test_media_status_expectations() {
        let status = MediaStatus {
            send_share: true,
            receive_audio: true,
            ..Default::default()
        };
        assert!(status.expects(&MediaLineId::send(MediaKind::ScreenShareVideo, 0)));
        assert!(status.expects(&MediaLineId::send(MediaKind::ScreenShareAudio, 0)));
        assert!(status.expects(&MediaLineId::recv(MediaKind::Audio, 2)));
        assert!(!status.expects(&MediaLineId::send(MediaKind::Audio, 0)));
        assert!(!status.expects(&MediaLineId::recv(MediaKind::ScreenShareVideo, 0)));
    }
}
