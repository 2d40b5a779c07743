//! Events emitted by the analyzer, drained through
//! [`poll_event`](sansio::Protocol::poll_event) in emission order.

use crate::media_line::{Locality, MediaType};
use crate::quality::MediaQualityEvent;
use crate::quality::network::NetworkQualityVerdict;
use serde::Serialize;

/// Payload of the start/stop events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaEventPayload {
    #[serde(rename = "type")]
    pub typ: MediaType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyzerEvent {
    LocalMediaStarted(MediaEventPayload),
    LocalMediaStopped(MediaEventPayload),
    RemoteMediaStarted(MediaEventPayload),
    RemoteMediaStopped(MediaEventPayload),
    MediaQuality(MediaQualityEvent),
    NetworkQuality(NetworkQualityVerdict),
}

impl AnalyzerEvent {
    pub fn started(locality: Locality, typ: MediaType) -> Self {
        let payload = MediaEventPayload { typ };
        match locality {
            Locality::Local => AnalyzerEvent::LocalMediaStarted(payload),
            Locality::Remote => AnalyzerEvent::RemoteMediaStarted(payload),
        }
    }

    pub fn stopped(locality: Locality, typ: MediaType) -> Self {
        let payload = MediaEventPayload { typ };
        match locality {
            Locality::Local => AnalyzerEvent::LocalMediaStopped(payload),
            Locality::Remote => AnalyzerEvent::RemoteMediaStopped(payload),
        }
    }

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerEvent::LocalMediaStarted(_) => "LOCAL_MEDIA_STARTED",
            AnalyzerEvent::LocalMediaStopped(_) => "LOCAL_MEDIA_STOPPED",
            AnalyzerEvent::RemoteMediaStarted(_) => "REMOTE_MEDIA_STARTED",
            AnalyzerEvent::RemoteMediaStopped(_) => "REMOTE_MEDIA_STOPPED",
            AnalyzerEvent::MediaQuality(_) => "MEDIA_QUALITY",
            AnalyzerEvent::NetworkQuality(_) => "NETWORK_QUALITY",
        }
    }

    /// The start/stop payload, if this is an activity event.
    pub fn media_payload(&self) -> Option<&MediaEventPayload> {
        match self {
            AnalyzerEvent::LocalMediaStarted(payload)
            | AnalyzerEvent::LocalMediaStopped(payload)
            | AnalyzerEvent::RemoteMediaStarted(payload)
            | AnalyzerEvent::RemoteMediaStopped(payload) => Some(payload),
            _ => None,
        }
    }
}
