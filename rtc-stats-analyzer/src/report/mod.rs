//! Raw statistics report fragments.
//!
//! A transceiver snapshot carries, per sender and receiver, a `report` array of
//! W3C WebRTC statistics dictionaries. Each dictionary is decoded into one
//! [`RTCStatsReportFragment`] variant keyed by its `type` member; types the
//! analyzer does not consume decode to [`RTCStatsReportFragment::Unknown`].

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

pub mod ice;
pub mod media_source;
pub mod rtp_stream;

use ice::{RTCIceCandidateFragment, RTCIceCandidatePairFragment};
use media_source::RTCMediaSourceFragment;
use rtp_stream::{
    RTCInboundRtpFragment, RTCOutboundRtpFragment, RTCRemoteInboundRtpFragment,
    RTCRemoteOutboundRtpFragment,
};

/// One entry of a sender or receiver `report` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RTCStatsReportFragment {
    #[serde(rename = "outbound-rtp")]
    OutboundRtp(RTCOutboundRtpFragment),
    #[serde(rename = "inbound-rtp")]
    InboundRtp(RTCInboundRtpFragment),
    #[serde(rename = "remote-inbound-rtp")]
    RemoteInboundRtp(RTCRemoteInboundRtpFragment),
    #[serde(rename = "remote-outbound-rtp")]
    RemoteOutboundRtp(RTCRemoteOutboundRtpFragment),
    #[serde(rename = "media-source")]
    MediaSource(RTCMediaSourceFragment),
    #[serde(rename = "candidate-pair")]
    CandidatePair(RTCIceCandidatePairFragment),
    #[serde(rename = "local-candidate")]
    LocalCandidate(RTCIceCandidateFragment),
    /// Any report type the analyzer does not consume.
    #[serde(other)]
    Unknown,
}

impl RTCStatsReportFragment {
    /// Decodes one fragment, returning `None` when it is malformed.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(fragment) => Some(fragment),
            Err(err) => {
                debug!("dropping malformed stats fragment: {err}");
                None
            }
        }
    }
}

/// Decodes a `report` array, skipping fragments that fail to decode so one
/// malformed entry does not cost the rest of the tick.
pub(crate) fn deserialize_fragments<'de, D>(
    deserializer: D,
) -> Result<Vec<RTCStatsReportFragment>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(RTCStatsReportFragment::from_value)
        .collect())
}
