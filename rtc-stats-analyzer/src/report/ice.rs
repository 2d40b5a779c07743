//! ICE candidate and candidate pair report fragments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of an ICE candidate.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCIceCandidateType {
    /// Type not specified or not recognized.
    #[default]
    Unspecified,
    /// Candidate obtained from a local network interface.
    Host,
    /// Server reflexive candidate obtained via STUN.
    Srflx,
    /// Peer reflexive candidate discovered during connectivity checks.
    Prflx,
    /// Relay candidate obtained from a TURN server.
    Relay,
}

const ICE_CANDIDATE_TYPE_HOST_STR: &str = "host";
const ICE_CANDIDATE_TYPE_SRFLX_STR: &str = "srflx";
const ICE_CANDIDATE_TYPE_PRFLX_STR: &str = "prflx";
const ICE_CANDIDATE_TYPE_RELAY_STR: &str = "relay";

impl From<&str> for RTCIceCandidateType {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_CANDIDATE_TYPE_HOST_STR => RTCIceCandidateType::Host,
            ICE_CANDIDATE_TYPE_SRFLX_STR => RTCIceCandidateType::Srflx,
            ICE_CANDIDATE_TYPE_PRFLX_STR => RTCIceCandidateType::Prflx,
            ICE_CANDIDATE_TYPE_RELAY_STR => RTCIceCandidateType::Relay,
            _ => RTCIceCandidateType::Unspecified,
        }
    }
}

/// Transport protocol of a candidate or of the TURN allocation behind it.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum RTCIceServerTransportProtocol {
    #[default]
    Unspecified,
    Udp,
    Tcp,
    Tls,
}

impl From<&str> for RTCIceServerTransportProtocol {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "udp" => RTCIceServerTransportProtocol::Udp,
            "tcp" => RTCIceServerTransportProtocol::Tcp,
            "tls" => RTCIceServerTransportProtocol::Tls,
            _ => RTCIceServerTransportProtocol::Unspecified,
        }
    }
}

/// The state of an ICE candidate pair.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum RTCStatsIceCandidatePairState {
    #[default]
    Unspecified,
    Frozen,
    Waiting,
    InProgress,
    Failed,
    Succeeded,
}

impl From<&str> for RTCStatsIceCandidatePairState {
    fn from(raw: &str) -> Self {
        match raw {
            "frozen" => RTCStatsIceCandidatePairState::Frozen,
            "waiting" => RTCStatsIceCandidatePairState::Waiting,
            "in-progress" => RTCStatsIceCandidatePairState::InProgress,
            "failed" => RTCStatsIceCandidatePairState::Failed,
            "succeeded" => RTCStatsIceCandidatePairState::Succeeded,
            _ => RTCStatsIceCandidatePairState::Unspecified,
        }
    }
}

/// Transport the media path runs over, as reported in quality events.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TransportType {
    #[default]
    #[serde(rename = "UDP")]
    Udp,
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "TLS")]
    Tls,
}

impl TransportType {
    /// Classifies a candidate from its protocol and, for TURN candidates, the
    /// relay protocol. Returns `None` when neither protocol is recognized.
    pub fn classify(
        protocol: RTCIceServerTransportProtocol,
        relay_protocol: RTCIceServerTransportProtocol,
    ) -> Option<Self> {
        match (protocol, relay_protocol) {
            (_, RTCIceServerTransportProtocol::Tls) => Some(TransportType::Tls),
            (RTCIceServerTransportProtocol::Tcp, _) => Some(TransportType::Tcp),
            (RTCIceServerTransportProtocol::Udp, _) => Some(TransportType::Udp),
            (_, RTCIceServerTransportProtocol::Tcp) => Some(TransportType::Tcp),
            (_, RTCIceServerTransportProtocol::Udp) => Some(TransportType::Udp),
            _ => None,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TransportType::Udp => write!(f, "UDP"),
            TransportType::Tcp => write!(f, "TCP"),
            TransportType::Tls => write!(f, "TLS"),
        }
    }
}

/// See [RTCIceCandidatePairStats](https://www.w3.org/TR/webrtc-stats/#candidatepair-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCIceCandidatePairFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub transport_id: Option<String>,
    pub local_candidate_id: Option<String>,
    pub remote_candidate_id: Option<String>,
    pub state: Option<String>,
    pub nominated: Option<bool>,
    pub current_round_trip_time: Option<f64>,
    pub available_outgoing_bitrate: Option<f64>,
    pub available_incoming_bitrate: Option<f64>,
}

impl RTCIceCandidatePairFragment {
    pub fn pair_state(&self) -> RTCStatsIceCandidatePairState {
        self.state
            .as_deref()
            .map(RTCStatsIceCandidatePairState::from)
            .unwrap_or_default()
    }
}

/// See [RTCIceCandidateStats](https://www.w3.org/TR/webrtc-stats/#icecandidate-dict*)
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCIceCandidateFragment {
    pub id: String,
    pub timestamp: Option<f64>,
    pub transport_id: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub candidate_type: Option<String>,
    pub relay_protocol: Option<String>,
    pub related_address: Option<String>,
    pub related_port: Option<u16>,
    pub url: Option<String>,
}

impl RTCIceCandidateFragment {
    pub fn typ(&self) -> RTCIceCandidateType {
        self.candidate_type
            .as_deref()
            .map(RTCIceCandidateType::from)
            .unwrap_or_default()
    }

    pub fn transport_protocol(&self) -> RTCIceServerTransportProtocol {
        self.protocol
            .as_deref()
            .map(RTCIceServerTransportProtocol::from)
            .unwrap_or_default()
    }

    pub fn relay_transport_protocol(&self) -> RTCIceServerTransportProtocol {
        self.relay_protocol
            .as_deref()
            .map(RTCIceServerTransportProtocol::from)
            .unwrap_or_default()
    }

    pub fn transport_type(&self) -> Option<TransportType> {
        TransportType::classify(self.transport_protocol(), self.relay_transport_protocol())
    }
}
