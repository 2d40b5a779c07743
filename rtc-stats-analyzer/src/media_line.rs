//! Media line identifiers.
//!
//! A media line is one send or receive direction of one media kind. Lines are
//! keyed by [`MediaLineId`], a value type combining kind, direction and the
//! position of the sender/receiver inside the transceiver snapshot.

use serde::{Serialize, Serializer};
use std::fmt;

/// The media kind a transceiver carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaKind {
    Audio,
    Video,
    ScreenShareAudio,
    ScreenShareVideo,
}

const MEDIA_KIND_AUDIO_STR: &str = "audio";
const MEDIA_KIND_VIDEO_STR: &str = "video";
const MEDIA_KIND_SCREEN_SHARE_AUDIO_STR: &str = "audio-share";
const MEDIA_KIND_SCREEN_SHARE_VIDEO_STR: &str = "video-share";

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Audio,
        MediaKind::Video,
        MediaKind::ScreenShareAudio,
        MediaKind::ScreenShareVideo,
    ];

    /// Main media is the camera/microphone media, as opposed to screen share.
    pub fn is_main(&self) -> bool {
        matches!(self, MediaKind::Audio | MediaKind::Video)
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, MediaKind::Audio | MediaKind::ScreenShareAudio)
    }

    pub fn is_video(&self) -> bool {
        !self.is_audio()
    }

    /// The tag used in start/stop events, `None` for kinds that do not
    /// produce them.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            MediaKind::Audio => Some(MediaType::Audio),
            MediaKind::Video => Some(MediaType::Video),
            MediaKind::ScreenShareVideo => Some(MediaType::Share),
            MediaKind::ScreenShareAudio => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            MediaKind::Audio => MEDIA_KIND_AUDIO_STR,
            MediaKind::Video => MEDIA_KIND_VIDEO_STR,
            MediaKind::ScreenShareAudio => MEDIA_KIND_SCREEN_SHARE_AUDIO_STR,
            MediaKind::ScreenShareVideo => MEDIA_KIND_SCREEN_SHARE_VIDEO_STR,
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaDirection {
    Send,
    Recv,
}

impl fmt::Display for MediaDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MediaDirection::Send => write!(f, "send"),
            MediaDirection::Recv => write!(f, "recv"),
        }
    }
}

/// Identifies one media line, e.g. `audio-send` or `video-recv-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaLineId {
    pub kind: MediaKind,
    pub direction: MediaDirection,
    pub index: usize,
}

impl MediaLineId {
    pub fn new(kind: MediaKind, direction: MediaDirection, index: usize) -> Self {
        Self {
            kind,
            direction,
            index,
        }
    }

    pub fn send(kind: MediaKind, index: usize) -> Self {
        Self::new(kind, MediaDirection::Send, index)
    }

    pub fn recv(kind: MediaKind, index: usize) -> Self {
        Self::new(kind, MediaDirection::Recv, index)
    }

    pub fn is_send(&self) -> bool {
        self.direction == MediaDirection::Send
    }

    pub fn locality(&self) -> Locality {
        match self.direction {
            MediaDirection::Send => Locality::Local,
            MediaDirection::Recv => Locality::Remote,
        }
    }
}

impl fmt::Display for MediaLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.direction, self.index) {
            (MediaDirection::Send, 0) => write!(f, "{}-send", self.kind),
            (direction, index) => write!(f, "{}-{}-{}", self.kind, direction, index),
        }
    }
}

impl Serialize for MediaLineId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Media tag carried by start/stop events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MediaType {
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "share")]
    Share,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
            MediaType::Share => write!(f, "share"),
        }
    }
}

/// Whether media originates here or at the remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Locality {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "remote")]
    Remote,
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Locality::Local => write!(f, "local"),
            Locality::Remote => write!(f, "remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_line_id_display() {
        let tests = vec![
            (MediaLineId::send(MediaKind::Audio, 0), "audio-send"),
            (MediaLineId::send(MediaKind::Video, 2), "video-send-2"),
            (MediaLineId::recv(MediaKind::Video, 0), "video-recv-0"),
            (MediaLineId::recv(MediaKind::Video, 1), "video-recv-1"),
            (
                MediaLineId::send(MediaKind::ScreenShareVideo, 0),
                "video-share-send",
            ),
            (
                MediaLineId::recv(MediaKind::ScreenShareAudio, 0),
                "audio-share-recv-0",
            ),
        ];

        for (id, expected) in tests {
            assert_eq!(id.to_string(), expected);
        }
    }

    #[test]
    fn test_media_line_id_ordering_puts_main_index_first() {
        let mut ids = vec![
            MediaLineId::recv(MediaKind::Video, 1),
            MediaLineId::recv(MediaKind::ScreenShareVideo, 0),
            MediaLineId::recv(MediaKind::Video, 0),
            MediaLineId::send(MediaKind::Video, 0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                MediaLineId::send(MediaKind::Video, 0),
                MediaLineId::recv(MediaKind::Video, 0),
                MediaLineId::recv(MediaKind::Video, 1),
                MediaLineId::recv(MediaKind::ScreenShareVideo, 0),
            ]
        );
    }

    #[test]
    fn test_screen_share_audio_has_no_event_tag() {
        assert_eq!(MediaKind::ScreenShareAudio.media_type(), None);
        assert_eq!(
            MediaKind::ScreenShareVideo.media_type(),
            Some(MediaType::Share)
        );
        assert!(MediaKind::Video.is_main());
        assert!(!MediaKind::ScreenShareVideo.is_main());
    }

    #[test]
    fn test_media_line_id_serializes_as_key() {
        let json = serde_json::to_string(&MediaLineId::recv(MediaKind::Audio, 0)).unwrap();
        assert_eq!(json, "\"audio-recv-0\"");
    }
}
