use std::collections::HashMap;

use async_trait::async_trait;
use log::warn;
use thiserror::Error;

use crate::{Segment, VideoId};

/// Failures reported by a transcript provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("no transcript found for video {video_id} in languages {languages:?}")]
    NoTranscriptFound { video_id: String, languages: Vec<String> },

    #[error("video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("YouTube is blocking requests for video {0}")]
    RequestBlocked(String),

    #[error("video {0} is age restricted")]
    AgeRestricted(String),

    #[error("video {0} is unplayable: {1}")]
    Unplayable(String, String),

    #[error("video {0} requires a PO token to fetch captions")]
    PoTokenRequired(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not parse YouTube response: {0}")]
    Unparsable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Manual,
    Generated,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::Generated => write!(f, "generated"),
        }
    }
}

/// One fetchable caption track of a video
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub language: String,
    pub kind: TrackKind,
    pub base_url: String,
}

/// All caption tracks of a video, in the order the provider returned them
#[derive(Debug, Clone)]
pub struct TranscriptList {
    pub video_id: VideoId,
    pub tracks: Vec<CaptionTrack>,
}

impl TranscriptList {
    pub fn new(video_id: VideoId, tracks: Vec<CaptionTrack>) -> Self {
        Self { video_id, tracks }
    }

    pub fn find_manually_created(&self, language_codes: &[&str]) -> Result<&CaptionTrack, ProviderError> {
        self.find(language_codes, TrackKind::Manual)
    }

    pub fn find_generated(&self, language_codes: &[&str]) -> Result<&CaptionTrack, ProviderError> {
        self.find(language_codes, TrackKind::Generated)
    }

    /// Unique language codes across all tracks, first occurrence first
    pub fn available_languages(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for track in &self.tracks {
            if !seen.contains(&track.language_code.as_str()) {
                seen.push(track.language_code.as_str());
            }
        }
        seen
    }

    fn find(&self, language_codes: &[&str], kind: TrackKind) -> Result<&CaptionTrack, ProviderError> {
        language_codes
            .iter()
            .find_map(|code| {
                self.tracks
                    .iter()
                    .find(|t| t.kind == kind && t.language_code == *code)
            })
            .ok_or_else(|| ProviderError::NoTranscriptFound {
                video_id: self.video_id.to_string(),
                languages: language_codes.iter().map(|s| s.to_string()).collect(),
            })
    }
}

/// A caption line as the provider delivered it, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawSegment {
    /// Field-keyed record, e.g. a json3 event flattened to `{"text", "start", "duration"}`
    Record(serde_json::Value),
    /// Timedtext `<text start=".." dur="..">body</text>` element
    Element {
        attrs: HashMap<String, String>,
        body: Option<String>,
    },
}

impl Segment {
    /// Normalize a provider segment; `None` when it carries no text
    pub fn from_raw(raw: &RawSegment) -> Option<Segment> {
        match raw {
            RawSegment::Record(value) => {
                let text = value.get("text")?.as_str()?.to_string();
                let number = |key: &str| value.get(key).and_then(|v| v.as_f64()).unwrap_or_default();
                Some(Segment {
                    text,
                    start: number("start"),
                    duration: number("duration"),
                })
            }
            RawSegment::Element { attrs, body } => {
                let number = |key: &str| {
                    attrs
                        .get(key)
                        .and_then(|v| v.parse::<f64>().ok())
                        .unwrap_or_default()
                };
                Some(Segment {
                    text: body.clone()?,
                    start: number("start"),
                    duration: number("dur"),
                })
            }
        }
    }
}

/// Normalize provider segments, skipping (and logging) the ones without text
pub fn normalize_segments(video_id: &VideoId, raw: &[RawSegment]) -> Vec<Segment> {
    raw.iter()
        .filter_map(|r| {
            let segment = Segment::from_raw(r);
            if segment.is_none() {
                warn!("Unexpected segment format for {video_id}: {r:?}");
            }
            segment
        })
        .collect()
}

/// A source of caption tracks and their segments
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// List every caption track available for a video
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<TranscriptList, ProviderError>;

    /// Fetch the segments of one track
    async fn fetch(&self, video_id: &VideoId, track: &CaptionTrack) -> Result<Vec<RawSegment>, ProviderError>;
}
