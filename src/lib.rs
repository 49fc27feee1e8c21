pub mod config;
pub mod handler;
pub mod provider;
pub mod render;
pub mod resolve;
pub mod server;
pub mod summarize;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::LazyLock;

use regex::Regex;

pub use provider::{CaptionTrack, ProviderError, RawSegment, TrackKind, TranscriptList, TranscriptProvider};
pub use resolve::{ResolveError, Resolver, Transcript};
pub use summarize::summarize;

/// Length of every YouTube video ID
pub const VIDEO_ID_LEN: usize = 11;

/// An 11-character YouTube video ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a raw token as a video ID
    pub fn parse(token: &str) -> Option<Self> {
        let valid = token.len() == VIDEO_ID_LEN
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

// Order matters: the first pattern that matches wins.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // watch?v=ID, or any /ID path segment
        r"(?:v=|/)([0-9A-Za-z_-]{11})",
        // embed/ID, v/ID, youtu.be/ID
        r"(?:embed/|v/|youtu\.be/)([0-9A-Za-z_-]{11})",
        // bare ID
        r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video ID pattern is valid"))
    .collect()
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id<'a>(input: impl Into<Option<&'a str>>) -> Option<VideoId> {
    let input = input.into()?.trim();
    if input.is_empty() {
        return None;
    }

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| VideoId::parse(&caps[1]))
}
