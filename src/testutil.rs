use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::VideoId;
use crate::provider::{CaptionTrack, ProviderError, RawSegment, TrackKind, TranscriptList, TranscriptProvider};

pub fn track(lang: &str, kind: TrackKind) -> CaptionTrack {
    CaptionTrack {
        language_code: lang.to_string(),
        language: lang.to_uppercase(),
        kind,
        base_url: format!("https://example.com/{lang}/{kind}"),
    }
}

pub fn record(text: &str) -> RawSegment {
    RawSegment::Record(serde_json::json!({ "text": text }))
}

/// In-memory provider; segments are keyed by track base URL
#[derive(Default)]
pub struct FakeProvider {
    pub tracks: Vec<CaptionTrack>,
    pub segments: HashMap<String, Vec<RawSegment>>,
    pub disabled: bool,
    pub list_error: Option<fn(&VideoId) -> ProviderError>,
    pub fetch_error: Option<fn(&VideoId) -> ProviderError>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn with_tracks(tracks: Vec<CaptionTrack>) -> Self {
        let segments = tracks
            .iter()
            .map(|t| {
                let text = format!("{} {}", t.language_code, t.kind);
                (t.base_url.clone(), vec![record(&text)])
            })
            .collect();
        Self {
            tracks,
            segments,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }

    pub fn failing_list(err: fn(&VideoId) -> ProviderError) -> Self {
        Self {
            list_error: Some(err),
            ..Default::default()
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptProvider for FakeProvider {
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<TranscriptList, ProviderError> {
        if self.disabled {
            return Err(ProviderError::TranscriptsDisabled(video_id.to_string()));
        }
        if let Some(err) = self.list_error {
            return Err(err(video_id));
        }
        Ok(TranscriptList::new(video_id.clone(), self.tracks.clone()))
    }

    async fn fetch(&self, video_id: &VideoId, track: &CaptionTrack) -> Result<Vec<RawSegment>, ProviderError> {
        self.fetched.lock().unwrap().push(track.base_url.clone());
        if let Some(err) = self.fetch_error {
            return Err(err(video_id));
        }
        self.segments
            .get(&track.base_url)
            .cloned()
            .ok_or_else(|| ProviderError::Unparsable(format!("no fixture for {video_id}")))
    }
}
