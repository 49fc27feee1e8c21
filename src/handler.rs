use std::time::Duration;

use log::{info, warn};

use crate::render::Page;
use crate::resolve::Resolver;
use crate::{VideoId, extract_video_id, summarize};

pub const EMPTY_URL_MESSAGE: &str = "Please enter a YouTube video URL.";

pub const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL or could not extract Video ID. \
Please use a valid format (e.g., https://www.youtube.com/watch?v=VIDEO_ID or https://youtu.be/VIDEO_ID).";

pub const EMPTY_TRANSCRIPT_MESSAGE: &str = "Could not retrieve transcript for the video (no text content).";

pub const TIMEOUT_MESSAGE: &str = "Timed out while fetching the transcript.";

/// Result of processing one form submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub video_url: String,
    pub video_id: Option<VideoId>,
    pub transcript: Option<String>,
    pub error: Option<String>,
}

impl Outcome {
    fn failed(video_url: &str, video_id: Option<VideoId>, message: impl Into<String>) -> Self {
        Self {
            video_url: video_url.to_string(),
            video_id,
            transcript: None,
            error: Some(message.into()),
        }
    }

    /// Page values for this outcome; the transcript is shown whenever one was fetched
    pub fn into_page(self) -> Page {
        let summary = self.transcript.as_deref().map(summarize).filter(|s| !s.is_empty());
        Page {
            summary,
            error_message: self.error,
            video_url_input: self.video_url,
            full_transcript: self.transcript,
        }
    }
}

/// Run a submitted URL through extraction and transcript resolution
pub async fn handle_submission(resolver: &Resolver, video_url: &str, timeout: Duration) -> Outcome {
    let video_url = video_url.trim();
    if video_url.is_empty() {
        return Outcome::failed(video_url, None, EMPTY_URL_MESSAGE);
    }

    let Some(video_id) = extract_video_id(video_url) else {
        info!("Could not extract a video ID from {video_url:?}");
        return Outcome::failed(video_url, None, INVALID_URL_MESSAGE);
    };

    info!("Processing video ID: {video_id}");
    let transcript = match tokio::time::timeout(timeout, resolver.resolve(&video_id)).await {
        Ok(Ok(transcript)) => transcript,
        Ok(Err(e)) => return Outcome::failed(video_url, Some(video_id), e.to_string()),
        Err(_) => {
            warn!("Resolving {video_id} exceeded {timeout:?}");
            return Outcome::failed(video_url, Some(video_id), TIMEOUT_MESSAGE);
        }
    };

    if transcript.text.is_empty() {
        return Outcome::failed(video_url, Some(video_id), EMPTY_TRANSCRIPT_MESSAGE);
    }

    info!(
        "Resolved {} {} transcript for {} ({} chars)",
        transcript.language,
        transcript.kind,
        transcript.video_id,
        transcript.text.len()
    );
    Outcome {
        video_url: video_url.to_string(),
        video_id: Some(video_id),
        transcript: Some(transcript.text),
        error: None,
    }
}
