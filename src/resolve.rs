use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::VideoId;
use crate::provider::{CaptionTrack, ProviderError, TrackKind, TranscriptProvider, normalize_segments};

/// Why a transcript could not be resolved; the Display text is shown to the user
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Transcripts are disabled for this video.")]
    Disabled,

    #[error("No transcript found for this video.")]
    NoTranscript,

    #[error("No transcripts found for this video in any language.")]
    NoLanguages,

    #[error("An unexpected error occurred: {0}")]
    Provider(ProviderError),
}

impl ResolveError {
    fn from_provider(video_id: &VideoId, err: ProviderError) -> Self {
        match err {
            ProviderError::TranscriptsDisabled(_) => {
                warn!("Transcripts disabled for video {video_id}");
                ResolveError::Disabled
            }
            ProviderError::NoTranscriptFound { .. } => {
                warn!("No transcript found for video {video_id} after all attempts");
                ResolveError::NoTranscript
            }
            other => {
                error!("Error fetching transcript for {video_id}: {other}");
                ResolveError::Provider(other)
            }
        }
    }
}

/// Resolved transcript text for a video
#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: VideoId,
    pub language: String,
    pub kind: TrackKind,
    pub text: String,
}

/// Picks and fetches the best transcript for a video
#[derive(Clone)]
pub struct Resolver {
    provider: Arc<dyn TranscriptProvider>,
    languages: Vec<String>,
}

impl Resolver {
    pub fn new(provider: Arc<dyn TranscriptProvider>, languages: Vec<String>) -> Self {
        Self { provider, languages }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub async fn resolve(&self, video_id: &VideoId) -> Result<Transcript, ResolveError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        resolve_transcript(self.provider.as_ref(), &languages, video_id).await
    }
}

/// Fetch and join a transcript, preferring manual tracks in `languages`, then
/// generated tracks in `languages`, then the first generated track in any language
pub async fn resolve_transcript(
    provider: &dyn TranscriptProvider,
    languages: &[&str],
    video_id: &VideoId,
) -> Result<Transcript, ResolveError> {
    let list = provider
        .list_transcripts(video_id)
        .await
        .map_err(|e| ResolveError::from_provider(video_id, e))?;
    debug!("Found {} caption tracks for {video_id}", list.tracks.len());

    let track = select_track(&list, languages).cloned().ok_or(ResolveError::NoLanguages)?;
    debug!("Using {} caption track: lang={}", track.kind, track.language_code);

    let raw = provider
        .fetch(video_id, &track)
        .await
        .map_err(|e| ResolveError::from_provider(video_id, e))?;
    let segments = normalize_segments(video_id, &raw);

    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Transcript {
        video_id: video_id.clone(),
        language: track.language_code,
        kind: track.kind,
        text,
    })
}

fn select_track<'a>(list: &'a crate::TranscriptList, languages: &[&str]) -> Option<&'a CaptionTrack> {
    let video_id = &list.video_id;

    if let Ok(track) = list.find_manually_created(languages) {
        return Some(track);
    }
    info!("No manual {languages:?} transcript for {video_id}. Trying generated.");

    if let Ok(track) = list.find_generated(languages) {
        return Some(track);
    }
    warn!("No generated {languages:?} transcript for {video_id}. Trying any available.");

    let track = list
        .available_languages()
        .into_iter()
        .find_map(|code| list.find_generated(&[code]).ok());
    match track {
        Some(t) => info!("Using transcript in language: {} for {video_id}", t.language_code),
        None => warn!("No transcripts found for {video_id} in any language"),
    }
    track
}
