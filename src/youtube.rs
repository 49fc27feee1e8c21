use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::VideoId;
use crate::provider::{CaptionTrack, ProviderError, RawSegment, TrackKind, TranscriptList, TranscriptProvider};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrackJson>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrackJson {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: f64,
    #[serde(rename = "dDurationMs", default)]
    d_duration_ms: f64,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Caption tracks and timedtext from YouTube's InnerTube player API
pub struct YouTubeProvider {
    client: reqwest::Client,
}

impl YouTubeProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_player(&self, video_id: &VideoId) -> Result<InnerTubePlayerResponse, ProviderError> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let resp = self.client.get(&watch_url).send().await?;
        check_status(resp.status(), video_id)?;
        let page_html = resp.error_for_status()?.text().await?;

        let api_key = extract_api_key(&page_html, video_id)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id.as_str()
        });

        let resp = self.client.post(&player_url).json(&body).send().await?;
        check_status(resp.status(), video_id)?;
        let text = resp.error_for_status()?.text().await?;

        serde_json::from_str(&text).map_err(|e| ProviderError::Unparsable(format!("player response: {e}")))
    }
}

#[async_trait]
impl TranscriptProvider for YouTubeProvider {
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<TranscriptList, ProviderError> {
        let resp = self.fetch_player(video_id).await?;
        tracks_from_player(video_id, resp)
    }

    async fn fetch(&self, video_id: &VideoId, track: &CaptionTrack) -> Result<Vec<RawSegment>, ProviderError> {
        if track.base_url.contains("&exp=xpe") {
            return Err(ProviderError::PoTokenRequired(video_id.to_string()));
        }

        debug!("Fetching {} caption track: lang={}", track.kind, track.language_code);
        let resp = self.client.get(&track.base_url).send().await?;
        check_status(resp.status(), video_id)?;
        let body = resp.error_for_status()?.text().await?;

        parse_caption_body(&body)
    }
}

fn check_status(status: StatusCode, video_id: &VideoId) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RequestBlocked(video_id.to_string()));
    }
    Ok(())
}

fn extract_api_key(html: &str, video_id: &VideoId) -> Result<String, ProviderError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(ProviderError::RequestBlocked(video_id.to_string()));
    }

    let patterns = [
        r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#,
        // Fallback: try the newer pattern
        r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|e| ProviderError::Unparsable(e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }

    Err(ProviderError::Unparsable("could not extract InnerTube API key from watch page".to_string()))
}

fn check_playability(video_id: &VideoId, status: Option<PlayabilityStatus>) -> Result<(), ProviderError> {
    let Some(status) = status else {
        return Ok(());
    };
    let code = status.status.unwrap_or_default();
    let reason = status.reason.unwrap_or_default();

    match code.as_str() {
        "OK" | "" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(ProviderError::RequestBlocked(video_id.to_string())),
        "LOGIN_REQUIRED" if reason.contains("inappropriate for some users") => {
            Err(ProviderError::AgeRestricted(video_id.to_string()))
        }
        "ERROR" if reason.contains("unavailable") => Err(ProviderError::VideoUnavailable(video_id.to_string())),
        _ => Err(ProviderError::Unplayable(video_id.to_string(), reason)),
    }
}

fn tracks_from_player(video_id: &VideoId, resp: InnerTubePlayerResponse) -> Result<TranscriptList, ProviderError> {
    check_playability(video_id, resp.playability_status)?;

    let tracks: Vec<CaptionTrack> = resp
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|t| {
            let language = t
                .name
                .and_then(|n| n.simple_text.or_else(|| n.runs?.into_iter().next().map(|r| r.text)))
                .unwrap_or_else(|| t.language_code.clone());
            let kind = match t.kind.as_deref() {
                Some("asr") => TrackKind::Generated,
                _ => TrackKind::Manual,
            };
            CaptionTrack {
                language_code: t.language_code,
                language,
                kind,
                base_url: t.base_url.replace("&fmt=srv3", ""),
            }
        })
        .collect();

    if tracks.is_empty() {
        return Err(ProviderError::TranscriptsDisabled(video_id.to_string()));
    }

    Ok(TranscriptList::new(video_id.clone(), tracks))
}

/// Parse a timedtext body: json3 when it looks like JSON, XML otherwise
fn parse_caption_body(body: &str) -> Result<Vec<RawSegment>, ProviderError> {
    if body.trim_start().starts_with('{') {
        parse_caption_json3(body)
    } else {
        parse_caption_xml(body)
    }
}

fn parse_caption_json3(body: &str) -> Result<Vec<RawSegment>, ProviderError> {
    let captions: Json3Captions =
        serde_json::from_str(body).map_err(|e| ProviderError::Unparsable(format!("json3 captions: {e}")))?;

    Ok(captions
        .events
        .into_iter()
        .filter_map(|event| {
            // Events without segs are window/style markers
            let segs = event.segs?;
            let text: String = segs.into_iter().filter_map(|s| s.utf8).collect();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(RawSegment::Record(serde_json::json!({
                "text": html_escape::decode_html_entities(text),
                "start": event.t_start_ms / 1000.0,
                "duration": event.d_duration_ms / 1000.0,
            })))
        })
        .collect())
}

fn parse_caption_xml(xml: &str) -> Result<Vec<RawSegment>, ProviderError> {
    use quick_xml::Reader;
    use quick_xml::events::{BytesStart, Event};

    fn attrs_of(e: &BytesStart) -> HashMap<String, String> {
        e.attributes()
            .flatten()
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                    String::from_utf8_lossy(&attr.value).to_string(),
                )
            })
            .collect()
    }

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<(HashMap<String, String>, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                current = Some((attrs_of(e), String::new()));
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"text" => {
                segments.push(RawSegment::Element {
                    attrs: attrs_of(e),
                    body: None,
                });
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, body)) = current.as_mut() {
                    body.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((attrs, raw_text)) = current.take() {
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    segments.push(RawSegment::Element {
                        attrs,
                        body: (!text.is_empty()).then_some(text),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ProviderError::Unparsable(format!("caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(segments)
}
