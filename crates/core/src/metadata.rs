use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    error::{Result, TubenoteError},
    types::{UNKNOWN, VideoMetadata},
};

pub const YT_DLP: &str = "yt-dlp";
const SUBTITLE_LANG: &str = "en";

/// Looks up metadata for a video URL.
pub trait MetadataSource {
    async fn fetch(&self, url: &str) -> Result<VideoMetadata>;
}

/// Metadata via the `yt-dlp` JSON dump. Nothing is downloaded except an
/// optional subtitle track.
pub struct YtDlp {
    binary: String,
    http: reqwest::Client,
    fetch_subtitles: bool,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            binary: YT_DLP.to_string(),
            http: reqwest::Client::new(),
            fetch_subtitles: true,
        }
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    pub fn without_subtitles(mut self) -> Self {
        self.fetch_subtitles = false;
        self
    }

    /// `yt-dlp --version`, used by the connectivity check.
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn dump_info(&self, url: &str) -> Result<Value> {
        let output = Command::new(&self.binary)
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--extractor-args")
            .arg("youtube:player_client=android,web")
            .arg(url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(TubenoteError::MetadataFailed {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| TubenoteError::MetadataFailed {
            url: url.to_string(),
            reason: format!("unreadable yt-dlp output: {e}"),
        })
    }

    async fn download_subtitles(&self, track_url: &str) -> Option<String> {
        let response = match self.http.get(track_url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "subtitle download rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "subtitle download failed");
                return None;
            }
        };

        match response.text().await {
            Ok(body) => Some(vtt_to_text(&body)).filter(|text| !text.is_empty()),
            Err(e) => {
                warn!(error = %e, "subtitle body unreadable");
                None
            }
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> TubenoteError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TubenoteError::ToolMissing {
                tool: self.binary.clone(),
            }
        } else {
            TubenoteError::IoError(e)
        }
    }
}

impl MetadataSource for YtDlp {
    async fn fetch(&self, url: &str) -> Result<VideoMetadata> {
        let info = self.dump_info(url).await?;
        let mut metadata = parse_info(&info);

        if self.fetch_subtitles {
            if let Some(track) = subtitle_track_url(&info, SUBTITLE_LANG) {
                debug!(url, "fetching subtitle track");
                metadata.subtitles = self.download_subtitles(&track).await;
            }
        }

        Ok(metadata)
    }
}

/// Read the fields we care about from a yt-dlp info dictionary.
pub fn parse_info(info: &Value) -> VideoMetadata {
    let text = |key: &str| info.get(key).and_then(Value::as_str).map(str::to_string);

    VideoMetadata {
        title: text("title").unwrap_or_else(|| UNKNOWN.to_string()),
        description: text("description").unwrap_or_default(),
        duration_seconds: info.get("duration").and_then(Value::as_f64),
        channel: text("channel")
            .or_else(|| text("uploader"))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        view_count: info.get("view_count").and_then(Value::as_u64),
        upload_date: text("upload_date").map(|d| format_upload_date(&d)),
        categories: info
            .get("categories")
            .and_then(Value::as_array)
            .map(|c| {
                c.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        subtitles: None,
    }
}

/// `20240131` -> `2024-01-31`; anything else is returned unchanged.
fn format_upload_date(raw: &str) -> String {
    chrono::NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// WebVTT track for `lang`, manual subtitles before automatic captions.
pub fn subtitle_track_url(info: &Value, lang: &str) -> Option<String> {
    ["subtitles", "automatic_captions"].iter().find_map(|group| {
        info.get(*group)?
            .get(lang)?
            .as_array()?
            .iter()
            .find(|track| track.get("ext").and_then(Value::as_str) == Some("vtt"))?
            .get("url")?
            .as_str()
            .map(str::to_string)
    })
}

/// Strip cue timings, headers and inline tags from a WebVTT body.
///
/// Auto captions repeat each line across rolling cues, so consecutive
/// duplicates are dropped.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = true;

    for raw in vtt.lines() {
        let line = raw.trim();
        if in_header {
            if line.is_empty() {
                in_header = false;
            }
            continue;
        }
        if line.is_empty()
            || line.contains("-->")
            || line.chars().all(|c| c.is_ascii_digit())
            || line.starts_with("NOTE")
        {
            continue;
        }

        let cleaned = strip_tags(line);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || lines.last().is_some_and(|prev| prev == cleaned) {
            continue;
        }
        lines.push(cleaned.to_string());
    }

    lines.join(" ")
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&").replace("&nbsp;", " ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_info_dictionary() {
        let info = json!({
            "title": "Async Rust in depth",
            "description": "We look at futures and wakers.",
            "duration": 3725.0,
            "uploader": "Jon Gjengset",
            "view_count": 98_765,
            "upload_date": "20230412",
            "categories": ["Science & Technology"]
        });

        let metadata = parse_info(&info);
        assert_eq!(metadata.title, "Async Rust in depth");
        assert_eq!(metadata.channel, "Jon Gjengset");
        assert_eq!(metadata.duration_seconds, Some(3725.0));
        assert_eq!(metadata.view_count, Some(98_765));
        assert_eq!(metadata.upload_date.as_deref(), Some("2023-04-12"));
        assert_eq!(metadata.categories, vec!["Science & Technology"]);
        assert!(metadata.subtitles.is_none());
    }

    #[test]
    fn sparse_info_falls_back_to_defaults() {
        let metadata = parse_info(&json!({"upload_date": "sometime"}));
        assert_eq!(metadata.title, "Unknown");
        assert_eq!(metadata.channel, "Unknown");
        assert_eq!(metadata.description, "");
        assert_eq!(metadata.upload_date.as_deref(), Some("sometime"));
        assert!(metadata.categories.is_empty());
    }

    #[test]
    fn prefers_manual_subtitles_over_captions() {
        let info = json!({
            "subtitles": {"en": [{"ext": "json3", "url": "https://x/json3"}, {"ext": "vtt", "url": "https://x/manual.vtt"}]},
            "automatic_captions": {"en": [{"ext": "vtt", "url": "https://x/auto.vtt"}]}
        });
        assert_eq!(
            subtitle_track_url(&info, "en").as_deref(),
            Some("https://x/manual.vtt")
        );

        let info = json!({
            "subtitles": {"de": [{"ext": "vtt", "url": "https://x/de.vtt"}]},
            "automatic_captions": {"en": [{"ext": "vtt", "url": "https://x/auto.vtt"}]}
        });
        assert_eq!(
            subtitle_track_url(&info, "en").as_deref(),
            Some("https://x/auto.vtt")
        );

        assert!(subtitle_track_url(&json!({}), "en").is_none());
    }

    #[test]
    fn flattens_vtt_cues() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                   1\n00:00:00.000 --> 00:00:02.000 align:start\n<c>Hello</c> &amp; welcome\n\n\
                   2\n00:00:02.000 --> 00:00:04.000\nHello &amp; welcome\ntoday we talk Rust\n\n\
                   NOTE this is a comment\n\n\
                   00:00:04.000 --> 00:00:06.000\n<00:00:04.500><c>about</c> ownership";
        assert_eq!(
            vtt_to_text(vtt),
            "Hello & welcome today we talk Rust about ownership"
        );
    }

    #[tokio::test]
    async fn missing_binary_is_configuration_error() {
        let source = YtDlp::new("definitely-not-a-real-yt-dlp-binary").without_subtitles();
        let err = source.fetch("https://www.youtube.com/watch?v=x").await.unwrap_err();
        assert!(matches!(err, TubenoteError::ToolMissing { .. }));
    }
}
