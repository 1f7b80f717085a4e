use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::{
    config::Settings,
    error::{Result, TubenoteError},
    format::{format_count, format_timestamp},
    metadata::{MetadataSource, YtDlp},
    provider::Provider,
    types::{SummaryModeKind, TranscriptionRecord, VideoMetadata},
};

const DESCRIPTION_PREVIEW_CHARS: usize = 500;

/// Produces a transcription record for a video URL.
pub trait Transcribe {
    async fn transcribe(&self, video_url: &str) -> Result<TranscriptionRecord>;
}

/// Free-text completion from a generative model.
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible `chat/completions` client.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    provider: Provider,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(provider: Provider, api_key: String, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider,
            api_key,
            model: model.into(),
            temperature: 0.3,
        }
    }
}

impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self.provider.config();
        let provider_name = self.provider.name();

        debug!(provider = provider_name, model = %self.model, "requesting completion");
        let response = self
            .http
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": self.temperature,
            }))
            .send()
            .await
            .map_err(|e| TubenoteError::from_reqwest(provider_name, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubenoteError::Status {
                provider: provider_name,
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| TubenoteError::from_reqwest(provider_name, e))?;

        completion_text(&payload, provider_name)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub fn completion_text(payload: &Value, provider: &'static str) -> Result<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TubenoteError::MalformedPayload {
            provider,
            reason: "response has no choices[0].message.content".to_string(),
        })
}

/// Metadata-only summary used when no generative credential is configured.
#[derive(Debug, Clone)]
pub struct DegradedSummaryMode {
    missing_env_var: String,
}

impl DegradedSummaryMode {
    pub fn new(missing_env_var: impl Into<String>) -> Self {
        Self {
            missing_env_var: missing_env_var.into(),
        }
    }

    pub fn render(&self, metadata: &VideoMetadata) -> String {
        let mut out = String::new();
        out.push_str(&format!("Title: {}\n", metadata.title));
        out.push_str(&format!("Channel: {}\n", metadata.channel));
        out.push_str(&format!(
            "Duration: {}\n",
            metadata
                .duration_seconds
                .map(format_timestamp)
                .unwrap_or_else(|| "unknown".to_string())
        ));
        if let Some(views) = metadata.view_count {
            out.push_str(&format!("Views: {}\n", format_count(views)));
        }
        if let Some(date) = &metadata.upload_date {
            out.push_str(&format!("Uploaded: {date}\n"));
        }

        out.push_str("\nDescription:\n");
        let description = metadata.description.trim();
        if description.is_empty() {
            out.push_str("(no description provided)\n");
        } else {
            out.push_str(description);
            out.push('\n');
        }

        out.push_str(&format!(
            "\nNote: AI summarization is unavailable ({} is not set). \
             This summary was built from video metadata only.",
            self.missing_env_var
        ));
        out
    }
}

pub enum SummaryMode<G> {
    Generative(G),
    Degraded(DegradedSummaryMode),
}

impl<G> SummaryMode<G> {
    pub fn kind(&self) -> SummaryModeKind {
        match self {
            SummaryMode::Generative(_) => SummaryModeKind::Generative,
            SummaryMode::Degraded(_) => SummaryModeKind::Degraded,
        }
    }
}

pub struct TranscriptionClient<M = YtDlp, G = ChatCompletionsClient> {
    metadata: M,
    mode: SummaryMode<G>,
}

impl TranscriptionClient {
    /// yt-dlp metadata plus the configured provider, or degraded mode when
    /// the provider's key is absent.
    pub fn from_settings(settings: &Settings) -> Self {
        let mode = match &settings.generative_api_key {
            Some(key) => SummaryMode::Generative(ChatCompletionsClient::new(
                settings.provider,
                key.clone(),
                settings.model(),
            )),
            None => SummaryMode::Degraded(DegradedSummaryMode::new(
                settings.provider.config().env_var,
            )),
        };
        Self::new(YtDlp::default(), mode)
    }
}

impl<M, G> TranscriptionClient<M, G> {
    pub fn new(metadata: M, mode: SummaryMode<G>) -> Self {
        Self { metadata, mode }
    }

    pub fn mode(&self) -> SummaryModeKind {
        self.mode.kind()
    }

    pub fn metadata_source(&self) -> &M {
        &self.metadata
    }
}

impl<M: MetadataSource, G: TextGenerator> Transcribe for TranscriptionClient<M, G> {
    async fn transcribe(&self, video_url: &str) -> Result<TranscriptionRecord> {
        let metadata = self.metadata.fetch(video_url).await?;
        info!(title = %metadata.title, mode = self.mode.kind().as_str(), "fetched video metadata");

        let transcription = match &self.mode {
            SummaryMode::Generative(generator) => {
                generator.generate(&build_prompt(&metadata)).await?
            }
            SummaryMode::Degraded(degraded) => degraded.render(&metadata),
        };

        Ok(TranscriptionRecord {
            transcription,
            video_title: metadata.title.clone(),
            video_url: video_url.to_string(),
            raw_data: raw_data(&metadata, self.mode.kind()),
            main_content: None,
            mode: self.mode.kind(),
        })
    }
}

const SYSTEM_PROMPT: &str = "You summarize YouTube videos from their metadata, description and \
subtitles. Be faithful to the source and do not invent content that is not supported by it.";

pub fn build_prompt(metadata: &VideoMetadata) -> String {
    let duration = metadata
        .duration_seconds
        .map(format_timestamp)
        .unwrap_or_else(|| "unknown".to_string());
    let subtitles = metadata
        .subtitles
        .as_deref()
        .unwrap_or("(no subtitles available)");

    format!(
        r#"Please provide a detailed transcription and summary of this video content:

Video Title: {title}
Channel: {channel}
Duration: {duration}
Upload date: {uploaded}

Video Description:
{description}

Transcript/Subtitles:
{subtitles}

Provide:
1. Complete transcription (if available)
2. Key points summary
3. Timestamps for important sections (if possible)
4. A section headed "Main takeaways:" with the most important insights, followed by a blank line"#,
        title = metadata.title,
        channel = metadata.channel,
        uploaded = metadata.upload_date.as_deref().unwrap_or("unknown"),
        description = metadata.description.trim(),
    )
}

fn raw_data(metadata: &VideoMetadata, mode: SummaryModeKind) -> Map<String, Value> {
    let description = if metadata.description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let preview: String = metadata
            .description
            .chars()
            .take(DESCRIPTION_PREVIEW_CHARS)
            .collect();
        format!("{preview}...")
    } else {
        metadata.description.clone()
    };

    let mut data = Map::new();
    data.insert("description".into(), json!(description));
    data.insert(
        "subtitles_available".into(),
        json!(metadata.subtitles.is_some()),
    );
    data.insert("channel".into(), json!(metadata.channel));
    data.insert("duration_seconds".into(), json!(metadata.duration_seconds));
    data.insert("view_count".into(), json!(metadata.view_count));
    data.insert("upload_date".into(), json!(metadata.upload_date));
    data.insert("categories".into(), json!(metadata.categories));
    data.insert("summary_mode".into(), json!(mode.as_str()));
    data
}
