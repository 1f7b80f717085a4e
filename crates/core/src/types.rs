use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";
pub const ENTRY_SOURCE: &str = "youtube";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub channel: String,
    pub duration: String,
    pub views: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub duration_seconds: Option<f64>,
    pub channel: String,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub categories: Vec<String>,
    /// Plain-text subtitle track, when one could be fetched.
    pub subtitles: Option<String>,
}

/// Which path produced a transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryModeKind {
    Generative,
    Degraded,
}

impl SummaryModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryModeKind::Generative => "generative",
            SummaryModeKind::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionRecord {
    pub transcription: String,
    pub video_title: String,
    pub video_url: String,
    pub raw_data: Map<String, Value>,
    pub main_content: Option<String>,
    pub mode: SummaryModeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub title: String,
    pub url: String,
    pub saved_at: String,
    pub source: String,
}

/// One persisted knowledge-base document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub metadata: EntryMetadata,
    pub transcription: String,
    #[serde(default)]
    pub raw_data: Map<String, Value>,
    #[serde(default)]
    pub main_content: String,
}

/// Everything `KnowledgeBase::save` needs; the store stamps the time itself.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    pub url: String,
    pub transcription: String,
    pub raw_data: Map<String, Value>,
    pub main_content: String,
}

impl EntryDraft {
    pub fn from_record(title: &str, record: &TranscriptionRecord) -> Self {
        Self {
            title: title.to_string(),
            url: record.video_url.clone(),
            transcription: record.transcription.clone(),
            raw_data: record.raw_data.clone(),
            main_content: record.main_content.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub filename: String,
    pub title: String,
    pub date: String,
    pub url: String,
}
