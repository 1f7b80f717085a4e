//! Tubenote Core Library
//!
//! Finds a YouTube video for a query, summarizes it from its metadata and
//! subtitles, and keeps the result in a flat-file knowledge base.

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod knowledge_base;
pub mod metadata;
pub mod provider;
pub mod search;
pub mod transcription;
pub mod types;
pub mod workflow;

// Re-export commonly used items at crate root
pub use config::Settings;
pub use error::{ErrorKind, Result, TubenoteError};
pub use extract::{ContentSummaryExtractor, ExtractorConfig, extract_main_content};
pub use format::{format_count, format_entry_readable, format_timestamp};
pub use knowledge_base::{KnowledgeBase, SortOrder, filter_entries, sort_entries};
pub use metadata::{MetadataSource, YtDlp};
pub use provider::{Provider, ProviderConfig};
pub use search::{SerpApiClient, VideoSearch};
pub use transcription::{
    ChatCompletionsClient, DegradedSummaryMode, SummaryMode, TextGenerator, Transcribe,
    TranscriptionClient,
};
pub use types::{
    EntryDraft, EntrySummary, KnowledgeBaseEntry, SearchResult, SummaryModeKind,
    TranscriptionRecord, VideoMetadata,
};
pub use workflow::{Workflow, WorkflowFailure, WorkflowOutput, WorkflowResult, WorkflowStep};
