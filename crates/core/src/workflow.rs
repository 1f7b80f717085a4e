use std::{fmt, path::PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::DEFAULT_SEARCH_LIMIT,
    error::TubenoteError,
    extract::ContentSummaryExtractor,
    knowledge_base::KnowledgeBase,
    search::VideoSearch,
    transcription::Transcribe,
    types::{EntryDraft, SearchResult, SummaryModeKind, UNKNOWN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Search,
    Transcription,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStep::Search => f.write_str("search"),
            WorkflowStep::Transcription => f.write_str("transcription"),
        }
    }
}

#[derive(Error, Debug)]
#[error("{step} step failed: {error}")]
pub struct WorkflowFailure {
    pub step: WorkflowStep,
    #[source]
    pub error: TubenoteError,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutput {
    pub search_results: Vec<SearchResult>,
    pub title: String,
    pub url: String,
    pub transcription: String,
    pub main_content: String,
    pub raw_data: Map<String, Value>,
    pub mode: SummaryModeKind,
    pub saved_path: Option<PathBuf>,
}

pub type WorkflowResult = std::result::Result<WorkflowOutput, WorkflowFailure>;

/// Search -> transcribe -> extract -> persist, stopping at the first failure.
pub struct Workflow<S, T> {
    search: S,
    transcriber: T,
    knowledge_base: KnowledgeBase,
    extractor: ContentSummaryExtractor,
    search_limit: usize,
}

impl<S: VideoSearch, T: Transcribe> Workflow<S, T> {
    pub fn new(search: S, transcriber: T, knowledge_base: KnowledgeBase) -> Self {
        Self {
            search,
            transcriber,
            knowledge_base,
            extractor: ContentSummaryExtractor::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_extractor(mut self, extractor: ContentSummaryExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub async fn process_query(&self, query: &str) -> WorkflowResult {
        info!(query, "starting workflow");

        let search_results = self
            .search
            .search(query, self.search_limit)
            .await
            .map_err(|error| WorkflowFailure {
                step: WorkflowStep::Search,
                error,
            })?;

        let Some(top) = search_results.first() else {
            return Err(WorkflowFailure {
                step: WorkflowStep::Search,
                error: TubenoteError::NoVideosFound {
                    query: query.to_string(),
                },
            });
        };
        let url = top.link.clone();
        info!(title = %top.title, url = %url, results = search_results.len(), "selected top result");

        let mut record = self
            .transcriber
            .transcribe(&url)
            .await
            .map_err(|error| WorkflowFailure {
                step: WorkflowStep::Transcription,
                error,
            })?;

        let title = if top.title == UNKNOWN {
            record.video_title.clone()
        } else {
            top.title.clone()
        };
        record.main_content = Some(self.extractor.extract(&record.transcription));

        let draft = EntryDraft::from_record(&title, &record);
        let saved_path = match self.knowledge_base.save(draft).await {
            Ok(path) => {
                info!(path = %path.display(), "transcription saved");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "could not save transcription, continuing");
                None
            }
        };

        Ok(WorkflowOutput {
            search_results,
            title,
            url,
            main_content: record.main_content.unwrap_or_default(),
            transcription: record.transcription,
            raw_data: record.raw_data,
            mode: record.mode,
            saved_path,
        })
    }
}
