//! Flat-file knowledge base: one pretty-printed JSON document per entry.
//!
//! The directory is the only source of truth. Nothing is cached between
//! calls, so external edits show up on the next list/load.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    error::{Result, TubenoteError},
    types::{ENTRY_SOURCE, EntryDraft, EntryMetadata, EntrySummary, KnowledgeBaseEntry},
};

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    base_dir: PathBuf,
}

impl KnowledgeBase {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write a new entry stamped with the current local time.
    pub async fn save(&self, draft: EntryDraft) -> Result<PathBuf> {
        self.save_at(draft, Local::now()).await
    }

    pub async fn save_at(&self, draft: EntryDraft, now: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|source| TubenoteError::WriteFailed {
                path: self.base_dir.clone(),
                source,
            })?;

        let path = self.base_dir.join(entry_filename(&draft.title, now));
        let entry = KnowledgeBaseEntry {
            metadata: EntryMetadata {
                title: draft.title,
                url: draft.url,
                saved_at: now.to_rfc3339_opts(SecondsFormat::Secs, false),
                source: ENTRY_SOURCE.to_string(),
            },
            transcription: draft.transcription,
            raw_data: draft.raw_data,
            main_content: draft.main_content,
        };

        let pretty_json = serde_json::to_string_pretty(&entry)?;
        fs::write(&path, pretty_json)
            .await
            .map_err(|source| TubenoteError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), "saved knowledge base entry");
        Ok(path)
    }

    /// Summaries of every readable entry. Unreadable files are skipped.
    pub async fn list(&self) -> Vec<EntrySummary> {
        let mut dir = match fs::read_dir(&self.base_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = %self.base_dir.display(), error = %e, "cannot read knowledge base");
                }
                return Vec::new();
            }
        };

        let mut entries = Vec::new();
        loop {
            let item = match dir.next_entry().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stopped reading knowledge base directory");
                    break;
                }
            };

            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match read_entry(&path).await {
                Ok(entry) => entries.push(EntrySummary {
                    filename: filename.to_string(),
                    title: entry.metadata.title,
                    date: entry.metadata.saved_at,
                    url: entry.metadata.url,
                }),
                Err(e) => debug!(file = filename, error = %e, "skipping unreadable entry"),
            }
        }
        entries
    }

    pub async fn load(&self, filename: &str) -> Result<KnowledgeBaseEntry> {
        let path = self.resolve(filename)?;
        read_entry(&path).await
    }

    /// Remove an entry. Returns false when it does not exist or cannot be removed.
    pub async fn delete(&self, filename: &str) -> bool {
        let Ok(path) = self.resolve(filename) else {
            return false;
        };

        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete entry");
                false
            }
        }
    }

    /// Entry names must be bare file names inside the base directory.
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.base_dir.join(filename)),
            _ => Err(TubenoteError::InvalidFilename {
                filename: filename.to_string(),
            }),
        }
    }
}

async fn read_entry(path: &Path) -> Result<KnowledgeBaseEntry> {
    let json_content = fs::read_to_string(path).await?;
    let entry: KnowledgeBaseEntry = serde_json::from_str(&json_content)?;
    Ok(entry)
}

/// Keep alphanumerics, spaces, hyphens and underscores; trim trailing whitespace.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

/// `<sanitized-title>_<YYYYMMDD_HHMMSS>.json`
pub fn entry_filename(title: &str, at: DateTime<Local>) -> String {
    let mut safe_title = sanitize_title(title);
    if safe_title.trim().is_empty() {
        safe_title = "untitled".to_string();
    }
    format!("{}_{}.{}", safe_title, at.format("%Y%m%d_%H%M%S"), EXTENSION)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

pub fn sort_entries(entries: &mut [EntrySummary], order: SortOrder) {
    match order {
        SortOrder::Newest => entries.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => entries.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Title => entries.sort_by_key(|e| e.title.to_lowercase()),
    }
}

/// Case-insensitive title substring match. An empty term keeps everything.
pub fn filter_entries(entries: Vec<EntrySummary>, term: &str) -> Vec<EntrySummary> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| e.title.to_lowercase().contains(&term))
        .collect()
}
