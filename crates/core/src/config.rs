use std::{path::PathBuf, time::Duration};

use crate::provider::{Provider, non_empty_env};

pub const SERPAPI_ENV_VAR: &str = "SERPAPI_API_KEY";
pub const KNOWLEDGE_BASE_ENV_VAR: &str = "KNOWLEDGE_BASE_PATH";
pub const SEARCH_LIMIT_ENV_VAR: &str = "TUBENOTE_SEARCH_LIMIT";

pub const DEFAULT_KNOWLEDGE_BASE_DIR: &str = "./transcripts";
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings. Read once at startup; the core never writes them back.
#[derive(Clone, Debug)]
pub struct Settings {
    pub search_api_key: Option<String>,
    pub provider: Provider,
    pub generative_api_key: Option<String>,
    pub model: Option<String>,
    pub knowledge_base_dir: PathBuf,
    pub search_limit: usize,
    pub search_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_api_key: None,
            provider: Provider::default(),
            generative_api_key: None,
            model: None,
            knowledge_base_dir: PathBuf::from(DEFAULT_KNOWLEDGE_BASE_DIR),
            search_limit: DEFAULT_SEARCH_LIMIT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn from_env_with_provider(provider: Provider) -> Self {
        let search_limit = non_empty_env(SEARCH_LIMIT_ENV_VAR)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);

        Self {
            search_api_key: non_empty_env(SERPAPI_ENV_VAR),
            provider,
            generative_api_key: provider.api_key(),
            model: None,
            knowledge_base_dir: non_empty_env(KNOWLEDGE_BASE_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_knowledge_base_dir),
            search_limit,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.config().model)
    }
}

/// `./transcripts` when it already exists, otherwise the per-user data dir.
pub fn default_knowledge_base_dir() -> PathBuf {
    let local = PathBuf::from(DEFAULT_KNOWLEDGE_BASE_DIR);
    if local.is_dir() {
        return local;
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("tubenote").join("transcripts"))
        .unwrap_or(local)
}
