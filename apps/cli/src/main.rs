use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use tubenote_core::{ExtractorConfig, Provider, Settings, SortOrder};

mod commands;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Grok,
    Openai,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum CliSortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl From<CliSortOrder> for SortOrder {
    fn from(cli: CliSortOrder) -> Self {
        match cli {
            CliSortOrder::Newest => SortOrder::Newest,
            CliSortOrder::Oldest => SortOrder::Oldest,
            CliSortOrder::Title => SortOrder::Title,
        }
    }
}

#[derive(Parser)]
#[command(name = "tubenote")]
#[command(about = "Find YouTube videos, summarize them with AI, and keep the notes locally")]
struct Cli {
    /// Knowledge base directory (overrides KNOWLEDGE_BASE_PATH)
    #[arg(long, global = true)]
    kb_dir: Option<PathBuf>,

    /// AI provider for summaries
    #[arg(short, long, global = true, default_value = "gemini")]
    provider: CliProvider,

    /// Model name (defaults to the provider's model)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// How many search results to fetch
    #[arg(short, long, global = true)]
    limit: Option<usize>,

    /// Maximum length of the main-content snippet, in characters
    #[arg(long, global = true)]
    snippet_chars: Option<usize>,

    /// Extra heading that introduces the main content (checked before the defaults)
    #[arg(long = "marker", global = true)]
    markers: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search, summarize the top video and save it
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the workflow result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved entries
    List {
        /// Only show entries whose title contains this term
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(short, long, value_enum, default_value = "newest")]
        sort: CliSortOrder,
    },
    /// Show a saved entry
    Show {
        filename: String,

        /// Write the plain transcription to this file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Delete a saved entry
    Delete { filename: String },
    /// Check credentials, the search API and yt-dlp
    Check,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env_with_provider(self.provider.into());
        if let Some(dir) = &self.kb_dir {
            settings.knowledge_base_dir = dir.clone();
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(limit) = self.limit {
            settings.search_limit = limit.max(1);
        }
        settings
    }

    fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        if let Some(max_chars) = self.snippet_chars {
            config.max_chars = max_chars.max(1);
        }
        if !self.markers.is_empty() {
            let mut markers: Vec<String> = self
                .markers
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            markers.append(&mut config.markers);
            config.markers = markers;
        }
        config
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = cli.settings();
    let extractor = cli.extractor_config();

    let outcome = match cli.command {
        Some(Command::Search { query, json }) => {
            commands::search(&settings, &extractor, &query.join(" "), json).await
        }
        Some(Command::List { filter, sort }) => {
            commands::list(&settings, filter.as_deref(), sort.into()).await
        }
        Some(Command::Show { filename, export }) => {
            commands::show(&settings, &filename, export.as_deref()).await
        }
        Some(Command::Delete { filename }) => commands::delete(&settings, &filename).await,
        Some(Command::Check) => commands::check(&settings).await,
        None => commands::interactive(&settings, &extractor).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
