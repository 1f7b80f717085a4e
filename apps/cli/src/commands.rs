use std::{io::Write, path::Path, time::Instant};

use anyhow::{Context, Result, bail};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use tracing::warn;
use tubenote_core::{
    ContentSummaryExtractor, ErrorKind, ExtractorConfig, KnowledgeBase, SerpApiClient, Settings,
    SortOrder, SummaryModeKind, TranscriptionClient, VideoSearch, Workflow, WorkflowFailure,
    WorkflowOutput, filter_entries, format_entry_readable, sort_entries,
};

use crate::{create_spinner, format_duration};

type AppWorkflow = Workflow<SerpApiClient, TranscriptionClient>;

fn build_workflow(settings: &Settings, extractor: &ExtractorConfig) -> AppWorkflow {
    Workflow::new(
        SerpApiClient::from_settings(settings),
        TranscriptionClient::from_settings(settings),
        KnowledgeBase::new(&settings.knowledge_base_dir),
    )
    .with_search_limit(settings.search_limit)
    .with_extractor(ContentSummaryExtractor::new(extractor.clone()))
}

fn print_header(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("tubenote").cyan().bold(),
        style(subtitle).dim()
    );
}

fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub async fn search(
    settings: &Settings,
    extractor: &ExtractorConfig,
    query: &str,
    json: bool,
) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("search query is empty");
    }

    let workflow = build_workflow(settings, extractor);
    if json {
        let output = workflow
            .process_query(query)
            .await
            .map_err(describe_failure)?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_header("Video Notes");
    run_query(&workflow, settings, query).await
}

async fn run_query(workflow: &AppWorkflow, settings: &Settings, query: &str) -> Result<()> {
    let start = Instant::now();
    let spinner = create_spinner(&format!(
        "Searching and summarizing with {}...",
        settings.provider.name()
    ));

    match workflow.process_query(query).await {
        Ok(output) => {
            spinner.finish_with_message(format!(
                "{} Done {}",
                style("✓").green().bold(),
                style(format!("[{}]", format_duration(start.elapsed()))).dim()
            ));
            print_output(&output);
            Ok(())
        }
        Err(failure) => {
            spinner.finish_with_message(format!("{} Failed", style("✗").red().bold()));
            Err(describe_failure(failure))
        }
    }
}

fn describe_failure(failure: WorkflowFailure) -> anyhow::Error {
    let hint = match failure.error.kind() {
        ErrorKind::Configuration => "run `tubenote check` to see what is missing",
        ErrorKind::Transient => "the service may be busy, try again shortly",
        ErrorKind::DataShape => "try a different query",
        ErrorKind::Persistence => "check the knowledge base directory",
    };
    anyhow::Error::new(failure).context(hint)
}

fn print_output(output: &WorkflowOutput) {
    rule();
    println!("{}", style("Search results").bold());
    for (i, result) in output.search_results.iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            style(&result.title).cyan(),
            style(format!("({}, {}, {})", result.channel, result.duration, result.views)).dim()
        );
        println!("     {}", style(&result.link).dim());
    }

    rule();
    println!("{} {}", style("Video:").dim(), style(&output.title).bold());
    println!("{} {}", style("URL:").dim(), output.url);
    if output.mode == SummaryModeKind::Degraded {
        println!(
            "{}",
            style("AI summary unavailable, showing metadata only").yellow()
        );
    }

    println!("\n{}", style("Main content").bold());
    println!("{}", output.main_content);

    println!("\n{}", style("Full summary").bold());
    println!("{}", output.transcription);

    rule();
    match &output.saved_path {
        Some(path) => println!("{} {}", style("Saved:").dim(), style(path.display()).cyan()),
        None => println!(
            "{}",
            style("Not saved: the knowledge base could not be written").yellow()
        ),
    }
}

pub async fn list(settings: &Settings, filter: Option<&str>, sort: SortOrder) -> Result<()> {
    let kb = KnowledgeBase::new(&settings.knowledge_base_dir);
    let mut entries = filter_entries(kb.list().await, filter.unwrap_or_default());
    sort_entries(&mut entries, sort);

    if entries.is_empty() {
        println!(
            "{} {}",
            style("No entries in").dim(),
            style(kb.base_dir().display()).cyan()
        );
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}",
            style(&entry.date).dim(),
            style(&entry.title).cyan().bold()
        );
        println!("    {}  {}", style(&entry.filename).dim(), entry.url);
    }
    println!("\n{} {}", style("Total:").dim(), entries.len());
    Ok(())
}

pub async fn show(settings: &Settings, filename: &str, export: Option<&Path>) -> Result<()> {
    let kb = KnowledgeBase::new(&settings.knowledge_base_dir);
    let entry = kb
        .load(filename)
        .await
        .with_context(|| format!("could not load {filename}"))?;

    println!("{}", format_entry_readable(&entry));

    if let Some(path) = export {
        tokio::fs::write(path, &entry.transcription)
            .await
            .with_context(|| format!("could not export to {}", path.display()))?;
        println!(
            "{} Exported to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}

pub async fn delete(settings: &Settings, filename: &str) -> Result<()> {
    let kb = KnowledgeBase::new(&settings.knowledge_base_dir);
    if kb.delete(filename).await {
        println!("{} Deleted {}", style("✓").green().bold(), filename);
    } else {
        println!("{} {} was not found", style("!").yellow().bold(), filename);
    }
    Ok(())
}

pub async fn check(settings: &Settings) -> Result<()> {
    print_header("Connectivity Check");

    let mark = |ok: bool| {
        if ok {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        }
    };

    println!(
        "{} Search API key {}",
        mark(settings.search_api_key.is_some()),
        style("(SERPAPI_API_KEY)").dim()
    );
    println!(
        "{} {} API key {}",
        mark(settings.generative_api_key.is_some()),
        settings.provider.name(),
        style(format!("({})", settings.provider.config().env_var)).dim()
    );
    println!(
        "{} Knowledge base {}",
        mark(true),
        style(settings.knowledge_base_dir.display()).cyan()
    );

    let search = SerpApiClient::from_settings(settings);
    if search.has_api_key() {
        let spinner = create_spinner("Probing search API...");
        match search.search("test", 1).await {
            Ok(_) => spinner.finish_with_message(format!("{} Search API reachable", mark(true))),
            Err(e) => spinner.finish_with_message(format!(
                "{} Search API: {}",
                mark(false),
                style(e).red()
            )),
        }
    } else {
        println!("{} Search API probe skipped", style("-").dim());
    }

    let transcriber = TranscriptionClient::from_settings(settings);
    match transcriber.metadata_source().version().await {
        Ok(version) => println!("{} yt-dlp {}", mark(true), style(version).dim()),
        Err(e) => println!("{} {}", mark(false), style(e).red()),
    }

    if transcriber.mode() == SummaryModeKind::Degraded {
        println!(
            "\n{}",
            style("Summaries will fall back to metadata-only mode").yellow()
        );
    }
    Ok(())
}

pub async fn interactive(settings: &Settings, extractor: &ExtractorConfig) -> Result<()> {
    print_header("Video Notes");
    println!(
        "{}",
        style("Type a search query, or press Enter / type quit to exit").dim()
    );

    let workflow = build_workflow(settings, extractor);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n{} ", style("query>").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("quit") {
            break;
        }

        // A failed query should not end the session
        if let Err(e) = run_query(&workflow, settings, query).await {
            warn!(query, error = %e, "query failed, session continues");
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
        }
    }
    Ok(())
}
