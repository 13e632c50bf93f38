//! codebuddy - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use codebuddy::{
    agent::{AnalysisAgent, AnalysisReport},
    cli::{Args, Commands, Verbosity},
    config::Config,
    doctor::{Doctor, HealthStatus},
    llm::OllamaClient,
    pipeline::{CodeAnalysisPipeline, QueryOptions, QueryOutcome},
};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(message) = args.validate() {
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(2);
    }

    let mut config = Config::load()?;
    apply_overrides(&mut config, &args);
    let verbosity = args.verbosity();

    let result = match args.command {
        None => {
            let query = args.query.clone().unwrap_or_default();
            run_full_pipeline(config, &args.path, &query, verbosity).await
        }
        Some(Commands::Index {
            ref path,
            rebuild,
            chunk_size,
            chunk_overlap,
            ref ext,
            ref save_docs,
        }) => {
            if let Some(size) = chunk_size {
                config.chunking.chunk_size = size;
            }
            if let Some(overlap) = chunk_overlap {
                config.chunking.chunk_overlap = overlap;
            }
            if !ext.is_empty() {
                config.corpus.extensions = ext.clone();
            }
            if save_docs.is_some() {
                config.corpus.docs_dir = save_docs.clone();
            }
            run_index(config, path, rebuild, verbosity).await
        }
        Some(Commands::Ask {
            ref query,
            top_k,
            elaborate,
            docs,
        }) => {
            if let Some(k) = top_k {
                config.retrieval.top_k = k;
            }
            run_ask(config, query, elaborate, docs, verbosity).await
        }
        Some(Commands::Analyze { ref file }) => run_analyze(config, file).await,
        Some(Commands::Chat) => run_chat(config, verbosity).await,
        Some(Commands::Models) => run_models(config).await,
        Some(Commands::Doctor) => run_doctor(config).await,
        Some(Commands::Config) => run_config(config),
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }

    Ok(())
}

/// Apply CLI overrides on top of the config file
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(host) = &args.host {
        config.ollama.host = host.clone();
    }
    if let Some(port) = args.port {
        config.ollama.port = port;
    }
    if let Some(model) = &args.model {
        config.models.chat = model.clone();
    }
}

/// Run all four phases over a corpus, then answer the query
async fn run_full_pipeline(
    config: Config,
    path: &Path,
    query: &str,
    verbosity: Verbosity,
) -> Result<()> {
    let mut pipeline = CodeAnalysisPipeline::new(config);

    phase_banner(verbosity, 1, "Load and preprocess documents");
    let load = pipeline.load_and_preprocess(path).await?;
    report_load(&load, verbosity);

    phase_banner(verbosity, 2, "Create embeddings and vector store");
    let index = index_with_progress(&mut pipeline, true, load.chunks_created, verbosity).await?;
    status(
        verbosity,
        &format!(
            "Indexed {} chunks (dim {}) into '{}'",
            index.chunks_indexed, index.dimension, index.collection
        ),
    );

    phase_banner(verbosity, 3, "Initialize QA chain and analysis agent");
    pipeline.initialize_chains()?;

    phase_banner(verbosity, 4, "Process user query");
    let outcome = pipeline
        .process_query(
            query,
            QueryOptions {
                analyze_documents: true,
                elaborate: false,
            },
        )
        .await?;

    render_outcome(&outcome);

    if verbosity == Verbosity::Verbose {
        println!("\n{}", "Telemetry:".dimmed());
        println!("{}", pipeline.telemetry().summary().dimmed());
    }

    Ok(())
}

/// Index a corpus (phases 1-2 only)
async fn run_index(
    config: Config,
    path: &Path,
    rebuild: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let mut pipeline = CodeAnalysisPipeline::new(config);

    phase_banner(verbosity, 1, "Load and preprocess documents");
    let load = pipeline.load_and_preprocess(path).await?;
    report_load(&load, verbosity);

    phase_banner(verbosity, 2, "Create embeddings and vector store");
    let index = index_with_progress(&mut pipeline, rebuild, load.chunks_created, verbosity).await?;

    println!(
        "{} {} chunks from {} documents indexed into '{}'",
        "done:".green().bold(),
        index.chunks_indexed,
        load.documents_loaded,
        index.collection
    );

    if verbosity == Verbosity::Verbose {
        println!("\n{}", "Telemetry:".dimmed());
        println!("{}", pipeline.telemetry().summary().dimmed());
    }

    Ok(())
}

/// Answer one question against the existing index
async fn run_ask(
    config: Config,
    query: &str,
    elaborate: bool,
    docs: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let mut pipeline = CodeAnalysisPipeline::new(config);

    let count = pipeline.open_index().await?;
    status(verbosity, &format!("Using index with {count} chunks"));
    pipeline.initialize_chains()?;

    let outcome = pipeline
        .process_query(
            query,
            QueryOptions {
                analyze_documents: docs,
                elaborate,
            },
        )
        .await?;

    render_outcome(&outcome);
    Ok(())
}

/// Run the three-step workflow on one file
async fn run_analyze(config: Config, file: &PathBuf) -> Result<()> {
    let code = std::fs::read_to_string(file)?;

    let model = OllamaClient::new(&config.ollama.base_url(), config.analysis_model())?;
    let agent = AnalysisAgent::new(Arc::new(model));

    println!(
        "{} {} with {}",
        "Analyzing".cyan().bold(),
        file.display(),
        agent.model_name()
    );

    let report = agent.run(&code).await?;
    render_report(&report);
    Ok(())
}

/// Interactive QA loop over the indexed codebase
async fn run_chat(config: Config, verbosity: Verbosity) -> Result<()> {
    let mut pipeline = CodeAnalysisPipeline::new(config);

    let count = pipeline.open_index().await?;
    status(verbosity, &format!("Using index with {count} chunks"));
    pipeline.initialize_chains()?;

    let chain = pipeline
        .qa_chain()
        .ok_or_else(|| anyhow::anyhow!("QA chain not initialised"))?;

    println!(
        "{}",
        "Chat with your codebase. Type 'exit' or press Ctrl-D to quit.".dimmed()
    );

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("codebuddy> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                editor.add_history_entry(line)?;

                match chain.ask(line).await {
                    Ok(response) => {
                        println!("\n{}", response.answer);
                        if !response.sources.is_empty() {
                            let sources: Vec<String> = response
                                .sources
                                .iter()
                                .map(|s| s.chunk.source.display().to_string())
                                .collect();
                            println!("{}\n", format!("[sources: {}]", sources.join(", ")).dimmed());
                        }
                    }
                    Err(err) => eprintln!("{} {err:#}", "error:".red().bold()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// List installed Ollama models
async fn run_models(config: Config) -> Result<()> {
    let client = OllamaClient::new(&config.ollama.base_url(), &config.models.chat)?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models installed. Pull one with: ollama pull {}", config.models.chat);
        return Ok(());
    }

    println!("{}", "Installed models:".bold());
    for model in models {
        println!("  {model}");
    }
    Ok(())
}

/// Run environment diagnostics
async fn run_doctor(config: Config) -> Result<()> {
    println!("{}", "Running diagnostics...".bold());

    let doctor = Doctor::new(config);
    let checks = doctor.run_diagnostics().await;

    for check in &checks {
        match &check.status {
            HealthStatus::Pass => println!("  {} {}", "✓".green(), check.name),
            HealthStatus::Warn(reason) => {
                println!("  {} {} - {}", "!".yellow(), check.name, reason);
                if let Some(hint) = &check.hint {
                    println!("      {}", hint.dimmed());
                }
            }
            HealthStatus::Fail(reason) => {
                println!("  {} {} - {}", "✗".red(), check.name, reason);
                if let Some(hint) = &check.hint {
                    println!("      {}", hint.dimmed());
                }
            }
        }
    }

    if Doctor::has_failures(&checks) {
        std::process::exit(1);
    }

    println!("{}", "All required checks passed.".green());
    Ok(())
}

/// Show the active configuration
fn run_config(config: Config) -> Result<()> {
    let path = Config::config_path()?;
    println!("{} {}", "Config file:".bold(), path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Phase 2 with a progress bar over embedded chunks
async fn index_with_progress(
    pipeline: &mut CodeAnalysisPipeline,
    rebuild: bool,
    total_chunks: usize,
    verbosity: Verbosity,
) -> Result<codebuddy::pipeline::IndexReport> {
    let bar = if verbosity == Verbosity::Quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(total_chunks as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        bar
    };

    let report = pipeline
        .create_embeddings_and_store(rebuild, |done, _total| {
            bar.set_position(done as u64);
        })
        .await?;

    bar.finish_and_clear();
    Ok(report)
}

/// Print the load-phase summary and any skipped files
fn report_load(load: &codebuddy::pipeline::LoadReport, verbosity: Verbosity) {
    status(
        verbosity,
        &format!(
            "Loaded {} documents -> {} chunks",
            load.documents_loaded, load.chunks_created
        ),
    );

    if load.documents_saved > 0 {
        status(
            verbosity,
            &format!("Saved {} preprocessed documents", load.documents_saved),
        );
    }

    for failure in &load.failures {
        eprintln!(
            "{} skipped {}: {}",
            "warning:".yellow().bold(),
            failure.path.display(),
            failure.reason
        );
    }
}

/// Render a full query outcome the way the pipeline reports results
fn render_outcome(outcome: &QueryOutcome) {
    println!("\n{}", "Answer:".green().bold());
    println!("{}", outcome.qa.answer);

    if !outcome.qa.sources.is_empty() {
        let sources: Vec<String> = outcome
            .qa
            .sources
            .iter()
            .map(|s| s.chunk.source.display().to_string())
            .collect();
        println!("{}", format!("[sources: {}]", sources.join(", ")).dimmed());
    }

    if let Some(elaboration) = &outcome.elaboration {
        println!("\n{}", "Elaboration:".green().bold());
        println!("{elaboration}");
    }

    println!("\n{}", "AI Agent Analysis:".cyan().bold());
    println!("{}", outcome.report.analysis);

    println!("\n{}", "AI Agent Explanation:".cyan().bold());
    println!("{}", outcome.report.explanation);

    println!("\n{}", "AI Agent Suggested Improvements:".cyan().bold());
    println!("{}", outcome.report.improvements);

    for (i, doc) in outcome.document_reports.iter().enumerate() {
        println!(
            "\n{}",
            format!("Document {} Analysis ({}):", i + 1, doc.source.display())
                .cyan()
                .bold()
        );
        render_report(&doc.report);
        println!("---");
    }
}

/// Render one analysis report
fn render_report(report: &AnalysisReport) {
    println!("\n{}", "Analysis:".bold());
    println!("{}", report.analysis);
    println!("\n{}", "Explanation:".bold());
    println!("{}", report.explanation);
    println!("\n{}", "Suggested Improvements:".bold());
    println!("{}", report.improvements);
}

/// Phase banner in the pipeline's logging style
fn phase_banner(verbosity: Verbosity, phase: usize, name: &str) {
    if verbosity == Verbosity::Quiet {
        return;
    }
    println!("{}", format!(">>> Phase {phase}/4: {name}").cyan().bold());
}

/// Status line suppressed in quiet mode
fn status(verbosity: Verbosity, message: &str) {
    if verbosity == Verbosity::Quiet {
        return;
    }
    println!("{message}");
}
