//! Command-line interface for pycodeadvisor.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::analyze::{Analyzer, Finding};
use crate::chat::{self, ChatCompletionRequest};
use crate::config::{self, Settings};
use crate::report::{self, FileReport};
use crate::server;
use crate::validate::{validate_code, validate_code_size};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Path argument meaning standard input.
const STDIN_PATH: &str = "-";

/// Directory names never descended into during scans.
const SKIPPED_DIRS: &[&str] = &["venv", ".venv", "__pycache__", "node_modules"];

/// Static analysis advisor for Python code.
///
/// Reports missing docstrings, functions with too many parameters, modules
/// with too many functions and lines that break snake_case naming.
#[derive(Parser)]
#[command(name = "pycodeadvisor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to settings YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a Python file, a directory, or stdin
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Answer a chat-completion request read from a file or stdin
    Chat(ChatArgs),
    /// Check that Python code parses
    Validate(ValidateArgs),
    /// List the advertised model
    Models,
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Write a commented settings file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// File or directory to analyze, or '-' for stdin
    pub path: PathBuf,

    /// Output format: pretty, json, or chat
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Parser)]
pub struct ChatArgs {
    /// Request JSON file, or '-' for stdin
    pub request: PathBuf,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// File to validate, or '-' for stdin
    pub path: PathBuf,
}

#[derive(Parser)]
pub struct ServeArgs {
    /// Address to bind (overrides bind_address)
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pycodeadvisor.yaml")]
    pub output: PathBuf,
}

/// Install the stderr tracing subscriber.
///
/// `PYCODEADVISOR_LOG` wins over `-v`, which wins over `log_level`.
pub fn init_tracing(settings: &Settings, verbose: u8) {
    let filter = match std::env::var(config::LOG_ENV_VAR) {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => match verbose {
            0 => EnvFilter::try_new(&settings.log_level),
            1 => EnvFilter::try_new("debug"),
            _ => EnvFilter::try_new("trace"),
        },
    }
    .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_PATH
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if is_stdin(path) {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))
    }
}

/// Collect Python files under `root`.
pub fn collect_files(root: &Path, settings: &Settings) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if settings.is_path_excluded(relative) {
            debug!("Skipping excluded file {}", path.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Analyze files in parallel. Unreadable files become error findings.
fn analyze_files(files: &[PathBuf], analyzer: &Analyzer) -> Vec<FileReport> {
    let mut reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let findings = match std::fs::read(path) {
                Ok(bytes) => analyzer.analyze_bytes(&bytes),
                Err(e) => vec![Finding::error(format!(
                    "Analysis error: cannot read file: {}",
                    e
                ))],
            };
            FileReport::new(path.to_string_lossy(), findings)
        })
        .collect();

    reports.sort_by(|a, b| a.file.cmp(&b.file));
    reports
}

/// Run the analyze command.
///
/// `source` is the settings file `settings` came from, shown in pretty output.
pub fn run_analyze(
    args: &AnalyzeArgs,
    settings: &Settings,
    source: Option<&Path>,
) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" && args.format != "chat" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'chat'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let analyzer = settings.analyzer();

    let reports = if is_stdin(&args.path) {
        let code = read_input(&args.path)?;
        if let Err(message) = validate_code_size(&code, settings.max_code_size) {
            eprintln!("Error: {}", message);
            return Ok(EXIT_ERROR);
        }
        vec![FileReport::new("<stdin>", analyzer.analyze(&code))]
    } else {
        let metadata = match std::fs::metadata(&args.path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Error: cannot access path {:?}: {}", args.path, e);
                return Ok(EXIT_ERROR);
            }
        };

        let files = if metadata.is_dir() {
            collect_files(&args.path, settings)?
        } else {
            vec![args.path.clone()]
        };

        if files.is_empty() {
            eprintln!("Warning: no Python files to analyze");
            return Ok(EXIT_SUCCESS);
        }

        info!("Analyzing {} file(s)", files.len());
        analyze_files(&files, &analyzer)
    };

    let path_str = args.path.to_string_lossy().to_string();
    let source_str = source.map(|p| p.to_string_lossy().to_string());

    match args.format.as_str() {
        "json" => report::write_json(&path_str, &reports)?,
        "chat" => {
            for file_report in &reports {
                if reports.len() > 1 {
                    println!("== {}", file_report.file);
                }
                print!("{}", report::render_narrative(&file_report.findings));
            }
        }
        _ => report::write_pretty(&path_str, source_str.as_deref(), &reports),
    }

    if report::total_findings(&reports) == 0 {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FINDINGS)
    }
}

/// Run the chat command.
pub fn run_chat(args: &ChatArgs, settings: &Settings) -> anyhow::Result<i32> {
    let text = read_input(&args.request)?;
    let request: ChatCompletionRequest = match serde_json::from_str(&text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: invalid chat request: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Some(code) = request.code() {
        if let Err(message) = validate_code_size(code, settings.max_code_size) {
            eprintln!("Error: {}", message);
            return Ok(EXIT_ERROR);
        }
    }

    match chat::complete(&request, &settings.analyzer(), &settings.model_id) {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}

/// Run the validate command.
pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<i32> {
    let code = read_input(&args.path)?;
    match validate_code(&code) {
        Ok(()) => {
            println!("OK");
            Ok(EXIT_SUCCESS)
        }
        Err(message) => {
            println!("{}", message);
            Ok(EXIT_FINDINGS)
        }
    }
}

/// Run the models command.
pub fn run_models(settings: &Settings) -> anyhow::Result<i32> {
    println!(
        "{}",
        serde_json::to_string_pretty(&chat::model_list(&settings.model_id))?
    );
    Ok(EXIT_SUCCESS)
}

/// Run the serve command.
pub fn run_serve(args: &ServeArgs, settings: &Settings) -> anyhow::Result<i32> {
    let mut settings = settings.clone();
    if let Some(bind) = &args.bind {
        settings.bind_address = bind.clone();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(settings))?;
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, config::TEMPLATE) {
        eprintln!("Error: failed to write settings: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to adjust thresholds", args.output.display());
    println!(
        "  2. Run: pycodeadvisor analyze . --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}
