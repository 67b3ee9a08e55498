//! Command-line interface for the segmenter.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;

use crate::config::{builtin_profile, profile_description, SegmenterConfig, BUILTIN_PROFILES};
use crate::error::{Result, SegmenterError};
use crate::output::{to_json, to_ndjson};
use crate::processor::{DocumentProcessor, ProcessedDocument};
use crate::types::{blocks_from_text, Block, DocumentContext, Segment};

const PREVIEW_CHARS: usize = 160;
const PREVIEW_WIDTH: usize = 72;

/// Biblio segmenter - Turn extracted text blocks into sections, paragraphs and poems.
#[derive(Parser)]
#[command(name = "biblio-segmenter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Rendering of the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Ndjson,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Segment a document and write the segments as JSON.
    Segment {
        /// JSON array of blocks, or plain text with one block per line
        input: PathBuf,

        /// Built-in profile (prose, book, verse)
        #[arg(short, long)]
        profile: Option<String>,

        /// YAML configuration file
        #[arg(short, long, conflicts_with = "profile")]
        config: Option<PathBuf>,

        /// Document title used for author attribution
        #[arg(long)]
        title: Option<String>,

        /// Document filename used for author attribution (default: input name)
        #[arg(long)]
        filename: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect the author of a document.
    Author {
        /// JSON array of blocks, or plain text with one block per line
        input: PathBuf,

        /// Built-in profile (prose, book, verse)
        #[arg(short, long)]
        profile: Option<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Document filename (default: input name)
        #[arg(long)]
        filename: Option<String>,
    },

    /// List the built-in profiles.
    Profiles,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            input,
            profile,
            config,
            title,
            filename,
            format,
            output,
        } => {
            let config = load_config(profile.as_deref(), config.as_deref())?;
            segment_command(&input, config, title, filename, format, output.as_deref())
        }
        Commands::Author {
            input,
            profile,
            title,
            filename,
        } => {
            let config = load_config(profile.as_deref(), None)?;
            author_command(&input, config, title, filename)
        }
        Commands::Profiles => {
            profiles_command();
            Ok(())
        }
    }
}

fn load_config(profile: Option<&str>, config: Option<&Path>) -> Result<SegmenterConfig> {
    match config {
        Some(path) => SegmenterConfig::from_file(path),
        None => builtin_profile(profile.unwrap_or("prose")),
    }
}

/// Read blocks from a `.json` block array or from plain text.
pub fn load_blocks(path: &Path) -> Result<Vec<Block>> {
    if !path.is_file() {
        return Err(SegmenterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", path.display()),
        )));
    }
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(blocks_from_text(&content))
    }
}

fn document_context(input: &Path, title: Option<String>, filename: Option<String>) -> DocumentContext {
    let filename = filename.or_else(|| {
        input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    });
    DocumentContext::new(title, filename)
}

fn process_file(
    input: &Path,
    config: SegmenterConfig,
    title: Option<String>,
    filename: Option<String>,
) -> Result<ProcessedDocument> {
    let blocks = load_blocks(input)?;
    let context = document_context(input, title, filename);
    Ok(DocumentProcessor::new(config)?.process(&blocks, &context))
}

/// Execute the segment command.
fn segment_command(
    input: &Path,
    config: SegmenterConfig,
    title: Option<String>,
    filename: Option<String>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let profile = config.profile;
    let doc = process_file(input, config, title, filename)?;

    let rendered = match format {
        OutputFormat::Json => to_json(&doc.segments)?,
        OutputFormat::Ndjson => to_ndjson(&doc.segments)?,
    };

    match output {
        Some(path) => fs::write(path, &rendered)?,
        None => println!("{}", rendered.trim_end()),
    }

    eprintln!(
        "{} {} with profile {}",
        style("Segmented").bold(),
        style(input.display()).cyan(),
        style(profile).green()
    );
    eprintln!("  Segments: {}", doc.segments.len());
    if doc.report.poems_detected > 0 {
        eprintln!("  Poems: {}", doc.report.poems_detected);
    }
    if doc.report.sections_created > 0 {
        eprintln!("  Sections: {}", doc.report.sections_created);
    }
    if let Some(author) = &doc.author {
        eprintln!(
            "  Author: {} ({:.2})",
            style(&author.name).green(),
            author.confidence
        );
    }
    if doc.report.fallback_used {
        eprintln!("  {}", style("Fallback segmentation used").yellow().bold());
    }
    if let Some(first) = doc.segments.first() {
        eprintln!("  First segment:");
        eprintln!("{}", preview(first));
    }
    if let Some(path) = output {
        eprintln!();
        eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    }

    Ok(())
}

/// Execute the author command.
fn author_command(
    input: &Path,
    config: SegmenterConfig,
    title: Option<String>,
    filename: Option<String>,
) -> Result<()> {
    let doc = process_file(input, config, title, filename)?;
    match doc.author {
        Some(author) => {
            println!("{} {}", style("Author:").bold(), style(&author.name).green());
            println!("  Confidence: {:.2}", author.confidence);
            println!("  Method: {}", author.method);
            println!("  Sources: {}", author.details.sources.join(", "));
        }
        None => println!("{}", style("No author detected").yellow()),
    }
    Ok(())
}

fn profiles_command() {
    for name in BUILTIN_PROFILES {
        println!("{}", style(name).cyan().bold());
        let description = textwrap::Options::new(PREVIEW_WIDTH)
            .initial_indent("  ")
            .subsequent_indent("  ");
        println!("{}", textwrap::fill(profile_description(name), description));
    }
}

fn preview(segment: &Segment) -> String {
    let text: String = segment.text().chars().take(PREVIEW_CHARS).collect();
    let text = if segment.text().chars().count() > PREVIEW_CHARS {
        format!("{}…", text.trim_end())
    } else {
        text
    };
    let options = textwrap::Options::new(PREVIEW_WIDTH)
        .initial_indent("    ")
        .subsequent_indent("    ");
    textwrap::fill(&text, options)
}
