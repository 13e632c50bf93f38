//! Per-format document parsers
//!
//! Maps file extensions to the parser able to turn the file into plain
//! text. Unknown extensions fall back to the plain-text parser.

use anyhow::{Context, Result};
use pulldown_cmark::{Event, Parser, TagEnd};
use std::path::Path;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Plain text (also the fallback for unknown extensions)
    Text,
    Markdown,
    Json,
    Pdf,
}

impl DocumentFormat {
    /// Determine the format for a file path from its extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("json") => Self::Json,
            Some("pdf") => Self::Pdf,
            _ => Self::Text,
        }
    }

    /// Human-readable format name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }
}

/// Parse a file into plain text using the parser for its format
pub fn parse_file(path: &Path) -> Result<String> {
    let format = DocumentFormat::from_path(path);

    match format {
        DocumentFormat::Text => parse_text(path),
        DocumentFormat::Markdown => parse_markdown(path),
        DocumentFormat::Json => parse_json(path),
        DocumentFormat::Pdf => parse_pdf(path),
    }
}

/// Read a file as text, replacing invalid UTF-8 sequences
fn parse_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Strip Markdown markup down to its text content
fn parse_markdown(path: &Path) -> Result<String> {
    let raw = parse_text(path)?;
    let mut text = String::with_capacity(raw.len());

    for event in Parser::new(&raw) {
        match event {
            Event::Text(t) => text.push_str(&t),
            Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => text.push_str("\n\n"),
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// Validate and pretty-print JSON so nested values stay readable per line
fn parse_json(path: &Path) -> Result<String> {
    let raw = parse_text(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    serde_json::to_string_pretty(&value).context("Failed to render JSON")
}

/// Extract text content from a PDF
fn parse_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract PDF text from {}", path.display()))
}
