//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use folio_core::block::ListType;
use folio_core::{Block, BlockContent, Document, DocumentSummary, TableContent};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a full document with its blocks
    pub fn print_document(&self, doc: &Document) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", doc.id);
                println!("Title:    {}", doc.title);
                println!("Blocks:   {}", doc.blocks.len());
                println!("Words:    {}", doc.word_count());
                println!("Created:  {}", local_time(&doc.metadata.created_at));
                println!("Updated:  {}", local_time(&doc.metadata.updated_at));
                println!();
                for block in &doc.blocks {
                    print_block(block);
                }
            }
            OutputFormat::Json => print_json(doc),
            OutputFormat::Quiet => println!("{}", doc.id),
        }
    }

    /// Print a list of document summaries
    pub fn print_summaries(&self, summaries: &[DocumentSummary]) {
        match self.format {
            OutputFormat::Human => {
                if summaries.is_empty() {
                    println!("No documents found.");
                    return;
                }
                for summary in summaries {
                    println!(
                        "{} | {} | {} blocks | {}",
                        short_id(&summary.id),
                        truncate(&summary.title, 40),
                        summary.block_count,
                        local_time(&summary.updated_at)
                    );
                }
                println!("\n{} document(s)", summaries.len());
            }
            OutputFormat::Json => print_json(&summaries),
            OutputFormat::Quiet => {
                for summary in summaries {
                    println!("{}", summary.id);
                }
            }
        }
    }

    /// Print a single block
    pub fn print_block(&self, block: &Block) {
        match self.format {
            OutputFormat::Human => print_block(block),
            OutputFormat::Json => print_json(block),
            OutputFormat::Quiet => println!("{}", block.id),
        }
    }

    /// Print any serializable value as JSON, or a message otherwise
    pub fn print_value<T: Serialize>(&self, value: &T, human: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", human),
            OutputFormat::Json => print_json(value),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn print_block(block: &Block) {
    println!(
        "[{}] {} {}",
        block.position,
        block.block_type(),
        short_id(&block.id)
    );
    for line in block_lines(&block.content) {
        println!("    {}", line);
    }
}

/// Human-readable rendering of block content
pub fn block_lines(content: &BlockContent) -> Vec<String> {
    match content {
        BlockContent::Heading(h) => vec![format!("{} {}", "#".repeat(h.level as usize), h.text)],
        BlockContent::Paragraph(p) => p.text.lines().map(str::to_string).collect(),
        BlockContent::Quote(q) => {
            let mut lines: Vec<String> = q.text.lines().map(|l| format!("> {}", l)).collect();
            if let Some(ref author) = q.author {
                lines.push(format!("  - {}", author));
            }
            lines
        }
        BlockContent::Code(c) => {
            let mut lines = vec![format!("```{}", c.language.as_deref().unwrap_or(""))];
            lines.extend(c.code.lines().map(str::to_string));
            lines.push("```".to_string());
            lines
        }
        BlockContent::List(list) => list
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let indent = "  ".repeat(item.level as usize);
                let marker = match list.list_type {
                    ListType::Bulleted => "-".to_string(),
                    ListType::Numbered => format!("{}.", i + 1),
                    ListType::Checklist if item.checked == Some(true) => "[x]".to_string(),
                    ListType::Checklist => "[ ]".to_string(),
                };
                format!("{}{} {}", indent, marker, item.text)
            })
            .collect(),
        BlockContent::Image(img) => {
            let mut lines = vec![format!("image: {}", img.url)];
            if let Some(ref caption) = img.caption {
                lines.push(caption.clone());
            }
            lines
        }
        BlockContent::Table(table) => table_lines(table),
        BlockContent::Divider => vec!["----".to_string()],
        BlockContent::Toc => vec!["(table of contents)".to_string()],
    }
}

/// Render a table as pipe-separated rows, showing formula results
pub fn table_lines(table: &TableContent) -> Vec<String> {
    let header = table
        .columns
        .iter()
        .map(|col| format!("{} ({})", col.name, short_id(&col.id)))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut lines = vec![header];
    for (index, row) in table.rows.iter().enumerate() {
        let cells = table
            .columns
            .iter()
            .map(|col| {
                table
                    .display_value(index, &col.id)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(" | ");
        let collapsed = if row.collapsed == Some(true) { "+ " } else { "" };
        lines.push(format!(
            "{}{}{}",
            "  ".repeat(row.level as usize),
            collapsed,
            cells
        ));
    }
    lines
}

/// Format a timestamp in the local timezone
fn local_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// First 12 characters of an id, enough to pass back as a prefix
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a byte count for humans
pub fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
