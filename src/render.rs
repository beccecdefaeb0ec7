//! Turning session state into something to display.
//!
//! [`ResultView::from_model`] holds the display decisions for a query
//! answer. [`ResultsPanel`] picks what the results area shows overall
//! (loading, error, placeholder, or results). The `render_*` functions
//! produce the plain-text form the `nlq` binary prints.

use serde_json::Value;
use std::fmt::Write;

use crate::models::{
    CacheStatus, DocChunk, DocumentSection, HistoryEntry, ResultModel, Row, SqlSection,
};
use crate::status::{Operation, OperationStatus, StatusKind};

/// Shown for null or missing cells, and for a missing query type.
pub const PLACEHOLDER: &str = "N/A";
pub const NO_RECORDS: &str = "No matching records found in the database.";
pub const NO_DOCUMENTS: &str = "No relevant documents found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBadge {
    Hit,
    Miss,
}

impl CacheBadge {
    pub fn label(&self) -> &'static str {
        match self {
            CacheBadge::Hit => "CACHE HIT",
            CacheBadge::Miss => "CACHE MISS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub query_type: String,
    /// `None` when the backend did not say whether the cache was used.
    pub badge: Option<CacheBadge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Value(String),
    Placeholder,
}

impl Cell {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Placeholder,
            Some(Value::String(s)) => Cell::Value(s.clone()),
            Some(other) => Cell::Value(other.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Cell::Value(s) => s,
            Cell::Placeholder => PLACEHOLDER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlView {
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    NoRecords,
    Error(String),
}

impl SqlView {
    fn from_section(section: &SqlSection) -> Self {
        match section {
            SqlSection::Rows { rows, .. } => match rows.first() {
                None => SqlView::NoRecords,
                Some(first) => {
                    let columns: Vec<String> = first.keys().cloned().collect();
                    let rows = rows.iter().map(|row| table_row(&columns, row)).collect();
                    SqlView::Table { columns, rows }
                }
            },
            SqlSection::Failed { error } => SqlView::Error(error.clone()),
        }
    }
}

/// Cells in header order; later rows may lack some columns.
fn table_row(columns: &[String], row: &Row) -> Vec<Cell> {
    columns
        .iter()
        .map(|column| Cell::from_value(row.get(column)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCard {
    pub filename: String,
    /// Relevance score, four decimal places.
    pub score: String,
    /// Chunk text exactly as returned.
    pub chunk: String,
}

impl DocumentCard {
    fn from_chunk(chunk: &DocChunk) -> Self {
        Self {
            filename: chunk
                .filename
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            score: format!("{:.4}", chunk.distance),
            chunk: chunk.chunk.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentsView {
    Cards(Vec<DocumentCard>),
    NoDocuments { note: Option<String> },
}

impl DocumentsView {
    fn from_section(section: &DocumentSection) -> Self {
        if section.results.is_empty() {
            return DocumentsView::NoDocuments {
                note: section.note.clone(),
            };
        }
        DocumentsView::Cards(section.results.iter().map(DocumentCard::from_chunk).collect())
    }
}

/// Display model for one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub banner: Banner,
    pub generated_sql: Option<String>,
    pub sql: Option<SqlView>,
    pub documents: Option<DocumentsView>,
}

impl ResultView {
    pub fn from_model(model: &ResultModel) -> Self {
        let badge = match model.cache {
            CacheStatus::Unknown => None,
            CacheStatus::Hit => Some(CacheBadge::Hit),
            CacheStatus::Miss => Some(CacheBadge::Miss),
        };
        Self {
            banner: Banner {
                query_type: model
                    .query_type
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                badge,
            },
            generated_sql: model.generated_sql.clone(),
            sql: model.sections.sql().map(SqlView::from_section),
            documents: model.sections.documents().map(DocumentsView::from_section),
        }
    }
}

/// What the results area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsPanel {
    Loading,
    Error(String),
    /// Nothing asked yet.
    Placeholder,
    Results(ResultView),
}

impl ResultsPanel {
    pub fn new(status: &OperationStatus, result: Option<&ResultModel>) -> Self {
        if status.is_loading {
            return ResultsPanel::Loading;
        }
        if status.kind == Some(StatusKind::Error) {
            let message = status
                .message
                .clone()
                .unwrap_or_else(|| Operation::Query.fallback_message().to_string());
            return ResultsPanel::Error(message);
        }
        match result {
            Some(model) => ResultsPanel::Results(ResultView::from_model(model)),
            None => ResultsPanel::Placeholder,
        }
    }
}

// ============ Text output ============

/// One-line status for an operation, or `None` when there is nothing to say.
pub fn render_status_line(operation: Operation, status: &OperationStatus) -> Option<String> {
    let message = status.message.as_deref()?;
    let tag = match (status.is_loading, status.kind) {
        (true, _) => "...",
        (false, Some(StatusKind::Success)) => "ok",
        (false, Some(StatusKind::Error)) => "error",
        (false, None) => "-",
    };
    Some(format!("[{}] {:<5} {}", operation, tag, message))
}

pub fn render_panel_text(panel: &ResultsPanel) -> String {
    match panel {
        ResultsPanel::Loading => "Processing query...\n".to_string(),
        ResultsPanel::Error(message) => format!("Error: {}\n", message),
        ResultsPanel::Placeholder => "Your results will appear here.\n\
             Connect to a database, upload documents, and ask a question to begin.\n"
            .to_string(),
        ResultsPanel::Results(view) => render_result_text(view),
    }
}

pub fn render_result_text(view: &ResultView) -> String {
    let mut out = String::new();

    let _ = write!(out, "Query Type: {}", view.banner.query_type);
    if let Some(badge) = view.banner.badge {
        let _ = write!(out, "  [{}]", badge.label());
    }
    out.push('\n');

    if let Some(sql) = &view.sql {
        out.push_str("\n--- Database Results ---\n");
        if let Some(generated) = &view.generated_sql {
            let _ = writeln!(out, "sql: {}", generated);
        }
        match sql {
            SqlView::Table { columns, rows } => out.push_str(&render_table(columns, rows)),
            SqlView::NoRecords => {
                let _ = writeln!(out, "{}", NO_RECORDS);
            }
            SqlView::Error(error) => {
                let _ = writeln!(out, "Error: {}", error);
            }
        }
    }

    if let Some(documents) = &view.documents {
        out.push_str("\n--- Document Results ---\n");
        match documents {
            DocumentsView::Cards(cards) => {
                for card in cards {
                    let _ = writeln!(out, "[{}]  Score: {}", card.filename, card.score);
                    out.push_str(&card.chunk);
                    out.push_str("\n\n");
                }
            }
            DocumentsView::NoDocuments { note } => {
                let _ = writeln!(out, "{}", NO_DOCUMENTS);
                if let Some(note) = note {
                    let _ = writeln!(out, "({})", note);
                }
            }
        }
    }

    out
}

fn render_table(columns: &[String], rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.text().chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(&c.to_uppercase(), *w))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let _ = writeln!(out, "{}", "-".repeat(total));
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(cell.text(), *w))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

pub fn render_history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No queries yet.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {:<9} {:<6} QUERY", "TIME", "TYPE", "CACHED");
    let _ = writeln!(out, "{}", "-".repeat(72));
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<20} {:<9} {:<6} {}",
            format_ts(entry.time),
            entry.query_type.as_deref().unwrap_or("-"),
            if entry.cached { "yes" } else { "no" },
            entry.query
        );
    }
    out
}

fn format_ts(ts: f64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{:.0}", ts))
}
