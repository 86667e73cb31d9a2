use crate::error::ExtractError;
use crate::models::{DocumentFormat, RawDocument};
use lopdf::Document;
use std::fs;
use std::path::Path;

/// Extracts plain text from a document, dispatching on its declared format.
///
/// Table rows in markdown documents are flattened into single space-joined
/// lines so that row-local co-occurrence ("department major amount" on one
/// row) survives as adjacent text for the entity proximity heuristics. This
/// is the only place document layout is allowed to leak into the text.
pub fn extract_text(document: &RawDocument) -> Result<String, ExtractError> {
    let text = match document.format {
        DocumentFormat::Pdf => extract_pdf_text(&document.source_path)?,
        DocumentFormat::Markdown => {
            let raw = fs::read_to_string(&document.source_path)?;
            flatten_markdown(&raw)
        }
        DocumentFormat::PlainText => fs::read_to_string(&document.source_path)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyContent(
            document.source_path.display().to_string(),
        ));
    }

    Ok(text)
}

fn extract_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let document =
        Document::load(path).map_err(|error| ExtractError::ExtractionFailed(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| ExtractError::ExtractionFailed(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    if pages.is_empty() {
        return Err(ExtractError::ExtractionFailed(format!(
            "pdf had no readable page text: {}",
            path.display()
        )));
    }

    Ok(pages.join("\n"))
}

/// Converts markdown to linear text. Pipe-table rows become one space-joined
/// line per row, separator rows are dropped, and heading/emphasis markers
/// are stripped.
pub fn flatten_markdown(raw: &str) -> String {
    let mut lines = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_table_separator(trimmed) {
            continue;
        }

        if trimmed.contains('|') {
            let cells: Vec<&str> = trimmed
                .split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" "));
            }
            continue;
        }

        let stripped = trimmed
            .trim_start_matches('#')
            .trim_matches(|ch: char| ch == '*' || ch == '_' || ch == '`')
            .trim();
        if !stripped.is_empty() {
            lines.push(stripped.to_string());
        }
    }

    lines.join("\n")
}

fn is_table_separator(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|ch| matches!(ch, '|' | '-' | ':' | ' '))
}
