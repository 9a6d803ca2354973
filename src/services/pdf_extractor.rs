//! Text extraction from uploaded PDF files

use anyhow::{anyhow, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Whether an upload should be treated as a PDF
pub fn is_pdf(filename: &str, data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
        || Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}

/// Extract text from PDF bytes, reading at most `max_pages` pages.
///
/// Never fails: an empty string means nothing could be extracted.
pub async fn extract_text(data: &[u8], max_pages: Option<usize>) -> String {
    match extract_with_pdftotext(data, max_pages).await {
        Ok(text) if !text.is_empty() => return text,
        Ok(_) => debug!("pdftotext produced no text, scanning raw bytes"),
        Err(e) => warn!("pdftotext extraction failed, scanning raw bytes: {}", e),
    }

    extract_printable_runs(data)
}

/// Pages are separated by form feeds; each page is trimmed and empty pages dropped
fn join_pages(raw: &str, max_pages: Option<usize>) -> String {
    raw.split('\x0c')
        .take(max_pages.unwrap_or(usize::MAX))
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn extract_with_pdftotext(data: &[u8], max_pages: Option<usize>) -> Result<String> {
    // Removed when `temp_file` goes out of scope, whatever happens below
    let temp_file = tempfile::Builder::new()
        .prefix("backbrain_upload_")
        .suffix(".pdf")
        .tempfile()?;
    tokio::fs::write(temp_file.path(), data).await?;

    let mut command = Command::new("pdftotext");
    if let Some(pages) = max_pages {
        command.arg("-l").arg(pages.to_string());
    }
    let output = command
        .arg("-enc")
        .arg("UTF-8")
        .arg(temp_file.path())
        .arg("-")
        .output()
        .await
        .map_err(|e| anyhow!("pdftotext is not available: {}", e))?;

    if !output.status.success() {
        return Err(anyhow!(
            "pdftotext exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(join_pages(&String::from_utf8_lossy(&output.stdout), max_pages))
}

/// Last resort: keep runs of printable ASCII longer than three characters
fn extract_printable_runs(data: &[u8]) -> String {
    let mut words = Vec::new();
    let mut current = String::new();

    for &byte in data {
        if (32..=126).contains(&byte) {
            current.push(byte as char);
        } else {
            if current.len() > 3 {
                words.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() > 3 {
        words.push(current);
    }

    words
        .iter()
        .flat_map(|run| run.split_whitespace())
        .filter(|word| word.len() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}
