use std::collections::HashSet;
use tracing::{info, warn};

use crate::services::summarizer::{summary_name, Summarizer};
use crate::storage::{Collection, DocumentStore, StorageResult};

/// Create the missing `<stem>_summary.md` for every entry.
///
/// Considers at most `limit` entries and existing summaries. Entries whose
/// read or summarization fails are skipped and logged. Returns how many
/// summaries were written.
pub async fn force_summarize(
    store: &DocumentStore,
    summarizer: &dyn Summarizer,
    limit: usize,
) -> StorageResult<usize> {
    let entries = store.list(Collection::Entries, limit).await?;
    let existing: HashSet<String> = store
        .list(Collection::Summaries, limit)
        .await?
        .into_iter()
        .collect();

    let mut created = 0;
    for entry in entries {
        let target = summary_name(&entry);
        if existing.contains(&target) {
            continue;
        }

        let text = match store.read_text(Collection::Entries, &entry).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping '{}' during force-summarize: {}", entry, e);
                continue;
            }
        };

        let summary = match summarizer.summarize(&text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Skipping '{}' during force-summarize: {:#}", entry, e);
                continue;
            }
        };

        match store.write(Collection::Summaries, &target, summary.as_bytes()).await {
            Ok(_) => created += 1,
            Err(e) => warn!("Could not store summary '{}': {}", target, e),
        }
    }

    info!("Force-summarize created {} summaries", created);
    Ok(created)
}
