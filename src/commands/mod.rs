pub mod force_summarize;
pub mod migrate;
