pub mod pdf_extractor;
pub mod summarizer;
pub mod webdav;
