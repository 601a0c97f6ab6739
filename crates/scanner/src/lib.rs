pub mod scan;
pub mod sources;
pub mod tokenizer;

pub use scan::{scan, scan_files, ScanReport};
pub use sources::{expand_sources, ContentMatcher};
pub use tokenizer::extract_tokens;
