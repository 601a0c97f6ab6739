pub mod parser;
pub mod types;

// Re-export main types
pub use parser::{parse_candidate, split_variants, ParseError};
pub use types::{ArbitraryValue, Candidate, Utility, Variant};
