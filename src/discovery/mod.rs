//! Input file discovery

pub mod scanner;

pub use scanner::{discover, is_generated_dir, scan, supported_extensions};
