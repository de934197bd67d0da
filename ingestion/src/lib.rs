pub mod format;
pub mod processor;
pub mod source;

pub use format::{format_rating, parse_line, FormatError};
pub use processor::{IngestionError, IngestionPipeline};
