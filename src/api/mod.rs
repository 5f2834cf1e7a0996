pub mod format;

pub use format::{optional_text, parse_json_or_default, parse_lenient};
