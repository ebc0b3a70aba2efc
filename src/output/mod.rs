//! Report rendering.

mod formatter;
mod json;
mod text;

pub use formatter::OutputFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::config::CheckOptions;

/// Creates an output formatter based on CLI flags
pub fn create_formatter(options: &CheckOptions) -> Box<dyn OutputFormatter> {
    if options.json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TextFormatter::new(
            options.use_colors(),
            options.domain.clone(),
        ))
    }
}
