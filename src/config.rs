use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always emit ANSI colors
    #[default]
    Always,
    /// Color only when stdout is a color-capable terminal
    Auto,
    /// Never emit ANSI colors
    Never,
}

impl ColorMode {
    pub fn enabled(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => console::colors_enabled(),
        }
    }
}

/// Everything that shapes a single check run.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub json: bool,
    pub color: ColorMode,
    /// Only list the exception for this domain.
    pub domain: Option<String>,
    /// Report embedded bundles (extensions, watch apps) as well as the main app.
    pub all_bundles: bool,
}

impl CheckOptions {
    pub fn use_colors(&self) -> bool {
        !self.json && self.color.enabled()
    }
}
