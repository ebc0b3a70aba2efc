use crate::check::BundleReport;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the main app's report
    fn format_report(&self, ipa: &Path, bundle: &BundleReport, out: &mut dyn Write) -> Result<()>;

    /// Format the reports of every bundle in the archive
    fn format_bundles(&self, ipa: &Path, bundles: &[BundleReport], out: &mut dyn Write)
        -> Result<()>;
}
