//! JSON output formatter for machine-readable results.

use super::formatter::OutputFormatter;
use crate::check::BundleReport;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T, out: &mut dyn Write) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(out, "{}", json)?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, _ipa: &Path, bundle: &BundleReport, out: &mut dyn Write) -> Result<()> {
        Self::output(&bundle.report, out)
    }

    fn format_bundles(
        &self,
        _ipa: &Path,
        bundles: &[BundleReport],
        out: &mut dyn Write,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct BundlesOutput<'a> {
            bundles: &'a [BundleReport],
        }

        Self::output(&BundlesOutput { bundles }, out)
    }
}
