use crate::ats::{self, Report};
use crate::config::CheckOptions;
use crate::error::Result;
use crate::ipa::IpaArchive;
use crate::output;
use crate::plist_ext::{InfoPlist, PlistFormat};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// ATS findings for one bundle inside the archive.
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub info_plist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    pub format: PlistFormat,
    #[serde(flatten)]
    pub report: Report,
}

impl BundleReport {
    pub fn from_plist(plist: &InfoPlist, domain: Option<&str>) -> Self {
        let mut report = ats::evaluate(&plist.data);
        if let Some(domain) = domain {
            report.retain_domain(domain);
        }

        Self {
            info_plist: plist.entry.clone(),
            bundle_id: plist.get_string("CFBundleIdentifier").map(str::to_string),
            format: plist.format,
            report,
        }
    }
}

/// Reads and evaluates the Info.plist(s) of an .ipa.
///
/// The main app always comes first. Embedded bundles whose plist cannot be
/// read or decoded are skipped; a broken main plist fails the whole check.
pub fn check_ipa<P: AsRef<Path>>(ipa_path: P, options: &CheckOptions) -> Result<Vec<BundleReport>> {
    let mut ipa = IpaArchive::open(ipa_path)?;
    let entries = ipa.info_plists(options.all_bundles)?;

    let mut reports = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let decoded = ipa
            .read_entry(&entry)
            .and_then(|bytes| InfoPlist::from_bytes(entry.as_str(), &bytes));
        match decoded {
            Ok(plist) => {
                debug!(
                    entry = %entry,
                    bundle_id = plist.get_string("CFBundleIdentifier").unwrap_or("-"),
                    "evaluating bundle"
                );
                reports.push(BundleReport::from_plist(&plist, options.domain.as_deref()));
            }
            Err(e) if index > 0 => {
                warn!(entry = %entry, error = %e, "skipping bundle with unreadable Info.plist");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(reports)
}

/// Runs the full pipeline and renders the result to `out`.
pub fn check<P: AsRef<Path>, W: Write>(
    ipa_path: P,
    options: &CheckOptions,
    out: &mut W,
) -> Result<Vec<BundleReport>> {
    let ipa_path = ipa_path.as_ref();
    let bundles = check_ipa(ipa_path, options)?;

    let formatter = output::create_formatter(options);
    if options.all_bundles {
        formatter.format_bundles(ipa_path, &bundles, out)?;
    } else if let Some(main) = bundles.first() {
        formatter.format_report(ipa_path, main, out)?;
    }

    Ok(bundles)
}

/// True when any of the reports lets the app load plain HTTP.
pub fn http_permitted(bundles: &[BundleReport]) -> bool {
    bundles.iter().any(|b| b.report.effective_http_permitted)
}
