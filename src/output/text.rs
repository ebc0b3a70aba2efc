//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::ats::{
    DomainException, GlobalPolicy, ALLOWS_ARBITRARY_LOADS, ALLOWS_ARBITRARY_LOADS_FOR_MEDIA,
    ALLOWS_ARBITRARY_LOADS_IN_WEB_CONTENT, EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS,
    INCLUDES_SUBDOMAINS, REQUIRES_CERTIFICATE_TRANSPARENCY,
    TEMPORARY_EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS,
};
use crate::check::BundleReport;
use crate::error::Result;
use console::{style, StyledObject};
use std::io::Write;
use std::path::Path;

pub const EFFECTIVE_HTTP_LABEL: &str = "Effective HTTP permitted";

// Both values may come from either the NSException* or the legacy NSTemporaryException* key.
pub const MINIMUM_TLS_VERSION_LABEL: &str = "MinimumTLSVersion (Exception/Temporary)";
pub const FORWARD_SECRECY_LABEL: &str = "RequiresForwardSecrecy (Exception/Temporary)";

/// TLS versions below 1.2 are flagged as weak.
const WEAK_TLS_VERSIONS: [&str; 2] = ["TLSv1.0", "TLSv1.1"];

pub struct TextFormatter {
    use_colors: bool,
    domain: Option<String>,
}

impl TextFormatter {
    pub fn new(use_colors: bool, domain: Option<String>) -> Self {
        Self { use_colors, domain }
    }

    fn paint<D>(&self, styled: StyledObject<D>) -> StyledObject<D> {
        styled.force_styling(self.use_colors)
    }

    fn heading(&self, text: &str) -> String {
        self.paint(style(text).cyan().bold()).to_string()
    }

    fn key(&self, text: &str) -> String {
        self.paint(style(text).blue()).to_string()
    }

    /// A flag that relaxes ATS: `true` is the finding.
    fn permissive(&self, value: bool) -> String {
        if value {
            self.paint(style("true").red().bold()).to_string()
        } else {
            self.paint(style("false").green()).to_string()
        }
    }

    /// A flag that tightens ATS.
    fn requirement(&self, value: bool) -> String {
        if value {
            self.paint(style("true").green()).to_string()
        } else {
            self.paint(style("false").dim()).to_string()
        }
    }

    fn tls_version(&self, version: Option<&str>) -> String {
        match version {
            Some(v) if WEAK_TLS_VERSIONS.contains(&v) => {
                self.paint(style(v).yellow().bold()).to_string()
            }
            Some(v) => self.paint(style(v).green()).to_string(),
            None => self.paint(style("none").dim()).to_string(),
        }
    }

    fn field(&self, out: &mut dyn Write, name: &str, value: String) -> Result<()> {
        writeln!(out, "  - {}: {}", self.key(name), value)?;
        Ok(())
    }

    fn write_global(&self, out: &mut dyn Write, global: &GlobalPolicy) -> Result<()> {
        writeln!(out, "{}", self.heading("=== Global ATS policy ==="))?;
        self.field(out, ALLOWS_ARBITRARY_LOADS, self.permissive(global.allows_arbitrary_loads))?;
        self.field(
            out,
            ALLOWS_ARBITRARY_LOADS_IN_WEB_CONTENT,
            self.permissive(global.allows_arbitrary_loads_in_web_content),
        )?;
        self.field(
            out,
            ALLOWS_ARBITRARY_LOADS_FOR_MEDIA,
            self.permissive(global.allows_arbitrary_loads_for_media),
        )?;
        writeln!(out)?;
        Ok(())
    }

    fn write_exception(&self, out: &mut dyn Write, domain: &str, e: &DomainException) -> Result<()> {
        writeln!(out, "[{}]", self.paint(style(domain).yellow().bold()))?;
        self.field(
            out,
            EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS,
            self.permissive(e.allows_insecure_http_loads),
        )?;
        self.field(
            out,
            TEMPORARY_EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS,
            self.permissive(e.allows_insecure_http_loads_for_temporary),
        )?;
        self.field(out, INCLUDES_SUBDOMAINS, self.permissive(e.includes_subdomains))?;
        self.field(
            out,
            REQUIRES_CERTIFICATE_TRANSPARENCY,
            self.requirement(e.requires_certificate_transparency),
        )?;
        self.field(
            out,
            MINIMUM_TLS_VERSION_LABEL,
            self.tls_version(e.minimum_tls_version.as_deref()),
        )?;
        self.field(
            out,
            FORWARD_SECRECY_LABEL,
            self.requirement(e.requires_forward_secrecy),
        )?;
        writeln!(out)?;
        Ok(())
    }

    fn write_bundle(&self, out: &mut dyn Write, bundle: &BundleReport) -> Result<()> {
        let origin = match &bundle.bundle_id {
            Some(id) => format!("{}, {}", id, bundle.format),
            None => bundle.format.to_string(),
        };
        writeln!(
            out,
            "{}",
            self.heading(&format!("Info.plist: {} ({})", bundle.info_plist, origin))
        )?;

        let report = &bundle.report;
        self.write_global(out, &report.global)?;

        writeln!(out, "{}", self.heading("=== Domain exceptions ==="))?;
        if report.exceptions.is_empty() {
            match &self.domain {
                Some(domain) => writeln!(out, "  (no exception for {})", domain)?,
                None => writeln!(out, "  (no NSExceptionDomains)")?,
            }
            writeln!(out)?;
        }
        for (domain, exception) in &report.exceptions {
            self.write_exception(out, domain, exception)?;
        }

        let effective = report.effective_http_permitted;
        let value = if effective {
            self.paint(style("true").red().bold())
        } else {
            self.paint(style("false").green().bold())
        };
        writeln!(out, "{}: {}", self.paint(style(EFFECTIVE_HTTP_LABEL).bold()), value)?;
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_report(&self, ipa: &Path, bundle: &BundleReport, out: &mut dyn Write) -> Result<()> {
        self.format_bundles(ipa, std::slice::from_ref(bundle), out)
    }

    fn format_bundles(
        &self,
        ipa: &Path,
        bundles: &[BundleReport],
        out: &mut dyn Write,
    ) -> Result<()> {
        writeln!(out, "{}", self.heading(&format!("IPA: {}", ipa.display())))?;
        for (i, bundle) in bundles.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            self.write_bundle(out, bundle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ats::Report;
    use crate::plist_ext::PlistFormat;

    fn example_bundle() -> BundleReport {
        BundleReport {
            info_plist: "Payload/Demo.app/Info.plist".to_string(),
            bundle_id: Some("com.example.demo".to_string()),
            format: PlistFormat::Xml,
            report: Report::new(
                GlobalPolicy::default(),
                vec![(
                    "example.com".to_string(),
                    DomainException {
                        allows_insecure_http_loads: true,
                        includes_subdomains: true,
                        ..Default::default()
                    },
                )],
            ),
        }
    }

    fn render(formatter: &TextFormatter, bundle: &BundleReport) -> String {
        let mut buf = Vec::new();
        formatter
            .format_report(Path::new("Demo.ipa"), bundle, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_text_layout() {
        let text = render(&TextFormatter::new(false, None), &example_bundle());

        let expected = "\
IPA: Demo.ipa
Info.plist: Payload/Demo.app/Info.plist (com.example.demo, XML)
=== Global ATS policy ===
  - NSAllowsArbitraryLoads: false
  - NSAllowsArbitraryLoadsInWebContent: false
  - NSAllowsArbitraryLoadsForMedia: false

=== Domain exceptions ===
[example.com]
  - NSExceptionAllowsInsecureHTTPLoads: true
  - NSTemporaryExceptionAllowsInsecureHTTPLoads: false
  - NSIncludesSubdomains: true
  - NSRequiresCertificateTransparency: false
  - MinimumTLSVersion (Exception/Temporary): none
  - RequiresForwardSecrecy (Exception/Temporary): false

Effective HTTP permitted: true
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_colors_only_when_enabled() {
        let plain = render(&TextFormatter::new(false, None), &example_bundle());
        assert!(!plain.contains('\x1b'));

        let colored = render(&TextFormatter::new(true, None), &example_bundle());
        assert!(colored.contains("\x1b["));
        assert_eq!(console::strip_ansi_codes(&colored), plain);
    }

    #[test]
    fn test_empty_exceptions_message() {
        let mut bundle = example_bundle();
        bundle.report.exceptions.clear();

        let text = render(&TextFormatter::new(false, None), &bundle);
        assert!(text.contains("(no NSExceptionDomains)"));

        let text = render(
            &TextFormatter::new(false, Some("cdn.example.com".to_string())),
            &bundle,
        );
        assert!(text.contains("(no exception for cdn.example.com)"));
    }

    #[test]
    fn test_legacy_tls_keys_get_neutral_labels() {
        let mut bundle = example_bundle();
        bundle.report = Report::new(
            GlobalPolicy::default(),
            vec![(
                "legacy.example.com".to_string(),
                DomainException {
                    minimum_tls_version: Some("TLSv1.0".to_string()),
                    requires_forward_secrecy: true,
                    ..Default::default()
                },
            )],
        );

        let text = render(&TextFormatter::new(false, None), &bundle);
        assert!(text.contains("  - MinimumTLSVersion (Exception/Temporary): TLSv1.0\n"));
        assert!(text.contains("  - RequiresForwardSecrecy (Exception/Temporary): true\n"));
        assert!(!text.contains("NSExceptionMinimumTLSVersion"));
        assert!(!text.contains("NSExceptionRequiresForwardSecrecy"));
    }
}
