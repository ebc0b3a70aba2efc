//! App Transport Security evaluation.
//!
//! Walks the `NSAppTransportSecurity` dictionary of an Info.plist and builds a
//! [`Report`]. Only real plist booleans are honored; a key that is missing or
//! holds any other type counts as `false`, and a non-string TLS version counts
//! as absent.

use plist::{Dictionary, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const ATS_KEY: &str = "NSAppTransportSecurity";
pub const EXCEPTION_DOMAINS_KEY: &str = "NSExceptionDomains";

pub const ALLOWS_ARBITRARY_LOADS: &str = "NSAllowsArbitraryLoads";
pub const ALLOWS_ARBITRARY_LOADS_IN_WEB_CONTENT: &str = "NSAllowsArbitraryLoadsInWebContent";
pub const ALLOWS_ARBITRARY_LOADS_FOR_MEDIA: &str = "NSAllowsArbitraryLoadsForMedia";

pub const EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS: &str = "NSExceptionAllowsInsecureHTTPLoads";
pub const TEMPORARY_EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS: &str =
    "NSTemporaryExceptionAllowsInsecureHTTPLoads";
pub const INCLUDES_SUBDOMAINS: &str = "NSIncludesSubdomains";
pub const REQUIRES_CERTIFICATE_TRANSPARENCY: &str = "NSRequiresCertificateTransparency";
pub const EXCEPTION_MINIMUM_TLS_VERSION: &str = "NSExceptionMinimumTLSVersion";
pub const TEMPORARY_EXCEPTION_MINIMUM_TLS_VERSION: &str = "NSTemporaryExceptionMinimumTLSVersion";
pub const EXCEPTION_REQUIRES_FORWARD_SECRECY: &str = "NSExceptionRequiresForwardSecrecy";
pub const TEMPORARY_EXCEPTION_REQUIRES_FORWARD_SECRECY: &str =
    "NSTemporaryExceptionRequiresForwardSecrecy";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPolicy {
    pub allows_arbitrary_loads: bool,
    pub allows_arbitrary_loads_in_web_content: bool,
    pub allows_arbitrary_loads_for_media: bool,
}

impl GlobalPolicy {
    pub fn permits_http(&self) -> bool {
        self.allows_arbitrary_loads
            || self.allows_arbitrary_loads_in_web_content
            || self.allows_arbitrary_loads_for_media
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainException {
    pub allows_insecure_http_loads: bool,
    pub allows_insecure_http_loads_for_temporary: bool,
    pub includes_subdomains: bool,
    pub requires_certificate_transparency: bool,
    pub minimum_tls_version: Option<String>,
    pub requires_forward_secrecy: bool,
}

impl DomainException {
    pub fn permits_http(&self) -> bool {
        self.allows_insecure_http_loads || self.allows_insecure_http_loads_for_temporary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub global: GlobalPolicy,
    /// Sorted by domain.
    #[serde(with = "exception_map")]
    pub exceptions: Vec<(String, DomainException)>,
    pub effective_http_permitted: bool,
}

impl Report {
    pub fn new(global: GlobalPolicy, mut exceptions: Vec<(String, DomainException)>) -> Self {
        exceptions.sort_by(|a, b| a.0.cmp(&b.0));
        let effective_http_permitted =
            global.permits_http() || exceptions.iter().any(|(_, e)| e.permits_http());

        Self {
            global,
            exceptions,
            effective_http_permitted,
        }
    }

    pub fn exception(&self, domain: &str) -> Option<&DomainException> {
        self.exceptions
            .iter()
            .find(|(d, _)| d == domain)
            .map(|(_, e)| e)
    }

    /// Keeps only the exception for `domain` (ASCII case-insensitive).
    /// `effective_http_permitted` still describes the whole configuration.
    pub fn retain_domain(&mut self, domain: &str) {
        self.exceptions
            .retain(|(d, _)| d.eq_ignore_ascii_case(domain));
    }
}

/// Builds the ATS report for a decoded Info.plist root dictionary.
pub fn evaluate(root: &Dictionary) -> Report {
    let Some(ats) = read_dictionary(root, ATS_KEY, "Info.plist") else {
        debug!("no {} dictionary, using defaults", ATS_KEY);
        return Report::default();
    };

    let global = GlobalPolicy {
        allows_arbitrary_loads: read_bool(ats, ALLOWS_ARBITRARY_LOADS, ATS_KEY),
        allows_arbitrary_loads_in_web_content: read_bool(
            ats,
            ALLOWS_ARBITRARY_LOADS_IN_WEB_CONTENT,
            ATS_KEY,
        ),
        allows_arbitrary_loads_for_media: read_bool(ats, ALLOWS_ARBITRARY_LOADS_FOR_MEDIA, ATS_KEY),
    };

    let exceptions = read_dictionary(ats, EXCEPTION_DOMAINS_KEY, ATS_KEY)
        .map(|domains| {
            domains
                .iter()
                .map(|(domain, value)| (domain.clone(), evaluate_domain(domain, value)))
                .collect()
        })
        .unwrap_or_default();

    let report = Report::new(global, exceptions);
    debug!(
        domains = report.exceptions.len(),
        effective_http_permitted = report.effective_http_permitted,
        "evaluated ATS policy"
    );
    report
}

fn evaluate_domain(domain: &str, value: &Value) -> DomainException {
    let Some(cfg) = value.as_dictionary() else {
        warn!(
            domain,
            found = value_kind(value),
            "exception domain is not a dictionary, using defaults"
        );
        return DomainException::default();
    };

    let minimum_tls_version = read_string(cfg, EXCEPTION_MINIMUM_TLS_VERSION, domain)
        .or_else(|| read_string(cfg, TEMPORARY_EXCEPTION_MINIMUM_TLS_VERSION, domain));

    DomainException {
        allows_insecure_http_loads: read_bool(cfg, EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS, domain),
        allows_insecure_http_loads_for_temporary: read_bool(
            cfg,
            TEMPORARY_EXCEPTION_ALLOWS_INSECURE_HTTP_LOADS,
            domain,
        ),
        includes_subdomains: read_bool(cfg, INCLUDES_SUBDOMAINS, domain),
        requires_certificate_transparency: read_bool(cfg, REQUIRES_CERTIFICATE_TRANSPARENCY, domain),
        minimum_tls_version,
        requires_forward_secrecy: read_bool(cfg, EXCEPTION_REQUIRES_FORWARD_SECRECY, domain)
            || read_bool(cfg, TEMPORARY_EXCEPTION_REQUIRES_FORWARD_SECRECY, domain),
    }
}

fn read_bool(dict: &Dictionary, key: &str, scope: &str) -> bool {
    match dict.get(key) {
        None => false,
        Some(Value::Boolean(b)) => *b,
        Some(other) => {
            warn!(
                key,
                scope,
                found = value_kind(other),
                "expected a boolean, treating as false"
            );
            false
        }
    }
}

fn read_string(dict: &Dictionary, key: &str, scope: &str) -> Option<String> {
    match dict.get(key)? {
        Value::String(s) => Some(s.clone()),
        other => {
            warn!(
                key,
                scope,
                found = value_kind(other),
                "expected a string, treating as absent"
            );
            None
        }
    }
}

fn read_dictionary<'a>(dict: &'a Dictionary, key: &str, scope: &str) -> Option<&'a Dictionary> {
    let value = dict.get(key)?;
    if value.as_dictionary().is_none() {
        warn!(
            key,
            scope,
            found = value_kind(value),
            "expected a dictionary, treating as absent"
        );
    }
    value.as_dictionary()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Dictionary(_) => "dictionary",
        Value::Boolean(_) => "boolean",
        Value::Data(_) => "data",
        Value::Date(_) => "date",
        Value::Real(_) => "real",
        Value::Integer(_) => "integer",
        Value::String(_) => "string",
        Value::Uid(_) => "uid",
        _ => "unknown",
    }
}

mod exception_map {
    use super::DomainException;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        exceptions: &[(String, DomainException)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(exceptions.iter().map(|(domain, e)| (domain, e)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, DomainException)>, D::Error> {
        let map = BTreeMap::<String, DomainException>::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}
