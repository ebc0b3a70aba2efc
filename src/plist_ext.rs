use crate::error::{AtsError, Result};
use plist::{Dictionary, Value};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use tracing::debug;

const BINARY_MAGIC: &[u8] = b"bplist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlistFormat {
    Binary,
    Xml,
}

impl PlistFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(BINARY_MAGIC) {
            PlistFormat::Binary
        } else {
            PlistFormat::Xml
        }
    }
}

impl fmt::Display for PlistFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlistFormat::Binary => f.write_str("binary"),
            PlistFormat::Xml => f.write_str("XML"),
        }
    }
}

/// A decoded Info.plist together with the archive entry it came from.
#[derive(Debug, Clone)]
pub struct InfoPlist {
    pub entry: String,
    pub format: PlistFormat,
    pub data: Dictionary,
}

impl InfoPlist {
    pub fn from_bytes<S: Into<String>>(entry: S, bytes: &[u8]) -> Result<Self> {
        let entry = entry.into();
        let format = PlistFormat::detect(bytes);
        debug!(entry = %entry, %format, len = bytes.len(), "decoding plist");

        let data = Value::from_reader(Cursor::new(bytes))?
            .into_dictionary()
            .ok_or_else(|| {
                AtsError::InvalidPlist(format!("{}: top-level object is not a dictionary", entry))
            })?;

        Ok(Self {
            entry,
            format,
            data,
        })
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_string())
    }
}
