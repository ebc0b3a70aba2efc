use crate::error::{AtsError, Result};
use glob::{MatchOptions, Pattern};
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Info.plist of the main app bundle.
const MAIN_INFO_PLIST: &str = "Payload/*.app/Info.plist";

/// Info.plists of bundles nested inside the main app (watch apps, extensions).
const EMBEDDED_INFO_PLISTS: [&str; 2] = [
    "Payload/*.app/**/*.app/Info.plist",
    "Payload/*.app/**/*.appex/Info.plist",
];

// `*` must stay inside one path component so `Payload/*.app` only hits top-level apps.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| AtsError::InvalidIpa(format!("bad entry pattern {}: {}", pattern, e)))
}

/// An opened .ipa. The underlying reader is dropped with the value.
pub struct IpaArchive<R> {
    archive: ZipArchive<R>,
}

impl IpaArchive<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => AtsError::FileNotFound(path.to_path_buf()),
            _ => AtsError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!(path = %path.display(), "opened archive");
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> IpaArchive<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;

        let has_payload = archive
            .file_names()
            .any(|name| name.starts_with("Payload/"));
        if !has_payload {
            return Err(AtsError::InvalidIpa("No Payload folder found".to_string()));
        }

        debug!(entries = archive.len(), "read zip central directory");
        Ok(Self { archive })
    }

    /// Archive path of the main app's Info.plist.
    ///
    /// If the payload somehow holds several apps, the lexicographically first wins.
    pub fn main_info_plist(&self) -> Result<String> {
        let pattern = compile(MAIN_INFO_PLIST)?;

        let mut found: Vec<&str> = self
            .archive
            .file_names()
            .filter(|name| pattern.matches_with(name, MATCH_OPTIONS))
            .collect();
        found.sort_unstable();

        let entry = found
            .first()
            .ok_or_else(|| AtsError::InvalidIpa("No Info.plist found, invalid app".to_string()))?;
        debug!(entry = %entry, "found main Info.plist");
        Ok(entry.to_string())
    }

    /// Archive paths of every Info.plist belonging to a bundle nested in the main app,
    /// in archive order.
    pub fn embedded_info_plists(&self) -> Result<Vec<String>> {
        let patterns = EMBEDDED_INFO_PLISTS
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;

        let found: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| patterns.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)))
            .map(str::to_string)
            .collect();

        debug!(count = found.len(), "found embedded bundle plists");
        Ok(found)
    }

    /// Main Info.plist first, followed by the embedded ones when `all_bundles` is set.
    pub fn info_plists(&self, all_bundles: bool) -> Result<Vec<String>> {
        let mut entries = vec![self.main_info_plist()?];
        if all_bundles {
            for entry in self.embedded_info_plists()? {
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name)?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|source| AtsError::Unreadable {
                path: PathBuf::from(name),
                source,
            })?;
        Ok(data)
    }
}

/// Opens `ipa_path` and returns the main Info.plist's archive path and raw bytes.
pub fn read_info_plist<P: AsRef<Path>>(ipa_path: P) -> Result<(String, Vec<u8>)> {
    let mut ipa = IpaArchive::open(ipa_path)?;
    let entry = ipa.main_info_plist()?;
    let data = ipa.read_entry(&entry)?;
    Ok((entry, data))
}
