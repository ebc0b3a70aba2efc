#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn atscheck() -> Command {
    cargo_bin_cmd!("atscheck")
}

/// A full Info.plist document with `body` spliced into the root dictionary.
pub fn info_plist_xml(bundle_id: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleExecutable</key>
    <string>Demo</string>
    <key>CFBundleIdentifier</key>
    <string>{}</string>
    {}
</dict>
</plist>"#,
        bundle_id, body
    )
}

/// Same as [`info_plist_xml`] with an `NSAppTransportSecurity` dictionary holding `ats`.
pub fn ats_plist_xml(ats: &str) -> String {
    info_plist_xml(
        "com.example.demo",
        &format!("<key>NSAppTransportSecurity</key><dict>{}</dict>", ats),
    )
}

pub fn to_binary_plist(xml: &str) -> Vec<u8> {
    let value = plist::Value::from_reader_xml(xml.as_bytes()).expect("valid xml plist");
    let mut bytes = Vec::new();
    plist::to_writer_binary(&mut bytes, &value).expect("encode binary plist");
    bytes
}

/// Builds throwaway .ipa archives inside a temp dir.
pub struct IpaFixture {
    tmp: TempDir,
    entries: Vec<(String, Vec<u8>)>,
}

impl IpaFixture {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.to_string(), data.into()));
        self
    }

    pub fn main_plist(self, data: impl Into<Vec<u8>>) -> Self {
        self.entry("Payload/Demo.app/Demo", b"\xcf\xfa\xed\xfe".to_vec())
            .entry("Payload/Demo.app/Info.plist", data)
    }

    pub fn write(&self, name: &str) -> PathBuf {
        self.write_with(name, SimpleFileOptions::default())
    }

    /// Writes every entry uncompressed, so entry bytes appear verbatim in the file.
    pub fn write_stored(&self, name: &str) -> PathBuf {
        self.write_with(
            name,
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )
    }

    fn write_with(&self, name: &str, options: SimpleFileOptions) -> PathBuf {
        let path = self.tmp.path().join(name);
        let file = File::create(&path).expect("create ipa");
        let mut zip = ZipWriter::new(file);
        for (entry, data) in &self.entries {
            zip.start_file(entry.as_str(), options)
                .expect("start zip entry");
            zip.write_all(data).expect("write zip entry");
        }
        zip.finish().expect("finish zip");
        path
    }

    pub fn write_raw(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.tmp.path().join(name);
        std::fs::write(&path, data).expect("write file");
        path
    }

    pub fn dir(&self) -> &Path {
        self.tmp.path()
    }
}

pub fn run_json(ipa: &Path, extra: &[&str]) -> Value {
    let out = atscheck()
        .arg(ipa)
        .arg("--json")
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).expect("valid json output")
}

pub fn run_text(ipa: &Path, extra: &[&str]) -> String {
    let out = atscheck()
        .arg(ipa)
        .arg("--no-color")
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(out).expect("utf-8 output")
}

/// Flips one byte of the first occurrence of `needle` in the file, breaking that entry's CRC.
pub fn corrupt_first(path: &Path, needle: &[u8]) {
    let mut bytes = std::fs::read(path).expect("read ipa");
    let pos = bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("needle present in archive");
    bytes[pos] ^= 0x20;
    std::fs::write(path, bytes).expect("rewrite ipa");
}
