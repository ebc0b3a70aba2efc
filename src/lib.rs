pub mod ats;
pub mod check;
pub mod config;
pub mod error;
pub mod ipa;
pub mod output;
pub mod plist_ext;

pub use ats::{evaluate, DomainException, GlobalPolicy, Report};
pub use check::{check, check_ipa, http_permitted, BundleReport};
pub use config::{CheckOptions, ColorMode};
pub use error::{AtsError, ErrorKind, Result};
pub use ipa::{read_info_plist, IpaArchive};
pub use output::{create_formatter, OutputFormatter};
pub use plist_ext::{InfoPlist, PlistFormat};
