use atscheck::{check, http_permitted, CheckOptions, ColorMode, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::Level;

/// Exit code for `--strict` when the app may load plain HTTP.
/// Kept clear of clap's usage-error code (2).
const EXIT_HTTP_PERMITTED: i32 = 5;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0  report printed
  1  writing the report failed
  2  invalid command-line usage
  3  archive missing, unreadable, not a zip, or without Info.plist
  4  Info.plist could not be decoded
  5  --strict and plain HTTP is effectively permitted";

#[derive(Parser, Debug)]
#[command(name = "atscheck")]
#[command(about = "Check App Transport Security exceptions inside an iOS .ipa")]
#[command(version)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Path to the .ipa file
    ipa: PathBuf,

    /// Print JSON output
    #[arg(long)]
    json: bool,

    /// Disable colored output (same as --color never)
    #[arg(long)]
    no_color: bool,

    /// When to color the text output
    #[arg(long, value_enum, default_value_t = ColorMode::Always)]
    color: ColorMode,

    /// Only show the exception for this domain (e.g. api.example.com)
    #[arg(long)]
    domain: Option<String>,

    /// Also report app extensions and other embedded bundles
    #[arg(long)]
    all_bundles: bool,

    /// Exit with code 5 when plain HTTP is effectively permitted
    #[arg(long)]
    strict: bool,

    /// Log archive and plist details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("[!] {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let options = CheckOptions {
        json: cli.json,
        color: if cli.no_color { ColorMode::Never } else { cli.color },
        domain: cli.domain,
        all_bundles: cli.all_bundles,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let bundles = check(&cli.ipa, &options, &mut out)?;
    out.flush()?;

    if cli.strict && http_permitted(&bundles) {
        return Ok(EXIT_HTTP_PERMITTED);
    }
    Ok(0)
}
