use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use fontsearch::{CodePoint, FontSearch};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fontsearch")]
#[command(about = "Search for all fonts that support CHARACTER")]
#[command(
    long_about = "Search for all fonts that support CHARACTER.\n\n\
    Supported font formats are TrueType (TTF/TTC), OpenType (OTF) and Web Open \
    Font Format 2 (WOFF2). Type 1 (T1) fonts are partially supported: support \
    for a limited set of characters can be detected, but never the lack of it. \
    PFA, PFB, PCF and GSF files are found but not analyzed."
)]
struct Args {
    /// The character to search for, or its code point written as U+XXXX
    #[arg(value_name = "CHARACTER")]
    character: String,

    /// Output font subfamilies in addition to families [default]
    #[arg(short, long, overrides_with = "coarse")]
    fine: bool,

    /// Output font families only
    #[arg(short, long, overrides_with = "fine")]
    coarse: bool,

    /// Separator between font family and subfamily [default: TAB]
    #[arg(short, long, default_value = "\t", hide_default_value = true)]
    separator: String,

    /// Terminate names with ASCII NUL
    #[arg(short = 'z', long, overrides_with = "newline")]
    null: bool,

    /// Terminate names with a newline [default]
    #[arg(short, long, overrides_with = "null")]
    newline: bool,

    /// Directory to search instead of the default font directories (repeatable)
    #[arg(short, long = "dir", value_name = "DIR")]
    dir: Vec<PathBuf>,
}

fn parse_code_point(character: &str) -> Result<CodePoint, String> {
    let mut chars = character.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(c as CodePoint);
    }
    let hex = character
        .strip_prefix("U+")
        .or_else(|| character.strip_prefix("u+"))
        .ok_or_else(|| format!("expected a single character, got {:?}", character))?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(|c| c as CodePoint)
        .ok_or_else(|| format!("invalid code point {:?}", character))
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let code_point = match parse_code_point(&args.character) {
        Ok(code_point) => code_point,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let search = if args.dir.is_empty() {
        FontSearch::default()
    } else {
        FontSearch::builder().directories(args.dir).build()
    };
    tracing::debug!(
        "searching U+{:04X} in {:?}",
        code_point,
        search.directories()
    );

    let fonts: BTreeSet<_> = search
        .search(code_point, |diagnostic| eprintln!("{}", diagnostic))
        .collect();

    let end = if args.null { "\0" } else { "\n" };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.coarse {
        let families: BTreeSet<_> = fonts.iter().map(|font| font.family.as_str()).collect();
        families
            .iter()
            .try_for_each(|family| write!(out, "{}{}", family, end))
    } else {
        fonts.iter().try_for_each(|font| {
            write!(
                out,
                "{}{}{}{}",
                font.family, args.separator, font.subfamily, end
            )
        })
    };
    if let Err(e) = result.and_then(|_| out.flush()) {
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("Error writing output: {}", e);
            std::process::exit(1);
        }
    }
}
