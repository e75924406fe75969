//! Font coverage search
//!
//! This library answers which installed fonts can render a given Unicode
//! character. TrueType, OpenType, WOFF2 and collection files are checked
//! against their Unicode `cmap` subtables; Type 1 fonts are checked through
//! their glyph names. Every matching face is reported by family and
//! subfamily.

mod charmap;
mod dispatch;
mod error;
mod identity;
mod search;
mod type1;
mod types;
mod woff2;

#[cfg(test)]
mod testutil;

// Re-export error types
pub use error::{Diagnostic, FontError};
pub use type1::Type1Error;
pub use woff2::Woff2Error;

// Re-export the per-font building blocks
pub use charmap::{CharacterMap, is_supporting as is_supporting_unicode};
pub use identity::{filename_identity, metadata_identity};
pub use type1::{GlyphNameSet, Type1Font, is_supporting as is_supporting_glyph_names};
pub use woff2::Woff2Font;

// Re-export search API
pub use dispatch::{FileReport, inspect, inspect_bytes};
pub use search::{FontFiles, FontSearch, FontSearchBuilder, Search, default_directories, search_files};

// Re-export public types
pub use types::{CodePoint, ContainerKind, FontFile, FontIdentity, SupportResult, UnknownContainer};

/// Searches the default font directories for `code_point`.
///
/// This is a convenience function equivalent to
/// `FontSearch::default().search(code_point, on_diagnostic)`.
///
/// # Examples
///
/// ```no_run
/// for identity in fontsearch::supporting_fonts('€' as u32, |d| eprintln!("{}", d)) {
///     println!("{}\t{}", identity.family, identity.subfamily);
/// }
/// ```
pub fn supporting_fonts<F>(code_point: CodePoint, on_diagnostic: F) -> Search<FontFiles, F>
where
    F: FnMut(Diagnostic),
{
    FontSearch::default().search(code_point, on_diagnostic)
}
