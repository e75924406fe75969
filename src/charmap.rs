use ttf_parser::cmap::Subtable;
use ttf_parser::{Face, GlyphId, PlatformId};
use tracing::debug;

use crate::types::CodePoint;

/// The Unicode view of a face's `cmap` table.
///
/// Holds every Unicode-flagged subtable of one face and answers lookups
/// against their union. Symbol and legacy platform subtables are left out
/// so they can never produce a match.
pub struct CharacterMap<'a> {
    subtables: Vec<Subtable<'a>>,
}

impl<'a> CharacterMap<'a> {
    pub fn new(face: &Face<'a>) -> CharacterMap<'a> {
        let mut subtables = Vec::new();
        for subtable in face.tables().cmap.iter().flat_map(|cmap| cmap.subtables) {
            debug!(
                "cmap subtable: platform={:?} encoding={} format={:?}",
                subtable.platform_id, subtable.encoding_id, subtable.format
            );
            if is_unicode_subtable(&subtable) {
                subtables.push(subtable);
            }
        }
        CharacterMap { subtables }
    }

    /// Glyph mapped to `code_point` by the first subtable that has it.
    ///
    /// A mapping to glyph 0 (`.notdef`) counts as unmapped, which also covers
    /// the closing 0xFFFF segment every format 4 subtable carries.
    pub fn glyph_index(&self, code_point: CodePoint) -> Option<GlyphId> {
        self.subtables.iter().find_map(|subtable| {
            subtable
                .glyph_index(code_point)
                .filter(|glyph| glyph.0 != 0)
        })
    }

    pub fn contains(&self, code_point: CodePoint) -> bool {
        self.glyph_index(code_point).is_some()
    }

    /// Number of Unicode-flagged subtables.
    pub fn len(&self) -> usize {
        self.subtables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtables.is_empty()
    }
}

// Unicode platform (any encoding, including variation sequences) or
// Windows Unicode BMP / full repertoire.
fn is_unicode_subtable(subtable: &Subtable) -> bool {
    matches!(
        (subtable.platform_id, subtable.encoding_id),
        (PlatformId::Unicode, _) | (PlatformId::Windows, 1) | (PlatformId::Windows, 10)
    )
}

/// Returns whether `face` maps `code_point` in any Unicode subtable.
///
/// Always definitive: a face without a Unicode subtable simply does not
/// support anything.
pub fn is_supporting(face: &Face, code_point: CodePoint) -> bool {
    CharacterMap::new(face).contains(code_point)
}
