use std::path::Path;

use encoding_rs::{
    BIG5, EUC_KR, Encoding, GBK, MACINTOSH, SHIFT_JIS, UTF_16BE, WINDOWS_1252, X_MAC_CYRILLIC,
};
use ttf_parser::name::Name;
use ttf_parser::{Face, PlatformId, name_id};

use crate::types::FontIdentity;

/// Reads family and subfamily from the `name` table.
///
/// Takes the first family record, then the first subfamily record that
/// follows it. A second family record ends the search, leaving the
/// subfamily empty; later language variants are never consulted.
pub fn metadata_identity(face: &Face) -> FontIdentity {
    let mut family = String::new();
    let mut subfamily = String::new();
    for name in face.names() {
        match name.name_id {
            name_id::FAMILY => {
                if family.is_empty() {
                    family = decode_name(&name);
                } else {
                    break;
                }
            }
            name_id::SUBFAMILY if !family.is_empty() => {
                subfamily = decode_name(&name);
                break;
            }
            _ => {}
        }
    }
    FontIdentity { family, subfamily }
}

/// Guesses family and subfamily from a file name such as `NotoSans-Bold.t1`.
///
/// The extension is dropped and the stem split at its last hyphen.
pub fn filename_identity<P: AsRef<Path>>(path: P) -> FontIdentity {
    let stem = path
        .as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rsplit_once('-') {
        Some((family, subfamily)) => FontIdentity::new(family, subfamily),
        None => FontIdentity::new(stem, ""),
    }
}

pub(crate) fn decode_name(name: &Name) -> String {
    match name_encoding(name.platform_id, name.encoding_id) {
        Some(encoding) => encoding
            .decode_without_bom_handling(name.name)
            .0
            .into_owned(),
        None => String::from_utf8_lossy(name.name).into_owned(),
    }
}

fn name_encoding(platform_id: PlatformId, encoding_id: u16) -> Option<&'static Encoding> {
    match (platform_id, encoding_id) {
        (PlatformId::Unicode, _) => Some(UTF_16BE),
        (PlatformId::Windows, 0 | 1 | 10) => Some(UTF_16BE),
        (PlatformId::Windows, 2) => Some(SHIFT_JIS),
        (PlatformId::Windows, 3) => Some(GBK),
        (PlatformId::Windows, 4) => Some(BIG5),
        (PlatformId::Windows, 5) => Some(EUC_KR),
        (PlatformId::Macintosh, 0) => Some(MACINTOSH),
        (PlatformId::Macintosh, 1) => Some(SHIFT_JIS),
        (PlatformId::Macintosh, 2) => Some(BIG5),
        (PlatformId::Macintosh, 3) => Some(EUC_KR),
        (PlatformId::Macintosh, 7) => Some(X_MAC_CYRILLIC),
        (PlatformId::Macintosh, 25) => Some(GBK),
        (PlatformId::Iso, 1) => Some(UTF_16BE),
        (PlatformId::Iso, _) => Some(WINDOWS_1252),
        _ => None,
    }
}
