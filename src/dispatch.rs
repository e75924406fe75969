use std::fs;
use std::path::Path;

use tracing::debug;
use ttf_parser::{Face, FaceParsingError};

use crate::charmap;
use crate::error::{Diagnostic, FontError};
use crate::identity::{filename_identity, metadata_identity};
use crate::type1::{self, Type1Font};
use crate::types::{CodePoint, ContainerKind, FontFile, FontIdentity, SupportResult};
use crate::woff2::Woff2Font;

/// Everything one file contributed to a search.
#[derive(Debug, Default)]
pub struct FileReport {
    /// Identities of the faces that support the code point, in file order.
    pub identities: Vec<FontIdentity>,
    pub diagnostic: Option<Diagnostic>,
}

impl FileReport {
    fn matches(identities: Vec<FontIdentity>) -> Self {
        FileReport {
            identities,
            diagnostic: None,
        }
    }

    fn diagnostic(diagnostic: Diagnostic) -> Self {
        debug!("{}", diagnostic);
        FileReport {
            identities: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }
}

enum Resolution {
    Matches(Vec<FontIdentity>),
    Undetermined,
}

/// Reads `file` and reports which of its faces support `code_point`.
///
/// Never fails: unreadable formats, undetermined Type 1 support and
/// malformed data all come back as a diagnostic with no identities.
pub fn inspect(file: &FontFile, code_point: CodePoint) -> FileReport {
    if file.kind == ContainerKind::Unreadable {
        return FileReport::diagnostic(Diagnostic::Unreadable {
            path: file.path.clone(),
        });
    }
    match fs::read(&file.path) {
        Ok(data) => inspect_bytes(&file.path, file.kind, &data, code_point),
        Err(error) => FileReport::diagnostic(Diagnostic::DecodeFailure {
            path: file.path.clone(),
            error: error.into(),
        }),
    }
}

/// Like [`inspect`], for font data already in memory. `path` names the file
/// in diagnostics and feeds the file name heuristic for Type 1 fonts.
pub fn inspect_bytes(
    path: &Path,
    kind: ContainerKind,
    data: &[u8],
    code_point: CodePoint,
) -> FileReport {
    debug!("inspecting {} as {}", path.display(), kind);
    let resolution = match kind {
        ContainerKind::TrueType | ContainerKind::OpenType => resolve_single(data, code_point),
        ContainerKind::Collection => resolve_collection(data, code_point),
        ContainerKind::Woff2 => resolve_woff2(data, code_point),
        ContainerKind::Type1 => resolve_type1(path, data, code_point),
        ContainerKind::Unreadable => {
            return FileReport::diagnostic(Diagnostic::Unreadable {
                path: path.to_path_buf(),
            });
        }
    };
    match resolution {
        Ok(Resolution::Matches(identities)) => FileReport::matches(identities),
        Ok(Resolution::Undetermined) => FileReport::diagnostic(Diagnostic::Undetermined {
            path: path.to_path_buf(),
        }),
        Err(error) => FileReport::diagnostic(Diagnostic::DecodeFailure {
            path: path.to_path_buf(),
            error,
        }),
    }
}

fn resolve_faces(faces: &[Face], code_point: CodePoint) -> Resolution {
    Resolution::Matches(
        faces
            .iter()
            .filter(|face| charmap::is_supporting(face, code_point))
            .map(metadata_identity)
            .collect(),
    )
}

fn resolve_single(data: &[u8], code_point: CodePoint) -> Result<Resolution, FontError> {
    let face = Face::parse(data, 0)?;
    Ok(resolve_faces(&[face], code_point))
}

fn resolve_collection(data: &[u8], code_point: CodePoint) -> Result<Resolution, FontError> {
    let count = ttf_parser::fonts_in_collection(data).ok_or(FaceParsingError::UnknownMagic)?;
    debug!("collection with {} fonts", count);
    let faces = (0..count)
        .map(|index| Face::parse(data, index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(resolve_faces(&faces, code_point))
}

fn resolve_woff2(data: &[u8], code_point: CodePoint) -> Result<Resolution, FontError> {
    let font = Woff2Font::parse(data)?;
    let faces = font.faces()?;
    Ok(resolve_faces(&faces, code_point))
}

fn resolve_type1(path: &Path, data: &[u8], code_point: CodePoint) -> Result<Resolution, FontError> {
    let font = Type1Font::parse(data)?;
    Ok(match type1::is_supporting(font.glyph_names(), code_point) {
        SupportResult::Supported => Resolution::Matches(vec![filename_identity(path)]),
        SupportResult::NotSupported => Resolution::Matches(Vec::new()),
        SupportResult::Undetermined => Resolution::Undetermined,
    })
}
