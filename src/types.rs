use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A Unicode scalar value being searched for.
pub type CodePoint = u32;

/// Family and subfamily of a font, e.g. `("Noto Sans", "Bold")`.
///
/// Equality is exact and case-sensitive. The subfamily may be empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FontIdentity {
    pub family: String,
    pub subfamily: String,
}

impl FontIdentity {
    pub fn new(family: impl Into<String>, subfamily: impl Into<String>) -> Self {
        FontIdentity {
            family: family.into(),
            subfamily: subfamily.into(),
        }
    }
}

impl fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subfamily.is_empty() {
            write!(f, "{}", self.family)
        } else {
            write!(f, "{} {}", self.family, self.subfamily)
        }
    }
}

/// Outcome of asking a font whether it covers a code point.
///
/// Fonts that only expose glyph names can prove presence but never absence,
/// which is what `Undetermined` stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportResult {
    Supported,
    NotSupported,
    Undetermined,
}

impl SupportResult {
    pub fn is_supported(self) -> bool {
        self == SupportResult::Supported
    }
}

impl From<bool> for SupportResult {
    fn from(supported: bool) -> Self {
        if supported {
            SupportResult::Supported
        } else {
            SupportResult::NotSupported
        }
    }
}

/// The declared container type of a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    TrueType,
    OpenType,
    Woff2,
    /// TrueType/OpenType collection (`.ttc`, `.otc`).
    Collection,
    Type1,
    /// Recognized font formats this crate does not decode (PFA, PFB, GSF, PCF).
    Unreadable,
}

const UNREADABLE_EXTENSIONS: &[&str] = &["pfa", "pfb", "gsf", "pcf"];

impl ContainerKind {
    /// Classifies a file by its extension. Returns `None` for files that are
    /// not fonts as far as this crate is concerned.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<ContainerKind> {
        let path = path.as_ref();
        let extension = extension_of(path)?;
        match extension.as_str() {
            "ttf" => Some(ContainerKind::TrueType),
            "otf" => Some(ContainerKind::OpenType),
            "woff2" => Some(ContainerKind::Woff2),
            "ttc" | "otc" => Some(ContainerKind::Collection),
            "t1" => Some(ContainerKind::Type1),
            "gz" => {
                let inner = extension_of(Path::new(path.file_stem()?))?;
                UNREADABLE_EXTENSIONS
                    .contains(&inner.as_str())
                    .then_some(ContainerKind::Unreadable)
            }
            ext if UNREADABLE_EXTENSIONS.contains(&ext) => Some(ContainerKind::Unreadable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::TrueType => "ttf",
            ContainerKind::OpenType => "otf",
            ContainerKind::Woff2 => "woff2",
            ContainerKind::Collection => "ttc",
            ContainerKind::Type1 => "t1",
            ContainerKind::Unreadable => "unreadable",
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown container tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContainer(pub String);

impl fmt::Display for UnknownContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown container type {:?}", self.0)
    }
}

impl std::error::Error for UnknownContainer {}

impl FromStr for ContainerKind {
    type Err = UnknownContainer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ttf" => Ok(ContainerKind::TrueType),
            "otf" => Ok(ContainerKind::OpenType),
            "woff2" => Ok(ContainerKind::Woff2),
            "ttc" | "otc" | "collection" => Ok(ContainerKind::Collection),
            "t1" | "type1" => Ok(ContainerKind::Type1),
            "unreadable" => Ok(ContainerKind::Unreadable),
            _ => Err(UnknownContainer(s.to_owned())),
        }
    }
}

/// A font file handed to the dispatcher: where it lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFile {
    pub path: PathBuf,
    pub kind: ContainerKind,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>, kind: ContainerKind) -> Self {
        FontFile {
            path: path.into(),
            kind,
        }
    }

    /// Builds a descriptor from the file extension, or `None` when the file is
    /// not something this crate understands.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = ContainerKind::from_path(&path)?;
        Some(FontFile { path, kind })
    }
}
