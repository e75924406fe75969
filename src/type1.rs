use std::fmt;

use tracing::debug;

use crate::types::{CodePoint, SupportResult};

const EEXEC_KEY: u16 = 55665;
const C1: u16 = 52845;
const C2: u16 = 22719;
const LEAD_BYTES: usize = 4;

const PFB_MARKER: u8 = 0x80;
const PFB_ASCII: u8 = 1;
const PFB_BINARY: u8 = 2;
const PFB_EOF: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type1Error {
    NotType1,
    TruncatedSegment,
    /// Neither a `/CharStrings` dictionary nor a built-in encoding was found.
    MissingGlyphNames,
}

impl fmt::Display for Type1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type1Error::NotType1 => write!(f, "not a Type 1 font program"),
            Type1Error::TruncatedSegment => write!(f, "truncated PFB segment"),
            Type1Error::MissingGlyphNames => write!(f, "no glyph names found"),
        }
    }
}

impl std::error::Error for Type1Error {}

/// Glyph names exposed by a name-only font, in font order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphNameSet {
    names: Vec<String>,
}

impl GlyphNameSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GlyphNameSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        GlyphNameSet {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A decoded Type 1 font. Only the glyph names are kept.
#[derive(Debug, Clone)]
pub struct Type1Font {
    glyphs: GlyphNameSet,
}

impl Type1Font {
    /// Decodes a PFA or PFB framed Type 1 program.
    pub fn parse(data: &[u8]) -> Result<Type1Font, Type1Error> {
        let (cleartext, encrypted) = split_program(data)?;

        let mut names = encrypted
            .map(|private| {
                let private = eexec_decrypt(&private, EEXEC_KEY);
                charstring_names(private.get(LEAD_BYTES..).unwrap_or_default())
            })
            .unwrap_or_default();

        if names.is_none() {
            debug!("no /CharStrings dictionary, falling back to built-in encoding");
            names = encoding_names(&cleartext);
        }

        let names = names.ok_or(Type1Error::MissingGlyphNames)?;
        debug!("Type 1 font exposes {} glyph names", names.len());
        Ok(Type1Font {
            glyphs: GlyphNameSet { names },
        })
    }

    pub fn glyph_names(&self) -> &GlyphNameSet {
        &self.glyphs
    }
}

/// Splits a program into its cleartext part and, when present, the still
/// encrypted private part (already converted from hex).
fn split_program(data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>), Type1Error> {
    if data.first() == Some(&PFB_MARKER) {
        return split_pfb(data);
    }
    if !data.starts_with(b"%!") {
        return Err(Type1Error::NotType1);
    }

    let Some(start) = find(data, b"eexec") else {
        return Ok((data.to_vec(), None));
    };
    let cleartext = data[..start].to_vec();
    let rest = &data[start + b"eexec".len()..];

    let trimmed = rest.trim_ascii_start();
    let is_hex = trimmed
        .get(..LEAD_BYTES)
        .is_some_and(|lead| lead.iter().all(u8::is_ascii_hexdigit));
    let encrypted = if is_hex {
        from_hex(trimmed)
    } else {
        // Binary data may itself start with whitespace bytes, so only the
        // single line break after `eexec` is dropped.
        let binary = rest
            .strip_prefix(b"\r\n")
            .or_else(|| rest.strip_prefix(b"\n"))
            .or_else(|| rest.strip_prefix(b"\r"))
            .or_else(|| rest.strip_prefix(b" "))
            .unwrap_or(rest);
        binary.to_vec()
    };
    Ok((cleartext, Some(encrypted)))
}

fn split_pfb(mut data: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>), Type1Error> {
    let mut cleartext = Vec::new();
    let mut encrypted: Option<Vec<u8>> = None;
    while let [PFB_MARKER, kind, rest @ ..] = data {
        if *kind == PFB_EOF {
            break;
        }
        let header = rest.get(..4).ok_or(Type1Error::TruncatedSegment)?;
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let end = length.checked_add(4).ok_or(Type1Error::TruncatedSegment)?;
        let segment = rest.get(4..end).ok_or(Type1Error::TruncatedSegment)?;
        match *kind {
            PFB_ASCII if encrypted.is_none() => cleartext.extend_from_slice(segment),
            PFB_ASCII => {}
            PFB_BINARY => encrypted.get_or_insert_with(Vec::new).extend_from_slice(segment),
            _ => return Err(Type1Error::NotType1),
        }
        data = &rest[end..];
    }
    if cleartext.is_empty() {
        return Err(Type1Error::TruncatedSegment);
    }
    Ok((cleartext, encrypted))
}

fn from_hex(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for &byte in text {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ if byte.is_ascii_whitespace() => continue,
            _ => break,
        };
        match high.take() {
            Some(h) => out.push(h << 4 | nibble),
            None => high = Some(nibble),
        }
    }
    out
}

fn eexec_decrypt(data: &[u8], key: u16) -> Vec<u8> {
    let mut r = key;
    data.iter()
        .map(|&c| {
            let p = c ^ (r >> 8) as u8;
            r = (c as u16).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
            p
        })
        .collect()
}

/// Reads the glyph names of the `/CharStrings` dictionary, skipping each
/// binary charstring. `None` when there is no such dictionary.
fn charstring_names(private: &[u8]) -> Option<Vec<String>> {
    let start = find(private, b"/CharStrings")? + b"/CharStrings".len();
    let mut tokens = Tokens {
        data: private,
        pos: start,
    };

    while tokens.next()? != b"begin" {}

    let mut names = Vec::new();
    while let Some(token) = tokens.next() {
        if token == b"end" {
            break;
        }
        let Some(name) = token.strip_prefix(b"/") else {
            continue;
        };
        let name = String::from_utf8_lossy(name).into_owned();
        let length = tokens
            .next()
            .and_then(|t| std::str::from_utf8(t).ok())
            .and_then(|t| t.parse::<usize>().ok());
        let Some(length) = length else {
            debug!("malformed charstring entry for /{}", name);
            break;
        };
        tokens.next()?; // RD or -|
        // A single space separates the token from the binary data.
        let Some(pos) = tokens.pos.checked_add(1).and_then(|pos| pos.checked_add(length)) else {
            debug!("charstring length {} of /{} out of range", length, name);
            break;
        };
        tokens.pos = pos;
        names.push(name);
    }
    Some(names)
}

struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.data.get(self.pos..)?;
        let start = rest.iter().position(|b| !b.is_ascii_whitespace())?;
        let len = rest[start..]
            .iter()
            .enumerate()
            .position(|(i, &b)| b.is_ascii_whitespace() || (i > 0 && b == b'/'))
            .unwrap_or(rest.len() - start);
        self.pos += start + len;
        Some(&rest[start..start + len])
    }
}

fn encoding_names(cleartext: &[u8]) -> Option<Vec<String>> {
    let encoding = type1_encoding_parser::get_encoding_map(cleartext).ok()?;
    let mut names = Vec::new();
    for (_, name) in encoding {
        let name = String::from_utf8_lossy(&name).into_owned();
        if name != ".notdef" {
            names.push(name);
        }
    }
    Some(names)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Infers whether `glyphs` covers `code_point` from glyph naming alone.
///
/// Matches single-character names by ordinal and `uniXXXX` names (uppercase
/// hex digits) by value. Never returns `NotSupported`: an unmatched name set
/// proves nothing.
pub fn is_supporting(glyphs: &GlyphNameSet, code_point: CodePoint) -> SupportResult {
    if glyphs.iter().any(|name| names_code_point(name, code_point)) {
        SupportResult::Supported
    } else {
        SupportResult::Undetermined
    }
}

fn names_code_point(name: &str, code_point: CodePoint) -> bool {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c as u32 == code_point;
    }
    name.strip_prefix("uni")
        .filter(|hex| !hex.is_empty() && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')))
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        == Some(code_point)
}
