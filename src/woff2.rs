//! Minimal WOFF2 container support.
//!
//! Decompresses the table stream and exposes the tables that WOFF2 never
//! transforms, which is all a character or name lookup needs. Transformed
//! `glyf`, `loca` and `hmtx` tables are dropped.

use std::fmt;
use std::io::Read;
use std::ops::Range;

use tracing::debug;
use ttf_parser::{Face, FaceParsingError, RawFaceTables, Tag};

const SIGNATURE: u32 = 0x774F_4632; // wOF2
const COLLECTION_FLAVOR: u32 = 0x7474_6366; // ttcf
const HEADER_SIZE: usize = 48;
// Upper bound on the decompressed table stream, whatever the header claims.
const MAX_STREAM_SIZE: usize = 256 << 20;

// Table tags addressable by their index in the directory flags.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

#[derive(Debug)]
pub enum Woff2Error {
    BadSignature,
    Truncated,
    BadBase128,
    BadTableIndex(usize),
    /// The table directory asks for more data than the font may hold.
    StreamTooLarge(usize),
    Decompression(std::io::Error),
}

impl fmt::Display for Woff2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Woff2Error::BadSignature => write!(f, "missing wOF2 signature"),
            Woff2Error::Truncated => write!(f, "unexpected end of data"),
            Woff2Error::BadBase128 => write!(f, "invalid UIntBase128 value"),
            Woff2Error::BadTableIndex(i) => write!(f, "collection refers to missing table {}", i),
            Woff2Error::StreamTooLarge(n) => write!(f, "table data of {} bytes exceeds the font size", n),
            Woff2Error::Decompression(e) => write!(f, "Brotli decompression failed: {}", e),
        }
    }
}

impl std::error::Error for Woff2Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Woff2Error::Decompression(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    tag: Tag,
    range: Range<usize>,
    transformed: bool,
}

/// A decompressed WOFF2 file, holding one font or a collection.
#[derive(Debug)]
pub struct Woff2Font {
    tables: Vec<TableEntry>,
    /// Table indices per font; a single font lists every table.
    fonts: Vec<Vec<usize>>,
    data: Vec<u8>,
}

impl Woff2Font {
    pub fn parse(data: &[u8]) -> Result<Woff2Font, Woff2Error> {
        let mut s = Reader { data, pos: 0 };
        if s.read_u32()? != SIGNATURE {
            return Err(Woff2Error::BadSignature);
        }
        let flavor = s.read_u32()?;
        s.skip(4)?; // length
        let num_tables = s.read_u16()? as usize;
        s.skip(2)?; // reserved
        let total_sfnt_size = s.read_u32()? as usize;
        let compressed_size = s.read_u32()? as usize;
        s.pos = HEADER_SIZE;

        let limit = total_sfnt_size.min(MAX_STREAM_SIZE);
        let mut tables = Vec::with_capacity(num_tables);
        let mut offset: usize = 0;
        for _ in 0..num_tables {
            let flags = s.read_u8()?;
            let tag = match (flags & 0x3F) as usize {
                0x3F => Tag(s.read_u32()?),
                index => Tag::from_bytes(KNOWN_TAGS[index]),
            };
            let transform_version = flags >> 6;
            let orig_length = s.read_base128()? as usize;
            let is_glyf_or_loca = tag == Tag::from_bytes(b"glyf") || tag == Tag::from_bytes(b"loca");
            // Version 0 means "transformed" for glyf and loca, "untouched" for the rest.
            let transformed = if is_glyf_or_loca {
                transform_version != 3
            } else {
                transform_version != 0
            };
            let length = if transformed {
                s.read_base128()? as usize
            } else {
                orig_length
            };
            let end = offset
                .checked_add(length)
                .filter(|&end| end <= limit)
                .ok_or(Woff2Error::StreamTooLarge(offset.saturating_add(length)))?;
            tables.push(TableEntry {
                tag,
                range: offset..end,
                transformed,
            });
            offset = end;
        }

        let fonts = if flavor == COLLECTION_FLAVOR {
            s.skip(4)?; // version
            let num_fonts = s.read_255_u16()?;
            let mut fonts = Vec::with_capacity(num_fonts as usize);
            for _ in 0..num_fonts {
                let font_tables = s.read_255_u16()?;
                s.skip(4)?; // flavor
                let mut indices = Vec::with_capacity(font_tables as usize);
                for _ in 0..font_tables {
                    let index = s.read_255_u16()? as usize;
                    if index >= tables.len() {
                        return Err(Woff2Error::BadTableIndex(index));
                    }
                    indices.push(index);
                }
                fonts.push(indices);
            }
            fonts
        } else {
            vec![(0..tables.len()).collect()]
        };

        let compressed = data
            .get(s.pos..s.pos.saturating_add(compressed_size))
            .ok_or(Woff2Error::Truncated)?;
        let mut decompressed = Vec::new();
        brotli::Decompressor::new(compressed, 4096)
            .take(offset as u64)
            .read_to_end(&mut decompressed)
            .map_err(Woff2Error::Decompression)?;
        if decompressed.len() < offset {
            return Err(Woff2Error::Truncated);
        }
        debug!(
            "WOFF2: {} tables, {} fonts, {} bytes decompressed",
            tables.len(),
            fonts.len(),
            decompressed.len()
        );

        Ok(Woff2Font {
            tables,
            fonts,
            data: decompressed,
        })
    }

    /// Builds a face for the font at `index`.
    pub fn face(&self, index: usize) -> Result<Face<'_>, FaceParsingError> {
        let indices = self
            .fonts
            .get(index)
            .ok_or(FaceParsingError::FaceIndexOutOfBounds)?;
        let mut raw = RawFaceTables::default();
        for entry in indices.iter().map(|&i| &self.tables[i]) {
            if entry.transformed {
                continue;
            }
            let bytes = &self.data[entry.range.clone()];
            match &entry.tag.to_bytes() {
                b"head" => raw.head = bytes,
                b"hhea" => raw.hhea = bytes,
                b"maxp" => raw.maxp = bytes,
                b"cmap" => raw.cmap = Some(bytes),
                b"name" => raw.name = Some(bytes),
                b"OS/2" => raw.os2 = Some(bytes),
                b"post" => raw.post = Some(bytes),
                _ => {}
            }
        }
        Face::from_raw_tables(raw)
    }

    /// Builds every face in the file, failing on the first malformed one.
    pub fn faces(&self) -> Result<Vec<Face<'_>>, FaceParsingError> {
        (0..self.fonts.len()).map(|i| self.face(i)).collect()
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Woff2Error> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or(Woff2Error::Truncated)?;
        self.pos += N;
        let mut out = [0; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<(), Woff2Error> {
        if self.pos + n > self.data.len() {
            return Err(Woff2Error::Truncated);
        }
        self.pos += n;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, Woff2Error> {
        Ok(self.take::<1>()?[0])
    }

    fn read_u16(&mut self) -> Result<u16, Woff2Error> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    fn read_u32(&mut self) -> Result<u32, Woff2Error> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn read_base128(&mut self) -> Result<u32, Woff2Error> {
        let mut value: u32 = 0;
        for i in 0..5 {
            let byte = self.read_u8()?;
            // No leading zeros, and the value must fit in 32 bits.
            if (i == 0 && byte == 0x80) || value & 0xFE00_0000 != 0 {
                return Err(Woff2Error::BadBase128);
            }
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Woff2Error::BadBase128)
    }

    fn read_255_u16(&mut self) -> Result<u16, Woff2Error> {
        const WORD_CODE: u8 = 253;
        const ONE_MORE_BYTE_CODE_2: u8 = 254;
        const ONE_MORE_BYTE_CODE_1: u8 = 255;
        const LOWEST_U_CODE: u16 = 253;
        match self.read_u8()? {
            WORD_CODE => self.read_u16(),
            ONE_MORE_BYTE_CODE_2 => Ok(self.read_u8()? as u16 + LOWEST_U_CODE * 2),
            ONE_MORE_BYTE_CODE_1 => Ok(self.read_u8()? as u16 + LOWEST_U_CODE),
            code => Ok(code as u16),
        }
    }
}
