//! In-memory font fixtures for unit tests.

use std::io::Write;

type TableData = ([u8; 4], Vec<u8>);

struct CmapRecord {
    platform: u16,
    encoding: u16,
    format: u16,
    code_points: Vec<u32>,
}

struct NameRecord {
    platform: u16,
    encoding: u16,
    language: u16,
    name_id: u16,
    bytes: Vec<u8>,
}

/// Assembles a minimal but valid sfnt font: `head`, `hhea`, `maxp` and,
/// when requested, `cmap` and `name`.
#[derive(Default)]
pub(crate) struct FontBuilder {
    cmaps: Vec<CmapRecord>,
    names: Vec<NameRecord>,
}

impl FontBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a format 12 subtable mapping each code point to its own glyph.
    pub(crate) fn cmap(self, platform: u16, encoding: u16, code_points: &[u32]) -> Self {
        self.cmap_record(platform, encoding, 12, code_points)
    }

    /// Adds a format 4 subtable for BMP code points, closed by the usual
    /// 0xFFFF segment.
    pub(crate) fn cmap_format4(self, platform: u16, encoding: u16, code_points: &[u32]) -> Self {
        self.cmap_record(platform, encoding, 4, code_points)
    }

    fn cmap_record(mut self, platform: u16, encoding: u16, format: u16, code_points: &[u32]) -> Self {
        self.cmaps.push(CmapRecord {
            platform,
            encoding,
            format,
            code_points: code_points.to_vec(),
        });
        self
    }

    /// Adds a Windows Unicode BMP name record.
    pub(crate) fn name(self, name_id: u16, text: &str) -> Self {
        let bytes = text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        self.raw_name(3, 1, 0x409, name_id, bytes)
    }

    pub(crate) fn raw_name(
        mut self,
        platform: u16,
        encoding: u16,
        language: u16,
        name_id: u16,
        bytes: Vec<u8>,
    ) -> Self {
        self.names.push(NameRecord {
            platform,
            encoding,
            language,
            name_id,
            bytes,
        });
        self
    }

    /// Tables sorted by tag, as the table directory requires.
    pub(crate) fn tables(&self) -> Vec<TableData> {
        let mut tables = vec![
            (*b"head", head_table()),
            (*b"hhea", hhea_table()),
            (*b"maxp", maxp_table()),
        ];
        if !self.cmaps.is_empty() {
            tables.push((*b"cmap", self.cmap_table()));
        }
        if !self.names.is_empty() {
            tables.push((*b"name", self.name_table()));
        }
        tables.sort_by(|a, b| a.0.cmp(&b.0));
        tables
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        write_sfnt(&[self.tables()], false)
    }

    fn cmap_table(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push_u16(&mut out, 0);
        push_u16(&mut out, self.cmaps.len() as u16);
        let mut subtables: Vec<u8> = Vec::new();
        let mut offset = 4 + 8 * self.cmaps.len();
        for record in &self.cmaps {
            push_u16(&mut out, record.platform);
            push_u16(&mut out, record.encoding);
            push_u32(&mut out, offset as u32);
            let subtable = match record.format {
                4 => format4(&record.code_points),
                _ => format12(&record.code_points),
            };
            offset += subtable.len();
            subtables.extend(subtable);
        }
        out.extend(subtables);
        out
    }

    fn name_table(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut storage = Vec::new();
        push_u16(&mut out, 0);
        push_u16(&mut out, self.names.len() as u16);
        push_u16(&mut out, (6 + 12 * self.names.len()) as u16);
        for record in &self.names {
            push_u16(&mut out, record.platform);
            push_u16(&mut out, record.encoding);
            push_u16(&mut out, record.language);
            push_u16(&mut out, record.name_id);
            push_u16(&mut out, record.bytes.len() as u16);
            push_u16(&mut out, storage.len() as u16);
            storage.extend_from_slice(&record.bytes);
        }
        out.extend(storage);
        out
    }
}

fn sorted_unique(code_points: &[u32]) -> Vec<u32> {
    let mut sorted = code_points.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

// One segment per code point, mapped through idDelta, then the terminating
// 0xFFFF segment with idDelta 1.
fn format4(code_points: &[u32]) -> Vec<u8> {
    let sorted: Vec<u16> = sorted_unique(code_points)
        .into_iter()
        .filter(|&cp| cp < 0xFFFF)
        .map(|cp| cp as u16)
        .collect();
    let seg_count = sorted.len() + 1;
    let mut search_range = 2u16;
    let mut entry_selector = 0u16;
    while (search_range as usize) * 2 <= seg_count * 2 {
        search_range *= 2;
        entry_selector += 1;
    }
    let mut out = Vec::new();
    push_u16(&mut out, 4);
    push_u16(&mut out, (16 + 8 * seg_count) as u16);
    push_u16(&mut out, 0); // language
    push_u16(&mut out, (seg_count * 2) as u16);
    push_u16(&mut out, search_range);
    push_u16(&mut out, entry_selector);
    push_u16(&mut out, (seg_count * 2) as u16 - search_range);
    for &cp in &sorted {
        push_u16(&mut out, cp);
    }
    push_u16(&mut out, 0xFFFF);
    push_u16(&mut out, 0); // reservedPad
    for &cp in &sorted {
        push_u16(&mut out, cp);
    }
    push_u16(&mut out, 0xFFFF);
    for (i, &cp) in sorted.iter().enumerate() {
        push_u16(&mut out, (i as u16 + 1).wrapping_sub(cp));
    }
    push_u16(&mut out, 1);
    for _ in 0..seg_count {
        push_u16(&mut out, 0); // idRangeOffset
    }
    out
}

fn format12(code_points: &[u32]) -> Vec<u8> {
    let sorted = sorted_unique(code_points);
    let mut out = Vec::new();
    push_u16(&mut out, 12);
    push_u16(&mut out, 0);
    push_u32(&mut out, (16 + 12 * sorted.len()) as u32);
    push_u32(&mut out, 0);
    push_u32(&mut out, sorted.len() as u32);
    for (i, code_point) in sorted.iter().enumerate() {
        push_u32(&mut out, *code_point);
        push_u32(&mut out, *code_point);
        push_u32(&mut out, i as u32 + 1);
    }
    out
}

fn head_table() -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000); // version
    push_u32(&mut out, 0x0001_0000); // fontRevision
    push_u32(&mut out, 0); // checkSumAdjustment
    push_u32(&mut out, 0x5F0F_3CF5); // magicNumber
    push_u16(&mut out, 0); // flags
    push_u16(&mut out, 1000); // unitsPerEm
    out.extend([0; 16]); // created, modified
    out.extend([0; 8]); // bbox
    push_u16(&mut out, 0); // macStyle
    push_u16(&mut out, 8); // lowestRecPPEM
    push_u16(&mut out, 2); // fontDirectionHint
    push_u16(&mut out, 0); // indexToLocFormat
    push_u16(&mut out, 0); // glyphDataFormat
    assert_eq!(out.len(), 54);
    out
}

fn hhea_table() -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000);
    push_u16(&mut out, 800); // ascender
    push_u16(&mut out, (-200i16) as u16); // descender
    out.extend([0; 26]);
    push_u16(&mut out, 1); // numberOfHMetrics
    assert_eq!(out.len(), 36);
    out
}

fn maxp_table() -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 0x0000_5000);
    push_u16(&mut out, 64);
    out
}

/// Writes one or more fonts as a plain sfnt or as a TTC collection.
pub(crate) fn write_sfnt(fonts: &[Vec<TableData>], collection: bool) -> Vec<u8> {
    let header_len = if collection { 12 + 4 * fonts.len() } else { 0 };
    let mut directory_offsets = Vec::new();
    let mut offset = header_len;
    for tables in fonts {
        directory_offsets.push(offset);
        offset += 12 + 16 * tables.len();
    }

    let mut table_offsets = Vec::new();
    for tables in fonts {
        let mut offsets = Vec::new();
        for (_, data) in tables {
            offsets.push(offset);
            offset += padded(data.len());
        }
        table_offsets.push(offsets);
    }

    let mut out: Vec<u8> = Vec::new();
    if collection {
        out.extend(b"ttcf");
        push_u32(&mut out, 0x0001_0000);
        push_u32(&mut out, fonts.len() as u32);
        for directory in &directory_offsets {
            push_u32(&mut out, *directory as u32);
        }
    }
    for (tables, offsets) in fonts.iter().zip(&table_offsets) {
        push_u32(&mut out, 0x0001_0000);
        push_u16(&mut out, tables.len() as u16);
        out.extend([0; 6]); // searchRange, entrySelector, rangeShift
        for ((tag, data), table_offset) in tables.iter().zip(offsets) {
            out.extend(tag);
            push_u32(&mut out, 0);
            push_u32(&mut out, *table_offset as u32);
            push_u32(&mut out, data.len() as u32);
        }
    }
    for tables in fonts {
        for (_, data) in tables {
            out.extend(data);
            out.resize(padded(out.len()), 0);
        }
    }
    out
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

/// Writes the fonts as a WOFF2 file, as a collection when more than one
/// font is given. No table is transformed.
pub(crate) fn write_woff2(fonts: &[Vec<TableData>]) -> Vec<u8> {
    let collection = fonts.len() > 1;
    let mut directory: Vec<u8> = Vec::new();
    let mut stream: Vec<u8> = Vec::new();
    let mut indices = Vec::new();
    let mut index = 0u16;
    for tables in fonts {
        let mut font_indices = Vec::new();
        for (tag, data) in tables {
            match known_tag_index(tag) {
                Some(known) => directory.push(known),
                None => {
                    directory.push(0x3F);
                    directory.extend(tag);
                }
            }
            push_base128(&mut directory, data.len() as u32);
            stream.extend(data);
            font_indices.push(index);
            index += 1;
        }
        indices.push(font_indices);
    }
    if collection {
        push_u32(&mut directory, 0x0001_0000);
        directory.push(fonts.len() as u8);
        for font_indices in &indices {
            directory.push(font_indices.len() as u8);
            push_u32(&mut directory, 0x0001_0000);
            for i in font_indices {
                directory.push(*i as u8);
            }
        }
    }

    let mut compressed = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
        writer.write_all(&stream).unwrap();
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend(b"wOF2");
    out.extend(if collection { *b"ttcf" } else { [0, 1, 0, 0] });
    push_u32(&mut out, (48 + directory.len() + compressed.len()) as u32);
    push_u16(&mut out, index);
    push_u16(&mut out, 0);
    push_u32(&mut out, stream.len() as u32);
    push_u32(&mut out, compressed.len() as u32);
    push_u16(&mut out, 1);
    push_u16(&mut out, 0);
    out.extend([0; 20]); // metadata and private blocks
    out.extend(directory);
    out.extend(compressed);
    out
}

fn known_tag_index(tag: &[u8; 4]) -> Option<u8> {
    match tag {
        b"cmap" => Some(0),
        b"head" => Some(1),
        b"hhea" => Some(2),
        b"maxp" => Some(4),
        b"name" => Some(5),
        _ => None,
    }
}

fn push_base128(out: &mut Vec<u8>, value: u32) {
    let mut bytes = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        bytes.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    bytes.reverse();
    out.extend(bytes);
}

/// Private dictionary whose `/CharStrings` dictionary holds `glyph_names`.
fn charstrings_private(glyph_names: &[&str]) -> Vec<u8> {
    let mut private: Vec<u8> = Vec::new();
    private.extend(b"dup /Private 8 dict dup begin\n");
    private.extend(b"/RD{string currentfile exch readstring pop}executeonly def\n");
    private.extend(b"/ND{noaccess def}executeonly def\n");
    private.extend(format!("2 index /CharStrings {} dict dup begin\n", glyph_names.len()).as_bytes());
    for name in glyph_names {
        // Charstring payloads are opaque; these bytes look like tokens on purpose.
        let payload = b"/end\n";
        private.extend(format!("/{} {} RD ", name, payload.len()).as_bytes());
        private.extend(payload);
        private.extend(b" ND\n");
    }
    private.extend(b"end\nend\nreadonly put\nnoaccess put\ndup /FontName get exch definefont pop\n");
    private.extend(b"mark currentfile closefile\n");
    private
}

/// Cleartext and eexec-encrypted halves of a Type 1 program with the given
/// private part.
fn type1_program(private: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut plain = b"\x8e\x21\x04\x7f".to_vec();
    plain.extend_from_slice(private);

    let mut cleartext: Vec<u8> = Vec::new();
    cleartext.extend(b"%!PS-AdobeFont-1.0: Fixture 001.000\n");
    cleartext.extend(b"/FontName /Fixture def\n/Encoding StandardEncoding def\n");
    cleartext.extend(b"currentfile eexec\n");
    (cleartext, eexec_encrypt(&plain))
}

/// Writes a PFA-style Type 1 program. The private part is hex encoded when
/// `hex` is set and raw binary otherwise.
pub(crate) fn write_type1(glyph_names: &[&str], hex: bool) -> Vec<u8> {
    write_type1_private(&charstrings_private(glyph_names), hex)
}

/// Like [`write_type1`], with a hand-written private part.
pub(crate) fn write_type1_private(private: &[u8], hex: bool) -> Vec<u8> {
    let (mut out, encrypted) = type1_program(private);
    if hex {
        for chunk in encrypted.chunks(32) {
            for byte in chunk {
                out.extend(format!("{:02x}", byte).as_bytes());
            }
            out.push(b'\n');
        }
    } else {
        out.extend(encrypted);
    }
    out.extend(b"\n");
    for _ in 0..8 {
        out.extend(b"0000000000000000000000000000000000000000000000000000000000000000\n");
    }
    out.extend(b"cleartomark\n");
    out
}

/// Writes the same program in PFB segment framing.
pub(crate) fn write_pfb(glyph_names: &[&str]) -> Vec<u8> {
    let (cleartext, encrypted) = type1_program(&charstrings_private(glyph_names));
    let mut out: Vec<u8> = Vec::new();
    out.extend([0x80, 1]);
    out.extend((cleartext.len() as u32).to_le_bytes());
    out.extend(&cleartext);
    out.extend([0x80, 2]);
    out.extend((encrypted.len() as u32).to_le_bytes());
    out.extend(&encrypted);
    out.extend([0x80, 3]);
    out
}

pub(crate) fn eexec_encrypt(plain: &[u8]) -> Vec<u8> {
    let mut r: u16 = 55665;
    plain
        .iter()
        .map(|&p| {
            let c = p ^ (r >> 8) as u8;
            r = (c as u16)
                .wrapping_add(r)
                .wrapping_mul(52845)
                .wrapping_add(22719);
            c
        })
        .collect()
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend(value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend(value.to_be_bytes());
}
