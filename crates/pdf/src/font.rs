//! Embedded TrueType font: metrics for layout and PDF font objects.
//!
//! Text is written with a Type0 font over a CIDFontType2 descendant using the
//! Identity-H encoding, so each character becomes its two-byte glyph id. The
//! glyphs actually used are tracked to emit the width array and a ToUnicode
//! map, which keeps the text searchable and copyable.

use guiador_core::{Error, Result, TextMeasure};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use ttf_parser::{name_id, Face, GlyphId};

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Fallback PostScript name when the font carries none.
const DEFAULT_FONT_NAME: &str = "DejaVuSans";

/// A parsed TrueType font borrowed from its file bytes.
pub struct PdfFont<'a> {
    data: &'a [u8],
    face: Face<'a>,
    /// Glyph ids used so far, with the first character that mapped to each.
    used: BTreeMap<u16, char>,
    /// Characters the font has no glyph for.
    missing: BTreeSet<char>,
}

impl<'a> PdfFont<'a> {
    /// Parse font bytes. Anything that is not a usable TrueType face is a
    /// `RenderError`, since no text can be shaped without it.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let face = Face::parse(data, 0)
            .map_err(|e| Error::RenderError(format!("invalid font file: {}", e)))?;
        Ok(Self {
            data,
            face,
            used: BTreeMap::new(),
            missing: BTreeSet::new(),
        })
    }

    fn glyph(&self, c: char) -> GlyphId {
        self.face.glyph_index(c).unwrap_or(GlyphId(0))
    }

    /// Advance width of a glyph in 1/1000 of the font size.
    fn advance(&self, glyph: GlyphId) -> f32 {
        let advance = self.face.glyph_hor_advance(glyph).unwrap_or(0) as f32;
        advance * 1000.0 / self.face.units_per_em() as f32
    }

    fn scaled(&self, value: i16) -> i64 {
        (value as f32 * 1000.0 / self.face.units_per_em() as f32).round() as i64
    }

    /// Encode text as a hex string of glyph ids, recording the glyphs used.
    pub fn encode(&mut self, text: &str) -> Object {
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let glyph = self.glyph(c);
            if glyph.0 == 0 && self.missing.insert(c) {
                log::warn!("font has no glyph for {:?}", c);
            }
            self.used.entry(glyph.0).or_insert(c);
            bytes.extend_from_slice(&glyph.0.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    /// PostScript name with characters PDF names cannot hold removed.
    fn base_name(&self) -> String {
        let name = self
            .face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .unwrap_or_default();
        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if name.is_empty() {
            DEFAULT_FONT_NAME.to_string()
        } else {
            name
        }
    }

    /// Add the font objects to `doc` and return the Type0 font reference.
    ///
    /// Call after all text has been encoded so the width array and the
    /// ToUnicode map cover every glyph.
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let base_name = self.base_name();

        let font_file = Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.to_vec(),
        );
        let font_file_id = doc.add_object(font_file);

        let bbox = self.face.global_bounding_box();
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_name.as_str(),
            "Flags" => 32,
            "FontBBox" => vec![
                self.scaled(bbox.x_min).into(),
                self.scaled(bbox.y_min).into(),
                self.scaled(bbox.x_max).into(),
                self.scaled(bbox.y_max).into(),
            ],
            "ItalicAngle" => 0,
            "Ascent" => self.scaled(self.face.ascender()),
            "Descent" => self.scaled(self.face.descender()),
            "CapHeight" => self.scaled(self.face.capital_height().unwrap_or(self.face.ascender())),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let widths: Vec<Object> = self
            .used
            .keys()
            .flat_map(|&gid| {
                let width = self.advance(GlyphId(gid)).round() as i64;
                [Object::Integer(gid as i64), Object::Array(vec![width.into()])]
            })
            .collect();

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_name.as_str(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&self.used).into_bytes()));

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_name.as_str(),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font_id.into()],
            "ToUnicode" => to_unicode_id,
        })
    }
}

impl TextMeasure for PdfFont<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.advance(self.glyph(c))).sum();
        units / 1000.0 * font_size / POINTS_PER_MM
    }
}

/// CMap from glyph ids back to Unicode.
///
/// Glyph 0 stands for every character the font lacks, so it maps to nothing.
fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().filter(|(gid, _)| **gid != 0).collect();
    // bfchar blocks hold at most 100 entries.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (gid, c) in chunk {
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16_hex(**c));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// UTF-16BE code units of a character as uppercase hex.
fn utf16_hex(c: char) -> String {
    let mut buf = [0u16; 2];
    c.encode_utf16(&mut buf)
        .iter()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}
