use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::slice::Iter;

use adobe_cmap_parser::{ByteMapping, CIDRange, CodeRange};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::glyph_names::glyph_to_char;
use crate::utils::*;

pub(crate) type CharCode = u32;

// Glyph space widths (thousandths of an em) used when a font carries none.
const FIXED_PITCH_WIDTH: f64 = 600.;
const PROPORTIONAL_WIDTH: f64 = 500.;

#[derive(Clone)]
pub(crate) struct PdfSimpleFont<'a> {
    font: &'a Dictionary,
    base_name: String,
    encoding: Vec<u16>,
    unicode_map: Option<HashMap<u32, String>>,
    widths: HashMap<CharCode, f64>,
    missing_width: f64,
    // Type3 glyph space to thousandths of text space
    width_scale: f64,
}

pub(crate) struct PdfCIDFont<'a> {
    font: &'a Dictionary,
    base_name: String,
    encoding: ByteMapping,
    to_unicode: Option<HashMap<u32, String>>,
    fallback_unicode: Option<HashMap<u32, String>>,
    widths: HashMap<CharCode, f64>,
    default_width: f64,
}

pub(crate) struct PdfFontIter<'a> {
    i: Iter<'a, u8>,
    font: &'a dyn PdfFont,
}

impl<'a> Iterator for PdfFontIter<'a> {
    type Item = (CharCode, u8);
    fn next(&mut self) -> Option<(CharCode, u8)> {
        self.font.next_char(&mut self.i)
    }
}

pub(crate) trait PdfFont: Debug {
    /// Horizontal advance of a glyph, in thousandths of text space units.
    fn get_width(&self, id: CharCode) -> f64;
    fn next_char(&self, iter: &mut Iter<u8>) -> Option<(CharCode, u8)>;
    fn decode_char(&self, char: CharCode) -> String;
    fn get_font_name(&self) -> &str;
}

impl<'a> dyn PdfFont + 'a {
    pub(crate) fn char_codes(&'a self, chars: &'a [u8]) -> PdfFontIter<'a> {
        PdfFontIter {
            i: chars.iter(),
            font: self,
        }
    }

    pub(crate) fn decode(&self, chars: &[u8]) -> String {
        self.char_codes(chars)
            .map(|x| self.decode_char(x.0))
            .collect()
    }
}

pub(crate) fn make_font<'a>(doc: &'a Document, font: &'a Dictionary) -> Rc<dyn PdfFont + 'a> {
    let subtype = maybe_get_name_string(doc, font, b"Subtype").unwrap_or_default();
    debug!("MakeFont({})", subtype);
    if subtype == "Type0" {
        Rc::new(PdfCIDFont::new(doc, font))
    } else {
        Rc::new(PdfSimpleFont::new(doc, font))
    }
}

fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

fn encoding_to_unicode_table(name: &[u8]) -> Vec<u16> {
    match name {
        b"WinAnsiEncoding" => win_ansi_table(),
        b"MacRomanEncoding" => mac_roman_table(),
        b"StandardEncoding" => standard_table(),
        _ => {
            debug!(
                "unsupported base encoding {:?}, using PDFDocEncoding",
                pdf_to_utf8(name)
            );
            PDF_DOC_ENCODING.to_vec()
        }
    }
}

/// The encoding a simple font uses when its dictionary names none.
fn builtin_encoding(doc: &Document, descriptor: Option<&Dictionary>, subtype: &str) -> Vec<u16> {
    let font_file = descriptor.and_then(|d| maybe_get_obj(doc, d, b"FontFile"));
    if let Some(Object::Stream(s)) = font_file {
        let contents = get_contents(s);
        if let Ok(type1_encoding) = type1_encoding_parser::get_encoding_map(&contents) {
            debug!("type1encoding");
            let mut table = standard_table();
            for (code, name) in type1_encoding {
                let name = String::from_utf8_lossy(&name);
                let Some(slot) = table.get_mut(code as usize) else {
                    continue;
                };
                match glyph_to_char(&name) {
                    Some(c) if (c as u32) <= 0xffff => *slot = c as u16,
                    _ => debug!("unknown character {}", name),
                }
            }
            return table;
        }
        warn!("could not read the built-in encoding of an embedded Type1 font");
    }

    match subtype {
        "TrueType" => win_ansi_table(),
        "Type1" | "MMType1" => standard_table(),
        _ => PDF_DOC_ENCODING.to_vec(),
    }
}

fn apply_differences(doc: &Document, encoding: &Dictionary, table: &mut [u16], base_name: &str) {
    let Some(differences) = maybe_get_array(doc, encoding, b"Differences") else {
        return;
    };
    debug!("Differences");
    let mut code: i64 = 0;
    for o in differences {
        match maybe_deref(doc, o) {
            &Object::Integer(i) => code = i,
            Object::Name(n) => {
                let name = pdf_to_utf8(n);
                let unicode = glyph_to_char(&name)
                    .filter(|&c| (c as u32) <= 0xffff)
                    .map(|c| c as u16);
                if unicode.is_none() {
                    debug!("unknown glyph name '{}' for font {}", name, base_name);
                }
                if let Some(slot) = usize::try_from(code).ok().and_then(|i| table.get_mut(i)) {
                    *slot = unicode.unwrap_or(0);
                }
                code = code.saturating_add(1);
            }
            other => {
                warn!("unexpected Differences entry {:?}", other);
            }
        }
    }
}

fn fallback_width(base_name: &str) -> f64 {
    if strip_subset_prefix(base_name).starts_with("Courier") {
        FIXED_PITCH_WIDTH
    } else {
        debug!("no widths for {}, assuming {}", base_name, PROPORTIONAL_WIDTH);
        PROPORTIONAL_WIDTH
    }
}

impl<'a> PdfSimpleFont<'a> {
    fn new(doc: &'a Document, font: &'a Dictionary) -> PdfSimpleFont<'a> {
        let base_name = maybe_get_name_string(doc, font, b"BaseFont").unwrap_or_default();
        let subtype = maybe_get_name_string(doc, font, b"Subtype").unwrap_or_default();
        let descriptor: Option<&Dictionary> = maybe_get(doc, font, b"FontDescriptor");
        debug!("base_name {} {}", base_name, subtype);

        let encoding = match maybe_get_obj(doc, font, b"Encoding") {
            Some(Object::Name(name)) => {
                debug!("encoding {:?}", pdf_to_utf8(name));
                encoding_to_unicode_table(name)
            }
            Some(Object::Dictionary(dict)) => {
                let mut table = match maybe_get_name(doc, dict, b"BaseEncoding") {
                    Some(base_encoding) => encoding_to_unicode_table(base_encoding),
                    None => builtin_encoding(doc, descriptor, &subtype),
                };
                apply_differences(doc, dict, &mut table, &base_name);
                table
            }
            _ => builtin_encoding(doc, descriptor, &subtype),
        };

        let mut widths = HashMap::new();
        if let (Some(first_char), Some(w)) = (
            maybe_get::<i64>(doc, font, b"FirstChar"),
            maybe_get::<Vec<f64>>(doc, font, b"Widths"),
        ) {
            for (i, w) in w.into_iter().enumerate() {
                let code = i64::try_from(i)
                    .ok()
                    .and_then(|i| first_char.checked_add(i))
                    .and_then(|code| CharCode::try_from(code).ok());
                match code {
                    Some(code) => {
                        widths.insert(code, w);
                    }
                    None => {
                        warn!("/Widths entry {} past FirstChar {} is out of range", i, first_char);
                        break;
                    }
                }
            }
        }

        let missing_width = descriptor
            .and_then(|d| maybe_get::<f64>(doc, d, b"MissingWidth"))
            .unwrap_or_else(|| {
                if widths.is_empty() {
                    fallback_width(&base_name)
                } else {
                    0.
                }
            });

        let width_scale = if subtype == "Type3" {
            maybe_get::<Vec<f64>>(doc, font, b"FontMatrix")
                .and_then(|m| m.first().copied())
                .map(|a| a * 1000.)
                .unwrap_or(1.)
        } else {
            1.
        };

        PdfSimpleFont {
            font,
            base_name,
            encoding,
            unicode_map: get_unicode_map(doc, font),
            widths,
            missing_width,
            width_scale,
        }
    }
}

impl<'a> PdfFont for PdfSimpleFont<'a> {
    fn get_width(&self, id: CharCode) -> f64 {
        let width = self.widths.get(&id).copied().unwrap_or_else(|| {
            debug!(
                "missing width for {} in {}, falling back to {}",
                id, self.base_name, self.missing_width
            );
            self.missing_width
        });
        width * self.width_scale
    }

    fn next_char(&self, iter: &mut Iter<u8>) -> Option<(CharCode, u8)> {
        iter.next().map(|x| (*x as CharCode, 1))
    }

    fn decode_char(&self, char: CharCode) -> String {
        if let Some(s) = self.unicode_map.as_ref().and_then(|m| m.get(&char)) {
            return s.nfkc().collect();
        }
        to_utf8(&self.encoding, &[char as u8]).nfkc().collect()
    }

    fn get_font_name(&self) -> &str {
        &self.base_name
    }
}

impl<'a> fmt::Debug for PdfSimpleFont<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.font.fmt(f)
    }
}

fn get_unicode_map(doc: &Document, font: &Dictionary) -> Option<HashMap<u32, String>> {
    match maybe_get_obj(doc, font, b"ToUnicode")? {
        Object::Stream(stream) => {
            let contents = get_contents(stream);
            let Ok(cmap) = adobe_cmap_parser::get_unicode_map(&contents) else {
                warn!(
                    "unparseable ToUnicode CMap for {:?}",
                    maybe_get_name_string(doc, font, b"BaseFont")
                );
                return None;
            };

            let mut unicode = HashMap::new();
            for (&k, v) in cmap.iter() {
                let be: Vec<u16> = v
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                // lone surrogates
                if matches!(be.as_slice(), [0xd800..=0xdfff]) {
                    continue;
                }
                unicode.insert(k, String::from_utf16_lossy(&be));
            }
            debug!("ToUnicode map with {} entries", unicode.len());
            Some(unicode)
        }
        Object::Name(name) => {
            debug!("ToUnicode name {:?} ignored", pdf_to_utf8(name));
            None
        }
        other => {
            warn!("unsupported ToUnicode {:?}", other);
            None
        }
    }
}

/// Builds a CID to text map from the `cmap` table of an embedded TrueType
/// font, for composite fonts that lack (parts of) a ToUnicode CMap.
fn get_fallback_unicode_from_font(
    doc: &Document,
    ciddict: &Dictionary,
) -> Option<HashMap<u32, String>> {
    let font_descriptor: &Dictionary = maybe_get(doc, ciddict, b"FontDescriptor")?;

    let cid_to_gid: Option<HashMap<u32, u32>> = match maybe_get_obj(doc, ciddict, b"CIDToGIDMap")
    {
        Some(Object::Stream(stream)) => {
            let data = get_contents(stream);
            let map = data
                .chunks_exact(2)
                .enumerate()
                .map(|(cid, chunk)| (cid as u32, u16::from_be_bytes([chunk[0], chunk[1]]) as u32))
                .filter(|&(_, gid)| gid != 0)
                .collect();
            Some(map)
        }
        _ => None,
    };

    let font_stream = maybe_get_obj(doc, font_descriptor, b"FontFile2")
        .or_else(|| maybe_get_obj(doc, font_descriptor, b"FontFile3"));
    let Some(Object::Stream(stream)) = font_stream else {
        return None;
    };
    let font_data = get_contents(stream);
    let face = ttf_parser::Face::parse(&font_data, 0).ok()?;

    for subtable in face.tables().cmap.iter().flat_map(|cmap| cmap.subtables) {
        let is_unicode = matches!(
            (subtable.platform_id, subtable.encoding_id),
            (ttf_parser::PlatformId::Unicode, _)
                | (ttf_parser::PlatformId::Windows, 1)
                | (ttf_parser::PlatformId::Windows, 10)
        );
        if !is_unicode {
            continue;
        }

        let mut gid_to_unicode: HashMap<u32, String> = HashMap::new();
        subtable.codepoints(|codepoint| {
            if let (Some(gid), Some(c)) = (subtable.glyph_index(codepoint), char::from_u32(codepoint)) {
                gid_to_unicode.entry(gid.0 as u32).or_insert_with(|| c.to_string());
            }
        });

        let fallback_map: HashMap<u32, String> = match cid_to_gid {
            Some(ref cid_to_gid) => cid_to_gid
                .iter()
                .filter_map(|(&cid, gid)| gid_to_unicode.get(gid).map(|s| (cid, s.clone())))
                .collect(),
            None => gid_to_unicode,
        };

        if !fallback_map.is_empty() {
            debug!(
                "Built fallback Unicode map from embedded font with {} entries",
                fallback_map.len()
            );
            return Some(fallback_map);
        }
    }

    None
}

fn identity_mapping() -> ByteMapping {
    ByteMapping {
        codespace: vec![CodeRange {
            width: 2,
            start: 0,
            end: 0xffff,
        }],
        cid: vec![CIDRange {
            src_code_lo: 0,
            src_code_hi: 0xffff,
            dst_CID_lo: 0,
        }],
    }
}

fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<CharCode, f64> {
    const MAX_RANGE: i64 = 0x10000;

    let mut widths = HashMap::new();
    let mut i = 0;
    while i < w.len() {
        let Some(first) = i64::from_obj(doc, &w[i]) else {
            break;
        };
        if first < 0 {
            warn!("negative /W start {}", first);
            break;
        }
        match w.get(i + 1).map(|o| maybe_deref(doc, o)) {
            Some(Object::Array(list)) => {
                for (j, o) in list.iter().enumerate() {
                    let cid = i64::try_from(j)
                        .ok()
                        .and_then(|j| first.checked_add(j))
                        .and_then(|cid| CharCode::try_from(cid).ok());
                    let Some(cid) = cid else {
                        warn!("/W list starting at {} is out of range", first);
                        break;
                    };
                    if let Some(width) = f64::from_obj(doc, o) {
                        widths.insert(cid, width);
                    }
                }
                i += 2;
            }
            Some(_) => {
                let last = w.get(i + 1).and_then(|o| i64::from_obj(doc, o));
                let width = w.get(i + 2).and_then(|o| f64::from_obj(doc, o));
                let (Some(last), Some(width)) = (last, width) else {
                    warn!("malformed /W entry at {}", i);
                    break;
                };
                if last.checked_sub(first).is_none_or(|span| span > MAX_RANGE) {
                    warn!("oversized /W range {}..{}", first, last);
                    break;
                }
                for cid in first..=last {
                    let Ok(cid) = CharCode::try_from(cid) else {
                        break;
                    };
                    widths.insert(cid, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

impl<'a> PdfCIDFont<'a> {
    fn new(doc: &'a Document, font: &'a Dictionary) -> PdfCIDFont<'a> {
        let base_name = maybe_get_name_string(doc, font, b"BaseFont").unwrap_or_default();
        let ciddict: Option<&Dictionary> = maybe_get_array(doc, font, b"DescendantFonts")
            .and_then(|descendants| descendants.first())
            .and_then(|d| FromObj::from_obj(doc, d));
        debug!("base_name {} {:?}", base_name, font);

        let encoding = match maybe_get_obj(doc, font, b"Encoding") {
            Some(Object::Name(name)) => {
                let name = pdf_to_utf8(name);
                if name != "Identity-H" && name != "Identity-V" {
                    warn!("unsupported CMap {}, treating codes as two-byte CIDs", name);
                }
                identity_mapping()
            }
            Some(Object::Stream(stream)) => {
                let contents = get_contents(stream);
                adobe_cmap_parser::get_byte_mapping(&contents)
                    .ok()
                    .unwrap_or_else(|| {
                        warn!("unparseable encoding CMap for {}", base_name);
                        identity_mapping()
                    })
            }
            _ => {
                warn!("Type0 font {} without Encoding", base_name);
                identity_mapping()
            }
        };

        let (widths, default_width, fallback_unicode) = match ciddict {
            Some(ciddict) => {
                let widths = maybe_get_array(doc, ciddict, b"W")
                    .map(|w| parse_cid_widths(doc, w))
                    .unwrap_or_default();
                let default_width = maybe_get::<f64>(doc, ciddict, b"DW").unwrap_or(1000.);
                (
                    widths,
                    default_width,
                    get_fallback_unicode_from_font(doc, ciddict),
                )
            }
            None => {
                warn!("Type0 font {} without descendant font", base_name);
                (HashMap::new(), 1000., None)
            }
        };

        PdfCIDFont {
            font,
            base_name,
            encoding,
            to_unicode: get_unicode_map(doc, font),
            fallback_unicode,
            widths,
            default_width,
        }
    }
}

impl<'a> PdfFont for PdfCIDFont<'a> {
    fn get_width(&self, id: CharCode) -> f64 {
        self.widths.get(&id).copied().unwrap_or(self.default_width)
    }

    fn next_char(&self, iter: &mut Iter<u8>) -> Option<(CharCode, u8)> {
        let mut c = *iter.next()? as u32;
        let mut code = None;
        for width in 1..=4 {
            if self
                .encoding
                .codespace
                .iter()
                .any(|range| range.width == width && c >= range.start && c <= range.end)
            {
                code = Some((c, width as u8));
                break;
            }
            if width == 4 {
                break;
            }
            c = (c << 8) | *iter.next()? as u32;
        }
        let (code, width) = code?;
        for range in &self.encoding.cid {
            if code >= range.src_code_lo && code <= range.src_code_hi {
                return Some((code - range.src_code_lo + range.dst_CID_lo, width));
            }
        }
        // unmapped codes select .notdef
        Some((0, width))
    }

    fn decode_char(&self, char: CharCode) -> String {
        if let Some(s) = self.to_unicode.as_ref().and_then(|x| x.get(&char)) {
            if !s.is_empty() && !s.contains('\0') {
                return s.nfkc().collect();
            }
        }

        if let Some(s) = self.fallback_unicode.as_ref().and_then(|x| x.get(&char)) {
            debug!("Using embedded font cmap fallback for char {}: {:?}", char, s);
            return s.nfkc().collect();
        }

        debug!("Unknown character {} (no mapping found)", char);
        String::new()
    }

    fn get_font_name(&self) -> &str {
        &self.base_name
    }
}

impl<'a> fmt::Debug for PdfCIDFont<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.font.fmt(f)
    }
}
