//! Adobe Glyph List mapping from glyph names to Unicode.
//! Covers the names used by the Latin base encodings and common ligatures;
//! `uniXXXX` and `uXXXX[XX]` names are decoded algorithmically.

use std::collections::HashMap;
use std::sync::LazyLock;

static GLYPH_TO_UNICODE: LazyLock<HashMap<String, char>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Basic Latin punctuation and digits
    for (name, c) in [
        ("space", ' '),
        ("exclam", '!'),
        ("quotedbl", '"'),
        ("numbersign", '#'),
        ("dollar", '$'),
        ("percent", '%'),
        ("ampersand", '&'),
        ("quotesingle", '\''),
        ("parenleft", '('),
        ("parenright", ')'),
        ("asterisk", '*'),
        ("plus", '+'),
        ("comma", ','),
        ("hyphen", '-'),
        ("period", '.'),
        ("slash", '/'),
        ("zero", '0'),
        ("one", '1'),
        ("two", '2'),
        ("three", '3'),
        ("four", '4'),
        ("five", '5'),
        ("six", '6'),
        ("seven", '7'),
        ("eight", '8'),
        ("nine", '9'),
        ("colon", ':'),
        ("semicolon", ';'),
        ("less", '<'),
        ("equal", '='),
        ("greater", '>'),
        ("question", '?'),
        ("at", '@'),
        ("bracketleft", '['),
        ("backslash", '\\'),
        ("bracketright", ']'),
        ("asciicircum", '^'),
        ("underscore", '_'),
        ("grave", '`'),
        ("braceleft", '{'),
        ("bar", '|'),
        ("braceright", '}'),
        ("asciitilde", '~'),
    ] {
        m.insert(name.to_string(), c);
    }

    // Letters name themselves
    for c in ('A'..='Z').chain('a'..='z') {
        m.insert(c.to_string(), c);
    }

    // Typographic punctuation
    for (name, c) in [
        ("quoteleft", '\u{2018}'),
        ("quoteright", '\u{2019}'),
        ("quotesinglbase", '\u{201a}'),
        ("quotedblleft", '\u{201c}'),
        ("quotedblright", '\u{201d}'),
        ("quotedblbase", '\u{201e}'),
        ("guilsinglleft", '\u{2039}'),
        ("guilsinglright", '\u{203a}'),
        ("guillemotleft", '\u{ab}'),
        ("guillemotright", '\u{bb}'),
        ("endash", '\u{2013}'),
        ("emdash", '\u{2014}'),
        ("bullet", '\u{2022}'),
        ("ellipsis", '\u{2026}'),
        ("dagger", '\u{2020}'),
        ("daggerdbl", '\u{2021}'),
        ("perthousand", '\u{2030}'),
        ("trademark", '\u{2122}'),
        ("minus", '\u{2212}'),
        ("fraction", '\u{2044}'),
        ("Euro", '\u{20ac}'),
        ("florin", '\u{192}'),
        ("circumflex", '\u{2c6}'),
        ("tilde", '\u{2dc}'),
        ("breve", '\u{2d8}'),
        ("caron", '\u{2c7}'),
        ("dotaccent", '\u{2d9}'),
        ("hungarumlaut", '\u{2dd}'),
        ("ogonek", '\u{2db}'),
        ("ring", '\u{2da}'),
        ("dotlessi", '\u{131}'),
        ("nbspace", '\u{a0}'),
    ] {
        m.insert(name.to_string(), c);
    }

    // Ligatures
    for (name, c) in [
        ("fi", '\u{fb01}'),
        ("fl", '\u{fb02}'),
        ("ff", '\u{fb00}'),
        ("ffi", '\u{fb03}'),
        ("ffl", '\u{fb04}'),
        ("OE", '\u{152}'),
        ("oe", '\u{153}'),
        ("AE", '\u{c6}'),
        ("ae", '\u{e6}'),
        ("germandbls", '\u{df}'),
    ] {
        m.insert(name.to_string(), c);
    }

    // Latin-1 supplement
    for (name, c) in [
        ("exclamdown", '\u{a1}'),
        ("cent", '\u{a2}'),
        ("sterling", '\u{a3}'),
        ("currency", '\u{a4}'),
        ("yen", '\u{a5}'),
        ("brokenbar", '\u{a6}'),
        ("section", '\u{a7}'),
        ("dieresis", '\u{a8}'),
        ("copyright", '\u{a9}'),
        ("ordfeminine", '\u{aa}'),
        ("logicalnot", '\u{ac}'),
        ("registered", '\u{ae}'),
        ("macron", '\u{af}'),
        ("degree", '\u{b0}'),
        ("plusminus", '\u{b1}'),
        ("twosuperior", '\u{b2}'),
        ("threesuperior", '\u{b3}'),
        ("acute", '\u{b4}'),
        ("mu", '\u{b5}'),
        ("paragraph", '\u{b6}'),
        ("periodcentered", '\u{b7}'),
        ("cedilla", '\u{b8}'),
        ("onesuperior", '\u{b9}'),
        ("ordmasculine", '\u{ba}'),
        ("onequarter", '\u{bc}'),
        ("onehalf", '\u{bd}'),
        ("threequarters", '\u{be}'),
        ("questiondown", '\u{bf}'),
        ("multiply", '\u{d7}'),
        ("divide", '\u{f7}'),
        ("Oslash", '\u{d8}'),
        ("oslash", '\u{f8}'),
        ("Eth", '\u{d0}'),
        ("eth", '\u{f0}'),
        ("Thorn", '\u{de}'),
        ("thorn", '\u{fe}'),
        ("Lslash", '\u{141}'),
        ("lslash", '\u{142}'),
        ("Scaron", '\u{160}'),
        ("scaron", '\u{161}'),
        ("Zcaron", '\u{17d}'),
        ("zcaron", '\u{17e}'),
        ("Ydieresis", '\u{178}'),
        ("ydieresis", '\u{ff}'),
    ] {
        m.insert(name.to_string(), c);
    }

    // Accented vowels, lowercase sits 0x20 above uppercase
    let accents = [
        ("grave", ['\u{c0}', '\u{c8}', '\u{cc}', '\u{d2}', '\u{d9}']),
        ("acute", ['\u{c1}', '\u{c9}', '\u{cd}', '\u{d3}', '\u{da}']),
        ("circumflex", ['\u{c2}', '\u{ca}', '\u{ce}', '\u{d4}', '\u{db}']),
        ("dieresis", ['\u{c4}', '\u{cb}', '\u{cf}', '\u{d6}', '\u{dc}']),
    ];
    for (accent, upper) in accents {
        for (base, c) in ['A', 'E', 'I', 'O', 'U'].into_iter().zip(upper) {
            let lower_base = base.to_ascii_lowercase();
            let lower = char::from_u32(c as u32 + 0x20).unwrap_or(c);
            m.insert(format!("{}{}", base, accent), c);
            m.insert(format!("{}{}", lower_base, accent), lower);
        }
    }
    for (name, c) in [
        ("Atilde", '\u{c3}'),
        ("atilde", '\u{e3}'),
        ("Aring", '\u{c5}'),
        ("aring", '\u{e5}'),
        ("Ccedilla", '\u{c7}'),
        ("ccedilla", '\u{e7}'),
        ("Ntilde", '\u{d1}'),
        ("ntilde", '\u{f1}'),
        ("Otilde", '\u{d5}'),
        ("otilde", '\u{f5}'),
        ("Yacute", '\u{dd}'),
        ("yacute", '\u{fd}'),
    ] {
        m.insert(name.to_string(), c);
    }

    m
});

/// Convert a glyph name to its Unicode character.
pub(crate) fn glyph_to_char(name: &str) -> Option<char> {
    if let Some(&c) = GLYPH_TO_UNICODE.get(name) {
        return Some(c);
    }

    // Suffixed variants such as "a.sc" or "one.oldstyle"
    if let Some((base, _)) = name.split_once('.') {
        if !base.is_empty() {
            return glyph_to_char(base);
        }
    }

    if let Some(hex) = name.strip_prefix("uni") {
        if let Some(code) = hex.get(..4).and_then(parse_hex) {
            return char::from_u32(code);
        }
    }

    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(code) = parse_hex(hex) {
                return char::from_u32(code);
            }
        }
    }

    None
}

fn parse_hex(digits: &str) -> Option<u32> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
