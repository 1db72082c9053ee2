use scraper::Html;

/// Turns an HTML fragment into the text a browser would show for it, the same
/// as assigning `innerHTML` and reading back `textContent`. The fragment goes
/// through a full HTML parser, so tags, comments and attributes are dropped and
/// character references are decoded with the browser's rules.
///
/// Escaped markup such as `&lt;b&gt;` survives as literal text.
///
/// ```
/// use pdf_highlight::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Fish &amp; <i>chips</i>"), "Fish & chips");
/// assert_eq!(decode_html_entities("&#8220;quoted&#x201D;"), "\u{201c}quoted\u{201d}");
/// ```
pub fn decode_html_entities(s: &str) -> String {
    Html::parse_fragment(s).root_element().text().collect()
}
