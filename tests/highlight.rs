mod common;

use common::{FONT_SIZE, GLYPH_ADVANCE, TestPage, TestPdf, WORDS, passage};
use lopdf::content::Content;
use lopdf::{Dictionary, Object};
use pdf_highlight::{
    BoundingBox, Canvas, Error, FillStyle, HighlightOptions, Highlighter, PdfCanvas, PdfPage,
    RecordingCanvas, StampMode, Viewport, decode_html_entities, from_bytes, load_pdf,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

fn num(o: &Object) -> f64 {
    match *o {
        Object::Integer(i) => i as f64,
        Object::Real(f) => f as f64,
        ref other => panic!("not a number: {:?}", other),
    }
}

fn re_operands(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> [f64; 4] {
    let page_dict = doc.get_dictionary(page_id).unwrap();
    let contents = page_dict.get(b"Contents").unwrap().as_array().unwrap();
    let last = contents.last().unwrap().as_reference().unwrap();
    let stream = doc.get_object(last).unwrap().as_stream().unwrap();
    let ops = Content::decode(&stream.content).unwrap().operations;
    let re = ops.iter().find(|op| op.operator == "re").unwrap();
    [0, 1, 2, 3].map(|i| num(&re.operands[i]))
}

/// Eleven passage words on one line followed by an unrelated word.
fn terminated_line() -> Vec<u8> {
    TestPdf::new()
        .page(
            TestPage::new()
                .words(&WORDS[..11], 700.)
                .text("unrelated", 72., 650.),
        )
        .to_bytes()
}

#[test_log::test]
fn terminated_run_is_painted() {
    let doc = from_bytes(&terminated_line()).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = RecordingCanvas::new();

    let highlights = Highlighter::default()
        .highlight_page(&page, &passage(), &mut canvas)
        .unwrap();

    assert_eq!(canvas.width(), 612.);
    assert_eq!(canvas.height(), 792.);
    assert_eq!(canvas.page_number(), Some(1));
    assert_eq!(highlights.len(), 1);
    assert_eq!(canvas.fills().len(), 1);

    let highlight = &highlights[0];
    assert_eq!(highlight.fragment_count, 11);
    assert_eq!(highlight.start, 0);
    assert_eq!(highlight.text, WORDS[..11].concat());

    // baseline at y = 700 maps to 92 on the canvas
    let rect = &canvas.fills()[0].rect;
    assert_eq!(*rect, highlight.rect);
    assert!(approx(rect.l, 72.));
    assert!(approx(rect.b, 92.));
    assert!(approx(rect.t, 92. - FONT_SIZE));
    let last_x = 72. + 40. * 10.;
    assert!(approx(rect.r, last_x + "eleven".len() as f64 * GLYPH_ADVANCE));
    assert_eq!(canvas.fills()[0].style, FillStyle::rgba(255, 255, 0, 0.5));
}

#[test]
fn run_at_threshold_is_not_painted() {
    let bytes = TestPdf::new()
        .page(
            TestPage::new()
                .words(&WORDS[..10], 700.)
                .text("unrelated", 72., 650.),
        )
        .to_bytes();
    let doc = from_bytes(&bytes).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = RecordingCanvas::new();

    let highlights = Highlighter::default()
        .highlight_page(&page, &passage(), &mut canvas)
        .unwrap();
    assert!(highlights.is_empty());
    assert!(canvas.fills().is_empty());
    // the page is still rendered
    assert_eq!(canvas.page_number(), Some(1));

    let lenient = Highlighter::new(HighlightOptions::builder().min_run_len(9).build());
    assert_eq!(
        lenient
            .highlight_page(&page, &passage(), &mut canvas)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn run_reaching_the_end_of_the_page_is_not_painted() {
    let bytes = TestPdf::new()
        .page(TestPage::new().words(&WORDS, 700.))
        .to_bytes();
    let doc = from_bytes(&bytes).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = RecordingCanvas::new();

    let highlights = Highlighter::default()
        .highlight_page(&page, &passage(), &mut canvas)
        .unwrap();
    assert!(highlights.is_empty());
}

#[test]
fn scale_and_colour_options_apply() {
    let doc = from_bytes(&terminated_line()).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = RecordingCanvas::new();
    let highlighter = Highlighter::new(
        HighlightOptions::builder()
            .scale(2.)
            .fill_style("#ff0000".parse().unwrap())
            .build(),
    );

    let highlights = highlighter
        .highlight_page(&page, &passage(), &mut canvas)
        .unwrap();
    assert_eq!(canvas.width(), 1224.);
    assert_eq!(highlights.len(), 1);
    let rect = &highlights[0].rect;
    assert!(approx(rect.l, 144.));
    assert!(approx(rect.b, 184.));
    assert!(approx(rect.t, 184. - 2. * FONT_SIZE));
    assert_eq!(canvas.fills()[0].style, FillStyle::rgba(255, 0, 0, 1.));
}

#[test]
fn escaped_passage_matches_after_decoding() {
    let bytes = TestPdf::new()
        .page(
            TestPage::new()
                .words(
                    &[
                        "Fish&chips", "with", "salt", "and", "vinegar", "at", "the", "seaside",
                        "cafe", "by", "moonlight",
                    ],
                    700.,
                )
                .text("unrelated", 72., 650.),
        )
        .to_bytes();
    let doc = from_bytes(&bytes).unwrap();
    let page = doc.get_page(1).unwrap();
    let escaped = "<p>Fish&amp;chips with salt and vinegar at the seaside cafe by moonlight</p>";

    // only the ten items after the escaped one match the raw markup
    let mut canvas = RecordingCanvas::new();
    let raw = Highlighter::default()
        .highlight_page(&page, escaped, &mut canvas)
        .unwrap();
    assert!(raw.is_empty());

    let decoded = decode_html_entities(escaped);
    assert_eq!(
        decoded,
        "Fish&chips with salt and vinegar at the seaside cafe by moonlight"
    );
    let decoded = Highlighter::default()
        .highlight_page(&page, &decoded, &mut canvas)
        .unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].fragment_count, 11);
    assert_eq!(decoded[0].start, 0);
}

#[test]
fn load_pdf_reads_from_disk() {
    let path = std::env::temp_dir().join(format!(
        "pdf-highlight-load-{}.pdf",
        std::process::id()
    ));
    std::fs::write(&path, terminated_line()).unwrap();

    let mut canvas = RecordingCanvas::new();
    let result = load_pdf(&path, &passage(), 1, &mut canvas);
    std::fs::remove_file(&path).ok();

    let highlighted = result.unwrap();
    assert_eq!(highlighted.highlights.len(), 1);
    assert_eq!(highlighted.document.page_count(), 1);
    assert_eq!(canvas.fills().len(), 1);

    let mut canvas = RecordingCanvas::new();
    assert!(matches!(
        load_pdf("/nonexistent/input.pdf", "text", 1, &mut canvas),
        Err(Error::Io(_)) | Err(Error::Pdf(_))
    ));
}

#[test]
fn canvas_requires_a_rendered_page() {
    let mut canvas = PdfCanvas::new(StampMode::Content);
    let rect = BoundingBox {
        t: 0.,
        r: 1.,
        b: 1.,
        l: 0.,
    };
    assert!(matches!(
        canvas.fill_rect(&rect, &FillStyle::default()),
        Err(Error::NoPageRendered)
    ));
}

#[test_log::test]
fn content_stamp_paints_into_the_page() {
    let doc = from_bytes(&terminated_line()).unwrap();
    let mut canvas = PdfCanvas::new(StampMode::Content);
    let mut highlighted = Highlighter::default()
        .highlight_document(doc, &passage(), 1, &mut canvas)
        .unwrap();
    assert_eq!(canvas.len(), 1);
    assert_eq!(canvas.stamp(&mut highlighted.document).unwrap(), 1);

    let mut bytes = Vec::new();
    highlighted.document.save_to(&mut bytes).unwrap();
    let reloaded = from_bytes(&bytes).unwrap();

    // the text layer is untouched
    let page = reloaded.get_page(1).unwrap();
    let content = page.get_text_content().unwrap();
    assert_eq!(content.len(), 12);

    let lopdf_doc = reloaded.document();
    let page_dict = lopdf_doc.get_dictionary(page.id()).unwrap();
    let contents = page_dict.get(b"Contents").unwrap().as_array().unwrap();
    assert_eq!(contents.len(), 3);

    let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
    assert!(resources.has(b"Font"));
    let ext_g_state = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
    let state = ext_g_state.get(b"GSHighlight0").unwrap().as_dict().unwrap();
    assert!(approx(num(state.get(b"ca").unwrap()), 0.5));

    let last = contents[2].as_reference().unwrap();
    let stream = lopdf_doc.get_object(last).unwrap().as_stream().unwrap();
    let ops = Content::decode(&stream.content).unwrap().operations;
    assert_eq!(ops[0].operator, "Q");
    let re = ops.iter().find(|op| op.operator == "re").unwrap();
    let [x, y, w, h] = [0, 1, 2, 3].map(|i| num(&re.operands[i]));
    assert!(approx(x, 72.));
    assert!(approx(y, 700.));
    assert!(approx(w, 400. + 6. * GLYPH_ADVANCE));
    assert!(approx(h, FONT_SIZE));

    let first = contents[0].as_reference().unwrap();
    let stream = lopdf_doc.get_object(first).unwrap().as_stream().unwrap();
    let ops = Content::decode(&stream.content).unwrap().operations;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].operator, "q");
}

#[test]
fn annotation_stamp_adds_highlight_annotations() {
    let doc = from_bytes(&terminated_line()).unwrap();
    let mut canvas = PdfCanvas::new(StampMode::Annotation);
    let mut highlighted = Highlighter::default()
        .highlight_document(doc, &passage(), 1, &mut canvas)
        .unwrap();
    canvas.stamp(&mut highlighted.document).unwrap();

    let mut bytes = Vec::new();
    highlighted.document.save_to(&mut bytes).unwrap();
    let reloaded = from_bytes(&bytes).unwrap();
    let page = reloaded.get_page(1).unwrap();
    let lopdf_doc = reloaded.document();
    let page_dict = lopdf_doc.get_dictionary(page.id()).unwrap();

    // content is left alone
    assert!(page_dict.get(b"Contents").unwrap().as_reference().is_ok());

    let annots = page_dict.get(b"Annots").unwrap().as_array().unwrap();
    assert_eq!(annots.len(), 1);
    let annot: &Dictionary = lopdf_doc
        .get_dictionary(annots[0].as_reference().unwrap())
        .unwrap();
    assert_eq!(annot.get(b"Subtype").unwrap().as_name().unwrap(), b"Highlight");
    assert!(approx(num(annot.get(b"CA").unwrap()), 0.5));

    let rect: Vec<f64> = annot
        .get(b"Rect")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(num)
        .collect();
    assert!(approx(rect[0], 72.));
    assert!(approx(rect[1], 700.));
    assert!(approx(rect[2], 472. + 6. * GLYPH_ADVANCE));
    assert!(approx(rect[3], 712.));

    let quad = annot.get(b"QuadPoints").unwrap().as_array().unwrap();
    assert_eq!(quad.len(), 8);
    assert!(approx(num(&quad[1]), 712.));
    assert!(approx(num(&quad[5]), 700.));
}

#[test]
fn rotated_page_swaps_canvas_size() {
    let bytes = TestPdf::new()
        .page(
            TestPage::new()
                .words(&WORDS[..11], 700.)
                .text("unrelated", 72., 650.)
                .rotate(90),
        )
        .to_bytes();
    let doc = from_bytes(&bytes).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = RecordingCanvas::new();

    let highlights = Highlighter::default()
        .highlight_page(&page, &passage(), &mut canvas)
        .unwrap();
    assert_eq!(canvas.width(), 792.);
    assert_eq!(canvas.height(), 612.);
    assert_eq!(highlights.len(), 1);
    // baselines run down the canvas at x = 700
    assert!(approx(highlights[0].rect.l, 700.));
}

#[test]
fn content_stamp_on_rotated_page_maps_back_to_user_space() {
    let bytes = TestPdf::new()
        .page(
            TestPage::new()
                .words(&WORDS[..11], 700.)
                .text("unrelated", 72., 650.)
                .rotate(90),
        )
        .to_bytes();
    let doc = from_bytes(&bytes).unwrap();
    let mut canvas = PdfCanvas::new(StampMode::Content);
    let mut highlighted = Highlighter::default()
        .highlight_document(doc, &passage(), 1, &mut canvas)
        .unwrap();

    // on the rotated canvas user x runs down and user y runs right
    let rect = &highlighted.highlights[0].rect;
    assert!(approx(rect.l, 700.));
    assert!(approx(rect.r, 700. + "eleven".len() as f64 * GLYPH_ADVANCE));
    assert!(approx(rect.t, 72. - FONT_SIZE));
    assert!(approx(rect.b, 472.));

    assert_eq!(canvas.stamp(&mut highlighted.document).unwrap(), 1);
    let mut out = Vec::new();
    highlighted.document.save_to(&mut out).unwrap();
    let reloaded = from_bytes(&out).unwrap();
    let page = reloaded.get_page(1).unwrap();
    assert_eq!(page.rotation(), 90);

    let [x, y, w, h] = re_operands(reloaded.document(), page.id());
    assert!(approx(x, 72. - FONT_SIZE));
    assert!(approx(y, 700.));
    assert!(approx(w, 400. + FONT_SIZE));
    assert!(approx(h, "eleven".len() as f64 * GLYPH_ADVANCE));
}

/// Counts renders so tests can tell how often a page was drawn.
#[derive(Default)]
struct CountingCanvas {
    renders: usize,
    inner: RecordingCanvas,
}

impl Canvas for CountingCanvas {
    fn render_page(
        &mut self,
        page: &PdfPage<'_>,
        viewport: &Viewport,
    ) -> pdf_highlight::Result<()> {
        self.renders += 1;
        self.inner.render_page(page, viewport)
    }

    fn fill_rect(&mut self, rect: &BoundingBox, style: &FillStyle) -> pdf_highlight::Result<()> {
        self.inner.fill_rect(rect, style)
    }
}

const SECOND_LINE: [&str; 11] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo",
];

fn two_lines() -> Vec<u8> {
    TestPdf::new()
        .page(
            TestPage::new()
                .words(&WORDS[..11], 700.)
                .words(&SECOND_LINE, 650.)
                .text("unrelated", 72., 600.),
        )
        .to_bytes()
}

#[test_log::test]
fn several_passages_share_one_render() {
    let doc = from_bytes(&two_lines()).unwrap();
    let page = doc.get_page(1).unwrap();
    let mut canvas = CountingCanvas::default();
    let targets = [passage(), SECOND_LINE.join(" "), "nothing here".to_owned()];

    let per_target = Highlighter::default()
        .highlight_page_many(&page, &targets, &mut canvas)
        .unwrap();
    assert_eq!(canvas.renders, 1);
    assert_eq!(per_target.len(), 3);
    assert_eq!(per_target[0].len(), 1);
    assert_eq!(per_target[0][0].start, 0);
    assert_eq!(per_target[1].len(), 1);
    assert_eq!(per_target[1][0].start, 11);
    assert_eq!(per_target[1][0].text, SECOND_LINE.concat());
    assert!(per_target[2].is_empty());
    assert_eq!(canvas.inner.fills().len(), 2);

    // second line sits 50pt lower on the page, so 50px further down the canvas
    let first = &per_target[0][0].rect;
    let second = &per_target[1][0].rect;
    assert!(approx(second.b - first.b, 50.));
}

#[test]
fn several_passages_are_stamped_in_order() {
    let doc = from_bytes(&two_lines()).unwrap();
    let mut canvas = PdfCanvas::new(StampMode::Annotation);
    let targets = vec![SECOND_LINE.join(" "), passage()];
    let mut highlighted = Highlighter::default()
        .highlight_document_many(doc, &targets, 1, &mut canvas)
        .unwrap();

    assert_eq!(highlighted.highlights.len(), 2);
    assert_eq!(highlighted.highlights[0].start, 11);
    assert_eq!(highlighted.highlights[1].start, 0);
    assert_eq!(canvas.stamp(&mut highlighted.document).unwrap(), 2);

    let lopdf_doc = highlighted.document.document();
    let page = highlighted.document.get_page(1).unwrap();
    let annots = lopdf_doc
        .get_dictionary(page.id())
        .unwrap()
        .get(b"Annots")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(annots.len(), 2);
}
