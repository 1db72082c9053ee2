//! Finding runs of text items that belong to a passage and painting over them.
//!
//! A page's text items are scanned in content stream order. Consecutive items
//! whose string occurs somewhere in the target passage form a run; a run is
//! painted once a non-matching item ends it, provided it is longer than
//! [`HighlightOptions::min_run_len`] items. The run still open when the page
//! ends is never painted.

use std::path::Path;

use tracing::{debug, info};

use crate::canvas::{Canvas, FillStyle};
use crate::document::{PdfDocument, PdfPage, from_path};
use crate::error::Result;
use crate::types::{BoundingBox, TextItem};
use crate::viewport::Viewport;

pub const DEFAULT_MIN_RUN_LEN: usize = 10;
pub const DEFAULT_SCALE: f64 = 1.0;

// Seeds for the bounding box fold. Coordinates past the page's right or bottom
// edge still grow the box, while the maximum never drops below the canvas
// origin.
const FOLD_MIN_SEED: f64 = 1_000_000.;
const FOLD_MAX_SEED: f64 = 0.;

/// Builder for [`HighlightOptions`].
///
/// # Examples
///
/// ```
/// use pdf_highlight::HighlightOptions;
///
/// let options = HighlightOptions::builder()
///     .min_run_len(3)
///     .fill_style("rgba(255, 0, 0, 0.3)".parse()?)
///     .scale(2.0)
///     .build();
/// assert_eq!(options.min_run_len(), 3);
/// # Ok::<(), pdf_highlight::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct HighlightOptionsBuilder {
    options: HighlightOptions,
}

impl HighlightOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A run is painted only when it holds more than this many items.
    pub fn min_run_len(mut self, min_run_len: usize) -> Self {
        self.options.min_run_len = min_run_len;
        self
    }

    pub fn fill_style(mut self, fill_style: FillStyle) -> Self {
        self.options.fill_style = fill_style;
        self
    }

    /// Viewport scale; canvas pixels per PDF point.
    pub fn scale(mut self, scale: f64) -> Self {
        self.options.scale = scale;
        self
    }

    pub fn build(self) -> HighlightOptions {
        self.options
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOptions {
    min_run_len: usize,
    fill_style: FillStyle,
    scale: f64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        HighlightOptions {
            min_run_len: DEFAULT_MIN_RUN_LEN,
            fill_style: FillStyle::default(),
            scale: DEFAULT_SCALE,
        }
    }
}

impl HighlightOptions {
    pub fn builder() -> HighlightOptionsBuilder {
        HighlightOptionsBuilder::new()
    }

    pub fn min_run_len(&self) -> usize {
        self.min_run_len
    }

    pub fn fill_style(&self) -> &FillStyle {
        &self.fill_style
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Consecutive text items that all occur in the target passage.
#[derive(Debug, Clone, Copy)]
pub struct HighlightRun<'a> {
    start: usize,
    items: &'a [TextItem],
}

impl<'a> HighlightRun<'a> {
    /// Index of the run's first item in the page's text content.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn items(&self) -> &'a [TextItem] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn text(&self) -> String {
        self.items.iter().map(|item| item.text.as_str()).collect()
    }

    /// Canvas space box around every item of the run.
    ///
    /// Each item's origin is mapped through the viewport; the item then spans
    /// `width` to the right of it and `height` above it, both scaled.
    pub fn bounding_box(&self, viewport: &Viewport) -> BoundingBox {
        let scale = viewport.scale();
        let mut bbox = BoundingBox {
            t: FOLD_MIN_SEED,
            r: FOLD_MAX_SEED,
            b: FOLD_MAX_SEED,
            l: FOLD_MIN_SEED,
        };
        for item in self.items {
            let origin = item.origin();
            let p = viewport.convert_to_viewport_point(origin.x, origin.y);
            let w = item.width * scale;
            let h = item.height * scale;
            bbox.l = bbox.l.min(p.x);
            bbox.t = bbox.t.min(p.y - h);
            bbox.r = bbox.r.max(p.x + w);
            bbox.b = bbox.b.max(p.y);
        }
        bbox
    }
}

/// Splits `items` into the runs that would be painted for `target`.
///
/// An item matches when its text is a substring of `target`; an empty item
/// therefore always matches. Only runs closed by a non-matching item and
/// longer than `min_run_len` are returned.
pub fn find_highlight_runs<'a>(
    items: &'a [TextItem],
    target: &str,
    min_run_len: usize,
) -> Vec<HighlightRun<'a>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut len = 0;

    for (i, item) in items.iter().enumerate() {
        if target.contains(item.text.as_str()) {
            if len == 0 {
                start = i;
            }
            len += 1;
            continue;
        }
        if len > min_run_len {
            runs.push(HighlightRun {
                start,
                items: &items[start..start + len],
            });
        } else if len > 0 {
            debug!("dropping run of {} items at {}", len, start);
        }
        len = 0;
    }
    if len > 0 {
        debug!("discarding unterminated run of {} items at {}", len, start);
    }
    runs
}

/// A rectangle painted over a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    /// Canvas space rectangle.
    pub rect: BoundingBox,
    pub text: String,
    /// Index of the run's first text item.
    pub start: usize,
    pub fragment_count: usize,
}

/// Highlights passages on pages with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    options: HighlightOptions,
}

impl Highlighter {
    pub fn new(options: HighlightOptions) -> Self {
        Highlighter { options }
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    /// Renders `page` onto `canvas` and paints every run of `target` on it.
    pub fn highlight_page<C: Canvas + ?Sized>(
        &self,
        page: &PdfPage<'_>,
        target: &str,
        canvas: &mut C,
    ) -> Result<Vec<Highlight>> {
        let mut per_target = self.highlight_page_many(page, &[target], canvas)?;
        Ok(per_target.pop().unwrap_or_default())
    }

    /// Renders `page` onto `canvas` once and paints the runs of each target in
    /// turn. The result holds one list of highlights per target, in order.
    pub fn highlight_page_many<C: Canvas + ?Sized, S: AsRef<str>>(
        &self,
        page: &PdfPage<'_>,
        targets: &[S],
        canvas: &mut C,
    ) -> Result<Vec<Vec<Highlight>>> {
        let viewport = page.get_viewport(self.options.scale)?;
        canvas.render_page(page, &viewport)?;

        let content = page.get_text_content()?;
        let mut per_target = Vec::with_capacity(targets.len());
        for target in targets {
            let runs =
                find_highlight_runs(content.items(), target.as_ref(), self.options.min_run_len);

            let mut highlights = Vec::with_capacity(runs.len());
            for run in runs {
                let rect = run.bounding_box(&viewport);
                canvas.fill_rect(&rect, &self.options.fill_style)?;
                let text = run.text();
                info!("page {}: highlighted {:?}", page.page_number(), text);
                highlights.push(Highlight {
                    rect,
                    text,
                    start: run.start(),
                    fragment_count: run.len(),
                });
            }
            per_target.push(highlights);
        }
        Ok(per_target)
    }

    /// Opens `path` and highlights `target` on one page of it.
    pub fn highlight_path<P: AsRef<Path>, C: Canvas + ?Sized>(
        &self,
        path: P,
        target: &str,
        page_number: u32,
        canvas: &mut C,
    ) -> Result<Highlighted> {
        let document = from_path(path)?;
        self.highlight_document(document, target, page_number, canvas)
    }

    /// Highlights `target` on one page of an opened document.
    pub fn highlight_document<C: Canvas + ?Sized>(
        &self,
        document: PdfDocument,
        target: &str,
        page_number: u32,
        canvas: &mut C,
    ) -> Result<Highlighted> {
        self.highlight_document_many(document, &[target], page_number, canvas)
    }

    /// Highlights several passages on one page of an opened document. The page
    /// is rendered once and the highlights are listed in target order.
    pub fn highlight_document_many<C: Canvas + ?Sized, S: AsRef<str>>(
        &self,
        document: PdfDocument,
        targets: &[S],
        page_number: u32,
        canvas: &mut C,
    ) -> Result<Highlighted> {
        let highlights = {
            let page = document.get_page(page_number)?;
            self.highlight_page_many(&page, targets, canvas)?
        };
        Ok(Highlighted {
            document,
            highlights: highlights.into_iter().flatten().collect(),
        })
    }
}

/// A document together with the highlights painted on it.
#[derive(Debug)]
pub struct Highlighted {
    pub document: PdfDocument,
    pub highlights: Vec<Highlight>,
}

/// Opens the PDF at `path`, renders page `page_number` onto `canvas` at scale
/// 1 and paints over every long run of text items found in `text`.
///
/// This is a convenience function equivalent to
/// `Highlighter::default().highlight_path(path, text, page_number, canvas)`.
///
/// # Examples
///
/// ```no_run
/// use pdf_highlight::{RecordingCanvas, load_pdf};
///
/// let mut canvas = RecordingCanvas::new();
/// let result = load_pdf("paper.pdf", "the quoted passage", 3, &mut canvas)?;
/// for highlight in &result.highlights {
///     println!("{} {}", highlight.rect, highlight.text);
/// }
/// # Ok::<(), pdf_highlight::Error>(())
/// ```
pub fn load_pdf<P: AsRef<Path>, C: Canvas + ?Sized>(
    path: P,
    text: &str,
    page_number: u32,
    canvas: &mut C,
) -> Result<Highlighted> {
    Highlighter::default().highlight_path(path, text, page_number, canvas)
}

impl From<Highlighted> for PdfDocument {
    fn from(h: Highlighted) -> Self {
        h.document
    }
}
