//! PDF passage highlighting library
//!
//! This library opens a PDF page, extracts its positioned text items and paints
//! translucent rectangles over the runs of items that belong to a given
//! passage, either onto a recording canvas or into the PDF itself.

mod canvas;
mod document;
mod entities;
mod error;
mod fonts;
mod glyph_names;
mod highlight;
mod output;
mod processor;
mod stamp;
mod types;
mod utils;
mod viewport;

// Re-export error type
pub use error::{Error, Result};

// Re-export document API
pub use document::{
    PdfDocument, PdfDocumentBuilder, PdfDocumentLoader, PdfPage, from_bytes, from_path,
    from_reader,
};

// Re-export highlighting API
pub use highlight::{
    DEFAULT_MIN_RUN_LEN, DEFAULT_SCALE, Highlight, HighlightOptions, HighlightOptionsBuilder,
    HighlightRun, Highlighted, Highlighter, find_highlight_runs, load_pdf,
};

// Re-export canvases
pub use canvas::{Canvas, DEFAULT_FILL_STYLE, FillStyle, FilledRect, RecordingCanvas};
pub use stamp::{PdfCanvas, StampMode};

pub use entities::decode_html_entities;

// Re-export public types
pub use types::{BoundingBox, PageBox, Point, Space, TextContent, TextItem, Transform};
pub use viewport::{Viewport, normalize_rotation};
