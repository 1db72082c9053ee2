//! Painting highlights into the PDF itself.
//!
//! The page's own content is the rendered page, so a [`PdfCanvas`] only has to
//! record where the highlights go and then write them into the document with
//! [`PdfCanvas::stamp`].

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info};

use crate::canvas::{Canvas, FillStyle};
use crate::document::{PdfDocument, PdfPage};
use crate::error::{Error, Result};
use crate::types::BoundingBox;
use crate::utils::{get_inherited, maybe_deref};
use crate::viewport::Viewport;

/// How highlights are written into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StampMode {
    /// Filled rectangles appended to the page content.
    #[default]
    Content,
    /// `/Highlight` markup annotations.
    Annotation,
}

#[derive(Debug, Clone)]
struct PendingFill {
    page_id: ObjectId,
    // user space
    rect: BoundingBox,
    style: FillStyle,
}

/// Canvas backed by the PDF page being highlighted.
#[derive(Debug, Clone, Default)]
pub struct PdfCanvas {
    mode: StampMode,
    current: Option<(ObjectId, Viewport)>,
    fills: Vec<PendingFill>,
}

impl PdfCanvas {
    pub fn new(mode: StampMode) -> Self {
        PdfCanvas {
            mode,
            current: None,
            fills: Vec::new(),
        }
    }

    pub fn mode(&self) -> StampMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Writes every recorded highlight into `doc`. Returns how many were written.
    pub fn stamp(self, doc: &mut PdfDocument) -> Result<usize> {
        let mut by_page: Vec<(ObjectId, Vec<PendingFill>)> = Vec::new();
        for fill in self.fills {
            match by_page.iter_mut().find(|(id, _)| *id == fill.page_id) {
                Some((_, fills)) => fills.push(fill),
                None => by_page.push((fill.page_id, vec![fill])),
            }
        }

        let doc = doc.document_mut();
        let mut count = 0;
        for (page_id, fills) in by_page {
            match self.mode {
                StampMode::Content => stamp_content(doc, page_id, &fills)?,
                StampMode::Annotation => stamp_annotations(doc, page_id, &fills)?,
            }
            count += fills.len();
        }
        info!("stamped {} highlights", count);
        Ok(count)
    }
}

impl Canvas for PdfCanvas {
    fn render_page(&mut self, page: &PdfPage<'_>, viewport: &Viewport) -> Result<()> {
        self.current = Some((page.id(), viewport.clone()));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &BoundingBox, style: &FillStyle) -> Result<()> {
        let Some((page_id, viewport)) = &self.current else {
            return Err(Error::NoPageRendered);
        };
        self.fills.push(PendingFill {
            page_id: *page_id,
            rect: viewport.convert_to_pdf_rectangle(rect),
            style: *style,
        });
        Ok(())
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Gives the page a direct `/Resources` dictionary holding one `/ExtGState`
/// per distinct alpha and returns the state names keyed by alpha bits.
fn add_graphics_states(
    doc: &mut Document,
    page_id: ObjectId,
    fills: &[PendingFill],
) -> Result<HashMap<u64, Vec<u8>>> {
    let page = doc.get_dictionary(page_id)?;
    let mut resources = get_inherited::<&Dictionary>(doc, page, b"Resources")
        .cloned()
        .unwrap_or_default();
    let mut ext_g_state = resources
        .get(b"ExtGState")
        .ok()
        .and_then(|o| maybe_deref(doc, o).as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut names = HashMap::new();
    let mut next = 0;
    for fill in fills {
        let key = fill.style.a.to_bits();
        if names.contains_key(&key) {
            continue;
        }
        let name = loop {
            let name = format!("GSHighlight{}", next).into_bytes();
            next += 1;
            if !ext_g_state.has(&name) {
                break name;
            }
        };
        ext_g_state.set(
            name.clone(),
            dictionary! {
                "Type" => "ExtGState",
                "ca" => real(fill.style.a),
                "CA" => real(fill.style.a),
            },
        );
        names.insert(key, name);
    }

    resources.set("ExtGState", ext_g_state);
    page_dict_mut(doc, page_id)?.set("Resources", resources);
    Ok(names)
}

fn stamp_content(doc: &mut Document, page_id: ObjectId, fills: &[PendingFill]) -> Result<()> {
    let names = add_graphics_states(doc, page_id, fills)?;

    // restore whatever state the original content leaves behind
    let mut operations = vec![Operation::new("Q", vec![])];
    for fill in fills {
        let [r, g, b] = fill.style.components();
        let rect = &fill.rect;
        let name = names
            .get(&fill.style.a.to_bits())
            .cloned()
            .unwrap_or_default();
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(name)]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
            Operation::new(
                "re",
                vec![
                    real(rect.l),
                    real(rect.t),
                    real(rect.width()),
                    real(rect.height()),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }
    let highlights = Content { operations }.encode()?;
    let prefix = Content {
        operations: vec![Operation::new("q", vec![])],
    }
    .encode()?;

    let existing = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            _ => Vec::new(),
        }
    };
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix));
    let highlights_id = doc.add_object(Stream::new(Dictionary::new(), highlights));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(prefix_id));
    contents.extend(existing);
    contents.push(Object::Reference(highlights_id));
    page_dict_mut(doc, page_id)?.set("Contents", contents);
    debug!("appended {} filled rectangles to {:?}", fills.len(), page_id);
    Ok(())
}

fn stamp_annotations(doc: &mut Document, page_id: ObjectId, fills: &[PendingFill]) -> Result<()> {
    let mut annot_ids = Vec::with_capacity(fills.len());
    for fill in fills {
        let BoundingBox {
            t: y0,
            r: x1,
            b: y1,
            l: x0,
        } = fill.rect;
        let [r, g, b] = fill.style.components();
        let annot = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
            "Rect" => vec![real(x0), real(y0), real(x1), real(y1)],
            "QuadPoints" => vec![
                real(x0), real(y1),
                real(x1), real(y1),
                real(x0), real(y0),
                real(x1), real(y0),
            ],
            "C" => vec![real(r), real(g), real(b)],
            "CA" => real(fill.style.a),
            "F" => 4,
            "P" => Object::Reference(page_id),
        };
        annot_ids.push(doc.add_object(annot));
    }
    let refs = annot_ids.into_iter().map(Object::Reference);

    let annots = doc.get_dictionary(page_id)?.get(b"Annots").ok().cloned();
    match annots {
        Some(Object::Reference(id)) => {
            if let Ok(Object::Array(items)) = doc.get_object_mut(id) {
                items.extend(refs);
                return Ok(());
            }
            page_dict_mut(doc, page_id)?.set("Annots", refs.collect::<Vec<_>>());
        }
        Some(Object::Array(mut items)) => {
            items.extend(refs);
            page_dict_mut(doc, page_id)?.set("Annots", items);
        }
        _ => {
            page_dict_mut(doc, page_id)?.set("Annots", refs.collect::<Vec<_>>());
        }
    }
    debug!("added {} highlight annotations to {:?}", fills.len(), page_id);
    Ok(())
}
