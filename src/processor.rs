use std::collections::HashMap;
use std::rc::Rc;

use euclid::Transform2D;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::{debug, warn};

use crate::fonts::{PdfFont, make_font};
use crate::output::TextContentOutput;
use crate::types::Transform;
use crate::utils::*;

// Form XObjects may reference each other; stop descending past this depth.
const MAX_FORM_DEPTH: usize = 16;

#[derive(Clone)]
pub(crate) struct TextState<'a> {
    pub(crate) font: Option<Rc<dyn PdfFont + 'a>>,
    pub(crate) font_size: f64,
    pub(crate) character_spacing: f64,
    pub(crate) word_spacing: f64,
    pub(crate) horizontal_scaling: f64,
    pub(crate) leading: f64,
    pub(crate) rise: f64,
    pub(crate) tm: Transform,
}

#[derive(Clone)]
pub(crate) struct GraphicsState<'a> {
    pub(crate) ctm: Transform,
    pub(crate) ts: TextState<'a>,
}

impl<'a> GraphicsState<'a> {
    fn new(ctm: Transform) -> GraphicsState<'a> {
        GraphicsState {
            ctm,
            ts: TextState {
                font: None,
                font_size: 0.,
                character_spacing: 0.,
                word_spacing: 0.,
                horizontal_scaling: 100. / 100.,
                leading: 0.,
                rise: 0.,
                tm: Transform2D::identity(),
            },
        }
    }
}

fn operand_nums<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.; N];
    for (slot, o) in out.iter_mut().zip(operands) {
        *slot = as_num(o)?;
    }
    Some(out)
}

fn matrix(m: [f64; 6]) -> Transform {
    Transform2D::new(m[0], m[1], m[2], m[3], m[4], m[5])
}

/// Opens a text item at the current text position.
fn begin_text(gs: &GraphicsState, output: &mut TextContentOutput) {
    let ts = &gs.ts;
    let Some(font) = ts.font.as_ref() else {
        return;
    };
    // 9.4.4 Text Space Details: Trm = [Tfs×Th 0 0 Tfs 0 Trise] × Tm × CTM
    let tsm = Transform2D::new(
        ts.font_size * ts.horizontal_scaling,
        0.,
        0.,
        ts.font_size,
        0.,
        ts.rise,
    );
    let text_to_user = ts.tm.then(&gs.ctm);
    let trm = tsm.then(&text_to_user);
    let text_space_scale = text_to_user.m11.hypot(text_to_user.m12);
    output.begin_text(&trm, text_space_scale, font.get_font_name());
}

fn show_text(gs: &mut GraphicsState, s: &[u8], output: &mut TextContentOutput) {
    let ts = &mut gs.ts;
    let Some(font) = ts.font.clone() else {
        warn!("text shown without a font selected");
        return;
    };
    debug!("{:?}", font.decode(s));

    for (c, length) in font.char_codes(s) {
        let w0 = font.get_width(c) / 1000.;

        let mut spacing = ts.character_spacing;
        // "Word spacing is applied to every occurrence of the single-byte character code 32 in a
        //  string when using a simple font or a composite font that defines code 32 as a
        //  single-byte code. It does not apply to occurrences of the byte value 32 in
        //  multiple-byte codes."
        let is_space = c == 32 && length == 1;
        if is_space {
            spacing += ts.word_spacing
        }

        let tx = ts.horizontal_scaling * (w0 * ts.font_size + spacing);
        output.output_character(&font.decode_char(c), tx);
        ts.tm = Transform2D::translation(tx, 0.).then(&ts.tm);
    }
}

fn adjust_text(gs: &mut GraphicsState, tj: f64, output: &mut TextContentOutput) {
    let ts = &mut gs.ts;
    let tx = -ts.horizontal_scaling * (tj / 1000.) * ts.font_size;
    ts.tm = Transform2D::translation(tx, 0.).then(&ts.tm);
    output.adjust(tx);
    debug!("adjust text by: {} {:?}", tj, ts.tm);
}

#[derive(Debug)]
pub(crate) struct Processor<'a> {
    doc: &'a Document,
    page_num: u32,
}

impl<'a> Processor<'a> {
    pub(crate) fn new(doc: &'a Document, page_num: u32) -> Processor<'a> {
        Processor { doc, page_num }
    }

    pub(crate) fn process_stream(
        &self,
        content: &[u8],
        resources: &'a Dictionary,
        ctm: Transform,
        output: &mut TextContentOutput,
        depth: usize,
    ) {
        let doc = self.doc;
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to decode content stream for page {}: {}. Skipping this content.",
                    self.page_num, e
                );
                return;
            }
        };
        let mut font_table: HashMap<Vec<u8>, Rc<dyn PdfFont + 'a>> = HashMap::new();
        let mut gs = GraphicsState::new(ctm);
        let mut gs_stack = Vec::new();
        let mut tlm: Transform = Transform2D::identity();

        for operation in &content.operations {
            let operands = &operation.operands[..];
            match operation.operator.as_ref() {
                "BT" | "ET" => {
                    tlm = Transform2D::identity();
                    gs.ts.tm = tlm;
                }
                "cm" => match operand_nums::<6>(operands) {
                    Some(m) => {
                        gs.ctm = matrix(m).then(&gs.ctm);
                        debug!("matrix {:?}", gs.ctm);
                    }
                    None => warn!("malformed cm {:?}", operands),
                },
                "TJ" => match operands.first() {
                    Some(Object::Array(array)) => {
                        begin_text(&gs, output);
                        for e in array {
                            match e {
                                Object::String(s, _) => show_text(&mut gs, s, output),
                                other => match as_num(other) {
                                    Some(tj) => adjust_text(&mut gs, tj, output),
                                    None => debug!("kind of {:?}", other),
                                },
                            }
                        }
                        output.end_text();
                    }
                    _ => warn!("unexpected TJ operand {:?}", operation),
                },
                "Tj" | "'" | "\"" => {
                    let string = match operation.operator.as_ref() {
                        "\"" => {
                            if let Some([aw, ac]) = operand_nums::<2>(operands) {
                                gs.ts.word_spacing = aw;
                                gs.ts.character_spacing = ac;
                            }
                            operands.get(2)
                        }
                        _ => operands.first(),
                    };
                    if operation.operator != "Tj" {
                        tlm = Transform2D::translation(0., -gs.ts.leading).then(&tlm);
                        gs.ts.tm = tlm;
                    }
                    match string {
                        Some(Object::String(s, _)) => {
                            begin_text(&gs, output);
                            show_text(&mut gs, s, output);
                            output.end_text();
                        }
                        _ => warn!("unexpected {} operand {:?}", operation.operator, operation),
                    }
                }
                "Tc" => {
                    if let Some([v]) = operand_nums::<1>(operands) {
                        gs.ts.character_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some([v]) = operand_nums::<1>(operands) {
                        gs.ts.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some([v]) = operand_nums::<1>(operands) {
                        gs.ts.horizontal_scaling = v / 100.;
                    }
                }
                "TL" => {
                    if let Some([v]) = operand_nums::<1>(operands) {
                        gs.ts.leading = v;
                    }
                }
                "Ts" => {
                    if let Some([v]) = operand_nums::<1>(operands) {
                        gs.ts.rise = v;
                    }
                }
                "Tf" => {
                    let name = operands.first().and_then(|n| n.as_name().ok());
                    let size = operands.get(1).and_then(as_num);
                    let (Some(name), Some(size)) = (name, size) else {
                        warn!("malformed Tf {:?}", operands);
                        continue;
                    };
                    let font = match font_table.get(name) {
                        Some(font) => Some(font.clone()),
                        None => {
                            let dict = maybe_get::<&Dictionary>(doc, resources, b"Font")
                                .and_then(|fonts| maybe_get::<&Dictionary>(doc, fonts, name));
                            match dict {
                                Some(dict) => {
                                    let font = make_font(doc, dict);
                                    font_table.insert(name.to_owned(), font.clone());
                                    Some(font)
                                }
                                None => {
                                    warn!(
                                        "font {} missing from resources of page {}",
                                        pdf_to_utf8(name),
                                        self.page_num
                                    );
                                    None
                                }
                            }
                        }
                    };
                    gs.ts.font = font;
                    gs.ts.font_size = size;
                    debug!("font {} size: {}", pdf_to_utf8(name), size);
                }
                "Tm" => match operand_nums::<6>(operands) {
                    Some(m) => {
                        tlm = matrix(m);
                        gs.ts.tm = tlm;
                        debug!("Tm: matrix {:?}", gs.ts.tm);
                    }
                    None => warn!("malformed Tm {:?}", operands),
                },
                "Td" | "TD" => match operand_nums::<2>(operands) {
                    // Move to the start of the next line, offset from the start of the
                    // current line by (tx, ty). TD also sets the leading to -ty.
                    Some([tx, ty]) => {
                        if operation.operator == "TD" {
                            gs.ts.leading = -ty;
                        }
                        tlm = Transform2D::translation(tx, ty).then(&tlm);
                        gs.ts.tm = tlm;
                        debug!("{} matrix {:?}", operation.operator, gs.ts.tm);
                    }
                    None => warn!("malformed {} {:?}", operation.operator, operands),
                },
                "T*" => {
                    tlm = Transform2D::translation(0., -gs.ts.leading).then(&tlm);
                    gs.ts.tm = tlm;
                    debug!("T* matrix {:?}", gs.ts.tm);
                }
                "q" => {
                    gs_stack.push(gs.clone());
                }
                "Q" => {
                    if let Some(s) = gs_stack.pop() {
                        gs = s;
                    } else {
                        warn!("No state to pop");
                    }
                }
                "Do" => {
                    let Some(name) = operands.first().and_then(|n| n.as_name().ok()) else {
                        continue;
                    };
                    self.process_form(name, resources, &gs, output, depth);
                }
                _ => {
                    debug!("unhandled operation {:?}", operation.operator);
                }
            }
        }
    }

    /// `Do` on a form XObject runs its content with the form's own matrix and
    /// resources. Images and other XObjects carry no text.
    fn process_form(
        &self,
        name: &[u8],
        resources: &'a Dictionary,
        gs: &GraphicsState<'a>,
        output: &mut TextContentOutput,
        depth: usize,
    ) {
        let doc = self.doc;
        let xf = maybe_get::<&Dictionary>(doc, resources, b"XObject")
            .and_then(|xobject| maybe_get::<&Stream>(doc, xobject, name));
        let Some(xf) = xf else {
            warn!("XObject {} not found", pdf_to_utf8(name));
            return;
        };
        if maybe_get_name(doc, &xf.dict, b"Subtype") != Some(b"Form".as_slice()) {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            warn!("form XObjects nested deeper than {}, skipping", MAX_FORM_DEPTH);
            return;
        }

        let form_matrix = maybe_get::<Vec<f64>>(doc, &xf.dict, b"Matrix")
            .and_then(|m| <[f64; 6]>::try_from(m).ok())
            .map(matrix)
            .unwrap_or_else(Transform2D::identity);
        let resources = maybe_get::<&Dictionary>(doc, &xf.dict, b"Resources").unwrap_or(resources);
        let contents = get_contents(xf);
        self.process_stream(
            &contents,
            resources,
            form_matrix.then(&gs.ctm),
            output,
            depth + 1,
        );
    }
}
