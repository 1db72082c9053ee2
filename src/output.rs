use crate::types::{TextContent, TextItem, Transform};

struct PendingItem {
    text: String,
    trm: Transform,
    // horizontal advance in unscaled text space
    advance: f64,
    // length of one unscaled text space unit in user space
    text_space_scale: f64,
    font_name: String,
    glyphs: usize,
}

/// Collects the strings shown by a content stream into [`TextItem`]s, one per
/// text-showing operator.
pub(crate) struct TextContentOutput {
    pending: Option<PendingItem>,
    items: Vec<TextItem>,
}

impl TextContentOutput {
    pub(crate) fn new() -> TextContentOutput {
        TextContentOutput {
            pending: None,
            items: Vec::new(),
        }
    }

    pub(crate) fn into_content(mut self) -> TextContent {
        self.end_text();
        TextContent::from(self.items)
    }

    /// Starts a new item. `trm` is the text rendering matrix of its first
    /// glyph and `text_space_scale` maps text space lengths to user space.
    pub(crate) fn begin_text(&mut self, trm: &Transform, text_space_scale: f64, font_name: &str) {
        self.end_text();
        self.pending = Some(PendingItem {
            text: String::new(),
            trm: *trm,
            advance: 0.,
            text_space_scale,
            font_name: font_name.to_owned(),
            glyphs: 0,
        });
    }

    pub(crate) fn output_character(&mut self, char: &str, advance: f64) {
        if let Some(pending) = &mut self.pending {
            let normalized_char = if char == "\t" { " " } else { char };
            pending.text.push_str(normalized_char);
            pending.advance += advance;
            pending.glyphs += 1;
        }
    }

    /// Applies a `TJ` position adjustment inside the current item.
    pub(crate) fn adjust(&mut self, advance: f64) {
        if let Some(pending) = &mut self.pending {
            pending.advance += advance;
        }
    }

    pub(crate) fn end_text(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        // nothing was drawn
        if pending.glyphs == 0 {
            return;
        }
        let trm = pending.trm;
        self.items.push(TextItem {
            text: pending.text,
            transform: trm.to_array(),
            width: pending.advance * pending.text_space_scale,
            height: trm.m21.hypot(trm.m22),
            font_name: pending.font_name,
        });
    }
}
