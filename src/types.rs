use std::fmt;

use euclid::Transform2D;

pub struct Space;
pub type Transform = Transform2D<f64, Space, Space>;

/// A page boundary box (`/MediaBox` or `/CropBox`) in PDF user space,
/// normalised so that `llx <= urx` and `lly <= ury`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> PageBox {
        PageBox {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned box. In canvas space `t < b` since y grows downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub t: f64,
    pub r: f64,
    pub b: f64,
    pub l: f64,
}

impl BoundingBox {
    /// The smallest box holding all four corners, as produced by mapping a
    /// rectangle through an affine transform.
    pub fn from_corners(corners: &[Point; 4]) -> BoundingBox {
        let [first, rest @ ..] = corners;
        rest.iter().fold(
            BoundingBox {
                t: first.y,
                r: first.x,
                b: first.y,
                l: first.x,
            },
            |bbox, p| BoundingBox {
                t: bbox.t.min(p.y),
                r: bbox.r.max(p.x),
                b: bbox.b.max(p.y),
                l: bbox.l.min(p.x),
            },
        )
    }

    pub fn width(&self) -> f64 {
        self.r - self.l
    }

    pub fn height(&self) -> f64 {
        self.b - self.t
    }

    pub fn top_left(&self) -> Point {
        Point {
            x: self.l,
            y: self.t,
        }
    }

    pub fn top_right(&self) -> Point {
        Point {
            x: self.r,
            y: self.t,
        }
    }

    pub fn bottom_left(&self) -> Point {
        Point {
            x: self.l,
            y: self.b,
        }
    }

    pub fn bottom_right(&self) -> Point {
        Point {
            x: self.r,
            y: self.b,
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(t: {:.1}, r: {:.1}, b: {:.1}, l: {:.1})",
            self.t, self.r, self.b, self.l
        )
    }
}

/// One positioned string from a page's text layer.
///
/// `transform` is the text rendering matrix `[a, b, c, d, e, f]` at the start
/// of the string, so `(e, f)` is the glyph origin in user space. `width` is the
/// horizontal advance of the whole string and `height` the effective font size,
/// both in user space units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub transform: [f64; 6],
    pub width: f64,
    pub height: f64,
    pub font_name: String,
}

impl TextItem {
    pub fn origin(&self) -> Point {
        Point {
            x: self.transform[4],
            y: self.transform[5],
        }
    }
}

/// Text layer of a page, in content stream order.
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    items: Vec<TextItem>,
}

impl TextContent {
    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TextItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl fmt::Display for TextContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            write!(f, "{}", item.text)?;
        }
        Ok(())
    }
}

impl From<Vec<TextItem>> for TextContent {
    fn from(items: Vec<TextItem>) -> Self {
        TextContent { items }
    }
}
