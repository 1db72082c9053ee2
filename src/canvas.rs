use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::document::PdfPage;
use crate::error::{Error, Result};
use crate::types::BoundingBox;
use crate::viewport::Viewport;

/// The colour highlights are painted with unless configured otherwise.
pub const DEFAULT_FILL_STYLE: &str = "rgba(256, 256, 0, 0.5)";

/// A drawing surface in viewport coordinates: pixels, origin top-left, y down.
pub trait Canvas {
    /// Sizes the canvas to `viewport` and puts `page` on it.
    fn render_page(&mut self, page: &PdfPage<'_>, viewport: &Viewport) -> Result<()>;

    fn fill_rect(&mut self, rect: &BoundingBox, style: &FillStyle) -> Result<()>;
}

impl<C: Canvas + ?Sized> Canvas for &mut C {
    fn render_page(&mut self, page: &PdfPage<'_>, viewport: &Viewport) -> Result<()> {
        (**self).render_page(page, viewport)
    }

    fn fill_rect(&mut self, rect: &BoundingBox, style: &FillStyle) -> Result<()> {
        (**self).fill_rect(rect, style)
    }
}

/// A solid colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl FillStyle {
    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> FillStyle {
        FillStyle {
            r,
            g,
            b,
            a: a.clamp(0., 1.),
        }
    }

    /// Colour channels scaled to `0.0..=1.0`.
    pub fn components(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c as f64 / 255.)
    }
}

impl Default for FillStyle {
    fn default() -> Self {
        FillStyle::rgba(255, 255, 0, 0.5)
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

fn channel(s: &str) -> Option<u8> {
    let v: f64 = s.trim().parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(v.round().clamp(0., 255.) as u8)
}

fn alpha(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then(|| v.clamp(0., 1.))
}

fn hex_digit_pair(s: &str) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(s, 16).ok()
}

impl FromStr for FillStyle {
    type Err = Error;

    /// Parses the CSS colour forms `rgba(r, g, b, a)`, `rgb(r, g, b)`,
    /// `#rrggbb` and `#rgb`. Out of range channels are clamped.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_owned());
        let t = s.trim().to_ascii_lowercase();

        if let Some(hex) = t.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(invalid());
            }
            return match hex.len() {
                6 => Ok(FillStyle::rgba(
                    hex_digit_pair(&hex[0..2]).ok_or_else(invalid)?,
                    hex_digit_pair(&hex[2..4]).ok_or_else(invalid)?,
                    hex_digit_pair(&hex[4..6]).ok_or_else(invalid)?,
                    1.,
                )),
                3 => {
                    let mut c = [0u8; 3];
                    for (slot, i) in c.iter_mut().zip(0..3) {
                        let d = hex_digit_pair(&hex[i..i + 1]).ok_or_else(invalid)?;
                        *slot = d * 17;
                    }
                    Ok(FillStyle::rgba(c[0], c[1], c[2], 1.))
                }
                _ => Err(invalid()),
            };
        }

        let (args, has_alpha) = if let Some(rest) = t.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = t.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid());
        };
        let args = args.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = args.split(',').collect();
        match (parts.as_slice(), has_alpha) {
            ([r, g, b, a], true) => Ok(FillStyle::rgba(
                channel(r).ok_or_else(invalid)?,
                channel(g).ok_or_else(invalid)?,
                channel(b).ok_or_else(invalid)?,
                alpha(a).ok_or_else(invalid)?,
            )),
            ([r, g, b], false) => Ok(FillStyle::rgba(
                channel(r).ok_or_else(invalid)?,
                channel(g).ok_or_else(invalid)?,
                channel(b).ok_or_else(invalid)?,
                1.,
            )),
            _ => Err(invalid()),
        }
    }
}

/// A rectangle filled on a [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilledRect {
    pub page_number: Option<u32>,
    pub rect: BoundingBox,
    pub style: FillStyle,
}

/// Canvas that keeps a log of what was drawn on it instead of pixels.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    page_number: Option<u32>,
    fills: Vec<FilledRect>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The page last rendered onto the canvas.
    pub fn page_number(&self) -> Option<u32> {
        self.page_number
    }

    pub fn fills(&self) -> &[FilledRect] {
        &self.fills
    }
}

impl Canvas for RecordingCanvas {
    fn render_page(&mut self, page: &PdfPage<'_>, viewport: &Viewport) -> Result<()> {
        self.width = viewport.width();
        self.height = viewport.height();
        self.page_number = Some(page.page_number());
        debug!(
            "canvas sized {}x{} for page {}",
            self.width,
            self.height,
            page.page_number()
        );
        Ok(())
    }

    fn fill_rect(&mut self, rect: &BoundingBox, style: &FillStyle) -> Result<()> {
        self.fills.push(FilledRect {
            page_number: self.page_number,
            rect: rect.clone(),
            style: *style,
        });
        Ok(())
    }
}
