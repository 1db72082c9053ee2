//! Mapping from PDF user space to canvas pixels.
//!
//! The canvas has its origin at the top-left corner of the (rotated) page and
//! y grows downwards. At scale 1 one canvas pixel is one PDF point.

use euclid::{Transform2D, point2};

use crate::error::{Error, Result};
use crate::types::{BoundingBox, PageBox, Point, Transform};

#[derive(Debug, Clone)]
pub struct Viewport {
    view_box: PageBox,
    scale: f64,
    rotation: u32,
    width: f64,
    height: f64,
    transform: Transform,
    inverse: Transform,
}

/// Normalises a `/Rotate` value to one of 0, 90, 180, 270.
pub fn normalize_rotation(rotation: i64) -> u32 {
    let r = rotation.rem_euclid(360);
    (r - r % 90) as u32
}

impl Viewport {
    pub fn new(view_box: PageBox, scale: f64, rotation: u32) -> Result<Viewport> {
        if !scale.is_finite() || scale <= 0. {
            return Err(Error::InvalidScale(scale));
        }
        let rotation = normalize_rotation(rotation as i64);

        let (rotate_a, rotate_b, rotate_c, rotate_d) = match rotation {
            90 => (0., 1., 1., 0.),
            180 => (-1., 0., 0., 1.),
            270 => (0., -1., -1., 0.),
            _ => (1., 0., 0., -1.),
        };

        let centre_x = (view_box.urx + view_box.llx) / 2.;
        let centre_y = (view_box.ury + view_box.lly) / 2.;

        let (offset_x, offset_y, width, height) = if rotate_a == 0. {
            (
                (centre_y - view_box.lly).abs() * scale,
                (centre_x - view_box.llx).abs() * scale,
                view_box.height() * scale,
                view_box.width() * scale,
            )
        } else {
            (
                (centre_x - view_box.llx).abs() * scale,
                (centre_y - view_box.lly).abs() * scale,
                view_box.width() * scale,
                view_box.height() * scale,
            )
        };

        let transform = Transform2D::new(
            rotate_a * scale,
            rotate_b * scale,
            rotate_c * scale,
            rotate_d * scale,
            offset_x - rotate_a * scale * centre_x - rotate_c * scale * centre_y,
            offset_y - rotate_b * scale * centre_x - rotate_d * scale * centre_y,
        );
        let inverse = transform.inverse().ok_or(Error::InvalidScale(scale))?;

        Ok(Viewport {
            view_box,
            scale,
            rotation,
            width,
            height,
            transform,
            inverse,
        })
    }

    pub fn view_box(&self) -> PageBox {
        self.view_box
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn convert_to_viewport_point(&self, x: f64, y: f64) -> Point {
        let p = self.transform.transform_point(point2(x, y));
        Point { x: p.x, y: p.y }
    }

    pub fn convert_to_pdf_point(&self, x: f64, y: f64) -> Point {
        let p = self.inverse.transform_point(point2(x, y));
        Point { x: p.x, y: p.y }
    }

    /// Maps a user space rectangle given by two opposite corners to canvas space.
    pub fn convert_to_viewport_rectangle(&self, rect: &BoundingBox) -> BoundingBox {
        let corners = rect
            .corners()
            .map(|p| self.convert_to_viewport_point(p.x, p.y));
        BoundingBox::from_corners(&corners)
    }

    /// Maps a canvas rectangle back to PDF user space.
    pub fn convert_to_pdf_rectangle(&self, rect: &BoundingBox) -> BoundingBox {
        let corners = rect.corners().map(|p| self.convert_to_pdf_point(p.x, p.y));
        BoundingBox::from_corners(&corners)
    }
}
