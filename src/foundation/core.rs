pub use kurbo::{Rect, Size};

/// Concrete placement of one layer on the output canvas, as handed to the compositor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Stacking index; lower values paint first.
    pub index: i32,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Canvas-space rectangle the layer is cropped to. Set by fill placement, whose scaled
    /// source overflows its target on one axis; the compositor must not paint outside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<Rect>,
}

impl Geometry {
    /// Geometry covering the whole canvas at the given stacking index.
    pub fn full_canvas(canvas: Size, index: i32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            index,
            width: canvas.width,
            height: canvas.height,
            clip: None,
        }
    }

    /// Bounding rectangle of this placement.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Part of the canvas actually painted: the bounding rectangle cut down to `clip`.
    pub fn visible_rect(&self) -> Rect {
        match self.clip {
            Some(clip) => self.rect().intersect(clip),
            None => self.rect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
