use crate::foundation::core::{Geometry, Size};

/// Failure to compute a fill/crop placement.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The source reported a zero, negative or non-finite natural size.
    #[error("natural size must be positive, got {width}x{height}")]
    InvalidNaturalSize {
        /// Reported natural width.
        width: f64,
        /// Reported natural height.
        height: f64,
    },
}

/// How a slot's source is fitted into its target rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResizeMode {
    /// Scale until the source covers the target on both axes, cropping overflow.
    #[default]
    Fill,
}

/// Resize policy attached to a slot, with the source's natural size captured at scene-build time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResizePolicy {
    /// Fitting mode.
    pub mode: ResizeMode,
    /// Natural pixel size of the source (e.g. a video track's reported resolution).
    pub natural_size: Size,
}

impl ResizePolicy {
    /// Fill policy for a source of the given natural size.
    pub fn fill(natural_size: Size) -> Self {
        Self {
            mode: ResizeMode::Fill,
            natural_size,
        }
    }
}

/// Aspect-preserving cover placement relative to the target's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledCoords {
    /// Left edge relative to the target (negative when cropped horizontally).
    pub x: f64,
    /// Top edge relative to the target (negative when cropped vertically).
    pub y: f64,
    /// Scaled source width.
    pub w: f64,
    /// Scaled source height.
    pub h: f64,
    /// Applied scale factor.
    pub scale: f64,
}

/// Scale a `natural_w x natural_h` source so it covers `target_w x target_h` without
/// distortion, centered over the target.
pub fn calc_scaled_coords(
    natural_w: f64,
    natural_h: f64,
    target_w: f64,
    target_h: f64,
) -> Result<ScaledCoords, LayoutError> {
    if !(natural_w > 0.0 && natural_h > 0.0 && natural_w.is_finite() && natural_h.is_finite()) {
        return Err(LayoutError::InvalidNaturalSize {
            width: natural_w,
            height: natural_h,
        });
    }
    let scale = (target_w / natural_w).max(target_h / natural_h);
    let w = natural_w * scale;
    let h = natural_h * scale;
    Ok(ScaledCoords {
        x: target_w / 2.0 - w / 2.0,
        y: target_h / 2.0 - h / 2.0,
        w,
        h,
        scale,
    })
}

/// Apply `policy` to an already resolved target placement. The stacking index is kept.
///
/// The scaled source overflows the target on one axis; the result carries the target's
/// rectangle as its `clip`.
pub fn apply_resize(policy: &ResizePolicy, target: Geometry) -> Result<Geometry, LayoutError> {
    match policy.mode {
        ResizeMode::Fill => {
            let c = calc_scaled_coords(
                policy.natural_size.width,
                policy.natural_size.height,
                target.width,
                target.height,
            )?;
            Ok(Geometry {
                x: target.x + c.x,
                y: target.y + c.y,
                index: target.index,
                width: c.w,
                height: c.h,
                clip: Some(target.visible_rect()),
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fill.rs"]
mod tests;
