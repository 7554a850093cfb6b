use crate::{
    expression::error::ExprError,
    expression::eval::{LayoutContext, evaluate},
    foundation::core::{Geometry, Size},
    foundation::error::{SceneError, SceneResult},
};

/// One axis of a [`Dimensions`] spec: a literal or an arithmetic expression.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum DimExpr {
    /// Literal pixel value.
    Num(f64),
    /// Expression over `CANVAS_*` and `LAYER_*` symbols.
    Expr(String),
}

impl DimExpr {
    /// Evaluate against `ctx`. Literals never fail.
    pub fn eval(&self, ctx: &LayoutContext) -> Result<f64, ExprError> {
        match self {
            Self::Num(v) => Ok(*v),
            Self::Expr(src) => evaluate(src, ctx),
        }
    }
}

impl From<f64> for DimExpr {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<&str> for DimExpr {
    fn from(src: &str) -> Self {
        Self::Expr(src.to_owned())
    }
}

impl From<String> for DimExpr {
    fn from(src: String) -> Self {
        Self::Expr(src)
    }
}

/// Resolution-independent geometry spec for one slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    /// Left edge.
    pub x: DimExpr,
    /// Top edge.
    pub y: DimExpr,
    /// Stacking index (rounded to an integer after evaluation).
    pub z: DimExpr,
    /// Width; evaluated first and exposed to the other axes as `LAYER_WIDTH`.
    pub w: DimExpr,
    /// Height; evaluated second and exposed as `LAYER_HEIGHT`.
    pub h: DimExpr,
}

impl Dimensions {
    /// Whole-canvas spec at the given stacking index.
    pub fn full_canvas(z: i32) -> Self {
        Self {
            x: 0.0.into(),
            y: 0.0.into(),
            z: f64::from(z).into(),
            w: "CANVAS_WIDTH".into(),
            h: "CANVAS_HEIGHT".into(),
        }
    }
}

/// Resolve `dims` to concrete pixels on `canvas`.
///
/// `w` is evaluated with only the canvas symbols bound, `h` additionally sees `LAYER_WIDTH`,
/// and `x`, `y`, `z` see both layer symbols. `slot` only labels errors.
pub fn resolve_dimensions(slot: &str, dims: &Dimensions, canvas: Size) -> SceneResult<Geometry> {
    let axis_err = |axis: &'static str| {
        move |source: ExprError| SceneError::Expression {
            slot: slot.to_owned(),
            axis,
            source,
        }
    };

    let ctx = LayoutContext::for_canvas(canvas);
    let width = dims.w.eval(&ctx).map_err(axis_err("w"))?;
    let ctx = ctx.with_layer_width(width);
    let height = dims.h.eval(&ctx).map_err(axis_err("h"))?;
    let ctx = ctx.with_layer_height(height);

    let x = dims.x.eval(&ctx).map_err(axis_err("x"))?;
    let y = dims.y.eval(&ctx).map_err(axis_err("y"))?;
    let z = dims.z.eval(&ctx).map_err(axis_err("z"))?;

    Ok(Geometry {
        x,
        y,
        index: z.round() as i32,
        width,
        height,
        clip: None,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/dimensions.rs"]
mod tests;
