use crate::expression::ast::{BinaryOp, Builtin, Expr};
use crate::expression::error::ExprError;
use crate::expression::parser::parse_expr;
use crate::foundation::core::Size;

/// Symbol values visible to a layout expression.
///
/// `layer_width`/`layer_height` are `None` until the owning slot's own `w`/`h` axes have been
/// resolved; referencing them earlier is an error rather than a silent zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutContext {
    /// `CANVAS_WIDTH`.
    pub canvas_width: f64,
    /// `CANVAS_HEIGHT`.
    pub canvas_height: f64,
    /// `LAYER_WIDTH`.
    pub layer_width: Option<f64>,
    /// `LAYER_HEIGHT`.
    pub layer_height: Option<f64>,
}

impl LayoutContext {
    /// Context with only the canvas symbols bound.
    pub fn for_canvas(canvas: Size) -> Self {
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            layer_width: None,
            layer_height: None,
        }
    }

    /// Copy of this context with `LAYER_WIDTH` bound.
    pub fn with_layer_width(self, w: f64) -> Self {
        Self {
            layer_width: Some(w),
            ..self
        }
    }

    /// Copy of this context with `LAYER_HEIGHT` bound.
    pub fn with_layer_height(self, h: f64) -> Self {
        Self {
            layer_height: Some(h),
            ..self
        }
    }

    fn lookup(&self, name: &str, offset: usize) -> Result<f64, ExprError> {
        let unresolved = |sym: &str| {
            ExprError::new(
                offset,
                format!("{sym} is not resolved yet (only available after the layer's own w/h)"),
            )
        };
        match name {
            "CANVAS_WIDTH" => Ok(self.canvas_width),
            "CANVAS_HEIGHT" => Ok(self.canvas_height),
            "LAYER_WIDTH" => self.layer_width.ok_or_else(|| unresolved(name)),
            "LAYER_HEIGHT" => self.layer_height.ok_or_else(|| unresolved(name)),
            _ => Err(ExprError::new(offset, format!("unknown symbol '{name}'"))),
        }
    }
}

/// Parse and evaluate a layout expression such as `"CANVAS_WIDTH * 0.5 - LAYER_WIDTH * 0.5"`.
pub fn evaluate(src: &str, ctx: &LayoutContext) -> Result<f64, ExprError> {
    let expr = parse_expr(src)?;
    let v = eval_expr(&expr, ctx)?;
    if !v.is_finite() {
        return Err(ExprError::new(0, format!("expression '{src}' is not finite ({v})")));
    }
    Ok(v)
}

pub(crate) fn eval_expr(expr: &Expr, ctx: &LayoutContext) -> Result<f64, ExprError> {
    match expr {
        Expr::Num(v) => Ok(*v),
        Expr::Symbol { name, offset } => ctx.lookup(name, *offset),
        Expr::Neg(e) => Ok(-eval_expr(e, ctx)?),
        Expr::Binary { op, left, right } => {
            let a = eval_expr(left, ctx)?;
            let b = eval_expr(right, ctx)?;
            Ok(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                BinaryOp::Pow => a.powf(b),
            })
        }
        Expr::Call { func, args, .. } => {
            let mut vals = Vec::with_capacity(args.len());
            for a in args {
                vals.push(eval_expr(a, ctx)?);
            }
            Ok(call_builtin(*func, &vals))
        }
    }
}

fn call_builtin(func: Builtin, args: &[f64]) -> f64 {
    match func {
        Builtin::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Builtin::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Builtin::Abs => args[0].abs(),
        Builtin::Floor => args[0].floor(),
        Builtin::Ceil => args[0].ceil(),
        Builtin::Round => args[0].round(),
        Builtin::Sqrt => args[0].sqrt(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
