use syn::{Expr, ExprLit, ExprUnary, Lit, UnOp};

/// Evaluate a (possibly negated) integer literal expression, e.g. `3` or `-1`. Negative
/// indices are used for generic pagination fields that must sort before subclass fields.
pub fn eval_index_expr(expr: &Expr) -> syn::Result<i32> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Int(int), .. }) => int.base10_parse::<i32>(),
        Expr::Unary(ExprUnary { op: UnOp::Neg(_), expr, .. }) => {
            eval_index_expr(expr).map(|value| -value)
        }
        other => Err(syn::Error::new_spanned(other, "expected an integer literal")),
    }
}

pub fn lit_str_value(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}
