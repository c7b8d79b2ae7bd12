//! Formula subsystem
//!
//! Formulas arrive already compiled, as anything implementing [`Expression`].
//! The store keeps them verbatim behind a [`FormulaExpr`] handle and evaluates
//! them lazily on read, resolving referenced attributes on the same entity.

/// Expression trait, formula handle, result values and bindings
pub mod expression;
/// Built-in expression tree
pub mod expr;
/// Spreadsheet-style result coercion
pub mod coerce;
/// Call-scoped evaluation guard
pub mod eval;

pub use expression::{Bindings, Expression, FormulaExpr, FormulaType, FormulaValue};
pub use expr::{BinaryOp, Expr, Function, UnaryOp};
pub use eval::EvalContext;
