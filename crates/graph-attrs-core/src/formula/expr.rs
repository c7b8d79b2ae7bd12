//! Built-in expression tree
//!
//! A small compiled form for formulas: literals, typed attribute references,
//! the `ID` pseudo-reference, arithmetic, text concatenation, comparisons,
//! boolean logic, conditionals, list construction and a few functions. The
//! return type is inferred statically from the tree.

use std::cmp::Ordering;
use std::ops;

use serde::{Deserialize, Serialize};

use crate::constants::ID_REFERENCE;
use crate::formula::coerce;
use crate::formula::{Bindings, Expression, FormulaExpr, FormulaType, FormulaValue};
use crate::types::{ScalarValue, ValueKind};

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
    /// Logical negation
    Not,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division, always producing a float
    Div,

    // Text
    /// Text concatenation
    Concat,

    // Comparison
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,

    // Logical
    /// Logical and
    And,
    /// Logical or
    Or,
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    /// Absolute value of a number
    Abs,
    /// Length of a list, map or text
    Len,
    /// Sum of a list's numbers
    Sum,
}

impl Function {
    fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Len => "len",
            Function::Sum => "sum",
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    /// Literal value
    Literal {
        /// The value
        value: ScalarValue,
    },

    /// Reference to a scalar attribute on the same entity
    Attr {
        /// Attribute name
        name: String,
        /// Kind the compiler saw for the attribute
        kind: ValueKind,
    },

    /// Reference to a list attribute on the same entity
    ListAttr {
        /// Attribute name
        name: String,
        /// Element kind the compiler saw for the attribute
        kind: ValueKind,
    },

    /// Id of the entity being evaluated
    Id,

    /// Unary operation: -a, not a
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },

    /// Binary operation: a + b, a < b, etc.
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Conditional
    If {
        /// Condition, coerced to boolean
        condition: Box<Expr>,
        /// Value when true
        then: Box<Expr>,
        /// Value when false
        otherwise: Box<Expr>,
    },

    /// List construction
    List {
        /// Elements
        items: Vec<Expr>,
        /// Declared element kind; inferred from the items when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ValueKind>,
    },

    /// Built-in function call
    Call {
        /// Function
        function: Function,
        /// Arguments
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Literal node
    pub fn literal(value: impl Into<ScalarValue>) -> Self {
        Expr::Literal { value: value.into() }
    }

    /// Scalar attribute reference
    pub fn attr(name: impl Into<String>, kind: ValueKind) -> Self {
        Expr::Attr { name: name.into(), kind }
    }

    /// List attribute reference
    pub fn list_attr(name: impl Into<String>, kind: ValueKind) -> Self {
        Expr::ListAttr { name: name.into(), kind }
    }

    /// The `ID` pseudo-reference
    pub fn id() -> Self {
        Expr::Id
    }

    /// Text concatenation
    pub fn concat(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Concat, self, other)
    }

    /// Equality comparison
    pub fn equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    /// Inequality comparison
    pub fn not_equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    /// Less-than comparison
    pub fn less_than(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    /// Less-or-equal comparison
    pub fn less_or_equal(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    /// Greater-than comparison
    pub fn greater_than(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    /// Greater-or-equal comparison
    pub fn greater_or_equal(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    /// Logical and
    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    /// Logical or
    pub fn or(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    /// Conditional
    pub fn if_then_else(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// List construction, element kind inferred from the items
    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List { items, kind: None }
    }

    /// List construction with a declared element kind
    ///
    /// Needed for empty lists, which have no items to infer from.
    pub fn list_of(kind: ValueKind, items: Vec<Expr>) -> Self {
        Expr::List { items, kind: Some(kind) }
    }

    /// Function call
    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call { function, args }
    }

    /// Wrap into a formula handle
    pub fn into_formula(self) -> FormulaExpr {
        FormulaExpr::new(self)
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    /// Statically inferred return type
    pub fn infer_type(&self) -> FormulaType {
        match self {
            Expr::Literal { value } => FormulaType::Scalar(value.kind()),
            Expr::Attr { kind, .. } => FormulaType::Scalar(*kind),
            Expr::ListAttr { kind, .. } => FormulaType::List(*kind),
            Expr::Id => FormulaType::Scalar(ValueKind::String),
            Expr::Unary { op: UnaryOp::Not, .. } => FormulaType::Scalar(ValueKind::Boolean),
            Expr::Unary { op: UnaryOp::Neg, operand } => {
                FormulaType::Scalar(numeric_kind(operand.infer_type().kind()))
            }
            Expr::Binary { op, left, right } => FormulaType::Scalar(match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                    let left = numeric_kind(left.infer_type().kind());
                    let right = numeric_kind(right.infer_type().kind());
                    if left == ValueKind::Float || right == ValueKind::Float {
                        ValueKind::Float
                    } else {
                        ValueKind::Integer
                    }
                }
                BinaryOp::Div => ValueKind::Float,
                BinaryOp::Concat => ValueKind::String,
                _ => ValueKind::Boolean,
            }),
            Expr::If { then, .. } => then.infer_type(),
            Expr::List { items, kind } => {
                FormulaType::List(kind.unwrap_or_else(|| list_kind(items)))
            }
            Expr::Call { function, args } => FormulaType::Scalar(match function {
                Function::Len => ValueKind::Integer,
                Function::Abs | Function::Sum => args
                    .first()
                    .map_or(ValueKind::Integer, |arg| numeric_kind(arg.infer_type().kind())),
            }),
        }
    }

    fn collect_references(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Attr { name, .. } | Expr::ListAttr { name, .. } => out.push(name.clone()),
            Expr::Id => out.push(ID_REFERENCE.to_string()),
            Expr::Unary { operand, .. } => operand.collect_references(out),
            Expr::Binary { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            Expr::If { condition, then, otherwise } => {
                condition.collect_references(out);
                then.collect_references(out);
                otherwise.collect_references(out);
            }
            Expr::List { items: args, .. } | Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_references(out);
                }
            }
        }
    }

    /// Evaluate the tree against bindings
    pub fn eval(&self, bindings: &Bindings) -> Result<FormulaValue, String> {
        match self {
            Expr::Literal { value } => Ok(value.clone().into()),
            Expr::Attr { name, .. } | Expr::ListAttr { name, .. } => bindings
                .get(name)
                .ok_or_else(|| format!("unbound reference '{}'", name)),
            Expr::Id => Ok(FormulaValue::String(bindings.entity_id().to_string())),
            Expr::Unary { op, operand } => {
                let value = operand.eval(bindings)?;
                match op {
                    UnaryOp::Not => Ok(FormulaValue::Boolean(!truthy(&value)?)),
                    UnaryOp::Neg => match number(&value)? {
                        Number::Int(i) => i
                            .checked_neg()
                            .map(FormulaValue::Integer)
                            .ok_or_else(overflow),
                        Number::Float(x) => Ok(FormulaValue::Float(-x)),
                    },
                }
            }
            Expr::Binary { op: BinaryOp::And, left, right } => {
                let result = truthy(&left.eval(bindings)?)? && truthy(&right.eval(bindings)?)?;
                Ok(FormulaValue::Boolean(result))
            }
            Expr::Binary { op: BinaryOp::Or, left, right } => {
                let result = truthy(&left.eval(bindings)?)? || truthy(&right.eval(bindings)?)?;
                Ok(FormulaValue::Boolean(result))
            }
            Expr::Binary { op, left, right } => {
                let left = left.eval(bindings)?;
                let right = right.eval(bindings)?;
                binary(*op, &left, &right)
            }
            Expr::If { condition, then, otherwise } => {
                if truthy(&condition.eval(bindings)?)? {
                    then.eval(bindings)
                } else {
                    otherwise.eval(bindings)
                }
            }
            Expr::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item.eval(bindings)? {
                        nested @ (FormulaValue::List(_) | FormulaValue::Map(_)) => {
                            return Err(format!("list elements must be scalars, got {}", nested.type_name()));
                        }
                        value => values.push(value),
                    }
                }
                Ok(FormulaValue::List(values))
            }
            Expr::Call { function, args } => {
                let [arg] = args.as_slice() else {
                    return Err(format!("{} expects 1 argument, got {}", function.name(), args.len()));
                };
                call(*function, &arg.eval(bindings)?)
            }
        }
    }
}

impl Expression for Expr {
    fn return_type(&self) -> FormulaType {
        self.infer_type()
    }

    fn references(&self) -> Vec<String> {
        let mut references = Vec::new();
        self.collect_references(&mut references);
        references
    }

    fn evaluate(&self, bindings: &Bindings) -> Result<FormulaValue, String> {
        self.eval(bindings)
    }
}

impl From<Expr> for FormulaExpr {
    fn from(expr: Expr) -> Self {
        FormulaExpr::new(expr)
    }
}

impl ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }
}

/// Kind a value takes once used as a number
/// Element kind of an undeclared list: the first item's kind, promoted to
/// Float when integers and floats are mixed. Empty lists default to String.
fn list_kind(items: &[Expr]) -> ValueKind {
    let kinds: Vec<ValueKind> = items.iter().map(|item| item.infer_type().kind()).collect();
    let Some(&first) = kinds.first() else {
        return ValueKind::String;
    };
    let numeric = kinds
        .iter()
        .all(|k| matches!(k, ValueKind::Integer | ValueKind::Float));
    if numeric && kinds.contains(&ValueKind::Float) {
        ValueKind::Float
    } else {
        first
    }
}

fn numeric_kind(kind: ValueKind) -> ValueKind {
    match kind {
        ValueKind::Boolean | ValueKind::Integer => ValueKind::Integer,
        ValueKind::Float | ValueKind::String => ValueKind::Float,
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

fn number(value: &FormulaValue) -> Result<Number, String> {
    match value {
        FormulaValue::Boolean(b) => Ok(Number::Int(i64::from(*b))),
        FormulaValue::Integer(i) => Ok(Number::Int(*i)),
        FormulaValue::Float(x) => Ok(Number::Float(*x)),
        FormulaValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| format!("'{}' is not a number", s)),
        other => Err(format!("{} is not a number", other.type_name())),
    }
}

fn truthy(value: &FormulaValue) -> Result<bool, String> {
    coerce::to_boolean(value).map_err(|e| e.to_string())
}

fn overflow() -> String {
    "integer overflow".to_string()
}

fn binary(op: BinaryOp, left: &FormulaValue, right: &FormulaValue) -> Result<FormulaValue, String> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arithmetic(op, number(left)?, number(right)?),
        BinaryOp::Div => {
            let denominator = number(right)?.as_f64();
            if denominator == 0.0 {
                return Err("division by zero".to_string());
            }
            Ok(FormulaValue::Float(number(left)?.as_f64() / denominator))
        }
        BinaryOp::Concat => Ok(FormulaValue::String(format!("{}{}", left, right))),
        BinaryOp::Eq => Ok(FormulaValue::Boolean(values_equal(left, right))),
        BinaryOp::Ne => Ok(FormulaValue::Boolean(!values_equal(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(FormulaValue::Boolean(result))
        }
        BinaryOp::And | BinaryOp::Or => Ok(FormulaValue::Boolean(match op {
            BinaryOp::And => truthy(left)? && truthy(right)?,
            _ => truthy(left)? || truthy(right)?,
        })),
    }
}

fn arithmetic(op: BinaryOp, left: Number, right: Number) -> Result<FormulaValue, String> {
    if let (Number::Int(a), Number::Int(b)) = (left, right) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            _ => a.checked_mul(b),
        };
        return result.map(FormulaValue::Integer).ok_or_else(overflow);
    }
    let (a, b) = (left.as_f64(), right.as_f64());
    Ok(FormulaValue::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        _ => a * b,
    }))
}

fn is_numeric(value: &FormulaValue) -> bool {
    matches!(
        value,
        FormulaValue::Boolean(_) | FormulaValue::Integer(_) | FormulaValue::Float(_)
    )
}

fn values_equal(left: &FormulaValue, right: &FormulaValue) -> bool {
    if is_numeric(left) && is_numeric(right) {
        return compare(left, right) == Ok(Ordering::Equal);
    }
    left == right
}

fn compare(left: &FormulaValue, right: &FormulaValue) -> Result<Ordering, String> {
    match (left, right) {
        (FormulaValue::String(a), FormulaValue::String(b)) => Ok(a.cmp(b)),
        (FormulaValue::Integer(a), FormulaValue::Integer(b)) => Ok(a.cmp(b)),
        (a, b) if is_numeric(a) && is_numeric(b) => {
            let (x, y) = (number(a)?.as_f64(), number(b)?.as_f64());
            x.partial_cmp(&y)
                .ok_or_else(|| "cannot order NaN".to_string())
        }
        (a, b) => Err(format!("cannot compare {} with {}", a.type_name(), b.type_name())),
    }
}

fn call(function: Function, arg: &FormulaValue) -> Result<FormulaValue, String> {
    match function {
        Function::Abs => match number(arg)? {
            Number::Int(i) => i.checked_abs().map(FormulaValue::Integer).ok_or_else(overflow),
            Number::Float(x) => Ok(FormulaValue::Float(x.abs())),
        },
        Function::Len => {
            let len = match arg {
                FormulaValue::List(items) => items.len(),
                FormulaValue::Map(entries) => entries.len(),
                FormulaValue::String(s) => s.chars().count(),
                other => return Err(format!("len is undefined for {}", other.type_name())),
            };
            i64::try_from(len).map(FormulaValue::Integer).map_err(|_| overflow())
        }
        Function::Sum => {
            let FormulaValue::List(items) = arg else {
                return Err(format!("sum expects a list, got {}", arg.type_name()));
            };
            let mut total = Number::Int(0);
            for item in items {
                total = match (total, number(item)?) {
                    (Number::Int(a), Number::Int(b)) => {
                        Number::Int(a.checked_add(b).ok_or_else(overflow)?)
                    }
                    (a, b) => Number::Float(a.as_f64() + b.as_f64()),
                };
            }
            Ok(match total {
                Number::Int(i) => FormulaValue::Integer(i),
                Number::Float(x) => FormulaValue::Float(x),
            })
        }
    }
}
