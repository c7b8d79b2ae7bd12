//! Result coercion
//!
//! Converts a raw formula result to an attribute's kind using spreadsheet
//! rules. Numbers round half away from zero when they become integers, text is
//! parsed, and anything that does not fit the native integer range fails
//! instead of wrapping or clamping.

use crate::formula::FormulaValue;
use crate::types::{CoercionError, ScalarValue, ValueKind};

/// Coerce a raw result to the given kind
pub fn to_kind(value: &FormulaValue, kind: ValueKind) -> Result<ScalarValue, CoercionError> {
    Ok(match kind {
        ValueKind::Boolean => ScalarValue::Boolean(to_boolean(value)?),
        ValueKind::Integer => ScalarValue::Integer(to_integer(value)?),
        ValueKind::Float => ScalarValue::Float(to_float(value)?),
        ValueKind::String => ScalarValue::String(to_text(value)),
    })
}

/// Coerce to a native integer
pub fn to_integer(value: &FormulaValue) -> Result<i32, CoercionError> {
    match value {
        FormulaValue::Integer(i) => narrow(*i),
        FormulaValue::Float(x) => round_half_away(*x),
        FormulaValue::Boolean(b) => Ok(i32::from(*b)),
        FormulaValue::String(s) => round_half_away(parse_number(s)?),
        other => Err(unsupported(other, ValueKind::Integer)),
    }
}

/// Coerce to a float
pub fn to_float(value: &FormulaValue) -> Result<f64, CoercionError> {
    match value {
        FormulaValue::Float(x) => Ok(*x),
        FormulaValue::Integer(i) => Ok(*i as f64),
        FormulaValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        FormulaValue::String(s) => parse_number(s),
        other => Err(unsupported(other, ValueKind::Float)),
    }
}

/// Coerce to a boolean. Only "true"/"false" text converts, in any case.
pub fn to_boolean(value: &FormulaValue) -> Result<bool, CoercionError> {
    match value {
        FormulaValue::Boolean(b) => Ok(*b),
        FormulaValue::Integer(i) => Ok(*i != 0),
        FormulaValue::Float(x) => Ok(*x != 0.0),
        FormulaValue::String(s) => parse_boolean(s),
        other => Err(unsupported(other, ValueKind::Boolean)),
    }
}

/// Natural text of any value; never fails
pub fn to_text(value: &FormulaValue) -> String {
    value.to_string()
}

/// Map one element of a list result onto the list's kind
///
/// Element kinds must already agree with the declared list kind, except that
/// wide integers narrow and integers or booleans widen into Float lists.
pub fn list_element(value: &FormulaValue, kind: ValueKind) -> Result<ScalarValue, CoercionError> {
    match (value, kind) {
        (FormulaValue::Boolean(b), ValueKind::Boolean) => Ok(ScalarValue::Boolean(*b)),
        (FormulaValue::Integer(i), ValueKind::Integer) => narrow(*i).map(ScalarValue::Integer),
        (FormulaValue::Float(x), ValueKind::Float) => Ok(ScalarValue::Float(*x)),
        (FormulaValue::Integer(i), ValueKind::Float) => Ok(ScalarValue::Float(*i as f64)),
        (FormulaValue::Boolean(b), ValueKind::Float) => Ok(ScalarValue::Float(f64::from(u8::from(*b)))),
        (FormulaValue::String(s), ValueKind::String) => Ok(ScalarValue::String(s.clone())),
        (other, kind) => Err(unsupported(other, kind)),
    }
}

/// Round half away from zero into the native integer range
pub fn round_half_away(x: f64) -> Result<i32, CoercionError> {
    let rounded = if x >= 0.0 { (x + 0.5).trunc() } else { (x - 0.5).trunc() };
    if !rounded.is_finite() || rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return Err(CoercionError::OutOfRange { value: x.to_string() });
    }
    Ok(rounded as i32)
}

fn narrow(value: i64) -> Result<i32, CoercionError> {
    i32::try_from(value).map_err(|_| CoercionError::OutOfRange { value: value.to_string() })
}

fn parse_number(text: &str) -> Result<f64, CoercionError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| CoercionError::Unparseable { text: text.to_string() })
}

fn parse_boolean(text: &str) -> Result<bool, CoercionError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoercionError::NotBoolean { text: text.to_string() })
    }
}

fn unsupported(value: &FormulaValue, target: ValueKind) -> CoercionError {
    CoercionError::Unsupported {
        found: value.type_name().to_string(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_half_away(2.5), Ok(3));
        assert_eq!(round_half_away(-2.5), Ok(-3));
        assert_eq!(round_half_away(2.4), Ok(2));
        assert_eq!(round_half_away(-2.4), Ok(-2));
        assert_eq!(round_half_away(0.0), Ok(0));
    }

    #[test]
    fn integer_range_is_enforced() {
        assert!(matches!(
            to_integer(&FormulaValue::Integer(i64::from(i32::MAX) + 1)),
            Err(CoercionError::OutOfRange { .. })
        ));
        assert!(matches!(
            to_integer(&FormulaValue::Float(1e12)),
            Err(CoercionError::OutOfRange { .. })
        ));
        assert!(matches!(
            to_integer(&FormulaValue::Float(f64::NAN)),
            Err(CoercionError::OutOfRange { .. })
        ));
        assert_eq!(to_integer(&FormulaValue::Integer(-7)), Ok(-7));
    }

    #[test]
    fn text_to_numbers() {
        assert_eq!(to_integer(&FormulaValue::String(" 4.5 ".into())), Ok(5));
        assert_eq!(to_float(&FormulaValue::String("1e3".into())), Ok(1000.0));
        assert_eq!(
            to_float(&FormulaValue::String("notanumber".into())),
            Err(CoercionError::Unparseable { text: "notanumber".into() })
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(to_integer(&FormulaValue::Boolean(true)), Ok(1));
        assert_eq!(to_float(&FormulaValue::Boolean(true)), Ok(1.0));
        assert_eq!(to_boolean(&FormulaValue::Float(0.0)), Ok(false));
        assert_eq!(to_boolean(&FormulaValue::Integer(-3)), Ok(true));
        assert_eq!(to_boolean(&FormulaValue::String("TRUE".into())), Ok(true));
        assert_eq!(to_boolean(&FormulaValue::String("False".into())), Ok(false));
        assert!(to_boolean(&FormulaValue::String("yes".into())).is_err());
    }

    #[test]
    fn text_always_succeeds() {
        assert_eq!(to_text(&FormulaValue::Float(2.0)), "2.0");
        assert_eq!(to_text(&FormulaValue::Boolean(false)), "false");
        assert_eq!(
            to_text(&FormulaValue::List(vec![FormulaValue::Integer(1), FormulaValue::Integer(2)])),
            "[1, 2]"
        );
    }

    #[test]
    fn float_list_elements_widen() {
        assert_eq!(list_element(&FormulaValue::Integer(3), ValueKind::Float), Ok(ScalarValue::Float(3.0)));
        assert_eq!(list_element(&FormulaValue::Boolean(true), ValueKind::Float), Ok(ScalarValue::Float(1.0)));
        assert!(list_element(&FormulaValue::Float(2.5), ValueKind::Integer).is_err());
        assert!(list_element(&FormulaValue::String("3".into()), ValueKind::Float).is_err());
    }

    #[test]
    fn lists_do_not_become_scalars() {
        let list = FormulaValue::List(vec![]);
        assert!(matches!(to_kind(&list, ValueKind::Float), Err(CoercionError::Unsupported { .. })));
    }

    #[test]
    fn list_elements_only_narrow() {
        assert_eq!(
            list_element(&FormulaValue::Integer(12), ValueKind::Integer),
            Ok(ScalarValue::Integer(12))
        );
        assert!(list_element(&FormulaValue::Integer(1 << 40), ValueKind::Integer).is_err());
        assert!(list_element(&FormulaValue::String("1".into()), ValueKind::Integer).is_err());
    }
}
