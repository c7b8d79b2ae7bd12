//! Property tests for the attribute store

use std::collections::BTreeMap;

use graph_attrs_core::formula::coerce;
use graph_attrs_core::{
    AttributeError, AttributeStore, DynamicValue, Expr, FormulaValue, ScalarValue, ValueKind,
};
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = ValueKind> {
    prop::sample::select(ValueKind::ALL.to_vec())
}

/// Any scalar of the given kind
fn arb_scalar(kind: ValueKind) -> BoxedStrategy<ScalarValue> {
    match kind {
        ValueKind::Boolean => any::<bool>().prop_map(ScalarValue::Boolean).boxed(),
        ValueKind::Integer => any::<i32>().prop_map(ScalarValue::Integer).boxed(),
        ValueKind::Float => (-1.0e9f64..1.0e9).prop_map(ScalarValue::Float).boxed(),
        ValueKind::String => "[a-z0-9 ]{0,12}".prop_map(ScalarValue::String).boxed(),
    }
}

fn arb_homogeneous_list() -> impl Strategy<Value = Vec<ScalarValue>> {
    arb_kind().prop_flat_map(|kind| prop::collection::vec(arb_scalar(kind), 1..20))
}

fn arb_homogeneous_map() -> impl Strategy<Value = BTreeMap<String, ScalarValue>> {
    arb_kind().prop_flat_map(|kind| prop::collection::btree_map("[a-z]{1,6}", arb_scalar(kind), 1..10))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The first write locks the kind; other kinds conflict and leave the value intact
    #[test]
    fn first_write_locks_kind(
        name in "[A-Za-z][A-Za-z0-9_]{0,10}",
        (first, second) in (arb_kind(), arb_kind()).prop_flat_map(|(a, b)| (arb_scalar(a), arb_scalar(b))),
    ) {
        let locked = first.kind();
        let mut store = AttributeStore::new();
        store.set_attribute("n1", &name, first.clone()).unwrap();

        let result = store.set_attribute("n1", &name, second.clone());
        if first.kind() == second.kind() {
            prop_assert!(result.is_ok());
        } else {
            let is_conflict = matches!(result, Err(AttributeError::TypeConflict { .. }));
            prop_assert!(is_conflict);
            prop_assert_eq!(store.get_attribute("n1", &name), DynamicValue::Scalar(first));
        }
        prop_assert_eq!(store.value_kind(&name), Some(locked));
    }

    /// Lists read back in input order
    #[test]
    fn list_round_trip(entity in "[a-z0-9]{1,8}", values in arb_homogeneous_list()) {
        let mut store = AttributeStore::new();
        store.set_list_attribute(&entity, "Values", values.clone()).unwrap();
        prop_assert_eq!(store.get_list_attribute(&entity, "Values").unwrap(), Some(values));
    }

    /// Maps read back as the same set of pairs
    #[test]
    fn map_round_trip(entries in arb_homogeneous_map()) {
        let mut store = AttributeStore::new();
        store.set_map_attribute("n1", "Values", entries.clone()).unwrap();
        prop_assert_eq!(store.get_map_attribute("n1", "Values").unwrap(), entries);
    }

    /// Reading a string twice gives the same answer and changes nothing
    #[test]
    fn string_reads_are_idempotent(text in ".{0,32}", formula in any::<bool>()) {
        let mut store = AttributeStore::new();
        if formula {
            store.set_formula_attribute("n1", "Text", Expr::literal(text.as_str())).unwrap();
        } else {
            store.set_attribute("n1", "Text", text.as_str()).unwrap();
        }
        let first = store.get_string_attribute("n1", "Text").unwrap();
        let second = store.get_string_attribute("n1", "Text").unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, Some(text));
        prop_assert_eq!(store.attribute_count(), 1);
    }

    /// Float to integer coercion rounds half away from zero
    #[test]
    fn rounding_matches_half_away(x in -1.0e6f64..1.0e6) {
        let expected = if x >= 0.0 { (x + 0.5).trunc() } else { (x - 0.5).trunc() };
        prop_assert_eq!(coerce::to_integer(&FormulaValue::Float(x)), Ok(expected as i32));
        prop_assert_eq!(coerce::round_half_away(-x), coerce::round_half_away(x).map(|i| -i));
    }

    /// Integers outside the native range never wrap
    #[test]
    fn wide_integers_do_not_wrap(i in any::<i64>()) {
        let result = coerce::to_integer(&FormulaValue::Integer(i));
        match i32::try_from(i) {
            Ok(narrow) => prop_assert_eq!(result, Ok(narrow)),
            Err(_) => prop_assert!(result.is_err()),
        }
    }
}
