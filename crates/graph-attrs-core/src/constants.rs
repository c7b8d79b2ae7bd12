//! Constants shared across the attribute store and the formula subsystem.

/// Integer key under which a list attribute stores a formula describing the
/// whole list.
///
/// Real list elements live at indices `0..n`, so the sentinel never collides
/// with element storage.
pub const LIST_FORMULA_INDEX: i32 = -1;

/// Reserved reference name that resolves to the id of the entity being
/// evaluated rather than to an attribute.
pub const ID_REFERENCE: &str = "ID";

/// Default bound on nested formula evaluation.
pub const DEFAULT_MAX_EVALUATION_DEPTH: usize = 64;
