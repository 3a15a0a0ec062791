//! Dynamic WHERE/SET fragment construction for list and partial-update
//! statements.
//!
//! Both builders are pure: they take the sparse field set and return the SQL
//! fragment plus the parameter values in matching order. Filter values are
//! matched as substrings (`LIKE '%value%'`), including on numeric columns,
//! where SQLite coerces the stored integer to its text representation. This
//! keeps every column filterable from a single text box in the client;
//! `bpm=12` matching 120 and 812 is accepted behavior.

use super::error::LibraryError;
use rusqlite::types::Value;

/// Builds an AND-joined `LIKE` predicate from the present, non-empty fields.
///
/// Returns an empty fragment (list everything) when no field is set. The
/// value sequence is parallel to the `?` placeholders, input order preserved.
pub fn build_where_clause(fields: &[(&'static str, Option<&str>)]) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    for (column, value) in fields {
        match value {
            Some(v) if !v.is_empty() => {
                clauses.push(format!("{} LIKE ?", column));
                values.push(Value::Text(format!("%{}%", v)));
            }
            _ => {}
        }
    }
    (clauses.join(" AND "), values)
}

/// Builds a comma-joined `SET` fragment from the provided assignments.
///
/// Explicit nulls are written as-is; only absent fields are left untouched.
/// An empty assignment list is a client error, not a no-op update.
pub fn build_set_clause(
    assignments: &[(&'static str, Value)],
) -> Result<(String, Vec<Value>), LibraryError> {
    if assignments.is_empty() {
        return Err(LibraryError::NoFields);
    }
    let clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");
    let values = assignments.iter().map(|(_, v)| v.clone()).collect();
    Ok((clause, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_empty_when_no_fields_set() {
        let (clause, values) = build_where_clause(&[("title", None), ("genre", None)]);
        assert_eq!(clause, "");
        assert!(values.is_empty());
    }

    #[test]
    fn where_clause_skips_empty_strings() {
        let (clause, values) =
            build_where_clause(&[("title", Some("")), ("genre", Some("techno"))]);
        assert_eq!(clause, "genre LIKE ?");
        assert_eq!(values, vec![Value::Text("%techno%".to_string())]);
    }

    #[test]
    fn where_clause_joins_with_and_in_input_order() {
        let (clause, values) = build_where_clause(&[
            ("number", Some("7")),
            ("title", None),
            ("theme", Some("rave")),
        ]);
        assert_eq!(clause, "number LIKE ? AND theme LIKE ?");
        assert_eq!(
            values,
            vec![
                Value::Text("%7%".to_string()),
                Value::Text("%rave%".to_string()),
            ]
        );
    }

    #[test]
    fn set_clause_rejects_empty_assignment_list() {
        let result = build_set_clause(&[]);
        assert!(matches!(result, Err(LibraryError::NoFields)));
    }

    #[test]
    fn set_clause_writes_explicit_nulls() {
        let (clause, values) = build_set_clause(&[
            ("title", Value::Text("X".to_string())),
            ("theme", Value::Null),
        ])
        .unwrap();
        assert_eq!(clause, "title = ?, theme = ?");
        assert_eq!(values, vec![Value::Text("X".to_string()), Value::Null]);
    }
}
