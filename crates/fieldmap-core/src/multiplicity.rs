//! Multiplicity strategies: Separate, Combine and Lookup
//!
//! These change the cardinality of a mapping (one value into many fields,
//! many fields into one value) or substitute values through a named table.
//! The session pipeline dispatches here for non-Map mapping kinds; the
//! functions themselves are pure over their inputs plus the audit sink.
//!
//! Copyright (c) 2026 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::audit::Audits;
use crate::error::{Error, Result};
use crate::mapping::LookupTable;
use regex::Regex;

/// Split `value` on the `delimiter` pattern into ordered segments
///
/// When a limit is configured, trailing segments beyond it are dropped and
/// a WARN audit is raised. Assigning segments to indexed output fields is
/// the pipeline's job; see [`short_segments_message`] for the audit it
/// raises when an output requests an index beyond the segment count.
///
/// # Errors
///
/// [`Error::Multiplicity`] when the delimiter is not a valid pattern.
pub fn separate(
    value: &str,
    delimiter: &str,
    limit: Option<usize>,
    audits: &mut Audits,
) -> Result<Vec<String>> {
    let pattern = Regex::new(delimiter).map_err(|e| {
        Error::multiplicity(format!("invalid separate delimiter '{}': {}", delimiter, e))
    })?;
    let mut segments: Vec<String> = pattern.split(value).map(str::to_string).collect();
    if let Some(limit) = limit {
        if segments.len() > limit {
            audits.add_warn(
                format!(
                    "Separate dropped {} segment(s) beyond limit={}",
                    segments.len() - limit,
                    limit
                ),
                None,
            );
            segments.truncate(limit);
        }
    }
    Ok(segments)
}

/// The literal audit message for an output field requesting a segment index
/// beyond what Separate produced
pub fn short_segments_message(count: usize, path: &str, index: usize) -> String {
    format!(
        "Separate returned fewer segments count={} when outputField.path={} requested index={}",
        count, path, index
    )
}

/// Join indexed values into one string
///
/// Inputs are sorted by index ascending with missing indices first (a
/// documented quirk the tests depend on), each non-null value is trimmed
/// unless `auto_trim` is off, and at most `limit` elements are taken. Null
/// elements contribute no text: with `add_delimiter_on_null` on they
/// collapse to the single delimiter already separating their neighbors;
/// with it off they suppress that delimiter too, joining the neighbors
/// directly.
pub fn combine(
    values: &[(Option<usize>, Option<String>)],
    delimiter: &str,
    limit: usize,
    auto_trim: bool,
    add_delimiter_on_null: bool,
) -> String {
    let mut ordered: Vec<&(Option<usize>, Option<String>)> = values.iter().collect();
    // Stable sort keeps declaration order among equal/missing indices
    ordered.sort_by_key(|(index, _)| match index {
        None => (0, 0),
        Some(i) => (1, *i),
    });
    ordered.truncate(limit);

    let mut out = String::new();
    let mut emitted = false;
    let mut delimit_next = true;
    for (_, value) in ordered {
        match value {
            None => {
                if !add_delimiter_on_null {
                    delimit_next = false;
                }
            }
            Some(v) => {
                let v = if auto_trim { v.trim() } else { v.as_str() };
                if emitted && delimit_next {
                    out.push_str(delimiter);
                }
                out.push_str(v);
                emitted = true;
                delimit_next = true;
            }
        }
    }
    out
}

/// Resolve `value` through a lookup table
///
/// Returns the target of the first pair whose source equals the value
/// (string equality). A miss is surfaced as a WARN audit and `None` - never
/// a silent pass-through of the input.
pub fn lookup(value: &str, table: &LookupTable, audits: &mut Audits) -> Option<String> {
    match table.find(value) {
        Some(target) => Some(target.to_string()),
        None => {
            audits.add_warn(
                format!(
                    "Lookup table '{}' has no entry matching value '{}'",
                    table.name, value
                ),
                None,
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separate_deterministic() {
        let mut audits = Audits::new();
        let segments = separate("a,b,c", ",", None, &mut audits).unwrap();
        assert_eq!(segments, vec!["a", "b", "c"]);
        assert!(audits.is_empty());
    }

    #[test]
    fn test_separate_limit_drops_with_warning() {
        let mut audits = Audits::new();
        let segments = separate("a,b,c,d", ",", Some(2), &mut audits).unwrap();
        assert_eq!(segments, vec!["a", "b"]);
        assert!(audits.has_warns());
        assert!(!audits.has_errors());
    }

    #[test]
    fn test_separate_regex_delimiter() {
        let mut audits = Audits::new();
        let segments = separate("a, b,  c", ",\\s*", None, &mut audits).unwrap();
        assert_eq!(segments, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_separate_invalid_pattern() {
        let mut audits = Audits::new();
        assert!(matches!(
            separate("a", "[", None, &mut audits),
            Err(Error::Multiplicity { .. })
        ));
    }

    #[test]
    fn test_short_segments_message_is_literal() {
        assert_eq!(
            short_segments_message(3, "/last", 3),
            "Separate returned fewer segments count=3 when outputField.path=/last requested index=3"
        );
    }

    #[test]
    fn test_combine_null_collapses_to_single_delimiter() {
        // Fixed oracle: the null element collapses to the one space already
        // separating its neighbors.
        let values = vec![
            (Some(0), Some("Ozzie".to_string())),
            (Some(1), None),
            (Some(2), Some("Smith".to_string())),
        ];
        assert_eq!(combine(&values, " ", 512, true, true), "Ozzie Smith");
    }

    #[test]
    fn test_combine_disabled_delimiter_on_null_joins_neighbors() {
        let values = vec![
            (Some(0), Some("Ozzie".to_string())),
            (Some(1), None),
            (Some(2), Some("Smith".to_string())),
        ];
        assert_eq!(combine(&values, " ", 512, true, false), "OzzieSmith");
    }

    #[test]
    fn test_combine_sorts_by_index_missing_first() {
        let values = vec![
            (Some(1), Some("b".to_string())),
            (None, Some("x".to_string())),
            (Some(0), Some("a".to_string())),
        ];
        assert_eq!(combine(&values, "-", 512, true, true), "x-a-b");
    }

    #[test]
    fn test_combine_auto_trim() {
        let values = vec![
            (Some(0), Some(" a ".to_string())),
            (Some(1), Some(" b".to_string())),
        ];
        assert_eq!(combine(&values, ",", 512, true, true), "a,b");
        assert_eq!(combine(&values, ",", 512, false, true), " a , b");
    }

    #[test]
    fn test_combine_limit() {
        let values = vec![
            (Some(0), Some("a".to_string())),
            (Some(1), Some("b".to_string())),
            (Some(2), Some("c".to_string())),
        ];
        assert_eq!(combine(&values, ",", 2, true, true), "a,b");
    }

    #[test]
    fn test_lookup_miss_warns() {
        let table = LookupTable::new("states").with_entry("AZ", "Arizona");
        let mut audits = Audits::new();
        assert_eq!(
            lookup("AZ", &table, &mut audits),
            Some("Arizona".to_string())
        );
        assert!(audits.is_empty());

        assert_eq!(lookup("XX", &table, &mut audits), None);
        assert!(audits.has_warns());
    }
}
