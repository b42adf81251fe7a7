//! Predicate/argument accumulator compiled from validated filter values.
//!
//! `build()` is the single place where predicates serialize to SQL text;
//! every value travels as a positional argument and every column name comes
//! from a closed enum, which keeps injection safety centralized.

#![allow(missing_docs)]

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value};

use crate::query::validate::DateRange;

/// One positional SQL argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    Int(i64),
    Text(String),
}

impl ToSql for FilterArg {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Int(v) => Ok(ToSqlOutput::Owned(Value::Integer(*v))),
            Self::Text(v) => Ok(ToSqlOutput::Owned(Value::Text(v.clone()))),
        }
    }
}

/// Multi-valued text columns a request may filter on. The SQL name is fixed
/// here, never taken from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFilterColumn {
    FromHost,
    SysLogTag,
}

impl TextFilterColumn {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::FromHost => "FromHost",
            Self::SysLogTag => "SysLogTag",
        }
    }
}

/// Request-scoped, ordered predicate accumulator.
///
/// Predicates AND-combine in insertion order, except the date range which —
/// when present — always compiles first. Argument order matches placeholder
/// order exactly (positional binding).
#[derive(Debug, Default, Clone)]
pub struct FilterSet {
    date_range: Option<DateRange>,
    predicates: Vec<String>,
    args: Vec<FilterArg>,
}

impl FilterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Range predicate over the authoritative receipt timestamp.
    pub fn date_range(&mut self, range: DateRange) -> &mut Self {
        self.date_range = Some(range);
        self
    }

    /// Severity membership via arithmetic extraction: `Priority % 8 IN (...)`.
    ///
    /// `p % 8` is the true severity for both storage generations — legacy
    /// rows satisfy `p <= 7` so `p % 8 = p`, modern rows store
    /// `facility*8 + severity` where the facility component is a multiple
    /// of 8. One expression, never branched on the dataset classification.
    pub fn severities(&mut self, values: &[i64]) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        self.predicates
            .push(format!("Priority % 8 IN ({})", placeholders(values.len())));
        self.args.extend(values.iter().map(|v| FilterArg::Int(*v)));
        self
    }

    /// Raw facility membership.
    pub fn facilities(&mut self, values: &[i64]) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        self.predicates
            .push(format!("Facility IN ({})", placeholders(values.len())));
        self.args.extend(values.iter().map(|v| FilterArg::Int(*v)));
        self
    }

    /// Free-text search: a record matches when ANY term appears in the
    /// message, so terms compile to a parenthesized OR of substring matches.
    pub fn message_terms(&mut self, terms: &[String]) -> &mut Self {
        if terms.is_empty() {
            return self;
        }
        let ors = vec!["Message LIKE ?"; terms.len()].join(" OR ");
        self.predicates.push(format!("({ors})"));
        self.args
            .extend(terms.iter().map(|t| FilterArg::Text(format!("%{t}%"))));
        self
    }

    /// Multi-valued categorical membership on an allow-listed text column.
    pub fn text_values(&mut self, column: TextFilterColumn, values: &[String]) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        self.predicates.push(format!(
            "{} IN ({})",
            column.as_sql(),
            placeholders(values.len())
        ));
        self.args
            .extend(values.iter().map(|v| FilterArg::Text(v.clone())));
        self
    }

    /// Number of compiled predicates, date range included.
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.predicates.len() + usize::from(self.date_range.is_some())
    }

    /// Serialize to `(where_expression, positional_arguments)`.
    ///
    /// An empty set builds to the always-true `1=1`, so downstream query
    /// construction never needs a "no WHERE clause" branch.
    #[must_use]
    pub fn build(&self) -> (String, Vec<FilterArg>) {
        let mut conditions = Vec::with_capacity(self.predicates.len() + 1);
        let mut args = Vec::with_capacity(self.args.len() + 2);

        if let Some(range) = &self.date_range {
            conditions.push("ReceivedAt BETWEEN ? AND ?".to_string());
            args.push(FilterArg::Text(DateRange::format_bound(range.start)));
            args.push(FilterArg::Text(DateRange::format_bound(range.end)));
        }
        conditions.extend(self.predicates.iter().cloned());
        args.extend(self.args.iter().cloned());

        if conditions.is_empty() {
            return ("1=1".to_string(), Vec::new());
        }
        (conditions.join(" AND "), args)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::validate::validate_date_range;

    fn range() -> DateRange {
        validate_date_range(Some("2025-02-15T10:00:00Z"), Some("2025-02-16T10:00:00Z")).unwrap()
    }

    #[test]
    fn empty_set_builds_always_true() {
        let (expr, args) = FilterSet::new().build();
        assert_eq!(expr, "1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn date_range_compiles_first_with_two_args() {
        let mut filter = FilterSet::new();
        filter.severities(&[3]).date_range(range());
        let (expr, args) = filter.build();
        assert!(expr.starts_with("ReceivedAt BETWEEN ? AND ?"));
        assert_eq!(args.len(), 3);
        assert_eq!(
            args[0],
            FilterArg::Text("2025-02-15T10:00:00Z".to_string())
        );
        assert_eq!(
            args[1],
            FilterArg::Text("2025-02-16T10:00:00Z".to_string())
        );
    }

    #[test]
    fn severity_filter_uses_modulo_extraction() {
        let mut filter = FilterSet::new();
        filter.severities(&[3, 4]);
        let (expr, args) = filter.build();
        assert_eq!(expr, "Priority % 8 IN (?,?)");
        assert_eq!(args, vec![FilterArg::Int(3), FilterArg::Int(4)]);
    }

    #[test]
    fn facility_filter_is_plain_membership() {
        let mut filter = FilterSet::new();
        filter.facilities(&[0, 16]);
        let (expr, args) = filter.build();
        assert_eq!(expr, "Facility IN (?,?)");
        assert_eq!(args, vec![FilterArg::Int(0), FilterArg::Int(16)]);
    }

    #[test]
    fn message_terms_or_combine() {
        let mut filter = FilterSet::new();
        filter.message_terms(&["disk".to_string(), "error".to_string()]);
        let (expr, args) = filter.build();
        assert_eq!(expr, "(Message LIKE ? OR Message LIKE ?)");
        assert_eq!(
            args,
            vec![
                FilterArg::Text("%disk%".to_string()),
                FilterArg::Text("%error%".to_string()),
            ]
        );
    }

    #[test]
    fn text_values_use_allow_listed_column_names() {
        let mut filter = FilterSet::new();
        filter.text_values(TextFilterColumn::FromHost, &["web01".to_string()]);
        filter.text_values(TextFilterColumn::SysLogTag, &["sshd:".to_string()]);
        let (expr, args) = filter.build();
        assert_eq!(expr, "FromHost IN (?) AND SysLogTag IN (?)");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn empty_dimensions_add_nothing() {
        let mut filter = FilterSet::new();
        filter
            .severities(&[])
            .facilities(&[])
            .message_terms(&[])
            .text_values(TextFilterColumn::FromHost, &[]);
        let (expr, args) = filter.build();
        assert_eq!(expr, "1=1");
        assert!(args.is_empty());
        assert_eq!(filter.predicate_count(), 0);
    }

    #[test]
    fn argument_order_matches_placeholder_order() {
        let mut filter = FilterSet::new();
        filter
            .date_range(range())
            .severities(&[2])
            .facilities(&[3])
            .message_terms(&["oom".to_string()]);
        let (expr, args) = filter.build();

        assert_eq!(
            expr,
            "ReceivedAt BETWEEN ? AND ? AND Priority % 8 IN (?) \
             AND Facility IN (?) AND (Message LIKE ?)"
        );
        assert_eq!(expr.matches('?').count(), args.len());
        assert_eq!(args[2], FilterArg::Int(2));
        assert_eq!(args[3], FilterArg::Int(3));
        assert_eq!(args[4], FilterArg::Text("%oom%".to_string()));
    }

    #[test]
    fn hostile_values_stay_in_arguments() {
        let mut filter = FilterSet::new();
        filter.message_terms(&["'; DROP TABLE SystemEvents; --".to_string()]);
        let (expr, args) = filter.build();
        assert!(!expr.contains("DROP"));
        assert_eq!(args.len(), 1);
    }
}
