//! Field predicates for filtered listing.
//!
//! Predicates are mostly used to answer "children of parent P" without a
//! stored child list: `Predicate::eq("parent", dc.pk())`.

use serde_json::Value;

use crate::record::Record;

/// A composable filter over record fields.
///
/// A test against a field the record does not have is false for `Eq` and
/// `In`, and true for `Neq`.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Field equals value.
    Eq(String, Value),
    /// Field differs from value (or is absent).
    Neq(String, Value),
    /// Field equals any of the values.
    In(String, Vec<Value>),
    /// All predicates match. An empty `And` matches everything.
    And(Vec<Predicate>),
    /// Any predicate matches. An empty `Or` matches nothing.
    Or(Vec<Predicate>),
    /// Inverts the inner predicate.
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Neq(field.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Conjunction; nested `And`s are flattened.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), p) => {
                a.push(p);
                Self::And(a)
            }
            (p, Self::And(mut b)) => {
                b.insert(0, p);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Disjunction; nested `Or`s are flattened.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Or(mut a), Self::Or(b)) => {
                a.extend(b);
                Self::Or(a)
            }
            (Self::Or(mut a), p) => {
                a.push(p);
                Self::Or(a)
            }
            (p, Self::Or(mut b)) => {
                b.insert(0, p);
                Self::Or(b)
            }
            (a, b) => Self::Or(vec![a, b]),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            p => Self::Not(Box::new(p)),
        }
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq(field, value) => record.field(field) == Some(value),
            Self::Neq(field, value) => record.field(field) != Some(value),
            Self::In(field, values) => record
                .field(field)
                .is_some_and(|found| values.contains(found)),
            Self::And(all) => all.iter().all(|p| p.matches(record)),
            Self::Or(any) => any.iter().any(|p| p.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inv_types::Threshold;
    use serde_json::json;

    fn host(id: &str, cluster: &str, maintenance: bool) -> Record {
        Record::new(
            "Host",
            id,
            Threshold::ZERO,
            json!({
                "id": id,
                "parent": cluster,
                "in_maintenance": maintenance,
                "cpu": {"sockets": 2},
            }),
        )
    }

    #[test]
    fn eq_and_neq() {
        let h = host("h-1", "c-1", false);
        assert!(Predicate::eq("parent", "c-1").matches(&h));
        assert!(!Predicate::eq("parent", "c-2").matches(&h));
        assert!(Predicate::neq("parent", "c-2").matches(&h));
        assert!(Predicate::eq("in_maintenance", false).matches(&h));
    }

    #[test]
    fn missing_field() {
        let h = host("h-1", "c-1", false);
        assert!(!Predicate::eq("nope", "x").matches(&h));
        assert!(Predicate::neq("nope", "x").matches(&h));
        assert!(!Predicate::is_in("nope", ["x"]).matches(&h));
    }

    #[test]
    fn dotted_field() {
        let h = host("h-1", "c-1", false);
        assert!(Predicate::eq("cpu.sockets", 2).matches(&h));
    }

    #[test]
    fn membership() {
        let h = host("h-1", "c-2", false);
        assert!(Predicate::is_in("parent", ["c-1", "c-2"]).matches(&h));
        assert!(!Predicate::is_in("parent", ["c-3"]).matches(&h));
    }

    #[test]
    fn composition() {
        let h = host("h-1", "c-1", true);
        let p = Predicate::eq("parent", "c-1").and(Predicate::eq("in_maintenance", true));
        assert!(p.matches(&h));

        let p = Predicate::eq("parent", "c-9").or(Predicate::eq("id", "h-1"));
        assert!(p.matches(&h));

        assert!(!Predicate::eq("id", "h-1").negate().matches(&h));
    }

    #[test]
    fn and_flattens() {
        let p = Predicate::eq("a", 1)
            .and(Predicate::eq("b", 2))
            .and(Predicate::eq("c", 3));
        match p {
            Predicate::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn double_negation_cancels() {
        let p = Predicate::eq("a", 1);
        assert_eq!(p.clone().negate().negate(), p);
    }

    #[test]
    fn empty_combinators() {
        let h = host("h-1", "c-1", false);
        assert!(Predicate::And(vec![]).matches(&h));
        assert!(!Predicate::Or(vec![]).matches(&h));
    }
}
