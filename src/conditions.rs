//! Condition evaluator.
//!
//! The fact/condition tree is naturally recursive, so it is modeled as an
//! algebraic sum: `Simple{fact, op, value}` or `Composite{op, children}`.
//! Evaluation is post-order with
//! short-circuit, matching the decision-gate-core interfaces style of
//! small, serializable, side-effect-free trees.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::facts::FactValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    ContainsAll,
    Matches,
    StartsWith,
    EndsWith,
}

/// Three-valued logic result: unknown propagates rather than defaulting to
/// false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    True,
    False,
    Unknown,
}

impl TriState {
    pub fn not(self) -> TriState {
        match self {
            TriState::True => TriState::False,
            TriState::False => TriState::True,
            TriState::Unknown => TriState::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        matches!(self, TriState::True)
    }
}

fn and(values: &[TriState]) -> TriState {
    // Any false dominates (short-circuit); else any unknown makes it
    // unknown; else true.
    if values.iter().any(|v| matches!(v, TriState::False)) {
        TriState::False
    } else if values.iter().any(|v| matches!(v, TriState::Unknown)) {
        TriState::Unknown
    } else {
        TriState::True
    }
}

fn or(values: &[TriState]) -> TriState {
    if values.iter().any(|v| matches!(v, TriState::True)) {
        TriState::True
    } else if values.iter().any(|v| matches!(v, TriState::Unknown)) {
        TriState::Unknown
    } else {
        TriState::False
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// `Condition = Simple{fact, op, value} | Composite{op, children}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Simple {
        fact: String,
        operator: Operator,
        value: serde_json::Value,
    },
    Composite {
        operator: BoolOp,
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// Post-order, short-circuit evaluation over a fact-resolving closure.
    pub fn evaluate(&self, resolve: &dyn Fn(&str) -> Option<FactValue>) -> TriState {
        match self {
            Condition::Simple { fact, operator, value } => match resolve(fact) {
                None => TriState::Unknown,
                Some(actual) => evaluate_operator(*operator, &actual, value),
            },
            Condition::Composite { operator, conditions } => {
                let children: Vec<TriState> = conditions.iter().map(|c| c.evaluate(resolve)).collect();
                match operator {
                    BoolOp::And => and(&children),
                    BoolOp::Or => or(&children),
                    BoolOp::Not => children.first().copied().unwrap_or(TriState::Unknown).not(),
                }
            }
        }
    }
}

fn evaluate_operator(op: Operator, actual: &FactValue, expected: &serde_json::Value) -> TriState {
    use serde_json::Value as J;

    match op {
        Operator::Eq => bool_to_tri(actual.loosely_eq(expected)),
        Operator::Ne => bool_to_tri(!actual.loosely_eq(expected)),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            match (actual.as_f64(), coerce_numeric(expected)) {
                (Some(a), Some(b)) => {
                    let ord = a.partial_cmp(&b);
                    match (op, ord) {
                        (Operator::Gt, Some(Ordering::Greater)) => TriState::True,
                        (Operator::Gte, Some(Ordering::Greater | Ordering::Equal)) => TriState::True,
                        (Operator::Lt, Some(Ordering::Less)) => TriState::True,
                        (Operator::Lte, Some(Ordering::Less | Ordering::Equal)) => TriState::True,
                        (_, Some(_)) => TriState::False,
                        (_, None) => TriState::Unknown,
                    }
                }
                _ => TriState::Unknown,
            }
        }
        Operator::In => match expected {
            J::Array(items) => bool_to_tri(items.iter().any(|item| actual.loosely_eq(item))),
            _ => TriState::Unknown,
        },
        Operator::Contains => match actual {
            FactValue::Array(items) => {
                bool_to_tri(items.iter().any(|item| item.loosely_eq(expected)))
            }
            FactValue::String(s) => match expected {
                J::String(needle) => bool_to_tri(s.contains(needle.as_str())),
                _ => TriState::Unknown,
            },
            _ => TriState::Unknown,
        },
        Operator::ContainsAll => match (actual, expected) {
            (FactValue::Array(items), J::Array(needles)) => bool_to_tri(
                needles.iter().all(|needle| items.iter().any(|item| item.loosely_eq(needle))),
            ),
            _ => TriState::Unknown,
        },
        Operator::Matches => match (actual, expected) {
            (FactValue::String(s), J::String(pattern)) => match regex::Regex::new(pattern) {
                Ok(re) => bool_to_tri(re.is_match(s)),
                Err(_) => TriState::Unknown,
            },
            _ => TriState::Unknown,
        },
        Operator::StartsWith => match (actual, expected) {
            (FactValue::String(s), J::String(prefix)) => bool_to_tri(s.starts_with(prefix.as_str())),
            _ => TriState::Unknown,
        },
        Operator::EndsWith => match (actual, expected) {
            (FactValue::String(s), J::String(suffix)) => bool_to_tri(s.ends_with(suffix.as_str())),
            _ => TriState::Unknown,
        },
    }
}

fn bool_to_tri(b: bool) -> TriState {
    if b {
        TriState::True
    } else {
        TriState::False
    }
}

fn coerce_numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver(value: Option<FactValue>) -> impl Fn(&str) -> Option<FactValue> {
        move |_| value.clone()
    }

    #[test]
    fn not_involution_holds_for_known_values() {
        let c = Condition::Simple {
            fact: "pr.approvals.count".to_string(),
            operator: Operator::Gte,
            value: json!(2),
        };
        let r = resolver(Some(FactValue::Number(3.0)));
        let direct = c.evaluate(&r);
        let double_not = Condition::Composite {
            operator: BoolOp::Not,
            conditions: vec![Condition::Composite {
                operator: BoolOp::Not,
                conditions: vec![c.clone()],
            }],
        };
        assert_eq!(direct.evaluate(&r).is_true(), double_not.evaluate(&r).is_true());
    }

    #[test]
    fn unknown_monotonicity_and() {
        let known_false = Condition::Simple {
            fact: "x".to_string(),
            operator: Operator::Eq,
            value: json!(1),
        };
        let r_false = resolver(Some(FactValue::Number(2.0)));
        let r_unknown = resolver(None);

        let composite = Condition::Composite {
            operator: BoolOp::And,
            conditions: vec![known_false.clone()],
        };
        assert_eq!(composite.evaluate(&r_false), TriState::False);

        // Adding an unknown child to an AND that already has a false child
        // must not flip it to true.
        let composite_with_unknown = Condition::Composite {
            operator: BoolOp::And,
            conditions: vec![
                known_false,
                Condition::Simple {
                    fact: "y".to_string(),
                    operator: Operator::Eq,
                    value: json!(1),
                },
            ],
        };
        assert_eq!(composite_with_unknown.evaluate(&r_false), TriState::False);
        let _ = r_unknown;
    }

    #[test]
    fn or_unknown_unless_another_true() {
        let c = Condition::Composite {
            operator: BoolOp::Or,
            conditions: vec![
                Condition::Simple {
                    fact: "a".to_string(),
                    operator: Operator::Eq,
                    value: json!(1),
                },
                Condition::Simple {
                    fact: "b".to_string(),
                    operator: Operator::Eq,
                    value: json!(1),
                },
            ],
        };
        let resolve = |f: &str| -> Option<FactValue> {
            match f {
                "a" => None,
                "b" => Some(FactValue::Number(0.0)),
                _ => None,
            }
        };
        assert_eq!(c.evaluate(&resolve), TriState::Unknown);
    }
}
