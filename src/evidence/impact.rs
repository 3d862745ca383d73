//! Impact assessment: a bounded weighted sum of
//! fired rules, banded by a step function.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactBand {
    Low,
    Medium,
    High,
    Critical,
}

pub fn band_for_score(score: f64) -> ImpactBand {
    if score < 0.25 {
        ImpactBand::Low
    } else if score < 0.5 {
        ImpactBand::Medium
    } else if score < 0.75 {
        ImpactBand::High
    } else {
        ImpactBand::Critical
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlastRadius {
    pub services: Vec<String>,
    pub teams: Vec<String>,
    pub systems: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub impact_score: f64,
    pub impact_band: ImpactBand,
    pub fired_rules: Vec<String>,
    pub consequence_text: String,
    pub blast_radius: BlastRadius,
}

/// Normalized inputs for impact scoring, one field per rule named in
/// 7: PR size, files changed, critical-file matches, incident
/// severity, alert severity, IaC resource counts, ownership delta.
#[derive(Debug, Clone, Default)]
pub struct ImpactInputs {
    pub pr_additions: u64,
    pub pr_deletions: u64,
    pub files_changed: u64,
    pub critical_file_matches: u64,
    pub incident_is_high_urgency: bool,
    pub alert_is_critical: bool,
    pub iac_resources_touched: u64,
    pub ownership_entries_changed: u64,
    pub blast_radius: BlastRadius,
}

struct Rule {
    id: &'static str,
    weight: f64,
    fires: fn(&ImpactInputs) -> bool,
}

const RULES: &[Rule] = &[
    Rule { id: "large_pr", weight: 0.15, fires: |i| i.pr_additions + i.pr_deletions > 300 },
    Rule { id: "many_files_changed", weight: 0.1, fires: |i| i.files_changed > 10 },
    Rule { id: "critical_file_touched", weight: 0.25, fires: |i| i.critical_file_matches > 0 },
    Rule { id: "high_urgency_incident", weight: 0.3, fires: |i| i.incident_is_high_urgency },
    Rule { id: "critical_alert", weight: 0.25, fires: |i| i.alert_is_critical },
    Rule { id: "iac_resources_touched", weight: 0.2, fires: |i| i.iac_resources_touched > 0 },
    Rule { id: "ownership_delta", weight: 0.15, fires: |i| i.ownership_entries_changed > 0 },
];

pub fn assess_impact(inputs: &ImpactInputs, consequence_text: impl Into<String>) -> ImpactAssessment {
    let mut score = 0.0;
    let mut fired_rules = Vec::new();
    for rule in RULES {
        if (rule.fires)(inputs) {
            score += rule.weight;
            fired_rules.push(rule.id.to_string());
        }
    }
    let score = score.min(1.0);
    ImpactAssessment {
        impact_score: score,
        impact_band: band_for_score(score),
        fired_rules,
        consequence_text: consequence_text.into(),
        blast_radius: inputs.blast_radius.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_fired_rules_is_low_band() {
        let assessment = assess_impact(&ImpactInputs::default(), "no notable impact");
        assert_eq!(assessment.impact_band, ImpactBand::Low);
        assert!(assessment.fired_rules.is_empty());
    }

    #[test]
    fn critical_incident_pushes_band_up() {
        let inputs = ImpactInputs { incident_is_high_urgency: true, critical_file_matches: 1, ..Default::default() };
        let assessment = assess_impact(&inputs, "affects a critical file during an active incident");
        assert!(assessment.impact_score >= 0.5);
        assert!(assessment.fired_rules.contains(&"high_urgency_incident".to_string()));
    }

    #[test]
    fn score_is_capped_at_one() {
        let inputs = ImpactInputs {
            pr_additions: 1000,
            files_changed: 50,
            critical_file_matches: 5,
            incident_is_high_urgency: true,
            alert_is_critical: true,
            iac_resources_touched: 10,
            ownership_entries_changed: 3,
            ..Default::default()
        };
        let assessment = assess_impact(&inputs, "maximal impact");
        assert!(assessment.impact_score <= 1.0);
        assert_eq!(assessment.impact_band, ImpactBand::Critical);
    }
}
