//! Pack Selector.

use super::model::{PolicyPack, ScopeType};
use crate::globbing::any_glob_matches;
use crate::pr_context::PrContext;

/// Describes the request being matched against pack scopes: everything a
/// scope rule needs that isn't already on [`PrContext`] (the repo's
/// service mapping, if any).
pub struct SelectionRequest<'a> {
    pub pr: &'a PrContext,
    pub event_type_str: &'a str,
    pub service_ref: Option<&'a str>,
}

fn pack_matches(pack: &PolicyPack, req: &SelectionRequest<'_>) -> bool {
    if pack.workspace_id != req.pr.workspace_id {
        return false;
    }

    let scope_matches = match pack.scope.scope_type {
        ScopeType::Workspace => true,
        ScopeType::Service => pack
            .scope
            .service_ref
            .as_deref()
            .zip(req.service_ref)
            .map(|(a, b)| a == b)
            .unwrap_or(false),
        ScopeType::Repo => {
            let repo_name = format!("{}/{}", req.pr.owner, req.pr.repo);
            pack.scope.repos.matches(&any_glob_matches_adapter, &repo_name)
        }
    };
    if !scope_matches {
        return false;
    }

    if !pack.scope.branches.matches(&any_glob_matches_adapter, &req.pr.head_branch) {
        return false;
    }

    pack.scope.pr_events.iter().any(|e| e == req.event_type_str)
}

fn any_glob_matches_adapter(glob: &str, value: &str) -> bool {
    crate::globbing::glob_match(glob, value)
}

/// Selects and orders all active, matching packs: `(priority desc, packId
/// asc)` — deterministic and stable across re-evaluations with the same
/// inputs.
pub fn select_packs<'a>(all_packs: &'a [PolicyPack], req: &SelectionRequest<'_>) -> Vec<&'a PolicyPack> {
    let mut selected: Vec<&PolicyPack> = all_packs
        .iter()
        .filter(|p| p.metadata.status == super::model::PackStatus::Active)
        .filter(|p| pack_matches(p, req))
        .collect();
    selected.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::test_support::sample_pack;
    use crate::pr_context::PrEventType;

    fn sample_pr() -> PrContext {
        PrContext {
            workspace_id: "ws".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            pr_number: 1,
            event_type: PrEventType::Opened,
            head_sha: "h".to_string(),
            base_sha: "b".to_string(),
            base_branch: "main".to_string(),
            head_branch: "feature/x".to_string(),
            author: "alice".to_string(),
            author_is_bot: false,
            title: String::new(),
            body: String::new(),
            labels: vec![],
            commits: vec![],
            additions: 0,
            deletions: 0,
            files: vec![],
            approvals: vec![],
            check_runs: vec![],
        }
    }

    #[test]
    fn orders_by_priority_desc_then_id_asc() {
        let pr = sample_pr();
        let mut a = sample_pack();
        a.id = "zeta".to_string();
        a.priority = 50;
        let mut b = sample_pack();
        b.id = "alpha".to_string();
        b.priority = 50;
        let mut c = sample_pack();
        c.id = "gamma".to_string();
        c.priority = 90;

        let packs = vec![a, b, c];
        let req = SelectionRequest { pr: &pr, event_type_str: "opened", service_ref: None };
        let selected = select_packs(&packs, &req);
        let ids: Vec<&str> = selected.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["gamma", "alpha", "zeta"]);
    }

    #[test]
    fn excludes_non_active_packs() {
        let pr = sample_pr();
        let mut pack = sample_pack();
        pack.metadata.status = crate::pack::model::PackStatus::Draft;
        let req = SelectionRequest { pr: &pr, event_type_str: "opened", service_ref: None };
        assert!(select_packs(&[pack], &req).is_empty());
    }

    #[test]
    fn excludes_packs_whose_pr_event_is_not_declared() {
        let pr = sample_pr();
        let pack = sample_pack();
        let req = SelectionRequest { pr: &pr, event_type_str: "labeled", service_ref: None };
        assert!(select_packs(&[pack], &req).is_empty());
    }
}
