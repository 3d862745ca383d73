//! Policy Pack model, validation, selection, and hashing.

pub mod hash;
pub mod model;
pub mod selector;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support {
    use super::model::*;

    pub fn sample_pack() -> PolicyPack {
        PolicyPack {
            id: "pack-1".to_string(),
            workspace_id: "ws".to_string(),
            metadata: PackMetadata {
                id: "pack-1".to_string(),
                name: "Sample".to_string(),
                version: "1.0.0".to_string(),
                status: PackStatus::Active,
                owners: vec![],
                labels: vec![],
                pack_mode: PackMode::Enforce,
            },
            scope: PackScope {
                scope_type: ScopeType::Workspace,
                service_ref: None,
                branches: PathFilter::default(),
                repos: PathFilter::default(),
                pr_events: vec!["opened".to_string(), "synchronize".to_string(), "reopened".to_string()],
            },
            priority: 50,
            merge_strategy: MergeStrategy::MostRestrictive,
            defaults: PackDefaults::default(),
            rules: vec![],
        }
    }
}
