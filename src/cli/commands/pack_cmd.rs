use anyhow::{Context, Result};

use super::Command;
use crate::comparators::ComparatorRegistry;
use crate::pack::hash::content_hash;
use crate::pack::model::PolicyPack;
use crate::pack::validator::{validate_semantics, validate_structure};

fn load_and_validate(path: &str) -> Result<PolicyPack> {
    let comparators = ComparatorRegistry::with_builtins();
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading pack {path}"))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    validate_structure(&value).map_err(|errs| anyhow::anyhow!("{path} failed structural validation: {errs:?}"))?;
    let pack: PolicyPack = serde_json::from_value(value)?;
    validate_semantics(&pack, &comparators).map_err(|errs| anyhow::anyhow!("{path} failed semantic validation: {errs:?}"))?;
    Ok(pack)
}

pub struct PackValidateCommand {
    pub path: String,
}

#[async_trait::async_trait]
impl Command for PackValidateCommand {
    async fn execute(&self) -> Result<()> {
        let pack = load_and_validate(&self.path)?;
        println!("{} is valid ({} rules)", pack.id, pack.rules.len());
        Ok(())
    }
}

pub struct PackPublishCommand {
    pub path: String,
}

#[async_trait::async_trait]
impl Command for PackPublishCommand {
    async fn execute(&self) -> Result<()> {
        let pack = load_and_validate(&self.path)?;
        let hash = content_hash(&pack);
        println!("{}", serde_json::json!({ "id": pack.id, "contentHash": hash }));
        Ok(())
    }
}
