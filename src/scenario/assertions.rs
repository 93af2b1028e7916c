// src/scenario/assertions.rs

//! Post-run checks on the nodes' git storage.

use std::path::Path;

use crate::errors::{E2eError, Result};
use crate::types::NodeRole;

use super::stage::StagedNode;

/// Refs from `refs` that do not exist as files under `git_dir`.
pub fn missing_refs<'a>(git_dir: &Path, refs: &'a [String]) -> Vec<&'a str> {
    refs.iter()
        .map(String::as_str)
        .filter(|r| !git_dir.join(r).is_file())
        .collect()
}

/// Check every `(role, node, refs)` triple, reporting all misses together
/// as `<role>:<ref>`.
pub fn assert_refs(checks: &[(NodeRole, &StagedNode, &[String])]) -> Result<()> {
    let missing: Vec<String> = checks
        .iter()
        .flat_map(|(role, node, refs)| {
            missing_refs(&node.git_dir(), refs)
                .into_iter()
                .map(move |r| format!("{role}:{r}"))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(E2eError::MissingRefs(missing))
    }
}
