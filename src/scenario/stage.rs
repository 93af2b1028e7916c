// src/scenario/stage.rs

//! Per-run working directories.
//!
//! The bootstrap node runs in place on `<workdir>/bootstrap`, which holds the
//! seeded repositories. The replicator gets a brand-new temporary root with
//! only its identity copied in: org-node behaves differently when its root
//! already has content, and every run must start from the same state.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::{E2eError, Result};

const IDENTITY_FILE: &str = "identity";
const GIT_DIR: &str = "git";

/// Filesystem layout for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedNode {
    pub root: PathBuf,
    pub identity: PathBuf,
}

impl StagedNode {
    fn at(root: PathBuf) -> Self {
        let identity = root.join(IDENTITY_FILE);
        Self { root, identity }
    }

    /// Where org-node keeps its git storage.
    pub fn git_dir(&self) -> PathBuf {
        self.root.join(GIT_DIR)
    }
}

/// Both nodes' layouts. The replicator root is deleted when this is dropped.
#[derive(Debug)]
pub struct Staging {
    pub bootstrap: StagedNode,
    pub replicator: StagedNode,
    _replicator_dir: TempDir,
}

/// Prepare working directories from `workdir`, which must contain
/// `bootstrap/identity` and `replicator/identity`.
pub fn stage(workdir: &Path) -> Result<Staging> {
    let bootstrap = StagedNode::at(workdir.join("bootstrap"));
    require_file(&bootstrap.identity)?;

    let source_identity = workdir.join("replicator").join(IDENTITY_FILE);
    require_file(&source_identity)?;

    let replicator_dir = tempfile::Builder::new()
        .prefix("org-node-replicator-")
        .tempdir()?;
    let replicator = StagedNode::at(replicator_dir.path().to_path_buf());
    fs::copy(&source_identity, &replicator.identity)?;

    debug!(
        bootstrap_root = %bootstrap.root.display(),
        replicator_root = %replicator.root.display(),
        "staged working directories"
    );

    Ok(Staging {
        bootstrap,
        replicator,
        _replicator_dir: replicator_dir,
    })
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(E2eError::Staging(format!(
            "expected file {} does not exist",
            path.display()
        )))
    }
}
