//! Safety checks so a report run never clobbers its own inputs.
//!
//! The legacy export and the override table are hand-maintained; writing a
//! report over either one loses operator work.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that an output path is safe to write.
///
/// Checks:
/// - Output cannot be the same file as any of the provided source paths
/// - Output must not already exist unless `force` is set
pub fn validate_output_path(output: &Path, source_paths: &[&Path], force: bool) -> Result<()> {
    let output_canon = canonical(output);
    for source in source_paths {
        if output == *source || output_canon == canonical(source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    if output.exists() && !force {
        bail!(
            "Safety check failed: output '{}' already exists (pass --force to overwrite)",
            output.display()
        );
    }

    Ok(())
}
