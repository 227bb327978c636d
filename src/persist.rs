//! Best-effort persistence of converted Markdown.
//!
//! Runs after a successful conversion. The destination depends on where the
//! input lives:
//!
//! | Input under | Written to |
//! |-------------|------------|
//! | shared data root | `<input dir>/<stem>.md` (sibling) |
//! | legacy input root | `<legacy output dir>/<stem>.md` |
//! | anything else | nothing |
//!
//! Failures are reported as [`PersistOutcome::Failed`] and logged at `warn`;
//! they never reach the caller of the endpoint.

use crate::allow_list::is_within;
use crate::config::ServiceConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What the persist step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The input is under neither root.
    Skipped,
    /// Markdown was written to this path.
    Written(PathBuf),
    /// Writing to this path failed.
    Failed { path: PathBuf, reason: String },
}

/// Where the Markdown for `input` should go, if anywhere.
///
/// Never the input itself: a `.md` input under the shared data root has no
/// sibling target.
pub fn output_target(config: &ServiceConfig, input: &Path) -> Option<PathBuf> {
    let file_name = markdown_file_name(input)?;

    let target = if config
        .shared_data_root
        .as_deref()
        .is_some_and(|root| is_within(input, root))
    {
        input.parent()?.join(&file_name)
    } else if config
        .legacy_input_root
        .as_deref()
        .is_some_and(|root| is_within(input, root))
    {
        config.legacy_output_dir.join(&file_name)
    } else {
        return None;
    };

    (target != input).then_some(target)
}

fn markdown_file_name(input: &Path) -> Option<String> {
    input
        .file_stem()
        .map(|stem| format!("{}.md", stem.to_string_lossy()))
}

/// Write `markdown` to the target for `input`, swallowing failures.
pub async fn persist(config: &ServiceConfig, input: &Path, markdown: &str) -> PersistOutcome {
    let Some(target) = output_target(config, input) else {
        return PersistOutcome::Skipped;
    };

    match write_atomic(&target, markdown).await {
        Ok(()) => {
            info!("Markdown saved to: {}", target.display());
            PersistOutcome::Written(target)
        }
        Err(e) => {
            warn!(
                "Could not save Markdown for {} to {}: {}",
                input.display(),
                target.display(),
                e
            );
            PersistOutcome::Failed {
                path: target,
                reason: e.to_string(),
            }
        }
    }
}

/// Atomic write: create the parent, write a temp file beside the target,
/// then rename over it.
async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("md.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}
