use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    edit::{locate::AmbiguityPolicy, source::SourceContext},
    foundation::error::PagResult,
    model::{batch::BatchEntry, modification::ModificationList},
    pipeline::persist::{OutcomeLedger, PersistencePipeline},
    sdk::DocumentSdk,
};

/// Outcome of one batch entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BatchItemReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<OutcomeLedger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct BatchReport {
    pub generated: usize,
    pub failed: usize,
    pub items: Vec<BatchItemReport>,
}

/// Run every entry through its own persistence pipeline against one template.
///
/// Outputs are named `<template-stem>_<name>.pag`. A failing entry is recorded and the rest
/// continue; only an unreadable template or output directory aborts the batch.
#[tracing::instrument(skip(sdk, entries, sources), fields(entries = entries.len()))]
pub fn generate_batch<S: DocumentSdk>(
    sdk: &S,
    template: &Path,
    entries: &[BatchEntry],
    out_dir: &Path,
    sources: &SourceContext,
    policy: AmbiguityPolicy,
) -> PagResult<BatchReport> {
    let input = std::fs::read(template)
        .with_context(|| format!("read template '{}'", template.display()))?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string());

    let mut report = BatchReport::default();
    for (i, entry) in entries.iter().enumerate() {
        let name = entry.output_name(i);
        let list = ModificationList::new(entry.modifications.clone());
        let result = PersistencePipeline::new(sdk, sources)
            .with_policy(policy)
            .run(&input, &list)
            .and_then(|out| {
                let path = out_dir.join(format!("{stem}_{}.pag", file_safe(&name)));
                std::fs::write(&path, &out.bytes)
                    .with_context(|| format!("write '{}'", path.display()))?;
                Ok((path, out.ledger))
            });

        match result {
            Ok((path, ledger)) => {
                tracing::info!(%name, path = %path.display(), failed_items = ledger.failed, "generated");
                report.generated += 1;
                report.items.push(BatchItemReport {
                    name,
                    path: Some(path),
                    ledger: Some(ledger),
                    error: None,
                });
            }
            Err(err) => {
                tracing::warn!(%name, %err, "batch entry failed");
                report.failed += 1;
                report.items.push(BatchItemReport {
                    name,
                    path: None,
                    ledger: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    tracing::info!(
        generated = report.generated,
        failed = report.failed,
        "batch complete"
    );
    Ok(report)
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/batch.rs"]
mod tests;
