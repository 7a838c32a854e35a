use std::io::Read;

use crate::{
    edit::{
        execute::{Executor, ItemOutcome},
        locate::AmbiguityPolicy,
        source::SourceContext,
    },
    foundation::error::{PagError, PagResult},
    model::modification::ModificationList,
    sdk::{Document, DocumentSdk, LayerKind, capability},
};

/// Stage of one persistence run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loaded,
    Modifying,
    Serialized,
    Done,
    Failed,
}

/// Per-batch counters. Deferred items count as succeeded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct OutcomeLedger {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl OutcomeLedger {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// One failed item, by position in the modification list.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ItemFailure {
    pub position: usize,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub ledger: OutcomeLedger,
    pub failures: Vec<ItemFailure>,
}

/// Load, modify and re-serialize one document.
///
/// Load and save failures are fatal; individual item failures only land in the ledger.
pub struct PersistencePipeline<'a, S: DocumentSdk> {
    sdk: &'a S,
    sources: &'a SourceContext,
    policy: AmbiguityPolicy,
    state: PipelineState,
}

impl<'a, S: DocumentSdk> PersistencePipeline<'a, S> {
    pub fn new(sdk: &'a S, sources: &'a SourceContext) -> Self {
        Self {
            sdk,
            sources,
            policy: AmbiguityPolicy::default(),
            state: PipelineState::Idle,
        }
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    #[tracing::instrument(skip_all, fields(input_len = input.len(), items = list.len()))]
    pub fn run(&mut self, input: &[u8], list: &ModificationList) -> PagResult<ExportOutput> {
        let result = self.run_stages(input, list);
        if let Err(err) = &result {
            self.advance(PipelineState::Failed);
            tracing::warn!(%err, "export failed");
        }
        result
    }

    fn run_stages(&mut self, input: &[u8], list: &ModificationList) -> PagResult<ExportOutput> {
        capability::ensure_available()?;

        let mut document = self
            .sdk
            .load(input)
            .ok_or_else(|| PagError::input_unreadable("document sdk could not parse input"))?;
        self.advance(PipelineState::Loaded);
        log_document_summary(&document);

        self.advance(PipelineState::Modifying);
        let executor = Executor::new(self.sdk, self.sources).with_policy(self.policy);
        let mut ledger = OutcomeLedger::default();
        let mut failures = Vec::new();
        for (position, modification) in list.iter().enumerate() {
            let outcome = executor.execute(&mut document, modification);
            ledger.record(&outcome);
            if let ItemOutcome::Failed(err) = outcome {
                failures.push(ItemFailure {
                    position,
                    kind: modification.kind_name(),
                    reason: err.to_string(),
                });
            }
        }

        let bytes = serialize(&document)?;
        self.advance(PipelineState::Serialized);

        tracing::info!(
            succeeded = ledger.succeeded,
            failed = ledger.failed,
            total = ledger.total,
            out_len = bytes.len(),
            "export complete"
        );
        self.advance(PipelineState::Done);
        Ok(ExportOutput {
            bytes,
            ledger,
            failures,
        })
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }
}

/// Save `document` through a scoped temp file and read the bytes back.
pub fn serialize<D: Document>(document: &D) -> PagResult<Vec<u8>> {
    let out = tempfile::Builder::new()
        .prefix("pagsmith-out-")
        .suffix(".pag")
        .tempfile()
        .map_err(|e| PagError::serialization_failed(format!("create output temp file: {e}")))?;
    if !document.save(out.path()) {
        return Err(PagError::serialization_failed(
            "document save returned false",
        ));
    }
    let mut bytes = Vec::new();
    out.reopen()
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| PagError::serialization_failed(format!("read saved document: {e}")))?;
    Ok(bytes)
}

pub fn log_document_summary<D: Document>(document: &D) {
    tracing::info!(
        width = document.width(),
        height = document.height(),
        duration_secs = document.duration_micros() as f64 / 1_000_000.0,
        frame_rate = document.frame_rate(),
        texts = document.num_texts(),
        images = document.num_images(),
        editable_images = ?document.editable_indices(LayerKind::Image),
        "document loaded"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/persist.rs"]
mod tests;
