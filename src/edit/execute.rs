use std::path::Path;

use crate::{
    edit::{
        locate::{AmbiguityPolicy, Locator},
        recover::{RecoveredTransform, recover_transform},
        source::SourceContext,
    },
    foundation::error::{PagError, PagResult},
    model::modification::{Modification, TransformSpec},
    sdk::{Document, DocumentSdk, LayerKind},
};

/// Result of applying one modification.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The document was mutated.
    Applied,
    /// Accepted without touching the document (render-time transforms).
    Deferred,
    Failed(PagError),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Applies typed modifications to one loaded document.
pub struct Executor<'a, S: DocumentSdk> {
    sdk: &'a S,
    sources: &'a SourceContext,
    locator: Locator,
}

impl<'a, S: DocumentSdk> Executor<'a, S> {
    pub fn new(sdk: &'a S, sources: &'a SourceContext) -> Self {
        Self {
            sdk,
            sources,
            locator: Locator::default(),
        }
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.locator = Locator::new(policy);
        self
    }

    /// Apply `modification`; failures are returned as [`ItemOutcome::Failed`], never raised.
    pub fn execute(&self, document: &mut S::Document, modification: &Modification) -> ItemOutcome {
        match self.try_execute(document, modification) {
            Ok(outcome) => {
                tracing::debug!(
                    kind = modification.kind_name(),
                    layer_index = modification.layer_index(),
                    ?outcome,
                    "modification applied"
                );
                outcome
            }
            Err(err) => {
                tracing::warn!(
                    kind = modification.kind_name(),
                    layer_index = modification.layer_index(),
                    %err,
                    "modification failed"
                );
                ItemOutcome::Failed(err)
            }
        }
    }

    fn try_execute(
        &self,
        document: &mut S::Document,
        modification: &Modification,
    ) -> PagResult<ItemOutcome> {
        match modification {
            Modification::Text { layer_index, value } => {
                replace_text(document, *layer_index, value)?;
                Ok(ItemOutcome::Applied)
            }
            Modification::Image { layer_index, .. } => {
                let image_ref = modification
                    .image_ref()
                    .ok_or_else(|| PagError::image_source("image item carries no reference"))?;
                let resolved = self.sources.resolve(image_ref)?;
                self.substitute_image(document, *layer_index, resolved.path())?;
                Ok(ItemOutcome::Applied)
            }
            Modification::ImageReplacement {
                layer_index,
                image_path,
            } => {
                let path = self.sources.resolve_path(image_path).ok_or_else(|| {
                    PagError::image_source(format!(
                        "replacement image '{}' does not exist",
                        image_path.display()
                    ))
                })?;
                self.substitute_image(document, *layer_index, &path)?;
                Ok(ItemOutcome::Applied)
            }
            Modification::ImageTransform { .. } => Ok(ItemOutcome::Deferred),
            Modification::Unsupported => Err(PagError::validation(
                "unsupported modification type",
            )),
            Modification::Malformed { position, reason } => Err(PagError::validation(format!(
                "malformed modification at {position}: {reason}"
            ))),
        }
    }

    /// Decode `path`, give it the placeholder's recovered placement and substitute it at
    /// `editable_index`.
    pub fn substitute_image(
        &self,
        document: &mut S::Document,
        editable_index: usize,
        path: &Path,
    ) -> PagResult<RecoveredTransform> {
        let target = self
            .locator
            .locate(document, editable_index, LayerKind::Image)?;
        let recovered = document
            .layer(target)
            .map(recover_transform)
            .unwrap_or_else(RecoveredTransform::fallback);

        let mut image = self.sdk.image_from_path(path).ok_or_else(|| {
            PagError::image_decode(format!("sdk could not decode '{}'", path.display()))
        })?;
        if let Err(err) = recovered.apply_to(&mut image) {
            tracing::warn!(editable_index, %err, "could not apply recovered placement");
        }
        tracing::debug!(
            editable_index,
            source = ?recovered.source,
            has_matrix = recovered.matrix.is_some(),
            "placement recovered"
        );

        if !document.replace_image(editable_index, image) {
            return Err(PagError::substitution(format!(
                "replace_image rejected editable index {editable_index}"
            )));
        }
        Ok(recovered)
    }

    /// Write `transform`'s fields onto the live layer bound to `editable_index`.
    ///
    /// Fields are set independently. Returns how many of them the layer rejected.
    pub fn apply_transform(
        &self,
        document: &mut S::Document,
        editable_index: usize,
        transform: &TransformSpec,
    ) -> PagResult<usize> {
        let target = self
            .locator
            .locate(document, editable_index, LayerKind::Image)?;
        let layer = document.layer_mut(target).ok_or_else(|| {
            PagError::layer_not_editable(format!("layer {} vanished", target.0))
        })?;

        let mut results = Vec::new();
        if let Some(p) = transform.position {
            results.push(("position", layer.set_position(p.x, p.y)));
        }
        if let Some(a) = transform.anchor_point {
            results.push(("anchorPoint", layer.set_anchor_point(a.x, a.y)));
        }
        if let Some(s) = transform.scale {
            results.push(("scale", layer.set_scale(s.x, s.y)));
        }
        if let Some(r) = transform.rotation {
            results.push(("rotation", layer.set_rotation(r)));
        }
        if let Some(alpha) = transform.alpha() {
            results.push(("opacity", layer.set_alpha(alpha)));
        }

        let mut failed = 0;
        for (field, result) in results {
            if let Err(err) = result {
                tracing::warn!(editable_index, field, %err, "transform field not applied");
                failed += 1;
            }
        }
        Ok(failed)
    }
}

fn replace_text<D: Document>(document: &mut D, index: usize, value: &str) -> PagResult<()> {
    let mut data = document.text_data(index).ok_or_else(|| {
        PagError::layer_not_editable(format!(
            "no text record at index {index} (document has {})",
            document.num_texts()
        ))
    })?;
    data.text = value.to_string();
    if !document.replace_text(index, data) {
        return Err(PagError::substitution(format!(
            "replace_text rejected index {index}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/edit/execute.rs"]
mod tests;
