use crate::{
    foundation::error::{PagError, PagResult},
    sdk::{Document, LayerId, LayerKind},
};

/// What to do when several layers share one editable index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Log and take the first match.
    #[default]
    First,
    /// Fail the item with `LayerAmbiguous`.
    Reject,
}

/// Resolves an editable index plus layer kind to one concrete layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Locator {
    pub policy: AmbiguityPolicy,
}

impl Locator {
    pub fn new(policy: AmbiguityPolicy) -> Self {
        Self { policy }
    }

    pub fn locate<D: Document>(
        &self,
        document: &D,
        editable_index: usize,
        kind: LayerKind,
    ) -> PagResult<LayerId> {
        let matches = document.layers_by_editable_index(editable_index, kind);
        let Some(&first) = matches.first() else {
            return Err(PagError::layer_not_editable(format!(
                "no {kind:?} layer bound to editable index {editable_index}"
            )));
        };
        if matches.len() > 1 {
            match self.policy {
                AmbiguityPolicy::First => {
                    tracing::warn!(
                        editable_index,
                        ?kind,
                        count = matches.len(),
                        chosen = first.0,
                        "several layers share one editable index, using the first"
                    );
                }
                AmbiguityPolicy::Reject => {
                    return Err(PagError::layer_ambiguous(format!(
                        "{} {kind:?} layers bound to editable index {editable_index}",
                        matches.len()
                    )));
                }
            }
        }
        Ok(first)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/locate.rs"]
mod tests;
