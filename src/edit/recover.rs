//! Recovery of the placement a substituted image inherits from its placeholder.
//!
//! Tiers, first available wins:
//! 1. the layer's original image matrix,
//! 2. a matrix approximated from the original bounds, scale factor and anchor,
//! 3. the placement of an image substituted into the layer earlier,
//! 4. [`ScaleMode::LetterBox`] with no matrix.
//!
//! A failing accessor never aborts recovery; it is logged as a degraded tier and the next tier
//! is tried.

use crate::{
    foundation::core::Affine,
    foundation::error::PagResult,
    sdk::{Layer, OriginalTransformProvider, ReplacedImageAccess, ScaleMode, SdkImage},
};

/// Where a [`RecoveredTransform`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformSource {
    LayerOriginal,
    PreviouslyReplaced,
    None,
}

/// Placement to give a freshly decoded image.
///
/// When `matrix` is present `scale_mode` is always `None`: the matrix fully determines placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecoveredTransform {
    pub matrix: Option<Affine>,
    pub scale_mode: Option<ScaleMode>,
    pub source: TransformSource,
}

impl RecoveredTransform {
    pub fn from_matrix(matrix: Affine, source: TransformSource) -> Self {
        Self {
            matrix: Some(matrix),
            scale_mode: None,
            source,
        }
    }

    pub fn from_scale_mode(mode: ScaleMode, source: TransformSource) -> Self {
        Self {
            matrix: None,
            scale_mode: Some(mode),
            source,
        }
    }

    pub fn fallback() -> Self {
        Self::from_scale_mode(ScaleMode::LetterBox, TransformSource::None)
    }

    /// Write the placement onto `image`: scale mode first, matrix last.
    ///
    /// Setting a scale mode may recompute the image matrix, so the matrix is always the final
    /// write.
    pub fn apply_to<I: SdkImage + ?Sized>(&self, image: &mut I) -> PagResult<()> {
        if let Some(mode) = self.scale_mode {
            image.set_scale_mode(mode)?;
        }
        if let Some(matrix) = self.matrix {
            image.set_matrix(matrix)?;
        }
        Ok(())
    }
}

/// Run the fallback tiers against `layer`.
pub fn recover_transform(layer: &dyn Layer) -> RecoveredTransform {
    let name = layer.name();

    match layer.original_transform() {
        Some(original) => {
            match finite(original.original_image_matrix()) {
                Ok(Some(m)) => {
                    return RecoveredTransform::from_matrix(m, TransformSource::LayerOriginal);
                }
                Ok(None) => {}
                Err(reason) => degraded(name, "original-matrix", &reason),
            }
            match usable(approximate_from_bounds(original)) {
                Ok(Some(m)) => {
                    return RecoveredTransform::from_matrix(m, TransformSource::LayerOriginal);
                }
                Ok(None) => {}
                Err(reason) => degraded(name, "original-bounds", &reason),
            }
        }
        None => tracing::debug!(
            layer = name,
            "layer exposes no original transform accessors"
        ),
    }

    if let Some(access) = layer.replaced_image_access() {
        match previously_replaced(access) {
            Ok(Some(t)) => return t,
            Ok(None) => {}
            Err(err) => degraded(name, "previously-replaced", &err.to_string()),
        }
    }

    tracing::debug!(layer = name, "no placement recovered, defaulting to letterbox");
    RecoveredTransform::fallback()
}

/// Bounds give the origin, the scale factor the size; an anchor alone says nothing.
fn approximate_from_bounds(p: &dyn OriginalTransformProvider) -> PagResult<Option<Affine>> {
    let bounds = p.original_image_bounds()?;
    let factor = p.original_scale_factor()?;
    let anchor = p.original_anchor_point()?;

    let scale = factor
        .map(|f| Affine::scale_non_uniform(f.x, f.y))
        .unwrap_or(Affine::IDENTITY);
    Ok(match (bounds, factor, anchor) {
        (Some(b), _, _) => Some(Affine::translate(b.origin().to_vec2()) * scale),
        (None, Some(_), Some(a)) => {
            let a = a.to_vec2();
            Some(Affine::translate(a) * scale * Affine::translate(-a))
        }
        (None, Some(_), None) => Some(scale),
        (None, None, _) => None,
    })
}

fn previously_replaced(access: &dyn ReplacedImageAccess) -> PagResult<Option<RecoveredTransform>> {
    let Some(placement) = access.replaced_image()? else {
        return Ok(None);
    };
    let source = TransformSource::PreviouslyReplaced;
    Ok(Some(match placement.matrix.filter(|m| m.is_finite()) {
        Some(m) => RecoveredTransform::from_matrix(m, source),
        None => RecoveredTransform::from_scale_mode(placement.scale_mode, source),
    }))
}

/// The authored matrix is taken as-is, singular or not, as long as it is finite.
fn finite(r: PagResult<Option<Affine>>) -> Result<Option<Affine>, String> {
    match r {
        Ok(Some(m)) if !m.is_finite() => Err(format!("non-finite matrix {:?}", m.as_coeffs())),
        Ok(m) => Ok(m),
        Err(e) => Err(e.to_string()),
    }
}

/// Approximated matrices must also be invertible.
fn usable(r: PagResult<Option<Affine>>) -> Result<Option<Affine>, String> {
    match finite(r)? {
        Some(m) if m.determinant().abs() < 1e-12 => {
            Err(format!("degenerate matrix {:?}", m.as_coeffs()))
        }
        m => Ok(m),
    }
}

fn degraded(layer: &str, tier: &'static str, reason: &str) {
    tracing::info!(
        layer,
        tier,
        reason,
        "TransformRecoveryDegraded: falling back to next tier"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/edit/recover.rs"]
mod tests;
