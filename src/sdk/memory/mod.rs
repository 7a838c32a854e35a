//! In-process document backend.
//!
//! Documents are persisted as deterministic pretty JSON, so saving an unmodified document is
//! byte-stable. Render-time layer overrides live in skipped fields and never reach saved output.

use std::{path::Path, sync::Arc};

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{
    foundation::core::{Affine, LayerTransform2D, Point, Rect, Size, Vec2},
    foundation::error::{PagError, PagResult},
    sdk::{
        Document, DocumentSdk, ImagePlacement, Layer, LayerId, LayerKind,
        OriginalTransformProvider, ReplacedImageAccess, ScaleMode, SdkImage, TextData,
    },
};

mod builder;
mod surface;

pub use builder::{ImageLayerSpec, MemoryDocumentBuilder};
pub use surface::MemorySurface;

pub(crate) const FORMAT_TAG: &str = "pagsmith-memory/1";

/// Which optional accessor groups loaded layers expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub original_transform: bool,
    pub replaced_image: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            original_transform: true,
            replaced_image: true,
        }
    }
}

/// SDK entry point for [`MemoryDocument`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySdk {
    capabilities: Capabilities,
}

impl MemorySdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave like an SDK build that lacks some transform-recovery accessors.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// The in-process backend is always available.
    pub fn is_available() -> bool {
        true
    }
}

impl DocumentSdk for MemorySdk {
    type Document = MemoryDocument;
    type Surface = MemorySurface;

    fn load(&self, bytes: &[u8]) -> Option<MemoryDocument> {
        match MemoryDocument::from_bytes(bytes) {
            Ok(mut doc) => {
                doc.set_capabilities(self.capabilities);
                Some(doc)
            }
            Err(err) => {
                tracing::debug!(%err, "memory document load failed");
                None
            }
        }
    }

    fn image_from_path(&self, path: &Path) -> Option<MemoryImage> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "image read failed");
                return None;
            }
        };
        match MemoryImage::decode(&bytes) {
            Ok(img) => Some(img),
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "image decode failed");
                None
            }
        }
    }

    fn make_offscreen(&self, width: u32, height: u32) -> Option<MemorySurface> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(MemorySurface::new(width, height))
    }

    fn flush(&self, document: &MemoryDocument, surface: &mut MemorySurface, progress: f64) -> bool {
        surface.clear();
        for layer in &document.layers {
            if layer.kind != LayerKind::Image || !layer.visible_at(progress) {
                continue;
            }
            let Some(img) = layer.replaced.as_ref().or(layer.placeholder.as_ref()) else {
                continue;
            };
            let image_matrix = img.matrix.unwrap_or_else(|| {
                img.scale_mode.fit_matrix(
                    Size::new(f64::from(img.width), f64::from(img.height)),
                    layer.content_size,
                )
            });
            let to_surface = layer.effective_transform().to_affine() * image_matrix;
            surface.draw_image(img, to_surface, layer.effective_alpha());
        }
        true
    }
}

/// Decoded bitmap in premultiplied RGBA8 plus its placement state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryImage {
    pub width: u32,
    pub height: u32,
    #[serde(with = "rgba_base64")]
    pub rgba8_premul: Arc<Vec<u8>>,
    #[serde(default)]
    pub scale_mode: ScaleMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Affine>,
}

impl MemoryImage {
    /// Decode encoded image bytes and convert to premultiplied RGBA8.
    pub fn decode(bytes: &[u8]) -> PagResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            scale_mode: ScaleMode::default(),
            matrix: None,
        })
    }

    /// Single-color image from a straight-alpha RGBA8 value.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut px = rgba;
        premultiply_rgba8_in_place(&mut px);
        let data = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
            scale_mode: ScaleMode::default(),
            matrix: None,
        }
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let d = &self.rgba8_premul;
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }
}

impl SdkImage for MemoryImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    fn set_scale_mode(&mut self, mode: ScaleMode) -> PagResult<()> {
        // The fit matrix is derived from the scale mode at draw time.
        self.scale_mode = mode;
        self.matrix = None;
        Ok(())
    }

    fn matrix(&self) -> Affine {
        self.matrix.unwrap_or(Affine::IDENTITY)
    }

    fn set_matrix(&mut self, matrix: Affine) -> PagResult<()> {
        if !matrix.is_finite() {
            return Err(PagError::validation("image matrix must be finite"));
        }
        self.matrix = Some(matrix);
        Ok(())
    }
}

/// Placement of the template's placeholder image, as authored.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalPlacement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Affine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RuntimeOverrides {
    position: Option<Vec2>,
    anchor: Option<Vec2>,
    scale: Option<Vec2>,
    rotation_deg: Option<f64>,
    alpha: Option<u8>,
}

fn opaque() -> u8 {
    255
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLayer {
    pub name: String,
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable_index: Option<usize>,
    #[serde(default)]
    pub transform: LayerTransform2D,
    #[serde(default = "opaque")]
    pub alpha: u8,
    pub content_size: Size,
    /// Visible progress window `[start, end]`; always visible when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<MemoryImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<MemoryImage>,

    #[serde(skip)]
    runtime: RuntimeOverrides,
    #[serde(skip)]
    capabilities: Capabilities,
}

impl MemoryLayer {
    pub(crate) fn new(name: String, kind: LayerKind, editable_index: Option<usize>) -> Self {
        Self {
            name,
            kind,
            editable_index,
            transform: LayerTransform2D::default(),
            alpha: opaque(),
            content_size: Size::ZERO,
            visible_range: None,
            original: None,
            placeholder: None,
            replaced: None,
            runtime: RuntimeOverrides::default(),
            capabilities: Capabilities::default(),
        }
    }

    /// Persisted transform with render-time overrides applied.
    pub fn effective_transform(&self) -> LayerTransform2D {
        let rt = &self.runtime;
        LayerTransform2D {
            position: rt.position.unwrap_or(self.transform.position),
            anchor: rt.anchor.unwrap_or(self.transform.anchor),
            scale: rt.scale.unwrap_or(self.transform.scale),
            rotation_deg: rt.rotation_deg.unwrap_or(self.transform.rotation_deg),
        }
    }

    pub fn effective_alpha(&self) -> u8 {
        self.runtime.alpha.unwrap_or(self.alpha)
    }

    fn visible_at(&self, progress: f64) -> bool {
        match self.visible_range {
            Some([start, end]) => start <= progress && progress <= end,
            None => true,
        }
    }
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn editable_index(&self) -> Option<usize> {
        self.editable_index
    }

    fn set_position(&mut self, x: f64, y: f64) -> PagResult<()> {
        self.runtime.position = Some(finite_vec2(x, y, "position")?);
        Ok(())
    }

    fn set_anchor_point(&mut self, x: f64, y: f64) -> PagResult<()> {
        self.runtime.anchor = Some(finite_vec2(x, y, "anchor point")?);
        Ok(())
    }

    fn set_scale(&mut self, x: f64, y: f64) -> PagResult<()> {
        self.runtime.scale = Some(finite_vec2(x, y, "scale")?);
        Ok(())
    }

    fn set_rotation(&mut self, degrees: f64) -> PagResult<()> {
        if !degrees.is_finite() {
            return Err(PagError::validation("rotation must be finite"));
        }
        self.runtime.rotation_deg = Some(degrees);
        Ok(())
    }

    fn set_alpha(&mut self, alpha: u8) -> PagResult<()> {
        self.runtime.alpha = Some(alpha);
        Ok(())
    }

    fn original_transform(&self) -> Option<&dyn OriginalTransformProvider> {
        (self.capabilities.original_transform && self.kind == LayerKind::Image)
            .then_some(self as &dyn OriginalTransformProvider)
    }

    fn replaced_image_access(&self) -> Option<&dyn ReplacedImageAccess> {
        (self.capabilities.replaced_image && self.kind == LayerKind::Image)
            .then_some(self as &dyn ReplacedImageAccess)
    }
}

impl OriginalTransformProvider for MemoryLayer {
    fn original_image_matrix(&self) -> PagResult<Option<Affine>> {
        Ok(self.original.and_then(|o| o.matrix))
    }

    fn original_image_bounds(&self) -> PagResult<Option<Rect>> {
        Ok(self.original.and_then(|o| o.bounds))
    }

    fn original_scale_factor(&self) -> PagResult<Option<Vec2>> {
        Ok(self.original.and_then(|o| o.scale_factor))
    }

    fn original_anchor_point(&self) -> PagResult<Option<Point>> {
        Ok(self.original.and_then(|o| o.anchor))
    }
}

impl ReplacedImageAccess for MemoryLayer {
    fn replaced_image(&self) -> PagResult<Option<ImagePlacement>> {
        Ok(self.replaced.as_ref().map(|img| ImagePlacement {
            matrix: img.matrix,
            scale_mode: img.scale_mode,
        }))
    }
}

/// A template held entirely in memory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDocument {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub duration_micros: i64,
    pub frame_rate: f64,
    pub texts: Vec<TextData>,
    pub layers: Vec<MemoryLayer>,
}

impl MemoryDocument {
    pub fn builder(width: u32, height: u32) -> MemoryDocumentBuilder {
        MemoryDocumentBuilder::new(width, height)
    }

    pub fn validate(&self) -> PagResult<()> {
        if self.format != FORMAT_TAG {
            return Err(PagError::validation(format!(
                "unsupported document format '{}'",
                self.format
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PagError::validation("document width/height must be > 0"));
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(PagError::validation("document frame rate must be > 0"));
        }
        if self.duration_micros < 0 {
            return Err(PagError::validation("document duration must be >= 0"));
        }
        for layer in &self.layers {
            if layer.kind == LayerKind::Image
                && (layer.content_size.width <= 0.0 || layer.content_size.height <= 0.0)
            {
                return Err(PagError::validation(format!(
                    "image layer '{}' must have a non-empty content size",
                    layer.name
                )));
            }
            for img in layer.placeholder.iter().chain(layer.replaced.iter()) {
                if img.rgba8_premul.len() != img.width as usize * img.height as usize * 4 {
                    return Err(PagError::validation(format!(
                        "image on layer '{}' has mismatched pixel buffer",
                        layer.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> PagResult<Self> {
        let doc: Self = serde_json::from_slice(bytes)
            .map_err(|e| PagError::serde(format!("parse memory document: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_bytes(&self) -> PagResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| PagError::serde(format!("write memory document: {e}")))
    }

    pub fn layers(&self) -> &[MemoryLayer] {
        &self.layers
    }

    fn set_capabilities(&mut self, capabilities: Capabilities) {
        for layer in &mut self.layers {
            layer.capabilities = capabilities;
        }
    }
}

impl Document for MemoryDocument {
    type Image = MemoryImage;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn duration_micros(&self) -> i64 {
        self.duration_micros
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn num_texts(&self) -> usize {
        self.texts.len()
    }

    fn num_images(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| l.kind == LayerKind::Image)
            .count()
    }

    fn editable_indices(&self, kind: LayerKind) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .layers
            .iter()
            .filter(|l| l.kind == kind)
            .filter_map(|l| l.editable_index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn text_data(&self, index: usize) -> Option<TextData> {
        self.texts.get(index).cloned()
    }

    fn replace_text(&mut self, index: usize, data: TextData) -> bool {
        match self.texts.get_mut(index) {
            Some(slot) => {
                *slot = data;
                true
            }
            None => false,
        }
    }

    fn layers_by_editable_index(&self, index: usize, kind: LayerKind) -> Vec<LayerId> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.kind == kind && l.editable_index == Some(index))
            .map(|(i, _)| LayerId(i))
            .collect()
    }

    fn layer(&self, id: LayerId) -> Option<&dyn Layer> {
        self.layers.get(id.0).map(|l| l as &dyn Layer)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut dyn Layer> {
        self.layers.get_mut(id.0).map(|l| l as &mut dyn Layer)
    }

    fn replace_image(&mut self, editable_index: usize, image: MemoryImage) -> bool {
        let mut replaced = false;
        for layer in &mut self.layers {
            if layer.kind == LayerKind::Image && layer.editable_index == Some(editable_index) {
                layer.replaced = Some(image.clone());
                replaced = true;
            }
        }
        replaced
    }

    fn save(&self, path: &Path) -> bool {
        let bytes = match self.to_bytes() {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(%err, "memory document encode failed");
                return false;
            }
        };
        match std::fs::write(path, bytes) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "memory document write failed");
                false
            }
        }
    }
}

fn finite_vec2(x: f64, y: f64, what: &str) -> PagResult<Vec2> {
    if !x.is_finite() || !y.is_finite() {
        return Err(PagError::validation(format!("{what} must be finite")));
    }
    Ok(Vec2::new(x, y))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

mod rgba_base64 {
    use std::sync::Arc;

    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::BASE64;

    pub fn serialize<S: Serializer>(data: &Arc<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64.encode(data.as_slice()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Arc<Vec<u8>>, D::Error> {
        let encoded = String::deserialize(d)?;
        BASE64
            .decode(encoded)
            .map(Arc::new)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/sdk/memory.rs"]
mod tests;
