//! Boundary to the external document SDK.
//!
//! The container codec and the rasterizer live behind these traits. Newer transform-recovery
//! accessors are modeled as optional capability groups ([`OriginalTransformProvider`],
//! [`ReplacedImageAccess`]) that a layer either exposes or not, so callers choose a fallback
//! tier once per layer instead of probing individual methods.

use std::path::Path;

use crate::foundation::core::{Affine, FrameRGBA, Point, Rect, Size, Vec2};
use crate::foundation::error::PagResult;

pub mod capability;
pub mod memory;

/// Layer category used to narrow editable-index lookups.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    Text,
    Image,
}

/// Fit policy applied to an image that has no explicit matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleMode {
    None,
    Stretch,
    #[default]
    LetterBox,
    Zoom,
}

impl ScaleMode {
    /// Matrix placing an `image`-sized bitmap into a `content`-sized slot.
    pub fn fit_matrix(self, image: Size, content: Size) -> Affine {
        if image.width <= 0.0 || image.height <= 0.0 || content.width <= 0.0 || content.height <= 0.0
        {
            return Affine::IDENTITY;
        }
        let sx = content.width / image.width;
        let sy = content.height / image.height;
        match self {
            Self::None => Affine::IDENTITY,
            Self::Stretch => Affine::scale_non_uniform(sx, sy),
            Self::LetterBox | Self::Zoom => {
                let s = if self == Self::LetterBox {
                    sx.min(sy)
                } else {
                    sx.max(sy)
                };
                let dx = (content.width - image.width * s) * 0.5;
                let dy = (content.height - image.height * s) * 0.5;
                Affine::translate(Vec2::new(dx, dy)) * Affine::scale(s)
            }
        }
    }
}

/// Text record addressed by its per-kind text index.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub text: String,
    #[serde(default)]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_fill_color")]
    pub fill_color: [u8; 3],
}

fn default_font_size() -> f64 {
    24.0
}

fn default_fill_color() -> [u8; 3] {
    [255, 255, 255]
}

impl TextData {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: String::new(),
            font_size: default_font_size(),
            fill_color: default_fill_color(),
        }
    }
}

/// Opaque handle to a layer inside one loaded document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// Current placement of an image that was substituted into a layer earlier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    /// Explicit matrix, if one was set.
    pub matrix: Option<Affine>,
    pub scale_mode: ScaleMode,
}

/// Accessors for the placement of the template's original placeholder image.
///
/// These are valid before any replacement has happened.
pub trait OriginalTransformProvider {
    fn original_image_matrix(&self) -> PagResult<Option<Affine>>;
    fn original_image_bounds(&self) -> PagResult<Option<Rect>>;
    fn original_scale_factor(&self) -> PagResult<Option<Vec2>>;
    fn original_anchor_point(&self) -> PagResult<Option<Point>>;
}

/// Access to the image currently substituted into a layer, if any.
pub trait ReplacedImageAccess {
    fn replaced_image(&self) -> PagResult<Option<ImagePlacement>>;
}

/// A positioned visual element in the document's scene graph.
///
/// Geometric setters are render-time state: they affect drawing but are never serialized.
pub trait Layer {
    fn name(&self) -> &str;
    fn kind(&self) -> LayerKind;
    fn editable_index(&self) -> Option<usize>;

    fn set_position(&mut self, x: f64, y: f64) -> PagResult<()>;
    fn set_anchor_point(&mut self, x: f64, y: f64) -> PagResult<()>;
    fn set_scale(&mut self, x: f64, y: f64) -> PagResult<()>;
    fn set_rotation(&mut self, degrees: f64) -> PagResult<()>;
    fn set_alpha(&mut self, alpha: u8) -> PagResult<()>;

    fn original_transform(&self) -> Option<&dyn OriginalTransformProvider> {
        None
    }

    fn replaced_image_access(&self) -> Option<&dyn ReplacedImageAccess> {
        None
    }
}

/// Decoded image ready for substitution.
pub trait SdkImage {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn scale_mode(&self) -> ScaleMode;
    /// May recompute (and discard) the current matrix.
    fn set_scale_mode(&mut self, mode: ScaleMode) -> PagResult<()>;

    fn matrix(&self) -> Affine;
    fn set_matrix(&mut self, matrix: Affine) -> PagResult<()>;
}

/// A loaded template, owned by exactly one pipeline invocation.
pub trait Document {
    type Image: SdkImage;

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn duration_micros(&self) -> i64;
    fn frame_rate(&self) -> f64;

    fn num_texts(&self) -> usize;
    fn num_images(&self) -> usize;
    fn editable_indices(&self, kind: LayerKind) -> Vec<usize>;

    fn text_data(&self, index: usize) -> Option<TextData>;
    fn replace_text(&mut self, index: usize, data: TextData) -> bool;

    fn layers_by_editable_index(&self, index: usize, kind: LayerKind) -> Vec<LayerId>;
    fn layer(&self, id: LayerId) -> Option<&dyn Layer>;
    fn layer_mut(&mut self, id: LayerId) -> Option<&mut dyn Layer>;

    fn replace_image(&mut self, editable_index: usize, image: Self::Image) -> bool;

    fn save(&self, path: &Path) -> bool;
}

/// Offscreen render target sized to a document's native dimensions.
pub trait OffscreenSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn read_pixels(&self) -> Option<FrameRGBA>;
}

/// Entry point of a document SDK build.
pub trait DocumentSdk {
    type Document: Document;
    type Surface: OffscreenSurface;

    fn load(&self, bytes: &[u8]) -> Option<Self::Document>;
    fn image_from_path(&self, path: &Path) -> Option<<Self::Document as Document>::Image>;
    fn make_offscreen(&self, width: u32, height: u32) -> Option<Self::Surface>;

    /// Set player progress on `document` and flush it into `surface`.
    fn flush(&self, document: &Self::Document, surface: &mut Self::Surface, progress: f64)
    -> bool;
}

#[cfg(test)]
#[path = "../../tests/unit/sdk/scale_mode.rs"]
mod tests;
