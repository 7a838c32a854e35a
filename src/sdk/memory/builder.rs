use crate::{
    foundation::core::{Affine, LayerTransform2D, Point, Rect, Size, Vec2},
    foundation::error::PagResult,
    sdk::{
        LayerKind, TextData,
        memory::{FORMAT_TAG, MemoryDocument, MemoryImage, MemoryLayer, OriginalPlacement},
    },
};

pub struct MemoryDocumentBuilder {
    width: u32,
    height: u32,
    duration_micros: i64,
    frame_rate: f64,
    texts: Vec<TextData>,
    layers: Vec<MemoryLayer>,
}

impl MemoryDocumentBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            duration_micros: 1_000_000,
            frame_rate: 30.0,
            texts: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn duration_secs(mut self, secs: f64) -> Self {
        self.duration_micros = (secs * 1_000_000.0).round() as i64;
        self
    }

    pub fn frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = fps;
        self
    }

    /// Append a text slot; its editable index is its position among text slots.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let index = self.texts.len();
        self.texts.push(TextData::plain(text));
        self.layers.push(MemoryLayer::new(
            format!("text_{index}"),
            LayerKind::Text,
            Some(index),
        ));
        self
    }

    pub fn image_layer(mut self, spec: ImageLayerSpec) -> Self {
        let mut layer = MemoryLayer::new(spec.name, LayerKind::Image, spec.editable_index);
        layer.content_size = spec.content_size;
        layer.transform = spec.transform;
        layer.visible_range = spec.visible_range;
        layer.original = spec.original;
        layer.placeholder = spec.placeholder;
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> PagResult<MemoryDocument> {
        let doc = MemoryDocument {
            format: FORMAT_TAG.to_string(),
            width: self.width,
            height: self.height,
            duration_micros: self.duration_micros,
            frame_rate: self.frame_rate,
            texts: self.texts,
            layers: self.layers,
        };
        doc.validate()?;
        Ok(doc)
    }
}

/// Description of one image layer for [`MemoryDocumentBuilder::image_layer`].
pub struct ImageLayerSpec {
    name: String,
    editable_index: Option<usize>,
    content_size: Size,
    transform: LayerTransform2D,
    visible_range: Option<[f64; 2]>,
    original: Option<OriginalPlacement>,
    placeholder: Option<MemoryImage>,
}

impl ImageLayerSpec {
    pub fn new(name: impl Into<String>, editable_index: usize, content_size: Size) -> Self {
        Self {
            name: name.into(),
            editable_index: Some(editable_index),
            content_size,
            transform: LayerTransform2D::default(),
            visible_range: None,
            original: None,
            placeholder: None,
        }
    }

    /// An image layer that is not exposed as an edit point.
    pub fn fixed(name: impl Into<String>, content_size: Size) -> Self {
        Self {
            editable_index: None,
            ..Self::new(name, 0, content_size)
        }
    }

    pub fn transform(mut self, transform: LayerTransform2D) -> Self {
        self.transform = transform;
        self
    }

    pub fn visible_between(mut self, start: f64, end: f64) -> Self {
        self.visible_range = Some([start, end]);
        self
    }

    pub fn placeholder(mut self, image: MemoryImage) -> Self {
        self.placeholder = Some(image);
        self
    }

    pub fn original_matrix(mut self, matrix: Affine) -> Self {
        self.original.get_or_insert_with(Default::default).matrix = Some(matrix);
        self
    }

    pub fn original_bounds(mut self, bounds: Rect) -> Self {
        self.original.get_or_insert_with(Default::default).bounds = Some(bounds);
        self
    }

    pub fn original_scale_factor(mut self, factor: Vec2) -> Self {
        self.original.get_or_insert_with(Default::default).scale_factor = Some(factor);
        self
    }

    pub fn original_anchor(mut self, anchor: Point) -> Self {
        self.original.get_or_insert_with(Default::default).anchor = Some(anchor);
        self
    }
}
