use std::{collections::BTreeMap, path::Path, path::PathBuf};

use anyhow::Context;

use crate::foundation::error::{PagError, PagResult};

/// One client-supplied edit, discriminated by `type` on the wire.
///
/// `editableIndex` is accepted for `layerIndex` and `newImagePath` for `imagePath`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Modification {
    /// Replace the text content of a text slot.
    Text {
        #[serde(alias = "editableIndex")]
        layer_index: usize,
        value: String,
    },
    /// Replace the image of an image slot; `imageData` (a data URI) wins over `value`.
    Image {
        #[serde(alias = "editableIndex")]
        layer_index: usize,
        #[serde(default)]
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<String>,
    },
    /// Persisted substitution from a filesystem path.
    ImageReplacement {
        #[serde(alias = "editableIndex")]
        layer_index: usize,
        #[serde(alias = "newImagePath")]
        image_path: PathBuf,
    },
    /// Render-time geometric override; never serialized into the document.
    ImageTransform {
        #[serde(alias = "editableIndex")]
        layer_index: usize,
        #[serde(default)]
        transform: TransformSpec,
    },
    /// An item that failed to parse; it fails on its own when executed.
    #[serde(skip_deserializing)]
    Malformed { position: usize, reason: String },
    /// Any `type` this engine does not know.
    #[serde(other)]
    Unsupported,
}

/// Borrowed view of an image reference, in resolution priority order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageRef<'a> {
    pub image_data: Option<&'a str>,
    pub value: &'a str,
}

impl Modification {
    pub fn layer_index(&self) -> Option<usize> {
        match self {
            Self::Text { layer_index, .. }
            | Self::Image { layer_index, .. }
            | Self::ImageReplacement { layer_index, .. }
            | Self::ImageTransform { layer_index, .. } => Some(*layer_index),
            Self::Unsupported | Self::Malformed { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::ImageReplacement { .. } => "imageReplacement",
            Self::ImageTransform { .. } => "imageTransform",
            Self::Unsupported => "unsupported",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// Whether applying this item mutates persisted document state.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            Self::Text { .. } | Self::Image { .. } | Self::ImageReplacement { .. }
        )
    }

    pub fn image_ref(&self) -> Option<ImageRef<'_>> {
        match self {
            Self::Image {
                value, image_data, ..
            } => Some(ImageRef {
                image_data: image_data.as_deref(),
                value,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Offset2 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scale2 {
    #[serde(default = "unit")]
    pub x: f64,
    #[serde(default = "unit")]
    pub y: f64,
}

impl Default for Scale2 {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

fn unit() -> f64 {
    1.0
}

/// Geometric override; every field is optional and applied independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Offset2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_point: Option<Offset2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale2>,
    /// Degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// `[0, 1]`; clamped when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl TransformSpec {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer alpha for the requested opacity: `floor(clamp(opacity, 0, 1) * 255)`.
    pub fn alpha(&self) -> Option<u8> {
        self.opacity
            .map(|o| (o.clamp(0.0, 1.0) * 255.0).floor() as u8)
    }
}

/// Ordered list of modifications; list order is application order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModificationList {
    #[serde(default, deserialize_with = "deserialize_items")]
    pub modifications: Vec<Modification>,
}

/// Deserialize a modification array item by item; an item that does not parse becomes
/// [`Modification::Malformed`] instead of failing the whole list.
pub(crate) fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<Modification>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = <Vec<serde_json::Value> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(parse_items(values))
}

fn parse_items(values: Vec<serde_json::Value>) -> Vec<Modification> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            serde_json::from_value(value).unwrap_or_else(|err| {
                tracing::warn!(position, %err, "malformed modification item");
                Modification::Malformed {
                    position,
                    reason: err.to_string(),
                }
            })
        })
        .collect()
}

impl ModificationList {
    pub fn new(modifications: Vec<Modification>) -> Self {
        Self { modifications }
    }

    /// Parse either `{"modifications": [...]}` or a bare array.
    pub fn from_json_str(s: &str) -> PagResult<Self> {
        let value: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| PagError::serde(format!("parse modification list: {e}")))?;
        if let serde_json::Value::Array(items) = value {
            return Ok(Self {
                modifications: parse_items(items),
            });
        }
        serde_json::from_value(value)
            .map_err(|e| PagError::serde(format!("parse modification list: {e}")))
    }

    pub fn from_path(path: &Path) -> PagResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read modification list '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modification> {
        self.modifications.iter()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut out = BTreeMap::new();
        for m in &self.modifications {
            *out.entry(m.kind_name()).or_insert(0) += 1;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/modification.rs"]
mod tests;
