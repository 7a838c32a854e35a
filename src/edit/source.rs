use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{
    foundation::error::{PagError, PagResult},
    model::modification::ImageRef,
};

/// Where image references are resolved from.
///
/// Priority: inline data URI, then an uploaded part by field name, then a filesystem path tried
/// literally and under each search root in order.
#[derive(Clone, Debug, Default)]
pub struct SourceContext {
    pub uploads: HashMap<String, Vec<u8>>,
    pub search_roots: Vec<PathBuf>,
}

/// An image payload ready for the SDK to open by path.
///
/// Inline and uploaded payloads are spilled into a temp file that is deleted on drop.
#[derive(Debug)]
pub enum ResolvedImage {
    Path(PathBuf),
    Temp(tempfile::NamedTempFile),
}

impl ResolvedImage {
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(p) => p,
            Self::Temp(f) => f.path(),
        }
    }
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload(mut self, field: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.uploads.insert(field.into(), bytes);
        self
    }

    pub fn with_search_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_roots.push(dir.into());
        self
    }

    /// First existing candidate for `path`. Absolute paths are only tried literally.
    pub fn resolve_path(&self, path: &Path) -> Option<PathBuf> {
        if path.as_os_str().is_empty() {
            return None;
        }
        if path.exists() {
            return Some(path.to_path_buf());
        }
        if path.is_absolute() {
            return None;
        }
        self.search_roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.exists())
    }

    #[tracing::instrument(skip(self, image), fields(value = image.value))]
    pub fn resolve(&self, image: ImageRef<'_>) -> PagResult<ResolvedImage> {
        if let Some(uri) = image.image_data {
            return spill_data_uri(uri);
        }
        if image.value.starts_with("data:") {
            return spill_data_uri(image.value);
        }
        if let Some(bytes) = self.uploads.get(image.value) {
            tracing::debug!(field = image.value, len = bytes.len(), "using uploaded part");
            let ext = image::guess_format(bytes)
                .ok()
                .and_then(|f| f.extensions_str().first().copied())
                .unwrap_or("png");
            return spill(bytes, &format!(".{ext}")).map(ResolvedImage::Temp);
        }
        if image.value.is_empty() {
            return Err(PagError::image_source("image reference is empty"));
        }
        self.resolve_path(Path::new(image.value))
            .map(ResolvedImage::Path)
            .ok_or_else(|| {
                PagError::image_source(format!(
                    "'{}' is not an uploaded part and no such file exists",
                    image.value
                ))
            })
    }
}

/// Split `data:<mime>;base64,<payload>` into the MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> PagResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PagError::image_source("data uri must start with 'data:'"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PagError::image_source("data uri has no ',' separator"))?;
    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(PagError::image_source(
            "only base64-encoded data uris are supported",
        ));
    }
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| PagError::image_decode(format!("data uri payload is not base64: {e}")))?;
    Ok((mime, bytes))
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        _ => ".png",
    }
}

fn spill_data_uri(uri: &str) -> PagResult<ResolvedImage> {
    let (mime, bytes) = decode_data_uri(uri)?;
    tracing::debug!(%mime, len = bytes.len(), "decoded inline image");
    spill(&bytes, extension_for_mime(&mime)).map(ResolvedImage::Temp)
}

fn spill(bytes: &[u8], suffix: &str) -> PagResult<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("pagsmith-img-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| PagError::image_source(format!("create temp image file: {e}")))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| PagError::image_source(format!("write temp image file: {e}")))?;
    Ok(file)
}

#[cfg(test)]
#[path = "../../tests/unit/edit/source.rs"]
mod tests;
