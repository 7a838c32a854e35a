use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{PagError, PagResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called in strictly increasing frame order; skipped frames are never pushed.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> PagResult<()>;
    /// Returns where the frame was written, if the sink writes files.
    fn push_frame(&mut self, frame: u64, pixels: &FrameRGBA) -> PagResult<Option<PathBuf>>;
    fn end(&mut self) -> PagResult<()>;
}

/// Writes `<prefix>_<NNNN>.png` files with straight alpha into one directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.dir.join(format!("{}_{frame:04}.png", self.prefix))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> PagResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create frame dir '{}'", self.dir.display()))?;
        tracing::debug!(dir = %self.dir.display(), ?cfg, "png sequence sink ready");
        Ok(())
    }

    fn push_frame(&mut self, frame: u64, pixels: &FrameRGBA) -> PagResult<Option<PathBuf>> {
        let path = self.frame_path(frame);
        write_png(&path, pixels)?;
        Ok(Some(path))
    }

    fn end(&mut self) -> PagResult<()> {
        Ok(())
    }
}

/// Encode one frame as a straight-alpha RGBA PNG.
pub fn write_png(path: &Path, pixels: &FrameRGBA) -> PagResult<()> {
    let expected = pixels.width as usize * pixels.height as usize * 4;
    if pixels.data.len() != expected {
        return Err(PagError::frame_rasterize(format!(
            "pixel buffer is {} bytes, expected {expected} for {}x{}",
            pixels.data.len(),
            pixels.width,
            pixels.height
        )));
    }
    image::save_buffer(
        path,
        &pixels.to_straight_rgba8(),
        pixels.width,
        pixels.height,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PagResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: u64, pixels: &FrameRGBA) -> PagResult<Option<PathBuf>> {
        self.frames.push((frame, pixels.clone()));
        Ok(None)
    }

    fn end(&mut self) -> PagResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sink.rs"]
mod tests;
