use std::path::PathBuf;

use crate::{
    edit::{execute::Executor, locate::AmbiguityPolicy, source::SourceContext},
    foundation::core::{FrameRGBA, FrameTiming},
    foundation::error::{PagError, PagResult},
    model::modification::{Modification, ModificationList, TransformSpec},
    pipeline::persist::{OutcomeLedger, log_document_summary},
    render::sink::{FrameSink, SinkConfig},
    sdk::{Document, DocumentSdk, OffscreenSurface, capability},
};

/// Summary of a frame-sequence render.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct RenderReport {
    pub frames_total: u64,
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub paths: Vec<PathBuf>,
}

/// Renders one loaded document frame by frame.
///
/// Image replacements are applied once, before the first frame. Image transforms are
/// reapplied to the live layers before every frame because the surface does not retain them.
pub struct FrameRenderer<'a, S: DocumentSdk> {
    sdk: &'a S,
    sources: &'a SourceContext,
    policy: AmbiguityPolicy,
    document: S::Document,
    replacements: Vec<Modification>,
    transforms: Vec<(usize, TransformSpec)>,
    prepared: Option<OutcomeLedger>,
}

impl<'a, S: DocumentSdk> FrameRenderer<'a, S> {
    pub fn new(
        sdk: &'a S,
        sources: &'a SourceContext,
        document: S::Document,
        list: &ModificationList,
    ) -> PagResult<Self> {
        capability::ensure_available()?;
        log_document_summary(&document);

        let mut replacements = Vec::new();
        let mut transforms = Vec::new();
        let mut ignored = 0usize;
        for m in list.iter() {
            match m {
                Modification::ImageReplacement { .. } => replacements.push(m.clone()),
                Modification::ImageTransform {
                    layer_index,
                    transform,
                } => transforms.push((*layer_index, *transform)),
                _ => ignored += 1,
            }
        }
        if ignored > 0 {
            tracing::debug!(ignored, "items other than replacements and transforms are ignored");
        }

        Ok(Self {
            sdk,
            sources,
            policy: AmbiguityPolicy::default(),
            document,
            replacements,
            transforms,
            prepared: None,
        })
    }

    /// Load `bytes` through `sdk` and build a renderer over the result.
    pub fn load(
        sdk: &'a S,
        sources: &'a SourceContext,
        bytes: &[u8],
        list: &ModificationList,
    ) -> PagResult<Self> {
        capability::ensure_available()?;
        let document = sdk
            .load(bytes)
            .ok_or_else(|| PagError::input_unreadable("document sdk could not parse input"))?;
        Self::new(sdk, sources, document, list)
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn document(&self) -> &S::Document {
        &self.document
    }

    /// Apply the image replacements once; later calls return the first ledger.
    pub fn prepare(&mut self) -> OutcomeLedger {
        if let Some(ledger) = self.prepared {
            return ledger;
        }
        let executor = Executor::new(self.sdk, self.sources).with_policy(self.policy);
        let mut ledger = OutcomeLedger::default();
        for m in &self.replacements {
            let outcome = executor.execute(&mut self.document, m);
            ledger.record(&outcome);
        }
        tracing::info!(
            replaced = ledger.succeeded,
            failed = ledger.failed,
            "image replacements applied"
        );
        self.prepared = Some(ledger);
        ledger
    }

    fn reapply_transforms(&mut self) {
        let executor = Executor::new(self.sdk, self.sources).with_policy(self.policy);
        for (layer_index, spec) in &self.transforms {
            if let Err(err) = executor.apply_transform(&mut self.document, *layer_index, spec) {
                tracing::warn!(layer_index, %err, "could not apply image transform");
            }
        }
    }

    /// Rasterize the document at `progress` in `[0, 1]`.
    pub fn render_frame(&mut self, progress: f64) -> PagResult<FrameRGBA> {
        if !progress.is_finite() {
            return Err(PagError::validation("progress must be finite"));
        }
        let progress = progress.clamp(0.0, 1.0);
        self.prepare();
        self.reapply_transforms();

        let (w, h) = (self.document.width(), self.document.height());
        let mut surface = self
            .sdk
            .make_offscreen(w, h)
            .ok_or_else(|| PagError::frame_rasterize(format!("no {w}x{h} offscreen surface")))?;
        if !self.sdk.flush(&self.document, &mut surface, progress) {
            return Err(PagError::frame_rasterize(format!(
                "flush failed at progress {progress}"
            )));
        }
        surface.read_pixels().ok_or_else(|| {
            PagError::frame_rasterize(format!("pixel readback failed at progress {progress}"))
        })
    }

    /// Render every frame of the timeline into `sink`, skipping frames that fail.
    ///
    /// `fps` defaults to the document frame rate.
    #[tracing::instrument(skip(self, sink))]
    pub fn render_all(
        &mut self,
        fps: Option<f64>,
        sink: &mut dyn FrameSink,
    ) -> PagResult<RenderReport> {
        let fps = fps.unwrap_or_else(|| self.document.frame_rate());
        let timing = FrameTiming::from_micros(self.document.duration_micros(), fps)?;
        let total = timing.total_frames();

        self.prepare();
        sink.begin(SinkConfig {
            width: self.document.width(),
            height: self.document.height(),
            fps,
            total_frames: total,
        })?;

        let mut report = RenderReport {
            frames_total: total,
            ..RenderReport::default()
        };
        for frame in 0..total {
            let progress = timing.progress_at(frame);
            let pushed = self
                .render_frame(progress)
                .and_then(|pixels| sink.push_frame(frame, &pixels));
            match pushed {
                Ok(path) => {
                    report.frames_rendered += 1;
                    report.paths.extend(path);
                }
                Err(err) => {
                    report.frames_skipped += 1;
                    tracing::warn!(frame, progress, %err, "frame skipped");
                }
            }
            if (frame + 1) % 10 == 0 || frame + 1 == total {
                tracing::info!(
                    done = frame + 1,
                    total,
                    percent = (frame + 1) as f64 * 100.0 / total as f64,
                    "render progress"
                );
            }
        }
        sink.end()?;

        tracing::info!(
            rendered = report.frames_rendered,
            skipped = report.frames_skipped,
            "render complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
