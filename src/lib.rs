//! pagsmith edits animation templates and renders them frame by frame.
//!
//! A template is loaded through a [`DocumentSdk`], an ordered [`ModificationList`] is applied to
//! it, and the result is either re-serialized ([`PersistencePipeline`]) or rasterized frame by
//! frame ([`FrameRenderer`]).
//!
//! # Editing model
//!
//! - `text` items overwrite the text record at a per-kind text index.
//! - `image` and `imageReplacement` items substitute a decoded image at an editable index. The
//!   new image inherits the placeholder's placement through [`recover_transform`].
//! - `imageTransform` items are render-time overrides. They never reach serialized output and
//!   are reapplied to the live layers before every frame.
//!
//! Item failures are counted in an [`OutcomeLedger`] and never abort a batch. Unreadable input
//! and failed saves abort the whole request.
//!
//! # Backends
//!
//! The container codec and rasterizer live behind the traits in [`sdk`]. [`sdk::memory`] is a
//! complete in-process backend that stores documents as deterministic JSON and rasterizes
//! image layers on the CPU.
#![forbid(unsafe_code)]

mod config;
mod edit;
mod foundation;
mod model;
mod pipeline;
mod render;

pub mod sdk;

pub use config::{EditorConfig, LoggingConfig};
pub use edit::execute::{Executor, ItemOutcome};
pub use edit::locate::{AmbiguityPolicy, Locator};
pub use edit::recover::{RecoveredTransform, TransformSource, recover_transform};
pub use edit::source::{ResolvedImage, SourceContext, decode_data_uri, extension_for_mime};
pub use foundation::core::{
    Affine, FrameRGBA, FrameTiming, LayerTransform2D, Point, Rect, Size, Vec2,
};
pub use foundation::error::{PagError, PagResult};
pub use model::batch::{BatchEntry, batch_from_csv_reader, batch_from_json_str, load_batch};
pub use model::modification::{
    ImageRef, Modification, ModificationList, Offset2, Scale2, TransformSpec,
};
pub use pipeline::batch::{BatchItemReport, BatchReport, generate_batch};
pub use pipeline::persist::{
    ExportOutput, ItemFailure, OutcomeLedger, PersistencePipeline, PipelineState,
    log_document_summary, serialize,
};
pub use render::frames::{FrameRenderer, RenderReport};
pub use render::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig, write_png};
pub use sdk::{
    Document, DocumentSdk, ImagePlacement, Layer, LayerId, LayerKind, OffscreenSurface,
    OriginalTransformProvider, ReplacedImageAccess, ScaleMode, SdkImage, TextData,
};
