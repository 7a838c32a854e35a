use std::cell::Cell;
use std::path::Path;

use super::*;
use crate::foundation::core::Size;
use crate::render::sink::InMemorySink;
use crate::sdk::memory::{ImageLayerSpec, MemoryDocument, MemoryImage, MemorySdk, MemorySurface};

fn sdk_ready() {
    capability::init(MemorySdk::is_available());
}

fn red_card(duration_secs: f64) -> MemoryDocument {
    MemoryDocument::builder(8, 8)
        .duration_secs(duration_secs)
        .frame_rate(30.0)
        .image_layer(
            ImageLayerSpec::new("card", 0, Size::new(8.0, 8.0))
                .placeholder(MemoryImage::solid(8, 8, [255, 0, 0, 255])),
        )
        .build()
        .unwrap()
}

fn center(frame: &FrameRGBA) -> [u8; 4] {
    let i = (4 * frame.width as usize + 4) * 4;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn list(json: &str) -> ModificationList {
    ModificationList::from_json_str(json).unwrap()
}

#[test]
fn frames_arrive_in_order_at_document_rate() {
    sdk_ready();
    let sdk = MemorySdk::new();
    let sources = SourceContext::new();
    let mut renderer =
        FrameRenderer::new(&sdk, &sources, red_card(0.1), &ModificationList::default()).unwrap();
    let mut sink = InMemorySink::new();

    let report = renderer.render_all(None, &mut sink).unwrap();
    assert_eq!(report.frames_total, 3);
    assert_eq!(report.frames_rendered, 3);
    assert_eq!(report.frames_skipped, 0);
    assert!(report.paths.is_empty());

    let order: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(sink.config().unwrap().total_frames, 3);
    assert_eq!(center(&sink.frames()[0].1), [255, 0, 0, 255]);
}

#[test]
fn fps_override_changes_frame_count() {
    sdk_ready();
    let sdk = MemorySdk::new();
    let sources = SourceContext::new();
    let mut renderer =
        FrameRenderer::new(&sdk, &sources, red_card(1.0), &ModificationList::default()).unwrap();
    let report = renderer
        .render_all(Some(12.0), &mut InMemorySink::new())
        .unwrap();
    assert_eq!(report.frames_total, 12);
    assert!(matches!(
        renderer.render_all(Some(0.0), &mut InMemorySink::new()),
        Err(PagError::Validation(_))
    ));
}

#[test]
fn transforms_apply_every_frame_without_touching_saved_state() {
    sdk_ready();
    let sdk = MemorySdk::new();
    let sources = SourceContext::new();
    let doc = red_card(0.1);
    let before = doc.to_bytes().unwrap();
    let mods = list(r#"[{"layerIndex":0,"type":"imageTransform","transform":{"opacity":0.5}}]"#);
    let mut renderer = FrameRenderer::new(&sdk, &sources, doc, &mods).unwrap();

    let a = renderer.render_frame(0.0).unwrap();
    let b = renderer.render_frame(1.0).unwrap();
    for f in [&a, &b] {
        let px = center(f);
        assert!((126..=128).contains(&px[3]), "alpha {}", px[3]);
    }
    assert_eq!(renderer.document().to_bytes().unwrap(), before);
}

#[test]
fn replacements_apply_once_and_missing_paths_are_skipped() {
    sdk_ready();
    let dir = tempfile::tempdir().unwrap();
    let blue = dir.path().join("blue.png");
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
        .save(&blue)
        .unwrap();
    let mods = ModificationList::new(vec![
        Modification::ImageReplacement {
            layer_index: 0,
            image_path: dir.path().join("missing.png"),
        },
        Modification::ImageReplacement {
            layer_index: 0,
            image_path: blue,
        },
    ]);

    let sdk = MemorySdk::new();
    let sources = SourceContext::new();
    let mut renderer = FrameRenderer::new(&sdk, &sources, red_card(0.1), &mods).unwrap();
    let ledger = renderer.prepare();
    assert_eq!((ledger.succeeded, ledger.failed), (1, 1));
    assert_eq!(renderer.prepare(), ledger);

    let frame = renderer.render_frame(0.5).unwrap();
    assert_eq!(center(&frame), [0, 0, 255, 255]);
}

struct FlakySdk {
    inner: MemorySdk,
    flushes: Cell<u32>,
}

impl DocumentSdk for FlakySdk {
    type Document = MemoryDocument;
    type Surface = MemorySurface;

    fn load(&self, bytes: &[u8]) -> Option<MemoryDocument> {
        self.inner.load(bytes)
    }
    fn image_from_path(&self, path: &Path) -> Option<MemoryImage> {
        self.inner.image_from_path(path)
    }
    fn make_offscreen(&self, width: u32, height: u32) -> Option<MemorySurface> {
        self.inner.make_offscreen(width, height)
    }
    fn flush(&self, document: &MemoryDocument, surface: &mut MemorySurface, progress: f64) -> bool {
        let n = self.flushes.get();
        self.flushes.set(n + 1);
        n % 2 == 0 && self.inner.flush(document, surface, progress)
    }
}

#[test]
fn failed_frames_are_skipped_and_rendering_continues() {
    sdk_ready();
    let sdk = FlakySdk {
        inner: MemorySdk::new(),
        flushes: Cell::new(0),
    };
    let sources = SourceContext::new();
    let mut renderer =
        FrameRenderer::new(&sdk, &sources, red_card(0.2), &ModificationList::default()).unwrap();
    let mut sink = InMemorySink::new();
    let report = renderer.render_all(None, &mut sink).unwrap();

    assert_eq!(report.frames_total, 6);
    assert_eq!(report.frames_rendered, 3);
    assert_eq!(report.frames_skipped, 3);
    let order: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![0, 2, 4]);
}

#[test]
fn load_rejects_unreadable_bytes() {
    sdk_ready();
    let sdk = MemorySdk::new();
    let sources = SourceContext::new();
    assert!(matches!(
        FrameRenderer::load(&sdk, &sources, b"nope", &ModificationList::default()),
        Err(PagError::InputUnreadable(_))
    ));
    assert!(matches!(
        FrameRenderer::new(&sdk, &sources, red_card(0.1), &ModificationList::default())
            .unwrap()
            .render_frame(f64::NAN),
        Err(PagError::Validation(_))
    ));
}
