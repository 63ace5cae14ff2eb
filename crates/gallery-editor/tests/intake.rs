//! Integration tests: file selection → probing → new gallery blocks.

use gallery_core::{BlockData, GalleryConfig, GalleryError, ImageRecord};
use gallery_editor::block::{BlockContext, BlockInstance};
use gallery_editor::host::{HostEditor, MemoryHost};
use gallery_editor::input::GalleryEvent;
use gallery_editor::intake::{Dimensions, DimensionProbe, ImageHandles, SelectedFile, ingest};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

/// Decodes every file except those whose name starts with `broken`.
struct FakeProbe;

impl DimensionProbe for FakeProbe {
    async fn probe(&self, file: &SelectedFile) -> Result<Dimensions, GalleryError> {
        if file.name.starts_with("broken") {
            return Err(GalleryError::DimensionLoad {
                name: file.name.clone(),
                reason: "decode failed".into(),
            });
        }
        Ok(Dimensions {
            width: 1200,
            height: 800,
        })
    }
}

#[derive(Default)]
struct RecordingHandles {
    released: RefCell<Vec<String>>,
}

impl ImageHandles for RecordingHandles {
    fn release(&self, url: &str) {
        self.released.borrow_mut().push(url.to_string());
    }
}

fn file(name: &str, mime: &str) -> SelectedFile {
    SelectedFile {
        name: name.to_string(),
        byte_size: 2_048,
        mime_type: mime.to_string(),
        url: format!("blob:{name}"),
    }
}

fn selection(n: usize) -> Vec<SelectedFile> {
    (0..n).map(|i| file(&format!("photo{i}.jpg"), "image/jpeg")).collect()
}

#[tokio::test(flavor = "current_thread")]
async fn seven_uploads_become_three_blocks_round_robin() {
    let host = Rc::new(MemoryHost::new());
    let placeholder_id = host.push("gallery", BlockData::default());
    let ctx = BlockContext::new(host.clone());
    let placeholder = BlockInstance::shared(placeholder_id, None, ctx.clone());

    let report = ingest(&FakeProbe, &*ctx.handles, &ctx.config, selection(7)).await;
    assert!(report.failures.is_empty());
    assert_eq!(report.records.len(), 7);

    let created = BlockInstance::accept_upload(&placeholder, report);
    assert_eq!(created.len(), 3);
    // The empty toolbox placeholder is replaced by the new blocks.
    assert_eq!(host.ids(), created);

    let layout: Vec<Vec<String>> = created
        .iter()
        .map(|id| {
            host.data_of(*id)
                .unwrap()
                .images
                .iter()
                .map(|i| i.name.clone())
                .collect()
        })
        .collect();
    assert_eq!(
        layout,
        vec![
            vec!["photo0.jpg", "photo3.jpg", "photo6.jpg"],
            vec!["photo1.jpg", "photo4.jpg"],
            vec!["photo2.jpg", "photo5.jpg"],
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn failures_are_reported_and_released() {
    let handles = RecordingHandles::default();
    let files = vec![
        file("a.png", "image/png"),
        file("broken.png", "image/png"),
        file("notes.txt", "text/plain"),
        file("b.webp", "image/webp"),
    ];

    let report = ingest(&FakeProbe, &handles, &GalleryConfig::default(), files).await;

    let kept: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(kept, vec!["a.png", "b.webp"]);
    assert_eq!(report.failed_names(), vec!["broken.png", "notes.txt"]);
    assert_eq!(
        *handles.released.borrow(),
        vec!["blob:broken.png".to_string(), "blob:notes.txt".to_string()]
    );
    assert!((report.records[0].aspect_ratio - 1.5).abs() < 1e-9);
}

#[tokio::test(flavor = "current_thread")]
async fn upload_into_filled_block_keeps_it() {
    let host = Rc::new(MemoryHost::new());
    let image = ImageRecord::new("blob:kept", "kept.png", 1, "image/png", 10, 10).unwrap();
    let data = BlockData::with_images([image]);
    let id = host.push("gallery", data.clone());
    let ctx = BlockContext::new(host.clone());
    let block = BlockInstance::shared(id, Some(data), ctx.clone());

    let report = ingest(&FakeProbe, &*ctx.handles, &ctx.config, selection(2)).await;
    let created = BlockInstance::accept_upload(&block, report);

    assert_eq!(created.len(), 1);
    assert_eq!(host.ids(), vec![id, created[0]]);
    assert_eq!(host.block_count(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn all_failures_create_nothing() {
    let host = Rc::new(MemoryHost::new());
    let id = host.push("gallery", BlockData::default());
    let ctx = BlockContext::new(host.clone());
    let block = BlockInstance::shared(id, None, ctx.clone());

    let report = ingest(
        &FakeProbe,
        &*ctx.handles,
        &ctx.config,
        vec![file("broken1.png", "image/png")],
    )
    .await;
    assert!(BlockInstance::accept_upload(&block, report).is_empty());
    assert_eq!(host.ids(), vec![id]);
}

// ─── Paste ──────────────────────────────────────────────────────────────

#[test]
fn paste_replaces_images_and_releases_the_rest() {
    let host = Rc::new(MemoryHost::new());
    let handles = Rc::new(RecordingHandles::default());
    let old = ImageRecord::new("blob:old", "old.png", 1, "image/png", 10, 10).unwrap();
    let mut data = BlockData::with_images([old]);
    data.caption = "before".into();
    let id = host.push("gallery", data.clone());
    let ctx = BlockContext::new(host).with_handles(handles.clone());
    let block = BlockInstance::shared(id, Some(data), ctx);

    let pasted: Vec<ImageRecord> = (0..4)
        .map(|i| {
            ImageRecord::new(format!("blob:p{i}"), format!("p{i}.png"), 1, "image/png", 10, 10)
                .unwrap()
        })
        .collect();
    let reaction = BlockInstance::handle(&block, GalleryEvent::Paste { images: pasted });
    assert!(reaction.rerender);

    let saved = block.borrow().save();
    assert_eq!(saved.len(), 3);
    assert_eq!(saved.caption, "");
    assert_eq!(
        *handles.released.borrow(),
        vec!["blob:old".to_string(), "blob:p3".to_string()]
    );
}

#[test]
fn paste_without_images_resets_block() {
    let host = Rc::new(MemoryHost::new());
    let image = ImageRecord::new("blob:a", "a.png", 1, "image/png", 10, 10).unwrap();
    let data = BlockData::with_images([image]);
    let id = host.push("gallery", data.clone());
    let block = BlockInstance::shared(id, Some(data), BlockContext::new(host));

    BlockInstance::handle(&block, GalleryEvent::Paste { images: Vec::new() });
    assert_eq!(block.borrow().save(), BlockData::default());
}
