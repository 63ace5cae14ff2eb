//! File intake: selected files → probed image records → new gallery blocks.
//!
//! Every selected file gets a transient handle up front. Measuring its
//! natural size is the only asynchronous step in the gallery; it goes
//! through `DimensionProbe` so the browser decoder can be swapped for a
//! fake in tests. A failing file does not sink the batch: it is reported
//! in `IntakeReport::failures` and its handle is released.

use crate::host::HostEditor;
use gallery_core::layout::bucket_with_capacity;
use gallery_core::{BlockData, BlockId, GalleryConfig, GalleryError, ImageRecord};
use std::future::Future;

/// A file picked by the user, before its dimensions are known.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub byte_size: u64,
    pub mime_type: String,
    /// Transient handle created for this file.
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decodes an image far enough to learn its natural size.
pub trait DimensionProbe {
    fn probe(&self, file: &SelectedFile) -> impl Future<Output = Result<Dimensions, GalleryError>>;
}

/// Owner of the transient image handles. `release` is called once a record
/// has left every block and will not come back.
pub trait ImageHandles {
    fn release(&self, url: &str);
}

/// Handle owner for hosts whose handles need no cleanup.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepHandles;

impl ImageHandles for KeepHandles {
    fn release(&self, _url: &str) {}
}

/// Outcome of probing one selection, in selection order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IntakeReport {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<GalleryError>,
}

impl IntakeReport {
    /// Names of the files that could not be used.
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter_map(|err| match err {
                GalleryError::DimensionLoad { name, .. }
                | GalleryError::UnsupportedType { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Probe every file and build records for the ones that decode.
pub async fn ingest<P: DimensionProbe>(
    probe: &P,
    handles: &dyn ImageHandles,
    config: &GalleryConfig,
    files: Vec<SelectedFile>,
) -> IntakeReport {
    let mut report = IntakeReport::default();
    for file in files {
        let result = if config.accepts(&file.mime_type) {
            match probe.probe(&file).await {
                Ok(dim) => ImageRecord::new(
                    file.url.clone(),
                    file.name.clone(),
                    file.byte_size,
                    file.mime_type.clone(),
                    dim.width,
                    dim.height,
                ),
                Err(err) => Err(err),
            }
        } else {
            Err(GalleryError::UnsupportedType {
                name: file.name.clone(),
                mime_type: file.mime_type.clone(),
            })
        };

        match result {
            Ok(record) => report.records.push(record),
            Err(err) => {
                log::warn!("skipping upload: {err}");
                handles.release(&file.url);
                report.failures.push(err);
            }
        }
    }
    log::debug!(
        "intake: {} usable, {} failed",
        report.records.len(),
        report.failures.len()
    );
    report
}

/// Bucket `records` into columns and insert one block per bucket, in
/// bucket order, starting at host index `at` (append when `None`).
pub fn place_buckets(
    host: &dyn HostEditor,
    config: &GalleryConfig,
    records: Vec<ImageRecord>,
    at: Option<usize>,
) -> Vec<BlockId> {
    let mut index = at.unwrap_or_else(|| host.block_count());
    let mut created = Vec::new();
    for bucket in bucket_with_capacity(records, config.max_images_per_block) {
        let data = BlockData::with_images(bucket);
        match host.insert_block(&config.block_kind, &data, Some(index), false) {
            Ok(id) => {
                created.push(id);
                index += 1;
            }
            Err(err) => log::warn!("could not create gallery block: {err}"),
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn buckets_land_after_anchor_in_order() {
        let host = MemoryHost::new();
        host.push("paragraph", BlockData::default());
        host.push("paragraph", BlockData::default());
        let records: Vec<ImageRecord> = (0..4)
            .map(|i| {
                ImageRecord::new(format!("blob:{i}"), format!("{i}.png"), 1, "image/png", 10, 10)
                    .unwrap()
            })
            .collect();

        let created = place_buckets(&host, &GalleryConfig::default(), records, Some(1));
        assert_eq!(created.len(), 2);
        let ids = host.ids();
        assert_eq!(ids[1], created[0]);
        assert_eq!(ids[2], created[1]);
        assert_eq!(host.data_of(created[0]).unwrap().len(), 2);
        assert_eq!(host.data_of(created[1]).unwrap().len(), 2);
    }

    #[test]
    fn failed_names_skip_other_errors() {
        let report = IntakeReport {
            records: Vec::new(),
            failures: vec![
                GalleryError::DimensionLoad {
                    name: "a.png".into(),
                    reason: "x".into(),
                },
                GalleryError::InvalidDropTransfer("y".into()),
                GalleryError::UnsupportedType {
                    name: "b.txt".into(),
                    mime_type: "text/plain".into(),
                },
            ],
        };
        assert_eq!(report.failed_names(), vec!["a.png", "b.txt"]);
    }
}
