//! Browser side of file intake: object URLs, the hidden file picker, and
//! dimension probing with `createImageBitmap`.

use gallery_core::GalleryError;
use gallery_editor::intake::{DimensionProbe, Dimensions, ImageHandles, SelectedFile};
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileList, HtmlInputElement, ImageBitmap, Url};

/// Revokes object URLs once their images leave every block.
#[derive(Debug, Default)]
pub struct ObjectUrls;

impl ImageHandles for ObjectUrls {
    fn release(&self, url: &str) {
        if url.starts_with("blob:") && Url::revoke_object_url(url).is_err() {
            log::warn!("could not revoke {url}");
        }
    }
}

/// Probes the files of one selection by decoding them to bitmaps.
#[derive(Default)]
pub struct BitmapProbe {
    files: HashMap<String, File>,
}

impl BitmapProbe {
    /// Create an object URL for every file. Returns the probe and the
    /// selection in picker order.
    pub fn from_files(files: Vec<File>) -> (Self, Vec<SelectedFile>) {
        let mut probe = Self::default();
        let mut selected = Vec::with_capacity(files.len());
        for file in files {
            let url = match Url::create_object_url_with_blob(&file) {
                Ok(url) => url,
                Err(err) => {
                    log::warn!("no object URL for {}: {err:?}", file.name());
                    continue;
                }
            };
            selected.push(SelectedFile {
                name: file.name(),
                byte_size: file.size() as u64,
                mime_type: file.type_(),
                url: url.clone(),
            });
            probe.files.insert(url, file);
        }
        (probe, selected)
    }
}

impl DimensionProbe for BitmapProbe {
    async fn probe(&self, file: &SelectedFile) -> Result<Dimensions, GalleryError> {
        let fail = |reason: String| GalleryError::DimensionLoad {
            name: file.name.clone(),
            reason,
        };
        let blob = self
            .files
            .get(&file.url)
            .ok_or_else(|| fail("file is no longer available".into()))?;
        let window = web_sys::window().ok_or_else(|| fail("no window".into()))?;
        let promise = window
            .create_image_bitmap_with_blob(blob)
            .map_err(|e| fail(format!("{e:?}")))?;
        let bitmap: ImageBitmap = JsFuture::from(promise)
            .await
            .map_err(|e| fail(format!("{e:?}")))?
            .dyn_into()
            .map_err(|_| fail("decoder returned no bitmap".into()))?;
        let dims = Dimensions {
            width: bitmap.width(),
            height: bitmap.height(),
        };
        bitmap.close();
        Ok(dims)
    }
}

pub fn file_list(list: Option<FileList>) -> Vec<File> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

/// Open a multi-file picker; `on_select` receives the chosen files once.
pub fn open_file_picker(
    accept: &str,
    on_select: impl FnOnce(Vec<File>) + 'static,
) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_type("file");
    input.set_multiple(true);
    input.set_accept(accept);

    let picker = input.clone();
    let on_change = Closure::once_into_js(move |_: web_sys::Event| {
        on_select(file_list(picker.files()));
    });
    input.set_onchange(Some(on_change.unchecked_ref()));
    input.click();
    Ok(())
}
