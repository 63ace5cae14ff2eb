//! WASM bridge for the gallery block: exposes `GalleryBlock` as a block
//! tool class to a JavaScript block editor.
//!
//! Compiled via `wasm-pack build --target web`. The editor constructs one
//! `GalleryBlock` per gallery block with `{ data, api, config, readOnly,
//! block }`. Blocks of the same editor share a drag session, looked up by
//! the `sessionKey` entry of the tool config (`"default"` when absent), so
//! two editors on one page never see each other's drags.

mod dom;
mod host;
mod probe;

use dom::DomView;
use gallery_core::{BlockId, GalleryConfig};
use gallery_editor::block::{BlockContext, BlockInstance};
use gallery_editor::input::GalleryEvent;
use gallery_editor::intake::ingest;
use gallery_editor::session::DragSession;
use host::{JsHost, data_from_js, data_to_js};
use js_sys::Reflect;
use probe::{BitmapProbe, ObjectUrls, open_file_picker};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

const TOOLBOX_TITLE: &str = "Gallery";
const TOOLBOX_ICON: &str = r#"<svg width="17" height="15" viewBox="0 0 17 15" xmlns="http://www.w3.org/2000/svg"><path d="M1 1h6v6H1zM10 1h6v6h-6zM1 8h6v6H1zM10 8h6v6h-6z" fill="none" stroke="currentColor" stroke-width="1.5"/></svg>"#;

/// State shared by the gallery blocks of one editor.
pub struct EditorShared {
    pub session: Rc<DragSession>,
    pub handles: Rc<ObjectUrls>,
    views: ViewRegistry<DomView>,
}

/// Mounted views by block id, held weakly.
struct ViewRegistry<V> {
    views: RefCell<HashMap<BlockId, Weak<V>>>,
}

impl<V> Default for ViewRegistry<V> {
    fn default() -> Self {
        Self {
            views: RefCell::new(HashMap::new()),
        }
    }
}

impl<V> ViewRegistry<V> {
    fn get(&self, id: BlockId) -> Option<Rc<V>> {
        self.views.borrow().get(&id).and_then(Weak::upgrade)
    }

    fn register(&self, id: BlockId, view: &Rc<V>) {
        let mut views = self.views.borrow_mut();
        views.retain(|_, v| v.strong_count() > 0);
        views.insert(id, Rc::downgrade(view));
    }

    fn unregister(&self, id: BlockId) {
        self.views.borrow_mut().remove(&id);
    }

    fn len(&self) -> usize {
        self.views.borrow().len()
    }
}

thread_local! {
    static EDITORS: RefCell<HashMap<String, Rc<EditorShared>>> = RefCell::new(HashMap::new());
}

impl EditorShared {
    fn for_key(key: &str) -> Rc<Self> {
        EDITORS.with(|editors| {
            editors
                .borrow_mut()
                .entry(key.to_string())
                .or_insert_with(|| {
                    Rc::new(Self {
                        session: DragSession::new(),
                        handles: Rc::new(ObjectUrls),
                        views: ViewRegistry::default(),
                    })
                })
                .clone()
        })
    }

    pub fn view_of(&self, id: BlockId) -> Option<Rc<DomView>> {
        self.views.get(id)
    }
}

/// The block tool class handed to the editor.
#[wasm_bindgen]
pub struct GalleryBlock {
    view: Rc<DomView>,
    shared: Rc<EditorShared>,
}

#[wasm_bindgen]
impl GalleryBlock {
    #[wasm_bindgen(constructor)]
    pub fn new(args: JsValue) -> Result<GalleryBlock, JsValue> {
        console_error_panic_hook_setup();

        let config_js = field(&args, "config");
        let config = parse_config(&config_js);
        logger::init(config.log_level());

        let data = data_from_js(&field(&args, "data")).map_err(to_js)?;
        let read_only = field(&args, "readOnly").as_bool().unwrap_or(false);
        let id = field(&field(&args, "block"), "id")
            .as_string()
            .map(|id| BlockId::intern(&id))
            .unwrap_or_else(BlockId::generate);
        let session_key = field(&config_js, "sessionKey")
            .as_string()
            .unwrap_or_else(|| "default".to_string());

        let shared = EditorShared::for_key(&session_key);
        let ctx = BlockContext::new(Rc::new(JsHost::new(field(&args, "api"))))
            .with_session(shared.session.clone())
            .with_handles(shared.handles.clone())
            .with_config(config);
        let block = BlockInstance::shared(id, data, ctx);
        block.borrow_mut().set_read_only(read_only);

        let view = DomView::mount(block, shared.clone())?;
        shared.views.register(id, &view);
        log::debug!("gallery block {id} mounted");
        Ok(Self { view, shared })
    }

    /// Root element of the block.
    pub fn render(&self) -> web_sys::HtmlElement {
        self.view.root().clone()
    }

    /// Current data for persistence.
    pub fn save(&self) -> Result<JsValue, JsValue> {
        data_to_js(&self.view.block.borrow().save()).map_err(to_js)
    }

    /// Paste handler. A pasted image file replaces the block's images; any
    /// other paste resets the block.
    #[wasm_bindgen(js_name = onPaste)]
    pub fn on_paste(&self, event: JsValue) {
        let file = field(&field(&event, "detail"), "file")
            .dyn_into::<web_sys::File>()
            .ok();
        let view = self.view.clone();
        let Some(file) = file else {
            view.dispatch(GalleryEvent::Paste { images: Vec::new() });
            return;
        };

        let (handles, config) = {
            let block = view.block.borrow();
            let ctx = block.context();
            (ctx.handles.clone(), ctx.config.clone())
        };
        wasm_bindgen_futures::spawn_local(async move {
            let (probe, selected) = BitmapProbe::from_files(vec![file]);
            let report = ingest(&probe, &*handles, &config, selected).await;
            for failure in &report.failures {
                log::warn!("paste skipped: {failure}");
            }
            view.dispatch(GalleryEvent::Paste {
                images: report.records,
            });
        });
    }

    /// Called when the block is chosen from the toolbox: pick files.
    #[wasm_bindgen(js_name = appendCallback)]
    pub fn append_callback(&self) -> Result<(), JsValue> {
        let block = self.view.block.clone();
        let (handles, config) = {
            let b = block.borrow();
            (b.context().handles.clone(), b.context().config.clone())
        };
        let accept = config.accept.clone();
        open_file_picker(&accept, move |files| {
            if files.is_empty() {
                return;
            }
            wasm_bindgen_futures::spawn_local(async move {
                let (probe, selected) = BitmapProbe::from_files(files);
                let report = ingest(&probe, &*handles, &config, selected).await;
                let created = BlockInstance::accept_upload(&block, report);
                log::debug!("upload created {} gallery blocks", created.len());
            });
        })
    }

    /// The editor removed this block: detach it and release its images.
    pub fn removed(&self) {
        self.detach();
        self.view.block.borrow_mut().on_removed();
    }

    /// The editor discarded this instance (editor teardown, or the block
    /// was re-created after an update). Images stay with the block data.
    pub fn destroy(&self) {
        self.detach();
    }

    fn detach(&self) {
        let id = self.view.block.borrow().id();
        self.view.unmount();
        self.shared.views.unregister(id);
        log::debug!(
            "gallery block {id} detached, {} still mounted",
            self.shared.views.len()
        );
    }

    #[wasm_bindgen(getter)]
    pub fn toolbox() -> JsValue {
        let toolbox = js_sys::Object::new();
        let _ = Reflect::set(&toolbox, &"title".into(), &TOOLBOX_TITLE.into());
        let _ = Reflect::set(&toolbox, &"icon".into(), &TOOLBOX_ICON.into());
        toolbox.into()
    }

    #[wasm_bindgen(getter, js_name = pasteConfig)]
    pub fn paste_config() -> JsValue {
        let mime_types = js_sys::Array::of1(&"image/*".into());
        let files = js_sys::Object::new();
        let _ = Reflect::set(&files, &"mimeTypes".into(), &mime_types);
        let config = js_sys::Object::new();
        let _ = Reflect::set(&config, &"files".into(), &files);
        config.into()
    }

    #[wasm_bindgen(getter, js_name = isReadOnlySupported)]
    pub fn is_read_only_supported() -> bool {
        true
    }

    #[wasm_bindgen(getter)]
    pub fn contentless() -> bool {
        true
    }
}

fn field(target: &JsValue, name: &str) -> JsValue {
    if target.is_undefined() || target.is_null() {
        return JsValue::UNDEFINED;
    }
    Reflect::get(target, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

fn parse_config(value: &JsValue) -> GalleryConfig {
    if value.is_undefined() || value.is_null() {
        return GalleryConfig::default();
    }
    let raw: String = js_sys::JSON::stringify(value)
        .map(Into::into)
        .unwrap_or_default();
    GalleryConfig::from_json(&raw).unwrap_or_else(|err| {
        web_sys::console::warn_1(&format!("gallery config ignored: {err}").into());
        GalleryConfig::default()
    })
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("gallery WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// `log` records → browser console.
mod logger {
    use log::{Level, LevelFilter, Log, Metadata, Record};

    struct ConsoleLogger;

    static LOGGER: ConsoleLogger = ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let msg = format!("[gallery] {}", record.args()).into();
            match record.level() {
                Level::Error => web_sys::console::error_1(&msg),
                Level::Warn => web_sys::console::warn_1(&msg),
                Level::Info => web_sys::console::info_1(&msg),
                Level::Debug => web_sys::console::debug_1(&msg),
                Level::Trace => web_sys::console::log_1(&msg),
            }
        }

        fn flush(&self) {}
    }

    /// Install the console logger (first call only) and set the level.
    pub fn init(level: LevelFilter) {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detached_views_are_no_longer_found() {
        let views = ViewRegistry::<String>::default();
        let id = BlockId::intern("detach-me");
        let view = Rc::new("tiles".to_string());
        views.register(id, &view);
        assert_eq!(views.get(id).as_deref(), Some(&"tiles".to_string()));

        views.unregister(id);
        assert!(views.get(id).is_none());
        assert_eq!(views.len(), 0);
    }

    #[test]
    fn dropped_views_are_pruned_on_register() {
        let views = ViewRegistry::<String>::default();
        let gone = BlockId::intern("gone");
        views.register(gone, &Rc::new("old".to_string()));
        assert!(views.get(gone).is_none());

        let kept = Rc::new("new".to_string());
        views.register(BlockId::intern("kept"), &kept);
        assert_eq!(views.len(), 1);
    }
}
