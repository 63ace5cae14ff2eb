//! DOM rendering and event wiring for one gallery block.
//!
//! Listeners are attached once to the block root and the document and
//! delegate to tiles through `data-index`. Tiles are only rebuilt when the
//! images or their widths change: the browser drags the source tile node,
//! and a detached source never delivers `dragend`.

use crate::EditorShared;
use gallery_core::{Bounds, Point, TransferEnvelope};
use gallery_editor::block::{BlockInstance, DropOutcome, Reaction, SharedBlock};
use gallery_editor::input::{DropTarget, GalleryEvent};
use gallery_editor::view::{BlockView, TAIL_MARKER_CLASS, TileView};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DragEvent, Element, EventTarget, HtmlElement, KeyboardEvent, MouseEvent};

const ROW_CLASS: &str = "image-gallery__row";
const TILE_CLASS: &str = "image-gallery__tile";
const CAPTION_CLASS: &str = "image-gallery__caption";

/// An attached listener, removed again on unmount.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

pub struct DomView {
    pub block: SharedBlock,
    shared: Rc<EditorShared>,
    document: Document,
    root: HtmlElement,
    row: HtmlElement,
    caption: HtmlElement,
    tail: Element,
    rendered: RefCell<Option<BlockView>>,
    listeners: RefCell<Vec<Listener>>,
}

impl DomView {
    pub fn mount(block: SharedBlock, shared: Rc<EditorShared>) -> Result<Rc<Self>, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let root: HtmlElement = document.create_element("div")?.dyn_into()?;
        let row: HtmlElement = document.create_element("div")?.dyn_into()?;
        row.set_class_name(ROW_CLASS);
        let caption: HtmlElement = document.create_element("div")?.dyn_into()?;
        caption.set_class_name(CAPTION_CLASS);
        caption.set_attribute("data-placeholder", "Caption")?;
        let tail = document.create_element("div")?;
        tail.set_class_name(TAIL_MARKER_CLASS);
        root.append_child(&row)?;
        root.append_child(&caption)?;

        let view = Rc::new(Self {
            block,
            shared,
            document,
            root,
            row,
            caption,
            tail,
            rendered: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        view.wire()?;
        view.render()?;
        Ok(view)
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    /// Detach every listener. The block is gone from the host.
    ///
    /// Unmounting can happen from inside one of these listeners (Backspace
    /// deletes the block synchronously), so the closures are only dropped
    /// once the current task has finished.
    pub fn unmount(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow_mut().drain(..).collect();
        for listener in &listeners {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
        wasm_bindgen_futures::spawn_local(async move { drop(listeners) });
    }

    fn caption_focused(&self) -> bool {
        let caption: &Element = self.caption.as_ref();
        self.document
            .active_element()
            .is_some_and(|el| &el == caption)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self) -> Result<(), JsValue> {
        let view = self.block.borrow().view();
        self.apply(&view)
    }

    fn apply(&self, view: &BlockView) -> Result<(), JsValue> {
        self.root.set_class_name(&view.classes.join(" "));

        let keep = self
            .rendered
            .borrow()
            .as_ref()
            .is_some_and(|last| last.same_tiles(view));
        if keep {
            self.restyle_tiles(view);
        } else {
            self.rebuild_tiles(view)?;
        }
        if view.tail_marker {
            self.row.append_child(&self.tail)?;
        } else {
            self.tail.remove();
        }

        let caption = &view.caption;
        if self.caption.text_content().unwrap_or_default() != caption.text {
            self.caption.set_text_content(Some(&caption.text));
        }
        self.caption
            .set_attribute("contenteditable", if caption.editable { "true" } else { "false" })?;
        self.caption
            .style()
            .set_property("display", if caption.visible { "" } else { "none" })?;
        if caption.focused && !self.caption_focused() {
            self.caption.focus()?;
        }
        self.rendered.replace(Some(view.clone()));
        Ok(())
    }

    fn rebuild_tiles(&self, view: &BlockView) -> Result<(), JsValue> {
        self.row.set_inner_html("");
        for (index, tile) in view.tiles.iter().enumerate() {
            let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
            el.set_class_name(&tile_classes(tile));
            el.set_attribute("data-index", &index.to_string())?;
            el.set_draggable(view.draggable);
            el.style().set_property("width", &tile.width.to_css())?;

            let img: web_sys::HtmlImageElement =
                self.document.create_element("img")?.dyn_into()?;
            img.set_src(&tile.url);
            img.set_alt(&tile.alt);
            img.set_draggable(false);
            el.append_child(&img)?;
            self.row.append_child(&el)?;
        }
        Ok(())
    }

    /// Same images as last time: only update classes on the existing tiles.
    fn restyle_tiles(&self, view: &BlockView) {
        for (el, tile) in self.tile_elements().iter().zip(&view.tiles) {
            el.set_class_name(&tile_classes(tile));
            if let Some(el) = el.dyn_ref::<HtmlElement>() {
                el.set_draggable(view.draggable);
            }
        }
    }

    fn tile_elements(&self) -> Vec<Element> {
        let children = self.row.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|el| el.class_list().contains(TILE_CLASS))
            .collect()
    }

    /// Dispatch an event to the block and re-render whatever it touched.
    pub fn dispatch(&self, event: GalleryEvent) -> Reaction {
        let reaction = BlockInstance::handle(&self.block, event);
        if reaction.rerender
            && !reaction.deleted
            && let Err(err) = self.render()
        {
            log::warn!("render failed: {err:?}");
        }
        for id in &reaction.others {
            if let Some(view) = self.shared.view_of(*id)
                && let Err(err) = view.render()
            {
                log::warn!("render of {id} failed: {err:?}");
            }
        }
        if let Some(DropOutcome::Rejected(err)) = &reaction.drop {
            log::debug!("drop rejected on {}: {err}", self.block.borrow().id());
        }
        reaction
    }

    // ─── Event wiring ────────────────────────────────────────────────────

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        kind: &'static str,
        handler: impl Fn(&DomView, web_sys::Event) + 'static,
    ) -> Result<(), JsValue> {
        let weak: Weak<Self> = Rc::downgrade(self);
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            if let Some(view) = weak.upgrade() {
                handler(&view, event);
            }
        });
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        self.listeners.borrow_mut().push(Listener {
            target: target.clone(),
            kind,
            closure,
        });
        Ok(())
    }

    fn wire(self: &Rc<Self>) -> Result<(), JsValue> {
        let root: EventTarget = self.root.clone().into();
        let document: EventTarget = self.document.clone().into();
        let caption: EventTarget = self.caption.clone().into();

        self.listen(&document, "click", |view, event| {
            let inside = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                .is_some_and(|node| view.root.contains(Some(&node)));
            view.dispatch(GalleryEvent::Click { inside });
        })?;

        self.listen(&document, "keydown", |view, event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let reaction = view.dispatch(GalleryEvent::Key {
                key: key.key(),
                caption_focused: view.caption_focused(),
            });
            if reaction.deleted {
                event.prevent_default();
            }
        })?;

        self.listen(&caption, "input", |view, _| {
            let text = view.caption.text_content().unwrap_or_default();
            view.dispatch(GalleryEvent::CaptionInput { text });
        })?;

        self.listen(&root, "dragstart", |view, event| {
            let Some(drag) = event.dyn_ref::<DragEvent>() else {
                return;
            };
            let Some(index) = tile_of(drag).map(|(_, index)| index) else {
                return;
            };
            let reaction = view.dispatch(GalleryEvent::DragStart { index });
            if let (Some(transfer), Some(dt)) = (reaction.transfer, drag.data_transfer()) {
                dt.set_effect_allowed("move");
                if let Err(err) = dt.set_data(TransferEnvelope::MIME, &transfer) {
                    log::warn!("could not set drag payload: {err:?}");
                }
            } else {
                event.prevent_default();
            }
        })?;

        self.listen(&root, "dragover", |view, event| {
            let Some(drag) = event.dyn_ref::<DragEvent>() else {
                return;
            };
            if !view.shared.session.is_active() {
                return;
            }
            event.prevent_default();
            let target = view.drop_target(drag);
            view.dispatch(GalleryEvent::DragOver {
                pointer: pointer_of(drag),
                target,
            });
            let allowed = !view
                .root
                .class_list()
                .contains(gallery_editor::view::NOT_ALLOWED_CLASS);
            if let Some(dt) = drag.data_transfer() {
                dt.set_drop_effect(if allowed { "move" } else { "none" });
            }
        })?;

        self.listen(&root, "dragleave", |view, event| {
            let Some(drag) = event.dyn_ref::<DragEvent>() else {
                return;
            };
            let still_inside = drag
                .related_target()
                .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                .is_some_and(|node| view.root.contains(Some(&node)));
            if !still_inside {
                view.dispatch(GalleryEvent::DragLeave);
            }
        })?;

        self.listen(&root, "drop", |view, event| {
            let Some(drag) = event.dyn_ref::<DragEvent>() else {
                return;
            };
            event.prevent_default();
            let transfer = drag
                .data_transfer()
                .and_then(|dt| dt.get_data(TransferEnvelope::MIME).ok())
                .filter(|s| !s.is_empty());
            let target = view.drop_target(drag);
            view.dispatch(GalleryEvent::Drop {
                pointer: pointer_of(drag),
                target,
                transfer,
            });
        })?;

        // On the document so every block drops its markers, whichever block
        // the drag started in.
        self.listen(&document, "dragend", |view, _| {
            view.dispatch(GalleryEvent::DragEnd);
        })?;

        Ok(())
    }

    /// Hovered tile, or the whole block with every tile's bounds.
    fn drop_target(&self, drag: &DragEvent) -> DropTarget {
        if let Some((el, index)) = tile_of(drag) {
            return DropTarget::Image {
                index,
                bounds: bounds_of(&el),
            };
        }
        let items = self.tile_elements().iter().map(bounds_of).collect();
        DropTarget::Block { items }
    }
}

fn tile_classes(tile: &TileView) -> String {
    let mut classes = vec![TILE_CLASS];
    classes.extend(tile.markers.iter().copied());
    if tile.dragging {
        classes.push("is-dragging");
    }
    classes.join(" ")
}

fn pointer_of(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

fn bounds_of(el: &Element) -> Bounds {
    let rect = el.get_bounding_client_rect();
    Bounds::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// The tile element under the event and its index.
fn tile_of(event: &DragEvent) -> Option<(Element, usize)> {
    let el = event
        .target()?
        .dyn_into::<Element>()
        .ok()?
        .closest(&format!(".{TILE_CLASS}"))
        .ok()??;
    let index = el.get_attribute("data-index")?.parse().ok()?;
    Some((el, index))
}
