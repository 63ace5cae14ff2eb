//! `HostEditor` over the JavaScript editor API object handed to every block.

use gallery_core::{BlockData, BlockId, HostError};
use gallery_editor::host::{BlockHandle, HostEditor};
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub struct JsHost {
    api: JsValue,
}

impl JsHost {
    pub fn new(api: JsValue) -> Self {
        Self { api }
    }

    /// Call `api.<group>.<method>(...args)`.
    fn call(&self, group: &str, method: &str, args: &[JsValue]) -> Result<JsValue, HostError> {
        let target = Reflect::get(&self.api, &JsValue::from_str(group)).map_err(js_error)?;
        let func: Function = Reflect::get(&target, &JsValue::from_str(method))
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| HostError::new(format!("api.{group}.{method} is not a function")))?;
        let args: Array = args.iter().collect();
        func.apply(&target, &args).map_err(js_error)
    }

    fn block_id_of(handle: &JsValue) -> Option<BlockId> {
        Reflect::get(handle, &JsValue::from_str("id"))
            .ok()
            .and_then(|id| id.as_string())
            .map(|id| BlockId::intern(&id))
    }
}

impl HostEditor for JsHost {
    fn insert_block(
        &self,
        kind: &str,
        data: &BlockData,
        index: Option<usize>,
        focus: bool,
    ) -> Result<BlockId, HostError> {
        let index_arg = index.map_or(JsValue::UNDEFINED, |i| JsValue::from_f64(i as f64));
        let handle = self.call(
            "blocks",
            "insert",
            &[
                JsValue::from_str(kind),
                data_to_js(data)?,
                JsValue::from(js_sys::Object::new()),
                index_arg,
                JsValue::from_bool(focus),
            ],
        )?;
        Self::block_id_of(&handle)
            .or_else(|| index.and_then(|i| self.get_block_by_index(i)).map(|h| h.id))
            .ok_or_else(|| HostError::new("inserted block has no id"))
    }

    fn delete_block(&self, index: Option<usize>) -> Result<(), HostError> {
        let args: Vec<JsValue> = index
            .map(|i| JsValue::from_f64(i as f64))
            .into_iter()
            .collect();
        self.call("blocks", "delete", &args).map(|_| ())
    }

    fn update_block_data(&self, id: BlockId, data: &BlockData) -> Result<(), HostError> {
        let result = self.call(
            "blocks",
            "update",
            &[id.with_str(JsValue::from_str), data_to_js(data)?],
        )?;
        // The call is issued now so that updates keep their order; only the
        // settlement is awaited.
        if let Ok(promise) = result.dyn_into::<Promise>() {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    log::warn!("update of block {id} failed: {err:?}");
                }
            });
        }
        Ok(())
    }

    fn get_block_by_index(&self, index: usize) -> Option<BlockHandle> {
        let handle = self
            .call("blocks", "getBlockByIndex", &[JsValue::from_f64(index as f64)])
            .ok()
            .filter(|h| !h.is_undefined() && !h.is_null())?;
        let id = Self::block_id_of(&handle)?;
        let kind = Reflect::get(&handle, &JsValue::from_str("name"))
            .ok()
            .and_then(|n| n.as_string())
            .unwrap_or_default();
        Some(BlockHandle { id, kind })
    }

    fn current_block_index(&self) -> usize {
        self.call("blocks", "getCurrentBlockIndex", &[])
            .ok()
            .and_then(|v| v.as_f64())
            .filter(|i| *i >= 0.0)
            .map_or(0, |i| i as usize)
    }

    fn block_style_class_name(&self) -> String {
        Reflect::get(&self.api, &JsValue::from_str("styles"))
            .and_then(|styles| Reflect::get(&styles, &JsValue::from_str("block")))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default()
    }

    fn block_count(&self) -> usize {
        self.call("blocks", "getBlocksCount", &[])
            .ok()
            .and_then(|v| v.as_f64())
            .map_or(0, |n| n as usize)
    }
}

fn js_error(err: JsValue) -> HostError {
    HostError::new(
        err.as_string()
            .unwrap_or_else(|| format!("{err:?}")),
    )
}

/// `BlockData` → plain JS object.
pub fn data_to_js(data: &BlockData) -> Result<JsValue, HostError> {
    let json = serde_json::to_string(data).map_err(|e| HostError::new(e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(js_error)
}

/// Plain JS object → `BlockData`. `undefined`, `null` and `{}` are empty.
pub fn data_from_js(value: &JsValue) -> Result<Option<BlockData>, HostError> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let json: String = js_sys::JSON::stringify(value).map_err(js_error)?.into();
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| HostError::new(e.to_string()))
}
