//! Page-wide settings store.
//!
//! One JSON object shared by every fragment on the page. It is passed
//! explicitly to whoever needs it; only the `settings` command writes to it.
use core_types::AssetKind;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Wraps `value`; anything but an object yields an empty store.
    pub fn new(value: Value) -> Self {
        let root = if value.is_object() {
            value
        } else {
            Value::Object(Map::new())
        };
        Self { root }
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(source)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// JSON-pointer lookup, e.g. `/ajaxPageState/theme`.
    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    fn get_str(&self, pointer: &str) -> Option<&str> {
        self.get(pointer).and_then(Value::as_str)
    }

    pub fn theme(&self) -> Option<&str> {
        self.get_str("/ajaxPageState/theme")
    }

    pub fn theme_token(&self) -> Option<&str> {
        self.get_str("/ajaxPageState/theme_token")
    }

    /// Keys of the assets of `kind` the page already has, in store order.
    pub fn loaded_assets(&self, kind: AssetKind) -> Vec<&str> {
        let pointer = format!("/ajaxPageState/{}", kind.key());
        match self.get(&pointer) {
            Some(Value::Object(assets)) => assets.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn current_path(&self) -> Option<&str> {
        self.get_str("/lazy_views/current_path")
    }

    pub fn view_arguments(&self) -> Option<&Value> {
        self.get("/lazy_views/view_arguments")
    }

    /// Deep-merges an object patch into the store; other patches are ignored.
    pub fn merge_deep(&mut self, patch: &Value) {
        if !patch.is_object() {
            log::warn!(target: "lazy_views.settings", "ignoring non-object settings patch");
            return;
        }
        deep_merge(&mut self.root, patch);
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

/// Recursive merge of `patch` into `target`.
///
/// Objects merge key by key and arrays index by index, so existing entries
/// the patch does not mention survive. A container in the patch replaces a
/// target value of a different shape; scalars (including `null`) overwrite.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(existing) = target {
                for (key, value) in entries {
                    deep_merge(existing.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        Value::Array(items) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(existing) = target {
                for (index, item) in items.iter().enumerate() {
                    match existing.get_mut(index) {
                        Some(slot) => deep_merge(slot, item),
                        None => {
                            let mut slot = Value::Null;
                            deep_merge(&mut slot, item);
                            existing.push(slot);
                        }
                    }
                }
            }
        }
        scalar => *target = scalar.clone(),
    }
}
