use std::collections::BTreeMap;

use core_types::{AssetKind, CacheId};
use net::FormBody;
use serde_json::Value;

use crate::settings::Settings;

/// Everything one batched POST carries. Missing settings read as empty strings.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchRequest {
    pub ids: Vec<CacheId>,
    pub query: BTreeMap<String, String>,
    pub theme: String,
    pub theme_token: String,
    pub current_path: String,
    pub view_arguments: Value,
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl BatchRequest {
    /// `None` for an empty batch; an empty batch is never sent.
    pub fn new(
        ids: Vec<CacheId>,
        query: BTreeMap<String, String>,
        settings: &Settings,
    ) -> Option<Self> {
        if ids.is_empty() {
            return None;
        }
        let owned = |kind: AssetKind| -> Vec<String> {
            settings
                .loaded_assets(kind)
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        Some(Self {
            ids,
            query,
            theme: settings.theme().unwrap_or_default().to_string(),
            theme_token: settings.theme_token().unwrap_or_default().to_string(),
            current_path: settings.current_path().unwrap_or_default().to_string(),
            view_arguments: settings.view_arguments().cloned().unwrap_or(Value::Null),
            css: owned(AssetKind::Css),
            js: owned(AssetKind::Js),
        })
    }

    pub fn to_form(&self) -> FormBody {
        let mut form = FormBody::new();
        for id in &self.ids {
            form.push("lazy_views_ids[]", id.as_str());
        }
        for (key, value) in &self.query {
            form.push(format!("lazy_views_get[{key}]"), value.as_str());
        }
        form.push("ajax_page_state[theme]", self.theme.as_str());
        form.push("ajax_page_state[theme_token]", self.theme_token.as_str());
        form.push("lazy_views_current_path", self.current_path.as_str());
        form.push_value("lazy_views_arguments", &self.view_arguments);
        for (kind, keys) in [(AssetKind::Css, &self.css), (AssetKind::Js, &self.js)] {
            for key in keys {
                form.push(format!("ajax_page_state[{}][{key}]", kind.key()), "1");
            }
        }
        form
    }
}
