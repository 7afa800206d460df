use serde_json::Value;

/// Ordered `application/x-www-form-urlencoded` body.
///
/// Keys may repeat; order is preserved on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormBody {
    pairs: Vec<(String, String)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Appends `value` under `prefix`, flattening nested data with brackets:
    /// objects as `prefix[key]`, scalar array items as `prefix[]`, nested array
    /// items as `prefix[index]`. Empty arrays and objects produce nothing.
    pub fn push_value(&mut self, prefix: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if prefix.ends_with("[]") {
                        self.push(prefix, scalar_to_string(item));
                    } else if item.is_array() || item.is_object() {
                        self.push_value(&format!("{prefix}[{index}]"), item);
                    } else {
                        self.push_value(&format!("{prefix}[]"), item);
                    }
                }
            }
            Value::Object(entries) => {
                for (key, item) in entries {
                    self.push_value(&format!("{prefix}[{key}]"), item);
                }
            }
            scalar => self.push(prefix, scalar_to_string(scalar)),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Last value pushed under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            // `Display` for f64 drops a trailing `.0`.
            (None, None, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        nested => nested.to_string(),
    }
}
