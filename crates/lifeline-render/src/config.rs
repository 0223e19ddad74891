use serde_json::{Value, json};

/// Renderer configuration: a JSON object addressed with dotted paths (`plantuml.indent`).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig(Value);

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_value(json!({
            "title": null,
            "plantuml": {
                "indent": 4,
                "activation": true,
                "autonumber": false,
                "hideFootbox": false,
            }
        }))
    }
}

impl RenderConfig {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    fn get(&self, dotted_path: &str) -> Option<&Value> {
        dotted_path
            .split('.')
            .try_fold(&self.0, |node, key| node.as_object()?.get(key))
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        self.get(dotted_path)?.as_u64()
    }

    /// Stores `value` at `dotted_path`; non-object nodes on the way are replaced by objects.
    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        let path: Vec<&str> = dotted_path.split('.').collect();
        set_path(&mut self.0, &path, value);
    }

    /// Overlays `patch`: objects merge key by key, anything else replaces the current value.
    pub fn deep_merge(&mut self, patch: &Value) {
        overlay(&mut self.0, patch);
    }
}

fn set_path(node: &mut Value, path: &[&str], value: Value) {
    let Some((key, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = json!({});
    }
    if let Value::Object(map) = node {
        set_path(map.entry(*key).or_insert(Value::Null), rest, value);
    }
}

fn overlay(base: &mut Value, patch: &Value) {
    if let (Value::Object(map), Value::Object(changes)) = (&mut *base, patch) {
        for (key, change) in changes {
            overlay(map.entry(key.as_str()).or_insert(Value::Null), change);
        }
        return;
    }
    *base = patch.clone();
}
