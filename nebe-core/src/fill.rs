//! Demo inputs derived from `schema.json`, injected into previews as
//! `window.INPUTS` so visuals render with representative content.

use serde_json::{Map, Value};
use tracing::{debug, warn};

const MAX_ITEMS: i64 = 1000;

/// Computes demo inputs for every slot of `schema`.
pub fn demo_inputs(schema: &Value) -> Map<String, Value> {
    let mut inputs = Map::new();
    let Some(slots) = schema.as_object() else {
        warn!("Schema is not an object, no demo inputs");
        return inputs;
    };

    for (key, slot) in slots {
        let value = if slot.get("type").and_then(Value::as_str) == Some("array") {
            Value::Array(array_items(slot))
        } else {
            match slot.get("value") {
                Some(Value::Array(values)) => values.first().cloned().unwrap_or(Value::Null),
                Some(value) => value.clone(),
                None => Value::Null,
            }
        };
        inputs.insert(key.clone(), value);
    }

    debug!(slots = inputs.len(), "Computed demo inputs");
    inputs
}

fn int_field(slot: &Value, key: &str) -> Option<i64> {
    match slot.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn array_items(slot: &Value) -> Vec<Value> {
    let sub_schema = slot.get("schema").and_then(Value::as_object);

    // The first sub slot with a list of values dictates the item count.
    let listed = sub_schema.and_then(|s| {
        s.values()
            .find_map(|sub| sub.get("value").and_then(Value::as_array).map(Vec::len))
    });

    let (min, max) = match listed {
        Some(len) => (1, len as i64),
        None => {
            let min = int_field(slot, "min").map(|v| v.clamp(0, MAX_ITEMS));
            let max = int_field(slot, "max").map(|v| v.clamp(0, MAX_ITEMS));
            match (min, max) {
                (Some(min), Some(max)) => (min, max.max(min)),
                _ => (0, 0),
            }
        }
    };

    let item = |i: usize| -> Value {
        let mut item = Map::new();
        if let Some(sub_schema) = sub_schema {
            for (key, sub) in sub_schema {
                let value = match sub.get("value") {
                    Some(Value::Array(values)) if !values.is_empty() => {
                        values[i % values.len()].clone()
                    }
                    Some(Value::Array(_)) => Value::Null,
                    Some(value) => value.clone(),
                    None => Value::Null,
                };
                item.insert(key.clone(), value);
            }
        }
        Value::Object(item)
    };

    if min > 0 && max > 0 {
        (min..=max).map(|i| item((i - 1) as usize)).collect()
    } else {
        let count = int_field(slot, "count")
            .map(|v| v.clamp(0, MAX_ITEMS))
            .unwrap_or(0);
        (0..count).map(|i| item(i as usize)).collect()
    }
}

/// Script block defining the preview globals.
pub fn fill_script(inputs: &Map<String, Value>, version: &str) -> String {
    let json = Value::Object(inputs.clone()).to_string();
    // Embedded inside a JS string literal and an HTML script element.
    let escaped = json
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace("</", "<\\/");

    format!(
        r#"<script>
		window.EXIT = function (url) {{
			url = url ? url : window.clickTag;
			console.log(
				`%c ↪️ Called EXIT with value: ${{url}} %c`,
				'background: #ff8c00; padding: 1px; border-radius: 3px; color: #fff',
				'background: transparent'
			);
		}};

		window.DDM_CLI_VERSION = '{version}';

		window.INPUTS = JSON.parse('{escaped}');
	</script>"#
    )
}
