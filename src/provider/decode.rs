use serde_json::{Map, Number, Value};

use super::diagnostics::{AttributePath, Diagnostics};
use super::schema::{Attribute, AttributeKind, Attributes};

/// Walks a Terraform configuration object along its schema and returns the
/// equivalent Kubernetes object, keyed by wire names. Null attributes are
/// dropped. Problems are reported to `diags`; `None` means the object could
/// not be decoded.
pub fn decode_object(
    attributes: &Attributes,
    config: &Value,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<Map<String, Value>> {
    let config = match config {
        Value::Object(config) => config,
        other => {
            diags.error(
                path,
                "Incorrect attribute value type",
                format!("expected an object, got {}", type_name(other)),
            );
            return None;
        }
    };

    let errors_before = diags.error_count();
    for name in config.keys() {
        if !attributes.contains_key(name) {
            diags.error(
                &path.attribute(name),
                "Unsupported argument",
                format!("an argument named {name:?} is not expected here"),
            );
        }
    }

    let mut out = Map::new();
    for (name, attribute) in attributes {
        if attribute.is_computed() {
            continue;
        }
        let attribute_path = path.attribute(name);
        match config.get(name).filter(|v| !v.is_null()) {
            None if attribute.is_required() => diags.error(
                &attribute_path,
                "Missing required argument",
                format!("the argument {name:?} is required, but no definition was found"),
            ),
            None => {}
            Some(value) => {
                if let Some(decoded) = decode_value(attribute, value, &attribute_path, diags) {
                    out.insert(attribute.wire_name.clone(), decoded);
                }
            }
        }
    }

    if diags.error_count() > errors_before {
        None
    } else {
        Some(out)
    }
}

pub fn decode_value(
    attribute: &Attribute,
    value: &Value,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<Value> {
    let decoded = match &attribute.kind {
        AttributeKind::String => value.as_str().map(|s| Value::String(s.to_string())),
        AttributeKind::IntOrString => match value {
            // only canonical integers, so "0080" keeps its text
            Value::String(s) => Some(match s.parse::<i64>() {
                Ok(n) if n.to_string() == *s => Value::Number(n.into()),
                _ => Value::String(s.clone()),
            }),
            Value::Number(n) if n.is_i64() => Some(Value::Number(n.clone())),
            _ => None,
        },
        AttributeKind::Int64 => as_integer(value).map(|n| Value::Number(n.into())),
        AttributeKind::Float64 => value
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number),
        AttributeKind::Bool => value.as_bool().map(Value::Bool),
        AttributeKind::Dynamic => Some(value.clone()),
        AttributeKind::List(element) => {
            let items = match value.as_array() {
                Some(items) => items,
                None => return mismatch(attribute, value, path, diags),
            };
            let mut out = Vec::with_capacity(items.len());
            let mut failed = false;
            for (index, item) in items.iter().enumerate() {
                match decode_value(element, item, &path.index(index), diags) {
                    Some(decoded) => out.push(decoded),
                    None => failed = true,
                }
            }
            if failed {
                return None;
            }
            Some(Value::Array(out))
        }
        AttributeKind::Map(element) => {
            let entries = match value.as_object() {
                Some(entries) => entries,
                None => return mismatch(attribute, value, path, diags),
            };
            let mut out = Map::new();
            let mut failed = false;
            for (key, entry) in entries {
                match decode_value(element, entry, &path.key(key), diags) {
                    Some(decoded) => {
                        out.insert(key.clone(), decoded);
                    }
                    None => failed = true,
                }
            }
            if failed {
                return None;
            }
            Some(Value::Object(out))
        }
        AttributeKind::Object(attributes) => {
            return decode_object(attributes, value, path, diags).map(|decoded| {
                run_validators(attribute, value, path, diags);
                Value::Object(decoded)
            });
        }
    };

    match decoded {
        Some(decoded) => {
            run_validators(attribute, value, path, diags);
            Some(decoded)
        }
        None if value.is_null() => {
            diags.error(path, "Null value", "null values are not allowed in collections");
            None
        }
        None => mismatch(attribute, value, path, diags),
    }
}

fn run_validators(attribute: &Attribute, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    for validator in &attribute.validators {
        validator.validate(path, value, diags);
    }
}

fn mismatch(
    attribute: &Attribute,
    value: &Value,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<Value> {
    diags.error(
        path,
        "Incorrect attribute value type",
        format!(
            "expected {}, got {}",
            attribute.kind.label().to_lowercase(),
            type_name(value)
        ),
    );
    None
}

/// Terraform numbers arrive as JSON numbers and may carry a zero fraction.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::validators::Validator;
    use crate::provider::schema::Requirement;
    use serde_json::json;

    fn probe_schema() -> Attributes {
        let mut http_get = Attributes::new();
        http_get.insert(
            "port".to_string(),
            Attribute::new("port", AttributeKind::IntOrString, Requirement::Required),
        );
        http_get.insert(
            "path".to_string(),
            Attribute::new("path", AttributeKind::String, Requirement::Optional),
        );
        let mut probe = Attributes::new();
        probe.insert(
            "http_get".to_string(),
            Attribute::new("httpGet", AttributeKind::Object(http_get), Requirement::Optional),
        );
        probe.insert(
            "period_seconds".to_string(),
            Attribute::new("periodSeconds", AttributeKind::Int64, Requirement::Optional),
        );
        probe.insert(
            "exec_command".to_string(),
            Attribute::new(
                "command",
                AttributeKind::List(Box::new(Attribute::new(
                    "",
                    AttributeKind::String,
                    Requirement::Optional,
                ))),
                Requirement::Optional,
            ),
        );
        probe.insert(
            "network_mode".to_string(),
            Attribute::new("networkMode", AttributeKind::String, Requirement::Optional)
                .with_validator(Validator::OneOf(vec!["HostNetwork".to_string()])),
        );
        probe
    }

    #[test]
    fn renames_to_wire_names_and_drops_nulls() {
        let mut diags = Diagnostics::new();
        let config = json!({
            "http_get": {"port": "8080", "path": null},
            "period_seconds": 10.0,
            "exec_command": ["cat", "/tmp/ready"],
            "network_mode": null
        });
        let decoded = decode_object(&probe_schema(), &config, &AttributePath::root(), &mut diags).unwrap();
        assert!(diags.is_empty(), "{diags}");
        assert_eq!(
            Value::Object(decoded),
            json!({
                "httpGet": {"port": 8080},
                "periodSeconds": 10,
                "command": ["cat", "/tmp/ready"]
            })
        );
    }

    #[test]
    fn named_ports_stay_strings() {
        let mut diags = Diagnostics::new();
        let config = json!({"http_get": {"port": "http"}});
        let decoded = decode_object(&probe_schema(), &config, &AttributePath::root(), &mut diags).unwrap();
        assert_eq!(decoded["httpGet"]["port"], json!("http"));
    }

    #[test]
    fn only_canonical_integers_are_coerced() {
        let port = |config: Value| {
            let mut diags = Diagnostics::new();
            let decoded =
                decode_object(&probe_schema(), &json!({ "http_get": { "port": config } }), &AttributePath::root(), &mut diags)
                    .unwrap();
            decoded["httpGet"]["port"].clone()
        };
        assert_eq!(port(json!("8080")), json!(8080));
        assert_eq!(port(json!(8080)), json!(8080));
        assert_eq!(port(json!("-1")), json!(-1));
        assert_eq!(port(json!("0080")), json!("0080"));
        assert_eq!(port(json!("+80")), json!("+80"));
    }

    #[test]
    fn reports_every_problem_with_its_path() {
        let mut diags = Diagnostics::new();
        let config = json!({
            "http_get": {"path": 3},
            "period_seconds": "ten",
            "exec_command": ["ok", 1],
            "network_mode": "Bridge",
            "unexpected": true
        });
        assert!(decode_object(&probe_schema(), &config, &AttributePath::root(), &mut diags).is_none());
        let rendered: Vec<String> = diags
            .iter()
            .map(|d| format!("{} {}", d.attribute.as_ref().unwrap(), d.summary))
            .collect();
        assert!(rendered.contains(&"unexpected Unsupported argument".to_string()));
        assert!(rendered.contains(&"http_get.port Missing required argument".to_string()));
        assert!(rendered.contains(&"http_get.path Incorrect attribute value type".to_string()));
        assert!(rendered.contains(&"period_seconds Incorrect attribute value type".to_string()));
        assert!(rendered.contains(&"exec_command[1] Incorrect attribute value type".to_string()));
        assert!(rendered.contains(&"network_mode Invalid attribute value".to_string()));
        assert_eq!(diags.len(), 6);
    }

    #[test]
    fn computed_attributes_are_ignored() {
        let mut attributes = probe_schema();
        attributes.insert(
            "id".to_string(),
            Attribute::new("id", AttributeKind::Int64, Requirement::Computed),
        );
        let mut diags = Diagnostics::new();
        let decoded =
            decode_object(&attributes, &json!({"id": 42}), &AttributePath::root(), &mut diags).unwrap();
        assert!(diags.is_empty());
        assert!(decoded.is_empty());
    }
}
