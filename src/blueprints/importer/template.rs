//! Tag resolution for blueprint documents.
//!
//! Blueprint documents are YAML and may use two custom tags:
//!
//! - `!Context key` or `!Context [key, default]` looks up a context value.
//! - `!Format [template, arg, ...]` substitutes each `%s` in `template` with
//!   the next argument (`%%` yields a literal `%`).
//!
//! Resolution converts the document into plain JSON in the same pass.

use super::EntryInvalidError;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

/// Resolve all tags in `value` against `context` and convert it to JSON.
pub fn resolve(value: &YamlValue, context: &Map<String, Value>) -> Result<Value, EntryInvalidError> {
    match value {
        YamlValue::Null => Ok(Value::Null),
        YamlValue::Bool(flag) => Ok(Value::Bool(*flag)),
        YamlValue::Number(number) => Ok(convert_number(number)),
        YamlValue::String(text) => Ok(Value::String(text.clone())),
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| resolve(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, item) in mapping {
                object.insert(mapping_key(key)?, resolve(item, context)?);
            }
            Ok(Value::Object(object))
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            resolve_tag(tag.trim_start_matches('!'), &tagged.value, context)
        }
    }
}

fn resolve_tag(
    tag: &str,
    argument: &YamlValue,
    context: &Map<String, Value>,
) -> Result<Value, EntryInvalidError> {
    match tag {
        "Context" => {
            let (key, default) = match argument {
                YamlValue::String(key) => (key.as_str(), None),
                YamlValue::Sequence(items) => match items.as_slice() {
                    [YamlValue::String(key)] => (key.as_str(), None),
                    [YamlValue::String(key), default] => {
                        (key.as_str(), Some(resolve(default, context)?))
                    }
                    _ => {
                        return Err(EntryInvalidError::new(
                            "!Context expects a key and an optional default",
                        ));
                    }
                },
                _ => return Err(EntryInvalidError::new("!Context expects a string key")),
            };

            context
                .get(key)
                .cloned()
                .or(default)
                .ok_or_else(|| EntryInvalidError::new(format!("Context key '{}' is not set", key)))
        }
        "Format" => {
            let YamlValue::Sequence(items) = argument else {
                return Err(EntryInvalidError::new("!Format expects a sequence"));
            };
            let Some((YamlValue::String(template), rest)) = items.split_first() else {
                return Err(EntryInvalidError::new(
                    "!Format expects a template string as its first item",
                ));
            };
            let args = rest
                .iter()
                .map(|item| resolve(item, context))
                .collect::<Result<Vec<_>, _>>()?;
            format_template(template, &args).map(Value::String)
        }
        other => Err(EntryInvalidError::new(format!("Unsupported tag '!{}'", other))),
    }
}

fn format_template(template: &str, args: &[Value]) -> Result<String, EntryInvalidError> {
    let mut output = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => {
                let arg = args.next().ok_or_else(|| {
                    EntryInvalidError::new(format!("Not enough arguments for '{}'", template))
                })?;
                match arg {
                    Value::String(text) => output.push_str(text),
                    other => output.push_str(&other.to_string()),
                }
            }
            Some('%') => output.push('%'),
            Some(other) => {
                output.push('%');
                output.push(other);
            }
            None => output.push('%'),
        }
    }

    Ok(output)
}

fn convert_number(number: &serde_yaml::Number) -> Value {
    if let Some(value) = number.as_i64() {
        Value::Number(value.into())
    } else if let Some(value) = number.as_u64() {
        Value::Number(value.into())
    } else {
        number
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn mapping_key(key: &YamlValue) -> Result<String, EntryInvalidError> {
    match key {
        YamlValue::String(text) => Ok(text.clone()),
        YamlValue::Number(number) => Ok(number.to_string()),
        YamlValue::Bool(flag) => Ok(flag.to_string()),
        _ => Err(EntryInvalidError::new("Mapping keys must be scalars")),
    }
}
