use float_cmp::approx_eq;
use serde_json::Map;
use serde_json::Value;

/// Data supplied to the tag engine. Keys are top-level tag names, nested
/// values are reached through dot paths.
pub type TagData = Map<String, Value>;

/// Walks a dot path such as `order.items.0.name` through nested objects and
/// arrays. Numeric segments index into arrays.
pub fn resolve_path<'a>(path: &str, data: &'a TagData) -> Option<&'a Value> {
	let mut segments = path.split('.');
	let first = segments.next()?;
	let mut current = data.get(first)?;

	for segment in segments {
		current = match current {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}

	Some(current)
}

/// Converts a resolved value into the text that replaces a tag.
pub fn value_to_string(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(text) => text.clone(),
		Value::Bool(flag) => flag.to_string(),
		Value::Number(number) => number.to_string(),
		Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
	}
}

/// A value counts as empty when it is missing, `null` or the empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => true,
		Some(Value::String(text)) => text.is_empty(),
		Some(_) => false,
	}
}

/// Truthiness used by `{{#if}}` and `{{#unless}}`.
///
/// Strings are falsy when empty, `"0"` or `"false"` in any letter case.
/// Numbers are falsy when zero. Arrays and objects are falsy when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => false,
		Some(Value::Bool(flag)) => *flag,
		Some(Value::Number(number)) => {
			!approx_eq!(f64, number.as_f64().unwrap_or_default(), 0.0, ulps = 2)
		}
		Some(Value::String(text)) => {
			!(text.is_empty() || text == "0" || text.eq_ignore_ascii_case("false"))
		}
		Some(Value::Array(items)) => !items.is_empty(),
		Some(Value::Object(map)) => !map.is_empty(),
	}
}

/// Reads a numeric value, accepting numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse::<f64>().ok().filter(|number| number.is_finite()),
		_ => None,
	}
}
