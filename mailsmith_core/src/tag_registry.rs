use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Datelike;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::values::TagData;

/// Produces a global tag's value at resolve time.
pub type TagProducer = Arc<dyn Fn() -> Value + Send + Sync>;

/// The value of a global tag: either fixed, or computed each time the tag is
/// resolved.
#[derive(Clone)]
pub enum TagValue {
	Literal(Value),
	Producer(TagProducer),
}

impl TagValue {
	pub fn producer(produce: impl Fn() -> Value + Send + Sync + 'static) -> Self {
		Self::Producer(Arc::new(produce))
	}

	pub fn resolve(&self) -> Value {
		match self {
			Self::Literal(value) => value.clone(),
			Self::Producer(produce) => produce(),
		}
	}
}

impl fmt::Debug for TagValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
			Self::Producer(_) => f.write_str("Producer(..)"),
		}
	}
}

impl From<Value> for TagValue {
	fn from(value: Value) -> Self {
		Self::Literal(value)
	}
}

/// A tag that is available to every template without being passed in the
/// render data.
#[derive(Debug, Clone)]
pub struct GlobalTag {
	pub value: TagValue,
	/// Display label. Left empty to derive one from the key.
	pub label: String,
	pub description: String,
	pub example: Option<String>,
}

impl GlobalTag {
	pub fn new(value: impl Into<TagValue>) -> Self {
		Self {
			value: value.into(),
			label: String::new(),
			description: String::new(),
			example: None,
		}
	}

	#[must_use]
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	#[must_use]
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	#[must_use]
	pub fn example(mut self, example: impl Into<String>) -> Self {
		self.example = Some(example.into());
		self
	}
}

/// A global tag as presented to the editor's tag picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorTag {
	pub key: String,
	pub label: String,
	pub description: String,
	pub example: Value,
	pub global: bool,
}

/// Registry of global merge tags such as `current_year` or `app_name`.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
	tags: BTreeMap<String, GlobalTag>,
}

impl TagRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry containing the `current_year` producer.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register_tag(
			"current_year",
			GlobalTag::new(TagValue::producer(|| {
				Value::from(chrono::Local::now().year().to_string())
			}))
			.label("Current Year")
			.description("The current four digit year"),
		);
		registry
	}

	/// Registers or replaces a global tag.
	pub fn register_tag(&mut self, key: impl Into<String>, mut tag: GlobalTag) -> &mut Self {
		let key = key.into();

		if tag.label.is_empty() {
			tag.label = humanize(&key);
		}

		self.tags.insert(key, tag);
		self
	}

	pub fn register_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.register_tag(key, GlobalTag::new(TagValue::Literal(value.into())))
	}

	/// Registers tags from a loosely typed map. An entry that is an object
	/// with a `value` or `label` key is read as a full definition, anything
	/// else is the tag's value.
	pub fn register_tags(&mut self, tags: &Map<String, Value>) -> &mut Self {
		for (key, entry) in tags {
			let tag = match entry {
				Value::Object(definition)
					if definition.contains_key("value") || definition.contains_key("label") =>
				{
					let text = |field: &str| {
						definition
							.get(field)
							.and_then(Value::as_str)
							.map(String::from)
					};

					GlobalTag {
						value: TagValue::Literal(
							definition.get("value").cloned().unwrap_or(Value::Null),
						),
						label: text("label").unwrap_or_default(),
						description: text("description").unwrap_or_default(),
						example: text("example"),
					}
				}
				value => GlobalTag::new(value.clone()),
			};

			self.register_tag(key.as_str(), tag);
		}

		self
	}

	pub fn has_global_tag(&self, key: &str) -> bool {
		self.tags.contains_key(key)
	}

	pub fn global_tag(&self, key: &str) -> Option<&GlobalTag> {
		self.tags.get(key)
	}

	pub fn global_tags(&self) -> &BTreeMap<String, GlobalTag> {
		&self.tags
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.tags.keys().map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}

	/// Returns `data` with every global tag that `data` does not already
	/// define. Producers are evaluated on every call.
	pub fn resolve_global_tag_values(&self, data: &TagData) -> TagData {
		let mut resolved = data.clone();

		for (key, tag) in &self.tags {
			if !resolved.contains_key(key) {
				resolved.insert(key.clone(), tag.value.resolve());
			}
		}

		resolved
	}

	/// Describes every global tag for the editor. The example falls back to
	/// the tag's current value.
	pub fn tags_for_editor(&self) -> Vec<EditorTag> {
		self.tags
			.iter()
			.map(|(key, tag)| {
				EditorTag {
					key: key.clone(),
					label: tag.label.clone(),
					description: tag.description.clone(),
					example: tag
						.example
						.clone()
						.map_or_else(|| tag.value.resolve(), Value::String),
					global: true,
				}
			})
			.collect()
	}
}

/// Turns `order.shipping_address` into `Order Shipping Address`.
pub fn humanize(key: &str) -> String {
	key.replace(['.', '_', '-'], " ")
		.split(' ')
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}
