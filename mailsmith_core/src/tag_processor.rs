use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::FormatterRegistry;
use crate::MailTemplate;
use crate::MailsmithError;
use crate::MailsmithResult;
use crate::TagRegistry;
use crate::conditionals::process_conditionals;
use crate::tag_parser::Pipe;
use crate::tag_parser::extract_tags;
use crate::tag_parser::extract_variable_keys;
use crate::values::TagData;
use crate::values::is_blank;
use crate::values::resolve_path;
use crate::values::value_to_string;

static LOOSE_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}|]+)").unwrap());

/// Resolves conditionals and merge tags in rendered content.
#[derive(Debug, Clone, Default)]
pub struct TagProcessor {
	tags: TagRegistry,
	formatters: FormatterRegistry,
}

impl TagProcessor {
	pub fn new(tags: TagRegistry, formatters: FormatterRegistry) -> Self {
		Self { tags, formatters }
	}

	pub fn tag_registry(&self) -> &TagRegistry {
		&self.tags
	}

	pub fn tag_registry_mut(&mut self) -> &mut TagRegistry {
		&mut self.tags
	}

	pub fn formatter_registry(&self) -> &FormatterRegistry {
		&self.formatters
	}

	pub fn formatter_registry_mut(&mut self) -> &mut FormatterRegistry {
		&mut self.formatters
	}

	/// Merges global tags into `data`, resolves conditionals, then replaces
	/// every tag with its formatted value.
	pub fn process(&self, content: &str, data: &TagData) -> String {
		let data = self.tags.resolve_global_tag_values(data);
		let content = process_conditionals(content, &data);

		self.replace_tags(&content, &data)
	}

	fn replace_tags(&self, content: &str, data: &TagData) -> String {
		let tags = extract_tags(content);

		if tags.is_empty() {
			return content.to_string();
		}

		let mut output = String::with_capacity(content.len());
		let mut cursor = 0;

		for tag in &tags {
			output.push_str(&content[cursor..tag.start]);
			output.push_str(&self.apply_pipes(resolve_path(&tag.key, data), &tag.pipes));
			cursor = tag.end;
		}

		output.push_str(&content[cursor..]);
		output
	}

	/// Runs the pipe chain over a resolved value. A `default` pipe anywhere
	/// in the chain applies first and only once, and the last one wins when
	/// there are several. Unknown formatters leave the value unchanged.
	pub fn apply_pipes(&self, value: Option<&Value>, pipes: &[Pipe]) -> String {
		let mut current = value.cloned().unwrap_or(Value::Null);

		if let Some(default) = pipes.iter().rfind(|pipe| pipe.name == "default") {
			if is_blank(Some(&current)) {
				current = default
					.argument
					.clone()
					.map_or(Value::Null, Value::String);
			}
		}

		for pipe in pipes.iter().filter(|pipe| pipe.name != "default") {
			let Some(formatter) = self.formatters.get(&pipe.name) else {
				tracing::debug!(formatter = %pipe.name, "unknown formatter, passing value through");
				continue;
			};

			current = Value::String(formatter.format(&current, pipe.argument.as_deref()));
		}

		value_to_string(&current)
	}

	/// Unique tag keys used in `content`.
	pub fn extract_variables(&self, content: &str) -> Vec<String> {
		extract_variable_keys(content)
	}

	/// Fails with the template's slug and every required tag whose value is
	/// missing, `null` or the empty string.
	pub fn validate_required_tags(
		&self,
		template: &MailTemplate,
		data: &TagData,
	) -> MailsmithResult<()> {
		let required = template.required_tag_keys();

		if required.is_empty() {
			return Ok(());
		}

		let data = self.tags.resolve_global_tag_values(data);
		let missing: Vec<String> = required
			.into_iter()
			.filter(|key| is_blank(resolve_path(key, &data)))
			.collect();

		if missing.is_empty() {
			return Ok(());
		}

		tracing::debug!(template = %template.slug, missing = ?missing, "required tags missing");

		Err(MailsmithError::MissingRequiredTags {
			template: template.slug.clone(),
			missing,
		})
	}
}

/// Collects the distinct tag keys found in every string of a nested value,
/// in order of first appearance. Conditional markers and `{{else}}` are not
/// tags.
pub fn extract_tags_from_content(content: &Value) -> Vec<String> {
	let mut tags = Vec::new();
	collect_tags(content, &mut tags);
	tags
}

fn collect_tags(value: &Value, tags: &mut Vec<String>) {
	match value {
		Value::String(text) => {
			for captures in LOOSE_TAG_PATTERN.captures_iter(text) {
				let Some(raw) = captures.get(1) else {
					continue;
				};
				let tag = raw.as_str().trim();

				if tag.is_empty() || tag.starts_with('#') || tag.starts_with('/') || tag == "else" {
					continue;
				}

				if !tags.iter().any(|existing| existing == tag) {
					tags.push(tag.to_string());
				}
			}
		}
		Value::Array(items) => {
			for item in items {
				collect_tags(item, tags);
			}
		}
		Value::Object(map) => {
			for item in map.values() {
				collect_tags(item, tags);
			}
		}
		Value::Null | Value::Bool(_) | Value::Number(_) => {}
	}
}
