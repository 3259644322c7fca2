use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::TagRegistry;
use crate::values::TagData;
use crate::values::resolve_path;
use crate::values::value_to_string;

static PLAIN_TAG_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{([a-zA-Z0-9_.]+)\}\}").unwrap());

/// Plain `{{path}}` substitution for short strings such as subject lines.
/// Pipes and conditionals are not supported and a tag that cannot be
/// resolved is left in place.
#[derive(Debug, Clone, Default)]
pub struct MergeTagProcessor {
	tags: TagRegistry,
}

impl MergeTagProcessor {
	pub fn new(tags: TagRegistry) -> Self {
		Self { tags }
	}

	pub fn process(&self, content: &str, data: &TagData) -> String {
		let data = self.tags.resolve_global_tag_values(data);

		PLAIN_TAG_PATTERN
			.replace_all(content, |captures: &Captures<'_>| {
				let path = captures.get(1).map_or("", |path| path.as_str());

				match resolve_path(path, &data) {
					Some(value) => value_to_string(value),
					None => format!("{{{{{path}}}}}"),
				}
			})
			.into_owned()
	}

	/// Unique plain tag keys in order of first appearance.
	pub fn extract_variables(&self, content: &str) -> Vec<String> {
		let mut keys: Vec<String> = Vec::new();

		for captures in PLAIN_TAG_PATTERN.captures_iter(content) {
			if let Some(path) = captures.get(1).map(|path| path.as_str().to_string()) {
				if !keys.contains(&path) {
					keys.push(path);
				}
			}
		}

		keys
	}
}
