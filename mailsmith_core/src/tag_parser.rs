use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

static TAG_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{([a-zA-Z0-9_.]+)(\|[^}]+)?\}\}").unwrap());

static CONDITIONAL_OPEN_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\{\{#(if|unless)\s+([a-zA-Z0-9_.]+)\}\}").unwrap());

const ELSE_MARKER: &str = "{{else}}";

/// A single formatter application inside a tag, e.g. `date:Y/m/d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipe {
	/// Formatter name with surrounding whitespace removed.
	pub name: String,
	/// Everything after the first `:`. Kept verbatim so that arguments such
	/// as `, ` survive.
	pub argument: Option<String>,
}

impl Pipe {
	pub fn new(name: impl Into<String>, argument: Option<&str>) -> Self {
		Self {
			name: name.into(),
			argument: argument.map(String::from),
		}
	}
}

/// A `{{path|pipe|pipe:arg}}` occurrence within some content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
	/// The full matched text including braces.
	pub full: String,
	/// Dot-separated path into the data map.
	pub key: String,
	pub pipes: Vec<Pipe>,
	/// Byte offset of the opening `{{`.
	pub start: usize,
	/// Byte offset just past the closing `}}`.
	pub end: usize,
}

impl Tag {
	pub fn has_pipe(&self, name: &str) -> bool {
		self.pipes.iter().any(|pipe| pipe.name == name)
	}

	/// Returns the argument of the first `default` pipe, if there is one.
	pub fn default_pipe(&self) -> Option<&Pipe> {
		self.pipes.iter().find(|pipe| pipe.name == "default")
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalType {
	If,
	Unless,
}

impl ConditionalType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::If => "if",
			Self::Unless => "unless",
		}
	}
}

/// A `{{#if path}}...{{else}}...{{/if}}` or `{{#unless path}}...{{/unless}}`
/// region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
	pub full: String,
	pub kind: ConditionalType,
	pub condition: String,
	/// Content shown when the condition holds (or does not hold, for
	/// `unless`).
	pub truthy: String,
	pub falsy: Option<String>,
	pub start: usize,
	pub end: usize,
}

/// Finds every tag in `content` in order of appearance.
pub fn extract_tags(content: &str) -> Vec<Tag> {
	TAG_PATTERN
		.captures_iter(content)
		.filter_map(|captures| {
			let whole = captures.get(0)?;
			let key = captures.get(1)?.as_str().to_string();
			let pipes = captures
				.get(2)
				.map(|raw| split_pipes(raw.as_str()))
				.unwrap_or_default();

			Some(Tag {
				full: whole.as_str().to_string(),
				key,
				pipes,
				start: whole.start(),
				end: whole.end(),
			})
		})
		.collect()
}

/// Unique tag keys in order of first appearance.
pub fn extract_variable_keys(content: &str) -> Vec<String> {
	let mut keys: Vec<String> = Vec::new();

	for tag in extract_tags(content) {
		if !keys.contains(&tag.key) {
			keys.push(tag.key);
		}
	}

	keys
}

pub fn has_tags(content: &str) -> bool {
	TAG_PATTERN.is_match(content)
}

pub fn has_conditionals(content: &str) -> bool {
	!extract_conditionals(content).is_empty()
}

/// Finds every conditional region in `content`.
///
/// A region runs from an opening `{{#if x}}` / `{{#unless x}}` to the first
/// closing marker of the same type after it. Regions do not nest: an inner
/// opening of the same type ends at the outer region's closing marker. An
/// opening without a matching close is left alone.
pub fn extract_conditionals(content: &str) -> Vec<Conditional> {
	let mut conditionals = Vec::new();
	let mut cursor = 0;

	while cursor < content.len() {
		let Some(captures) = CONDITIONAL_OPEN_PATTERN.captures_at(content, cursor) else {
			break;
		};
		let (Some(opening), Some(kind), Some(condition)) =
			(captures.get(0), captures.get(1), captures.get(2))
		else {
			break;
		};

		let kind = if kind.as_str() == "if" {
			ConditionalType::If
		} else {
			ConditionalType::Unless
		};
		let closing = format!("{{{{/{}}}}}", kind.as_str());
		let body_start = opening.end();

		let Some(relative_close) = content[body_start..].find(&closing) else {
			// `{{` is ascii so the next byte is always a char boundary.
			cursor = opening.start() + 1;
			continue;
		};

		let body_end = body_start + relative_close;
		let end = body_end + closing.len();
		let body = &content[body_start..body_end];
		let (truthy, falsy) = match body.find(ELSE_MARKER) {
			Some(index) => (&body[..index], Some(&body[index + ELSE_MARKER.len()..])),
			None => (body, None),
		};

		conditionals.push(Conditional {
			full: content[opening.start()..end].to_string(),
			kind,
			condition: condition.as_str().to_string(),
			truthy: truthy.to_string(),
			falsy: falsy.map(String::from),
			start: opening.start(),
			end,
		});

		cursor = end;
	}

	conditionals
}

/// Parses a single tag string such as `{{user.name|uppercase}}`.
pub fn parse_tag(tag: &str) -> Option<(String, Vec<Pipe>)> {
	let inner = tag.trim().trim_start_matches('{').trim_end_matches('}');
	let (key, rest) = match inner.split_once('|') {
		Some((key, rest)) => (key, Some(rest)),
		None => (inner, None),
	};
	let key = key.trim();

	if key.is_empty() {
		return None;
	}

	let pipes = rest.map(split_pipes).unwrap_or_default();
	Some((key.to_string(), pipes))
}

/// Splits `name:argument` at the first colon.
pub fn parse_pipe(pipe: &str) -> Pipe {
	match pipe.split_once(':') {
		Some((name, argument)) => Pipe::new(name.trim(), Some(argument)),
		None => Pipe::new(pipe.trim(), None),
	}
}

/// Splits a raw `|a|b:c` pipe section into its pipes. Empty segments are
/// skipped.
pub fn split_pipes(raw: &str) -> Vec<Pipe> {
	raw.split('|')
		.filter(|segment| !segment.is_empty())
		.map(parse_pipe)
		.collect()
}
