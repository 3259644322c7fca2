use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::Block;
use crate::Document;
use crate::MailsmithResult;
use crate::Settings;
use crate::config::TemplatesConfig;

/// The kind of value a template tag expects. Used by the editor to pick an
/// input and a sensible formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
	#[default]
	Text,
	Number,
	Date,
	Currency,
	Url,
	Email,
	Boolean,
	List,
}

/// A tag a template declares, as stored alongside the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
	pub key: String,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub description: String,
	#[serde(default, rename = "type")]
	pub tag_type: TagType,
	#[serde(default)]
	pub required: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub example: Option<Value>,
}

impl TagDefinition {
	pub fn new(key: impl Into<String>) -> Self {
		let key = key.into();
		Self {
			label: crate::tag_registry::humanize(&key),
			key,
			description: String::new(),
			tag_type: TagType::default(),
			required: false,
			default: None,
			example: None,
		}
	}

	#[must_use]
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
}

/// Settings stored with a template. Anything left out falls back to the
/// renderer's defaults, which come from `[templates]` in the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSettings {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_family: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content_background_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content_width: Option<u32>,
}

impl TemplateSettings {
	/// Fills every missing value from `defaults`.
	pub fn resolve(&self, defaults: &Settings) -> Settings {
		Settings {
			font_family: self
				.font_family
				.clone()
				.unwrap_or_else(|| defaults.font_family.clone()),
			background_color: self
				.background_color
				.clone()
				.unwrap_or_else(|| defaults.background_color.clone()),
			content_background_color: self
				.content_background_color
				.clone()
				.unwrap_or_else(|| defaults.content_background_color.clone()),
			content_width: self.content_width.unwrap_or(defaults.content_width),
		}
	}
}

impl From<Settings> for TemplateSettings {
	fn from(settings: Settings) -> Self {
		Self {
			font_family: Some(settings.font_family),
			background_color: Some(settings.background_color),
			content_background_color: Some(settings.content_background_color),
			content_width: Some(settings.content_width),
		}
	}
}

/// A stored email template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailTemplate {
	pub name: String,
	#[serde(default)]
	pub slug: String,
	#[serde(default)]
	pub subject: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub content: Document,
	#[serde(default)]
	pub settings: TemplateSettings,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preview_text: Option<String>,
	#[serde(default = "default_active")]
	pub is_active: bool,
	#[serde(default)]
	pub tags: Vec<TagDefinition>,
}

fn default_active() -> bool {
	true
}

impl MailTemplate {
	/// An empty, active template with a slug derived from `name`.
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			slug: slugify(&name),
			name,
			subject: String::new(),
			description: None,
			content: Document::default(),
			settings: TemplateSettings::default(),
			preview_text: None,
			is_active: true,
			tags: Vec::new(),
		}
	}

	/// Like [`MailTemplate::new`] but with every setting copied from
	/// configuration.
	pub fn with_config(name: impl Into<String>, config: &TemplatesConfig) -> Self {
		Self {
			settings: config.settings().into(),
			..Self::new(name)
		}
	}

	/// Reads a template from JSON. A missing slug is derived from the name.
	pub fn from_json(json: &str) -> MailsmithResult<Self> {
		let mut template: Self = serde_json::from_str(json)?;

		if template.slug.is_empty() {
			template.slug = slugify(&template.name);
		}

		Ok(template)
	}

	pub fn blocks(&self) -> &[Block] {
		&self.content.blocks
	}

	pub fn version(&self) -> &str {
		&self.content.version
	}

	/// Keys of every tag marked as required, in declaration order.
	pub fn required_tag_keys(&self) -> Vec<String> {
		self.tags
			.iter()
			.filter(|tag| tag.required)
			.map(|tag| tag.key.clone())
			.collect()
	}

	pub fn tag(&self, key: &str) -> Option<&TagDefinition> {
		self.tags.iter().find(|tag| tag.key == key)
	}
}

/// Lowercases `text` and collapses every run of other characters into `-`.
pub fn slugify(text: &str) -> String {
	let mut slug = String::with_capacity(text.len());
	let mut pending_dash = false;

	for ch in text.chars() {
		if ch.is_alphanumeric() {
			if pending_dash && !slug.is_empty() {
				slug.push('-');
			}
			slug.extend(ch.to_lowercase());
			pending_dash = false;
		} else {
			pending_dash = true;
		}
	}

	slug
}
