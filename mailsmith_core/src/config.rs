use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::MailsmithError;
use crate::MailsmithResult;
use crate::Settings;
use crate::TagRegistry;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"mailsmith.toml",
	".mailsmith.toml",
	".config/mailsmith.toml",
];

/// Configuration loaded from `mailsmith.toml`.
///
/// ```toml
/// [templates]
/// font_family = "Helvetica, sans-serif"
/// content_width = 640
///
/// [merge_tags]
/// app_name = "Acme"
/// support_email = { value = "help@acme.test", label = "Support Email" }
///
/// [validation]
/// required_tags = true
///
/// [compiler]
/// command = "mjml"
/// args = ["-i", "-s"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailsmithConfig {
	#[serde(default)]
	pub templates: TemplatesConfig,
	/// Global merge tags. A value is either the tag's literal value or a
	/// table with `value`, `label`, `description` and `example`.
	#[serde(default)]
	pub merge_tags: Map<String, Value>,
	#[serde(default)]
	pub validation: ValidationConfig,
	#[serde(default)]
	pub compiler: CompilerConfig,
}

/// Fallback settings for templates that do not define their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
	pub font_family: String,
	pub background_color: String,
	pub content_background_color: String,
	pub content_width: u32,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		let settings = Settings::default();
		Self {
			font_family: settings.font_family,
			background_color: settings.background_color,
			content_background_color: settings.content_background_color,
			content_width: settings.content_width,
		}
	}
}

impl TemplatesConfig {
	pub fn settings(&self) -> Settings {
		Settings {
			font_family: self.font_family.clone(),
			background_color: self.background_color.clone(),
			content_background_color: self.content_background_color.clone(),
			content_width: self.content_width,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
	/// Check required tags before a message is prepared.
	pub required_tags: bool,
}

impl Default for ValidationConfig {
	fn default() -> Self {
		Self {
			required_tags: true,
		}
	}
}

/// The external process that turns MJML into HTML. It receives the markup on
/// stdin and writes HTML to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	pub command: String,
	pub args: Vec<String>,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			command: "mjml".to_string(),
			args: vec!["-i".to_string(), "-s".to_string()],
		}
	}
}

impl MailsmithConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> MailsmithResult<Option<MailsmithConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> MailsmithResult<MailsmithConfig> {
		toml::from_str(content).map_err(|e| MailsmithError::ConfigParse(e.to_string()))
	}

	/// A tag registry with the built-in globals plus every configured merge
	/// tag. Configured tags replace built-ins with the same key.
	pub fn tag_registry(&self) -> TagRegistry {
		let mut registry = TagRegistry::with_defaults();
		registry.register_tags(&self.merge_tags);
		registry
	}
}
