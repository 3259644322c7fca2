use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

/// Tags that survive sanitization. Everything else is stripped, leaving its
/// inner text behind.
pub const ALLOWED_TAGS: [&str; 18] = [
	"p", "br", "strong", "b", "em", "i", "u", "a", "span", "ul", "ol", "li", "h1", "h2", "h3", "h4",
	"h5", "h6",
];

const DANGEROUS_URL_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static SCRIPT_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());

static STYLE_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());

/// A tag with no closing `>` runs to the end of the input.
static TAG_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*)(>|$)").unwrap());

static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
		.unwrap()
});

/// Attributes kept on an allowed tag.
fn allowed_attributes(tag: &str) -> &'static [&'static str] {
	match tag {
		"a" => &["href", "target", "rel"],
		"span" => &["style"],
		_ => &[],
	}
}

/// Reduces user supplied rich text to a small allow-list of formatting
/// tags. Comments and `<script>` / `<style>` elements are removed along with
/// their contents. Event handler attributes never survive and link targets
/// with a dangerous scheme become `#`. An unterminated tag is dropped along
/// with everything after it.
pub fn sanitize_html(html: &str) -> String {
	let html = COMMENT_PATTERN.replace_all(html, "");
	let html = SCRIPT_PATTERN.replace_all(&html, "");
	let html = STYLE_PATTERN.replace_all(&html, "");

	TAG_PATTERN
		.replace_all(&html, |captures: &Captures<'_>| rebuild_tag(captures))
		.into_owned()
}

fn rebuild_tag(captures: &Captures<'_>) -> String {
	if captures.get(4).is_none_or(|end| end.as_str().is_empty()) {
		return String::new();
	}

	let closing = captures.get(1).is_some_and(|slash| !slash.as_str().is_empty());
	let name = captures
		.get(2)
		.map(|name| name.as_str().to_ascii_lowercase())
		.unwrap_or_default();

	if !ALLOWED_TAGS.contains(&name.as_str()) {
		return String::new();
	}

	if closing {
		return format!("</{name}>");
	}

	let raw_attributes = captures.get(3).map_or("", |attributes| attributes.as_str());
	let self_closing = raw_attributes.trim_end().ends_with('/');
	let allowed = allowed_attributes(&name);
	let mut tag = format!("<{name}");

	for attribute in ATTRIBUTE_PATTERN.captures_iter(raw_attributes) {
		let Some(attribute_name) = attribute.get(1).map(|m| m.as_str().to_ascii_lowercase()) else {
			continue;
		};

		if !allowed.contains(&attribute_name.as_str()) {
			continue;
		}

		let value = attribute
			.get(2)
			.or_else(|| attribute.get(3))
			.or_else(|| attribute.get(4))
			.map_or("", |m| m.as_str());
		let value = if attribute_name == "href" {
			sanitize_url(value)
		} else {
			value.to_string()
		};

		tag.push_str(&format!(" {attribute_name}=\"{}\"", value.replace('"', "&quot;")));
	}

	if self_closing {
		tag.push_str(" /");
	}

	tag.push('>');
	tag
}

/// Returns false for `javascript:`, `data:` and `vbscript:` URLs, ignoring
/// case and surrounding whitespace.
pub fn is_url_safe(url: &str) -> bool {
	let normalized = url.trim().to_ascii_lowercase();
	!DANGEROUS_URL_SCHEMES
		.iter()
		.any(|scheme| normalized.starts_with(scheme))
}

/// Replaces an unsafe URL with `#`.
pub fn sanitize_url(url: &str) -> String {
	if is_url_safe(url) {
		url.to_string()
	} else {
		tracing::debug!(url = %url, "replaced unsafe url");
		"#".to_string()
	}
}

/// Escapes text for use inside element content.
pub fn escape_text(text: &str) -> String {
	html_escape::encode_quoted_attribute(text).into_owned()
}
