use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::Attributes;
use super::BlockRenderer;
use super::RenderContext;
use super::merge_with_defaults;
use super::prop_flag;
use super::prop_non_empty;
use super::prop_number;
use super::prop_padding;
use super::prop_text;
use super::px;
use crate::BlockKind;
use crate::Props;
use crate::sanitizer::sanitize_url;
use crate::values::is_truthy;

static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([^&\n?#]+)",
	)
	.unwrap()
});

static VIMEO_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"vimeo\.com/(\d+)").unwrap());

static PIXEL_WIDTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+px$").unwrap());

fn border_radius(props: &Props) -> Option<String> {
	prop_number(props, "borderRadius")
		.filter(|radius| *radius > 0.0)
		.map(px)
}

/// An image, optionally linked.
pub struct ImageRenderer;

impl ImageRenderer {
	/// Percentage widths are left to the column. Bare numbers become pixels.
	pub fn mjml_width(width: &str) -> Option<String> {
		if width.ends_with('%') {
			return None;
		}

		if width.parse::<f64>().is_ok() {
			return Some(format!("{width}px"));
		}

		PIXEL_WIDTH_PATTERN
			.is_match(width)
			.then(|| width.to_string())
	}
}

impl BlockRenderer for ImageRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Image
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let Some(src) = prop_non_empty(&props, "src") else {
			return String::new();
		};
		let href = prop_non_empty(&props, "href").map(|href| sanitize_url(&href));
		let width = prop_text(&props, "width").unwrap_or_else(|| "100%".into());
		let fluid = prop_flag(&props, "fluidOnMobile").unwrap_or(true);

		let attributes = Attributes::new()
			.with("src", sanitize_url(&src))
			.with("alt", prop_text(&props, "alt").unwrap_or_default())
			.with_opt("href", href)
			.with_opt("width", Self::mjml_width(&width))
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "center".into()))
			.with_opt("fluid-on-mobile", fluid.then_some("true"))
			.with_opt("border-radius", border_radius(&props))
			.with("padding", prop_padding(&props, "padding"));

		format!("<mj-image{attributes} />")
	}
}

/// A linked video thumbnail. Without an explicit thumbnail one is derived
/// from YouTube and Vimeo URLs.
pub struct VideoRenderer;

impl VideoRenderer {
	pub fn thumbnail_for(video_url: &str) -> Option<String> {
		if let Some(id) = YOUTUBE_PATTERN.captures(video_url).and_then(|captures| captures.get(1)) {
			return Some(format!(
				"https://img.youtube.com/vi/{}/maxresdefault.jpg",
				id.as_str()
			));
		}

		VIMEO_PATTERN
			.captures(video_url)
			.and_then(|captures| captures.get(1))
			.map(|id| format!("https://vumbnail.com/{}.jpg", id.as_str()))
	}
}

impl BlockRenderer for VideoRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Video
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let video_url = prop_non_empty(&props, "videoUrl");
		let thumbnail = prop_non_empty(&props, "thumbnailUrl")
			.or_else(|| video_url.as_deref().and_then(Self::thumbnail_for));

		let Some(thumbnail) = thumbnail else {
			tracing::debug!("video block has no thumbnail, rendering nothing");
			return String::new();
		};

		let attributes = Attributes::new()
			.with("src", sanitize_url(&thumbnail))
			.with("alt", prop_text(&props, "alt").unwrap_or_else(|| "Video".into()))
			.with_opt("href", video_url.map(|url| sanitize_url(&url)))
			.with("width", prop_text(&props, "width").unwrap_or_else(|| "100%".into()))
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "center".into()))
			.with_opt("border-radius", border_radius(&props))
			.with("padding", prop_padding(&props, "padding"));

		format!("<mj-image{attributes} />")
	}
}

/// A row of social network icons served from the Simple Icons CDN.
pub struct SocialRenderer;

impl SocialRenderer {
	pub const FALLBACK_COLOR: &'static str = "#6B7280";

	fn icon_name(platform: &str) -> &str {
		match platform {
			"twitter" => "x",
			"email" => "gmail",
			other => other,
		}
	}

	fn platform_color(platform: &str) -> &'static str {
		match platform {
			"facebook" => "#1877F2",
			"twitter" | "tiktok" => "#000000",
			"instagram" => "#E4405F",
			"linkedin" => "#0A66C2",
			"youtube" => "#FF0000",
			"pinterest" => "#BD081C",
			_ => Self::FALLBACK_COLOR,
		}
	}

	fn icon_size(size: &str) -> &'static str {
		match size {
			"sm" => "24px",
			"lg" => "40px",
			_ => "32px",
		}
	}

	pub fn icon_url(platform: &str, color: &str) -> String {
		format!(
			"https://cdn.simpleicons.org/{}/{}",
			Self::icon_name(platform),
			color.trim_start_matches('#')
		)
	}

	fn icon_color(platform: &str, style: &str, custom: &str) -> String {
		if !custom.is_empty() {
			return custom.to_string();
		}

		match style {
			"filled" | "circle" => Self::platform_color(platform).to_string(),
			_ => Self::FALLBACK_COLOR.to_string(),
		}
	}

	fn render_element(link: &Props, style: &str, custom_color: &str) -> String {
		let platform = prop_text(link, "platform").unwrap_or_default();
		let url = prop_text(link, "url").unwrap_or_default();
		let color = Self::icon_color(&platform, style, custom_color);
		let circle = style == "circle";
		let icon_url = if circle {
			Self::icon_url(&platform, "white")
		} else {
			Self::icon_url(&platform, &color)
		};
		let background = if circle { color } else { "transparent".to_string() };

		let attributes = Attributes::new()
			.with("name", "custom")
			.with("src", icon_url)
			.with("href", sanitize_url(&url))
			.with("background-color", background)
			.with("alt", capitalize(&platform))
			.with_opt("border-radius", circle.then_some("50%"));

		format!("<mj-social-element{attributes} />")
	}
}

impl BlockRenderer for SocialRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Social
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let links: Vec<&Props> = props
			.get("links")
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter_map(Value::as_object)
			.filter(|link| {
				is_truthy(link.get("enabled")) && prop_non_empty(link, "url").is_some()
			})
			.collect();

		if links.is_empty() {
			return String::new();
		}

		let style = prop_text(&props, "iconStyle").unwrap_or_else(|| "filled".into());
		let custom_color = prop_text(&props, "iconColor").unwrap_or_default();
		let gap = prop_number(&props, "gap").unwrap_or(12.0);
		let icon_size = Self::icon_size(&prop_text(&props, "iconSize").unwrap_or_default());

		let elements: String = links
			.iter()
			.map(|link| Self::render_element(link, &style, &custom_color))
			.collect();

		let attributes = Attributes::new()
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "center".into()))
			.with("icon-size", icon_size)
			.with("mode", "horizontal")
			.with("icon-padding", format!("0 {gap}px 0 0"))
			.with("padding", prop_padding(&props, "padding"));

		format!("<mj-social{attributes}>{elements}</mj-social>")
	}
}

fn capitalize(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
