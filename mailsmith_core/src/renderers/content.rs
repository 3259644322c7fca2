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
use crate::sanitizer::escape_text;
use crate::sanitizer::sanitize_html;
use crate::sanitizer::sanitize_url;
use crate::theme::ThemeColors;

/// Rich text. The content is reduced to the allowed formatting tags.
pub struct TextRenderer;

impl TextRenderer {
	fn font_weight(weight: &str) -> &'static str {
		match weight {
			"medium" => "500",
			"semibold" => "600",
			"bold" => "700",
			_ => "normal",
		}
	}
}

impl BlockRenderer for TextRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Text
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let font_size = prop_number(&props, "fontSize").map_or_else(
			|| {
				match prop_text(&props, "variant").as_deref() {
					Some("caption") => "14px".to_string(),
					_ => "16px".to_string(),
				}
			},
			px,
		);
		let weight = prop_text(&props, "fontWeight").unwrap_or_default();

		let attributes = Attributes::new()
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "left".into()))
			.with(
				"color",
				prop_text(&props, "color").unwrap_or_else(|| ThemeColors::TEXT_DEFAULT.into()),
			)
			.with("font-size", font_size)
			.with("font-weight", Self::font_weight(&weight))
			.with("line-height", prop_text(&props, "lineHeight").unwrap_or_else(|| "1.5".into()))
			.with("padding", prop_padding(&props, "padding"));

		let content = sanitize_html(&prop_text(&props, "content").unwrap_or_default());

		format!("<mj-text{attributes}>{content}</mj-text>")
	}
}

/// A heading. The text is escaped, not sanitized.
pub struct HeadingRenderer;

impl HeadingRenderer {
	fn font_weight(weight: &str) -> &'static str {
		match weight {
			"normal" => "normal",
			"medium" => "500",
			"semibold" => "600",
			_ => "700",
		}
	}

	fn level(level: Option<String>) -> &'static str {
		match level.as_deref() {
			Some("h2") => "h2",
			Some("h3") => "h3",
			Some("h4") => "h4",
			Some("h5") => "h5",
			Some("h6") => "h6",
			_ => "h1",
		}
	}
}

impl BlockRenderer for HeadingRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Heading
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let level = Self::level(prop_text(&props, "level"));
		let font_size = prop_number(&props, "fontSize").map_or_else(
			|| {
				match level {
					"h2" => "24px".to_string(),
					"h3" => "20px".to_string(),
					_ => "28px".to_string(),
				}
			},
			px,
		);
		let weight = prop_text(&props, "fontWeight").unwrap_or_default();

		let attributes = Attributes::new()
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "left".into()))
			.with(
				"color",
				prop_text(&props, "color").unwrap_or_else(|| ThemeColors::TEXT_DEFAULT.into()),
			)
			.with("font-size", font_size)
			.with("font-weight", Self::font_weight(&weight))
			.with("line-height", prop_text(&props, "lineHeight").unwrap_or_else(|| "1.2".into()))
			.with("padding", prop_padding(&props, "padding"));

		let content = escape_text(&prop_text(&props, "content").unwrap_or_default());

		format!("<mj-text{attributes}><{level}>{content}</{level}></mj-text>")
	}
}

/// A call to action button themed by its `variant`.
pub struct ButtonRenderer;

impl ButtonRenderer {
	fn inner_padding(size: &str) -> &'static str {
		match size {
			"sm" => "8px 16px",
			"lg" => "16px 32px",
			_ => "12px 24px",
		}
	}

	fn font_size(size: &str) -> &'static str {
		match size {
			"sm" => "14px",
			"lg" => "18px",
			_ => "16px",
		}
	}
}

impl BlockRenderer for ButtonRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Button
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let variant = prop_text(&props, "variant").unwrap_or_else(|| "primary".into());
		let size = prop_text(&props, "size").unwrap_or_else(|| "md".into());
		let explicit_background = prop_non_empty(&props, "backgroundColor");
		let explicit_text = prop_non_empty(&props, "textColor");
		let background = ThemeColors::button_background(&variant, explicit_background.as_deref());
		let text_color = ThemeColors::button_text(&variant, explicit_text.as_deref());
		let href = sanitize_url(&prop_text(&props, "href").unwrap_or_else(|| "#".into()));
		let border = (variant == "outline").then(|| format!("2px solid {text_color}"));
		let full_width = prop_flag(&props, "fullWidth").unwrap_or_default();

		let attributes = Attributes::new()
			.with("href", href)
			.with("background-color", background)
			.with("color", text_color)
			.with_opt("border", border)
			.with("border-radius", px(prop_number(&props, "borderRadius").unwrap_or(6.0)))
			.with("font-weight", "600")
			.with("font-size", Self::font_size(&size))
			.with("inner-padding", Self::inner_padding(&size))
			.with("padding", prop_padding(&props, "padding"))
			.with("align", prop_text(&props, "align").unwrap_or_else(|| "center".into()))
			.with_opt("width", full_width.then_some("100%"));

		let label = escape_text(&prop_text(&props, "text").unwrap_or_else(|| "Click Here".into()));

		format!("<mj-button{attributes}>{label}</mj-button>")
	}
}

/// A horizontal rule. The `none` style renders as blank space instead.
pub struct DividerRenderer;

impl BlockRenderer for DividerRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Divider
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let style = prop_text(&props, "style").unwrap_or_else(|| "solid".into());

		if style == "none" {
			let side = |name: &str| {
				props
					.get("padding")
					.and_then(|padding| padding.get(name))
					.and_then(crate::values::as_number)
					.unwrap_or(20.0)
			};
			let height = side("top") + side("bottom");
			return format!("<mj-spacer height=\"{height}px\" />");
		}

		let attributes = Attributes::new()
			.with("border-style", style)
			.with(
				"border-color",
				prop_text(&props, "color").unwrap_or_else(|| ThemeColors::DIVIDER.into()),
			)
			.with("border-width", px(prop_number(&props, "thickness").unwrap_or(1.0)))
			.with("width", prop_text(&props, "width").unwrap_or_default())
			.with("align", prop_text(&props, "align").unwrap_or_default())
			.with("padding", prop_padding(&props, "padding"));

		format!("<mj-divider{attributes} />")
	}
}

/// Vertical whitespace with an optional background.
pub struct SpacerRenderer;

impl BlockRenderer for SpacerRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Spacer
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let height = prop_number(&props, "height").unwrap_or(40.0).trunc();
		let background = prop_text(&props, "backgroundColor")
			.filter(|color| color != ThemeColors::BACKGROUND_TRANSPARENT);

		let attributes = Attributes::new()
			.with("height", px(height))
			.with_opt("container-background-color", background);

		format!("<mj-spacer{attributes} />")
	}
}

/// Raw markup placed in its own section. The content is trusted and is not
/// sanitized.
pub struct HtmlRenderer;

impl BlockRenderer for HtmlRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Html
	}

	fn render(&self, props: &Props, _context: &RenderContext<'_>) -> String {
		let props = merge_with_defaults(self.default_props(), props);
		let Some(content) = prop_non_empty(&props, "content") else {
			return String::new();
		};
		let padding = prop_padding(&props, "padding");

		format!(
			"<mj-section padding=\"{padding}\"><mj-column><mj-raw>{content}</mj-raw></mj-column></mj-section>"
		)
	}
}
