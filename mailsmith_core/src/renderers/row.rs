use serde_json::Value;

use super::Attributes;
use super::BlockRenderer;
use super::RenderContext;
use super::format_padding;
use super::merge_with_defaults;
use super::px;
use crate::BlockKind;
use crate::ColumnData;
use crate::ColumnStyle;
use crate::Padding;
use crate::Props;
use crate::RowProps;
use crate::RowStyle;
use crate::sanitizer::is_url_safe;
use crate::theme::blend_overlay;

/// A multi column section. Each column renders its own content blocks; the
/// row gap becomes extra padding on the inner sides of the columns.
pub struct RowRenderer;

impl RowRenderer {
	pub fn render_row(&self, row: &RowProps, context: &RenderContext<'_>) -> String {
		let total = row.columns.len();
		let columns: String = row
			.columns
			.iter()
			.enumerate()
			.map(|(index, column)| Self::render_column(column, row.gap, index, total, context))
			.collect();

		let attributes = Self::section_attributes(&row.style, row.stack_on_mobile);

		format!("<mj-section{attributes}>{columns}</mj-section>")
	}

	fn section_attributes(style: &RowStyle, stack_on_mobile: bool) -> Attributes {
		let mut attributes = Attributes::new()
			.with("padding", format_padding(&style.padding.unwrap_or_default()))
			.with_opt("background-color", style.background_color.clone())
			.with_opt("text-align", style.text_align.clone())
			.with_opt("css-class", (!stack_on_mobile).then_some("no-stack"));

		if let Some(image) = background_image(style.background_image.as_deref()) {
			attributes = attributes
				.with("background-url", image)
				.with(
					"background-size",
					style.background_size.clone().unwrap_or_else(|| "cover".into()),
				)
				.with(
					"background-position",
					style
						.background_position
						.clone()
						.unwrap_or_else(|| "center center".into()),
				);
		}

		attributes.with_opt(
			"border-radius",
			style.border_radius.filter(|radius| *radius > 0.0).map(px),
		)
	}

	fn render_column(
		column: &ColumnData,
		gap: f64,
		index: usize,
		total: usize,
		context: &RenderContext<'_>,
	) -> String {
		let style = column.style.clone().unwrap_or_default();
		let attributes = Self::column_attributes(&column.width, &style, gap, index, total);
		let content: String = column
			.blocks
			.iter()
			.filter(|block| !block.kind.is_row())
			.map(|block| context.registry.render_props(&block.kind, &block.props, context.data))
			.collect();

		format!("<mj-column{attributes}>{content}</mj-column>")
	}

	fn column_attributes(
		width: &str,
		style: &ColumnStyle,
		gap: f64,
		index: usize,
		total: usize,
	) -> Attributes {
		let image = background_image(style.background_image.as_deref());
		let has_image = image.is_some();
		let overlay = style
			.overlay_color
			.as_ref()
			.filter(|color| !color.is_empty() && has_image);

		let background = match overlay {
			Some(overlay) => {
				Some(blend_overlay(
					style.background_color.as_deref().unwrap_or("#ffffff"),
					overlay,
					style.overlay_opacity.unwrap_or(50.0) / 100.0,
				))
			}
			None => style.background_color.clone(),
		};

		let vertical_align = match style.vertical_align.as_deref() {
			Some("middle") => "middle",
			Some("bottom") => "bottom",
			_ => "top",
		};

		let mut attributes = Attributes::new()
			.with("width", width)
			.with_opt("background-color", background)
			.with("vertical-align", vertical_align);

		if let Some(image) = image {
			attributes = attributes
				.with("background-url", image)
				.with(
					"background-size",
					style.background_size.clone().unwrap_or_else(|| "cover".into()),
				)
				.with(
					"background-position",
					style
						.background_position
						.clone()
						.unwrap_or_else(|| "center center".into()),
				)
				.with("background-repeat", "no-repeat");
		}

		attributes
			.with_opt(
				"padding",
				column_padding(style.padding.unwrap_or_default(), gap, index, total),
			)
			.with_opt(
				"border-radius",
				style.border_radius.filter(|radius| *radius > 0.0).map(px),
			)
	}
}

/// A background image URL worth emitting. Unsafe schemes are dropped along
/// with the rest of the background attributes.
fn background_image(image: Option<&str>) -> Option<String> {
	let image = image.map(str::trim).filter(|image| !image.is_empty())?;

	if is_url_safe(image) {
		Some(image.to_string())
	} else {
		tracing::debug!(url = %image, "dropped unsafe background image");
		None
	}
}

/// Adds half the gap to the inner sides of a column: the right of the first,
/// the left of the last and both sides of the ones in between. Returns
/// `None` when every side ends up zero.
pub fn column_padding(mut padding: Padding, gap: f64, index: usize, total: usize) -> Option<String> {
	if total > 1 && gap > 0.0 {
		let half = gap / 2.0;

		if index == 0 {
			padding.right += half;
		} else if index == total - 1 {
			padding.left += half;
		} else {
			padding.left += half;
			padding.right += half;
		}
	}

	(!padding.is_zero()).then(|| format_padding(&padding))
}

impl BlockRenderer for RowRenderer {
	fn block_type(&self) -> BlockKind {
		BlockKind::Row
	}

	fn render(&self, props: &Props, context: &RenderContext<'_>) -> String {
		let merged = merge_with_defaults(self.default_props(), props);

		match serde_json::from_value::<RowProps>(Value::Object(merged)) {
			Ok(row) => self.render_row(&row, context),
			Err(e) => {
				tracing::warn!(error = %e, "row props could not be read, rendering nothing");
				String::new()
			}
		}
	}
}
