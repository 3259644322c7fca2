//! Block renderers turn a block's props into an MJML fragment.
//!
//! Each renderer merges the props it receives over its defaults before
//! reading them, so partial props are always safe. Missing visual input such
//! as an image without a `src` renders to an empty fragment.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;
use serde_json::Value;

pub use content::*;
pub use media::*;
pub use row::*;

use crate::Block;
use crate::BlockKind;
use crate::MailsmithError;
use crate::MailsmithResult;
use crate::Padding;
use crate::Props;
use crate::block_type_info;
use crate::defaults::default_props;
use crate::values::TagData;
use crate::values::as_number;
use crate::values::is_truthy;
use crate::values::value_to_string;

mod content;
mod media;
mod row;

/// What a renderer can see besides the props of the block it renders.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
	/// Used by container blocks to render their children.
	pub registry: &'a BlockRegistry,
	pub data: &'a TagData,
}

impl<'a> RenderContext<'a> {
	pub fn new(registry: &'a BlockRegistry, data: &'a TagData) -> Self {
		Self { registry, data }
	}
}

pub trait BlockRenderer: Send + Sync {
	/// The block type this renderer handles.
	fn block_type(&self) -> BlockKind;

	fn default_props(&self) -> Props {
		default_props(&self.block_type())
	}

	fn render(&self, props: &Props, context: &RenderContext<'_>) -> String;
}

/// A block type offered by the palette together with its starting props.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBlock {
	#[serde(rename = "type")]
	pub kind: BlockKind,
	pub label: String,
	pub icon: String,
	pub default_props: Props,
}

/// Renderers keyed by block type.
#[derive(Clone)]
pub struct BlockRegistry {
	renderers: BTreeMap<BlockKind, Arc<dyn BlockRenderer>>,
}

impl fmt::Debug for BlockRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlockRegistry")
			.field("types", &self.renderers.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl Default for BlockRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl BlockRegistry {
	/// A registry with every built-in renderer.
	pub fn new() -> Self {
		let mut registry = Self::empty();
		registry.register(TextRenderer);
		registry.register(HeadingRenderer);
		registry.register(ImageRenderer);
		registry.register(ButtonRenderer);
		registry.register(DividerRenderer);
		registry.register(SpacerRenderer);
		registry.register(HtmlRenderer);
		registry.register(VideoRenderer);
		registry.register(SocialRenderer);
		registry.register(RowRenderer);
		registry
	}

	pub fn empty() -> Self {
		Self {
			renderers: BTreeMap::new(),
		}
	}

	/// Registers a renderer for its block type, replacing any previous one.
	pub fn register(&mut self, renderer: impl BlockRenderer + 'static) {
		self.renderers.insert(renderer.block_type(), Arc::new(renderer));
	}

	pub fn has_renderer(&self, kind: &BlockKind) -> bool {
		self.renderers.contains_key(kind)
	}

	pub fn renderer(&self, kind: &BlockKind) -> MailsmithResult<&dyn BlockRenderer> {
		self.renderers
			.get(kind)
			.map(|renderer| &**renderer)
			.ok_or_else(|| MailsmithError::UnknownBlockType(kind.to_string()))
	}

	pub fn types(&self) -> impl Iterator<Item = &BlockKind> {
		self.renderers.keys()
	}

	/// Renders props with the renderer for `kind`. Unregistered kinds render
	/// nothing.
	pub fn render_props(&self, kind: &BlockKind, props: &Props, data: &TagData) -> String {
		match self.renderer(kind) {
			Ok(renderer) => renderer.render(props, &RenderContext::new(self, data)),
			Err(_) => {
				tracing::warn!(block_type = %kind, "skipping block without a registered renderer");
				String::new()
			}
		}
	}

	pub fn render_block(&self, block: &Block, data: &TagData) -> String {
		self.render_props(&block.kind(), &block.props(), data)
	}

	/// Every registered type with its palette label, icon and default props.
	pub fn available_blocks(&self) -> Vec<AvailableBlock> {
		self.renderers
			.iter()
			.map(|(kind, renderer)| {
				let info = block_type_info(kind);
				AvailableBlock {
					kind: kind.clone(),
					label: info.label,
					icon: info.icon,
					default_props: renderer.default_props(),
				}
			})
			.collect()
	}
}

/// Shallow merges `props` over `defaults`.
pub fn merge_with_defaults(mut defaults: Props, props: &Props) -> Props {
	defaults.extend(props.iter().map(|(key, value)| (key.clone(), value.clone())));
	defaults
}

/// A prop as text. Numbers and booleans are converted; `null` and arrays or
/// objects are treated as absent.
pub fn prop_text(props: &Props, key: &str) -> Option<String> {
	match props.get(key)? {
		Value::Null | Value::Array(_) | Value::Object(_) => None,
		value => Some(value_to_string(value)),
	}
}

/// A prop as non-empty text.
pub fn prop_non_empty(props: &Props, key: &str) -> Option<String> {
	prop_text(props, key).filter(|text| !text.is_empty())
}

pub fn prop_number(props: &Props, key: &str) -> Option<f64> {
	props.get(key).and_then(as_number)
}

pub fn prop_flag(props: &Props, key: &str) -> Option<bool> {
	props.get(key).map(|value| is_truthy(Some(value)))
}

/// Reads a padding prop. Strings are used verbatim; objects are read side by
/// side with missing sides as zero.
pub fn prop_padding(props: &Props, key: &str) -> String {
	match props.get(key) {
		Some(Value::String(raw)) => raw.clone(),
		Some(Value::Object(sides)) => {
			let side = |name: &str| sides.get(name).and_then(as_number).unwrap_or_default();
			format_padding(&Padding::new(
				side("top"),
				side("right"),
				side("bottom"),
				side("left"),
			))
		}
		_ => format_padding(&Padding::default()),
	}
}

/// `top right bottom left` in pixels.
pub fn format_padding(padding: &Padding) -> String {
	format!(
		"{}px {}px {}px {}px",
		padding.top, padding.right, padding.bottom, padding.left
	)
}

/// Ordered attribute list for an MJML tag. Empty values are dropped when
/// written and every value is escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.0.push((name, value.into()));
		self
	}

	#[must_use]
	pub fn with_opt(self, name: &'static str, value: Option<impl Into<String>>) -> Self {
		match value {
			Some(value) => self.with(name, value),
			None => self,
		}
	}
}

impl fmt::Display for Attributes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (name, value) in self.iter().filter(|(_, value)| !value.is_empty()) {
			write!(f, " {name}=\"{}\"", html_escape::encode_double_quoted_attribute(value))?;
		}

		Ok(())
	}
}

/// Formats a pixel size such as `16` into `16px`.
pub(crate) fn px(value: f64) -> String {
	format!("{value}px")
}
