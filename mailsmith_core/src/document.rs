use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use crate::MailsmithError;

/// Loosely typed props of a content block.
pub type Props = Map<String, Value>;

pub const DOCUMENT_VERSION: &str = "1.0";

/// Mints a fresh identifier for a block or column.
pub fn generate_id() -> String {
	uuid::Uuid::new_v4().to_string()
}

/// The type tag of a block. Unknown names are kept as [`BlockKind::Custom`]
/// so third party renderers can be registered for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
	Text,
	Heading,
	Image,
	Button,
	Divider,
	Spacer,
	Html,
	Video,
	Social,
	Row,
	Custom(String),
}

impl BlockKind {
	/// Every built-in kind in palette order.
	pub const BUILT_IN: [BlockKind; 10] = [
		Self::Text,
		Self::Heading,
		Self::Image,
		Self::Button,
		Self::Divider,
		Self::Spacer,
		Self::Html,
		Self::Video,
		Self::Social,
		Self::Row,
	];

	pub fn as_str(&self) -> &str {
		match self {
			Self::Text => "text",
			Self::Heading => "heading",
			Self::Image => "image",
			Self::Button => "button",
			Self::Divider => "divider",
			Self::Spacer => "spacer",
			Self::Html => "html",
			Self::Video => "video",
			Self::Social => "social",
			Self::Row => "row",
			Self::Custom(name) => name,
		}
	}

	pub fn is_row(&self) -> bool {
		matches!(self, Self::Row)
	}
}

impl From<&str> for BlockKind {
	fn from(value: &str) -> Self {
		match value {
			"text" => Self::Text,
			"heading" => Self::Heading,
			"image" => Self::Image,
			"button" => Self::Button,
			"divider" => Self::Divider,
			"spacer" => Self::Spacer,
			"html" => Self::Html,
			"video" => Self::Video,
			"social" => Self::Social,
			"row" => Self::Row,
			other => Self::Custom(other.to_string()),
		}
	}
}

impl From<String> for BlockKind {
	fn from(value: String) -> Self {
		Self::from(value.as_str())
	}
}

impl From<BlockKind> for String {
	fn from(kind: BlockKind) -> Self {
		match kind {
			BlockKind::Custom(name) => name,
			other => other.as_str().to_string(),
		}
	}
}

impl fmt::Display for BlockKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Box spacing in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

impl Padding {
	pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
		Self {
			top,
			right,
			bottom,
			left,
		}
	}

	pub const fn uniform(value: f64) -> Self {
		Self::new(value, value, value, value)
	}

	pub fn is_zero(&self) -> bool {
		[self.top, self.right, self.bottom, self.left]
			.iter()
			.all(|side| side.abs() < f64::EPSILON)
	}
}

/// Named column layouts for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnPreset {
	#[serde(rename = "1-column")]
	OneColumn,
	#[default]
	#[serde(rename = "2-equal")]
	TwoEqual,
	#[serde(rename = "2-left-heavy")]
	TwoLeftHeavy,
	#[serde(rename = "2-right-heavy")]
	TwoRightHeavy,
	#[serde(rename = "3-equal")]
	ThreeEqual,
	#[serde(rename = "custom")]
	Custom,
}

impl ColumnPreset {
	pub const ALL: [ColumnPreset; 6] = [
		Self::OneColumn,
		Self::TwoEqual,
		Self::TwoLeftHeavy,
		Self::TwoRightHeavy,
		Self::ThreeEqual,
		Self::Custom,
	];

	/// Column widths for the preset. `Custom` has none; its widths are left
	/// as they are.
	pub fn widths(self) -> Option<&'static [&'static str]> {
		let widths: &'static [&'static str] = match self {
			Self::OneColumn => &["100%"],
			Self::TwoEqual => &["50%", "50%"],
			Self::TwoLeftHeavy => &["66%", "34%"],
			Self::TwoRightHeavy => &["34%", "66%"],
			Self::ThreeEqual => &["33.33%", "33.34%", "33.33%"],
			Self::Custom => return None,
		};

		Some(widths)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::OneColumn => "1-column",
			Self::TwoEqual => "2-equal",
			Self::TwoLeftHeavy => "2-left-heavy",
			Self::TwoRightHeavy => "2-right-heavy",
			Self::ThreeEqual => "3-equal",
			Self::Custom => "custom",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnStyle {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_image: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_size: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub background_position: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub overlay_color: Option<String>,
	/// Percentage between 0 and 100.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub overlay_opacity: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vertical_align: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_radius: Option<f64>,
}

/// A column within a row. Its blocks are always content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
	pub id: String,
	pub width: String,
	#[serde(default)]
	pub blocks: Vec<ContentBlock>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub style: Option<ColumnStyle>,
}

impl ColumnData {
	pub fn new(width: impl Into<String>) -> Self {
		Self {
			id: generate_id(),
			width: width.into(),
			blocks: Vec::new(),
			style: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowStyle {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_image: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_size: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background_position: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub border_radius: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text_align: Option<String>,
}

impl Default for RowStyle {
	/// The style a freshly added row starts with.
	fn default() -> Self {
		Self {
			background_color: None,
			background_image: None,
			background_size: Some("cover".to_string()),
			background_position: Some("center center".to_string()),
			padding: Some(Padding::uniform(10.0)),
			border_radius: Some(0.0),
			text_align: Some("left".to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowProps {
	#[serde(default)]
	pub preset: ColumnPreset,
	#[serde(default)]
	pub columns: Vec<ColumnData>,
	#[serde(default = "default_gap")]
	pub gap: f64,
	#[serde(default = "default_stack_on_mobile")]
	pub stack_on_mobile: bool,
	#[serde(default)]
	pub style: RowStyle,
}

fn default_gap() -> f64 {
	10.0
}

fn default_stack_on_mobile() -> bool {
	true
}

impl RowProps {
	/// Props for a new row laid out with `preset`. Every column gets a fresh
	/// id. `Custom` falls back to two equal columns.
	pub fn new(preset: ColumnPreset) -> Self {
		let widths = preset
			.widths()
			.or_else(|| ColumnPreset::TwoEqual.widths())
			.unwrap_or_default();

		Self {
			preset,
			columns: widths.iter().map(|width| ColumnData::new(*width)).collect(),
			gap: default_gap(),
			stack_on_mobile: default_stack_on_mobile(),
			style: RowStyle::default(),
		}
	}

	pub fn column(&self, column_id: &str) -> Option<&ColumnData> {
		self.columns.iter().find(|column| column.id == column_id)
	}

	pub fn column_mut(&mut self, column_id: &str) -> Option<&mut ColumnData> {
		self.columns.iter_mut().find(|column| column.id == column_id)
	}

	/// Number of content blocks across every column.
	pub fn content_block_count(&self) -> usize {
		self.columns.iter().map(|column| column.blocks.len()).sum()
	}
}

impl Default for RowProps {
	fn default() -> Self {
		Self::new(ColumnPreset::TwoEqual)
	}
}

/// The serialized form shared by every block: `{ id, type, props }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: BlockKind,
	#[serde(default)]
	pub props: Props,
}

/// A leaf block. Never a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct ContentBlock {
	pub id: String,
	pub kind: BlockKind,
	pub props: Props,
}

impl ContentBlock {
	/// Creates a content block with a fresh id. Returns `None` for rows.
	pub fn new(kind: BlockKind, props: Props) -> Option<Self> {
		if kind.is_row() {
			return None;
		}

		Some(Self {
			id: generate_id(),
			kind,
			props,
		})
	}

	/// A copy with a fresh id.
	#[must_use]
	pub fn duplicate(&self) -> Self {
		Self {
			id: generate_id(),
			..self.clone()
		}
	}
}

impl TryFrom<RawBlock> for ContentBlock {
	type Error = MailsmithError;

	fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
		if raw.kind.is_row() {
			return Err(MailsmithError::InvalidProps {
				block_type: raw.kind.to_string(),
				reason: "rows cannot be placed inside a column".to_string(),
			});
		}

		Ok(Self {
			id: raw.id,
			kind: raw.kind,
			props: raw.props,
		})
	}
}

impl From<ContentBlock> for RawBlock {
	fn from(block: ContentBlock) -> Self {
		Self {
			id: block.id,
			kind: block.kind,
			props: block.props,
		}
	}
}

/// A container block holding columns of content blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
	pub id: String,
	pub props: RowProps,
}

impl RowBlock {
	pub fn new(props: RowProps) -> Self {
		Self {
			id: generate_id(),
			props,
		}
	}

	/// A deep copy with fresh ids for the row, every column and every
	/// nested block.
	#[must_use]
	pub fn duplicate(&self) -> Self {
		let mut props = self.props.clone();

		for column in &mut props.columns {
			column.id = generate_id();
			for block in &mut column.blocks {
				block.id = generate_id();
			}
		}

		Self {
			id: generate_id(),
			props,
		}
	}
}

/// A top-level block of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub enum Block {
	Content(ContentBlock),
	Row(RowBlock),
}

impl Block {
	pub fn id(&self) -> &str {
		match self {
			Self::Content(block) => &block.id,
			Self::Row(row) => &row.id,
		}
	}

	pub fn kind(&self) -> BlockKind {
		match self {
			Self::Content(block) => block.kind.clone(),
			Self::Row(_) => BlockKind::Row,
		}
	}

	pub fn is_row(&self) -> bool {
		matches!(self, Self::Row(_))
	}

	pub fn as_row(&self) -> Option<&RowBlock> {
		match self {
			Self::Row(row) => Some(row),
			Self::Content(_) => None,
		}
	}

	pub fn as_row_mut(&mut self) -> Option<&mut RowBlock> {
		match self {
			Self::Row(row) => Some(row),
			Self::Content(_) => None,
		}
	}

	pub fn as_content(&self) -> Option<&ContentBlock> {
		match self {
			Self::Content(block) => Some(block),
			Self::Row(_) => None,
		}
	}

	/// The block's props as a plain map.
	pub fn props(&self) -> Props {
		match self {
			Self::Content(block) => block.props.clone(),
			Self::Row(row) => to_props(&row.props),
		}
	}

	/// A copy with fresh ids throughout.
	#[must_use]
	pub fn duplicate(&self) -> Self {
		match self {
			Self::Content(block) => Self::Content(block.duplicate()),
			Self::Row(row) => Self::Row(row.duplicate()),
		}
	}

	/// Shallow merges `updates` onto the block's props. Row props must still
	/// deserialize after the merge, otherwise nothing changes and `false` is
	/// returned.
	pub fn merge_props(&mut self, updates: Props) -> bool {
		match self {
			Self::Content(block) => {
				block.props.extend(updates);
				true
			}
			Self::Row(row) => merge_into(&mut row.props, updates),
		}
	}
}

impl From<ContentBlock> for Block {
	fn from(block: ContentBlock) -> Self {
		Self::Content(block)
	}
}

impl From<RowBlock> for Block {
	fn from(row: RowBlock) -> Self {
		Self::Row(row)
	}
}

impl TryFrom<RawBlock> for Block {
	type Error = MailsmithError;

	fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
		if !raw.kind.is_row() {
			return ContentBlock::try_from(raw).map(Self::Content);
		}

		let props = serde_json::from_value::<RowProps>(Value::Object(raw.props)).map_err(|e| {
			MailsmithError::InvalidProps {
				block_type: BlockKind::Row.to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(Self::Row(RowBlock { id: raw.id, props }))
	}
}

impl From<Block> for RawBlock {
	fn from(block: Block) -> Self {
		match block {
			Block::Content(block) => block.into(),
			Block::Row(row) => {
				Self {
					props: to_props(&row.props),
					id: row.id,
					kind: BlockKind::Row,
				}
			}
		}
	}
}

/// Serializes a typed value into a props map. Non-object values produce an
/// empty map.
pub fn to_props<T: Serialize>(value: &T) -> Props {
	match serde_json::to_value(value) {
		Ok(Value::Object(map)) => map,
		_ => Props::new(),
	}
}

/// Shallow merges `updates` into the serialized form of `target` and writes
/// the result back. Leaves `target` untouched and returns `false` when the
/// merged map no longer deserializes.
pub fn merge_into<T>(target: &mut T, updates: Props) -> bool
where
	T: Serialize + DeserializeOwned,
{
	let mut merged = to_props(target);
	merged.extend(updates);

	match serde_json::from_value::<T>(Value::Object(merged)) {
		Ok(value) => {
			*target = value;
			true
		}
		Err(e) => {
			tracing::warn!(error = %e, "ignoring props update that does not fit the target shape");
			false
		}
	}
}

/// The serializable block tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	#[serde(default = "default_version")]
	pub version: String,
	#[serde(default)]
	pub blocks: Vec<Block>,
}

fn default_version() -> String {
	DOCUMENT_VERSION.to_string()
}

impl Default for Document {
	fn default() -> Self {
		Self {
			version: default_version(),
			blocks: Vec::new(),
		}
	}
}

impl Document {
	pub fn new(blocks: Vec<Block>) -> Self {
		Self {
			version: default_version(),
			blocks,
		}
	}

	pub fn from_json(json: &str) -> crate::MailsmithResult<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

/// Document level presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	pub font_family: String,
	pub background_color: String,
	pub content_background_color: String,
	pub content_width: u32,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			font_family: "Arial, sans-serif".to_string(),
			background_color: "#f5f5f5".to_string(),
			content_background_color: "#ffffff".to_string(),
			content_width: 600,
		}
	}
}
