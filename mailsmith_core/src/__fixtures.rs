use serde_json::Value;
use serde_json::json;

use crate::Block;
use crate::BlockKind;
use crate::ColumnPreset;
use crate::ContentBlock;
use crate::Document;
use crate::EditorState;
use crate::MailTemplate;
use crate::Props;
use crate::RowBlock;
use crate::RowProps;
use crate::Settings;
use crate::TagDefinition;
use crate::values::TagData;

/// Turns a `json!` object into tag data.
pub(crate) fn data(value: Value) -> TagData {
	match value {
		Value::Object(map) => map,
		_ => TagData::new(),
	}
}

pub(crate) fn props(value: Value) -> Props {
	data(value)
}

pub(crate) fn text_block(content: &str) -> ContentBlock {
	ContentBlock::new(BlockKind::Text, props(json!({ "content": content })))
		.unwrap_or_else(|| unreachable!("text blocks are content blocks"))
}

pub(crate) fn top_level_text(content: &str) -> Block {
	Block::Content(text_block(content))
}

/// A row laid out with `preset` whose columns hold text blocks labelled
/// `c{column}b{block}`.
pub(crate) fn row_with_blocks(preset: ColumnPreset, counts: &[usize]) -> RowBlock {
	let mut props = RowProps::new(preset);

	for (column_index, (column, count)) in props.columns.iter_mut().zip(counts).enumerate() {
		column.blocks = (0..*count)
			.map(|block_index| text_block(&format!("c{column_index}b{block_index}")))
			.collect();
	}

	RowBlock::new(props)
}

/// Three text blocks `a`, `b` and `c`.
pub(crate) fn three_text_blocks() -> Vec<Block> {
	vec![top_level_text("a"), top_level_text("b"), top_level_text("c")]
}

pub(crate) fn editor_with(blocks: Vec<Block>) -> EditorState {
	EditorState::new(blocks, Settings::default())
}

/// Text content of every top-level content block, in order.
pub(crate) fn top_level_contents(editor: &EditorState) -> Vec<String> {
	editor
		.blocks()
		.iter()
		.filter_map(Block::as_content)
		.map(content_of)
		.collect()
}

pub(crate) fn column_contents(row: &RowBlock, column: usize) -> Vec<String> {
	row.props
		.columns
		.get(column)
		.map(|column| column.blocks.iter().map(content_of).collect())
		.unwrap_or_default()
}

pub(crate) fn content_of(block: &ContentBlock) -> String {
	block
		.props
		.get("content")
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string()
}

pub(crate) fn welcome_template() -> MailTemplate {
	let mut template = MailTemplate::new("Welcome Email");
	template.subject = "Welcome to {{app_name}}, {{name}}".to_string();
	template.content = Document::new(vec![top_level_text("Hi {{name}}")]);
	template.tags = vec![TagDefinition::new("name").required()];
	template
}

pub(crate) fn valid_block_json() -> Value {
	json!([
		{
			"id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90",
			"type": "text",
			"props": { "content": "Hello" }
		},
		{
			"id": "7a1c3e5f-2b4d-4c6e-8f0a-1b3d5e7f9a2c",
			"type": "row",
			"props": {
				"preset": "2-equal",
				"columns": [
					{
						"id": "col-1",
						"width": "50%",
						"blocks": [
							{
								"id": "9e8d7c6b-5a49-4382-8170-6f5e4d3c2b1a",
								"type": "button",
								"props": { "text": "Go", "href": "https://example.com" }
							}
						]
					},
					{ "id": "col-2", "width": "50%", "blocks": [] }
				]
			}
		}
	])
}
