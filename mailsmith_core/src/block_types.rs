use serde::Deserialize;
use serde::Serialize;

use crate::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
	Content,
	Layout,
	Interactive,
}

/// Palette metadata for a block kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeInfo {
	#[serde(rename = "type")]
	pub kind: BlockKind,
	pub label: String,
	pub icon: String,
	pub category: BlockCategory,
	/// Holds other blocks.
	pub is_container: bool,
	/// May be placed inside a row column.
	pub can_nest: bool,
}

/// Metadata for `kind`. Custom kinds are treated as nestable content.
pub fn block_type_info(kind: &BlockKind) -> BlockTypeInfo {
	let (label, icon, category) = match kind {
		BlockKind::Text => ("Text", "text-align-left", BlockCategory::Content),
		BlockKind::Heading => ("Heading", "heading", BlockCategory::Content),
		BlockKind::Image => ("Image", "image-01", BlockCategory::Content),
		BlockKind::Button => ("Button", "cursor-click-01", BlockCategory::Interactive),
		BlockKind::Divider => ("Divider", "horizontal-resize", BlockCategory::Content),
		BlockKind::Spacer => ("Spacer", "distribute-vertical-center", BlockCategory::Content),
		BlockKind::Html => ("HTML", "source-code", BlockCategory::Content),
		BlockKind::Video => ("Video", "video-01", BlockCategory::Content),
		BlockKind::Social => ("Social Icons", "share-01", BlockCategory::Content),
		BlockKind::Row => ("Row", "layout-grid", BlockCategory::Layout),
		BlockKind::Custom(name) => {
			return BlockTypeInfo {
				kind: kind.clone(),
				label: capitalize_first(name),
				icon: "square-01".to_string(),
				category: BlockCategory::Content,
				is_container: false,
				can_nest: true,
			};
		}
	};

	BlockTypeInfo {
		kind: kind.clone(),
		label: label.to_string(),
		icon: icon.to_string(),
		category,
		is_container: kind.is_row(),
		can_nest: !kind.is_row(),
	}
}

/// Whether blocks of `kind` may live inside a column.
pub fn can_block_nest(kind: &BlockKind) -> bool {
	block_type_info(kind).can_nest
}

pub fn is_container_block(kind: &BlockKind) -> bool {
	block_type_info(kind).is_container
}

/// Built-in kinds in `category`, in palette order.
pub fn blocks_by_category(category: BlockCategory) -> Vec<BlockTypeInfo> {
	BlockKind::BUILT_IN
		.iter()
		.map(block_type_info)
		.filter(|info| info.category == category)
		.collect()
}

fn capitalize_first(text: &str) -> String {
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
