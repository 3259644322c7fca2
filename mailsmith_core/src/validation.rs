use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::BlockKind;
use crate::BlockRegistry;
use crate::MailsmithError;
use crate::MailsmithResult;
use crate::TagDefinition;
use crate::TagRegistry;
use crate::tag_processor::extract_tags_from_content;

/// Deepest level a block may sit at. Top-level blocks are at depth zero.
pub const MAX_NESTING_DEPTH: usize = 3;

/// What is wrong with a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockValidationErrorKind {
	/// The document's block list is not an array.
	BlocksNotArray,
	BlockNotObject,
	InvalidId,
	InvalidUuid,
	InvalidType,
	UnregisteredType { block_type: String },
	InvalidProps,
	MissingRequiredProp { block_type: String, prop: String },
	/// A row placed inside a column.
	NestedRow,
	MaxNestingExceeded { max: usize },
}

/// A single problem found in an untrusted block tree, tagged with the path of
/// the offending block such as `blocks[0].props.columns[1].blocks[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockValidationError {
	pub path: String,
	#[serde(flatten)]
	pub kind: BlockValidationErrorKind,
}

impl BlockValidationError {
	fn new(path: impl Into<String>, kind: BlockValidationErrorKind) -> Self {
		Self {
			path: path.into(),
			kind,
		}
	}
}

impl fmt::Display for BlockValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let path = &self.path;
		match &self.kind {
			BlockValidationErrorKind::BlocksNotArray => write!(f, "{path}: blocks must be an array"),
			BlockValidationErrorKind::BlockNotObject => write!(f, "{path}: block must be an object"),
			BlockValidationErrorKind::InvalidId => write!(f, "{path}: block id must be a string"),
			BlockValidationErrorKind::InvalidUuid => write!(f, "{path}: block id must be a uuid"),
			BlockValidationErrorKind::InvalidType => write!(f, "{path}: block type must be a string"),
			BlockValidationErrorKind::UnregisteredType { block_type } => {
				write!(f, "{path}: block type `{block_type}` is not registered")
			}
			BlockValidationErrorKind::InvalidProps => write!(f, "{path}: block props must be an object"),
			BlockValidationErrorKind::MissingRequiredProp { block_type, prop } => {
				write!(f, "{path}: `{block_type}` block requires `{prop}`")
			}
			BlockValidationErrorKind::NestedRow => write!(f, "{path}: rows cannot be placed inside a column"),
			BlockValidationErrorKind::MaxNestingExceeded { max } => {
				write!(f, "{path}: blocks cannot be nested deeper than {max} levels")
			}
		}
	}
}

fn required_props(kind: &BlockKind) -> &'static [&'static str] {
	match kind {
		BlockKind::Button => &["text", "href"],
		BlockKind::Image => &["src"],
		_ => &[],
	}
}

/// Checks an untrusted block list before it is accepted as document content.
/// Every violation is reported; an empty list means the blocks are valid.
pub fn validate_block_structure(blocks: &Value, registry: &BlockRegistry) -> Vec<BlockValidationError> {
	let mut errors = Vec::new();

	let Some(blocks) = blocks.as_array() else {
		errors.push(BlockValidationError::new("blocks", BlockValidationErrorKind::BlocksNotArray));
		return errors;
	};

	for (index, block) in blocks.iter().enumerate() {
		validate_block(block, registry, 0, &format!("blocks[{index}]"), &mut errors);
	}

	errors
}

/// [`validate_block_structure`] as a result.
pub fn ensure_valid_block_structure(blocks: &Value, registry: &BlockRegistry) -> MailsmithResult<()> {
	let errors = validate_block_structure(blocks, registry);

	if errors.is_empty() {
		Ok(())
	} else {
		Err(MailsmithError::InvalidBlockStructure { errors })
	}
}

fn validate_block(
	block: &Value,
	registry: &BlockRegistry,
	depth: usize,
	path: &str,
	errors: &mut Vec<BlockValidationError>,
) {
	use BlockValidationErrorKind as Kind;

	if depth > MAX_NESTING_DEPTH {
		errors.push(BlockValidationError::new(path, Kind::MaxNestingExceeded {
			max: MAX_NESTING_DEPTH,
		}));
		return;
	}

	let Some(object) = block.as_object() else {
		errors.push(BlockValidationError::new(path, Kind::BlockNotObject));
		return;
	};

	let Some(id) = object.get("id").and_then(Value::as_str) else {
		errors.push(BlockValidationError::new(path, Kind::InvalidId));
		return;
	};

	if uuid::Uuid::parse_str(id).is_err() {
		errors.push(BlockValidationError::new(path, Kind::InvalidUuid));
		return;
	}

	let Some(kind) = object.get("type").and_then(Value::as_str).map(BlockKind::from) else {
		errors.push(BlockValidationError::new(path, Kind::InvalidType));
		return;
	};

	if !registry.has_renderer(&kind) {
		errors.push(BlockValidationError::new(path, Kind::UnregisteredType {
			block_type: kind.to_string(),
		}));
		return;
	}

	if depth > 0 && kind.is_row() {
		errors.push(BlockValidationError::new(path, Kind::NestedRow));
		return;
	}

	let Some(props) = object.get("props").and_then(Value::as_object) else {
		errors.push(BlockValidationError::new(path, Kind::InvalidProps));
		return;
	};

	for prop in required_props(&kind) {
		let missing = match props.get(*prop) {
			None | Some(Value::Null) => true,
			Some(Value::String(text)) => text.is_empty(),
			Some(_) => false,
		};

		if missing {
			errors.push(BlockValidationError::new(path, Kind::MissingRequiredProp {
				block_type: kind.to_string(),
				prop: (*prop).to_string(),
			}));
		}
	}

	if !kind.is_row() {
		return;
	}

	let Some(columns) = props.get("columns").and_then(Value::as_array) else {
		return;
	};

	for (column_index, column) in columns.iter().enumerate() {
		let Some(nested) = column.get("blocks").and_then(Value::as_array) else {
			continue;
		};

		for (nested_index, nested_block) in nested.iter().enumerate() {
			let nested_path = format!("{path}.props.columns[{column_index}].blocks[{nested_index}]");
			validate_block(nested_block, registry, depth + 1, &nested_path, errors);
		}
	}
}

/// Tag problems found while authoring a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagValidationReport {
	/// Tags used in the content that neither the template nor the global
	/// registry defines.
	pub undefined: Vec<String>,
	/// Required tags the content never uses.
	pub unused_required: Vec<String>,
}

impl TagValidationReport {
	pub fn is_ok(&self) -> bool {
		self.undefined.is_empty() && self.unused_required.is_empty()
	}
}

/// Compares the tags used in `content` with the template's declared tags
/// and the global registry.
pub fn check_template_tags(
	content: &Value,
	tags: &[TagDefinition],
	registry: &TagRegistry,
) -> TagValidationReport {
	let used = extract_tags_from_content(content);

	let undefined = used
		.iter()
		.filter(|key| {
			!tags.iter().any(|tag| &tag.key == *key) && !registry.has_global_tag(key)
		})
		.cloned()
		.collect();

	let unused_required = tags
		.iter()
		.filter(|tag| tag.required && !used.contains(&tag.key))
		.map(|tag| tag.key.clone())
		.collect();

	TagValidationReport {
		undefined,
		unused_required,
	}
}

/// [`check_template_tags`] as a result.
pub fn validate_template_tags(
	content: &Value,
	tags: &[TagDefinition],
	registry: &TagRegistry,
) -> MailsmithResult<()> {
	let report = check_template_tags(content, tags, registry);

	if report.is_ok() {
		return Ok(());
	}

	Err(MailsmithError::InvalidTemplateTags {
		undefined: report.undefined,
		unused_required: report.unused_required,
	})
}
