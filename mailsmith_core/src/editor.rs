use std::collections::HashSet;

use crate::Block;
use crate::BlockKind;
use crate::ColumnData;
use crate::ColumnPreset;
use crate::ContentBlock;
use crate::Document;
use crate::Props;
use crate::RowBlock;
use crate::RowProps;
use crate::Settings;
use crate::block_types::can_block_nest;
use crate::default_props;
use crate::merge_into;

/// What is currently selected in the editor. A block and a column are never
/// selected at the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Block(String),
	Column { row_id: String, column_id: String },
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
	/// A new block of this kind from the palette.
	Palette(BlockKind),
	/// A top-level block.
	Canvas { block_id: String },
	/// A block inside a row column.
	Nested {
		row_id: String,
		column_id: String,
		block_id: String,
	},
}

/// Where a dragged item would land. `index` is the insertion position in the
/// target list as the user sees it, before the dragged item is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
	Canvas {
		index: usize,
	},
	Column {
		row_id: String,
		column_id: String,
		index: usize,
	},
}

/// Transient drag state. Never part of the document and reset on every drop
/// or cancel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
	pub source: Option<DragSource>,
	pub target: Option<DropTarget>,
}

impl DragState {
	pub fn is_dragging(&self) -> bool {
		self.source.is_some()
	}
}

/// A read-only handle to a block anywhere in the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockRef<'a> {
	TopLevel(&'a Block),
	Nested(&'a ContentBlock),
}

impl BlockRef<'_> {
	pub fn id(&self) -> &str {
		match self {
			Self::TopLevel(block) => block.id(),
			Self::Nested(block) => &block.id,
		}
	}

	pub fn kind(&self) -> BlockKind {
		match self {
			Self::TopLevel(block) => block.kind(),
			Self::Nested(block) => block.kind.clone(),
		}
	}

	pub fn props(&self) -> Props {
		match self {
			Self::TopLevel(block) => block.props(),
			Self::Nested(block) => block.props.clone(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockLocation {
	TopLevel(usize),
	Nested {
		row: usize,
		column: usize,
		index: usize,
	},
}

/// The state of one editing session over a block tree.
///
/// Every structural mutation marks the session dirty and records a deep
/// snapshot in the history. Prop edits through [`EditorState::update_block`]
/// and settings edits mark the session dirty without recording history.
///
/// Operations that cannot find their target, or that would put a row inside
/// a column, do nothing and report it through their return value.
#[derive(Debug, Clone)]
pub struct EditorState {
	blocks: Vec<Block>,
	settings: Settings,
	selection: Selection,
	hovered_block_id: Option<String>,
	drag: DragState,
	history: Vec<Vec<Block>>,
	history_index: usize,
	is_dirty: bool,
}

impl Default for EditorState {
	fn default() -> Self {
		Self::new(Vec::new(), Settings::default())
	}
}

impl EditorState {
	pub fn new(blocks: Vec<Block>, settings: Settings) -> Self {
		Self {
			history: vec![blocks.clone()],
			blocks,
			settings,
			selection: Selection::None,
			hovered_block_id: None,
			drag: DragState::default(),
			history_index: 0,
			is_dirty: false,
		}
	}

	pub fn from_document(document: Document, settings: Settings) -> Self {
		Self::new(document.blocks, settings)
	}

	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn hovered_block_id(&self) -> Option<&str> {
		self.hovered_block_id.as_deref()
	}

	pub fn drag(&self) -> &DragState {
		&self.drag
	}

	pub fn is_dirty(&self) -> bool {
		self.is_dirty
	}

	pub fn history_len(&self) -> usize {
		self.history.len()
	}

	pub fn history_index(&self) -> usize {
		self.history_index
	}

	pub fn mark_clean(&mut self) {
		self.is_dirty = false;
	}

	/// A deep copy of the current blocks as a serializable document.
	pub fn export_document(&self) -> Document {
		Document::new(self.blocks.clone())
	}

	/// Finds a block by id. Top-level blocks are searched first, then each
	/// row's columns in order.
	pub fn block_by_id(&self, id: &str) -> Option<BlockRef<'_>> {
		match self.locate(id)? {
			BlockLocation::TopLevel(index) => self.blocks.get(index).map(BlockRef::TopLevel),
			BlockLocation::Nested { row, column, index } => {
				self.blocks
					.get(row)?
					.as_row()?
					.props
					.columns
					.get(column)?
					.blocks
					.get(index)
					.map(BlockRef::Nested)
			}
		}
	}

	pub fn selected_block(&self) -> Option<BlockRef<'_>> {
		match &self.selection {
			Selection::Block(id) => self.block_by_id(id),
			_ => None,
		}
	}

	pub fn selected_column(&self) -> Option<&ColumnData> {
		match &self.selection {
			Selection::Column { row_id, column_id } => self.column(row_id, column_id),
			_ => None,
		}
	}

	/// Inserts a new block with the kind's default props at `index`, or at
	/// the end when `index` is `None` or past the end. Selects the new block
	/// and returns its id.
	pub fn add_block(&mut self, kind: BlockKind, index: Option<usize>) -> String {
		let block = new_block(kind);
		let id = block.id().to_string();
		let index = index.map_or(self.blocks.len(), |index| index.min(self.blocks.len()));

		self.blocks.insert(index, block);
		self.selection = Selection::Block(id.clone());
		self.push_history();

		id
	}

	/// Inserts a new block into a row column. Rows are never added to a
	/// column.
	pub fn add_block_to_column(
		&mut self,
		row_id: &str,
		column_id: &str,
		kind: BlockKind,
		index: Option<usize>,
	) -> Option<String> {
		if !can_block_nest(&kind) {
			tracing::debug!(block_type = %kind, "block type cannot be placed inside a column");
			return None;
		}

		let props = default_props(&kind);
		let block = ContentBlock::new(kind, props)?;
		let id = block.id.clone();

		let Some(column) = self.column_mut(row_id, column_id) else {
			tracing::debug!(row_id, column_id, "column not found");
			return None;
		};

		let index = index.map_or(column.blocks.len(), |index| index.min(column.blocks.len()));
		column.blocks.insert(index, block);

		self.selection = Selection::Block(id.clone());
		self.push_history();

		Some(id)
	}

	/// Shallow merges `updates` onto the props of the block with `id`,
	/// wherever it is in the tree. Marks the session dirty but does not
	/// record history.
	pub fn update_block(&mut self, id: &str, updates: Props) -> bool {
		let Some(location) = self.locate(id) else {
			tracing::debug!(block_id = %id, "block not found");
			return false;
		};

		let updated = match location {
			BlockLocation::TopLevel(index) => {
				self.blocks
					.get_mut(index)
					.is_some_and(|block| block.merge_props(updates))
			}
			BlockLocation::Nested { row, column, index } => {
				match self.nested_mut(row, column, index) {
					Some(block) => {
						block.props.extend(updates);
						true
					}
					None => false,
				}
			}
		};

		if updated {
			self.is_dirty = true;
		}

		updated
	}

	/// Removes a top-level block.
	pub fn remove_block(&mut self, id: &str) -> bool {
		let Some(index) = self.top_level_index(id) else {
			tracing::debug!(block_id = %id, "top-level block not found");
			return false;
		};

		self.blocks.remove(index);
		self.clear_selection_of(id);
		self.push_history();

		true
	}

	pub fn remove_block_from_column(&mut self, row_id: &str, column_id: &str, block_id: &str) -> bool {
		if self.take_from_column(row_id, column_id, block_id).is_none() {
			return false;
		}

		self.clear_selection_of(block_id);
		self.push_history();

		true
	}

	/// Moves the top-level block at `from` so it ends up at `to`. Both indexes
	/// must be in range.
	pub fn move_block(&mut self, from: usize, to: usize) -> bool {
		if !reorder(&mut self.blocks, from, to) {
			tracing::debug!(from, to, "ignoring top-level move");
			return false;
		}

		self.push_history();
		true
	}

	pub fn move_block_within_column(
		&mut self,
		row_id: &str,
		column_id: &str,
		from: usize,
		to: usize,
	) -> bool {
		let moved = self
			.column_mut(row_id, column_id)
			.is_some_and(|column| reorder(&mut column.blocks, from, to));

		if !moved {
			tracing::debug!(row_id, column_id, from, to, "ignoring column move");
			return false;
		}

		self.push_history();
		true
	}

	/// Moves a block between two columns of the same row.
	pub fn move_block_between_columns(
		&mut self,
		row_id: &str,
		from_column_id: &str,
		to_column_id: &str,
		block_id: &str,
		index: usize,
	) -> bool {
		self.move_nested(row_id, from_column_id, row_id, to_column_id, block_id, index)
	}

	/// Moves a block from a column of one row into a column of another.
	pub fn move_block_between_rows(
		&mut self,
		from_row_id: &str,
		from_column_id: &str,
		to_row_id: &str,
		to_column_id: &str,
		block_id: &str,
		index: usize,
	) -> bool {
		self.move_nested(from_row_id, from_column_id, to_row_id, to_column_id, block_id, index)
	}

	/// Moves a top-level content block into a row column and selects it.
	/// Rows stay on the canvas.
	pub fn move_block_from_canvas_to_column(
		&mut self,
		block_id: &str,
		row_id: &str,
		column_id: &str,
		index: usize,
	) -> bool {
		let Some(from) = self.top_level_index(block_id) else {
			tracing::debug!(block_id, "top-level block not found");
			return false;
		};

		let nestable = self
			.blocks
			.get(from)
			.is_some_and(|block| !block.is_row() && can_block_nest(&block.kind()));

		if !nestable {
			tracing::debug!(block_id, "block cannot be placed inside a column");
			return false;
		}

		if self.column(row_id, column_id).is_none() {
			tracing::debug!(row_id, column_id, "column not found");
			return false;
		}

		let Block::Content(block) = self.blocks.remove(from) else {
			return false;
		};
		let moved_id = block.id.clone();

		if let Some(column) = self.column_mut(row_id, column_id) {
			let index = index.min(column.blocks.len());
			column.blocks.insert(index, block);
		}

		self.selection = Selection::Block(moved_id);
		self.push_history();
		true
	}

	/// Moves a nested block onto the canvas and selects it.
	pub fn move_block_from_column_to_canvas(
		&mut self,
		row_id: &str,
		column_id: &str,
		block_id: &str,
		index: usize,
	) -> bool {
		let Some(block) = self.take_from_column(row_id, column_id, block_id) else {
			return false;
		};

		let index = index.min(self.blocks.len());
		self.selection = Selection::Block(block.id.clone());
		self.blocks.insert(index, Block::Content(block));
		self.push_history();

		true
	}

	/// Inserts a deep copy of a top-level block right after it and selects
	/// the copy. Returns the copy's id.
	pub fn duplicate_block(&mut self, id: &str) -> Option<String> {
		let Some(index) = self.top_level_index(id) else {
			tracing::debug!(block_id = %id, "top-level block not found");
			return None;
		};

		let copy = self.blocks.get(index)?.duplicate();
		let copy_id = copy.id().to_string();

		self.blocks.insert(index + 1, copy);
		self.selection = Selection::Block(copy_id.clone());
		self.push_history();

		Some(copy_id)
	}

	pub fn duplicate_block_in_column(
		&mut self,
		row_id: &str,
		column_id: &str,
		block_id: &str,
	) -> Option<String> {
		let Some(column) = self.column_mut(row_id, column_id) else {
			tracing::debug!(row_id, column_id, "column not found");
			return None;
		};

		let index = column.blocks.iter().position(|block| block.id == block_id)?;
		let copy = column.blocks.get(index)?.duplicate();
		let copy_id = copy.id.clone();

		column.blocks.insert(index + 1, copy);
		self.selection = Selection::Block(copy_id.clone());
		self.push_history();

		Some(copy_id)
	}

	/// Switches a row to `preset`. Columns are added or removed to match the
	/// preset. Blocks from removed columns move, in order, to the end of the
	/// new last column.
	pub fn update_columns_preset(&mut self, row_id: &str, preset: ColumnPreset) -> bool {
		let Some(row) = self.row_mut(row_id) else {
			tracing::debug!(row_id, "row not found");
			return false;
		};

		apply_preset(&mut row.props, preset);
		self.push_history();

		true
	}

	/// Applies `widths` to the columns in order and marks the row's preset
	/// as custom.
	pub fn update_column_widths(&mut self, row_id: &str, widths: &[String]) -> bool {
		let Some(row) = self.row_mut(row_id) else {
			tracing::debug!(row_id, "row not found");
			return false;
		};

		row.props.preset = ColumnPreset::Custom;
		for (column, width) in row.props.columns.iter_mut().zip(widths) {
			column.width.clone_from(width);
		}

		self.push_history();
		true
	}

	/// Shallow merges `updates` onto a row's style.
	pub fn update_row_style(&mut self, row_id: &str, updates: Props) -> bool {
		let Some(row) = self.row_mut(row_id) else {
			tracing::debug!(row_id, "row not found");
			return false;
		};

		if !merge_into(&mut row.props.style, updates) {
			return false;
		}

		self.push_history();
		true
	}

	/// Shallow merges `updates` onto a column's style, creating the style
	/// when the column has none.
	pub fn update_column_style(&mut self, row_id: &str, column_id: &str, updates: Props) -> bool {
		let Some(column) = self.column_mut(row_id, column_id) else {
			tracing::debug!(row_id, column_id, "column not found");
			return false;
		};

		let mut style = column.style.clone().unwrap_or_default();
		if !merge_into(&mut style, updates) {
			return false;
		}

		column.style = Some(style);
		self.push_history();

		true
	}

	/// Selects a block, clearing any column selection. `None` clears the
	/// block selection.
	pub fn select_block(&mut self, id: Option<&str>) {
		match id {
			Some(id) => self.selection = Selection::Block(id.to_string()),
			None => {
				if matches!(self.selection, Selection::Block(_)) {
					self.selection = Selection::None;
				}
			}
		}
	}

	/// Selects a column as `(row_id, column_id)`, clearing any block
	/// selection. `None` clears the column selection.
	pub fn select_column(&mut self, column: Option<(&str, &str)>) {
		match column {
			Some((row_id, column_id)) => {
				self.selection = Selection::Column {
					row_id: row_id.to_string(),
					column_id: column_id.to_string(),
				};
			}
			None => self.clear_column_selection(),
		}
	}

	pub fn clear_column_selection(&mut self) {
		if matches!(self.selection, Selection::Column { .. }) {
			self.selection = Selection::None;
		}
	}

	pub fn hover_block(&mut self, id: Option<&str>) {
		self.hovered_block_id = id.map(String::from);
	}

	pub fn can_undo(&self) -> bool {
		self.history_index > 0
	}

	pub fn can_redo(&self) -> bool {
		self.history_index + 1 < self.history.len()
	}

	pub fn undo(&mut self) -> bool {
		if !self.can_undo() {
			return false;
		}

		self.restore(self.history_index - 1)
	}

	pub fn redo(&mut self) -> bool {
		if !self.can_redo() {
			return false;
		}

		self.restore(self.history_index + 1)
	}

	/// Appends `blocks` to the document, or replaces the document's blocks
	/// when `replace` is set. A block whose ids collide with the document is
	/// given fresh ids. The first added block becomes the selection.
	pub fn add_blocks_at_end(&mut self, blocks: Vec<Block>, replace: bool) {
		if replace {
			self.blocks.clear();
		}

		let mut ids = self.all_ids();
		let mut first_added = None;

		for block in blocks {
			let block = if block_ids(&block).iter().any(|id| ids.contains(id)) {
				block.duplicate()
			} else {
				block
			};

			ids.extend(block_ids(&block));
			first_added.get_or_insert_with(|| block.id().to_string());
			self.blocks.push(block);
		}

		if let Some(id) = first_added {
			self.selection = Selection::Block(id);
		}

		self.push_history();
	}

	/// Shallow merges `updates` onto the document settings. Marks the
	/// session dirty without recording history.
	pub fn update_settings(&mut self, updates: Props) -> bool {
		if !merge_into(&mut self.settings, updates) {
			return false;
		}

		self.is_dirty = true;
		true
	}

	pub fn start_drag(&mut self, source: DragSource) {
		self.drag = DragState {
			source: Some(source),
			target: None,
		};
	}

	pub fn set_drop_target(&mut self, target: Option<DropTarget>) {
		self.drag.target = target;
	}

	pub fn cancel_drag(&mut self) {
		self.drag = DragState::default();
	}

	/// Completes the current drag onto `target` and resets the drag state.
	/// Returns whether the document changed.
	pub fn drop(&mut self, target: DropTarget) -> bool {
		let source = self.drag.source.take();
		self.drag = DragState::default();

		let Some(source) = source else {
			tracing::debug!("drop without an active drag");
			return false;
		};

		match (source, target) {
			(DragSource::Palette(kind), DropTarget::Canvas { index }) => {
				self.add_block(kind, Some(index));
				true
			}
			(
				DragSource::Palette(kind),
				DropTarget::Column {
					row_id,
					column_id,
					index,
				},
			) => {
				self.add_block_to_column(&row_id, &column_id, kind, Some(index))
					.is_some()
			}
			(DragSource::Canvas { block_id }, DropTarget::Canvas { index }) => {
				let Some(from) = self.top_level_index(&block_id) else {
					return false;
				};

				self.move_block(from, adjusted_index(from, index))
			}
			(
				DragSource::Canvas { block_id },
				DropTarget::Column {
					row_id,
					column_id,
					index,
				},
			) => self.move_block_from_canvas_to_column(&block_id, &row_id, &column_id, index),
			(
				DragSource::Nested {
					row_id,
					column_id,
					block_id,
				},
				DropTarget::Canvas { index },
			) => self.move_block_from_column_to_canvas(&row_id, &column_id, &block_id, index),
			(
				DragSource::Nested {
					row_id: from_row_id,
					column_id: from_column_id,
					block_id,
				},
				DropTarget::Column {
					row_id,
					column_id,
					index,
				},
			) => {
				if from_row_id != row_id {
					return self.move_block_between_rows(
						&from_row_id,
						&from_column_id,
						&row_id,
						&column_id,
						&block_id,
						index,
					);
				}

				if from_column_id != column_id {
					return self.move_block_between_columns(
						&row_id,
						&from_column_id,
						&column_id,
						&block_id,
						index,
					);
				}

				let Some(from) = self
					.column(&row_id, &column_id)
					.and_then(|column| column.blocks.iter().position(|block| block.id == block_id))
				else {
					return false;
				};

				self.move_block_within_column(&row_id, &column_id, from, adjusted_index(from, index))
			}
		}
	}

	fn push_history(&mut self) {
		self.history.truncate(self.history_index + 1);
		self.history.push(self.blocks.clone());
		self.history_index = self.history.len() - 1;
		self.is_dirty = true;
	}

	fn restore(&mut self, index: usize) -> bool {
		let Some(snapshot) = self.history.get(index) else {
			return false;
		};

		self.blocks = snapshot.clone();
		self.history_index = index;
		self.is_dirty = true;

		if matches!(self.selection, Selection::Block(_)) {
			self.selection = Selection::None;
		}

		true
	}

	fn clear_selection_of(&mut self, id: &str) {
		if matches!(&self.selection, Selection::Block(selected) if selected == id) {
			self.selection = Selection::None;
		}
	}

	fn top_level_index(&self, id: &str) -> Option<usize> {
		self.blocks.iter().position(|block| block.id() == id)
	}

	fn locate(&self, id: &str) -> Option<BlockLocation> {
		if let Some(index) = self.top_level_index(id) {
			return Some(BlockLocation::TopLevel(index));
		}

		for (row, block) in self.blocks.iter().enumerate() {
			let Some(row_block) = block.as_row() else {
				continue;
			};

			for (column, data) in row_block.props.columns.iter().enumerate() {
				if let Some(index) = data.blocks.iter().position(|nested| nested.id == id) {
					return Some(BlockLocation::Nested { row, column, index });
				}
			}
		}

		None
	}

	fn nested_mut(&mut self, row: usize, column: usize, index: usize) -> Option<&mut ContentBlock> {
		self.blocks
			.get_mut(row)?
			.as_row_mut()?
			.props
			.columns
			.get_mut(column)?
			.blocks
			.get_mut(index)
	}

	fn row_mut(&mut self, row_id: &str) -> Option<&mut RowBlock> {
		self.blocks
			.iter_mut()
			.filter_map(Block::as_row_mut)
			.find(|row| row.id == row_id)
	}

	fn column(&self, row_id: &str, column_id: &str) -> Option<&ColumnData> {
		self.blocks
			.iter()
			.filter_map(Block::as_row)
			.find(|row| row.id == row_id)?
			.props
			.column(column_id)
	}

	fn column_mut(&mut self, row_id: &str, column_id: &str) -> Option<&mut ColumnData> {
		self.row_mut(row_id)?.props.column_mut(column_id)
	}

	fn take_from_column(&mut self, row_id: &str, column_id: &str, block_id: &str) -> Option<ContentBlock> {
		let Some(column) = self.column_mut(row_id, column_id) else {
			tracing::debug!(row_id, column_id, "column not found");
			return None;
		};

		let Some(index) = column.blocks.iter().position(|block| block.id == block_id) else {
			tracing::debug!(row_id, column_id, block_id, "block not found in column");
			return None;
		};

		Some(column.blocks.remove(index))
	}

	fn move_nested(
		&mut self,
		from_row_id: &str,
		from_column_id: &str,
		to_row_id: &str,
		to_column_id: &str,
		block_id: &str,
		index: usize,
	) -> bool {
		if self.column(to_row_id, to_column_id).is_none() {
			tracing::debug!(row_id = to_row_id, column_id = to_column_id, "target column not found");
			return false;
		}

		let Some(block) = self.take_from_column(from_row_id, from_column_id, block_id) else {
			return false;
		};

		if let Some(column) = self.column_mut(to_row_id, to_column_id) {
			let index = index.min(column.blocks.len());
			column.blocks.insert(index, block);
		}

		self.push_history();
		true
	}

	fn all_ids(&self) -> HashSet<String> {
		self.blocks.iter().flat_map(block_ids).collect()
	}
}

fn new_block(kind: BlockKind) -> Block {
	let props = default_props(&kind);

	match ContentBlock::new(kind, props) {
		Some(block) => Block::Content(block),
		None => Block::Row(RowBlock::new(RowProps::default())),
	}
}

/// Ids of a block and, for rows, of every nested block.
fn block_ids(block: &Block) -> Vec<String> {
	let mut ids = vec![block.id().to_string()];

	if let Some(row) = block.as_row() {
		ids.extend(
			row.props
				.columns
				.iter()
				.flat_map(|column| column.blocks.iter().map(|nested| nested.id.clone())),
		);
	}

	ids
}

/// Moves `items[from]` to position `to`. Both must be in range and differ.
fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
	if from == to || from >= items.len() || to >= items.len() {
		return false;
	}

	let item = items.remove(from);
	items.insert(to, item);

	true
}

/// Converts a drop position, counted before the dragged item is removed,
/// into the index the item ends up at.
fn adjusted_index(from: usize, drop_index: usize) -> usize {
	if from < drop_index {
		drop_index - 1
	} else {
		drop_index
	}
}

fn apply_preset(props: &mut RowProps, preset: ColumnPreset) {
	props.preset = preset;

	let Some(widths) = preset.widths() else {
		return;
	};

	if props.columns.len() > widths.len() {
		let overflow: Vec<ContentBlock> = props
			.columns
			.drain(widths.len()..)
			.flat_map(|column| column.blocks)
			.collect();

		if let Some(last) = props.columns.last_mut() {
			last.blocks.extend(overflow);
		}
	}

	while props.columns.len() < widths.len() {
		props.columns.push(ColumnData::new(""));
	}

	for (column, width) in props.columns.iter_mut().zip(widths) {
		column.width = (*width).to_string();
	}
}
