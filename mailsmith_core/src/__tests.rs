use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use chrono::Datelike;
use rstest::rstest;
use serde_json::Value;
use serde_json::json;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;

fn all_ids(blocks: &[Block]) -> Vec<String> {
	let mut ids = Vec::new();

	for block in blocks {
		ids.push(block.id().to_string());
		if let Some(row) = block.as_row() {
			for column in &row.props.columns {
				ids.push(column.id.clone());
				ids.extend(column.blocks.iter().map(|nested| nested.id.clone()));
			}
		}
	}

	ids
}

fn first_row(editor: &EditorState) -> &RowBlock {
	editor
		.blocks()
		.iter()
		.find_map(Block::as_row)
		.unwrap_or_else(|| panic!("expected a row"))
}

fn column_id(row: &RowBlock, index: usize) -> String {
	row.props.columns[index].id.clone()
}

#[rstest]
#[case(0, 2)]
#[case(2, 0)]
#[case(0, 1)]
#[case(1, 2)]
fn move_block_is_undone_by_the_inverse_move(#[case] from: usize, #[case] to: usize) {
	let mut editor = editor_with(three_text_blocks());

	assert!(editor.move_block(from, to));
	assert!(editor.move_block(to, from));
	assert_eq!(top_level_contents(&editor), vec!["a", "b", "c"]);
}

#[rstest]
#[case::same_index(1, 1)]
#[case::from_out_of_range(3, 0)]
#[case::to_out_of_range(0, 3)]
fn move_block_ignores_invalid_indexes(#[case] from: usize, #[case] to: usize) {
	let mut editor = editor_with(three_text_blocks());

	assert!(!editor.move_block(from, to));
	assert_eq!(top_level_contents(&editor), vec!["a", "b", "c"]);
	assert_eq!(editor.history_len(), 1);
	assert!(!editor.is_dirty());
}

#[test]
fn move_block_places_the_block_at_the_target_index() {
	let mut editor = editor_with(three_text_blocks());

	editor.move_block(0, 2);
	assert_eq!(top_level_contents(&editor), vec!["b", "c", "a"]);
}

#[test]
fn duplicate_block_inserts_a_copy_after_the_original() {
	let mut editor = editor_with(three_text_blocks());
	let original_id = editor.blocks()[1].id().to_string();

	let copy_id = editor
		.duplicate_block(&original_id)
		.unwrap_or_else(|| panic!("block should be duplicated"));

	assert_eq!(editor.blocks().len(), 4);
	assert_eq!(editor.blocks()[2].id(), copy_id);
	assert_eq!(editor.blocks()[2].props(), editor.blocks()[1].props());
	assert_ne!(copy_id, original_id);
	assert_eq!(editor.selection(), &Selection::Block(copy_id));
}

#[test]
fn duplicate_row_mints_fresh_ids_throughout() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[2, 1]);
	let row_id = row.id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.duplicate_block(&row_id);

	let ids = all_ids(editor.blocks());
	let unique: HashSet<&String> = ids.iter().collect();
	assert_eq!(ids.len(), 12);
	assert_eq!(unique.len(), ids.len());
}

#[test]
fn duplicate_block_in_column_inserts_after_the_original() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[2, 0]);
	let row_id = row.id.clone();
	let column = column_id(&row, 0);
	let block_id = row.props.columns[0].blocks[0].id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	let copy_id = editor.duplicate_block_in_column(&row_id, &column, &block_id);

	let row = first_row(&editor);
	assert_eq!(column_contents(row, 0), vec!["c0b0", "c0b0", "c0b1"]);
	assert_eq!(copy_id.as_deref(), Some(row.props.columns[0].blocks[1].id.as_str()));
}

#[test]
fn add_then_remove_restores_the_block_list() {
	let mut editor = editor_with(three_text_blocks());
	let before = editor.blocks().to_vec();

	let id = editor.add_block(BlockKind::Button, Some(1));
	assert_eq!(editor.blocks().len(), 4);
	assert_eq!(editor.selection(), &Selection::Block(id.clone()));

	assert!(editor.remove_block(&id));
	assert_eq!(editor.blocks(), before.as_slice());
	assert_eq!(editor.selection(), &Selection::None);
}

#[test]
fn add_block_clamps_the_index_and_uses_kind_defaults() {
	let mut editor = editor_with(three_text_blocks());

	let id = editor.add_block(BlockKind::Button, Some(99));

	let last = editor.blocks().last().unwrap_or_else(|| panic!("expected blocks"));
	assert_eq!(last.id(), id);
	assert_eq!(last.props(), default_props(&BlockKind::Button));
}

#[test]
fn add_block_to_column_never_nests_rows() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[0, 0]);
	let row_id = row.id.clone();
	let column = column_id(&row, 0);
	let mut editor = editor_with(vec![Block::Row(row)]);

	assert_eq!(editor.add_block_to_column(&row_id, &column, BlockKind::Row, None), None);
	assert!(editor.add_block_to_column(&row_id, &column, BlockKind::Image, None).is_some());
	assert_eq!(first_row(&editor).props.content_block_count(), 1);
	assert_eq!(editor.history_len(), 2);
}

#[rstest]
#[case(ColumnPreset::OneColumn)]
#[case(ColumnPreset::TwoEqual)]
#[case(ColumnPreset::TwoLeftHeavy)]
#[case(ColumnPreset::TwoRightHeavy)]
#[case(ColumnPreset::ThreeEqual)]
#[case(ColumnPreset::Custom)]
fn update_columns_preset_keeps_every_content_block(#[case] preset: ColumnPreset) {
	let row = row_with_blocks(ColumnPreset::ThreeEqual, &[1, 2, 3]);
	let row_id = row.id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	assert!(editor.update_columns_preset(&row_id, preset));

	let row = first_row(&editor);
	assert_eq!(row.props.content_block_count(), 6);
	assert_eq!(row.props.preset, preset);
	if let Some(widths) = preset.widths() {
		let actual: Vec<&str> = row.props.columns.iter().map(|column| column.width.as_str()).collect();
		assert_eq!(actual, widths.to_vec());
	}
}

#[test]
fn switching_to_one_column_keeps_blocks_in_order() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[3, 0]);
	let row_id = row.id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.update_columns_preset(&row_id, ColumnPreset::OneColumn);

	let row = first_row(&editor);
	assert_eq!(row.props.columns.len(), 1);
	assert_eq!(column_contents(row, 0), vec!["c0b0", "c0b1", "c0b2"]);
}

#[test]
fn shrinking_a_row_appends_overflow_to_the_last_column() {
	let row = row_with_blocks(ColumnPreset::ThreeEqual, &[1, 1, 1]);
	let row_id = row.id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.update_columns_preset(&row_id, ColumnPreset::TwoLeftHeavy);

	let row = first_row(&editor);
	assert_eq!(column_contents(row, 0), vec!["c0b0"]);
	assert_eq!(column_contents(row, 1), vec!["c1b0", "c2b0"]);
}

#[test]
fn update_column_widths_switches_to_custom() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[0, 0]);
	let row_id = row.id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.update_column_widths(&row_id, &["70%".to_string(), "30%".to_string()]);

	let row = first_row(&editor);
	assert_eq!(row.props.preset, ColumnPreset::Custom);
	assert_eq!(row.props.columns[0].width, "70%");
	assert_eq!(row.props.columns[1].width, "30%");
}

#[test]
fn undo_returns_to_the_initial_state_and_redo_replays() {
	let initial = three_text_blocks();
	let mut editor = editor_with(initial.clone());
	let first_id = initial[0].id().to_string();

	editor.add_block(BlockKind::Heading, None);
	editor.move_block(0, 3);
	editor.duplicate_block(&first_id);
	editor.remove_block(&first_id);
	let edited = editor.blocks().to_vec();

	for _ in 0..4 {
		assert!(editor.undo());
	}
	assert!(!editor.undo());
	assert!(!editor.can_undo());
	assert_eq!(editor.blocks(), initial.as_slice());

	for _ in 0..4 {
		assert!(editor.redo());
	}
	assert!(!editor.can_redo());
	assert_eq!(editor.blocks(), edited.as_slice());
}

#[test]
fn a_new_edit_discards_the_redo_branch() {
	let mut editor = editor_with(three_text_blocks());

	editor.add_block(BlockKind::Text, None);
	editor.add_block(BlockKind::Text, None);
	editor.undo();
	assert!(editor.can_redo());

	editor.add_block(BlockKind::Spacer, None);

	assert!(!editor.can_redo());
	assert_eq!(editor.history_len(), 3);
	assert_eq!(editor.history_index(), 2);
}

#[test]
fn update_block_marks_dirty_without_recording_history() {
	let mut editor = editor_with(three_text_blocks());
	let id = editor.blocks()[0].id().to_string();

	assert!(editor.update_block(&id, props(json!({ "content": "changed" }))));

	assert!(editor.is_dirty());
	assert_eq!(editor.history_len(), 1);
	assert_eq!(top_level_contents(&editor), vec!["changed", "b", "c"]);
}

#[test]
fn history_snapshots_are_independent_of_the_live_tree() {
	let mut editor = editor_with(Vec::new());
	let id = editor.add_block(BlockKind::Text, None);

	editor.update_block(&id, props(json!({ "content": "edited" })));
	editor.undo();
	editor.redo();

	assert_eq!(top_level_contents(&editor), vec![""]);
}

#[test]
fn update_block_reaches_nested_blocks() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[0, 2]);
	let nested_id = row.props.columns[1].blocks[1].id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	assert!(editor.update_block(&nested_id, props(json!({ "content": "nested" }))));

	assert_eq!(column_contents(first_row(&editor), 1), vec!["c1b0", "nested"]);
	let found = editor.block_by_id(&nested_id).map(|block| block.kind());
	assert_eq!(found, Some(BlockKind::Text));
}

#[test]
fn lookup_misses_are_silent_no_ops() {
	let mut editor = editor_with(three_text_blocks());

	assert!(!editor.update_block("missing", Props::new()));
	assert!(!editor.remove_block("missing"));
	assert!(!editor.remove_block_from_column("row", "column", "missing"));
	assert_eq!(editor.duplicate_block("missing"), None);
	assert!(!editor.update_columns_preset("missing", ColumnPreset::OneColumn));
	assert!(!editor.move_block_from_column_to_canvas("row", "column", "missing", 0));
	assert!(editor.block_by_id("missing").is_none());

	assert_eq!(editor.history_len(), 1);
	assert!(!editor.is_dirty());
}

#[test]
fn blocks_move_between_columns_and_rows() {
	let first = row_with_blocks(ColumnPreset::TwoEqual, &[2, 0]);
	let second = row_with_blocks(ColumnPreset::OneColumn, &[1]);
	let (first_id, second_id) = (first.id.clone(), second.id.clone());
	let (left, right) = (column_id(&first, 0), column_id(&first, 1));
	let target = column_id(&second, 0);
	let moving = first.props.columns[0].blocks[0].id.clone();
	let mut editor = editor_with(vec![Block::Row(first), Block::Row(second)]);

	assert!(editor.move_block_between_columns(&first_id, &left, &right, &moving, 0));
	let rows: Vec<&RowBlock> = editor.blocks().iter().filter_map(Block::as_row).collect();
	assert_eq!(column_contents(rows[0], 0), vec!["c0b1"]);
	assert_eq!(column_contents(rows[0], 1), vec!["c0b0"]);

	assert!(editor.move_block_between_rows(&first_id, &right, &second_id, &target, &moving, 99));
	let rows: Vec<&RowBlock> = editor.blocks().iter().filter_map(Block::as_row).collect();
	assert_eq!(column_contents(rows[0], 1), Vec::<String>::new());
	assert_eq!(column_contents(rows[1], 0), vec!["c0b0", "c0b0"]);
}

#[test]
fn blocks_move_between_canvas_and_columns() {
	let row = row_with_blocks(ColumnPreset::OneColumn, &[0]);
	let row_id = row.id.clone();
	let column = column_id(&row, 0);
	let text = top_level_text("loose");
	let text_id = text.id().to_string();
	let mut editor = editor_with(vec![text, Block::Row(row)]);

	assert!(editor.move_block_from_canvas_to_column(&text_id, &row_id, &column, 0));
	assert_eq!(editor.blocks().len(), 1);
	assert_eq!(column_contents(first_row(&editor), 0), vec!["loose"]);
	assert_eq!(editor.selection(), &Selection::Block(text_id.clone()));

	editor.select_block(None);
	assert!(editor.move_block_from_column_to_canvas(&row_id, &column, &text_id, 1));
	assert_eq!(editor.blocks().len(), 2);
	assert_eq!(editor.blocks()[1].id(), text_id);
	assert_eq!(editor.selection(), &Selection::Block(text_id));
}

#[test]
fn rows_cannot_move_into_columns() {
	let target = row_with_blocks(ColumnPreset::OneColumn, &[0]);
	let other = row_with_blocks(ColumnPreset::OneColumn, &[0]);
	let (target_id, other_id) = (target.id.clone(), other.id.clone());
	let column = column_id(&target, 0);
	let mut editor = editor_with(vec![Block::Row(target), Block::Row(other)]);

	assert!(!editor.move_block_from_canvas_to_column(&other_id, &target_id, &column, 0));
	assert_eq!(editor.blocks().len(), 2);
}

#[test]
fn dropping_a_canvas_block_accounts_for_its_removal() {
	let mut editor = editor_with(three_text_blocks());
	let first = editor.blocks()[0].id().to_string();

	editor.start_drag(DragSource::Canvas { block_id: first });
	editor.set_drop_target(Some(DropTarget::Canvas { index: 2 }));
	assert!(editor.drop(DropTarget::Canvas { index: 2 }));

	assert_eq!(top_level_contents(&editor), vec!["b", "a", "c"]);
	assert_eq!(editor.drag(), &DragState::default());
}

#[test]
fn dropping_within_a_column_accounts_for_its_removal() {
	let row = row_with_blocks(ColumnPreset::OneColumn, &[3]);
	let row_id = row.id.clone();
	let column = column_id(&row, 0);
	let block_id = row.props.columns[0].blocks[0].id.clone();
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.start_drag(DragSource::Nested {
		row_id: row_id.clone(),
		column_id: column.clone(),
		block_id,
	});
	assert!(editor.drop(DropTarget::Column {
		row_id,
		column_id: column,
		index: 3,
	}));

	assert_eq!(column_contents(first_row(&editor), 0), vec!["c0b1", "c0b2", "c0b0"]);
}

#[test]
fn dropping_a_palette_row_onto_a_column_is_rejected() {
	let row = row_with_blocks(ColumnPreset::OneColumn, &[0]);
	let row_id = row.id.clone();
	let column = column_id(&row, 0);
	let mut editor = editor_with(vec![Block::Row(row)]);

	editor.start_drag(DragSource::Palette(BlockKind::Row));
	assert!(!editor.drop(DropTarget::Column {
		row_id,
		column_id: column,
		index: 0,
	}));
	assert_eq!(first_row(&editor).props.content_block_count(), 0);
	assert!(!editor.drag().is_dragging());

	editor.start_drag(DragSource::Palette(BlockKind::Divider));
	assert!(editor.drop(DropTarget::Canvas { index: 0 }));
	assert_eq!(editor.blocks()[0].kind(), BlockKind::Divider);
}

#[test]
fn cancel_drag_resets_the_drag_state() {
	let mut editor = editor_with(three_text_blocks());

	editor.start_drag(DragSource::Palette(BlockKind::Text));
	editor.set_drop_target(Some(DropTarget::Canvas { index: 0 }));
	editor.cancel_drag();

	assert_eq!(editor.drag(), &DragState::default());
	assert!(!editor.drop(DropTarget::Canvas { index: 0 }));
	assert_eq!(editor.blocks().len(), 3);
}

#[test]
fn block_and_column_selection_are_exclusive() {
	let mut editor = editor_with(three_text_blocks());

	editor.select_block(Some("a"));
	editor.select_column(Some(("row", "column")));
	assert_eq!(
		editor.selection(),
		&Selection::Column {
			row_id: "row".into(),
			column_id: "column".into(),
		}
	);

	editor.select_block(None);
	assert!(matches!(editor.selection(), Selection::Column { .. }));

	editor.select_block(Some("a"));
	assert_eq!(editor.selection(), &Selection::Block("a".into()));

	editor.clear_column_selection();
	assert_eq!(editor.selection(), &Selection::Block("a".into()));
}

#[test]
fn add_blocks_at_end_reissues_colliding_ids() {
	let blocks = three_text_blocks();
	let mut editor = editor_with(blocks.clone());

	editor.add_blocks_at_end(blocks.clone(), false);

	let ids = all_ids(editor.blocks());
	assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 6);
	assert_eq!(top_level_contents(&editor), vec!["a", "b", "c", "a", "b", "c"]);

	assert_eq!(editor.selection(), &Selection::Block(editor.blocks()[3].id().to_string()));
	assert_ne!(editor.blocks()[3].id(), blocks[0].id());

	let only = top_level_text("only");
	let only_id = only.id().to_string();
	editor.add_blocks_at_end(vec![only], true);
	assert_eq!(top_level_contents(&editor), vec!["only"]);
	assert_eq!(editor.selection(), &Selection::Block(only_id));
}

#[test]
fn update_settings_merges_without_history() {
	let mut editor = editor_with(Vec::new());

	assert!(editor.update_settings(props(json!({ "contentWidth": 640 }))));
	assert!(!editor.update_settings(props(json!({ "contentWidth": "wide" }))));

	assert_eq!(editor.settings().content_width, 640);
	assert_eq!(editor.settings().font_family, "Arial, sans-serif");
	assert_eq!(editor.history_len(), 1);
	assert!(editor.is_dirty());

	editor.mark_clean();
	assert!(!editor.is_dirty());
}

#[test]
fn row_and_column_styles_merge_partial_updates() {
	let row = row_with_blocks(ColumnPreset::TwoEqual, &[0, 0]);
	let row_id = row.id.clone();
	let column = column_id(&row, 1);
	let mut editor = editor_with(vec![Block::Row(row)]);

	assert!(editor.update_row_style(&row_id, props(json!({ "backgroundColor": "#000000" }))));
	assert!(editor.update_column_style(&row_id, &column, props(json!({ "verticalAlign": "middle" }))));

	let row = first_row(&editor);
	assert_eq!(row.props.style.background_color.as_deref(), Some("#000000"));
	assert_eq!(row.props.style.text_align.as_deref(), Some("left"));
	let style = row.props.columns[1].style.clone().unwrap_or_default();
	assert_eq!(style.vertical_align.as_deref(), Some("middle"));
}

#[test]
fn export_document_is_a_deep_copy() {
	let mut editor = editor_with(three_text_blocks());
	let exported = editor.export_document();

	editor.remove_block(&exported.blocks[0].id().to_string());

	assert_eq!(exported.version, DOCUMENT_VERSION);
	assert_eq!(exported.blocks.len(), 3);
}

#[rstest]
#[case::plain("{{x}}", json!({ "x": "v" }), "v")]
#[case::default_pipe("{{x|default:none}}", json!({}), "none")]
#[case::default_then_uppercase("{{x|default:none|uppercase}}", json!({}), "NONE")]
#[case::last_default_wins("{{x|default:first|default:last}}", json!({ "x": "" }), "last")]
#[case::uppercase("{{x|uppercase}}", json!({ "x": "ab" }), "AB")]
#[case::number_two_decimals("{{n|number:2}}", json!({ "n": 1234.5 }), "1,234.50")]
#[case::number_rounds("{{n|number}}", json!({ "n": 1234.5678 }), "1,235")]
#[case::number_and_currency_of_nothing("[{{price|number:2}}][{{gone|currency}}]", json!({}), "[][]")]
#[case::number_of_empty_string("{{n|number:2}}", json!({ "n": "" }), "")]
#[case::number_of_text("{{n|number}}", json!({ "n": "lots" }), "0")]
#[case::number_precision_overflow("{{n|number:4294967297}}", json!({ "n": 1.5 }), "2")]
#[case::number_precision_capped("{{n|number:25}}", json!({ "n": 1.5 }), "1.50000000000000000000")]
#[case::truncate("{{s|truncate:5}}", json!({ "s": "Hello world" }), "Hello...")]
#[case::truncate_short("{{s|truncate:50}}", json!({ "s": "Hello" }), "Hello")]
#[case::capitalize("{{s|capitalize}}", json!({ "s": "hello wORLD" }), "Hello World")]
#[case::date("{{d|date:Y/m/d}}", json!({ "d": "2024-01-15" }), "2024/01/15")]
#[case::date_argument_with_colon("{{d|date:H:i}}", json!({ "d": "2024-01-15 10:30:00" }), "10:30")]
#[case::date_unparseable("{{d|date}}", json!({ "d": "soon" }), "soon")]
#[case::currency("{{p|currency:EUR}}", json!({ "p": 1234.5 }), "€1,234.50")]
#[case::currency_unknown_code("{{p|currency:XYZ}}", json!({ "p": 5 }), "XYZ 5.00")]
#[case::count("{{items|count}}", json!({ "items": [1, 2, 3] }), "3")]
#[case::dotted_path("{{user.name}}", json!({ "user": { "name": "Ada" } }), "Ada")]
#[case::array_index("{{items.1}}", json!({ "items": ["a", "b"] }), "b")]
#[case::missing("{{missing}}", json!({}), "")]
#[case::boolean("{{flag}}", json!({ "flag": true }), "true")]
#[case::list("{{list}}", json!({ "list": [1, 2] }), "[1,2]")]
#[case::unknown_formatter("{{x|sparkle}}", json!({ "x": "v" }), "v")]
#[case::repeated("{{x}}-{{x}}", json!({ "x": "v" }), "v-v")]
fn process_resolves_tags(#[case] content: &str, #[case] input: Value, #[case] expected: &str) {
	let processor = TagProcessor::default();

	assert_eq!(processor.process(content, &data(input)), expected);
}

#[rstest]
#[case::if_true("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": true }), "Y")]
#[case::if_false("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": false }), "N")]
#[case::if_absent("{{#if a}}Y{{else}}N{{/if}}", json!({}), "N")]
#[case::if_without_else("[{{#if a}}Y{{/if}}]", json!({ "a": 0 }), "[]")]
#[case::unless_false("{{#unless a}}Y{{/unless}}", json!({ "a": false }), "Y")]
#[case::unless_true("{{#unless a}}Y{{/unless}}", json!({ "a": "yes" }), "")]
#[case::string_zero("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": "0" }), "N")]
#[case::string_false("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": "FALSE" }), "N")]
#[case::empty_list("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": [] }), "N")]
#[case::object("{{#if a}}Y{{else}}N{{/if}}", json!({ "a": { "k": 1 } }), "Y")]
#[case::tags_in_body("{{#if user}}Hi {{user.name}}{{/if}}", json!({ "user": { "name": "Ada" } }), "Hi Ada")]
#[case::unclosed("{{#if a}}Y", json!({ "a": true }), "{{#if a}}Y")]
fn process_resolves_conditionals(#[case] content: &str, #[case] input: Value, #[case] expected: &str) {
	let processor = TagProcessor::default();

	assert_eq!(processor.process(content, &data(input)), expected);
}

#[test]
fn global_tags_fill_in_missing_data() {
	let mut registry = TagRegistry::with_defaults();
	registry.register_value("app_name", "Acme");
	let processor = TagProcessor::new(registry, FormatterRegistry::new());

	let year = chrono::Local::now().year().to_string();
	assert_eq!(
		processor.process("{{app_name}} {{current_year}}", &TagData::new()),
		format!("Acme {year}")
	);
	assert_eq!(
		processor.process("{{app_name}}", &data(json!({ "app_name": "Override" }))),
		"Override"
	);
}

#[test]
fn producers_run_on_every_resolve() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let mut registry = TagRegistry::new();
	registry.register_tag(
		"ticket",
		GlobalTag::new(TagValue::producer(move || {
			Value::from(counter.fetch_add(1, Ordering::SeqCst) + 1)
		})),
	);
	let processor = TagProcessor::new(registry, FormatterRegistry::new());

	assert_eq!(processor.process("{{ticket}}", &TagData::new()), "1");
	assert_eq!(processor.process("{{ticket}}", &TagData::new()), "2");
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn register_tags_reads_literals_and_definitions() {
	let mut registry = TagRegistry::new();
	registry.register_tags(&data(json!({
		"app_name": "Acme",
		"support_email": { "value": "help@acme.test", "description": "Where to write" },
	})));

	let editor_tags = registry.tags_for_editor();
	assert_eq!(editor_tags.len(), 2);
	assert_eq!(editor_tags[0].label, "App Name");
	assert_eq!(editor_tags[0].example, json!("Acme"));
	assert_eq!(editor_tags[1].label, "Support Email");
	assert_eq!(editor_tags[1].description, "Where to write");
	assert!(editor_tags.iter().all(|tag| tag.global));
}

#[rstest]
#[case::zero(json!(0))]
#[case::false_value(json!(false))]
#[case::text(json!("Ada"))]
#[case::empty_list(json!([]))]
fn required_tags_accept_any_non_blank_value(#[case] value: Value) -> MailsmithResult<()> {
	let processor = TagProcessor::default();

	processor.validate_required_tags(&welcome_template(), &data(json!({ "name": value })))
}

#[rstest]
#[case::absent(json!({}))]
#[case::null(json!({ "name": null }))]
#[case::empty(json!({ "name": "" }))]
fn required_tags_reject_blank_values(#[case] input: Value) {
	let processor = TagProcessor::default();

	let result = processor.validate_required_tags(&welcome_template(), &data(input));

	match result {
		Err(MailsmithError::MissingRequiredTags { template, missing }) => {
			assert_eq!(template, "welcome-email");
			assert_eq!(missing, vec!["name"]);
		}
		other => panic!("expected missing required tags, got {other:?}"),
	}
}

#[test]
fn required_tags_can_be_satisfied_by_globals() -> MailsmithResult<()> {
	let mut registry = TagRegistry::new();
	registry.register_value("name", "Everyone");
	let processor = TagProcessor::new(registry, FormatterRegistry::new());

	processor.validate_required_tags(&welcome_template(), &TagData::new())
}

#[test]
fn extract_tags_from_content_walks_nested_values() {
	let content = json!({
		"blocks": [
			{ "props": { "content": "{{#if vip}}Hi {{ name }}{{else}}x{{/if}}" } },
			{ "props": { "items": ["{{order.total|currency}}", 4, null, "{{name}}"] } },
		]
	});

	assert_eq!(extract_tags_from_content(&content), vec!["name", "order.total"]);
}

#[test]
fn tag_parser_keeps_colons_inside_arguments() {
	let tags = extract_tags("{{a}} {{b|date:10:30:00|upper}}");

	assert_eq!(tags.len(), 2);
	assert_eq!(tags[1].key, "b");
	assert_eq!(tags[1].pipes, vec![
		Pipe::new("date", Some("10:30:00")),
		Pipe::new("upper", None),
	]);
	assert_eq!(tags[1].start, 6);
	assert!(has_tags("{{a}}"));
	assert!(!has_tags("{{ a }}"));
	assert_eq!(extract_variable_keys("{{a}}{{b}}{{a|uppercase}}"), vec!["a", "b"]);
}

#[test]
fn tag_parser_extracts_conditionals() {
	let conditionals = extract_conditionals("x {{#unless paid}}Pay{{else}}Thanks{{/unless}} y");

	assert_eq!(conditionals.len(), 1);
	assert_eq!(conditionals[0].kind, ConditionalType::Unless);
	assert_eq!(conditionals[0].condition, "paid");
	assert_eq!(conditionals[0].truthy, "Pay");
	assert_eq!(conditionals[0].falsy.as_deref(), Some("Thanks"));
	assert_eq!(conditionals[0].full, "{{#unless paid}}Pay{{else}}Thanks{{/unless}}");
	assert!(has_conditionals("{{#if a}}{{/if}}"));
	assert!(!has_conditionals("{{#if a}}"));
}

#[test]
fn merge_tag_processor_leaves_unknown_tags() {
	let mut registry = TagRegistry::new();
	registry.register_value("app_name", "Acme");
	let processor = MergeTagProcessor::new(registry);

	let subject = processor.process(
		"{{app_name}}: {{name}} {{missing}} {{x|uppercase}}",
		&data(json!({ "name": "Ada" })),
	);

	assert_eq!(subject, "Acme: Ada {{missing}} {{x|uppercase}}");
	assert_eq!(processor.extract_variables("{{a}} {{b}} {{a}}"), vec!["a", "b"]);
}

#[test]
fn formatter_registry_supports_custom_and_overridden_formatters() {
	let mut registry = FormatterRegistry::new();
	assert_eq!(registry.names().len(), 9);

	registry.register_fn("reverse", |value, _| {
		value.as_str().unwrap_or_default().chars().rev().collect()
	});
	registry.register_fn("uppercase", |_, _| "shouting".to_string());

	assert!(registry.has("reverse"));
	assert_eq!(registry.apply("reverse", &json!("abc"), None), "cba");
	assert_eq!(registry.apply("uppercase", &json!("abc"), None), "shouting");
	assert_eq!(registry.apply("missing", &json!(12), None), "12");
	assert_eq!(registry.apply("missing", &json!([1]), None), "");
}

#[rstest]
#[case(0.0, 0, "0")]
#[case(999.0, 0, "999")]
#[case(1000.0, 0, "1,000")]
#[case(-1234567.891, 2, "-1,234,567.89")]
#[case(2.5, 0, "3")]
#[case(-0.001, 2, "0.00")]
fn format_number_groups_and_rounds(#[case] number: f64, #[case] decimals: usize, #[case] expected: &str) {
	assert_eq!(format_number(number, decimals), expected);
}

#[rstest]
#[case(json!(null), "0")]
#[case(json!("hello"), "5")]
#[case(json!({ "a": 1, "b": 2 }), "2")]
#[case(json!(42), "1")]
fn count_formatter_counts(#[case] value: Value, #[case] expected: &str) {
	assert_eq!(CountFormatter.format(&value, None), expected);
}

#[test]
fn date_formatter_reads_timestamps() {
	assert_eq!(DateFormatter.format(&json!(0), Some("Y-m-d H:i")), "1970-01-01 00:00");
	assert_eq!(DateFormatter.format(&json!("2024-03-05T08:09:10Z"), Some("j F Y")), "5 March 2024");
	assert_eq!(DateFormatter.format(&json!(""), None), "");
}

#[rstest]
#[case::strips_scripts_and_handlers(
	r#"<p onclick="x()">Hi <script>alert(1)</script><b>there</b></p>"#,
	"<p>Hi <b>there</b></p>"
)]
#[case::unsafe_href(
	r#"<a href="javascript:alert(1)" target="_blank">x</a>"#,
	r##"<a href="#" target="_blank">x</a>"##
)]
#[case::unknown_tags_and_attributes(
	r#"<div><span style="color:red" class="c">t</span><br/></div>"#,
	r#"<span style="color:red">t</span><br />"#
)]
#[case::comments_and_images("<!-- note --><img src=x onerror=y>ok", "ok")]
#[case::unterminated_tag("<p>hi</p><img src=x onerror=alert(1)", "<p>hi</p>")]
#[case::unterminated_allowed_tag("<b>bold</b><a href=x onclick=alert(1)", "<b>bold</b>")]
fn sanitize_html_keeps_only_allowed_markup(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(sanitize_html(input), expected);
}

#[rstest]
#[case("https://example.com", true)]
#[case("mailto:a@b.test", true)]
#[case("JavaScript:alert(1)", false)]
#[case("  data:text/html;base64,xyz", false)]
#[case("vbscript:msgbox", false)]
fn url_safety(#[case] url: &str, #[case] safe: bool) {
	assert_eq!(is_url_safe(url), safe);
}

fn render(kind: BlockKind, input: Value) -> String {
	BlockRegistry::new().render_props(&kind, &props(input), &TagData::new())
}

#[test]
fn text_renderer_sanitizes_content() {
	let markup = render(BlockKind::Text, json!({ "content": "Hi <b>x</b><script>y</script>" }));

	insta::assert_snapshot!(markup, @r##"<mj-text align="left" color="#333333" font-size="16px" font-weight="normal" line-height="1.5" padding="10px 0px 10px 0px">Hi <b>x</b></mj-text>"##);
}

#[test]
fn heading_renderer_escapes_content() {
	let markup = render(BlockKind::Heading, json!({ "content": "<b>A & B</b>", "level": "h2" }));

	assert!(markup.contains("<h2>&lt;b&gt;A &amp; B&lt;/b&gt;</h2>"));
	assert!(markup.contains(r#"font-size="28px""#));
	assert!(markup.contains(r#"font-weight="700""#));
}

#[test]
fn button_renderer_neutralizes_unsafe_links() {
	let markup = render(
		BlockKind::Button,
		json!({ "text": "Go", "href": "javascript:alert(1)", "variant": "outline" }),
	);

	assert!(markup.contains(r##"href="#""##));
	assert!(markup.contains(r#"background-color="transparent""#));
	assert!(markup.contains(r#"border="2px solid #3b82f6""#));
	assert!(markup.ends_with(">Go</mj-button>"));
}

#[rstest]
#[case::image_without_src(BlockKind::Image, json!({ "src": "" }))]
#[case::video_without_thumbnail(BlockKind::Video, json!({ "videoUrl": "https://example.com/clip.mp4" }))]
#[case::html_without_content(BlockKind::Html, json!({}))]
#[case::social_without_links(BlockKind::Social, json!({}))]
fn missing_visual_input_renders_nothing(#[case] kind: BlockKind, #[case] input: Value) {
	assert_eq!(render(kind, input), "");
}

#[test]
fn divider_style_none_renders_a_spacer() {
	assert_eq!(render(BlockKind::Divider, json!({ "style": "none" })), r#"<mj-spacer height="40px" />"#);
}

#[test]
fn html_renderer_keeps_raw_markup() {
	let markup = render(BlockKind::Html, json!({ "content": "<table onclick=\"x\"></table>" }));

	assert!(markup.contains("<mj-raw><table onclick=\"x\"></table></mj-raw>"));
}

#[rstest]
#[case("https://www.youtube.com/watch?v=abc123&t=5", Some("https://img.youtube.com/vi/abc123/maxresdefault.jpg"))]
#[case("https://youtu.be/abc123", Some("https://img.youtube.com/vi/abc123/maxresdefault.jpg"))]
#[case("https://youtube.com/shorts/xyz", Some("https://img.youtube.com/vi/xyz/maxresdefault.jpg"))]
#[case("https://vimeo.com/12345", Some("https://vumbnail.com/12345.jpg"))]
#[case("https://example.com/clip.mp4", None)]
fn video_thumbnails(#[case] url: &str, #[case] expected: Option<&str>) {
	assert_eq!(VideoRenderer::thumbnail_for(url).as_deref(), expected);
}

#[test]
fn social_renderer_only_renders_enabled_links() {
	let markup = render(
		BlockKind::Social,
		json!({
			"links": [
				{ "platform": "facebook", "url": "https://facebook.com/acme", "enabled": true },
				{ "platform": "twitter", "url": "", "enabled": true },
				{ "platform": "linkedin", "url": "https://linkedin.com/acme", "enabled": false },
			]
		}),
	);

	assert!(markup.contains("https://cdn.simpleicons.org/facebook/1877F2"));
	assert!(!markup.contains("simpleicons.org/x/"));
	assert!(!markup.contains("linkedin"));
}

#[rstest]
#[case::first_of_two(0, 2, Some("0px 5px 0px 0px"))]
#[case::last_of_two(1, 2, Some("0px 0px 0px 5px"))]
#[case::middle_of_three(1, 3, Some("0px 5px 0px 5px"))]
#[case::single_column(0, 1, None)]
fn column_padding_splits_the_gap(#[case] index: usize, #[case] total: usize, #[case] expected: Option<&str>) {
	assert_eq!(column_padding(Padding::default(), 10.0, index, total).as_deref(), expected);
}

#[test]
fn row_renderer_renders_columns_in_order() {
	let mut row = row_with_blocks(ColumnPreset::TwoEqual, &[1, 1]);
	row.props.stack_on_mobile = false;

	let markup = BlockRegistry::new().render_block(&Block::Row(row), &TagData::new());

	assert!(markup.starts_with(
		r#"<mj-section padding="10px 10px 10px 10px" text-align="left" css-class="no-stack">"#
	));
	assert!(markup.contains(r#"<mj-column width="50%" vertical-align="top" padding="0px 5px 0px 0px">"#));
	let first = markup.find("c0b0").unwrap_or_default();
	let second = markup.find("c1b0").unwrap_or_default();
	assert!(first > 0 && first < second);
}

#[test]
fn row_background_images_must_be_safe() {
	let mut row = row_with_blocks(ColumnPreset::TwoEqual, &[0, 0]);
	row.props.style.background_image = Some("JavaScript:alert(2)".into());
	row.props.columns[0].style = Some(ColumnStyle {
		background_image: Some("javascript:alert(1)".into()),
		overlay_color: Some("#000000".into()),
		..ColumnStyle::default()
	});
	row.props.columns[1].style = Some(ColumnStyle {
		background_image: Some("https://example.com/bg.png".into()),
		..ColumnStyle::default()
	});

	let markup = BlockRegistry::new().render_block(&Block::Row(row), &TagData::new());

	assert!(!markup.to_ascii_lowercase().contains("javascript:"));
	assert_eq!(markup.matches("background-url=").count(), 1);
	assert!(markup.contains(r#"background-url="https://example.com/bg.png""#));
	assert!(!markup.contains("#808080"));
}

#[test]
fn column_overlay_blends_over_the_background() {
	assert_eq!(blend_overlay("#ffffff", "#000000", 0.5), "#808080");
	assert_eq!(blend_overlay("white", "#000000", 0.5), "white");
	assert_eq!(hex_to_rgb("#f00"), Some((255, 0, 0)));
}

#[test]
#[traced_test]
fn unregistered_block_types_render_nothing() {
	assert_eq!(render(BlockKind::from("countdown"), json!({})), "");
	assert!(logs_contain("skipping block without a registered renderer"));
}

#[test]
fn block_registry_lists_available_blocks() {
	let blocks = BlockRegistry::new().available_blocks();

	assert_eq!(blocks.len(), 10);
	assert!(blocks.iter().any(|block| block.kind == BlockKind::Row && block.label == "Row"));
	assert!(matches!(
		BlockRegistry::empty().renderer(&BlockKind::Text),
		Err(MailsmithError::UnknownBlockType(_))
	));
}

#[test]
fn block_catalogue_flags_nesting() {
	assert!(!can_block_nest(&BlockKind::Row));
	assert!(is_container_block(&BlockKind::Row));
	assert!(can_block_nest(&BlockKind::Custom("countdown".into())));
	let layout: Vec<BlockKind> = blocks_by_category(BlockCategory::Layout)
		.into_iter()
		.map(|info| info.kind)
		.collect();
	assert_eq!(layout, vec![BlockKind::Row]);
}

fn passthrough_renderer(tags: TagRegistry) -> TemplateRenderer {
	TemplateRenderer::new(
		BlockRegistry::new(),
		TagProcessor::new(tags, FormatterRegistry::new()),
		PassthroughCompiler,
	)
}

#[test]
fn rendered_template_has_no_surviving_tags() -> MailsmithResult<()> {
	let renderer = passthrough_renderer(TagRegistry::new());

	let html = renderer.render(&welcome_template(), &data(json!({ "name": "Ada" })))?;

	assert!(html.contains("Hi Ada"));
	assert!(!html.contains("{{"));
	Ok(())
}

#[test]
fn content_blocks_are_grouped_into_sections() {
	let renderer = passthrough_renderer(TagRegistry::new());
	let blocks = vec![
		top_level_text("a"),
		top_level_text("b"),
		Block::Row(row_with_blocks(ColumnPreset::OneColumn, &[1])),
		top_level_text("c"),
	];
	let settings = Settings {
		content_background_color: "#fafafa".into(),
		..Settings::default()
	};

	let markup = renderer.build_markup_from_content(&blocks, &settings, &TagData::new());

	let wrapper = r##"<mj-section background-color="#fafafa" padding="0"><mj-column>"##;
	assert_eq!(markup.matches(wrapper).count(), 2);
	assert!(markup.contains(r##"<mj-body background-color="#f5f5f5" width="600px">"##));
	assert!(markup.contains(r#"<mj-all font-family="Arial, sans-serif" />"#));
}

#[test]
fn preview_text_is_escaped() {
	let renderer = passthrough_renderer(TagRegistry::new());
	let mut template = welcome_template();
	template.preview_text = Some("A & B".into());

	let markup = renderer.build_markup(&template, &TagData::new());

	assert!(markup.contains("<mj-preview>A &amp; B</mj-preview>"));
}

struct FailingCompiler;

impl MarkupCompiler for FailingCompiler {
	fn compile(&self, _markup: &str) -> MailsmithResult<String> {
		Err(MailsmithError::Compiler("boom".into()))
	}
}

#[test]
#[traced_test]
fn compiler_failures_propagate() {
	let renderer = TemplateRenderer::new(BlockRegistry::new(), TagProcessor::default(), FailingCompiler);

	let result = renderer.render(&welcome_template(), &TagData::new());

	assert!(matches!(result, Err(MailsmithError::Compiler(_))));
	assert!(logs_contain("markup compilation failed"));
}

#[test]
fn missing_compiler_command_is_a_compiler_error() {
	let compiler = CommandCompiler::new("mailsmith-compiler-that-does-not-exist", Vec::new());

	assert!(matches!(compiler.compile("<mjml />"), Err(MailsmithError::Compiler(_))));
}

#[cfg(unix)]
#[test]
fn command_compiler_streams_large_documents() -> MailsmithResult<()> {
	let compiler = CommandCompiler::new("cat", Vec::new());
	let markup = "<mj-text>streamed</mj-text>\n".repeat(50_000);

	let html = compiler.compile(&markup)?;

	assert_eq!(html.len(), markup.len());
	assert!(html == markup);
	Ok(())
}

#[cfg(unix)]
#[test]
fn command_compiler_reports_a_failing_exit_status() {
	let compiler = CommandCompiler::new(
		"sh",
		vec!["-c".into(), "echo broken >&2; exit 3".into()],
	);
	let markup = "<mj-text>unread</mj-text>".repeat(50_000);

	match compiler.compile(&markup) {
		Err(MailsmithError::Compiler(message)) => assert!(message.contains("broken"), "{message}"),
		other => panic!("expected a compiler error, got {other:?}"),
	}
}

fn config_with_app_name() -> MailsmithResult<MailsmithConfig> {
	MailsmithConfig::parse(
		r#"
[merge_tags]
app_name = "Acme"
"#,
	)
}

#[test]
fn mailer_prepares_subject_and_body() -> MailsmithResult<()> {
	let mailer = Mailer::with_compiler(&config_with_app_name()?, PassthroughCompiler);

	let message = mailer.prepare(&welcome_template(), &data(json!({ "name": "Ada" })))?;

	assert_eq!(message.subject, "Welcome to Acme, Ada");
	assert!(message.html.contains("Hi Ada"));
	Ok(())
}

#[test]
fn mailer_checks_required_tags_when_enabled() -> MailsmithResult<()> {
	let mut config = config_with_app_name()?;
	let mailer = Mailer::with_compiler(&config, PassthroughCompiler);

	assert!(matches!(
		mailer.prepare(&welcome_template(), &TagData::new()),
		Err(MailsmithError::MissingRequiredTags { .. })
	));

	config.validation.required_tags = false;
	let mailer = Mailer::with_compiler(&config, PassthroughCompiler);
	let message = mailer.prepare(&welcome_template(), &TagData::new())?;
	assert_eq!(message.subject, "Welcome to Acme, {{name}}");
	Ok(())
}

#[test]
fn mailer_fills_missing_settings_from_config() -> MailsmithResult<()> {
	let config = MailsmithConfig::parse(
		r##"
[templates]
font_family = "Helvetica, sans-serif"
content_background_color = "#000000"
"##,
	)?;
	let mailer = Mailer::with_compiler(&config, PassthroughCompiler);
	let ada = data(json!({ "name": "Ada" }));

	let message = mailer.prepare(&welcome_template(), &ada)?;
	assert!(message.html.contains(r#"<mj-all font-family="Helvetica, sans-serif" />"#));
	assert!(message.html.contains(r##"<mj-section background-color="#000000" padding="0">"##));
	assert!(message.html.contains(r##"<mj-body background-color="#f5f5f5" width="600px">"##));

	let mut template = welcome_template();
	template.settings.font_family = Some("Georgia, serif".into());
	let message = mailer.prepare(&template, &ada)?;
	assert!(message.html.contains(r#"<mj-all font-family="Georgia, serif" />"#));
	assert!(message.html.contains(r##"background-color="#000000""##));
	Ok(())
}

#[test]
fn template_settings_only_serialize_what_was_set() -> MailsmithResult<()> {
	let template = MailTemplate::from_json(r#"{ "name": "Plain", "settings": { "contentWidth": 480 } }"#)?;

	assert_eq!(template.settings.content_width, Some(480));
	assert_eq!(template.settings.font_family, None);
	assert_eq!(
		serde_json::to_value(&template.settings)?,
		json!({ "contentWidth": 480 })
	);
	assert_eq!(template.settings.resolve(&Settings::default()).content_width, 480);
	Ok(())
}

#[test]
fn config_parses_every_section() -> MailsmithResult<()> {
	let config = MailsmithConfig::parse(
		r##"
[templates]
font_family = "Helvetica, sans-serif"
content_width = 640

[merge_tags]
app_name = "Acme"
support_email = { value = "help@acme.test", label = "Help" }

[validation]
required_tags = false

[compiler]
command = "npx"
args = ["mjml", "-i", "-s"]
"##,
	)?;

	assert_eq!(config.templates.font_family, "Helvetica, sans-serif");
	assert_eq!(config.templates.content_width, 640);
	assert_eq!(config.templates.background_color, "#f5f5f5");
	assert!(!config.validation.required_tags);
	assert_eq!(config.compiler.command, "npx");
	assert_eq!(config.compiler.args, vec!["mjml", "-i", "-s"]);

	let registry = config.tag_registry();
	assert!(registry.has_global_tag("current_year"));
	assert_eq!(registry.global_tag("support_email").map(|tag| tag.label.as_str()), Some("Help"));
	Ok(())
}

#[test]
fn config_defaults_when_sections_are_missing() -> MailsmithResult<()> {
	let config = MailsmithConfig::parse("")?;

	assert_eq!(config, MailsmithConfig::default());
	assert!(config.validation.required_tags);
	assert_eq!(config.compiler.command, "mjml");
	assert_eq!(config.templates.settings(), Settings::default());
	Ok(())
}

#[test]
fn config_load_discovers_candidates() -> AnyEmptyResult {
	let dir = tempfile::tempdir()?;

	assert!(MailsmithConfig::load(dir.path())?.is_none());

	std::fs::create_dir_all(dir.path().join(".config"))?;
	std::fs::write(dir.path().join(".config/mailsmith.toml"), "[templates]\ncontent_width = 500\n")?;
	let config = MailsmithConfig::load(dir.path())?.unwrap_or_default();
	assert_eq!(config.templates.content_width, 500);

	std::fs::write(dir.path().join("mailsmith.toml"), "[templates\n")?;
	assert!(matches!(
		MailsmithConfig::load(dir.path()),
		Err(MailsmithError::ConfigParse(_))
	));
	Ok(())
}

#[test]
fn valid_block_structure_has_no_errors() {
	assert!(validate_block_structure(&valid_block_json(), &BlockRegistry::new()).is_empty());
}

#[rstest]
#[case::not_an_array(json!({}), "blocks", BlockValidationErrorKind::BlocksNotArray)]
#[case::not_an_object(json!(["text"]), "blocks[0]", BlockValidationErrorKind::BlockNotObject)]
#[case::missing_id(json!([{ "type": "text", "props": {} }]), "blocks[0]", BlockValidationErrorKind::InvalidId)]
#[case::non_uuid_id(
	json!([{ "id": "abc", "type": "text", "props": {} }]),
	"blocks[0]",
	BlockValidationErrorKind::InvalidUuid
)]
#[case::missing_type(
	json!([{ "id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90", "props": {} }]),
	"blocks[0]",
	BlockValidationErrorKind::InvalidType
)]
#[case::unregistered_type(
	json!([{ "id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90", "type": "countdown", "props": {} }]),
	"blocks[0]",
	BlockValidationErrorKind::UnregisteredType { block_type: "countdown".into() }
)]
#[case::props_not_an_object(
	json!([{ "id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90", "type": "text", "props": [] }]),
	"blocks[0]",
	BlockValidationErrorKind::InvalidProps
)]
#[case::missing_image_src(
	json!([{ "id": "3f2b9a4e-8c1d-4b6a-9f0e-2d7c5a1b8e90", "type": "image", "props": { "src": "" } }]),
	"blocks[0]",
	BlockValidationErrorKind::MissingRequiredProp { block_type: "image".into(), prop: "src".into() }
)]
fn invalid_block_structures_are_reported(
	#[case] input: Value,
	#[case] path: &str,
	#[case] kind: BlockValidationErrorKind,
) {
	let errors = validate_block_structure(&input, &BlockRegistry::new());

	assert_eq!(errors, vec![BlockValidationError {
		path: path.to_string(),
		kind,
	}]);
}

#[test]
fn nested_block_errors_carry_their_path() {
	let mut input = valid_block_json();
	input[1]["props"]["columns"][1]["blocks"] = json!([
		{ "id": "nope", "type": "text", "props": {} },
		{ "id": "0c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f", "type": "row", "props": {} },
	]);
	input[1]["props"]["columns"][0]["blocks"][0]["props"]["href"] = Value::Null;

	let errors = validate_block_structure(&input, &BlockRegistry::new());
	let paths: Vec<String> = errors.iter().map(ToString::to_string).collect();

	assert_eq!(paths, vec![
		"blocks[1].props.columns[0].blocks[0]: `button` block requires `href`",
		"blocks[1].props.columns[1].blocks[0]: block id must be a uuid",
		"blocks[1].props.columns[1].blocks[1]: rows cannot be placed inside a column",
	]);
	assert!(matches!(
		ensure_valid_block_structure(&input, &BlockRegistry::new()),
		Err(MailsmithError::InvalidBlockStructure { errors }) if errors.len() == 3
	));
}

#[test]
fn template_tag_validation_reports_undefined_and_unused() {
	let content = json!([{ "props": { "content": "{{name}} {{coupon}} {{current_year}}" } }]);
	let tags = vec![TagDefinition::new("name").required(), TagDefinition::new("code").required()];
	let registry = TagRegistry::with_defaults();

	let report = check_template_tags(&content, &tags, &registry);

	assert_eq!(report.undefined, vec!["coupon"]);
	assert_eq!(report.unused_required, vec!["code"]);
	assert!(matches!(
		validate_template_tags(&content, &tags, &registry),
		Err(MailsmithError::InvalidTemplateTags { .. })
	));
	assert!(validate_template_tags(&content, &tags[..1], &{
		let mut registry = TagRegistry::with_defaults();
		registry.register_value("coupon", "SAVE10");
		registry
	})
	.is_ok());
}

#[test]
fn documents_round_trip_through_json() -> MailsmithResult<()> {
	let json = json!({ "version": "1.0", "blocks": valid_block_json() }).to_string();

	let document = Document::from_json(&json)?;

	assert_eq!(document.blocks.len(), 2);
	let row = document.blocks[1].as_row().unwrap_or_else(|| panic!("expected a row"));
	assert!(float_cmp::approx_eq!(f64, row.props.gap, 10.0));
	assert!(row.props.stack_on_mobile);
	assert_eq!(serde_json::to_value(&document)?["blocks"][1]["type"], json!("row"));
	Ok(())
}

#[test]
fn documents_reject_rows_inside_columns() {
	let mut blocks = valid_block_json();
	blocks[1]["props"]["columns"][1]["blocks"] = json!([
		{ "id": "0c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f", "type": "row", "props": {} },
	]);
	let json = json!({ "blocks": blocks }).to_string();

	assert!(Document::from_json(&json).is_err());
}

#[rstest]
#[case("Welcome Email", "welcome-email")]
#[case("  Order #42 -- Shipped! ", "order-42-shipped")]
#[case("Ünïcode Straße", "ünïcode-straße")]
fn slugify_collapses_separators(#[case] name: &str, #[case] expected: &str) {
	assert_eq!(slugify(name), expected);
}

#[test]
fn templates_load_from_json() -> MailsmithResult<()> {
	let template = MailTemplate::from_json(
		r#"{
			"name": "Password Reset",
			"subject": "Reset your password",
			"content": { "blocks": [] },
			"tags": [{ "key": "reset_url", "required": true, "type": "url" }]
		}"#,
	)?;

	assert_eq!(template.slug, "password-reset");
	assert!(template.is_active);
	assert_eq!(template.version(), "1.0");
	assert_eq!(template.required_tag_keys(), vec!["reset_url"]);
	assert_eq!(template.tag("reset_url").map(|tag| tag.tag_type), Some(TagType::Url));
	Ok(())
}
