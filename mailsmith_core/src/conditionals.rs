use crate::tag_parser::Conditional;
use crate::tag_parser::ConditionalType;
use crate::tag_parser::extract_conditionals;
use crate::values::TagData;
use crate::values::is_truthy;
use crate::values::resolve_path;

/// Replaces every conditional region with the branch its condition selects.
/// Regions are evaluated once, in a single left to right pass.
pub fn process_conditionals(content: &str, data: &TagData) -> String {
	let conditionals = extract_conditionals(content);

	if conditionals.is_empty() {
		return content.to_string();
	}

	let mut output = String::with_capacity(content.len());
	let mut cursor = 0;

	for conditional in &conditionals {
		output.push_str(&content[cursor..conditional.start]);
		output.push_str(evaluate_conditional(conditional, data));
		cursor = conditional.end;
	}

	output.push_str(&content[cursor..]);
	output
}

/// Returns the branch selected by the conditional's condition. A missing
/// `{{else}}` branch selects the empty string.
pub fn evaluate_conditional<'a>(conditional: &'a Conditional, data: &TagData) -> &'a str {
	let mut holds = is_truthy(resolve_path(&conditional.condition, data));

	if conditional.kind == ConditionalType::Unless {
		holds = !holds;
	}

	if holds {
		&conditional.truthy
	} else {
		conditional.falsy.as_deref().unwrap_or_default()
	}
}
