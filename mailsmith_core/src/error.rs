use miette::Diagnostic;
use thiserror::Error;

use crate::validation::BlockValidationError;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MailsmithError {
	#[error(transparent)]
	#[diagnostic(code(mailsmith::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid json: {0}")]
	#[diagnostic(code(mailsmith::json))]
	Json(#[from] serde_json::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mailsmith::config_parse),
		help("check that mailsmith.toml is valid TOML with [templates], [merge_tags], [validation] and/or [compiler] sections")
	)]
	ConfigParse(String),

	#[error("missing required tags for template `{template}`: {}", .missing.join(", "))]
	#[diagnostic(
		code(mailsmith::missing_required_tags),
		help("supply a non-empty value for every tag the template marks as required")
	)]
	MissingRequiredTags {
		template: String,
		missing: Vec<String>,
	},

	#[error("no renderer registered for block type: `{0}`")]
	#[diagnostic(
		code(mailsmith::unknown_block_type),
		help("built-in block types: text, heading, image, button, divider, spacer, html, video, social, row")
	)]
	UnknownBlockType(String),

	#[error("invalid block structure ({} error(s))", .errors.len())]
	#[diagnostic(code(mailsmith::invalid_block_structure))]
	InvalidBlockStructure { errors: Vec<BlockValidationError> },

	#[error(
		"invalid template tags: undefined [{}], required but unused [{}]",
		.undefined.join(", "),
		.unused_required.join(", ")
	)]
	#[diagnostic(
		code(mailsmith::invalid_template_tags),
		help("define every tag used in the content, and use every tag marked as required")
	)]
	InvalidTemplateTags {
		undefined: Vec<String>,
		unused_required: Vec<String>,
	},

	#[error("invalid props for `{block_type}` block: {reason}")]
	#[diagnostic(code(mailsmith::invalid_props))]
	InvalidProps { block_type: String, reason: String },

	#[error("markup compilation failed: {0}")]
	#[diagnostic(
		code(mailsmith::compiler),
		help("check that the configured compiler command is installed and accepts markup on stdin")
	)]
	Compiler(String),
}

pub type MailsmithResult<T> = Result<T, MailsmithError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
