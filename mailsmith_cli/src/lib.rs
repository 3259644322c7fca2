use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render and validate block based email templates.",
	long_about = "mailsmith renders email templates stored as JSON block documents into HTML.\n\nBlocks \
	              are rendered to MJML, compiled by an external `mjml` process and merge tags such \
	              as {{name|capitalize}} are resolved against a JSON data file.\n\nQuick start:\n  \
	              mailsmith init                      Create mailsmith.toml and a sample \
	              template\n  mailsmith validate template.json    Check blocks and tags\n  \
	              mailsmith render template.json -d data.json"
)]
pub struct MailsmithCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. Relative template and data paths
	/// are resolved against it.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `mailsmith.toml` and `template.json`.
	///
	/// Existing files are left untouched.
	Init,
	/// Render a template to HTML.
	///
	/// Required tags are checked first unless `[validation] required_tags`
	/// is disabled. The subject line is printed to stderr when the HTML goes
	/// to stdout.
	Render {
		/// The template JSON file.
		template: PathBuf,

		/// A JSON object with the values for the template's merge tags.
		#[arg(long, short)]
		data: Option<PathBuf>,

		/// Skip the markup compiler and emit the MJML document with tags
		/// resolved.
		#[arg(long, default_value_t = false)]
		markup_only: bool,

		/// Write the output to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Validate a template's block structure and merge tags.
	///
	/// Reports every structural problem with the path of the offending
	/// block, tags that are used but never defined and required tags the
	/// content never uses. Exits with a non-zero status when anything is
	/// wrong.
	Validate {
		/// The template JSON file.
		template: PathBuf,

		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List the merge tags a template uses, defines and can rely on
	/// globally.
	Tags {
		/// The template JSON file.
		template: PathBuf,

		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
