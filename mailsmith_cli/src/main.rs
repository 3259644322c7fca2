use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mailsmith_cli::Commands;
use mailsmith_cli::MailsmithCli;
use mailsmith_cli::OutputFormat;
use mailsmith_core::BlockRegistry;
use mailsmith_core::CONFIG_FILE_CANDIDATES;
use mailsmith_core::MailTemplate;
use mailsmith_core::Mailer;
use mailsmith_core::MailsmithConfig;
use mailsmith_core::PassthroughCompiler;
use mailsmith_core::TagData;
use mailsmith_core::TagDefinition;
use mailsmith_core::check_template_tags;
use mailsmith_core::extract_tags_from_content;
use mailsmith_core::validate_block_structure;
use owo_colors::OwoColorize;
use serde_json::Value;
use serde_json::json;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = r##"# mailsmith configuration

# Fallback settings for templates that do not define their own.
[templates]
font_family = "Arial, sans-serif"
background_color = "#f5f5f5"
content_background_color = "#ffffff"
content_width = 600

# Global merge tags, available to every template unless the render data
# overrides them. A value is either the literal value or a table with
# `value`, `label`, `description` and `example`.
[merge_tags]
app_name = "Acme"
app_url = { value = "https://example.com", label = "App URL" }

[validation]
# Refuse to render when a required tag has no value.
required_tags = true

# The process that turns MJML into HTML. It reads MJML on stdin.
[compiler]
command = "mjml"
args = ["-i", "-s"]
"##;

const SAMPLE_TEMPLATE: &str = r#"{
  "name": "Welcome Email",
  "subject": "Welcome to {{app_name}}, {{name}}",
  "previewText": "Thanks for signing up",
  "content": {
    "version": "1.0",
    "blocks": [
      {
        "id": "8b0f4c1e-2d3a-4e5f-9a6b-7c8d9e0f1a2b",
        "type": "heading",
        "props": { "content": "Welcome to {{app_name}}", "level": "h1" }
      },
      {
        "id": "1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e5f",
        "type": "text",
        "props": {
          "content": "<p>Hi {{name|capitalize}}, thanks for joining.</p>{{#if plan}}<p>You are on the {{plan|uppercase}} plan.</p>{{/if}}"
        }
      },
      {
        "id": "9f8e7d6c-5b4a-4392-8170-6f5e4d3c2b1a",
        "type": "button",
        "props": { "text": "Get started", "href": "{{app_url}}" }
      }
    ]
  },
  "tags": [
    { "key": "name", "label": "Name", "type": "text", "required": true },
    { "key": "plan", "label": "Plan", "type": "text" }
  ]
}
"#;

fn main() {
	let args = MailsmithCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Render {
			template,
			data,
			markup_only,
			output,
		}) => run_render(&args, template, data.as_deref(), *markup_only, output.as_deref()),
		Some(Commands::Validate { template, format }) => run_validate(&args, template, *format),
		Some(Commands::Tags { template, format }) => run_tags(&args, template, *format),
		None => {
			eprintln!("No subcommand specified. Run `mailsmith --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<mailsmith_core::MailsmithError>() {
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so rendered output on stdout stays clean. `RUST_LOG`
/// wins over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &MailsmithCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn load_config(root: &Path) -> Result<MailsmithConfig, Box<dyn std::error::Error>> {
	let config = MailsmithConfig::load(root)?;

	if config.is_none() {
		tracing::debug!(root = %root.display(), "no config file found, using defaults");
	}

	Ok(config.unwrap_or_default())
}

fn read_template(root: &Path, path: &Path) -> Result<MailTemplate, Box<dyn std::error::Error>> {
	let content = std::fs::read_to_string(root.join(path))?;
	Ok(MailTemplate::from_json(&content)?)
}

fn read_data(root: &Path, path: Option<&Path>) -> Result<TagData, Box<dyn std::error::Error>> {
	let Some(path) = path else {
		return Ok(TagData::new());
	};

	let content = std::fs::read_to_string(root.join(path))?;
	match serde_json::from_str::<Value>(&content).map_err(mailsmith_core::MailsmithError::from)? {
		Value::Object(data) => Ok(data),
		_ => Err(format!("data file `{}` must contain a JSON object", path.display()).into()),
	}
}

fn run_init(args: &MailsmithCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let template_path = root.join("template.json");
	let existing_config = MailsmithConfig::resolve_path(&root);

	match &existing_config {
		Some(path) => println!("Config file already exists: {}", path.display()),
		None => {
			std::fs::write(root.join(CONFIG_FILE_CANDIDATES[0]), SAMPLE_CONFIG)?;
			println!("Created {}", CONFIG_FILE_CANDIDATES[0]);
		}
	}

	let template_exists = template_path.exists();

	if template_exists {
		println!("Template file already exists: {}", template_path.display());
	} else {
		std::fs::write(&template_path, SAMPLE_TEMPLATE)?;
		println!("Created template file: {}", template_path.display());
	}

	if !template_exists {
		println!();
		println!("Next steps:");
		println!("  1. Edit {} to add your blocks", template_path.display());
		println!("  2. Run `mailsmith validate template.json` to check it");
		println!("  3. Run `mailsmith render template.json --data data.json` to render it");
	}

	Ok(())
}

fn run_render(
	args: &MailsmithCli,
	template_path: &Path,
	data_path: Option<&Path>,
	markup_only: bool,
	output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let template = read_template(&root, template_path)?;
	let data = read_data(&root, data_path)?;

	let mailer = if markup_only {
		Mailer::with_compiler(&config, PassthroughCompiler)
	} else {
		Mailer::from_config(&config)
	};

	let message = mailer.prepare(&template, &data)?;

	match output {
		Some(output) => {
			let output = root.join(output);
			std::fs::write(&output, &message.html)?;
			println!("Subject: {}", message.subject);
			println!(
				"{} `{}` to {}",
				colored!("Rendered", green),
				template.slug,
				output.display()
			);
		}
		None => {
			eprintln!("Subject: {}", message.subject);
			println!("{}", message.html);
		}
	}

	Ok(())
}

fn run_validate(
	args: &MailsmithCli,
	template_path: &Path,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let content = std::fs::read_to_string(root.join(template_path))?;
	let raw: Value = serde_json::from_str(&content).map_err(mailsmith_core::MailsmithError::from)?;

	// The block list is untrusted here, so it is checked as plain JSON before
	// anything is deserialized into blocks.
	let blocks = raw.pointer("/content/blocks").cloned().unwrap_or(Value::Null);
	let tags: Vec<TagDefinition> = match raw.get("tags") {
		Some(tags) => serde_json::from_value(tags.clone()).map_err(mailsmith_core::MailsmithError::from)?,
		None => Vec::new(),
	};

	let block_errors = validate_block_structure(&blocks, &BlockRegistry::new());
	let report = check_template_tags(&blocks, &tags, &config.tag_registry());
	let ok = block_errors.is_empty() && report.is_ok();

	match format {
		OutputFormat::Json => {
			let output = json!({
				"ok": ok,
				"blocks": block_errors,
				"undefined": report.undefined,
				"unusedRequired": report.unused_required,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			for error in &block_errors {
				eprintln!("{} {error}", colored!("error:", red));
			}
			for key in &report.undefined {
				eprintln!(
					"{} tag `{key}` is used but neither the template nor the config defines it",
					colored!("error:", red)
				);
			}
			for key in &report.unused_required {
				eprintln!(
					"{} required tag `{key}` is never used by the content",
					colored!("error:", red)
				);
			}

			if ok {
				println!("{} {}", colored!("Valid:", green), template_path.display());
			} else {
				eprintln!();
				eprintln!(
					"Validation failed: {} block error(s), {} undefined tag(s), {} unused required tag(s).",
					block_errors.len(),
					report.undefined.len(),
					report.unused_required.len()
				);
			}
		}
	}

	if !ok {
		process::exit(1);
	}

	Ok(())
}

fn run_tags(
	args: &MailsmithCli,
	template_path: &Path,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let template = read_template(&root, template_path)?;
	let registry = config.tag_registry();

	let mut used = extract_tags_from_content(&serde_json::to_value(&template.content)?);
	for key in extract_tags_from_content(&Value::String(template.subject.clone())) {
		if !used.contains(&key) {
			used.push(key);
		}
	}
	let globals = registry.tags_for_editor();

	match format {
		OutputFormat::Json => {
			let output = json!({
				"used": used,
				"defined": template.tags,
				"global": globals,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			println!("{}", colored!(format!("Tags for `{}`", template.slug), bold));

			print_section("Used:");
			if used.is_empty() {
				println!("  none");
			}
			for key in &used {
				let source = match template.tag(key) {
					Some(tag) if tag.required => "defined, required".to_string(),
					Some(_) => "defined".to_string(),
					None if registry.has_global_tag(key) => "global".to_string(),
					None => colored!("undefined", yellow),
				};
				println!("  {key} ({source})");
			}

			print_section("Defined:");
			if template.tags.is_empty() {
				println!("  none");
			}
			for tag in &template.tags {
				let required = if tag.required { ", required" } else { "" };
				println!("  {:<24} {} [{:?}{required}]", tag.key, tag.label, tag.tag_type);
			}

			print_section("Global:");
			for tag in &globals {
				println!("  {:<24} {} (e.g. {})", tag.key, tag.label, tag.example);
			}
		}
	}

	Ok(())
}
