use std::io::Write;
use std::process::Command;
use std::process::Stdio;

use crate::Block;
use crate::BlockRegistry;
use crate::CompilerConfig;
use crate::MailTemplate;
use crate::MailsmithError;
use crate::MailsmithResult;
use crate::Settings;
use crate::TagProcessor;
use crate::sanitizer::escape_text;
use crate::values::TagData;

/// Turns MJML markup into HTML.
pub trait MarkupCompiler: Send + Sync {
	fn compile(&self, markup: &str) -> MailsmithResult<String>;
}

/// Runs an external process with the markup on stdin and reads HTML from
/// stdout. A non-zero exit status is a compiler error.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
	command: String,
	args: Vec<String>,
}

impl CommandCompiler {
	pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
		Self {
			command: command.into(),
			args,
		}
	}

	pub fn from_config(config: &CompilerConfig) -> Self {
		Self::new(config.command.clone(), config.args.clone())
	}
}

impl Default for CommandCompiler {
	fn default() -> Self {
		Self::from_config(&CompilerConfig::default())
	}
}

impl MarkupCompiler for CommandCompiler {
	fn compile(&self, markup: &str) -> MailsmithResult<String> {
		let mut child = Command::new(&self.command)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| MailsmithError::Compiler(format!("failed to run `{}`: {e}", self.command)))?;

		// Stdin must be written while stdout and stderr are drained.
		let stdin = child.stdin.take();
		let (output, written) = std::thread::scope(|scope| {
			let writer = scope.spawn(move || {
				match stdin {
					Some(mut stdin) => stdin.write_all(markup.as_bytes()),
					None => Ok(()),
				}
			});
			let output = child.wait_with_output();
			(output, writer.join())
		});

		let output = output?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(MailsmithError::Compiler(format!(
				"`{}` exited with {}: {}",
				self.command,
				output.status,
				stderr.trim()
			)));
		}

		match written {
			Ok(Ok(())) => {}
			Ok(Err(e)) => {
				return Err(MailsmithError::Compiler(format!(
					"failed to write markup to `{}`: {e}",
					self.command
				)));
			}
			Err(_) => {
				return Err(MailsmithError::Compiler(format!(
					"writing markup to `{}` panicked",
					self.command
				)));
			}
		}

		String::from_utf8(output.stdout)
			.map_err(|e| MailsmithError::Compiler(format!("compiler output is not utf-8: {e}")))
	}
}

/// Returns the markup unchanged. Useful for previews of the MJML itself and
/// for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompiler;

impl MarkupCompiler for PassthroughCompiler {
	fn compile(&self, markup: &str) -> MailsmithResult<String> {
		Ok(markup.to_string())
	}
}

/// Builds the MJML document for a template, compiles it and substitutes tags
/// in the compiled HTML.
pub struct TemplateRenderer {
	blocks: BlockRegistry,
	tags: TagProcessor,
	compiler: Box<dyn MarkupCompiler>,
	defaults: Settings,
}

impl TemplateRenderer {
	pub fn new(
		blocks: BlockRegistry,
		tags: TagProcessor,
		compiler: impl MarkupCompiler + 'static,
	) -> Self {
		Self {
			blocks,
			tags,
			compiler: Box::new(compiler),
			defaults: Settings::default(),
		}
	}

	/// Settings used wherever a template leaves one out.
	#[must_use]
	pub fn with_default_settings(mut self, defaults: Settings) -> Self {
		self.defaults = defaults;
		self
	}

	pub fn default_settings(&self) -> &Settings {
		&self.defaults
	}

	pub fn block_registry(&self) -> &BlockRegistry {
		&self.blocks
	}

	pub fn tag_processor(&self) -> &TagProcessor {
		&self.tags
	}

	pub fn render(&self, template: &MailTemplate, data: &TagData) -> MailsmithResult<String> {
		tracing::info!(template = %template.slug, "rendering template");
		let markup = self.build_markup(template, data);
		self.compile_and_process(&markup, data)
	}

	/// Renders unsaved editor content, for live previews.
	pub fn render_from_content(
		&self,
		blocks: &[Block],
		settings: &Settings,
		data: &TagData,
	) -> MailsmithResult<String> {
		let markup = self.build_markup_from_content(blocks, settings, data);
		self.compile_and_process(&markup, data)
	}

	pub fn build_markup(&self, template: &MailTemplate, data: &TagData) -> String {
		let settings = template.settings.resolve(&self.defaults);
		let body = self.render_blocks(template.blocks(), &settings, data);
		wrap_document(&body, &settings, template.preview_text.as_deref())
	}

	pub fn build_markup_from_content(
		&self,
		blocks: &[Block],
		settings: &Settings,
		data: &TagData,
	) -> String {
		let body = self.render_blocks(blocks, settings, data);
		wrap_document(&body, settings, None)
	}

	fn compile_and_process(&self, markup: &str, data: &TagData) -> MailsmithResult<String> {
		let html = self.compiler.compile(markup).inspect_err(|e| {
			tracing::error!(error = %e, "markup compilation failed");
		})?;

		Ok(self.tags.process(&html, data))
	}

	/// Consecutive content blocks share one full width section. Rows are
	/// sections of their own.
	fn render_blocks(&self, blocks: &[Block], settings: &Settings, data: &TagData) -> String {
		let mut output = String::new();
		let mut pending: Vec<&Block> = Vec::new();

		for block in blocks {
			if block.is_row() {
				output.push_str(&self.wrap_content_blocks(&pending, settings, data));
				pending.clear();
				output.push_str(&self.blocks.render_block(block, data));
			} else {
				pending.push(block);
			}
		}

		output.push_str(&self.wrap_content_blocks(&pending, settings, data));
		output
	}

	fn wrap_content_blocks(&self, blocks: &[&Block], settings: &Settings, data: &TagData) -> String {
		let content: String = blocks
			.iter()
			.map(|block| self.blocks.render_block(block, data))
			.collect();

		if content.is_empty() {
			return String::new();
		}

		format!(
			"<mj-section background-color=\"{}\" padding=\"0\"><mj-column>{content}</mj-column></mj-section>",
			settings.content_background_color
		)
	}
}

const CSS_RESET: &str = r"
      /* Email CSS Reset - neutralize browser defaults */
      h1, h2, h3, h4, h5, h6, p, ul, ol, dl, blockquote, figure, pre {
        margin: 0;
        margin-block-start: 0;
        margin-block-end: 0;
        margin-inline-start: 0;
        margin-inline-end: 0;
        padding: 0;
      }
      h1, h2, h3, h4, h5, h6 {
        font-size: inherit;
        font-weight: inherit;
      }
      ul, ol, dl { padding-inline-start: 0; }
      li, dd { margin: 0; padding: 0; }

      @media only screen and (max-width: 480px) {
        .no-stack table.mj-full-width-mobile {
          width: auto !important;
        }
        .no-stack td.mj-full-width-mobile {
          width: auto !important;
        }
      }
    ";

/// Wraps rendered sections in a complete `<mjml>` document.
pub fn wrap_document(body: &str, settings: &Settings, preview_text: Option<&str>) -> String {
	let preview = preview_text
		.filter(|text| !text.is_empty())
		.map(|text| format!("<mj-preview>{}</mj-preview>", escape_text(text)))
		.unwrap_or_default();

	format!(
		r##"<mjml>
  <mj-head>
    <mj-attributes>
      <mj-all font-family="{font_family}" />
      <mj-text font-size="16px" color="#333333" line-height="1.5" />
      <mj-section padding="0" />
    </mj-attributes>
    <mj-style>{CSS_RESET}</mj-style>
    {preview}
  </mj-head>
  <mj-body background-color="{background_color}" width="{content_width}px">
    {body}
  </mj-body>
</mjml>"##,
		font_family = settings.font_family,
		background_color = settings.background_color,
		content_width = settings.content_width,
	)
}
