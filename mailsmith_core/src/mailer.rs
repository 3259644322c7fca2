use serde::Serialize;

use crate::BlockRegistry;
use crate::CommandCompiler;
use crate::FormatterRegistry;
use crate::MailTemplate;
use crate::MailsmithConfig;
use crate::MailsmithResult;
use crate::MarkupCompiler;
use crate::MergeTagProcessor;
use crate::TagProcessor;
use crate::TemplateRenderer;
use crate::values::TagData;

/// A rendered message ready to hand to a mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedMessage {
	pub subject: String,
	pub html: String,
}

/// Prepares outgoing messages from stored templates.
pub struct Mailer {
	renderer: TemplateRenderer,
	subject: MergeTagProcessor,
	validate_required: bool,
}

impl Mailer {
	pub fn new(renderer: TemplateRenderer, validate_required: bool) -> Self {
		let subject = MergeTagProcessor::new(renderer.tag_processor().tag_registry().clone());

		Self {
			renderer,
			subject,
			validate_required,
		}
	}

	/// A mailer using the configured template defaults, global tags,
	/// compiler command and validation switch.
	pub fn from_config(config: &MailsmithConfig) -> Self {
		Self::with_compiler(config, CommandCompiler::from_config(&config.compiler))
	}

	/// Like [`Mailer::from_config`] with a different markup compiler.
	pub fn with_compiler(config: &MailsmithConfig, compiler: impl MarkupCompiler + 'static) -> Self {
		let tags = TagProcessor::new(config.tag_registry(), FormatterRegistry::new());
		let renderer = TemplateRenderer::new(BlockRegistry::new(), tags, compiler)
			.with_default_settings(config.templates.settings());

		Self::new(renderer, config.validation.required_tags)
	}

	pub fn renderer(&self) -> &TemplateRenderer {
		&self.renderer
	}

	/// Checks required tags when enabled, renders the body and fills in the
	/// subject line.
	pub fn prepare(&self, template: &MailTemplate, data: &TagData) -> MailsmithResult<PreparedMessage> {
		if self.validate_required {
			self.renderer
				.tag_processor()
				.validate_required_tags(template, data)?;
		}

		let html = self.renderer.render(template, data)?;
		let subject = self.subject.process(&template.subject, data);

		tracing::info!(template = %template.slug, "prepared message");

		Ok(PreparedMessage { subject, html })
	}
}
