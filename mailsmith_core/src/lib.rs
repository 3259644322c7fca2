//! `mailsmith_core` is the core library for mailsmith, an email template
//! engine. Templates are stored as a tree of typed blocks which an editor
//! session mutates, block renderers turn into MJML, and an external compiler
//! turns into HTML. Merge tags such as `{{user.name|capitalize}}` and
//! `{{#if paid}}...{{/if}}` conditionals are resolved against runtime data as
//! the last step.
//!
//! ## Rendering Pipeline
//!
//! ```text
//! MailTemplate (blocks + settings)
//!   → BlockRegistry (one renderer per block type, rows render their columns)
//!   → TemplateRenderer (groups content blocks into sections, wraps <mjml>)
//!   → MarkupCompiler (external `mjml` process by default)
//!   → TagProcessor (global tags, conditionals, tags with formatter pipes)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `mailsmith.toml`: template
//!   defaults, global merge tags, validation and the compiler command.
//! - [`editor`]: The editing session: add, move, nest and duplicate blocks
//!   with linear undo and redo.
//! - [`renderers`]: The built-in block renderers and the registry that
//!   dispatches to them by block type.
//! - [`validation`]: Checks for untrusted block trees and for the tags a
//!   template uses.
//!
//! ## Key Types
//!
//! - [`Block`]: A top-level block. Either a [`ContentBlock`] or a
//!   [`RowBlock`] holding columns of content blocks.
//! - [`EditorState`]: One editing session over a block tree.
//! - [`TagProcessor`]: Resolves merge tags and conditionals.
//! - [`FormatterRegistry`]: Named formatters used by tag pipes.
//! - [`TemplateRenderer`]: Builds, compiles and post-processes a template.
//! - [`Mailer`]: Prepares a subject and body for sending.
//!
//! ## Quick Start
//!
//! ```rust
//! use mailsmith_core::BlockRegistry;
//! use mailsmith_core::PassthroughCompiler;
//! use mailsmith_core::TagProcessor;
//! use mailsmith_core::TemplateRenderer;
//! use serde_json::json;
//!
//! let processor = TagProcessor::default();
//! let data = json!({ "name": "ada" });
//! let data = data.as_object().cloned().unwrap_or_default();
//!
//! assert_eq!(processor.process("Hi {{name|capitalize}}", &data), "Hi Ada");
//!
//! let renderer = TemplateRenderer::new(BlockRegistry::new(), processor, PassthroughCompiler);
//! assert!(renderer.block_registry().has_renderer(&mailsmith_core::BlockKind::Text));
//! ```

pub use block_types::*;
pub use conditionals::*;
pub use config::*;
pub use defaults::*;
pub use document::*;
pub use editor::*;
pub use error::*;
pub use formatters::*;
pub use mailer::*;
pub use merge_tags::*;
pub use renderers::*;
pub use sanitizer::*;
pub use tag_parser::*;
pub use tag_processor::*;
pub use tag_registry::*;
pub use template::*;
pub use template_renderer::*;
pub use theme::*;
pub use validation::*;
pub use values::*;

mod block_types;
mod conditionals;
pub mod config;
mod defaults;
mod document;
pub mod editor;
#[allow(unused_assignments)]
mod error;
mod formatters;
mod mailer;
mod merge_tags;
pub mod renderers;
pub mod sanitizer;
mod tag_parser;
mod tag_processor;
mod tag_registry;
mod template;
mod template_renderer;
mod theme;
pub mod validation;
mod values;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
