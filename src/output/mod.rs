//! Rendering of inferred schemas

mod json;
mod terminal;

use std::io::Write;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::infer::Inference;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// Trait for schema renderers
pub trait SchemaRenderer {
    /// Render an inference result to a writer
    fn render(&self, inference: &Inference, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating schema renderers
pub struct OutputFactory;

impl OutputFactory {
    /// Create a renderer based on format type
    pub fn create(format: OutputFormat) -> Box<dyn SchemaRenderer> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render an inference result to stdout
pub fn render_to_stdout(inference: &Inference, format: OutputFormat) -> Result<()> {
    let renderer = OutputFactory::create(format);
    let mut stdout = std::io::stdout().lock();
    renderer.render(inference, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
