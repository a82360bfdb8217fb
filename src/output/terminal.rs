//! Colored terminal output

use std::io::{IsTerminal, Write};

use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Ansi, Color, ColorChoice, ColorSpec, NoColor, WriteColor};

use crate::error::Result;
use crate::infer::Inference;
use crate::model::{ColumnProfile, ValueKind};

use super::SchemaRenderer;

/// Longest example value shown before it is cut
const EXAMPLE_WIDTH: usize = 40;

/// Terminal output with colors
pub struct TerminalOutput {
    color_choice: ColorChoice,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
        }
    }

    pub fn with_color_choice(color_choice: ColorChoice) -> Self {
        Self { color_choice }
    }

    fn use_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always | ColorChoice::AlwaysAnsi => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        }
    }

    fn write_header(&self, inference: &Inference, writer: &mut dyn WriteColor) -> Result<()> {
        let schema = &inference.schema;
        writer.set_color(ColorSpec::new().set_bold(true))?;
        write!(writer, "Table: {}", schema.table_name)?;
        writer.reset()?;
        let more = if inference.truncated { ", more available" } else { "" };
        writeln!(
            writer,
            " ({}, {} records sampled{})",
            inference.content_type, inference.record_count, more
        )?;

        write!(writer, "Primary key: ")?;
        match &schema.primary_key {
            Some(pk) => {
                writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                writeln!(writer, "{}", pk)?;
                writer.reset()?;
            }
            None => writeln!(writer, "none")?,
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_columns(&self, inference: &Inference, writer: &mut dyn WriteColor) -> Result<()> {
        let schema = &inference.schema;
        let mut builder = Builder::default();
        builder.push_record(["", "Column", "Type", "Size", "Nullable", "Unique", "Example"]);

        for column in &schema.columns {
            let marker = if schema.is_primary_key(&column.name) { "*" } else { "" };
            builder.push_record([
                marker.to_string(),
                column.name.clone(),
                column.kind().to_string(),
                column_size(column),
                yes_no(column.nullable),
                yes_no(column.unique),
                example(column),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern());
        writeln!(writer, "{}", table)?;
        Ok(())
    }

    fn write_comments(&self, inference: &Inference, writer: &mut dyn WriteColor) -> Result<()> {
        let comments: Vec<_> = inference
            .schema
            .columns
            .iter()
            .filter_map(|c| c.comment.as_ref().map(|comment| (&c.name, comment)))
            .collect();
        if comments.is_empty() {
            return Ok(());
        }

        writeln!(writer)?;
        writeln!(writer, "Comments:")?;
        for (name, comment) in comments {
            writeln!(writer, "  {}: {}", name, comment)?;
        }
        Ok(())
    }

    fn write_warnings(&self, inference: &Inference, writer: &mut dyn WriteColor) -> Result<()> {
        if inference.warnings.is_empty() {
            return Ok(());
        }

        writeln!(writer)?;
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(writer, "Warnings:")?;
        for warning in &inference.warnings {
            writeln!(writer, "  {}", warning)?;
        }
        writer.reset()?;
        Ok(())
    }

    fn write_all(&self, inference: &Inference, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_header(inference, writer)?;
        self.write_columns(inference, writer)?;
        self.write_comments(inference, writer)?;
        self.write_warnings(inference, writer)?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRenderer for TerminalOutput {
    fn render(&self, inference: &Inference, writer: &mut dyn Write) -> Result<()> {
        if self.use_color() {
            self.write_all(inference, &mut Ansi::new(writer))
        } else {
            self.write_all(inference, &mut NoColor::new(writer))
        }
    }
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

/// Storage size hint: precision and scale for decimals, text width otherwise
fn column_size(column: &ColumnProfile) -> String {
    match (column.kind(), column.decimal_shape) {
        (ValueKind::Decimal, Some(shape)) => format!("{}, {}", shape.precision(), shape.scale()),
        (ValueKind::String, _) => column.max_raw_length.to_string(),
        _ => String::new(),
    }
}

fn example(column: &ColumnProfile) -> String {
    let text = column.representative.display();
    if text.chars().count() <= EXAMPLE_WIDTH {
        return text.into_owned();
    }
    let cut: String = text.chars().take(EXAMPLE_WIDTH - 1).collect();
    format!("{}…", cut)
}
