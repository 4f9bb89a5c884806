//! Render engine.
//!
//! Writes a story of layout blocks as one Typst source for the
//! [`super::TypstRenderEngine`]. Pagination, line breaking and row splitting
//! are left to Typst, so a cell longer than a page continues on the next one.

use std::fmt::Write;
use std::path::Path;

use super::images::{fit_contain, ImageHandle, ImageRegistry};
use super::markup::{align, color, length, string_literal, text};
use super::story::{Block, Cell, CellContent, Figure, Paragraph, Table};
use crate::report::layout::{Frame, LayoutConfig};
use crate::report::traits::PageDecorator;
use crate::report::ReportError;

/// Stateless engine turning a story into document source.
pub struct RenderEngine<'a> {
    layout: &'a LayoutConfig,
}

impl<'a> RenderEngine<'a> {
    pub fn new(layout: &'a LayoutConfig) -> Self {
        Self { layout }
    }

    /// Typst source for `story`. Images referenced by the story are
    /// registered in `images`.
    pub fn markup(
        &self,
        story: &[Block],
        decorator: &dyn PageDecorator,
        images: &mut ImageRegistry,
        title: &str,
    ) -> Result<String, ReportError> {
        let mut writer = MarkupWriter {
            layout: self.layout,
            images,
            frame: self.layout.normal_frame(),
            out: String::new(),
        };
        writer.preamble(title, &decorator.furniture());
        for block in story {
            writer.block(block)?;
        }
        Ok(writer.out)
    }
}

struct MarkupWriter<'a, 'b> {
    layout: &'a LayoutConfig,
    images: &'b mut ImageRegistry,
    frame: Frame,
    out: String,
}

impl MarkupWriter<'_, '_> {
    fn line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn preamble(&mut self, title: &str, furniture: &str) {
        let layout = self.layout;
        self.line(&format!("#set document(title: {})", string_literal(title)));
        self.line(&format!(
            "#set page(width: {}, height: {}, margin: {}, background: {})",
            length(layout.page_width),
            length(layout.page_height),
            margin(layout, &self.frame),
            furniture
        ));
        self.line(&format!("#set text(size: {})", length(layout.body_size)));
        self.line("#set block(spacing: 0pt)");
        self.line("#set par(spacing: 0pt)");
    }

    fn block(&mut self, block: &Block) -> Result<(), ReportError> {
        match block {
            Block::Paragraph(paragraph) => self.paragraph(paragraph),
            Block::Spacer(height) => self.line(&format!("#v({})", length(*height))),
            Block::Table(table) => self.table(table)?,
            Block::Figure(figure) => self.figure(figure)?,
            Block::PageBreak => self.line("#pagebreak(weak: true)"),
            Block::WideFrame => {
                self.frame = self.layout.wide_frame();
                let margins = margin(self.layout, &self.frame);
                self.line(&format!("#set page(margin: {})", margins));
            }
        }
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        // Typst leading is the gap between lines, not the baseline distance.
        let gap = (paragraph.leading - paragraph.size * 0.75).max(1.0);
        self.line(&format!(
            "#block(above: {}, below: {}, width: 100%, align({}, par(leading: {}, {})))",
            length(paragraph.space_before),
            length(paragraph.space_after),
            align(paragraph.align),
            length(gap),
            text(&paragraph.text, paragraph.face, paragraph.size)
        ));
    }

    fn table(&mut self, table: &Table) -> Result<(), ReportError> {
        let columns: Vec<String> = table.columns.iter().map(|width| length(*width)).collect();
        let rows: Vec<String> = table
            .rows
            .iter()
            .map(|row| row.height.map(length).unwrap_or_else(|| "auto".to_string()))
            .collect();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "#align(center, block(width: {}, stroke: {}, table(",
            length(table.width()),
            length(table.border)
        );
        let _ = writeln!(out, "  columns: ({},),", columns.join(", "));
        let _ = writeln!(out, "  rows: ({},),", rows.join(", "));
        let _ = writeln!(out, "  inset: {},", length(table.padding));
        let _ = writeln!(out, "  stroke: {},", length(table.grid));

        for row in &table.rows {
            for (cell, column) in row.cells.iter().zip(&table.columns) {
                let inner = (
                    (column - 2.0 * table.padding).max(1.0),
                    row.height.map(|height| (height - 2.0 * table.padding).max(1.0)),
                );
                let cell = self.cell(cell, table.font_size, inner)?;
                let _ = writeln!(out, "  {},", cell);
            }
        }
        out.push_str(")))");
        self.line(&out);
        Ok(())
    }

    fn cell(&mut self, cell: &Cell, size: f32, inner: (f32, Option<f32>)) -> Result<String, ReportError> {
        let fill = cell
            .fill
            .map(|rgb| format!(", fill: {}", color(rgb)))
            .unwrap_or_default();
        let (vertical, body) = match &cell.content {
            CellContent::Text(value) => ("top", text(value, cell.face, size)),
            CellContent::Rotated(value) => (
                "horizon",
                format!("rotate(90deg, reflow: true, {})", text(value, cell.face, size)),
            ),
            CellContent::Image(Some(path)) => {
                let handle = self.register(path)?;
                let (box_w, box_h) = (inner.0, inner.1.unwrap_or(inner.0));
                let fitted = fit_contain(handle.width as f32, handle.height as f32, 0.0, 0.0, box_w, box_h);
                ("horizon", image_call(&handle, fitted.width, fitted.height))
            }
            CellContent::Image(None) => ("horizon", "[]".to_string()),
        };
        Ok(format!(
            "table.cell(align: {} + {}{}, {})",
            align(cell.align),
            vertical,
            fill,
            body
        ))
    }

    fn figure(&mut self, figure: &Figure) -> Result<(), ReportError> {
        let handle = self.register(&figure.path)?;
        let box_width = figure.width.min(self.frame.width);
        let fitted = fit_contain(
            handle.width as f32,
            handle.height as f32,
            0.0,
            0.0,
            box_width,
            figure.height,
        );
        let image = image_call(&handle, fitted.width, fitted.height);

        // Borderless figures shrink to the fitted image.
        let line = match figure.border {
            Some(stroke) => format!(
                "#align(center, block(width: {}, height: {}, stroke: {}, align(center + horizon, {})))",
                length(box_width),
                length(figure.height),
                length(stroke),
                image
            ),
            None => format!("#align(center, {})", image),
        };
        self.line(&line);
        Ok(())
    }

    fn register(&mut self, path: &Path) -> Result<ImageHandle, ReportError> {
        self.images
            .register(path)
            .map_err(|err| ReportError::ImageDecode {
                reference: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                reason: err.to_string(),
            })
    }
}

fn image_call(handle: &ImageHandle, width: f32, height: f32) -> String {
    format!(
        "image({}, width: {}, height: {})",
        string_literal(&handle.path),
        length(width),
        length(height)
    )
}

fn margin(layout: &LayoutConfig, frame: &Frame) -> String {
    format!(
        "(left: {}, right: {}, top: {}, bottom: {})",
        length(frame.left),
        length(layout.page_width - frame.left - frame.width),
        length(layout.page_height - frame.top()),
        length(frame.bottom)
    )
}
