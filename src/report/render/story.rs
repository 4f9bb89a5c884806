//! Layout blocks produced by the composer and written out as Typst source.

use std::path::PathBuf;

use crate::report::layout::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One flowing element of the document.
#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Paragraph),
    Spacer(f32),
    Table(Table),
    Figure(Figure),
    /// Start a new page unless the current one is still empty.
    PageBreak,
    /// Continue on a new page with the narrow appendix margins, kept for
    /// the rest of the document.
    WideFrame,
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    pub text: String,
    pub face: FontFace,
    pub size: f32,
    pub leading: f32,
    pub align: Align,
    pub space_before: f32,
    pub space_after: f32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, face: FontFace, size: f32) -> Self {
        Self {
            text: text.into(),
            face,
            size,
            leading: size * 1.2,
            align: Align::Left,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }
}

/// Content of a table cell.
#[derive(Debug, Clone)]
pub enum CellContent {
    Text(String),
    /// Image fitted into the cell; `None` keeps the cell as a blank placeholder.
    Image(Option<PathBuf>),
    /// Text rotated a quarter turn clockwise, centred in the cell.
    Rotated(String),
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub content: CellContent,
    pub fill: Option<Rgb>,
    pub face: FontFace,
    pub align: Align,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: CellContent::Text(text.into()),
            fill: None,
            face: FontFace::Regular,
            align: Align::Left,
        }
    }

    pub fn image(path: Option<PathBuf>) -> Self {
        Self {
            content: CellContent::Image(path),
            fill: None,
            face: FontFace::Regular,
            align: Align::Center,
        }
    }

    pub fn rotated(text: impl Into<String>) -> Self {
        Self {
            content: CellContent::Rotated(text.into()),
            fill: None,
            face: FontFace::Bold,
            align: Align::Center,
        }
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.face = FontFace::Bold;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Fixed height. Rows without one size to their content and may break
    /// across pages.
    pub height: Option<f32>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            height: None,
        }
    }

    pub fn with_height(cells: Vec<Cell>, height: f32) -> Self {
        Self {
            cells,
            height: Some(height),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<f32>,
    pub rows: Vec<Row>,
    pub font_size: f32,
    pub padding: f32,
    /// Stroke width of the outer box.
    pub border: f32,
    /// Stroke width between cells.
    pub grid: f32,
}

impl Table {
    pub fn new(columns: Vec<f32>, rows: Vec<Row>, font_size: f32) -> Self {
        Self {
            columns,
            rows,
            font_size,
            padding: 5.0,
            border: 0.9,
            grid: 0.6,
        }
    }

    pub fn padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn strokes(mut self, border: f32, grid: f32) -> Self {
        self.border = border;
        self.grid = grid;
        self
    }

    pub fn width(&self) -> f32 {
        self.columns.iter().sum()
    }
}

/// An image scaled into a fixed box, centred in the frame.
#[derive(Debug, Clone)]
pub struct Figure {
    pub path: PathBuf,
    pub width: f32,
    pub height: f32,
    /// Stroke drawn around the whole box. Without one the box shrinks to
    /// the fitted image.
    pub border: Option<f32>,
}
