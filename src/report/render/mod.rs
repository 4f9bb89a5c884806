//! Report layout engine.
//!
//! The composer describes the report as a story of [`Block`]s; the
//! [`RenderEngine`] writes them as Typst source and compiles it with the
//! [`TypstRenderEngine`].

pub mod compiler;
pub mod engine;
pub mod images;
pub mod markup;
pub mod story;

pub use compiler::TypstRenderEngine;
pub use engine::RenderEngine;
pub use images::{fit_contain, ImageHandle, ImageRegistry, Placement};
pub use story::{Align, Block, Cell, CellContent, Figure, FontFace, Paragraph, Row, Table};
