//! Presentation constants of the report, gathered into one immutable value.
//!
//! All lengths are PDF points (1/72 in).

use crate::report::render::{Align, Block, FontFace, Paragraph};

pub const INCH: f32 = 72.0;

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
}

/// Rectangle available for flowing content on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn top(&self) -> f32 {
        self.bottom + self.height
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Side margins of the wide frame used by the image appendix.
    pub wide_margin: f32,

    pub highlight: Rgb,
    pub header_bar: Rgb,
    pub light_grey: Rgb,
    pub band_high: Rgb,
    pub band_medium: Rgb,
    pub band_low: Rgb,
    pub band_high_threshold: u32,
    pub band_medium_threshold: u32,

    pub header_title: String,
    pub default_viewer: String,
    pub document_title: String,
    pub logo_file: String,

    pub title_size: f32,
    pub h1_size: f32,
    pub h2_size: f32,
    pub body_size: f32,
    pub small_size: f32,
    pub table_size: f32,
    pub cover_size: f32,

    /// Bordered box for uploaded evidence images.
    pub upload_box: (f32, f32),
    /// Image cell of the appendix thumbnail grids.
    pub appendix_cell: (f32, f32),
    /// Narrative figures are fitted into this width.
    pub figure_width: f32,
    /// Longest side, in pixels, an embedded image is down-sampled to.
    pub max_image_pixels: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 8.5 * INCH,
            page_height: 11.0 * INCH,
            margin_left: 0.7 * INCH,
            margin_right: 0.7 * INCH,
            margin_top: 1.0 * INCH,
            margin_bottom: 1.35 * INCH,
            wide_margin: 0.15 * INCH,

            highlight: Rgb(1.0, 0.95, 0.20),
            header_bar: Rgb(0.45, 0.0, 0.0),
            light_grey: Rgb(0.95, 0.95, 0.95),
            band_high: Rgb(0.565, 0.933, 0.565),
            band_medium: Rgb(1.0, 0.647, 0.0),
            band_low: Rgb(0.698, 0.133, 0.133),
            band_high_threshold: 90,
            band_medium_threshold: 75,

            header_title: "De Anza College - PHYS 4A Lab - Spring 2026".to_string(),
            default_viewer: "Professor Name".to_string(),
            document_title: "PHYS 4A Lab 1 - Measurements and Error Analysis".to_string(),
            logo_file: "deanza_logo.png".to_string(),

            title_size: 18.0,
            h1_size: 15.0,
            h2_size: 13.0,
            body_size: 10.5,
            small_size: 10.0,
            table_size: 10.0,
            cover_size: 13.0,

            upload_box: (7.0 * INCH, 3.25 * INCH),
            appendix_cell: (2.3 * INCH, 1.6 * INCH),
            figure_width: 6.6 * INCH,
            max_image_pixels: 1600,
        }
    }
}

impl LayoutConfig {
    /// Frame for regular report pages.
    pub fn normal_frame(&self) -> Frame {
        Frame {
            left: self.margin_left,
            bottom: self.margin_bottom,
            width: self.page_width - self.margin_left - self.margin_right,
            height: self.page_height - self.margin_top - self.margin_bottom,
        }
    }

    /// Frame for the appendix image grids, nearly edge to edge.
    pub fn wide_frame(&self) -> Frame {
        Frame {
            left: self.wide_margin,
            bottom: self.margin_bottom,
            width: self.page_width - 2.0 * self.wide_margin,
            height: self.page_height - self.margin_top - self.margin_bottom,
        }
    }

    pub fn title(&self, text: &str) -> Block {
        Block::Paragraph(
            Paragraph::new(text, FontFace::Bold, self.title_size)
                .align(Align::Center)
                .spacing(0.0, 6.0),
        )
    }

    pub fn heading1(&self, text: &str) -> Block {
        Block::Paragraph(Paragraph::new(text, FontFace::Bold, self.h1_size).spacing(10.0, 6.0))
    }

    pub fn heading2(&self, text: &str) -> Block {
        Block::Paragraph(Paragraph::new(text, FontFace::Bold, self.h2_size).spacing(8.0, 4.0))
    }

    pub fn body(&self, text: &str) -> Block {
        Block::Paragraph(Paragraph::new(text, FontFace::Regular, self.body_size).spacing(0.0, 4.0))
    }

    pub fn body_bold(&self, text: &str) -> Block {
        Block::Paragraph(Paragraph::new(text, FontFace::Bold, self.body_size).spacing(0.0, 4.0))
    }

    /// Compact body text with 12pt leading.
    pub fn small(&self, text: &str) -> Block {
        let mut paragraph = Paragraph::new(text, FontFace::Regular, self.small_size);
        paragraph.leading = 12.0;
        Block::Paragraph(paragraph)
    }

    pub fn note(&self, text: &str) -> Block {
        let mut paragraph = Paragraph::new(text, FontFace::Italic, self.small_size);
        paragraph.leading = 12.0;
        Block::Paragraph(paragraph)
    }

    pub fn caption(&self, text: &str) -> Block {
        Block::Paragraph(
            Paragraph::new(text, FontFace::Italic, self.small_size)
                .align(Align::Center)
                .spacing(6.0, 6.0),
        )
    }
}
