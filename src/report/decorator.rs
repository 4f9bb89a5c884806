//! Header and footer furniture drawn on every page.

use std::path::Path;

use super::layout::{LayoutConfig, INCH};
use super::render::markup::{color, length, string_literal};
use super::render::{fit_contain, ImageHandle, ImageRegistry};
use super::traits::PageDecorator;

/// Draws the header banner, page number box, footer rule and logo.
pub struct ReportDecorator<'a> {
    layout: &'a LayoutConfig,
    viewer: String,
    logo: Option<ImageHandle>,
}

impl<'a> ReportDecorator<'a> {
    pub fn new(layout: &'a LayoutConfig, viewer: String, logo: Option<ImageHandle>) -> Self {
        Self {
            layout,
            viewer,
            logo,
        }
    }

    /// Register the institutional logo, or `None` when it is missing or unreadable.
    pub fn load_logo(images: &mut ImageRegistry, path: &Path) -> Option<ImageHandle> {
        if !path.is_file() {
            log::debug!("logo {} not found, footer drawn without it", path.display());
            return None;
        }
        match images.register(path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("skipping unreadable logo {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl PageDecorator for ReportDecorator<'_> {
    fn furniture(&self) -> String {
        let layout = self.layout;
        let bar = color(layout.header_bar);
        let mut parts = Vec::new();

        // Banner
        parts.push(format!(
            "place(top + left, dy: {}, block(width: 100%, height: {}, fill: {}, inset: (left: {}, right: {}), \
             align(horizon, text(size: 10pt, weight: \"bold\", fill: white)[#{} #h(1fr) #{}])))",
            length(0.25 * INCH),
            length(0.5 * INCH),
            bar,
            length(layout.margin_left),
            length(layout.margin_right),
            string_literal(&layout.header_title),
            string_literal(&self.viewer)
        ));

        // Page counter box hanging from the banner
        parts.push(format!(
            "place(top + right, dy: {}, box(width: {}, height: {}, stroke: 1pt + black, \
             align(center + horizon, text(size: 8.5pt)[#counter(page).display() | Page])))",
            length(0.75 * INCH),
            length(0.9 * INCH),
            length(0.20 * INCH)
        ));

        // Footer
        let footer_base = 0.35 * INCH;
        parts.push(format!(
            "place(bottom + left, dx: {}, dy: -{}, line(length: {}, stroke: 2pt + {}))",
            length(layout.margin_left),
            length(footer_base + 0.32 * INCH),
            length(layout.page_width - layout.margin_left - layout.margin_right),
            bar
        ));

        if let Some(logo) = &self.logo {
            let placement = fit_contain(
                logo.width as f32,
                logo.height as f32,
                layout.margin_left,
                footer_base - 0.05 * INCH,
                8.0 * INCH,
                0.90 * INCH,
            );
            parts.push(format!(
                "place(bottom + left, dx: {}, dy: -{}, image({}, width: {}, height: {}))",
                length(placement.x),
                length(placement.y),
                string_literal(&logo.path),
                length(placement.width),
                length(placement.height)
            ));
        }

        format!("context {{\n  {}\n}}", parts.join("\n  "))
    }
}
