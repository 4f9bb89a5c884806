//! Typst rendering engine.
//!
//! Compiles a generated Typst source to PDF in process. The source and the
//! images it references live in memory; fonts come from the bundled Typst
//! assets, so rendering never touches the system font directory.

use lazy_static::lazy_static;
use std::collections::HashMap;
use typst::diag::{FileError, FileResult, SourceDiagnostic};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};
use typst_pdf::PdfOptions;

use crate::report::ReportError;

lazy_static! {
    static ref LIBRARY: LazyHash<Library> = LazyHash::new(Library::builder().build());
    static ref FONTS: Vec<Font> = typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data)))
        .collect();
    static ref BOOK: LazyHash<FontBook> = LazyHash::new(FontBook::from_fonts(FONTS.iter()));
}

/// Compilation context for one document.
struct ReportWorld {
    main: Source,
    files: HashMap<FileId, Bytes>,
}

impl ReportWorld {
    fn new(template_filename: &str, source: &str, files: Vec<(String, Vec<u8>)>) -> Self {
        let main_id = FileId::new(None, VirtualPath::new(template_filename));
        let files = files
            .into_iter()
            .map(|(path, data)| (FileId::new(None, VirtualPath::new(&path)), Bytes::new(data)))
            .collect();
        Self {
            main: Source::new(main_id, source.to_string()),
            files,
        }
    }
}

impl World for ReportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &LIBRARY
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &BOOK
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().to_path_buf()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.files
            .get(&id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().to_path_buf()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    // Reports never print the current date.
    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}

/// Stateless engine for rendering Typst sources to PDF.
pub struct TypstRenderEngine;

impl TypstRenderEngine {
    /// Render a Typst string to PDF bytes.
    ///
    /// # Arguments
    /// * `template_filename` - Name of the main source, e.g. "report.typ", used in diagnostics.
    /// * `typst_source` - The complete Typst source.
    /// * `files` - Files the source may load, keyed by absolute virtual path.
    pub fn render(
        template_filename: &str,
        typst_source: &str,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<u8>, ReportError> {
        let world = ReportWorld::new(template_filename, typst_source, files);

        let compiled = typst::compile::<PagedDocument>(&world);
        for warning in &compiled.warnings {
            log::debug!("typst warning in {}: {}", template_filename, warning.message);
        }
        let document = compiled
            .output
            .map_err(|errors| ReportError::Render(describe(template_filename, &errors)))?;

        let pdf = typst_pdf::pdf(&document, &PdfOptions::default())
            .map_err(|errors| ReportError::Render(describe(template_filename, &errors)))?;
        log::debug!(
            "compiled {} into {} pages, {} bytes",
            template_filename,
            document.pages.len(),
            pdf.len()
        );
        Ok(pdf)
    }
}

fn describe(template_filename: &str, errors: &[SourceDiagnostic]) -> String {
    let messages: Vec<&str> = errors.iter().map(|error| error.message.as_str()).collect();
    format!("{}: {}", template_filename, messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;

    #[test]
    fn test_render_simple_document() {
        let pdf = TypstRenderEngine::render("test.typ", "Hello\n#pagebreak()\nWorld", Vec::new()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(Document::load_mem(&pdf).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = "#set page(width: 200pt, height: 200pt)\n#text(size: 12pt, \"Same\")";
        let first = TypstRenderEngine::render("test.typ", source, Vec::new()).unwrap();
        let second = TypstRenderEngine::render("test.typ", source, Vec::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_a_render_error() {
        let err = TypstRenderEngine::render("test.typ", "#image(\"/images/none.png\")", Vec::new())
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
        assert!(err.to_string().contains("test.typ"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = TypstRenderEngine::render("broken.typ", "#text(", Vec::new()).unwrap_err();
        assert!(err.to_string().contains("broken.typ"));
    }
}
