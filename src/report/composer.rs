//! Document composer.
//!
//! Turns a [`Record`] into the story of the lab report and renders it. The
//! repeating blocks are driven by the section tables in [`super::sections`].

use std::path::PathBuf;

use super::common::{static_asset, viewer_label};
use super::decorator::ReportDecorator;
use super::file::UploadKind;
use super::layout::{LayoutConfig, Rgb, INCH};
use super::narrative;
use super::record::{Record, UploadRef};
use super::render::{
    Align, Block, Cell, Figure, ImageRegistry, RenderEngine, Row, Table, TypstRenderEngine,
};
use super::schema::VIEWER_KEY;
use super::scoring::{Score, ScoreBand};
use super::sections::{
    GridSpec, MassSpec, SectionSpec, ToolSource, APPENDIX_GRIDS, DENSITY_SECTIONS, MASS_SECTIONS,
    MEASUREMENT_SECTIONS, QUESTIONS,
};
use super::ReportError;

const PDF_PLACEHOLDER: &str = "(PDF pages will be appended to the end of the report.)";
const UNSUPPORTED_PLACEHOLDER: &str = "(Unsupported file type for preview.)";
const RESTRICTED_NOTE: &str = "Instructor-only reference section (locked).";
const REPORT_TEMPLATE: &str = "report.typ";

/// Composes the report for one record.
#[derive(Debug, Clone)]
pub struct Composer {
    layout: LayoutConfig,
    static_dir: PathBuf,
    show_score: bool,
}

impl Composer {
    pub fn new(layout: LayoutConfig, static_dir: impl Into<PathBuf>, show_score: bool) -> Self {
        Self {
            layout,
            static_dir: static_dir.into(),
            show_score,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Compose the full report.
    ///
    /// `include_privileged_section` adds the restricted Appendix III. The
    /// output depends only on the record, the stored files and the static
    /// assets.
    pub fn compose(
        &self,
        record: &Record,
        include_privileged_section: bool,
        score: &Score,
    ) -> Result<Vec<u8>, ReportError> {
        let (source, images) = self.prepare(record, include_privileged_section, score)?;
        let pdf = TypstRenderEngine::render(REPORT_TEMPLATE, &source, images.into_files())?;
        log::debug!(
            "composed {} bytes of source into {} bytes (restricted section: {})",
            source.len(),
            pdf.len(),
            include_privileged_section
        );
        Ok(pdf)
    }

    /// Typst source of the report, before compilation.
    pub fn markup(
        &self,
        record: &Record,
        include_privileged_section: bool,
        score: &Score,
    ) -> Result<String, ReportError> {
        self.prepare(record, include_privileged_section, score)
            .map(|(source, _)| source)
    }

    fn prepare(
        &self,
        record: &Record,
        include_privileged_section: bool,
        score: &Score,
    ) -> Result<(String, ImageRegistry), ReportError> {
        let layout = &self.layout;
        let mut images = ImageRegistry::new(layout.max_image_pixels);
        let logo = ReportDecorator::load_logo(
            &mut images,
            &static_asset(&self.static_dir, &layout.logo_file),
        );

        let mut builder = StoryBuilder::new(layout, record);
        builder.cover(self.show_score.then_some(score));
        builder.extend(narrative::objective(layout));
        builder.extend(narrative::theory(layout, &mut images, &self.static_dir));
        builder.extend(narrative::equipment_and_procedure(layout));
        builder.part_one();
        for spec in MEASUREMENT_SECTIONS {
            builder.section(spec);
        }
        builder.mass(MASS_SECTIONS);
        for spec in DENSITY_SECTIONS {
            builder.section(spec);
        }
        builder.sample_calculation();
        builder.data_analysis();
        builder.appendix_one(APPENDIX_GRIDS);
        builder.appendix_two();
        if include_privileged_section {
            builder.appendix_three();
        }
        let story = builder.finish();

        let viewer = viewer_label(record.text(VIEWER_KEY), &layout.default_viewer);
        let decorator = ReportDecorator::new(layout, viewer, logo);
        let source = RenderEngine::new(layout).markup(&story, &decorator, &mut images, &layout.document_title)?;
        Ok((source, images))
    }
}

/// Builds the block list section by section.
struct StoryBuilder<'a> {
    layout: &'a LayoutConfig,
    record: &'a Record,
    story: Vec<Block>,
}

impl<'a> StoryBuilder<'a> {
    fn new(layout: &'a LayoutConfig, record: &'a Record) -> Self {
        Self {
            layout,
            record,
            story: Vec::new(),
        }
    }

    fn finish(self) -> Vec<Block> {
        self.story
    }

    fn push(&mut self, block: Block) {
        self.story.push(block);
    }

    fn extend(&mut self, blocks: Vec<Block>) {
        self.story.extend(blocks);
    }

    fn spacer(&mut self, inches: f32) {
        self.push(Block::Spacer(inches * INCH));
    }

    /// Highlighted cell holding a student answer.
    fn answer(&self, key: &str) -> Cell {
        Cell::text(self.record.text(key)).fill(self.layout.highlight)
    }

    fn header(&self, text: &str) -> Cell {
        Cell::text(text).fill(self.layout.light_grey)
    }

    fn table(&self, columns: &[f32], rows: Vec<Row>) -> Table {
        Table::new(
            columns.iter().map(|width| width * INCH).collect(),
            rows,
            self.layout.table_size,
        )
    }

    fn uploaded_file_cell(&self, key: &str) -> Cell {
        let upload = self.record.upload(key);
        let name = if upload.is_empty() {
            String::new()
        } else {
            upload.display_name()
        };
        Cell::text(format!("Uploaded file: {}", name)).fill(self.layout.highlight)
    }

    fn cover(&mut self, score: Option<&Score>) {
        let layout = self.layout;
        self.spacer(0.70);
        self.push(layout.title("LAB 1"));
        self.spacer(0.10);
        self.push(layout.title("MEASUREMENTS AND\nERROR ANALYSIS"));
        self.spacer(1.30);

        let mut rows: Vec<Row> = [
            ("Name :", "member1"),
            ("Lab partner name 1 :", "member2"),
            ("Lab partner name 2 :", "member3"),
            ("Date :", "lab_date"),
        ]
        .iter()
        .map(|(label, key)| Row::new(vec![Cell::text(*label), self.answer(key)]))
        .collect();

        if let Some(score) = score {
            let band = band_color(layout, score);
            rows.push(Row::new(vec![
                Cell::text("Completion score :").fill(band),
                Cell::text(score.summary()).fill(band),
            ]));
        }

        let mut table = self.table(&[2.2, 4.8], rows).padding(8.0);
        table.font_size = layout.cover_size;
        self.push(Block::Table(table));
        self.push(Block::PageBreak);
    }

    fn part_one(&mut self) {
        let devices = [
            ("a", "meter stick", "unc_meterstick"),
            ("b", "metric ruler", "unc_ruler"),
            ("c", "triple-beam balance", "unc_triple"),
            ("d", "digital balance", "unc_digital"),
            ("e", "vernier calipers", "unc_vernier"),
            ("f", "micrometer", "unc_micrometer"),
        ];
        let mut rows = vec![Row::new(vec![
            self.header(""),
            self.header("Measuring Device"),
            self.header("Uncertainty"),
        ])];
        rows.extend(devices.iter().map(|(letter, device, key)| {
            Row::new(vec![Cell::text(*letter), Cell::text(*device), self.answer(key)])
        }));
        let table = self.table(&[0.35, 3.7, 2.95], rows);
        self.push(Block::Table(table));
        self.push(Block::PageBreak);
    }

    /// One data-entry section: identification, dimensions, expression,
    /// result, evidence and best estimate.
    fn section(&mut self, spec: &SectionSpec) {
        let layout = self.layout;
        self.push(Block::PageBreak);
        self.push(layout.heading2(spec.title));
        if let Some(instructions) = spec.instructions {
            self.push(layout.body(instructions));
            self.spacer(0.04);
            self.push(layout.body_bold("Results :"));
        }
        self.spacer(0.06);

        if let Some(id) = spec.identification {
            let tool = match id.tool {
                ToolSource::Fixed(label) => Cell::text(label),
                ToolSource::Field(key) => self.answer(key),
            };
            let rows = vec![
                Row::new(vec![Cell::text("Measuring tool"), tool]),
                Row::new(vec![Cell::text("Object"), self.answer(id.object_key)]),
            ];
            let table = self.table(&[2.5, 4.5], rows);
            self.push(Block::Table(table));
            self.spacer(0.08);
        }

        if let Some(dims) = spec.dimensions {
            let rows = vec![
                Row::new(vec![
                    Cell::text(dims.subject),
                    Cell::text("Length"),
                    Cell::text("Width"),
                    Cell::text("Thickness"),
                ]),
                Row::new(vec![
                    Cell::text("Dimensions (cm)"),
                    self.answer(dims.keys[0]),
                    self.answer(dims.keys[1]),
                    self.answer(dims.keys[2]),
                ]),
            ];
            let table = self.table(&[1.8, 1.7, 1.7, 1.8], rows);
            self.push(Block::Table(table));
            self.spacer(0.08);
        }

        let expression = vec![Row::new(vec![
            Cell::text(spec.expression_prompt),
            self.answer(spec.expression_key),
        ])];
        let table = self.table(&[3.2, 3.8], expression);
        self.push(Block::Table(table));
        self.spacer(0.08);

        let result = vec![
            Row::new(vec![
                Cell::text(""),
                Cell::text(spec.quantity.label()),
                Cell::text("Units"),
            ]),
            Row::new(vec![
                Cell::text(spec.subject_label),
                self.answer(spec.value_key),
                self.answer(spec.units_key),
            ]),
        ];
        let table = self.table(&[1.9, 3.0, 2.1], result);
        self.push(Block::Table(table));
        self.spacer(0.08);

        let upload = vec![Row::new(vec![
            Cell::text(spec.upload_prompt),
            self.uploaded_file_cell(spec.upload_key),
        ])];
        let table = self.table(&[3.2, 3.8], upload);
        self.push(Block::Table(table));
        self.evidence(spec.upload_label, spec.upload_key);

        let table = self.estimate_table(
            spec.quantity.label(),
            spec.subject_label,
            [spec.best_key, spec.error_key, spec.error_units_key],
        );
        self.push(Block::Table(table));
    }

    /// `value ± error units` row under a grey header.
    fn estimate_table(&self, quantity: &str, subject: &str, keys: [&str; 3]) -> Table {
        let rows = vec![
            Row::new(vec![
                self.header(""),
                self.header(quantity),
                self.header(""),
                self.header("Error"),
                self.header("Units"),
            ]),
            Row::new(vec![
                Cell::text(subject),
                self.answer(keys[0]),
                Cell::text("\u{b1}").align(Align::Center),
                self.answer(keys[1]),
                self.answer(keys[2]),
            ]),
        ];
        self.table(&[1.9, 1.7, 0.35, 1.7, 1.35], rows)
    }

    fn mass(&mut self, specs: &[MassSpec]) {
        self.push(Block::PageBreak);
        self.push(self.layout.heading2("Mass of Aluminum Block"));
        for spec in specs {
            self.spacer(0.10);
            self.push(self.layout.body_bold(spec.title));
            let rows = vec![
                Row::new(vec![Cell::text("Measuring tool"), Cell::text(spec.tool_label)]),
                Row::new(vec![Cell::text("Object"), self.answer(spec.object_key)]),
            ];
            let table = self.table(&[2.5, 4.5], rows);
            self.push(Block::Table(table));
            self.spacer(0.08);
            let table = self.estimate_table(
                "Mass",
                "Aluminum Block",
                [spec.mass_key, spec.error_key, spec.units_key],
            );
            self.push(Block::Table(table));
        }
    }

    fn sample_calculation(&mut self) {
        self.spacer(0.12);
        self.upload_summary("Sample Calculation :", "sample_calc");
        self.evidence("Sample calculation", "sample_calc");
    }

    /// Two-cell "label / Uploaded file" row, both highlighted.
    fn upload_summary(&mut self, label: &str, key: &str) {
        let rows = vec![Row::new(vec![
            Cell::text(label).fill(self.layout.highlight),
            self.uploaded_file_cell(key),
        ])];
        let table = self.table(&[2.2, 4.8], rows);
        self.push(Block::Table(table));
    }

    fn data_analysis(&mut self) {
        self.push(Block::PageBreak);
        self.push(self.layout.heading1("Data Analysis"));
        self.spacer(0.08);

        let rows = vec![
            Row::new(vec![
                self.header("% error table"),
                self.header("Triple beam\nbalance and the\nMetric Ruler"),
                self.header("Digital balance\nand the Vernier\nCaliper"),
                self.header("Digital balance\nand the\nMicrometer"),
            ]),
            Row::new(vec![
                Cell::text("% error"),
                self.answer("perr_1"),
                self.answer("perr_2"),
                self.answer("perr_3"),
            ]),
        ];
        let table = self.table(&[1.5, 1.85, 1.85, 1.8], rows);
        self.push(Block::Table(table));

        self.spacer(0.08);
        self.upload_summary("Sample Calculation :", "perr_upload");
        self.evidence("Percent error sample calculation", "perr_upload");

        for question in QUESTIONS {
            self.spacer(0.10);
            self.push(self.layout.body(question.prompt));
            let rows = vec![Row::new(vec![
                Cell::text("Answer:"),
                self.answer(question.answer_key),
            ])];
            let table = self.table(&[1.0, 6.0], rows);
            self.push(Block::Table(table));
        }
    }

    fn appendix_one(&mut self, grids: &[GridSpec]) {
        self.push(Block::WideFrame);
        self.push(self.layout.heading1("APPENDIX I - Images of Measurements"));
        self.spacer(0.12);

        let frame_width = self.layout.wide_frame().width;
        for grid in grids {
            self.push(self.layout.body_bold(grid.title));
            self.spacer(0.06);
            let table = self.grid_table(grid, frame_width);
            self.push(Block::Table(table));
            if grid.space_after > 0.0 {
                self.push(Block::Spacer(grid.space_after));
            }
        }
    }

    fn grid_table(&self, grid: &GridSpec, frame_width: f32) -> Table {
        let cell_height = self.layout.appendix_cell.1;
        let mut header = Vec::new();
        if grid.has_label_column() {
            header.push(Cell::text(""));
        }
        header.extend(
            grid.headings
                .iter()
                .map(|heading| Cell::text(*heading).bold().align(Align::Center)),
        );
        let mut rows = vec![Row::with_height(header, grid.header_height)];

        for row in grid.rows {
            let mut cells = Vec::new();
            if let Some(label) = row.label {
                cells.push(Cell::rotated(label));
            }
            cells.extend(row.upload_keys.iter().map(|key| self.appendix_cell(key)));
            rows.push(Row::with_height(cells, cell_height));
        }

        Table::new(grid.column_widths(frame_width), rows, self.layout.table_size)
            .padding(3.0)
            .strokes(1.2, 1.2)
    }

    /// Thumbnail cell; missing uploads leave a blank cell of the same size.
    fn appendix_cell(&self, key: &str) -> Cell {
        let upload = self.record.upload(key);
        let cell = match (upload, upload.exists()) {
            (UploadRef::Stored(stored), true) => match stored.kind {
                UploadKind::Image => Cell::image(Some(stored.path.clone())),
                UploadKind::Pdf => Cell::text("(PDF appended)").align(Align::Center),
                UploadKind::Unsupported => Cell::image(None),
            },
            _ => Cell::image(None),
        };
        cell.fill(self.layout.highlight)
    }

    fn appendix_two(&mut self) {
        self.push(Block::PageBreak);
        self.push(self.layout.heading1("Appendix II"));
        self.push(self.layout.body("Instructor signed data from the experiment"));
        self.spacer(0.08);
        let rows = vec![Row::new(vec![
            Cell::text("Signed data from the lab"),
            self.uploaded_file_cell("signed_data"),
        ])];
        let table = self.table(&[3.2, 3.8], rows);
        self.push(Block::Table(table));
        self.evidence("Signed data", "signed_data");
    }

    fn appendix_three(&mut self) {
        self.push(Block::PageBreak);
        self.push(self.layout.heading1("Appendix III"));
        self.push(self.layout.small(RESTRICTED_NOTE));
    }

    /// Label line plus the uploaded image, or a note for paged documents.
    fn evidence(&mut self, label: &str, key: &str) {
        let record = self.record;
        let upload = record.upload(key);
        let UploadRef::Stored(stored) = upload else {
            return;
        };
        if !upload.exists() {
            log::debug!("upload for '{}' no longer exists, evidence skipped", key);
            return;
        }

        let layout = self.layout;
        self.spacer(0.08);
        self.push(layout.small(&format!("{}: {}", label, upload.display_name())));
        self.spacer(0.06);
        match stored.kind {
            UploadKind::Image => self.push(Block::Figure(Figure {
                path: stored.path.clone(),
                width: layout.upload_box.0,
                height: layout.upload_box.1,
                border: Some(1.2),
            })),
            UploadKind::Pdf => self.push(layout.note(PDF_PLACEHOLDER)),
            UploadKind::Unsupported => self.push(layout.note(UNSUPPORTED_PLACEHOLDER)),
        }
        self.spacer(0.10);
    }
}

/// Fill colour for a score band.
fn band_color(layout: &LayoutConfig, score: &Score) -> Rgb {
    match score.band(layout.band_high_threshold, layout.band_medium_threshold) {
        ScoreBand::High => layout.band_high,
        ScoreBand::Medium => layout.band_medium,
        ScoreBand::Low => layout.band_low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::report::render::CellContent;
    use crate::report::sections::GridColumns;
    use crate::report::schema::{REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS};
    use crate::report::scoring::score;
    use image::{Rgb as Pixel, RgbImage};
    use lopdf::Document;

    fn record(dir: &Path) -> Record {
        let mut record = Record::collect([
            ("member1", "Jane Doe"),
            ("lab_date", "2026-01-15"),
            ("p2_expr", "sigma_V = V * sqrt(...)\nsecond line"),
            ("qa2", "The micrometer."),
        ]);
        let image_path = dir.join("d1_20260115_101010_work.png");
        RgbImage::from_pixel(40, 20, Pixel([0, 120, 200])).save(&image_path).unwrap();
        record.set_upload("d1_upload", UploadRef::stored("work.png", image_path.clone()));
        record.set_upload("app1_table_length", UploadRef::stored("work.png", image_path));
        record
    }

    fn composer(static_dir: &Path, show_score: bool) -> Composer {
        Composer::new(LayoutConfig::default(), static_dir, show_score)
    }

    fn markup(record: &Record, privileged: bool) -> String {
        let static_dir = tempfile::tempdir().unwrap();
        let score = score(record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        composer(static_dir.path(), true)
            .markup(record, privileged, &score)
            .unwrap()
    }

    fn compose(record: &Record, privileged: bool) -> Vec<u8> {
        let static_dir = tempfile::tempdir().unwrap();
        let score = score(record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        composer(static_dir.path(), true)
            .compose(record, privileged, &score)
            .unwrap()
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_compose_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let record = record(dir.path());
        assert_eq!(compose(&record, false), compose(&record, false));
    }

    #[test]
    fn test_restricted_section_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let record = record(dir.path());

        assert!(!markup(&record, false).contains("Instructor-only reference section"));
        assert!(markup(&record, true).contains("Instructor-only reference section"));
        assert!(page_count(&compose(&record, true)) > page_count(&compose(&record, false)));
    }

    #[test]
    fn test_cover_and_answers_written() {
        let dir = tempfile::tempdir().unwrap();
        let record = record(dir.path());
        let source = markup(&record, false);
        assert!(source.contains("\"Jane Doe\""));
        assert!(source.contains("Completion score"));
        assert!(source.contains("\"sigma_V = V * sqrt(...)\\nsecond line\""));
        assert!(source.contains("d1_20260115_101010_work.png"));
        assert!(source.contains("\"Professor Name\""));
        assert!(page_count(&compose(&record, false)) >= 15);
    }

    #[test]
    fn test_long_answer_extends_report_instead_of_overflowing() {
        let short = Record::collect([("member1", "Jane"), ("lab_date", "2026-01-15")]);
        let long_answer = vec!["uncertainty"; 1200].join(" ");
        let long = Record::collect([
            ("member1", "Jane"),
            ("lab_date", "2026-01-15"),
            ("qa2", long_answer.as_str()),
        ]);

        let short_pages = page_count(&compose(&short, false));
        let long_pages = page_count(&compose(&long, false));
        assert!(
            long_pages >= short_pages + 2,
            "a 1,200 word answer should add pages ({} vs {})",
            long_pages,
            short_pages
        );
        assert!(markup(&long, false).contains(&long_answer));
    }

    #[test]
    fn test_uploaded_image_embedded_once() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = compose(&record(dir.path()), false);
        let doc = Document::load_mem(&bytes).unwrap();
        let images = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|subtype| subtype.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(images, 1);
    }

    #[test]
    fn test_score_row_follows_toggle() {
        let record = Record::collect([("member1", "Jane"), ("lab_date", "2026-01-15")]);
        let static_dir = tempfile::tempdir().unwrap();
        let score = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        let source = composer(static_dir.path(), false)
            .markup(&record, false, &score)
            .unwrap();
        assert!(!source.contains("Completion score"));
    }

    #[test]
    fn test_empty_record_leaves_uniform_blank_grid() {
        let layout = LayoutConfig::default();
        let record = Record::default();
        let builder = StoryBuilder::new(&layout, &record);
        let frame_width = layout.wide_frame().width;
        let (cell_width, cell_height) = layout.appendix_cell;

        for grid in APPENDIX_GRIDS {
            let table = builder.grid_table(grid, frame_width);
            assert_eq!(table.rows.len(), grid.rows.len() + 1, "{}", grid.title);
            assert_eq!(table.rows[0].height, Some(grid.header_height));

            let image_columns = &table.columns[table.columns.len() - grid.headings.len()..];
            for row in &table.rows[1..] {
                assert_eq!(row.height, Some(cell_height), "{}", grid.title);
                let cells = &row.cells[row.cells.len() - grid.headings.len()..];
                for cell in cells {
                    assert!(matches!(cell.content, CellContent::Image(None)), "{}", grid.title);
                    assert_eq!(cell.fill, Some(layout.highlight));
                }
            }
            if !matches!(grid.columns, GridColumns::LeadingFixed { .. }) {
                let first = image_columns[0];
                assert!(image_columns.iter().all(|width| (width - first).abs() < 0.01));
                assert!(first >= cell_width, "{}", grid.title);
            }
        }
    }

    #[test]
    fn test_corrupt_uploaded_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perr_20260115_101010_bad.png");
        std::fs::write(&path, b"definitely not png").unwrap();
        let mut record = Record::collect([("member1", "Jane"), ("lab_date", "2026-01-15")]);
        record.set_upload("perr_upload", UploadRef::stored("bad.png", path));

        let score = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        let err = composer(dir.path(), true)
            .compose(&record, false, &score)
            .unwrap_err();
        assert!(matches!(err, ReportError::ImageDecode { .. }));
        assert!(err.is_client_error());
    }
}
