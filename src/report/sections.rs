//! Declarative descriptions of the repeating report blocks.
//!
//! The composer walks these lists instead of hand-writing each block, so a
//! new measurement section is one more entry here.

use super::layout::INCH;

/// Where the "Measuring tool" cell takes its value from.
#[derive(Debug, Clone, Copy)]
pub enum ToolSource {
    /// Printed as-is.
    Fixed(&'static str),
    /// Entered by the student.
    Field(&'static str),
}

/// Quantity computed in a data-entry section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Volume,
    Density,
}

impl Quantity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Density => "Density",
        }
    }
}

/// Identification block: measuring tool and measured object.
#[derive(Debug, Clone, Copy)]
pub struct Identification {
    pub tool: ToolSource,
    pub object_key: &'static str,
}

/// Length, width and thickness entries.
#[derive(Debug, Clone, Copy)]
pub struct Dimensions {
    /// Heading of the first column, e.g. "Tabletop".
    pub subject: &'static str,
    pub keys: [&'static str; 3],
}

/// One data-entry section (Part II, Part III per instrument, density).
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub title: &'static str,
    /// Numbered instructions printed under the title.
    pub instructions: Option<&'static str>,
    pub identification: Option<Identification>,
    pub dimensions: Option<Dimensions>,
    pub quantity: Quantity,
    /// Row label of the result tables, e.g. "Tabletop volume".
    pub subject_label: &'static str,
    pub expression_prompt: &'static str,
    pub expression_key: &'static str,
    pub value_key: &'static str,
    pub units_key: &'static str,
    pub upload_prompt: &'static str,
    pub upload_key: &'static str,
    pub upload_label: &'static str,
    pub best_key: &'static str,
    pub error_key: &'static str,
    pub error_units_key: &'static str,
}

/// Mass reading on one balance.
#[derive(Debug, Clone, Copy)]
pub struct MassSpec {
    pub title: &'static str,
    pub tool_label: &'static str,
    pub object_key: &'static str,
    pub mass_key: &'static str,
    pub error_key: &'static str,
    pub units_key: &'static str,
}

/// Free-text question with its answer field.
#[derive(Debug, Clone, Copy)]
pub struct QuestionSpec {
    pub prompt: &'static str,
    pub answer_key: &'static str,
}

/// How an appendix grid divides the frame width.
#[derive(Debug, Clone, Copy)]
pub enum GridColumns {
    /// Equal columns across the full width.
    Equal,
    /// A narrow label column, then equal columns.
    Labelled { label_width: f32 },
    /// A fixed first column; the second takes the rest.
    LeadingFixed { first_width: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct GridRow {
    /// Rotated label in the label column, for `GridColumns::Labelled`.
    pub label: Option<&'static str>,
    pub upload_keys: &'static [&'static str],
}

/// Thumbnail grid of Appendix I.
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub title: &'static str,
    pub headings: &'static [&'static str],
    pub header_height: f32,
    pub columns: GridColumns,
    pub rows: &'static [GridRow],
    pub space_after: f32,
}

const BLOCK_EXPRESSION: &str =
    "expression for the uncertainty \u{3c3}V in\nthe volume of the aluminum block";
const BLOCK_UPLOAD: &str = "Calculate the uncertainty \u{3c3}V in the\nvolume of the aluminum block";
const DENSITY_EXPRESSION: &str = "expression for the uncertainty \u{3c3}\u{3c1} in\nthe density";
const DENSITY_UPLOAD: &str =
    "Calculate the uncertainty \u{3c3}\u{3c1} in the\ndensity of the aluminum block";

// L, W, T, expression, volume, units, upload, best, error, error units.
type PartThreeKeys = [&'static str; 10];

const RULER_KEYS: PartThreeKeys = [
    "p3_ruler_L", "p3_ruler_W", "p3_ruler_T", "p3_ruler_expr", "p3_ruler_vol",
    "p3_ruler_vol_units", "p3_ruler_unc_upload", "p3_ruler_best", "p3_ruler_err",
    "p3_ruler_err_units",
];
const VERNIER_KEYS: PartThreeKeys = [
    "p3_vernier_L", "p3_vernier_W", "p3_vernier_T", "p3_vernier_expr", "p3_vernier_vol",
    "p3_vernier_vol_units", "p3_vernier_unc_upload", "p3_vernier_best", "p3_vernier_err",
    "p3_vernier_err_units",
];
const MICROMETER_KEYS: PartThreeKeys = [
    "p3_mic_L", "p3_mic_W", "p3_mic_T", "p3_mic_expr", "p3_mic_vol", "p3_mic_vol_units",
    "p3_mic_unc_upload", "p3_mic_best", "p3_mic_err", "p3_mic_err_units",
];

const fn part_three(
    title: &'static str,
    tool: &'static str,
    object_key: &'static str,
    keys: PartThreeKeys,
) -> SectionSpec {
    SectionSpec {
        title,
        instructions: None,
        identification: Some(Identification {
            tool: ToolSource::Fixed(tool),
            object_key,
        }),
        dimensions: Some(Dimensions {
            subject: "Aluminum block",
            keys: [keys[0], keys[1], keys[2]],
        }),
        quantity: Quantity::Volume,
        subject_label: "Aluminum block volume",
        expression_prompt: BLOCK_EXPRESSION,
        expression_key: keys[3],
        value_key: keys[4],
        units_key: keys[5],
        upload_prompt: BLOCK_UPLOAD,
        upload_key: keys[6],
        upload_label: "Uncertainty work (volume)",
        best_key: keys[7],
        error_key: keys[8],
        error_units_key: keys[9],
    }
}

// expression, density, units, upload, best, error, error units.
const fn density(title: &'static str, n: [&'static str; 7]) -> SectionSpec {
    SectionSpec {
        title,
        instructions: None,
        identification: None,
        dimensions: None,
        quantity: Quantity::Density,
        subject_label: "Aluminum Block Density",
        expression_prompt: DENSITY_EXPRESSION,
        expression_key: n[0],
        value_key: n[1],
        units_key: n[2],
        upload_prompt: DENSITY_UPLOAD,
        upload_key: n[3],
        upload_label: "Uncertainty work (density)",
        best_key: n[4],
        error_key: n[5],
        error_units_key: n[6],
    }
}

/// Part II and the three Part III instrument sections, in report order.
pub const MEASUREMENT_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        title: "Part II (Volume of Table-Top)",
        instructions: Some(
            "1. Measure the dimensions of your table-top with the meter stick.\n\
             2. Using error propagation equation derive an expression for the uncertainty \u{3c3}V for the volume of the table top.\n\
             3. Calculate the volume of the table top.\n\
             4. Calculate the uncertainty \u{3c3}V of the table top.",
        ),
        identification: Some(Identification {
            tool: ToolSource::Field("p2_tool"),
            object_key: "p2_object",
        }),
        dimensions: Some(Dimensions {
            subject: "Tabletop",
            keys: ["p2_L", "p2_W", "p2_T"],
        }),
        quantity: Quantity::Volume,
        subject_label: "Tabletop volume",
        expression_prompt: "expression for the uncertainty \u{3c3}V in\nthe volume of the table top",
        expression_key: "p2_expr",
        value_key: "p2_volume",
        units_key: "p2_vol_units",
        upload_prompt: "Calculate the uncertainty \u{3c3}V in the\nvolume of the table top",
        upload_key: "p2_unc_upload",
        upload_label: "Tabletop uncertainty work",
        best_key: "p2_vol_best",
        error_key: "p2_vol_err",
        error_units_key: "p2_vol_err_units",
    },
    part_three(
        "Part III (Density of Aluminum Block) - Dimensions Using Metric Ruler",
        "Metric Ruler",
        "p3_obj_ruler",
        RULER_KEYS,
    ),
    part_three(
        "Part III (Density of Aluminum Block) - Dimensions Using Vernier Caliper",
        "Vernier Caliper",
        "p3_obj_vernier",
        VERNIER_KEYS,
    ),
    part_three(
        "Part III (Density of Aluminum Block) - Dimensions Using Micrometer",
        "Micrometer",
        "p3_obj_mic",
        MICROMETER_KEYS,
    ),
];

pub const MASS_SECTIONS: &[MassSpec] = &[
    MassSpec {
        title: "Mass Using Triple-beam Balance",
        tool_label: "Triple-beam balance",
        object_key: "m_tb_obj",
        mass_key: "m_tb_mass",
        error_key: "m_tb_err",
        units_key: "m_tb_units",
    },
    MassSpec {
        title: "Mass Using Digital Balance",
        tool_label: "Digital balance",
        object_key: "m_dig_obj",
        mass_key: "m_dig_mass",
        error_key: "m_dig_err",
        units_key: "m_dig_units",
    },
];

pub const DENSITY_SECTIONS: &[SectionSpec] = &[
    density(
        "Density Estimate - Triple-beam balance and the Metric ruler.",
        ["d1_expr", "d1_density", "d1_units", "d1_upload", "d1_best", "d1_err", "d1_err_units"],
    ),
    density(
        "Density Estimate - Digital balance and the Vernier calipers.",
        ["d2_expr", "d2_density", "d2_units", "d2_upload", "d2_best", "d2_err", "d2_err_units"],
    ),
    density(
        "Density Estimate - Digital balance and the Micrometer.",
        ["d3_expr", "d3_density", "d3_units", "d3_upload", "d3_best", "d3_err", "d3_err_units"],
    ),
];

pub const QUESTIONS: &[QuestionSpec] = &[
    QuestionSpec {
        prompt: "2. Which of the 3 densities gave the most accurate answer? Was this what you expected why or why not? Explain!",
        answer_key: "qa2",
    },
    QuestionSpec {
        prompt: "3. Was the propagating error involved in calculating the density significant with any combination of the measuring devices? Explain.",
        answer_key: "qa3",
    },
    QuestionSpec {
        prompt: "4. What were the random errors involved and how did they affect the density and uncertainty calculation?",
        answer_key: "qa4",
    },
    QuestionSpec {
        prompt: "5. What systematic errors were involved?",
        answer_key: "qa5",
    },
    QuestionSpec {
        prompt: "6. Comment on any other sources of error that could have been involved.",
        answer_key: "qa6",
    },
];

pub const APPENDIX_GRIDS: &[GridSpec] = &[
    GridSpec {
        title: "Part II - Volume of Tabletop - Meter Ruler",
        headings: &["Length", "Width", "Height"],
        header_height: 0.32 * INCH,
        columns: GridColumns::Equal,
        rows: &[GridRow {
            label: None,
            upload_keys: &["app1_table_length", "app1_table_width", "app1_table_height"],
        }],
        space_after: 0.25 * INCH,
    },
    GridSpec {
        title: "Part III - Density of Aluminum Block",
        headings: &["Metric Ruler", "Vernier Caliper", "Micrometer"],
        header_height: 0.36 * INCH,
        columns: GridColumns::Labelled {
            label_width: 0.26 * INCH,
        },
        rows: &[
            GridRow {
                label: Some("LENGTH"),
                upload_keys: &["app1_length_ruler", "app1_length_vernier", "app1_length_micrometer"],
            },
            GridRow {
                label: Some("WIDTH"),
                upload_keys: &["app1_width_ruler", "app1_width_vernier", "app1_width_micrometer"],
            },
            GridRow {
                label: Some("HEIGHT"),
                upload_keys: &["app1_height_ruler", "app1_height_vernier", "app1_height_micrometer"],
            },
        ],
        space_after: 0.0,
    },
    GridSpec {
        title: "Part III - Mass Measurements",
        headings: &["DIGITAL BALANCE", "TRIPLE BEAM BALANCE"],
        header_height: 0.34 * INCH,
        columns: GridColumns::LeadingFixed {
            first_width: 2.5 * INCH,
        },
        rows: &[GridRow {
            label: None,
            upload_keys: &["app1_mass_digital", "app1_mass_triplebeam"],
        }],
        space_after: 0.18 * INCH,
    },
];

impl GridSpec {
    /// Column widths for a frame of `frame_width` points, label column first.
    pub fn column_widths(&self, frame_width: f32) -> Vec<f32> {
        let image_columns = self.headings.len();
        match self.columns {
            GridColumns::Equal => vec![frame_width / image_columns as f32; image_columns],
            GridColumns::Labelled { label_width } => {
                let mut widths = vec![label_width];
                widths.extend(vec![
                    (frame_width - label_width) / image_columns as f32;
                    image_columns
                ]);
                widths
            }
            GridColumns::LeadingFixed { first_width } => {
                vec![first_width, (frame_width - first_width).max(0.0)]
            }
        }
    }

    pub fn has_label_column(&self) -> bool {
        matches!(self.columns, GridColumns::Labelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::schema::{text_key, upload_key};

    fn section_text_keys(spec: &SectionSpec) -> Vec<&'static str> {
        let mut keys = vec![
            spec.expression_key,
            spec.value_key,
            spec.units_key,
            spec.best_key,
            spec.error_key,
            spec.error_units_key,
        ];
        if let Some(id) = spec.identification {
            keys.push(id.object_key);
            if let ToolSource::Field(key) = id.tool {
                keys.push(key);
            }
        }
        if let Some(dims) = spec.dimensions {
            keys.extend(dims.keys);
        }
        keys
    }

    #[test]
    fn test_section_keys_exist_in_schema() {
        for spec in MEASUREMENT_SECTIONS.iter().chain(DENSITY_SECTIONS) {
            for key in section_text_keys(spec) {
                assert!(text_key(key).is_some(), "{} missing from schema", key);
            }
            assert!(upload_key(spec.upload_key).is_some(), "{}", spec.upload_key);
        }
        for mass in MASS_SECTIONS {
            for key in [mass.object_key, mass.mass_key, mass.error_key, mass.units_key] {
                assert!(text_key(key).is_some(), "{}", key);
            }
        }
        for question in QUESTIONS {
            assert!(text_key(question.answer_key).is_some());
        }
    }

    #[test]
    fn test_grid_keys_exist_in_schema() {
        for grid in APPENDIX_GRIDS {
            for row in grid.rows {
                assert_eq!(row.upload_keys.len(), grid.headings.len());
                assert_eq!(row.label.is_some(), grid.has_label_column());
                for key in row.upload_keys {
                    assert!(upload_key(key).is_some(), "{}", key);
                }
            }
        }
    }

    #[test]
    fn test_column_widths_fill_frame() {
        for grid in APPENDIX_GRIDS {
            let widths = grid.column_widths(590.4);
            let total: f32 = widths.iter().sum();
            assert!((total - 590.4).abs() < 0.01, "{}", grid.title);
        }
    }
}
