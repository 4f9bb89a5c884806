//! Fixed field schema of the lab report form.
//!
//! Keys are fixed at design time. Any key missing from a submission defaults
//! to an empty string or an empty upload reference.

/// Every text field accepted from the form, in form order.
pub const TEXT_KEYS: &[&str] = &[
    "member1", "member2", "member3", "lab_date", "professor_name",
    // Part I
    "unc_meterstick", "unc_ruler", "unc_triple", "unc_digital", "unc_vernier", "unc_micrometer",
    // Part II
    "p2_tool", "p2_object", "p2_L", "p2_W", "p2_T", "p2_expr", "p2_volume", "p2_vol_units",
    "p2_vol_best", "p2_vol_err", "p2_vol_err_units",
    // Part III - metric ruler
    "p3_obj_ruler", "p3_ruler_L", "p3_ruler_W", "p3_ruler_T", "p3_ruler_expr",
    "p3_ruler_vol", "p3_ruler_vol_units", "p3_ruler_best", "p3_ruler_err", "p3_ruler_err_units",
    // Part III - vernier
    "p3_obj_vernier", "p3_vernier_L", "p3_vernier_W", "p3_vernier_T", "p3_vernier_expr",
    "p3_vernier_vol", "p3_vernier_vol_units", "p3_vernier_best", "p3_vernier_err",
    "p3_vernier_err_units",
    // Part III - micrometer
    "p3_obj_mic", "p3_mic_L", "p3_mic_W", "p3_mic_T", "p3_mic_expr",
    "p3_mic_vol", "p3_mic_vol_units", "p3_mic_best", "p3_mic_err", "p3_mic_err_units",
    // Mass
    "m_tb_obj", "m_tb_mass", "m_tb_err", "m_tb_units",
    "m_dig_obj", "m_dig_mass", "m_dig_err", "m_dig_units",
    // Density
    "d1_expr", "d1_density", "d1_units", "d1_best", "d1_err", "d1_err_units",
    "d2_expr", "d2_density", "d2_units", "d2_best", "d2_err", "d2_err_units",
    "d3_expr", "d3_density", "d3_units", "d3_best", "d3_err", "d3_err_units",
    // Data analysis and questions
    "perr_1", "perr_2", "perr_3",
    "qa2", "qa3", "qa4", "qa5", "qa6",
];

/// Upload fields with the prefix used when naming the stored file.
///
/// The order here is also the order in which uploaded PDFs are appended.
pub const UPLOAD_KEYS: &[(&str, &str)] = &[
    ("p2_unc_upload", "p2_unc"),
    ("p3_ruler_unc_upload", "p3_ruler_unc"),
    ("p3_vernier_unc_upload", "p3_vernier_unc"),
    ("p3_mic_unc_upload", "p3_mic_unc"),
    ("d1_upload", "d1"),
    ("d2_upload", "d2"),
    ("d3_upload", "d3"),
    ("sample_calc", "sample_calc"),
    ("perr_upload", "perr"),
    ("signed_data", "signed"),
    // Appendix I images
    ("app1_table_length", "app1_table_length"),
    ("app1_table_width", "app1_table_width"),
    ("app1_table_height", "app1_table_height"),
    ("app1_length_ruler", "app1_length_ruler"),
    ("app1_length_vernier", "app1_length_vernier"),
    ("app1_length_micrometer", "app1_length_micrometer"),
    ("app1_width_ruler", "app1_width_ruler"),
    ("app1_width_vernier", "app1_width_vernier"),
    ("app1_width_micrometer", "app1_width_micrometer"),
    ("app1_height_ruler", "app1_height_ruler"),
    ("app1_height_vernier", "app1_height_vernier"),
    ("app1_height_micrometer", "app1_height_micrometer"),
    ("app1_mass_digital", "app1_mass_digital"),
    ("app1_mass_triplebeam", "app1_mass_triplebeam"),
];

/// Text fields counted by the completion score.
pub const REQUIRED_TEXT_KEYS: &[&str] = &[
    // Cover
    "member1", "member2", "lab_date",
    // Part I
    "unc_meterstick", "unc_ruler", "unc_triple", "unc_digital", "unc_vernier", "unc_micrometer",
    // Part II
    "p2_tool", "p2_object", "p2_L", "p2_W", "p2_T", "p2_volume", "p2_vol_units",
    "p2_vol_best", "p2_vol_err", "p2_vol_err_units",
    // Part III
    "p3_obj_ruler", "p3_ruler_L", "p3_ruler_W", "p3_ruler_T",
    "p3_ruler_vol", "p3_ruler_vol_units", "p3_ruler_best", "p3_ruler_err", "p3_ruler_err_units",
    "p3_obj_vernier", "p3_vernier_L", "p3_vernier_W", "p3_vernier_T",
    "p3_vernier_vol", "p3_vernier_vol_units", "p3_vernier_best", "p3_vernier_err",
    "p3_vernier_err_units",
    "p3_obj_mic", "p3_mic_L", "p3_mic_W", "p3_mic_T",
    "p3_mic_vol", "p3_mic_vol_units", "p3_mic_best", "p3_mic_err", "p3_mic_err_units",
    // Mass
    "m_tb_obj", "m_tb_mass", "m_tb_err", "m_tb_units",
    "m_dig_obj", "m_dig_mass", "m_dig_err", "m_dig_units",
    // Density
    "d1_density", "d1_units", "d1_best", "d1_err", "d1_err_units",
    "d2_density", "d2_units", "d2_best", "d2_err", "d2_err_units",
    "d3_density", "d3_units", "d3_best", "d3_err", "d3_err_units",
    // Data analysis and questions
    "perr_1", "perr_2", "perr_3",
    "qa2", "qa3", "qa4", "qa5", "qa6",
];

/// Upload fields counted by the completion score.
pub const REQUIRED_UPLOAD_KEYS: &[&str] = &[
    "p2_unc_upload",
    "p3_ruler_unc_upload",
    "p3_vernier_unc_upload",
    "p3_mic_unc_upload",
    "d1_upload", "d2_upload", "d3_upload",
    "perr_upload",
    "app1_table_length", "app1_table_width", "app1_table_height",
    "app1_length_ruler", "app1_length_vernier", "app1_length_micrometer",
    "app1_width_ruler", "app1_width_vernier", "app1_width_micrometer",
    "app1_height_ruler", "app1_height_vernier", "app1_height_micrometer",
    "app1_mass_digital", "app1_mass_triplebeam",
    "signed_data",
];

/// Primary identity field; also the first half of the output name.
pub const PRIMARY_NAME_KEY: &str = "member1";
/// Date field; the second half of the output name.
pub const DATE_KEY: &str = "lab_date";
/// Free-form viewer name shown in the page header.
pub const VIEWER_KEY: &str = "professor_name";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp"];
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// Accepted upload extensions, sorted and dotted, for error messages.
pub fn allowed_extensions() -> Vec<String> {
    let mut all: Vec<String> = IMAGE_EXTENSIONS
        .iter()
        .chain(PDF_EXTENSIONS)
        .map(|ext| format!(".{ext}"))
        .collect();
    all.sort();
    all
}

/// Canonical `'static` key for a text field name, if it belongs to the schema.
pub fn text_key(name: &str) -> Option<&'static str> {
    TEXT_KEYS.iter().copied().find(|key| *key == name)
}

/// Canonical `'static` key and storage prefix for an upload field name.
pub fn upload_key(name: &str) -> Option<(&'static str, &'static str)> {
    UPLOAD_KEYS.iter().copied().find(|(key, _)| *key == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_required_keys_belong_to_schema() {
        for key in REQUIRED_TEXT_KEYS {
            assert!(text_key(key).is_some(), "{key} missing from TEXT_KEYS");
        }
        for key in REQUIRED_UPLOAD_KEYS {
            assert!(upload_key(key).is_some(), "{key} missing from UPLOAD_KEYS");
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let text: HashSet<_> = TEXT_KEYS.iter().collect();
        assert_eq!(text.len(), TEXT_KEYS.len());
        let uploads: HashSet<_> = UPLOAD_KEYS.iter().map(|(key, _)| key).collect();
        assert_eq!(uploads.len(), UPLOAD_KEYS.len());
    }

    #[test]
    fn test_allowed_extensions_sorted() {
        assert_eq!(
            allowed_extensions(),
            vec![".jpeg", ".jpg", ".pdf", ".png", ".webp"]
        );
    }
}
