//! Common utilities for report generation.
//!
//! Filename sanitising and output naming shared by the upload store and the
//! pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

/// Replace every run of characters outside `[A-Za-z0-9._-]` with `_`.
///
/// Returns `fallback` when nothing usable remains.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned.into_owned()
}

/// Sanitise a client-supplied upload filename.
///
/// Path components and reserved names are stripped before the character
/// filter runs, so `../../etc/passwd` cannot escape the storage directory.
pub fn sanitize_upload_filename(name: &str) -> String {
    let base = sanitize_filename::sanitize(name.trim());
    sanitize_filename(&base, "file")
}

/// Base of both output names: `{member1}_{lab_date}` with dots replaced.
pub fn output_base_name(primary_name: &str, date: &str) -> String {
    sanitize_filename(&format!("{}_{}", primary_name, date), "file").replace('.', "_")
}

pub fn student_filename(base: &str) -> String {
    format!("{}_STUDENT.pdf", base)
}

pub fn instructor_filename(base: &str) -> String {
    format!("{}_INSTRUCTOR.pdf", base)
}

/// Viewer name for the page header.
///
/// Adds the "Professor " title unless the name already carries it.
pub fn viewer_label(name: &str, default_label: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return default_label.to_string();
    }
    if name.to_lowercase().starts_with("professor") {
        name.to_string()
    } else {
        format!("Professor {}", name)
    }
}

/// Static asset path, resolved against the configured asset directory.
pub fn static_asset(static_dir: &Path, name: &str) -> PathBuf {
    static_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Jane Doe", "file"), "Jane_Doe");
        assert_eq!(sanitize_filename("a  b!!c.png", "file"), "a_b_c.png");
        assert_eq!(sanitize_filename("", "file"), "file");
        assert_eq!(sanitize_filename("  ", "file"), "file");
        assert_eq!(sanitize_filename("ok-name_1.pdf", "file"), "ok-name_1.pdf");
    }

    #[test]
    fn test_sanitize_upload_filename_strips_paths() {
        let name = sanitize_upload_filename("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert_eq!(name, "....etcpasswd");
        assert_eq!(sanitize_upload_filename("my photo (1).png"), "my_photo_1_.png");
    }

    #[test]
    fn test_output_names() {
        let base = output_base_name("Jane Doe", "2026-01-15");
        assert_eq!(base, "Jane_Doe_2026-01-15");
        assert_eq!(student_filename(&base), "Jane_Doe_2026-01-15_STUDENT.pdf");
        assert_eq!(instructor_filename(&base), "Jane_Doe_2026-01-15_INSTRUCTOR.pdf");
        assert_eq!(output_base_name("J. Doe", "15.01.2026"), "J__Doe_15_01_2026");
    }

    #[test]
    fn test_viewer_label() {
        assert_eq!(viewer_label("", "Professor Name"), "Professor Name");
        assert_eq!(viewer_label("Smith", "Professor Name"), "Professor Smith");
        assert_eq!(viewer_label("professor smith", "Professor Name"), "professor smith");
    }
}
