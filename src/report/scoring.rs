//! Completion scoring over the required fields.

use serde::Serialize;

use super::record::Record;

/// Completion score of one record. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub score: usize,
    pub total: usize,
    /// Unsatisfied keys: text keys first, then upload keys, each in list order.
    pub missing: Vec<String>,
}

/// Colour band of the completion row on the cover page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl Score {
    /// `round(100 * score / total)`, rounding half to even; 0 when nothing is required.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let exact = 100.0 * self.score as f64 / self.total as f64;
        exact.round_ties_even() as u32
    }

    pub fn band(&self, high_threshold: u32, medium_threshold: u32) -> ScoreBand {
        let pct = self.percentage();
        if pct >= high_threshold {
            ScoreBand::High
        } else if pct >= medium_threshold {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }

    /// Cover page text, e.g. `"12/20 (60%)"`.
    pub fn summary(&self) -> String {
        format!("{}/{} ({}%)", self.score, self.total, self.percentage())
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Score a record against the required text and upload keys.
///
/// An upload only counts while its stored file exists, so the score reflects
/// the attachments that will actually appear in the document.
pub fn score(record: &Record, required_text_keys: &[&str], required_upload_keys: &[&str]) -> Score {
    let mut satisfied = 0;
    let mut missing = Vec::new();

    for key in required_text_keys {
        if record.text(key).trim().is_empty() {
            missing.push(key.to_string());
        } else {
            satisfied += 1;
        }
    }

    for key in required_upload_keys {
        let upload = record.upload(key);
        if !upload.is_empty() && upload.exists() {
            satisfied += 1;
        } else {
            missing.push(key.to_string());
        }
    }

    Score {
        score: satisfied,
        total: required_text_keys.len() + required_upload_keys.len(),
        missing,
    }
}
