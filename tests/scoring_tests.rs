mod common;

#[cfg(test)]
mod scoring_tests {
    use super::common::*;
    use lab_report_server::report::schema::{REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS, UPLOAD_KEYS};
    use lab_report_server::report::{score, Record};
    use lab_report_server::storage::UploadStore;

    fn complete_record(store: &UploadStore) -> Record {
        let mut record = Record::collect(REQUIRED_TEXT_KEYS.iter().map(|key| (*key, "value")));
        for (key, prefix) in UPLOAD_KEYS {
            let reference = store
                .validate_and_store(Some(&png_upload("evidence.png")), prefix)
                .unwrap();
            assert!(record.set_upload(key, reference));
        }
        record
    }

    #[test]
    fn test_complete_submission_scores_full_marks() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let record = complete_record(&store);

        let result = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        assert_eq!(result.total, REQUIRED_TEXT_KEYS.len() + REQUIRED_UPLOAD_KEYS.len());
        assert_eq!(result.score, result.total);
        assert_eq!(result.percentage(), 100);
        assert!(result.is_complete());
    }

    #[test]
    fn test_deleted_upload_is_missing_again() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let record = complete_record(&store);

        let signed = record.upload("signed_data").path().unwrap().to_path_buf();
        std::fs::remove_file(signed).unwrap();

        let result = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);
        assert_eq!(result.score, result.total - 1);
        assert_eq!(result.missing, vec!["signed_data".to_string()]);
    }

    #[test]
    fn test_missing_keys_keep_list_order() {
        let record = Record::collect([("member2", "x"), ("qa6", "y")]);
        let result = score(&record, REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);

        assert_eq!(result.score, 2);
        assert_eq!(result.missing.first().map(String::as_str), Some("member1"));
        assert_eq!(result.missing.last().map(String::as_str), Some("signed_data"));
        let text_missing: Vec<&str> = result
            .missing
            .iter()
            .take(REQUIRED_TEXT_KEYS.len() - 2)
            .map(String::as_str)
            .collect();
        let expected: Vec<&str> = REQUIRED_TEXT_KEYS
            .iter()
            .copied()
            .filter(|key| *key != "member2" && *key != "qa6")
            .collect();
        assert_eq!(text_missing, expected);
    }

    #[test]
    fn test_empty_record_scores_zero() {
        let result = score(&Record::default(), REQUIRED_TEXT_KEYS, REQUIRED_UPLOAD_KEYS);

        let expected: Vec<String> = REQUIRED_TEXT_KEYS
            .iter()
            .chain(REQUIRED_UPLOAD_KEYS)
            .map(|key| key.to_string())
            .collect();
        assert_eq!(result.score, 0);
        assert_eq!(result.percentage(), 0);
        assert_eq!(result.missing, expected);
    }
}
