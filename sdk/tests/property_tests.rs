use proptest::prelude::*;
use sdk::errors::{EngineError, EngineErrorExt};
use sdk::types::{Severity, TriageRequest};

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        // Every variant must produce a static, non-empty hint that never
        // echoes the raw detail string back to the user.
        let errs = vec![
            EngineError::Validation(error_str.clone()),
            EngineError::Config(error_str.clone()),
            EngineError::Storage(error_str.clone()),
            EngineError::Database(error_str.clone()),
            EngineError::KeyringError(error_str.clone()),
            EngineError::Network(error_str.clone()),
            EngineError::PathCanonicalization(std::path::PathBuf::from(&error_str), error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 8 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_severity_parse_is_closed(word in "[a-zA-Z]{1,12}") {
        match word.parse::<Severity>() {
            Ok(Severity::Mild) => prop_assert!(word.eq_ignore_ascii_case("mild")),
            Ok(Severity::Serious) => prop_assert!(word.eq_ignore_ascii_case("serious")),
            Err(_) => prop_assert!(
                !word.eq_ignore_ascii_case("mild") && !word.eq_ignore_ascii_case("serious")
            ),
        }
    }

    #[test]
    fn test_request_accepts_any_non_blank_text(text in "\\PC*[a-z]\\PC*") {
        let request = TriageRequest::new(text.clone());
        prop_assert!(request.is_ok());
        let request = request.unwrap();
        prop_assert_eq!(request.symptom_text(), text.as_str());
    }

    #[test]
    fn test_request_rejects_whitespace(ws in "[ \\t\\n\\r]*") {
        prop_assert!(TriageRequest::new(ws).is_err());
    }
}
