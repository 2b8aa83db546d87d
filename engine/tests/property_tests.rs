use proptest::prelude::*;
use sdk::types::Severity;
use triage_engine::config::Config;
use triage_engine::llm::{parse_severity, SeverityParse};
use triage_engine::triage::{FallbackClassifier, DISCLAIMER};

const SERIOUS_CUES: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "fainted",
    "heavy bleeding",
    "severe",
    "emergency",
    "high fever",
];

const SEPARATORS: &[&str] = &[":", "=", "-", " :"];

const MILD_CUES: &[&str] = &["headache", "cough", "runny nose", "sore throat", "fever", "slight"];

proptest! {
    // Any input, however odd, gets advice with a disclaimer
    #[test]
    fn test_classifier_is_total(text in any::<String>()) {
        let result = FallbackClassifier::new().classify(&text);
        prop_assert!(result.advice.ends_with(DISCLAIMER));
        prop_assert!(matches!(result.severity, Severity::Mild | Severity::Serious));
    }

    #[test]
    fn test_classifier_is_deterministic(text in "\\PC{0,80}") {
        let classifier = FallbackClassifier::new();
        prop_assert_eq!(classifier.classify(&text), classifier.classify(&text));
        prop_assert_eq!(classifier.classify(&text), FallbackClassifier::new().classify(&text));
    }

    // A serious cue wins no matter what mild cues surround it
    #[test]
    fn test_serious_cue_takes_precedence(
        serious in prop::sample::select(SERIOUS_CUES),
        mild in prop::sample::select(MILD_CUES),
        filler in "[0-9 ]{0,12}",
        serious_first in any::<bool>(),
    ) {
        let text = if serious_first {
            format!("{}{} and {}", serious, filler, mild)
        } else {
            format!("{} {}and {}", mild, filler, serious)
        };
        prop_assert_eq!(FallbackClassifier::new().classify(&text).severity, Severity::Serious);
    }

    #[test]
    fn test_mild_cue_alone_is_mild(
        mild in prop::sample::select(MILD_CUES),
        filler in "[0-9 ]{0,12}",
    ) {
        let text = format!("{}{}", filler, mild.to_uppercase());
        prop_assert_eq!(FallbackClassifier::new().classify(&text).severity, Severity::Mild);
    }

    #[test]
    fn test_parse_recovers_tag_and_advice(
        advice in "[A-Za-z][A-Za-z ,.]{0,60}",
        serious in any::<bool>(),
        label_upper in any::<bool>(),
        separator in prop::sample::select(SEPARATORS),
    ) {
        let label = match (serious, label_upper) {
            (true, true) => "SERIOUS",
            (true, false) => "serious",
            (false, true) => "MILD",
            (false, false) => "mild",
        };
        let output = format!("{}\nSeverity{} {}", advice, separator, label);

        let expected = if serious { Severity::Serious } else { Severity::Mild };
        prop_assert_eq!(
            parse_severity(&output),
            SeverityParse::Parsed { severity: expected, advice: advice.trim().to_string() }
        );
    }

    #[test]
    fn test_parse_never_guesses(advice in "[A-Za-z ,.\n]{0,120}") {
        prop_assert!(matches!(parse_severity(&advice), SeverityParse::Failure(_)));
    }

    #[test]
    fn test_config_parsing_round_trip(
        log_level in "error|warn|info|debug|trace",
        backend in "json|sqlite|memory",
        timeout_secs in 1..=120u64,
        max_tokens in 1..=4096u32,
        temperature in 0.0..=2.0f64,
        port in 1024..=65535u16,
    ) {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let toml_content = format!(
            r#"
[core]
log_level = "{}"
data_dir = '{}'

[llm]
timeout_secs = {}

[llm.openai]
max_tokens = {}
temperature = {}

[history]
backend = "{}"

[server]
port = {}
"#,
            log_level,
            temp_dir.path().display(),
            timeout_secs,
            max_tokens,
            temperature,
            backend,
            port,
        );

        let config = Config::from_toml_str(&toml_content).unwrap();
        let serialized = toml::to_string(&config).unwrap();
        let reparsed = Config::from_toml_str(&serialized).unwrap();

        prop_assert_eq!(&reparsed.core.log_level, &log_level);
        prop_assert_eq!(reparsed.history.backend.as_str(), backend.as_str());
        prop_assert_eq!(reparsed.llm.timeout_secs, timeout_secs);
        prop_assert_eq!(reparsed.llm.openai.max_tokens, max_tokens);
        prop_assert_eq!(reparsed.llm.openai.temperature, temperature);
        prop_assert_eq!(reparsed.server.port, port);
        prop_assert_eq!(reparsed.core.data_dir, config.core.data_dir);
    }
}
