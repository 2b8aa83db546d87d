//! Severity tag recovery from free-text model output
//!
//! The model is asked to finish with `SEVERITY: MILD` or `SEVERITY: SERIOUS`
//! on a line of its own. Models drift: they bold the label, wrap it in
//! brackets, swap the colon for `=` or `-`, or add a trailing period. All of
//! that is accepted. What is never accepted is guessing: no tag, or tags
//! that disagree, is a parse failure.

use regex::Regex;
use sdk::types::Severity;
use std::sync::OnceLock;

/// Outcome of parsing model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeverityParse {
    /// A single consistent tag was found
    Parsed {
        severity: Severity,
        /// Model output with the tag line(s) removed
        advice: String,
    },

    /// No usable tag; the reason is suitable for logs
    Failure(String),
}

static TAG_LINE: OnceLock<Option<Regex>> = OnceLock::new();

fn tag_line() -> Option<&'static Regex> {
    TAG_LINE
        .get_or_init(|| {
            // Whole line: optional decoration, "severity" (optionally "level"),
            // separator, optional decoration, the label, optional trailing decoration.
            Regex::new(
                r"(?i)^[\s*_#>\[(`-]*severity(?:\s+level)?[\s*_\])`]*[:=\-][\s*_\[(`]*(mild|serious)[\s*_.!\])`]*$",
            )
            .ok()
        })
        .as_ref()
}

/// Recover the severity tag from model output
///
/// # Examples
///
/// ```
/// use triage_engine::llm::{parse_severity, SeverityParse};
/// use sdk::types::Severity;
///
/// let parsed = parse_severity("Rest and drink fluids.\n**Severity:** Mild.");
/// assert_eq!(
///     parsed,
///     SeverityParse::Parsed {
///         severity: Severity::Mild,
///         advice: "Rest and drink fluids.".to_string(),
///     }
/// );
///
/// assert!(matches!(parse_severity("Rest and drink fluids."), SeverityParse::Failure(_)));
/// ```
pub fn parse_severity(output: &str) -> SeverityParse {
    let Some(pattern) = tag_line() else {
        return SeverityParse::Failure("Severity tag pattern failed to compile".to_string());
    };
    let mut found: Option<Severity> = None;
    let mut advice_lines = Vec::new();

    for line in output.lines() {
        let Some(captures) = pattern.captures(line.trim()) else {
            advice_lines.push(line);
            continue;
        };

        let severity = match captures.get(1).map(|m| m.as_str().parse::<Severity>()) {
            Some(Ok(severity)) => severity,
            _ => return SeverityParse::Failure(format!("Unreadable severity tag: {}", line)),
        };

        match found {
            Some(previous) if previous != severity => {
                return SeverityParse::Failure(format!(
                    "Conflicting severity tags: {} and {}",
                    previous, severity
                ));
            }
            _ => found = Some(severity),
        }
    }

    let Some(severity) = found else {
        return SeverityParse::Failure("No severity tag in model output".to_string());
    };

    let advice = advice_lines.join("\n").trim().to_string();
    if advice.is_empty() {
        return SeverityParse::Failure("Model output contained only a severity tag".to_string());
    }

    SeverityParse::Parsed { severity, advice }
}
