//! Deterministic fallback classifier
//!
//! Keyword rules over lowercased text. Every serious rule is checked before
//! any mild rule, so text that mentions both a serious and a mild cue is
//! classified serious. Within a tier the first declared rule wins.

use super::ensure_disclaimer;
use sdk::types::{Severity, TriageResult};

/// One keyword rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Short name used in debug logs
    pub name: &'static str,

    /// Lowercase substrings; any one matching triggers the rule
    pub keywords: &'static [&'static str],

    /// Result returned when the rule fires
    pub result: TriageResult,
}

impl Rule {
    fn new(
        name: &'static str,
        keywords: &'static [&'static str],
        advice: &str,
        severity: Severity,
    ) -> Self {
        Self {
            name,
            keywords,
            result: TriageResult::new(ensure_disclaimer(advice), severity),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

const CHEST_ADVICE: &str = "⚠️ CHEST PAIN requires immediate medical attention. Please contact emergency services (911) or go to the nearest emergency room immediately. Do not delay seeking medical care for chest pain.";

const BREATHING_ADVICE: &str = "⚠️ DIFFICULTY BREATHING is a serious symptom. Seek immediate medical attention by calling emergency services (911) or going to the nearest emergency room. This requires urgent evaluation by healthcare professionals.";

const CONSCIOUSNESS_ADVICE: &str = "⚠️ LOSS OF CONSCIOUSNESS or fainting needs urgent evaluation. Call emergency services (911) now. If the person is unresponsive, check breathing and stay with them until help arrives.";

const BLEEDING_ADVICE: &str = "⚠️ HEAVY BLEEDING is an emergency. Apply firm, direct pressure to the wound with a clean cloth and call emergency services (911) or go to the nearest emergency room immediately.";

const SEVERE_ADVICE: &str = "⚠️ Based on your symptoms, this appears to require immediate medical attention. Please contact emergency services (911) or go to the nearest emergency room right away. Do not delay seeking professional medical care.";

const HEADACHE_ADVICE: &str = "For mild headaches, try: Rest in a quiet, dark room; Stay hydrated; Apply a cold or warm compress to your head; Consider over-the-counter pain relievers like ibuprofen or acetaminophen. If headaches persist or worsen, consult a healthcare provider.";

const COLD_ADVICE: &str = "For common cold symptoms: Get plenty of rest; Stay hydrated with water, warm tea, or clear broths; Use a humidifier or breathe steam from a hot shower; Gargle with warm salt water for sore throat. Most cold symptoms resolve within 7-10 days. Consult a doctor if symptoms worsen or persist beyond 10 days.";

const FEVER_ADVICE: &str = "For mild fever (under 102°F / 39°C): Rest and stay hydrated; Use over-the-counter fever reducers like acetaminophen or ibuprofen; Dress lightly and use cool compresses; Monitor temperature regularly. Seek medical attention if fever exceeds 102°F, persists more than 3 days, or is accompanied by severe symptoms.";

const MINOR_ADVICE: &str = "For minor symptoms: Get adequate rest; Stay well-hydrated; Monitor how you feel over the next few days; Consider over-the-counter remedies if appropriate. If symptoms worsen or persist, consult a healthcare professional.";

/// Advice returned when no rule matches
pub const GENERIC_ADVICE: &str = "Based on your symptoms, here are some general recommendations: Get adequate rest; Stay well-hydrated; Monitor your symptoms; Consider over-the-counter remedies if appropriate. If symptoms persist or worsen, or you have concerns, please consult a healthcare professional for proper evaluation and treatment.";

/// Keyword classifier used when the external model is not consulted
///
/// The rule table is built once in [`FallbackClassifier::new`] and never
/// mutated, so a single instance can be shared across tasks.
#[derive(Debug, Clone)]
pub struct FallbackClassifier {
    serious: Vec<Rule>,
    mild: Vec<Rule>,
    default: TriageResult,
}

impl FallbackClassifier {
    /// Build the standard rule table
    pub fn new() -> Self {
        let serious = vec![
            Rule::new("chest", &["chest pain", "chest"], CHEST_ADVICE, Severity::Serious),
            Rule::new(
                "breathing",
                &[
                    "difficulty breathing",
                    "shortness of breath",
                    "can't breathe",
                    "cannot breathe",
                    "breath",
                    "breathing",
                ],
                BREATHING_ADVICE,
                Severity::Serious,
            ),
            Rule::new(
                "consciousness",
                &[
                    "unconscious",
                    "loss of consciousness",
                    "passed out",
                    "fainted",
                    "unresponsive",
                ],
                CONSCIOUSNESS_ADVICE,
                Severity::Serious,
            ),
            Rule::new(
                "bleeding",
                &["bleeding heavily", "heavy bleeding", "severe bleeding", "won't stop bleeding"],
                BLEEDING_ADVICE,
                Severity::Serious,
            ),
            Rule::new(
                "severe",
                &["severe", "emergency", "high fever"],
                SEVERE_ADVICE,
                Severity::Serious,
            ),
        ];

        let mild = vec![
            Rule::new("headache", &["headache", "head"], HEADACHE_ADVICE, Severity::Mild),
            Rule::new(
                "cold",
                &["cold", "cough", "runny nose", "sore throat", "sneez"],
                COLD_ADVICE,
                Severity::Mild,
            ),
            Rule::new(
                "fever",
                &["mild fever", "slight fever", "low fever", "fever"],
                FEVER_ADVICE,
                Severity::Mild,
            ),
            Rule::new(
                "minor",
                &["mild", "slight", "little", "minor"],
                MINOR_ADVICE,
                Severity::Mild,
            ),
        ];

        Self {
            serious,
            mild,
            default: TriageResult::new(ensure_disclaimer(GENERIC_ADVICE), Severity::Mild),
        }
    }

    /// Classify free text. Total and pure: the same input always yields the same result.
    pub fn classify(&self, text: &str) -> TriageResult {
        let lowered = text.to_lowercase();

        let matched = self
            .serious
            .iter()
            .chain(self.mild.iter())
            .find(|rule| rule.matches(&lowered));

        match matched {
            Some(rule) => {
                tracing::debug!("Fallback rule '{}' matched", rule.name);
                rule.result.clone()
            }
            None => {
                tracing::debug!("No fallback rule matched, using generic advice");
                self.default.clone()
            }
        }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.serious.iter().chain(self.mild.iter())
    }
}

impl Default for FallbackClassifier {
    fn default() -> Self {
        Self::new()
    }
}
