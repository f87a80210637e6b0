//! Built-in extraction configurations. One is selected per running instance.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

use crate::prompt::ExtractionConfig;
use crate::schema::{ExampleData, Extraction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Characters, emotions and relationships in literary text.
    #[default]
    Narrative,
    /// Savings and interest terms in a plain-language description.
    Financial,
}

impl Profile {
    pub fn config(&self) -> ExtractionConfig {
        match self {
            Profile::Narrative => narrative(),
            Profile::Financial => financial(),
        }
    }
}

impl FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "narrative" => Ok(Profile::Narrative),
            "financial" => Ok(Profile::Financial),
            other => bail!(
                "unknown extraction profile '{}' (expected narrative or financial)",
                other
            ),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Narrative => write!(f, "narrative"),
            Profile::Financial => write!(f, "financial"),
        }
    }
}

pub fn narrative() -> ExtractionConfig {
    ExtractionConfig::new(
        "Extract characters, emotions, and relationships in order of appearance.\n\
         Use exact text for extractions. Do not paraphrase or overlap entities.\n\
         Provide meaningful attributes for each entity to add context.",
        vec![ExampleData::new(
            "ROMEO. But soft! What light through yonder window breaks? It is the east, and Juliet is the sun.",
            vec![
                Extraction::new("character", "ROMEO", [("emotional_state", "wonder")]),
                Extraction::new("emotion", "But soft!", [("feeling", "gentle awe")]),
                Extraction::new("relationship", "Juliet is the sun", [("type", "metaphor")]),
            ],
        )],
    )
}

pub fn financial() -> ExtractionConfig {
    ExtractionConfig::new(
        "Extract the terms of a savings plan in order of appearance: initial balance, currency, \
         monthly contribution, duration, interest rate, bonus interest and bonus conditions.\n\
         Use exact text for extractions. Do not paraphrase or overlap entities.\n\
         Normalize amounts to plain numbers and rates to decimal fractions in the attributes, \
         and use link_to to name the role an extraction depends on.",
        vec![ExampleData::new(
            "Starting with $2,500 in AUD, I will deposit $200 monthly for 3 years at 4.5% interest, \
             plus a 0.5% bonus whenever I contribute at least $100.",
            vec![
                Extraction::new(
                    "initial_balance",
                    "$2,500",
                    [("amount", "2500"), ("link_to", "currency")],
                ),
                Extraction::new("currency", "AUD", [("code", "AUD")]),
                Extraction::new(
                    "monthly_contribution",
                    "$200",
                    [("amount", "200"), ("link_to", "currency")],
                ),
                Extraction::new("duration", "3 years", [("months", "36")]),
                Extraction::new(
                    "interest_rate",
                    "4.5%",
                    [("rate", "0.045"), ("period", "annual")],
                ),
                Extraction::new(
                    "bonus_interest",
                    "0.5%",
                    [("rate", "0.005"), ("type", "MIN_CONTRIBUTION")],
                ),
                Extraction::new(
                    "bonus_condition",
                    "$100",
                    [
                        ("amount", "100"),
                        ("type", "MIN_CONTRIBUTION"),
                        ("link_to", "bonus_interest"),
                    ],
                ),
            ],
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_configs_are_valid() {
        for profile in [Profile::Narrative, Profile::Financial] {
            let config = profile.config();
            config.validate().unwrap();
            assert!(!config.examples().is_empty());
        }
    }

    #[test]
    fn test_narrative_classes() {
        let config = narrative();
        let classes: Vec<_> = config.examples()[0]
            .extractions
            .iter()
            .map(|e| e.extraction_class.as_str())
            .collect();
        assert_eq!(classes, vec!["character", "emotion", "relationship"]);
    }

    #[test]
    fn test_financial_links_reference_known_classes() {
        let config = financial();
        let extractions = &config.examples()[0].extractions;

        for link in extractions.iter().filter_map(|e| e.attributes.get("link_to")) {
            assert!(
                extractions.iter().any(|e| &e.extraction_class == link),
                "dangling link_to: {}",
                link
            );
        }
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!("narrative".parse::<Profile>().unwrap(), Profile::Narrative);
        assert_eq!(" Financial ".parse::<Profile>().unwrap(), Profile::Financial);
        assert!("medical".parse::<Profile>().is_err());
        assert_eq!(Profile::default().to_string(), "narrative");
    }
}
