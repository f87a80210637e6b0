pub mod align;
pub mod llm;
pub mod profiles;
pub mod prompt;
pub mod resolver;
pub mod schema;

pub use align::align_extractions;
pub use llm::{LanguageModel, ModelSettings, OpenAiClient};
pub use profiles::Profile;
pub use prompt::{ExtractionConfig, build_extraction_prompt};
pub use resolver::parse_extractions;
pub use schema::{AlignmentStatus, CharInterval, ExampleData, Extraction};

use anyhow::{Context, Result};
use std::future::Future;
use tracing::debug;

/// Anything that turns text into labeled spans under a given configuration.
pub trait ExtractionProvider: Send + Sync {
    fn extract(
        &self,
        text: &str,
        config: &ExtractionConfig,
    ) -> impl Future<Output = Result<Vec<Extraction>>> + Send;
}

/// Few-shot extraction on top of a language model. Holds no per-request state.
pub struct Extractor<M> {
    model: M,
    fence_output: bool,
}

impl<M: LanguageModel> Extractor<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            fence_output: false,
        }
    }

    /// Ask for answers wrapped in a ```json fence.
    pub fn with_fence_output(mut self, fence_output: bool) -> Self {
        self.fence_output = fence_output;
        self
    }

    /// Extract labeled spans from a piece of text
    pub async fn extract_from_text(
        &self,
        text: &str,
        config: &ExtractionConfig,
    ) -> Result<Vec<Extraction>> {
        let prompt = build_extraction_prompt(config, text, self.fence_output);
        debug!(prompt_chars = prompt.len(), "Sending extraction prompt");

        let output = self
            .model
            .infer(&prompt)
            .await
            .context("Language model call failed")?;

        let parsed = parse_extractions(&output).context("Failed to parse extraction result")?;
        let parsed_count = parsed.len();

        let extractions = align_extractions(text, parsed);
        debug!(
            parsed = parsed_count,
            aligned = extractions.len(),
            "Resolved model output"
        );

        Ok(extractions)
    }
}

impl<M: LanguageModel> ExtractionProvider for Extractor<M> {
    async fn extract(&self, text: &str, config: &ExtractionConfig) -> Result<Vec<Extraction>> {
        self.extract_from_text(text, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned answer and records the prompt it was given.
    struct CannedModel {
        answer: Result<String, String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedModel {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                last_prompt: Mutex::new(None),
            }
        }
    }

    impl LanguageModel for CannedModel {
        async fn infer(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.answer.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_narrative_extraction() {
        let text = "Lady Juliet gazed longingly at the stars, her heart aching for Romeo";
        let model = CannedModel::answering(
            r#"{"extractions": [
                {"character": "Lady Juliet", "character_attributes": {"emotional_state": "longing"}},
                {"emotion": "her heart aching", "emotion_attributes": {"feeling": "sorrowful yearning"}},
                {"character": "Romeo", "character_attributes": {"emotional_state": "absent"}},
                {"relationship": "aching for Romeo", "relationship_attributes": {"type": "romantic"}}
            ]}"#,
        );
        let extractor = Extractor::new(model);
        let config = Profile::Narrative.config();

        let extractions = extractor.extract(text, &config).await.unwrap();

        assert!(!extractions.is_empty());
        for e in &extractions {
            assert!(
                ["character", "emotion", "relationship"].contains(&e.extraction_class.as_str())
            );
            assert!(text.contains(&e.extraction_text));
        }
        let starts: Vec<_> = extractions
            .iter()
            .map(|e| e.char_interval.unwrap().start_pos)
            .collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);

        let prompt = extractor.model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains(config.prompt_description()));
        assert!(prompt.ends_with(&format!("Q: {}\nA: ", text)));
    }

    #[tokio::test]
    async fn test_financial_extraction() {
        let text = "I started with $4,000 and contribute $1,000 monthly";
        let model = CannedModel::answering(
            "```json\n{\"extractions\": [\
             {\"initial_balance\": \"$4,000\", \"initial_balance_attributes\": {\"amount\": \"4000\", \"link_to\": \"currency\"}},\
             {\"monthly_contribution\": \"$1,000\", \"monthly_contribution_attributes\": {\"amount\": \"1000\", \"link_to\": \"currency\"}}\
             ]}\n```",
        );
        let extractor = Extractor::new(model).with_fence_output(true);

        let extractions = extractor
            .extract(text, &Profile::Financial.config())
            .await
            .unwrap();

        assert_eq!(extractions.len(), 2);
        assert_eq!(extractions[0].extraction_class, "initial_balance");
        assert_eq!(extractions[0].extraction_text, "$4,000");
        assert_eq!(extractions[1].extraction_class, "monthly_contribution");
        assert_eq!(extractions[1].extraction_text, "$1,000");
        assert_eq!(extractions[1].attributes["link_to"], "currency");

        let prompt = extractor.model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("```json"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let extractor = Extractor::new(CannedModel::failing("connection reset"));

        let err = extractor
            .extract("some text", &Profile::Narrative.config())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
    }

    #[tokio::test]
    async fn test_malformed_model_output_propagates() {
        let extractor = Extractor::new(CannedModel::answering("Sorry, I can't help with that."));

        let err = extractor
            .extract("some text", &Profile::Narrative.config())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to parse extraction result"));
    }
}
