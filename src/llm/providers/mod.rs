//! LLM backend implementations.
//!
//! `build(settings)` is the factory, called once by the embedding service.
//! Adding a new backend = new module + new match arm.

pub mod ollama;
pub mod scripted;

use crate::config::LlmSettings;
use crate::error::CoreError;
use crate::llm::LlmClient;

/// Construct an `LlmClient` from settings.
pub fn build(settings: &LlmSettings) -> Result<LlmClient, CoreError> {
    match settings.provider.as_str() {
        "ollama" => Ok(LlmClient::Ollama(ollama::OllamaProvider::new(settings)?)),
        "scripted" => Ok(LlmClient::Scripted(
            scripted::ScriptedProvider::new()
                .with_model(&settings.model)
                .with_default_format(settings.default_format),
        )),
        other => Err(CoreError::Config(format!("unknown llm provider: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ollama_by_default() {
        let client = build(&LlmSettings::default()).unwrap();
        assert!(matches!(client, LlmClient::Ollama(_)));
    }

    #[test]
    fn builds_scripted() {
        let settings = LlmSettings { provider: "scripted".into(), ..LlmSettings::default() };
        assert!(matches!(build(&settings).unwrap(), LlmClient::Scripted(_)));
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let settings = LlmSettings { provider: "gpt-neo".into(), ..LlmSettings::default() };
        let err = build(&settings).unwrap_err();
        assert_eq!(err, CoreError::Config("unknown llm provider: gpt-neo".into()));
    }
}
