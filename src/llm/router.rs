use crate::config::LlmSettings;
use crate::errors::HunterError;
use super::provider::LLMProvider;
use super::openai::OpenAIProvider;
use super::gemini::GeminiProvider;

pub fn create_provider(settings: &LlmSettings) -> Result<Box<dyn LLMProvider>, HunterError> {
    let model = settings.model.as_deref();
    match settings.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(&settings.api_key, model))),
        "openai" => match settings.base_url.as_deref() {
            Some(url) => Ok(Box::new(OpenAIProvider::with_base_url(&settings.api_key, model, url))),
            None => Ok(Box::new(OpenAIProvider::new(&settings.api_key, model))),
        },
        other => Err(HunterError::Config(format!("Unknown LLM provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> LlmSettings {
        LlmSettings {
            provider: provider.to_string(),
            model: None,
            api_key: "test-key".to_string(),
            base_url: Some("http://localhost:8080/v1".to_string()),
        }
    }

    #[test]
    fn test_create_known_providers() {
        let gemini = create_provider(&settings("gemini")).unwrap();
        assert_eq!(gemini.provider_name(), "gemini");
        assert_eq!(gemini.model_name(), "gemini-2.5-flash");

        let openai = create_provider(&settings("openai")).unwrap();
        assert_eq!(openai.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = create_provider(&settings("mystery")).err().unwrap();
        assert!(matches!(err, HunterError::Config(_)));
    }
}
