//! Translation of finished answers into the reader's language.

use crate::ai::{route, ChatDelta, ChatMessage, ProviderRegistry};
use crate::language::Language;
use crate::{prompts, Error, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a whole translation, from request to last delta.
pub const TRANSLATION_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Clone)]
pub struct Translator {
    providers: Arc<ProviderRegistry>,
    model: String,
    timeout: Duration,
}

impl Translator {
    pub fn new(providers: Arc<ProviderRegistry>, model: String) -> Self {
        Self {
            providers,
            model,
            timeout: TRANSLATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Translate `text` into `target`, collecting the whole streamed reply.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String> {
        tokio::time::timeout(self.timeout, self.translate_inner(text, target))
            .await
            .map_err(|_| {
                Error::AiProvider(format!(
                    "Translation timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }

    async fn translate_inner(&self, text: &str, target: Language) -> Result<String> {
        let instruction = match target {
            Language::English => prompts::TRANSLATE_TO_EN,
            Language::Chinese => prompts::TRANSLATE_TO_ZH,
        };
        let messages = vec![
            ChatMessage::system(instruction.trim()),
            ChatMessage::user(text),
        ];

        let route = route(&self.model, false);
        let service = self.providers.get(route.provider)?;
        let mut stream = service.stream_chat(&route.model, messages).await?;

        let mut translated = String::new();
        while let Some(delta) = stream.next().await {
            if let ChatDelta::Text(piece) = delta? {
                translated.push_str(&piece);
            }
        }

        let translated = translated.trim();
        if translated.is_empty() {
            return Err(Error::AiProvider("Translation returned no text".to_string()));
        }
        Ok(translated.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ChatDeltaStream, ChatMessageContent, ChatService, MockChatClient, Provider};
    use async_trait::async_trait;

    /// Accepts the request, then never sends a delta.
    struct StalledChat;

    #[async_trait]
    impl ChatService for StalledChat {
        async fn stream_chat(
            &self,
            _model: &str,
            _messages: Vec<ChatMessage>,
        ) -> Result<ChatDeltaStream> {
            Ok(futures::stream::pending().boxed())
        }
    }

    fn translator(mock: Arc<MockChatClient>) -> Translator {
        let providers = ProviderRegistry::empty().with_service(Provider::OpenAi, mock);
        Translator::new(Arc::new(providers), "openai/gpt-4o-mini".to_string())
    }

    #[tokio::test]
    async fn test_translate_collects_text_and_ignores_reasoning() {
        let mock = Arc::new(MockChatClient::new().with_response(vec![
            ChatDelta::Reasoning("thinking".to_string()),
            ChatDelta::Text(" Hel".to_string()),
            ChatDelta::Text("lo \n".to_string()),
        ]));

        let out = translator(mock.clone())
            .translate("你好", Language::English)
            .await
            .unwrap();

        assert_eq!(out, "Hello");
        let call = &mock.calls()[0];
        assert_eq!(call.model, "gpt-4o-mini");
        assert_eq!(call.messages[0].role, "system");
        assert!(
            matches!(&call.messages[0].content, ChatMessageContent::Text(t) if t.contains("English"))
        );
        assert_eq!(call.messages[1], ChatMessage::user("你好"));
    }

    #[tokio::test]
    async fn test_translate_to_chinese_uses_chinese_instruction() {
        let mock = Arc::new(MockChatClient::new().with_response(vec![ChatDelta::Text(
            "你好".to_string(),
        )]));

        translator(mock.clone())
            .translate("Hello", Language::Chinese)
            .await
            .unwrap();

        assert!(
            matches!(&mock.calls()[0].messages[0].content, ChatMessageContent::Text(t) if t.contains("简体中文"))
        );
    }

    #[tokio::test]
    async fn test_empty_translation_is_an_error() {
        let mock = Arc::new(MockChatClient::new().with_response(vec![]));
        let err = translator(mock)
            .translate("你好", Language::English)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_missing_provider_is_an_error() {
        let translator = Translator::new(
            Arc::new(ProviderRegistry::empty()),
            "openai/gpt-4o-mini".to_string(),
        );
        let err = translator
            .translate("你好", Language::English)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_translation_times_out() {
        let providers =
            ProviderRegistry::empty().with_service(Provider::OpenAi, Arc::new(StalledChat));
        let translator = Translator::new(Arc::new(providers), "openai/gpt-4o-mini".to_string())
            .with_timeout(Duration::from_secs(5));

        let err = translator
            .translate("你好", Language::English)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(ref msg) if msg.contains("timed out")));
    }
}
