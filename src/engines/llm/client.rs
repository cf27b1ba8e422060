use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// One completion plus whatever metadata the backend reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// A blocking text-completion backend. Retries and timeouts are the
/// implementation's business; an `Err` is handled by the caller exactly like
/// an unusable answer.
pub trait LlmClient: Send + Sync {
    fn generate(&self, prompt: &str, temperature: f64) -> anyhow::Result<LlmResponse>;
}

impl<C: LlmClient + ?Sized> LlmClient for std::sync::Arc<C> {
    fn generate(&self, prompt: &str, temperature: f64) -> anyhow::Result<LlmResponse> {
        (**self).generate(prompt, temperature)
    }
}

impl<C: LlmClient + ?Sized> LlmClient for Box<C> {
    fn generate(&self, prompt: &str, temperature: f64) -> anyhow::Result<LlmResponse> {
        (**self).generate(prompt, temperature)
    }
}

/// Traces every prompt/response pair through `log`.
pub struct LoggedClient<C> {
    inner: C,
    calls: AtomicUsize,
}

impl<C: LlmClient> LoggedClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: LlmClient> LlmClient for LoggedClient<C> {
    fn generate(&self, prompt: &str, temperature: f64) -> anyhow::Result<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("LLM call #{} (temperature {}):\n{}", call, temperature, prompt);

        let started = Instant::now();
        let result = self.inner.generate(prompt, temperature);
        let elapsed = started.elapsed();

        match &result {
            Ok(response) => log::debug!(
                "LLM call #{} answered in {:.2?} by {:?} (tokens {:?}/{:?}): {}",
                call,
                elapsed,
                response.model,
                response.prompt_tokens,
                response.completion_tokens,
                response.content
            ),
            Err(e) => log::warn!("LLM call #{} failed after {:.2?}: {}", call, elapsed, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl LlmClient for Echo {
        fn generate(&self, prompt: &str, _temperature: f64) -> anyhow::Result<LlmResponse> {
            Ok(LlmResponse::text(prompt))
        }
    }

    #[test]
    fn test_logged_client_passes_through() {
        let client = LoggedClient::new(Echo);
        assert_eq!(client.generate("hello", 1.0).unwrap().content, "hello");
        assert_eq!(client.generate("again", 0.5).unwrap().content, "again");
        assert_eq!(client.calls(), 2);
    }

    #[test]
    fn test_response_deserializes_with_missing_metadata() {
        let response: LlmResponse = serde_json::from_str(r#"{"content": "{}"}"#).unwrap();
        assert_eq!(response, LlmResponse::text("{}"));
    }
}
