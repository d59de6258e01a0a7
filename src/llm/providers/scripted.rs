//! Scripted provider: replays queued replies in order and records calls.
//!
//! Used for exercising the façades end to end without a model server. Clones
//! share one script, so a test can keep a handle and inspect the recorded
//! calls after handing a clone to a façade.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::CoreError;
use crate::llm::{Completion, OutputFormat};

/// One queued backend outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(CoreError),
}

/// A call as the backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub format: OutputFormat,
    pub model: String,
    pub temperature: Option<f32>,
    pub image_count: usize,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<ScriptedReply>,
    /// Served once the queue is empty.
    fallback: Option<ScriptedReply>,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    model: String,
    default_format: OutputFormat,
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            default_format: OutputFormat::Text,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }

    pub(crate) fn default_format(&self) -> OutputFormat {
        self.default_format
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.lock().replies.push_back(ScriptedReply::Text(text.into()));
    }

    pub fn push_json(&self, value: &Value) {
        self.push_text(value.to_string());
    }

    pub fn push_failure(&self, error: CoreError) {
        self.lock().replies.push_back(ScriptedReply::Fail(error));
    }

    /// Answer every call with `error` once the queue is drained.
    pub fn fail_always(&self, error: CoreError) {
        self.lock().fallback = Some(ScriptedReply::Fail(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    pub(crate) fn complete(&self, completion: &Completion<'_>) -> Result<String, CoreError> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            prompt: completion.prompt.to_string(),
            format: completion.format,
            model: completion.model.unwrap_or(&self.model).to_string(),
            temperature: completion.temperature,
            image_count: completion.images.len(),
        });

        let reply = match script.replies.pop_front() {
            Some(reply) => reply,
            None => script.fallback.clone().ok_or_else(|| {
                CoreError::BackendUnavailable("scripted backend has no reply queued".into())
            })?,
        };

        match reply {
            ScriptedReply::Text(text) => Ok(text),
            ScriptedReply::Fail(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_IMAGES: &[String] = &[];

    fn completion(prompt: &str) -> Completion<'_> {
        Completion {
            prompt,
            format: OutputFormat::Text,
            model: None,
            temperature: None,
            images: NO_IMAGES,
        }
    }

    #[test]
    fn replays_in_order() {
        let p = ScriptedProvider::new();
        p.push_text("one");
        p.push_text("two");
        assert_eq!(p.complete(&completion("a")).unwrap(), "one");
        assert_eq!(p.complete(&completion("b")).unwrap(), "two");
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn empty_queue_is_unavailable() {
        let p = ScriptedProvider::new();
        let err = p.complete(&completion("a")).unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
    }

    #[test]
    fn fallback_serves_every_call() {
        let p = ScriptedProvider::new();
        p.fail_always(CoreError::BackendUnavailable("connection refused".into()));
        for _ in 0..3 {
            assert!(p.complete(&completion("x")).is_err());
        }
        assert_eq!(p.calls().len(), 3);
    }

    #[test]
    fn clones_share_the_script() {
        let p = ScriptedProvider::new().with_model("tiny");
        let handle = p.clone();
        p.push_text("ok");
        handle.complete(&completion("hello")).unwrap();
        let calls = p.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "hello");
        assert_eq!(calls[0].model, "tiny");
    }
}
