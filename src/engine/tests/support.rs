//! Test doubles shared across the engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::engine::ports::TextGenerator;
use crate::model::domain::{GeneratedText, ModelId};
use crate::model::services::{ProviderError, ProviderResult};

enum Reply {
    Text(String),
    Failure,
}

/// Queue-driven stand-in for the model provider.
///
/// Replies are consumed in the order they were queued; an empty queue
/// behaves like a provider whose attempt budget ran out.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queues a successful generation returning `text`.
    pub fn push_text(&self, text: &str) {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(Reply::Text(text.to_owned()));
    }

    /// Queues a failed generation attempt.
    pub fn push_failure(&self) {
        self.replies
            .lock()
            .expect("replies lock")
            .push_back(Reply::Failure);
    }

    /// Returns every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> ProviderResult<GeneratedText> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_owned());
        let reply = self.replies.lock().expect("replies lock").pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(GeneratedText::new(
                ModelId::new("scripted-7b").expect("valid model id"),
                text,
            )),
            Some(Reply::Failure) | None => Err(ProviderError::AttemptsExhausted { attempts: 3 }),
        }
    }
}
