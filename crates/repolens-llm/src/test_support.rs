//! Scripted backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

type Handler = Box<dyn Fn(&LlmInvocation) -> Result<String, LlmError> + Send + Sync>;

enum Script {
    Handler(Handler),
    Sequence(Mutex<VecDeque<Result<String, LlmError>>>),
}

/// Backend that answers from a closure or a fixed queue, recording every call.
pub struct ScriptedBackend {
    script: Script,
    calls: AtomicUsize,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    /// Answer each invocation with `handler(inv)`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&LlmInvocation) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Handler(Box::new(handler)))
    }

    /// Answer invocations from `responses` in order; once drained, every
    /// call fails with a transport error.
    #[must_use]
    pub fn sequence(responses: Vec<Result<String, LlmError>>) -> Self {
        Self::with_script(Script::Sequence(Mutex::new(responses.into())))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut recorded) = self.invocations.lock() {
            recorded.push(inv.clone());
        }

        let answer = match &self.script {
            Script::Handler(handler) => handler(&inv),
            Script::Sequence(queue) => queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string()))),
        };

        answer.map(|text| LlmResult::new(text, "scripted", inv.model))
    }
}
