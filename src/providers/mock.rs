/*!
 * Mock engine implementations for testing.
 *
 * This module provides engines that simulate different behaviors without any
 * network access:
 * - `MockEngine::working()` - Always succeeds, one translated line per input line
 * - `MockEngine::short(n)` - Returns only the first `n` lines of each batch
 * - `MockEngine::tagged()` - Marks every line with the call that produced it
 * - `MockEngine::failing()` - Always fails with an error
 * - `MockChat` - Chat backend for exercising the stateful engine
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::ChatMessage;
use crate::translation::codec;
use crate::translation::engine::{ChatCompletion, EngineMode, TranslationEngine, FINAL_MARKER};

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds but returns only the first `keep` lines
    Short { keep: usize },
    /// Succeeds but echoes the separator as an extra line after every line
    LeakingSentinel,
    /// Succeeds, prefixing every line with the zero-based call number
    Tagged,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty result
    Empty,
}

/// Mock engine for testing batching behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Behavior mode
    behavior: MockBehavior,
    /// Zero-based call numbers that fail regardless of behavior
    fail_calls: Vec<usize>,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every batch received, shared between clones
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// Number of times close was called
    close_count: Arc<AtomicUsize>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            fail_calls: Vec::new(),
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn short(keep: usize) -> Self {
        Self::new(MockBehavior::Short { keep })
    }

    pub fn tagged() -> Self {
        Self::new(MockBehavior::Tagged)
    }

    /// Line the tagged mock produces for `line` on call `call`
    pub fn tagged_line(line: &str, call: usize) -> String {
        format!("#{} {}", call, line)
    }

    pub fn leaking_sentinel() -> Self {
        Self::new(MockBehavior::LeakingSentinel)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Make the given zero-based calls fail
    pub fn fail_on_calls(mut self, calls: &[usize]) -> Self {
        self.fail_calls = calls.to_vec();
        self
    }

    /// Translation the mock produces for a line
    pub fn translated(line: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, line)
    }

    /// Batches received so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    fn simulated_failure(count: usize) -> ProviderError {
        ProviderError::ApiError {
            status_code: 503,
            message: format!("Simulated failure (request #{})", count + 1),
        }
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn mode(&self) -> EngineMode {
        EngineMode::Stateless
    }

    async fn translate(
        &mut self,
        segments: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(segments.to_vec());

        if self.fail_calls.contains(&count) {
            return Err(Self::simulated_failure(count));
        }

        // Round-trip through the codec the way a single-string engine would
        let request = codec::join(segments);
        let lines: Vec<String> = codec::split(&request)
            .iter()
            .map(|line| Self::translated(line, target_language))
            .collect();

        match self.behavior {
            MockBehavior::Working => Ok(lines),
            MockBehavior::Short { keep } => Ok(lines.into_iter().take(keep).collect()),
            MockBehavior::LeakingSentinel => {
                let leaked: Vec<String> = lines
                    .into_iter()
                    .flat_map(|line| [line, codec::SENTINEL_TOKEN.to_string()])
                    .collect();
                Ok(codec::split(&codec::join(&leaked)))
            }
            MockBehavior::Tagged => Ok(segments.iter().map(|line| Self::tagged_line(line, count)).collect()),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(Self::simulated_failure(count))
                } else {
                    Ok(lines)
                }
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),
            MockBehavior::Empty => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock chat backend answering with a preamble and the translated lines
#[derive(Debug, Clone, Default)]
pub struct MockChat {
    /// Zero-based call numbers that fail
    fail_calls: Vec<usize>,
    /// Zero-based call numbers that return no choice
    empty_calls: Vec<usize>,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every conversation received, shared between clones
    conversations: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on_calls(mut self, calls: &[usize]) -> Self {
        self.fail_calls = calls.to_vec();
        self
    }

    pub fn empty_on_calls(mut self, calls: &[usize]) -> Self {
        self.empty_calls = calls.to_vec();
        self
    }

    /// Conversations received so far, system prompt included
    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.conversations.lock().clone()
    }

    /// Reply the mock gives for a user message
    ///
    /// Empty lines come back empty, as a model echoes them.
    pub fn reply_for(user_content: &str) -> String {
        let lines: Vec<String> = codec::split(user_content)
            .iter()
            .map(|line| if line.is_empty() { String::new() } else { format!("<{}>", line) })
            .collect();
        format!("Draft: ...\nReview: ...\n{}\n{}", FINAL_MARKER, codec::join(&lines))
    }
}

#[async_trait]
impl ChatCompletion for MockChat {
    fn name(&self) -> &str {
        "mock-chat"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<ChatMessage>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.conversations.lock().push(messages.to_vec());

        if self.fail_calls.contains(&count) {
            return Err(ProviderError::ConnectionError(format!("Simulated failure (request #{})", count + 1)));
        }
        if self.empty_calls.contains(&count) {
            return Ok(None);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(Some(ChatMessage::assistant(Self::reply_for(last_user))))
    }
}
