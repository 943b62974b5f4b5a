/*!
 * Translation engine abstraction.
 *
 * Every engine turns an ordered batch of lines into an ordered batch of
 * translated lines. Engines come in two flavours:
 *
 * - stateless engines treat every call on its own (DeepLX, Baidu, Google);
 * - stateful engines keep a bounded conversation with the model so later
 *   windows see how earlier ones were translated (OpenAI-compatible chat,
 *   Ollama chat).
 *
 * The batcher only sees [`TranslationEngine`] and does not care which flavour
 * it drives.
 */

use async_trait::async_trait;
use log::{debug, info};
use std::fmt::{self, Debug};

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::ChatMessage;

use super::codec;
use super::memory::ContextMemory;

/// Behavioral variant of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Each call is independent
    Stateless,
    /// Calls share a bounded conversational memory
    Stateful,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stateless => write!(f, "stateless"),
            Self::Stateful => write!(f, "stateful"),
        }
    }
}

/// Common trait for all translation engines
#[async_trait]
pub trait TranslationEngine: Send + Debug {
    /// Engine name used in logs
    fn name(&self) -> &str;

    /// Whether the engine carries memory across calls
    fn mode(&self) -> EngineMode;

    /// Translate an ordered batch of lines
    ///
    /// An empty vector means the provider legitimately returned nothing for
    /// this batch. The result may hold fewer or more entries than `segments`.
    async fn translate(
        &mut self,
        segments: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Release transport resources. Idempotent.
    async fn close(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Chat-style completion backend used by [`ChatEngine`]
#[async_trait]
pub trait ChatCompletion: Send + Sync + Debug {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Send the full conversation and return the assistant reply, if any
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<ChatMessage>, ProviderError>;
}

/// Marker the model is asked to put in front of its final answer
pub const FINAL_MARKER: &str = "Final translation:";

/// Default system prompt for chat engines
/// Placeholders: {source_language}, {target_language}
pub const DEFAULT_CHAT_PROMPT: &str = "You play two roles: a translator fluent in {source_language} slang who writes natural {target_language}, and a reviewer fluent in both languages.
Each message contains dialogue lines separated by lines consisting of ----.
1. As the translator, produce a first draft in idiomatic {target_language}.
2. As the reviewer, compare the draft with the original and note anything that drifts in meaning or reads unnaturally.
3. As the translator again, revise the draft using the review.
Keep coarse or inappropriate expressions as they are and do not change the context or meaning.
Reply with the final translation only, preceded by the line \"Final translation:\". Keep the original line breaks and every ---- separator line so that each translated line stays in its place.";

/// Stateful engine on top of a chat completion backend
pub struct ChatEngine<C: ChatCompletion> {
    backend: C,
    system_prompt: String,
    memory: ContextMemory<ChatMessage>,
    closed: bool,
}

impl<C: ChatCompletion> Debug for ChatEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEngine")
            .field("backend", &self.backend)
            .field("remembered_messages", &self.memory.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl<C: ChatCompletion> ChatEngine<C> {
    /// Create a chat engine remembering `context_offset` exchanges
    pub fn new(backend: C, system_prompt: impl Into<String>, context_offset: usize) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            memory: ContextMemory::new(context_offset),
            closed: false,
        }
    }

    /// Conversation currently remembered
    pub fn memory(&self) -> &ContextMemory<ChatMessage> {
        &self.memory
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Render the system prompt for a language pair
    fn render_prompt(&self, source_language: &str, target_language: &str) -> String {
        let source = language_utils::display_name(source_language);
        let target = language_utils::display_name(target_language);
        self.system_prompt
            .replace("{source_language}", &source)
            .replace("{target_language}", &target)
    }
}

/// Keep only the final-answer section of a chat reply
///
/// Everything up to and including the last [`FINAL_MARKER`] is dropped along
/// with the single line break that ends the marker line. A reply that then
/// opens with a bare separator line loses that line. Nothing else is
/// trimmed: a reply starting with a line break carries an empty first line.
pub fn extract_final_answer(content: &str) -> &str {
    let answer = match content.rfind(FINAL_MARKER) {
        Some(pos) => strip_line_break(content[pos + FINAL_MARKER.len()..].trim_start_matches([' ', '\t'])),
        None => content,
    };
    answer
        .strip_prefix(codec::SENTINEL_TOKEN)
        .and_then(|rest| rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')))
        .unwrap_or(answer)
}

fn strip_line_break(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

#[async_trait]
impl<C: ChatCompletion> TranslationEngine for ChatEngine<C> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn mode(&self) -> EngineMode {
        EngineMode::Stateful
    }

    async fn translate(
        &mut self,
        segments: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = ChatMessage::user(codec::join(segments));

        let mut messages = Vec::with_capacity(self.memory.len() + 2);
        messages.push(ChatMessage::system(self.render_prompt(source_language, target_language)));
        messages.extend_from_slice(self.memory.snapshot());
        messages.push(request.clone());

        // Memory only changes once the exchange is complete
        let Some(reply) = self.backend.chat(&messages).await? else {
            info!("{} returned no choices for this batch", self.backend.name());
            return Ok(Vec::new());
        };

        let lines = codec::split(extract_final_answer(&reply.content));
        debug!("{} reply split into {} lines", self.backend.name(), lines.len());
        self.memory.append(request);
        self.memory.append(reply);

        Ok(lines)
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        if !self.closed {
            self.memory.clear();
            self.closed = true;
        }
        Ok(())
    }
}
