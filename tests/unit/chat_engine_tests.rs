/*!
 * Tests for the stateful chat engine
 */

use anyhow::Result;
use srtt::providers::mock::MockChat;
use srtt::providers::ChatMessage;
use srtt::translation::codec;
use srtt::translation::engine::DEFAULT_CHAT_PROMPT;
use srtt::translation::{ChatEngine, EngineMode, TranslationEngine};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Test that the reply preamble is dropped and the answer split into lines
#[tokio::test]
async fn test_translate_withReviewPreamble_shouldReturnFinalLines() -> Result<()> {
    let mut engine = ChatEngine::new(MockChat::new(), DEFAULT_CHAT_PROMPT, 3);

    let result = engine.translate(&lines(&["a", "b", "c"]), "ja", "zh").await?;

    assert_eq!(result, lines(&["<a>", "<b>", "<c>"]));
    assert_eq!(engine.mode(), EngineMode::Stateful);
    assert_eq!(engine.name(), "mock-chat");
    Ok(())
}

/// Test that the system prompt names both languages
#[tokio::test]
async fn test_translate_shouldRenderLanguageNamesIntoPrompt() -> Result<()> {
    let chat = MockChat::new();
    let mut engine = ChatEngine::new(chat.clone(), "From {source_language} to {target_language}.", 2);

    engine.translate(&lines(&["hello"]), "en", "fr").await?;

    let conversations = chat.conversations();
    assert_eq!(conversations[0][0], ChatMessage::system("From English to French."));
    assert_eq!(conversations[0][1], ChatMessage::user("hello"));
    Ok(())
}

/// Test that later requests carry the earlier exchanges
#[tokio::test]
async fn test_translate_secondWindow_shouldSendPriorExchange() -> Result<()> {
    let chat = MockChat::new();
    let mut engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 2);

    engine.translate(&lines(&["one", "two"]), "ja", "zh").await?;
    engine.translate(&lines(&["two", "three"]), "ja", "zh").await?;

    let second = &chat.conversations()[1];
    let roles: Vec<&str> = second.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(second[1].content, codec::join(&lines(&["one", "two"])));
    assert_eq!(second[3].content, codec::join(&lines(&["two", "three"])));
    assert_eq!(engine.memory().len(), 4);
    Ok(())
}

/// Test that memory is bounded to the configured number of exchanges
#[tokio::test]
async fn test_translate_pastContextOffset_shouldForgetOldestExchange() -> Result<()> {
    let chat = MockChat::new();
    let mut engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 1);

    engine.translate(&lines(&["first"]), "ja", "zh").await?;
    engine.translate(&lines(&["second"]), "ja", "zh").await?;
    engine.translate(&lines(&["third"]), "ja", "zh").await?;

    let conversations = chat.conversations();
    let second = &conversations[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[1], ChatMessage::user("first"));
    assert_eq!(second[3], ChatMessage::user("second"));

    // Only the newest exchange is carried into the third request
    let third = &conversations[2];
    assert_eq!(third.len(), 4);
    assert_eq!(third[1], ChatMessage::user("second"));
    assert_eq!(third[3], ChatMessage::user("third"));
    assert_eq!(engine.memory().len(), 2);
    Ok(())
}

/// Test that a failed call leaves no unanswered request in memory
#[tokio::test]
async fn test_translate_withFailedCall_shouldRollBackRequest() -> Result<()> {
    let chat = MockChat::new().fail_on_calls(&[1]);
    let mut engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 3);

    engine.translate(&lines(&["first"]), "ja", "zh").await?;
    assert!(engine.translate(&lines(&["second"]), "ja", "zh").await.is_err());
    assert_eq!(engine.memory().len(), 2);

    engine.translate(&lines(&["third"]), "ja", "zh").await?;
    let roles: Vec<String> = chat.conversations()[2].iter().map(|m| m.role.clone()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    Ok(())
}

/// Test that a failed call on a full memory keeps the remembered exchange
#[tokio::test]
async fn test_translate_withFailedCallOnFullMemory_shouldKeepPriorExchange() -> Result<()> {
    let chat = MockChat::new().fail_on_calls(&[1]);
    let mut engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 1);

    engine.translate(&lines(&["first"]), "ja", "zh").await?;
    assert_eq!(engine.memory().len(), 2);
    assert!(engine.translate(&lines(&["second"]), "ja", "zh").await.is_err());
    assert_eq!(engine.memory().len(), 2);
    assert_eq!(engine.memory().snapshot()[0], ChatMessage::user("first"));

    engine.translate(&lines(&["third"]), "ja", "zh").await?;
    let third = &chat.conversations()[2];
    let roles: Vec<&str> = third.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(third[1], ChatMessage::user("first"));
    assert_eq!(third[3], ChatMessage::user("third"));
    Ok(())
}

/// Test that an empty reply on a full memory keeps the remembered exchange
#[tokio::test]
async fn test_translate_withNoChoicesOnFullMemory_shouldKeepPriorExchange() -> Result<()> {
    let chat = MockChat::new().empty_on_calls(&[1]);
    let mut engine = ChatEngine::new(chat, DEFAULT_CHAT_PROMPT, 1);

    engine.translate(&lines(&["first"]), "ja", "zh").await?;
    let result = engine.translate(&lines(&["second"]), "ja", "zh").await?;

    assert!(result.is_empty());
    assert_eq!(engine.memory().snapshot()[0], ChatMessage::user("first"));
    assert_eq!(engine.memory().len(), 2);
    Ok(())
}

/// Test that an empty first line in a window keeps its place in the reply
#[tokio::test]
async fn test_translate_withEmptyFirstLine_shouldKeepLinesAligned() -> Result<()> {
    let mut engine = ChatEngine::new(MockChat::new(), DEFAULT_CHAT_PROMPT, 2);

    let result = engine.translate(&lines(&["", "b", "c"]), "ja", "zh").await?;

    assert_eq!(result, lines(&["", "<b>", "<c>"]));
    Ok(())
}

/// Test that a reply without choices is an empty result, not an error
#[tokio::test]
async fn test_translate_withNoChoices_shouldReturnEmpty() -> Result<()> {
    let chat = MockChat::new().empty_on_calls(&[0]);
    let mut engine = ChatEngine::new(chat, DEFAULT_CHAT_PROMPT, 3);

    let result = engine.translate(&lines(&["a", "b"]), "ja", "zh").await?;

    assert!(result.is_empty());
    assert!(engine.memory().is_empty());
    Ok(())
}

/// Test that closing twice is harmless and drops the conversation
#[tokio::test]
async fn test_close_calledTwice_shouldSucceed() -> Result<()> {
    let mut engine = ChatEngine::new(MockChat::new(), DEFAULT_CHAT_PROMPT, 3);
    engine.translate(&lines(&["a"]), "ja", "zh").await?;

    engine.close().await?;
    engine.close().await?;

    assert!(engine.memory().is_empty());
    Ok(())
}
