/*!
 * Integration tests for the translation pipeline: engine, batcher and throttle
 */

use anyhow::Result;
use std::time::{Duration, Instant};

use srtt::app_config::{Config, EngineKind};
use srtt::providers::mock::{MockChat, MockEngine};
use srtt::translation::codec;
use srtt::translation::engine::DEFAULT_CHAT_PROMPT;
use srtt::translation::{
    BatchOptions, ChatEngine, EngineMode, SlidingWindowBatcher, Throttle, TranslationService,
};

use crate::common;

/// Test that the service reports what was and was not translated
#[tokio::test]
async fn test_service_translate_lines_withFailedWindow_shouldCountMissingLines() -> Result<()> {
    let engine = MockEngine::working().fail_on_calls(&[1]);
    let mut service = TranslationService::with_engine(Box::new(engine.clone()), common::test_batcher(4, 1));

    let (output, stats) = service.translate_lines(&common::numbered_lines(10)).await;

    assert_eq!(output.len(), 10);
    assert_eq!(stats.total_lines, 10);
    assert_eq!(stats.translated_lines, 7);
    assert_eq!(stats.missing_lines(), 3);
    assert_eq!(stats.windows, 4);
    assert_eq!(stats.engine, "mock");
    assert!(stats.summary().contains("Lines translated: 7/10"));
    Ok(())
}

/// Test that closing the service closes its engine
#[tokio::test]
async fn test_service_close_shouldCloseEngine() -> Result<()> {
    let engine = MockEngine::working();
    let mut service = TranslationService::with_engine(Box::new(engine.clone()), common::test_batcher(4, 1));

    service.close().await?;

    assert_eq!(engine.close_count(), 1);
    Ok(())
}

/// Test that a chat engine behind the batcher sees earlier windows
#[tokio::test]
async fn test_chat_engine_in_batcher_shouldCarryContextBetweenWindows() -> Result<()> {
    common::init_logging();
    let chat = MockChat::new();
    let engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 2);
    let mut service = TranslationService::with_engine(Box::new(engine), common::test_batcher(4, 1));
    let lines = common::numbered_lines(10);

    let (output, stats) = service.translate_lines(&lines).await;

    let expected: Vec<String> = lines.iter().map(|l| format!("<{}>", l)).collect();
    assert_eq!(output, expected);
    assert_eq!(stats.engine, "mock-chat");

    let conversations = chat.conversations();
    assert_eq!(conversations.len(), 4);
    // Third window: both earlier exchanges precede the new request
    let third = &conversations[2];
    assert_eq!(third.len(), 6);
    assert_eq!(third[1].content, codec::join(&lines[0..4]));
    assert_eq!(third[3].content, codec::join(&lines[3..7]));
    assert_eq!(third[5].content, codec::join(&lines[6..10]));
    // Fourth window: the first exchange has been evicted
    let fourth = &conversations[3];
    assert_eq!(fourth.len(), 6);
    assert_eq!(fourth[1].content, codec::join(&lines[3..7]));
    Ok(())
}

/// Test that a failing chat window leaves a gap and the run continues
#[tokio::test]
async fn test_chat_engine_in_batcher_withFailedWindow_shouldContinue() -> Result<()> {
    let chat = MockChat::new().fail_on_calls(&[1]);
    let engine = ChatEngine::new(chat.clone(), DEFAULT_CHAT_PROMPT, 5);
    let batcher = common::test_batcher(3, 0);
    let lines = common::numbered_lines(9);

    let mut service = TranslationService::with_engine(Box::new(engine), batcher);
    let (output, _) = service.translate_lines(&lines).await;

    assert_eq!(output[0], "<line 1>");
    assert!(output[3..6].iter().all(String::is_empty));
    assert_eq!(output[8], "<line 9>");

    // The failed request was never remembered
    let last = chat.conversations().pop().unwrap_or_default();
    let users: Vec<&str> = last
        .iter()
        .filter(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0], codec::join(&lines[0..3]));
    Ok(())
}

/// Test that the throttle spaces out dispatches once the burst is spent
#[tokio::test]
async fn test_batcher_withThrottle_shouldDelayDispatchesPastBurst() -> Result<()> {
    let throttle = Throttle::new(1, Duration::from_millis(100))?;
    let batcher = SlidingWindowBatcher::new(BatchOptions::new(4, 1), Some(throttle), "en", "fr")?;
    let mut engine = MockEngine::working();
    let lines = common::numbered_lines(7);

    let start = Instant::now();
    let output = batcher.translate(&mut engine, &lines).await;
    let elapsed = start.elapsed();

    // Three windows with a burst of one: two waits of about one interval
    assert_eq!(engine.request_count(), 3);
    assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
    assert!(output.iter().all(|line| !line.is_empty()));
    Ok(())
}

/// Test that a burst large enough for every window causes no waiting
#[tokio::test]
async fn test_batcher_withinBurst_shouldNotWait() -> Result<()> {
    let throttle = Throttle::new(10, Duration::from_secs(60))?;
    let batcher = SlidingWindowBatcher::new(BatchOptions::new(4, 1), Some(throttle), "en", "fr")?;
    let mut engine = MockEngine::working();

    let start = Instant::now();
    batcher.translate(&mut engine, &common::numbered_lines(10)).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

/// Test that the service builds the configured engine with its throttle
#[test]
fn test_service_new_shouldFollowConfig() -> Result<()> {
    let mut config = Config::default();
    config.throttle.permits = 3;
    config.throttle.interval_secs = 10;
    config.batch.block_size = 6;
    config.batch.overlap = 2;

    let service = TranslationService::new(&config)?;
    assert_eq!(service.engine_name(), "deeplx");
    assert_eq!(service.batcher().options(), &BatchOptions::new(6, 2));
    assert_eq!(service.batcher().throttle().map(|t| t.permits()), Some(3));

    config.translation.engine = EngineKind::Ollama;
    let engine = TranslationService::build_engine(&config)?;
    assert_eq!(engine.mode(), EngineMode::Stateful);
    assert_eq!(engine.name(), "ollama");
    Ok(())
}

/// Test that invalid batch settings stop the service from being built
#[test]
fn test_service_new_withInvalidWindow_shouldFail() {
    let mut config = Config::default();
    config.batch.overlap = config.batch.block_size + 1;
    assert!(TranslationService::new(&config).is_err());
}
