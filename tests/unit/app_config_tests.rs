/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use srtt::app_config::{BatchConfig, Config, EngineKind, LogLevel, ThrottleConfig};
use srtt::translation::BatchOptions;

use crate::common;

/// Test that saving and loading gives back the same settings
#[test]
fn test_config_save_and_load_withCustomValues_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "ko".to_string();
    config.translation.engine = EngineKind::OpenAI;
    config.translation.active_engine_config_mut().api_key = "sk-test".to_string();
    config.translation.active_engine_config_mut().model = "gpt-4o-mini".to_string();
    config.batch = BatchConfig { block_size: 20, overlap: 5, window_retries: 1 };
    config.throttle = ThrottleConfig { permits: 5, interval_secs: 60 };
    config.log_level = LogLevel::Debug;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;

    assert_eq!(loaded.source_language, "en");
    assert_eq!(loaded.target_language, "ko");
    assert_eq!(loaded.translation.engine, EngineKind::OpenAI);
    assert_eq!(loaded.translation.get_api_key(), "sk-test");
    assert_eq!(loaded.translation.get_model(), "gpt-4o-mini");
    assert_eq!(loaded.batch, config.batch);
    assert_eq!(loaded.throttle, config.throttle);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert!(loaded.validate().is_ok());
    Ok(())
}

/// Test that a config file with only a few keys gets defaults for the rest
#[test]
fn test_from_file_withMinimalJson_shouldApplyDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"target_language": "en", "batch": {"block_size": 6}}"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "en");
    assert_eq!(config.batch.block_size, 6);
    assert_eq!(config.batch.overlap, 3);
    assert_eq!(config.translation.engine, EngineKind::Deeplx);
    assert_eq!(config.translation.get_endpoint(), "http://127.0.0.1:1188/translate");
    assert!(!config.throttle.is_enabled());
    Ok(())
}

/// Test that malformed JSON is reported instead of silently defaulted
#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

/// Test that the engine field accepts each engine name
#[test]
fn test_engine_kind_deserialize_withEachName_shouldParse() -> Result<()> {
    for kind in EngineKind::all() {
        let json = format!(r#"{{"translation": {{"engine": "{}"}}}}"#, kind);
        let config: Config = serde_json::from_str(&json)?;
        assert_eq!(config.translation.engine, kind);
        assert_eq!(kind.to_string().parse::<EngineKind>()?, kind);
    }
    Ok(())
}

/// Test that only chat engines carry conversation memory
#[test]
fn test_engine_kind_is_stateful_shouldMatchChatEngines() {
    let stateful: Vec<EngineKind> = EngineKind::all().into_iter().filter(|k| k.is_stateful()).collect();
    assert_eq!(stateful, vec![EngineKind::OpenAI, EngineKind::Ollama]);
}

/// Test that keyed engines need their credentials
#[test]
fn test_validate_withMissingApiKey_shouldFail() {
    for kind in [EngineKind::Google, EngineKind::OpenAI] {
        let mut config = Config::default();
        config.translation.engine = kind;
        assert!(config.validate().is_err(), "{} without key should fail", kind);

        config.translation.active_engine_config_mut().api_key = "key".to_string();
        assert!(config.validate().is_ok(), "{} with key should pass", kind);
    }
}

/// Test that engines without keys validate on defaults
#[test]
fn test_validate_withKeylessEngines_shouldSucceed() {
    for kind in [EngineKind::Deeplx, EngineKind::Ollama] {
        let mut config = Config::default();
        config.translation.engine = kind;
        assert!(config.validate().is_ok(), "{} should validate", kind);
    }
}

/// Test that unknown language codes are rejected
#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.source_language = "xx-invalid".to_string();
    assert!(config.validate().is_err());
}

/// Test that a chat engine needs at least one remembered exchange
#[test]
fn test_validate_withZeroContextOffsetOnChatEngine_shouldFail() {
    let mut config = Config::default();
    config.translation.common.context_offset = 0;
    assert!(config.validate().is_ok());

    config.translation.engine = EngineKind::Ollama;
    assert!(config.validate().is_err());
}

/// Test that a bad endpoint is caught at startup
#[test]
fn test_validate_withMalformedEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.active_engine_config_mut().endpoint = "http://[::1".to_string();
    assert!(config.validate().is_err());
}

/// Test that the mutable accessor adds a missing engine entry
#[test]
fn test_active_engine_config_mut_withMissingEntry_shouldAddDefaults() {
    let mut config = Config::default();
    config.translation.available_engines.clear();
    config.translation.engine = EngineKind::Ollama;

    let entry = config.translation.active_engine_config_mut();
    assert_eq!(entry.engine_type, "ollama");
    assert_eq!(entry.model, "llama3");
    assert_eq!(config.translation.available_engines.len(), 1);
}

/// Test that batch settings convert to batch options
#[test]
fn test_batch_config_into_options_shouldCarryEveryField() {
    let options = BatchOptions::from(BatchConfig { block_size: 8, overlap: 2, window_retries: 3 });
    assert_eq!(options, BatchOptions::new(8, 2).with_window_retries(3));
}

/// Test the log level mapping
#[test]
fn test_log_level_into_level_filter_shouldMatchNames() {
    assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
    assert_eq!(log::LevelFilter::from(LogLevel::default()), log::LevelFilter::Info);
}
