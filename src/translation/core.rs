/*!
 * Core translation service implementation.
 *
 * `TranslationService` resolves the configured engine once, owns it together
 * with the sliding-window batcher for the whole run, and closes the engine
 * when the run is over.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use std::time::{Duration, Instant};

use crate::app_config::{Config, EngineKind};
use crate::providers::baidu::Baidu;
use crate::providers::deeplx::DeepLx;
use crate::providers::google::Google;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;

use super::batch::{BatchOptions, SlidingWindowBatcher};
use super::engine::{ChatEngine, TranslationEngine};
use super::throttle::Throttle;

/// Statistics for one translated line sequence
#[derive(Debug, Clone)]
pub struct TranslationStats {
    /// Engine name
    pub engine: String,
    /// Lines in the input
    pub total_lines: usize,
    /// Lines that received a non-empty translation
    pub translated_lines: usize,
    /// Windows dispatched
    pub windows: usize,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl TranslationStats {
    /// Lines left empty
    pub fn missing_lines(&self) -> usize {
        self.total_lines - self.translated_lines
    }

    /// Generate a summary of the run
    pub fn summary(&self) -> String {
        format!(
            "Translation Summary:\n\
             Engine: {}\n\
             Lines translated: {}/{}\n\
             Windows: {}\n\
             Elapsed time: {:.2} seconds",
            self.engine,
            self.translated_lines,
            self.total_lines,
            self.windows,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Main translation service for subtitle translation
#[derive(Debug)]
pub struct TranslationService {
    /// Engine selected from the configuration
    engine: Box<dyn TranslationEngine>,

    /// Window planner and dispatcher
    batcher: SlidingWindowBatcher,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: &Config) -> Result<Self> {
        let engine = Self::build_engine(config)?;

        let throttle = Throttle::from_settings(config.throttle.permits, config.throttle.interval_secs)
            .context("Invalid throttle settings")?;
        if let Some(throttle) = &throttle {
            info!(
                "Rate limit: {} requests per burst, one more every {:?}",
                throttle.permits(),
                throttle.interval()
            );
        }

        let batcher = SlidingWindowBatcher::new(
            BatchOptions::from(config.batch),
            throttle,
            config.source_language.clone(),
            config.target_language.clone(),
        )
        .context("Invalid batch settings")?;

        Ok(Self::with_engine(engine, batcher))
    }

    /// Create a service around an already built engine
    pub fn with_engine(engine: Box<dyn TranslationEngine>, batcher: SlidingWindowBatcher) -> Self {
        Self { engine, batcher }
    }

    /// Build the engine the configuration selects
    pub fn build_engine(config: &Config) -> Result<Box<dyn TranslationEngine>> {
        let translation = &config.translation;
        let endpoint = translation.get_endpoint();
        let timeout = translation.get_timeout();
        let retry = translation.retry_policy();
        let common = &translation.common;

        debug!("Using {} engine at {}", translation.engine.display_name(), endpoint);

        let engine: Box<dyn TranslationEngine> = match translation.engine {
            EngineKind::Deeplx => Box::new(DeepLx::new(endpoint, timeout, retry)),
            EngineKind::Baidu => Box::new(Baidu::new(
                translation.get_api_key(),
                translation.get_api_secret(),
                endpoint,
                timeout,
                retry,
            )),
            EngineKind::Google => Box::new(Google::new(translation.get_api_key(), endpoint, timeout, retry)),
            EngineKind::OpenAI => Box::new(ChatEngine::new(
                OpenAI::new(
                    translation.get_api_key(),
                    endpoint,
                    translation.get_model(),
                    common.temperature,
                    timeout,
                    retry,
                ),
                common.system_prompt.clone(),
                common.context_offset,
            )),
            EngineKind::Ollama => Box::new(ChatEngine::new(
                Ollama::new(endpoint, translation.get_model(), common.temperature, timeout, retry),
                common.system_prompt.clone(),
                common.context_offset,
            )),
        };

        Ok(engine)
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn batcher(&self) -> &SlidingWindowBatcher {
        &self.batcher
    }

    /// Translate a line sequence, one output line per input line
    pub async fn translate_lines(&mut self, lines: &[String]) -> (Vec<String>, TranslationStats) {
        self.translate_lines_with_progress(lines, |_, _| {}).await
    }

    /// Translate a line sequence, reporting `(windows_done, windows_total)`
    pub async fn translate_lines_with_progress<F>(
        &mut self,
        lines: &[String],
        progress: F,
    ) -> (Vec<String>, TranslationStats)
    where
        F: Fn(usize, usize),
    {
        let start = Instant::now();
        let output = self
            .batcher
            .translate_with_progress(self.engine.as_mut(), lines, progress)
            .await;

        let stats = TranslationStats {
            engine: self.engine.name().to_string(),
            total_lines: lines.len(),
            translated_lines: output.iter().filter(|line| !line.is_empty()).count(),
            windows: self.batcher.windows(lines.len()).len(),
            elapsed: start.elapsed(),
        };
        (output, stats)
    }

    /// Release the engine's resources
    pub async fn close(&mut self) -> Result<()> {
        self.engine
            .close()
            .await
            .context(format!("Failed to close {} engine", self.engine.name()))
    }
}
