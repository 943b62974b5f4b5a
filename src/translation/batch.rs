/*!
 * Sliding-window batch translation.
 *
 * Lines are sent to the engine in windows of `block_size` lines. Consecutive
 * windows share `overlap` lines so the engine sees some preceding context,
 * but only the first window writes its overlapping head: later windows write
 * from `overlap` onward, so a line is never overwritten once translated.
 *
 * A failed window is logged and skipped. Its lines stay empty in the output,
 * which always has exactly one entry per input line.
 */

use log::{debug, error, info, warn};
use std::ops::Range;

use crate::errors::{ProviderError, TranslationError};

use super::engine::TranslationEngine;
use super::throttle::Throttle;

/// Window geometry and retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Lines per window
    pub block_size: usize,
    /// Lines shared between consecutive windows
    pub overlap: usize,
    /// Extra attempts for a window whose call failed or returned nothing
    pub window_retries: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            block_size: 10,
            overlap: 3,
            window_retries: 0,
        }
    }
}

impl BatchOptions {
    pub fn new(block_size: usize, overlap: usize) -> Self {
        Self {
            block_size,
            overlap,
            window_retries: 0,
        }
    }

    pub fn with_window_retries(mut self, window_retries: u32) -> Self {
        self.window_retries = window_retries;
        self
    }

    /// Check that the windows advance
    pub fn validate(&self) -> Result<(), TranslationError> {
        if self.block_size == 0 || self.overlap >= self.block_size {
            return Err(TranslationError::InvalidWindow {
                block_size: self.block_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// Distance between the starts of consecutive windows
    pub fn stride(&self) -> usize {
        self.block_size - self.overlap
    }
}

/// Translates a line sequence window by window
#[derive(Debug)]
pub struct SlidingWindowBatcher {
    options: BatchOptions,
    throttle: Option<Throttle>,
    source_language: String,
    target_language: String,
}

impl SlidingWindowBatcher {
    /// Create a batcher, rejecting geometry that would never advance
    pub fn new(
        options: BatchOptions,
        throttle: Option<Throttle>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Result<Self, TranslationError> {
        options.validate()?;
        Ok(Self {
            options,
            throttle,
            source_language: source_language.into(),
            target_language: target_language.into(),
        })
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    /// Window ranges for a sequence of `n` lines, in dispatch order
    pub fn windows(&self, n: usize) -> Vec<Range<usize>> {
        (0..n)
            .step_by(self.options.stride())
            .map(|start| start..(start + self.options.block_size).min(n))
            .collect()
    }

    /// Translate every line, leaving untranslated lines empty
    pub async fn translate(&self, engine: &mut dyn TranslationEngine, lines: &[String]) -> Vec<String> {
        self.translate_with_progress(engine, lines, |_, _| {}).await
    }

    /// Translate every line, reporting `(windows_done, windows_total)` after each window
    pub async fn translate_with_progress<F>(
        &self,
        engine: &mut dyn TranslationEngine,
        lines: &[String],
        progress: F,
    ) -> Vec<String>
    where
        F: Fn(usize, usize),
    {
        let mut output = vec![String::new(); lines.len()];
        let windows = self.windows(lines.len());
        let total = windows.len();

        debug!(
            "Translating {} lines in {} windows with {} ({} mode)",
            lines.len(),
            total,
            engine.name(),
            engine.mode()
        );

        for (done, window) in windows.into_iter().enumerate() {
            if let Some(result) = self.translate_window(engine, lines, window.clone()).await {
                self.write_window(&mut output, window, &result);
            }
            progress(done + 1, total);
        }

        output
    }

    /// Call the engine for one window, retrying up to `window_retries` times
    async fn translate_window(
        &self,
        engine: &mut dyn TranslationEngine,
        lines: &[String],
        window: Range<usize>,
    ) -> Option<Vec<String>> {
        let segments = &lines[window.clone()];

        for attempt in 0..=self.options.window_retries {
            if attempt > 0 {
                warn!(
                    "Retrying lines {}-{} (attempt {}/{})",
                    window.start + 1,
                    window.end,
                    attempt,
                    self.options.window_retries
                );
            }

            self.wait_for_permit(window.start).await;

            match engine
                .translate(segments, &self.source_language, &self.target_language)
                .await
            {
                Ok(result) if result.is_empty() => {
                    warn!(
                        "{} returned no translation for lines {}-{}",
                        engine.name(),
                        window.start + 1,
                        window.end
                    );
                }
                Ok(result) => {
                    if result.len() != segments.len() {
                        debug!(
                            "Lines {}-{}: sent {} lines, received {}",
                            window.start + 1,
                            window.end,
                            segments.len(),
                            result.len()
                        );
                    }
                    return Some(result);
                }
                Err(e) => log_window_error(engine.name(), &window, &e),
            }
        }

        None
    }

    async fn wait_for_permit(&self, translated_so_far: usize) {
        let Some(throttle) = &self.throttle else {
            return;
        };

        let wait = throttle.reserve();
        if !wait.is_zero() {
            info!(
                "Translated {} lines so far, pausing {:.1}s for the rate limit",
                translated_so_far,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Copy a window's result into the output
    ///
    /// Only the first window writes its leading `overlap` lines. Indices past
    /// the shorter of the window and the result are left alone.
    fn write_window(&self, output: &mut [String], window: Range<usize>, result: &[String]) {
        let first = if window.start == 0 { 0 } else { self.options.overlap };
        let last = window.len().min(result.len());

        for j in first..last {
            output[window.start + j] = result[j].trim().to_string();
        }
    }
}

fn log_window_error(engine: &str, window: &Range<usize>, e: &ProviderError) {
    error!(
        "{} failed to translate lines {}-{}: {}",
        engine,
        window.start + 1,
        window.end,
        e
    );
}
