use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::TranslationService;

// @module: Application controller for subtitle processing

/// Outcome of processing one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Translation written to the path
    Translated(PathBuf),
    /// Output already existed and overwriting was not requested
    Skipped(PathBuf),
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one SRT file
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>, force_overwrite: bool) -> Result<FileOutcome> {
        let start_time = Instant::now();
        let multi_progress = MultiProgress::new();

        let mut service = TranslationService::new(&self.config)?;
        let outcome = self
            .translate_file(&mut service, &input_file, output_file, force_overwrite, &multi_progress)
            .await;
        if let Err(e) = service.close().await {
            warn!("{}", e);
        }

        info!("Elapsed: {}", Self::format_duration(start_time.elapsed()));
        outcome
    }

    /// Translate one file with an existing service
    ///
    /// The output defaults to `<stem>_<target>.srt` next to the input.
    pub async fn translate_file(
        &self,
        service: &mut TranslationService,
        input_file: &Path,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
        multi_progress: &MultiProgress,
    ) -> Result<FileOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file
            .unwrap_or_else(|| FileManager::generate_output_path(input_file, &self.config.target_language));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, translation already exists (use -f to force overwrite)", input_file.display());
            return Ok(FileOutcome::Skipped(output_path));
        }

        let subtitles = SubtitleCollection::parse_srt_file(input_file)?;
        let lines = subtitles.lines();
        info!("{}: {} lines to translate", input_file.display(), lines.len());

        let windows = service.batcher().windows(lines.len()).len();
        let progress_bar = multi_progress.add(ProgressBar::new(windows as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} windows ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message(format!("Translating with {}", service.engine_name()));

        let pb = progress_bar.clone();
        let (translated, stats) = service
            .translate_lines_with_progress(&lines, move |done, _total| pb.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();

        if stats.missing_lines() > 0 {
            warn!(
                "{} of {} lines were not translated and are left empty",
                stats.missing_lines(),
                stats.total_lines
            );
        }
        info!("{}", stats.summary());

        let translated_subtitles = subtitles.with_translated_lines(&translated)?;
        translated_subtitles.write_to_srt(&output_path)?;
        info!("Success: {}", output_path.display());

        Ok(FileOutcome::Translated(output_path))
    }

    /// Translate every SRT file under a directory
    ///
    /// Files that are themselves translations for the target language are
    /// skipped. Each file gets a fresh engine, so chat memory does not carry
    /// over between files.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let subtitle_files = FileManager::find_subtitle_inputs(&input_dir, &self.config.target_language)?;
        if subtitle_files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        let mut success_count = 0;
        let mut skip_count = 0;
        let mut error_count = 0;

        for subtitle_file in &subtitle_files {
            let file_name = subtitle_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let mut service = TranslationService::new(&self.config)?;
            match self
                .translate_file(&mut service, subtitle_file, None, force_overwrite, &multi_progress)
                .await
            {
                Ok(FileOutcome::Translated(_)) => success_count += 1,
                Ok(FileOutcome::Skipped(_)) => skip_count += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    error_count += 1;
                }
            }
            if let Err(e) = service.close().await {
                warn!("{}", e);
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors - Duration: {}",
            success_count,
            skip_count,
            error_count,
            Self::format_duration(start_time.elapsed())
        );
        info!("{}", summary);

        let log_file_path = input_dir.join("srtt.log");
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &summary) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(())
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
