// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use srtt::app_config::{self, Config, EngineKind, LogLevel};
use srtt::app_controller::{Controller, FileOutcome};

/// CLI Wrapper for EngineKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngine {
    Deeplx,
    Baidu,
    Google,
    #[value(name = "openai", alias = "chatgpt")]
    OpenAI,
    Ollama,
}

impl From<CliEngine> for EngineKind {
    fn from(cli_engine: CliEngine) -> Self {
        match cli_engine {
            CliEngine::Deeplx => EngineKind::Deeplx,
            CliEngine::Baidu => EngineKind::Baidu,
            CliEngine::Google => EngineKind::Google,
            CliEngine::OpenAI => EngineKind::OpenAI,
            CliEngine::Ollama => EngineKind::Ollama,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitle files (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for srtt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file, single-file input only (default: <name>_<target>.srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation engine to use
    #[arg(short, long, value_enum)]
    engine: Option<CliEngine>,

    /// Model name for chat engines
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'ja', 'en', or 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'en', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// API key (Baidu: app id)
    #[arg(long, env = "SRTT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API secret (Baidu only)
    #[arg(long, env = "SRTT_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Engine endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Lines per request
    #[arg(long)]
    block_size: Option<usize>,

    /// Lines shared between consecutive requests
    #[arg(long)]
    overlap: Option<usize>,

    /// Requests allowed in a burst before throttling
    #[arg(long)]
    permits: Option<u32>,

    /// Seconds to regain one request once throttled
    #[arg(long)]
    interval: Option<u64>,

    /// Configuration file path
    #[arg(short, long, default_value = app_config::DEFAULT_CONFIG_FILENAME)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// srtt - translate SRT subtitles with sliding-window batches
///
/// Subtitle lines are sent to the engine a window at a time. Consecutive
/// windows share a few lines so the engine sees what came before.
#[derive(Parser, Debug)]
#[command(name = "srtt")]
#[command(version)]
#[command(about = "Subtitle translation with sliding-window batches")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "srtt translates SRT subtitle files through DeepLX, Baidu, Google or a chat model.

EXAMPLES:
    srtt movie.srt                              # Translate using default config
    srtt -f movie.srt                           # Force overwrite existing output
    srtt -e baidu --api-key ID --api-secret KEY movie.srt
    srtt -e openai -m gpt-4o -s en -t ja movie.srt
    srtt --block-size 20 --overlap 5 /subs/     # Process an entire directory
    srtt --permits 5 --interval 60 movie.srt    # At most 5 requests, then one per minute
    srtt completions bash > srtt.bash           # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED ENGINES:
    deeplx - DeepLX bridge (default: http://127.0.0.1:1188/translate)
    baidu  - Baidu Fanyi (requires app id and secret)
    google - Google Cloud Translation v2 (requires API key)
    openai - OpenAI-compatible chat completions (requires API key)
    ollama - Local Ollama server")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    // @note: `log::set_max_level` does the filtering after startup
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "✖"),
            Level::Warn => ("\x1B[1;33m", "!"),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "·"),
            Level::Trace => ("\x1B[1;35m", "~"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtt", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

/// Load the config file, or write the defaults where it was expected
fn load_or_create_config(requested: &Path) -> Result<Config> {
    let config_path = app_config::resolve_config_path(requested);
    if config_path.exists() {
        return Config::from_file(&config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path.display());
    let config = Config::default();
    config.save(&config_path)?;
    Ok(config)
}

/// Apply command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(engine) = &options.engine {
        config.translation.engine = engine.clone().into();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    let engine_config = config.translation.active_engine_config_mut();
    if let Some(model) = &options.model {
        engine_config.model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        engine_config.api_key = api_key.clone();
    }
    if let Some(api_secret) = &options.api_secret {
        engine_config.api_secret = api_secret.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        engine_config.endpoint = endpoint.clone();
    }

    if let Some(block_size) = options.block_size {
        config.batch.block_size = block_size;
    }
    if let Some(overlap) = options.overlap {
        config.batch.overlap = overlap;
    }
    if let Some(permits) = options.permits {
        config.throttle.permits = permits;
    }
    if let Some(interval) = options.interval {
        config.throttle.interval_secs = interval;
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    // A command line level applies before the config is even read
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(LogLevel::from(cmd_log_level.clone()).into());
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(config.log_level.into());

    let controller = Controller::with_config(config)?;
    let config = controller.config();
    info!(
        "Translating {} -> {} with {}",
        config.source_language,
        config.target_language,
        config.translation.engine.display_name()
    );
    if config.throttle.is_enabled() {
        info!(
            "Rate limit enabled: {} requests, then one every {}s",
            config.throttle.permits, config.throttle.interval_secs
        );
    }

    if input_path.is_file() {
        match controller
            .run(input_path, options.output.clone(), options.force_overwrite)
            .await
            .context("Translation failed")?
        {
            FileOutcome::Translated(path) => info!("Translation saved to {}", path.display()),
            FileOutcome::Skipped(path) => info!("Nothing to do, {} already exists", path.display()),
        }
    } else if input_path.is_dir() {
        if options.output.is_some() {
            warn!("--output is ignored for directory input");
        }
        controller.run_folder(input_path, options.force_overwrite).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
