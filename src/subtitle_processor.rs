use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Subtitle processing and manipulation

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, possibly several lines
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: text.into(),
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let parts: Vec<&str> = timestamp.trim().split([':', ',', '.']).collect();
        if parts.len() != 4 {
            return Err(SubtitleError::Parse(format!("Invalid timestamp format: {}", timestamp)));
        }

        let mut values = [0u64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| SubtitleError::Parse(format!("Invalid timestamp component '{}' in {}", part, timestamp)))?;
        }

        let [hours, minutes, seconds, millis] = values;
        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(SubtitleError::Parse(format!("Invalid time components in timestamp: {}", timestamp)));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Entry text on a single line, as sent for translation
    pub fn single_line_text(&self) -> String {
        self.text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle entries read from one file
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    pub fn new(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection { source_file, entries }
    }

    /// Read and parse an SRT file
    pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let entries = Self::parse_srt_string(&content)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;

        debug!("Parsed {} subtitle entries from {}", entries.len(), path.display());
        Ok(Self::new(path.to_path_buf(), entries))
    }

    /// Parse SRT content into entries
    ///
    /// Blocks are separated by blank lines. A block needs a timestamp line;
    /// the sequence number before it is optional and entries are renumbered
    /// from 1 in file order.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let mut entries = Vec::new();

        for (block_index, block) in content.split("\n\n").enumerate() {
            let lines: Vec<&str> = block.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()).collect();
            if lines.is_empty() {
                continue;
            }

            let Some(timestamp_pos) = lines.iter().position(|line| TIMESTAMP_REGEX.is_match(line)) else {
                warn!("Skipping subtitle block {} without a timestamp", block_index + 1);
                continue;
            };

            let caps = TIMESTAMP_REGEX
                .captures(lines[timestamp_pos])
                .ok_or_else(|| SubtitleError::Parse(format!("Invalid timestamp line: {}", lines[timestamp_pos])))?;
            let start_ms = Self::timestamp_from_captures(&caps, 1)?;
            let end_ms = Self::timestamp_from_captures(&caps, 5)?;
            if end_ms < start_ms {
                warn!("Subtitle block {} ends before it starts", block_index + 1);
            }

            let text = lines[timestamp_pos + 1..].join("\n");
            entries.push(SubtitleEntry::new(entries.len() + 1, start_ms, end_ms, text));
        }

        if entries.is_empty() {
            return Err(SubtitleError::Parse("No valid subtitle entries were found in the SRT content".to_string()));
        }

        Ok(entries)
    }

    fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> Result<u64, SubtitleError> {
        let timestamp = format!(
            "{}:{}:{},{}",
            &caps[start_idx],
            &caps[start_idx + 1],
            &caps[start_idx + 2],
            &caps[start_idx + 3]
        );
        SubtitleEntry::parse_timestamp(&timestamp)
    }

    /// Text of every entry, one line each, in order
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(SubtitleEntry::single_line_text).collect()
    }

    /// Copy of the collection with each entry's text replaced
    ///
    /// Blank translations are kept: the entry is written with an empty text
    /// line so the timing stays in place.
    pub fn with_translated_lines(&self, translated: &[String]) -> Result<Self, SubtitleError> {
        if translated.len() != self.entries.len() {
            return Err(SubtitleError::LineCountMismatch {
                expected: self.entries.len(),
                actual: translated.len(),
            });
        }

        let entries = self
            .entries
            .iter()
            .zip(translated)
            .map(|(entry, text)| SubtitleEntry {
                text: text.trim().to_string(),
                ..entry.clone()
            })
            .collect();

        Ok(Self::new(self.source_file.clone(), entries))
    }

    /// Render the collection as SRT
    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// Write the collection as an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        file.write_all(self.to_srt_string().as_bytes())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

        Ok(())
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SubtitleCollection({}, {} entries)", self.source_file.display(), self.entries.len())
    }
}
