/*!
 * Tests for subtitle processing functionality
 */

use anyhow::Result;
use srtt::errors::SubtitleError;
use srtt::subtitle_processor::{SubtitleCollection, SubtitleEntry};

use crate::common;

/// Test parsing a valid SRT string
#[test]
fn test_parse_srt_string_withValidInput_shouldReturnEntries() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nHello, world!\n\n2\n00:00:05,500 --> 00:00:07,250\nSecond line\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], SubtitleEntry::new(1, 1_000, 4_000, "Hello, world!"));
    assert_eq!(entries[1].start_time_ms, 5_500);
    assert_eq!(entries[1].end_time_ms, 7_250);
    assert_eq!(entries[1].text, "Second line");
    Ok(())
}

/// Test that Windows line endings and a byte order mark are accepted
#[test]
fn test_parse_srt_string_withBomAndCrlf_shouldParse() -> Result<()> {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nこんにちは\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nさようなら\r\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "こんにちは");
    assert_eq!(entries[1].seq_num, 2);
    Ok(())
}

/// Test that entries are renumbered in file order
#[test]
fn test_parse_srt_string_withGapsInNumbering_shouldRenumber() -> Result<()> {
    let content = "7\n00:00:01,000 --> 00:00:02,000\nA\n\n42\n00:00:03,000 --> 00:00:04,000\nB\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    let numbers: Vec<usize> = entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(numbers, vec![1, 2]);
    Ok(())
}

/// Test that content with no entries is an error
#[test]
fn test_parse_srt_string_withNoEntries_shouldFail() {
    let result = SubtitleCollection::parse_srt_string("just some text\nwithout timing\n");
    assert!(matches!(result, Err(SubtitleError::Parse(_))));
}

/// Test that a multi-line entry becomes one translation line
#[test]
fn test_lines_withMultiLineEntry_shouldJoinWithSpace() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nFirst half\nsecond half\n\n2\n00:00:05,000 --> 00:00:06,000\nAlone\n";
    let subtitles = SubtitleCollection::new("test.srt".into(), SubtitleCollection::parse_srt_string(content)?);

    assert_eq!(subtitles.lines(), vec!["First half second half", "Alone"]);
    Ok(())
}

/// Test timestamp parsing and formatting
#[test]
fn test_parse_timestamp_withValidTimestamp_shouldReturnMillis() -> Result<()> {
    assert_eq!(SubtitleEntry::parse_timestamp("01:02:03,456")?, 3_723_456);
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:00.001")?, 1);
    assert_eq!(SubtitleEntry::format_timestamp(3_723_456), "01:02:03,456");
    Ok(())
}

/// Test that out-of-range timestamp parts are rejected
#[test]
fn test_parse_timestamp_withInvalidComponents_shouldFail() {
    assert!(SubtitleEntry::parse_timestamp("00:61:00,000").is_err());
    assert!(SubtitleEntry::parse_timestamp("00:00:00").is_err());
    assert!(SubtitleEntry::parse_timestamp("aa:00:00,000").is_err());
}

/// Test that translated lines keep the timing of the original entries
#[test]
fn test_with_translated_lines_shouldKeepTiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "test.srt")?;
    let subtitles = SubtitleCollection::parse_srt_file(&path)?;

    let translated = vec!["Un".to_string(), "".to_string(), " Trois ".to_string()];
    let result = subtitles.with_translated_lines(&translated)?;

    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.entries[0].text, "Un");
    assert_eq!(result.entries[1].text, "");
    assert_eq!(result.entries[2].text, "Trois");
    for (original, translated) in subtitles.entries.iter().zip(&result.entries) {
        assert_eq!(original.start_time_ms, translated.start_time_ms);
        assert_eq!(original.end_time_ms, translated.end_time_ms);
        assert_eq!(original.seq_num, translated.seq_num);
    }
    Ok(())
}

/// Test that a translation of the wrong length is refused
#[test]
fn test_with_translated_lines_withWrongCount_shouldFail() -> Result<()> {
    let subtitles = SubtitleCollection::new(
        "test.srt".into(),
        vec![SubtitleEntry::new(1, 0, 1_000, "Hello")],
    );

    let result = subtitles.with_translated_lines(&[]);

    assert!(matches!(
        result,
        Err(SubtitleError::LineCountMismatch { expected: 1, actual: 0 })
    ));
    Ok(())
}

/// Test writing and reading back an SRT file
#[test]
fn test_write_to_srt_shouldProduceParseableFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("nested").join("out.srt");
    let subtitles = SubtitleCollection::new(
        "in.srt".into(),
        vec![
            SubtitleEntry::new(1, 1_000, 2_000, "Bonjour"),
            SubtitleEntry::new(2, 3_000, 4_500, "Au revoir"),
        ],
    );

    subtitles.write_to_srt(&output)?;
    let written = std::fs::read_to_string(&output)?;

    assert!(written.starts_with("1\n00:00:01,000 --> 00:00:02,000\nBonjour\n\n2\n"));
    let reread = SubtitleCollection::parse_srt_file(&output)?;
    assert_eq!(reread.entries, subtitles.entries);
    Ok(())
}
