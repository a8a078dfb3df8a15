use crate::error::{Result, SuiteError};
use serde::Serialize;
use std::path::PathBuf;

/// Pipe-delimited `id|text|text` index of the corpus
pub const METADATA_FILE: &str = "metadata.csv";
/// Directory holding the normalized audio
pub const WAVS_DIR: &str = "wavs";
pub const AUDIO_EXT: &str = "wav";

/// Width of the zero-padded corpus id
pub const ID_WIDTH: usize = 6;
/// Largest take index that fits in [`ID_WIDTH`] digits
pub const MAX_TAKE_INDEX: u32 = 999_999;

const DELIMITER: char = '|';

/// One normalized utterance in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusEntry {
    pub id: String,
    pub audio: PathBuf,
    pub text: String,
}

impl CorpusEntry {
    /// Manifest row: the transcript fills both text columns
    pub fn to_row(&self) -> String {
        let text = quote_field(&self.text);
        format!("{}{DELIMITER}{text}{DELIMITER}{text}", self.id)
    }
}

/// Corpus id for a take index: the index zero-padded to six digits
pub fn corpus_id(index: u32) -> Result<String> {
    if index > MAX_TAKE_INDEX {
        return Err(SuiteError::IndexOverflow(index));
    }
    Ok(format!("{index:0width$}", width = ID_WIDTH))
}

/// Render all rows, newline-terminated
pub fn render(entries: &[CorpusEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.to_row() + "\n")
        .collect()
}

/// Collapse a transcript onto one manifest line
///
/// Each run of line breaks, with the whitespace around it, becomes a single
/// space, and the ends are trimmed.
pub fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// Minimal quoting: only fields containing the delimiter, a quote or a line
// break are wrapped, with embedded quotes doubled.
fn quote_field(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_id_padding() {
        assert_eq!(corpus_id(7).unwrap(), "000007");
        assert_eq!(corpus_id(123456).unwrap(), "123456");
        assert_eq!(corpus_id(999_999).unwrap(), "999999");
    }

    #[test]
    fn test_corpus_id_overflow() {
        assert!(matches!(
            corpus_id(1_000_000),
            Err(SuiteError::IndexOverflow(1_000_000))
        ));
    }

    #[test]
    fn test_row_duplicates_text() {
        let entry = CorpusEntry {
            id: "000001".to_string(),
            audio: PathBuf::from("wavs/000001.wav"),
            text: "hello".to_string(),
        };
        assert_eq!(entry.to_row(), "000001|hello|hello");
    }

    #[test]
    fn test_row_quotes_delimiter_and_quotes() {
        let entry = CorpusEntry {
            id: "000002".to_string(),
            audio: PathBuf::from("wavs/000002.wav"),
            text: "say \"a|b\"".to_string(),
        };
        assert_eq!(
            entry.to_row(),
            "000002|\"say \"\"a|b\"\"\"|\"say \"\"a|b\"\"\""
        );
    }

    #[test]
    fn test_single_line_joins_broken_transcripts() {
        assert_eq!(single_line("line one\nline two"), "line one line two");
        assert_eq!(single_line("  a \r\n\r\n b \n"), "a b");
        assert_eq!(single_line("keep | and \"quotes\""), "keep | and \"quotes\"");
        assert_eq!(single_line("\n \n"), "");
    }
}
