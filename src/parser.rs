use crate::ir::WordRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static WORD_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<text>[^|]+?)\s*(?:\|\s*(?P<weight>[^|]*?)\s*)?(?:\|\s*(?P<group>[^|]*?)\s*)?$",
    )
    .expect("word line pattern is valid")
});

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid word list: {0}")]
    Json(#[from] json5::Error),
    #[error("line {line}: '{value}' is not a number")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: cannot read '{content}' as a word entry")]
    InvalidLine { line: usize, content: String },
}

/// Reads a word list.
///
/// Two formats are accepted: a JSON (or JSON5) array of records, or one word
/// per line written as `text [| weight [| group]]`. Blank lines and lines
/// starting with `#` are ignored in the line format.
pub fn parse_words(input: &str) -> Result<Vec<WordRecord>, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return parse_json_words(trimmed);
    }
    parse_line_words(input)
}

fn parse_json_words(input: &str) -> Result<Vec<WordRecord>, ParseError> {
    Ok(json5::from_str::<Vec<WordRecord>>(input)?)
}

fn parse_line_words(input: &str) -> Result<Vec<WordRecord>, ParseError> {
    let mut words = Vec::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let caps = WORD_LINE_RE
            .captures(line)
            .ok_or_else(|| ParseError::InvalidLine {
                line: line_no,
                content: line.to_string(),
            })?;
        let text = caps.name("text").map(|m| m.as_str().trim()).unwrap_or("");
        let mut record = WordRecord::new(text);
        record.weight = parse_number(caps.name("weight").map(|m| m.as_str()), line_no)?;
        record.group_rank = parse_number(caps.name("group").map(|m| m.as_str()), line_no)?;
        words.push(record);
    }
    Ok(words)
}

fn parse_number(raw: Option<&str>, line: usize) -> Result<Option<f64>, ParseError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            line,
            value: raw.to_string(),
        })
}
