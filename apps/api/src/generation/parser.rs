//! Response Parser — turns raw backend text into questions and rubric matches.
//!
//! Each delimited block is extracted on its own. A response missing one block
//! still yields the other two; the missing field gets a fixed sentinel and the
//! result is tagged `Malformed`. Nothing in here returns an error.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::generation::prompts::{
    ANSWER_KEY_BEGIN, ANSWER_KEY_END, EXPLANATION_BEGIN, EXPLANATION_END, QUESTION_BEGIN,
    QUESTION_END,
};
use crate::generation::request::{GenerationResult, GenerationStatus};
use crate::generation::rubric::Rubric;

/// Stands in for a question or explanation block the backend left out.
pub const NOT_SPECIFIED: &str = "Not specified";
/// Stands in for the question text when the backend call itself failed.
pub const GENERATION_FAILED: &str = "Question generation failed";
/// Stands in for the rubric bullet when no valid index came back.
pub const UNKNOWN_BULLET: &str = "Unknown bullet";

static ANSWER_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-D])\b").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
    Unknown,
}

impl AnswerLetter {
    fn from_char(c: char) -> Self {
        match c {
            'A' => AnswerLetter::A,
            'B' => AnswerLetter::B,
            'C' => AnswerLetter::C,
            'D' => AnswerLetter::D,
            _ => AnswerLetter::Unknown,
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnswerLetter::A => "A",
            AnswerLetter::B => "B",
            AnswerLetter::C => "C",
            AnswerLetter::D => "D",
            AnswerLetter::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl Serialize for AnswerLetter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuestion {
    pub question_text: String,
    pub answer_letter: AnswerLetter,
    pub explanation_text: String,
}

impl ParsedQuestion {
    /// All sentinels, for a call that never produced any text.
    pub fn request_failed() -> Self {
        Self {
            question_text: GENERATION_FAILED.to_string(),
            answer_letter: AnswerLetter::Unknown,
            explanation_text: NOT_SPECIFIED.to_string(),
        }
    }

    /// True when every block was found and the answer key named a letter.
    pub fn is_complete(&self) -> bool {
        self.question_text != NOT_SPECIFIED
            && self.question_text != GENERATION_FAILED
            && self.explanation_text != NOT_SPECIFIED
            && self.answer_letter != AnswerLetter::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricMatch {
    /// 1-based; `None` when the backend gave no usable index.
    pub bullet_index: Option<usize>,
    pub bullet_text: String,
}

impl RubricMatch {
    pub fn unknown() -> Self {
        Self {
            bullet_index: None,
            bullet_text: UNKNOWN_BULLET.to_string(),
        }
    }
}

/// A parsed question plus the status of the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    pub question: ParsedQuestion,
    pub status: GenerationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationOutcome {
    pub matched: RubricMatch,
    pub status: GenerationStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Delimited-block extraction
// ────────────────────────────────────────────────────────────────────────────

/// Text between `begin` and the next `end`, trimmed. `None` if either
/// delimiter is missing or the block is empty.
fn extract_block<'a>(raw: &'a str, begin: &str, end: &str) -> Option<&'a str> {
    let start = raw.find(begin)? + begin.len();
    let len = raw[start..].find(end)?;
    let block = raw[start..start + len].trim();
    (!block.is_empty()).then_some(block)
}

/// Drops a leading echo of the block label, e.g. `Question:`.
fn strip_label<'a>(block: &'a str, label: &str) -> &'a str {
    match block.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => block[label.len()..].trim(),
        _ => block,
    }
}

fn block_or_sentinel(raw: &str, begin: &str, end: &str, label: &str) -> String {
    extract_block(raw, begin, end)
        .map(|b| strip_label(b, label))
        .filter(|b| !b.is_empty())
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}

/// First standalone capital A–D in the answer key block.
fn extract_answer_letter(raw: &str) -> AnswerLetter {
    extract_block(raw, ANSWER_KEY_BEGIN, ANSWER_KEY_END)
        .map(|b| strip_label(b, "Answer Key:"))
        .and_then(|b| ANSWER_LETTER_RE.captures(b))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .map(AnswerLetter::from_char)
        .unwrap_or(AnswerLetter::Unknown)
}

/// Extracts question, answer letter and explanation, each independently.
pub fn extract_question(raw: &str) -> ParsedQuestion {
    ParsedQuestion {
        question_text: block_or_sentinel(raw, QUESTION_BEGIN, QUESTION_END, "Question:"),
        answer_letter: extract_answer_letter(raw),
        explanation_text: block_or_sentinel(
            raw,
            EXPLANATION_BEGIN,
            EXPLANATION_END,
            "Explanation:",
        ),
    }
}

/// Interprets one question-generation call.
pub fn interpret_question(result: &GenerationResult) -> QuestionOutcome {
    if result.is_request_failed() {
        return QuestionOutcome {
            question: ParsedQuestion::request_failed(),
            status: GenerationStatus::RequestFailed,
        };
    }

    let question = extract_question(&result.text);
    let status = if question.is_complete() {
        GenerationStatus::Success
    } else {
        GenerationStatus::Malformed
    };
    QuestionOutcome { question, status }
}

// ────────────────────────────────────────────────────────────────────────────
// Numeric-index extraction
// ────────────────────────────────────────────────────────────────────────────

/// First run of digits, if it names a bullet in `1..=n`.
pub fn extract_rubric_index(raw: &str, n: usize) -> Option<usize> {
    DIGITS_RE
        .find(raw)
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|i| (1..=n).contains(i))
}

/// Interprets one classification call against the rubric it was asked about.
pub fn interpret_classification(result: &GenerationResult, rubric: &Rubric) -> ClassificationOutcome {
    if result.is_request_failed() {
        return ClassificationOutcome {
            matched: RubricMatch::unknown(),
            status: GenerationStatus::RequestFailed,
        };
    }

    let matched = extract_rubric_index(&result.text, rubric.len())
        .and_then(|i| {
            rubric.bullet(i).map(|text| RubricMatch {
                bullet_index: Some(i),
                bullet_text: text.to_string(),
            })
        });

    match matched {
        Some(matched) => ClassificationOutcome {
            matched,
            status: GenerationStatus::Success,
        },
        None => ClassificationOutcome {
            matched: RubricMatch::unknown(),
            status: GenerationStatus::Malformed,
        },
    }
}
