//! Document Assembler — one in-memory document per recipient.
//!
//! Sections are numbered 1..=n in the order they are pushed. A section whose
//! generation failed still takes its number; its content just carries the
//! parser's sentinels.

pub mod archive;
pub mod writer;

use serde::Serialize;

use crate::generation::category::QuestionCategory;
use crate::generation::parser::{ClassificationOutcome, QuestionOutcome, NOT_SPECIFIED};
use crate::generation::request::GenerationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Exam,
    Evaluation,
}

impl DocumentKind {
    fn title_for(&self, recipient_key: &str) -> String {
        match self {
            DocumentKind::Exam => format!("Pediatric Shelf Examination for {recipient_key}"),
            DocumentKind::Evaluation => format!("Learner Evaluation for {recipient_key}"),
        }
    }

    fn section_label(&self) -> &'static str {
        match self {
            DocumentKind::Exam => "Case",
            DocumentKind::Evaluation => "Evaluation",
        }
    }
}

/// The writer-facing view of a document: ordered headings and paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// Level 0 is the document title.
    Heading { level: u8, text: String },
    Paragraph(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Exam {
        summary: String,
        category: QuestionCategory,
        questions: Vec<QuestionOutcome>,
    },
    Evaluation {
        feedback: String,
        rating: u8,
        rating_descriptor: String,
        classification: ClassificationOutcome,
    },
}

impl SectionBody {
    /// Backend calls in this section that ended in a sentinel.
    pub fn fallback_count(&self) -> usize {
        match self {
            SectionBody::Exam { questions, .. } => questions
                .iter()
                .filter(|q| q.status != GenerationStatus::Success)
                .count(),
            SectionBody::Evaluation { classification, .. } => {
                usize::from(classification.status != GenerationStatus::Success)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSection {
    /// 1-based, contiguous within the document.
    pub number: usize,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub recipient_key: String,
    pub kind: DocumentKind,
    pub title: String,
    pub sections: Vec<CaseSection>,
}

impl OutputDocument {
    pub fn new(recipient_key: &str, kind: DocumentKind) -> Self {
        Self {
            recipient_key: recipient_key.to_string(),
            kind,
            title: kind.title_for(recipient_key),
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, body: SectionBody) {
        let number = self.sections.len() + 1;
        self.sections.push(CaseSection { number, body });
    }

    pub fn fallback_count(&self) -> usize {
        self.sections.iter().map(|s| s.body.fallback_count()).sum()
    }

    /// Flattens the document into headings and paragraphs for a writer.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![Block::Heading {
            level: 0,
            text: self.title.clone(),
        }];

        for section in &self.sections {
            blocks.push(Block::Heading {
                level: 1,
                text: format!("{} {}", self.kind.section_label(), section.number),
            });
            match &section.body {
                SectionBody::Exam {
                    summary,
                    category,
                    questions,
                } => exam_blocks(&mut blocks, summary, *category, questions),
                SectionBody::Evaluation {
                    feedback,
                    rating,
                    rating_descriptor,
                    classification,
                } => evaluation_blocks(
                    &mut blocks,
                    feedback,
                    *rating,
                    rating_descriptor,
                    classification,
                ),
            }
        }

        blocks
    }
}

fn exam_blocks(
    blocks: &mut Vec<Block>,
    summary: &str,
    category: QuestionCategory,
    questions: &[QuestionOutcome],
) {
    blocks.push(Block::Paragraph("Case Vignette:".to_string()));
    blocks.push(Block::Paragraph(summary.to_string()));

    for (i, outcome) in questions.iter().enumerate() {
        let q = &outcome.question;
        blocks.push(Block::Paragraph(format!(
            "Question {} ({}):",
            i + 1,
            category.title()
        )));
        blocks.push(Block::Paragraph(q.question_text.clone()));
        blocks.push(Block::Paragraph(format!("Answer Key: {}", q.answer_letter)));
        blocks.push(Block::Paragraph(format!(
            "Explanation: {}",
            q.explanation_text
        )));
    }
}

fn evaluation_blocks(
    blocks: &mut Vec<Block>,
    feedback: &str,
    rating: u8,
    rating_descriptor: &str,
    classification: &ClassificationOutcome,
) {
    let feedback = if feedback.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        feedback
    };
    blocks.push(Block::Paragraph("Preceptor Feedback:".to_string()));
    blocks.push(Block::Paragraph(feedback.to_string()));
    blocks.push(Block::Paragraph(format!(
        "Preceptor Rating: {rating} ({rating_descriptor})"
    )));

    let matched = &classification.matched;
    let matched_line = match matched.bullet_index {
        Some(i) => format!("Matched Behavior: {i}. {}", matched.bullet_text),
        None => format!("Matched Behavior: {}", matched.bullet_text),
    };
    blocks.push(Block::Paragraph(matched_line));

    let agreement = match matched.bullet_index {
        Some(i) if i == usize::from(rating) => "Yes",
        Some(_) => "No",
        None => "Unknown",
    };
    blocks.push(Block::Paragraph(format!(
        "Rating Agrees With Feedback: {agreement}"
    )));
}

/// Builds a recipient's document from its section bodies, in the given order.
pub fn assemble_document(
    recipient_key: &str,
    kind: DocumentKind,
    bodies: Vec<SectionBody>,
) -> OutputDocument {
    let mut document = OutputDocument::new(recipient_key, kind);
    for body in bodies {
        document.push_section(body);
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::parser::{AnswerLetter, ParsedQuestion, RubricMatch};

    fn question(text: &str, status: GenerationStatus) -> QuestionOutcome {
        QuestionOutcome {
            question: ParsedQuestion {
                question_text: text.to_string(),
                answer_letter: AnswerLetter::A,
                explanation_text: "Because.".to_string(),
            },
            status,
        }
    }

    fn exam_body(summary: &str, statuses: &[GenerationStatus]) -> SectionBody {
        SectionBody::Exam {
            summary: summary.to_string(),
            category: QuestionCategory::NextBestStep,
            questions: statuses
                .iter()
                .enumerate()
                .map(|(i, s)| question(&format!("Q{}", i + 1), *s))
                .collect(),
        }
    }

    #[test]
    fn test_sections_numbered_contiguously_despite_failures() {
        let document = assemble_document(
            "a@x.com",
            DocumentKind::Exam,
            vec![
                exam_body("first", &[GenerationStatus::Success]),
                exam_body("second", &[GenerationStatus::RequestFailed]),
                exam_body("third", &[GenerationStatus::Malformed]),
            ],
        );
        let numbers: Vec<usize> = document.sections.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(document.fallback_count(), 2);
    }

    #[test]
    fn test_exam_blocks_layout() {
        let document = assemble_document(
            "a@x.com",
            DocumentKind::Exam,
            vec![exam_body(
                "A pediatric patient presents with croup.",
                &[GenerationStatus::Success, GenerationStatus::Success],
            )],
        );
        let blocks = document.blocks();
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 0,
                text: "Pediatric Shelf Examination for a@x.com".to_string()
            }
        );
        assert_eq!(
            blocks[1],
            Block::Heading {
                level: 1,
                text: "Case 1".to_string()
            }
        );
        assert_eq!(blocks[2], Block::Paragraph("Case Vignette:".to_string()));
        assert_eq!(
            blocks[4],
            Block::Paragraph("Question 1 (Next Best Step In Management):".to_string())
        );
        assert_eq!(blocks[6], Block::Paragraph("Answer Key: A".to_string()));
        assert_eq!(
            blocks[8],
            Block::Paragraph("Question 2 (Next Best Step In Management):".to_string())
        );
        assert_eq!(blocks.len(), 1 + 1 + 2 + 2 * 4);
    }

    #[test]
    fn test_evaluation_blocks_report_agreement() {
        let body = SectionBody::Evaluation {
            feedback: "Strong differential.".to_string(),
            rating: 4,
            rating_descriptor: "Independent".to_string(),
            classification: ClassificationOutcome {
                matched: RubricMatch {
                    bullet_index: Some(4),
                    bullet_text: "Independent".to_string(),
                },
                status: GenerationStatus::Success,
            },
        };
        let document = assemble_document("111", DocumentKind::Evaluation, vec![body]);
        let blocks = document.blocks();
        assert!(blocks.contains(&Block::Heading {
            level: 1,
            text: "Evaluation 1".to_string()
        }));
        assert!(blocks.contains(&Block::Paragraph(
            "Matched Behavior: 4. Independent".to_string()
        )));
        assert!(blocks.contains(&Block::Paragraph(
            "Rating Agrees With Feedback: Yes".to_string()
        )));
    }

    #[test]
    fn test_unknown_match_is_visible_in_output() {
        let body = SectionBody::Evaluation {
            feedback: String::new(),
            rating: 2,
            rating_descriptor: "Needs guidance".to_string(),
            classification: ClassificationOutcome {
                matched: RubricMatch::unknown(),
                status: GenerationStatus::RequestFailed,
            },
        };
        let document = assemble_document("111", DocumentKind::Evaluation, vec![body]);
        let blocks = document.blocks();
        assert!(blocks.contains(&Block::Paragraph(NOT_SPECIFIED.to_string())));
        assert!(blocks.contains(&Block::Paragraph(
            "Matched Behavior: Unknown bullet".to_string()
        )));
        assert!(blocks.contains(&Block::Paragraph(
            "Rating Agrees With Feedback: Unknown".to_string()
        )));
        assert_eq!(document.fallback_count(), 1);
    }
}
