//! Batch pipeline — roster upload in, one archive of recipient documents out.
//!
//! Flow: load → group → per record (summarize → build prompt → generate →
//! parse) → assemble per group → package.
//!
//! The only fatal condition is a roster `SchemaError`, raised before any
//! backend call. Every per-record failure degrades to sentinel content inside
//! that record's section.

pub mod handlers;

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::document::archive::{package, Archive, ArchiveError};
use crate::document::writer::DocumentWriter;
use crate::document::{assemble_document, DocumentKind, OutputDocument, SectionBody};
use crate::generation::builder::{build_classification_request, build_question_request};
use crate::generation::category::CategoryPolicy;
use crate::generation::parser::{interpret_classification, interpret_question, UNKNOWN_BULLET};
use crate::generation::request::{BackendParams, GenerationStatus, TextGenerator};
use crate::generation::rubric::Rubric;
use crate::generation::summarizer::summarize_case;
use crate::roster::grouping::{group_by_key, Group};
use crate::roster::loader::{
    load_case_records, load_feedback_records, ExamColumns, FeedbackColumns, SchemaError,
};
use crate::roster::models::{CaseRecord, FeedbackRecord};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Knobs for one batch runner. Defaults match the reference roster exports.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub delimiter: u8,
    /// Records of one group generated at once. Output order never depends on it.
    pub concurrency: usize,
    pub questions_per_case: usize,
    pub question_params: BackendParams,
    pub classification_params: BackendParams,
    pub exam_columns: ExamColumns,
    pub feedback_columns: FeedbackColumns,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            delimiter: b',',
            concurrency: 1,
            questions_per_case: 2,
            question_params: BackendParams::QUESTION,
            classification_params: BackendParams::CLASSIFICATION,
            exam_columns: ExamColumns::default(),
            feedback_columns: FeedbackColumns::default(),
        }
    }
}

/// Runs exam and evaluation batches against one generation backend.
pub struct BatchRunner {
    generator: Arc<dyn TextGenerator>,
    categories: Arc<dyn CategoryPolicy>,
    writer: Arc<dyn DocumentWriter>,
    rubric: Rubric,
    settings: BatchSettings,
}

impl BatchRunner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        categories: Arc<dyn CategoryPolicy>,
        writer: Arc<dyn DocumentWriter>,
        rubric: Rubric,
        settings: BatchSettings,
    ) -> Self {
        Self {
            generator,
            categories,
            writer,
            rubric,
            settings,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Exam variant: each case gets `questions_per_case` generated questions.
    pub async fn run_exam_batch(&self, raw: &[u8]) -> Result<Archive, BatchError> {
        let span = info_span!("exam_batch", batch_id = %Uuid::new_v4());
        self.exam_batch(raw).instrument(span).await
    }

    /// Classification variant: each feedback row is matched to one rubric bullet.
    pub async fn run_evaluation_batch(&self, raw: &[u8]) -> Result<Archive, BatchError> {
        let span = info_span!("evaluation_batch", batch_id = %Uuid::new_v4());
        self.evaluation_batch(raw).instrument(span).await
    }

    async fn exam_batch(&self, raw: &[u8]) -> Result<Archive, BatchError> {
        let records = load_case_records(raw, self.settings.delimiter, &self.settings.exam_columns)?;
        let groups = group_by_key(records, CaseRecord::recipient_key);
        info!("Generating exams for {} recipients", groups.len());

        let documents = self
            .build_documents(&groups, DocumentKind::Exam, |record, case_index| {
                self.exam_section(record, case_index).boxed()
            })
            .await;

        self.finish(&documents)
    }

    async fn evaluation_batch(&self, raw: &[u8]) -> Result<Archive, BatchError> {
        let records =
            load_feedback_records(raw, self.settings.delimiter, &self.settings.feedback_columns)?;
        let groups = group_by_key(records, FeedbackRecord::recipient_key);
        info!("Classifying feedback for {} recipients", groups.len());

        let documents = self
            .build_documents(&groups, DocumentKind::Evaluation, |record, _| {
                self.evaluation_section(record).boxed()
            })
            .await;

        self.finish(&documents)
    }

    /// One document per group. Records within a group may be generated
    /// concurrently, but sections are collected in input order.
    async fn build_documents<'a, T, F>(
        &self,
        groups: &'a [Group<T>],
        kind: DocumentKind,
        section: F,
    ) -> Vec<OutputDocument>
    where
        T: Sync,
        F: Fn(&'a T, usize) -> BoxFuture<'a, SectionBody>,
    {
        let mut documents = Vec::with_capacity(groups.len());
        let mut next_case = 0;

        for group in groups {
            let first_case = next_case;
            next_case += group.len();

            let pending: Vec<BoxFuture<'a, SectionBody>> = group
                .records
                .iter()
                .enumerate()
                .map(|(i, record)| section(record, first_case + i))
                .collect();

            let bodies: Vec<SectionBody> = stream::iter(pending)
                .buffered(self.settings.concurrency.max(1))
                .collect()
                .await;

            let document = assemble_document(&group.key, kind, bodies);
            info!(
                recipient = %group.key,
                sections = document.sections.len(),
                fallbacks = document.fallback_count(),
                "Document assembled"
            );
            documents.push(document);
        }

        documents
    }

    fn finish(&self, documents: &[OutputDocument]) -> Result<Archive, BatchError> {
        let archive = package(documents, self.writer.as_ref())?;
        info!(
            entries = archive.len(),
            fallbacks = documents.iter().map(OutputDocument::fallback_count).sum::<usize>(),
            "Batch complete"
        );
        Ok(archive)
    }

    async fn exam_section(&self, record: &CaseRecord, case_index: usize) -> SectionBody {
        let summary = summarize_case(record);
        let category = self.categories.choose(case_index);
        let mut questions = Vec::with_capacity(self.settings.questions_per_case);

        // Questions of one case run one after another; only whole cases overlap.
        for n in 1..=self.settings.questions_per_case {
            let request = build_question_request(&summary, category, self.settings.question_params);
            let result = self.generator.generate(&request).await;
            let outcome = interpret_question(&result);
            if outcome.status != GenerationStatus::Success {
                warn!(
                    recipient = %record.recipient_key,
                    case = case_index + 1,
                    question = n,
                    status = ?outcome.status,
                    "Question fell back to sentinel content"
                );
            }
            questions.push(outcome);
        }

        SectionBody::Exam {
            summary,
            category,
            questions,
        }
    }

    async fn evaluation_section(&self, record: &FeedbackRecord) -> SectionBody {
        let feedback = record.feedback_text();
        let request = build_classification_request(
            &feedback,
            &self.rubric,
            self.settings.classification_params,
        );
        let result = self.generator.generate(&request).await;
        let classification = interpret_classification(&result, &self.rubric);
        if classification.status != GenerationStatus::Success {
            warn!(
                recipient = %record.recipient_key,
                status = ?classification.status,
                "Classification fell back to {UNKNOWN_BULLET:?}"
            );
        }

        SectionBody::Evaluation {
            feedback,
            rating: record.rating,
            rating_descriptor: self
                .rubric
                .bullet(usize::from(record.rating))
                .unwrap_or(UNKNOWN_BULLET)
                .to_string(),
            classification,
        }
    }
}
