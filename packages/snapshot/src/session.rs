//! Session context.
//!
//! Holds the inputs of one comparison and the snapshots computed from them,
//! so repeated views do not re-extract every document. Nothing here is
//! process-wide: callers own a [`Session`] and pass it where it is needed.

use roster_diff_extract::ExtractionConfig;
use roster_diff_pdf::TextSource;

use crate::progress::ProgressCallback;
use crate::upload::{InputDocument, NameDeduper};
use crate::{BatchError, BatchOutcome, build_snapshots};

#[derive(Debug, Default)]
pub struct Session {
    documents: Vec<InputDocument>,
    deduper: NameDeduper,
    outcome: Option<BatchOutcome>,
    active_revision: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input document under a unique display name.
    ///
    /// Empty documents are rejected with a warning and `None` is returned.
    /// Adding a document invalidates any cached snapshots.
    pub fn add_document(&mut self, name: &str, bytes: Vec<u8>) -> Option<String> {
        if bytes.is_empty() {
            log::warn!("Empty file: {name}");
            return None;
        }
        let name = self.deduper.unique_name(name);
        self.documents.push(InputDocument::new(name.clone(), bytes));
        self.outcome = None;
        Some(name)
    }

    #[must_use]
    pub fn documents(&self) -> &[InputDocument] {
        &self.documents
    }

    /// Whether enough inputs were added to attempt a comparison.
    #[must_use]
    pub fn has_enough_documents(&self, config: &ExtractionConfig) -> bool {
        self.documents.len() >= config.min_documents
    }

    /// Builds the snapshots, reusing the cached result when the inputs have
    /// not changed.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InsufficientDocuments`] when fewer than
    /// `config.min_documents` documents produced records. The outcome is
    /// cached either way so per-document reports remain available through
    /// [`Self::outcome`].
    pub fn process(
        &mut self,
        source: &dyn TextSource,
        config: &ExtractionConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<&BatchOutcome, BatchError> {
        if self.outcome.is_none() {
            log::info!("Processing {} documents", self.documents.len());
            self.outcome = Some(build_snapshots(&self.documents, source, config, progress));
        }

        let outcome = self.outcome.get_or_insert_with(BatchOutcome::default);
        outcome.ensure_comparable(config.min_documents)?;
        Ok(outcome)
    }

    /// The cached batch outcome, if [`Self::process`] ran.
    #[must_use]
    pub const fn outcome(&self) -> Option<&BatchOutcome> {
        self.outcome.as_ref()
    }

    /// Name of the stored revision this session was loaded from or saved as.
    #[must_use]
    pub fn active_revision(&self) -> Option<&str> {
        self.active_revision.as_deref()
    }

    pub fn set_active_revision(&mut self, name: impl Into<String>) {
        self.active_revision = Some(name.into());
    }

    /// Clears every input and cached result to start a new comparison.
    pub fn reset(&mut self) {
        log::debug!("Resetting session");
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use roster_diff_pdf::{ExtractedDocument, PdfError, PlainTextSource};

    use super::*;
    use crate::progress::NullProgress;
    use crate::test_support::roster_text;

    struct CountingSource(AtomicUsize);

    impl TextSource for CountingSource {
        fn extract(&self, bytes: &[u8], name: &str) -> Result<ExtractedDocument, PdfError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            PlainTextSource.extract(bytes, name)
        }
    }

    fn two_document_session() -> Session {
        let mut session = Session::new();
        session.add_document(
            "rpt.txt",
            roster_text(Some("01/01/2024"), &["111111"]).into_bytes(),
        );
        session.add_document(
            "rpt.txt",
            roster_text(Some("01/02/2024"), &["222222"]).into_bytes(),
        );
        session
    }

    #[test]
    fn duplicate_names_are_renamed() {
        let session = two_document_session();
        let names: Vec<&str> = session.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["rpt.txt", "rpt_2.txt"]);
    }

    #[test]
    fn empty_documents_are_rejected() {
        let mut session = Session::new();
        assert_eq!(session.add_document("empty.pdf", Vec::new()), None);
        assert!(session.documents().is_empty());
        assert!(!session.has_enough_documents(&ExtractionConfig::default()));
    }

    #[test]
    fn empty_documents_do_not_consume_a_name() {
        let mut session = Session::new();
        session.add_document("a.pdf", Vec::new());
        assert_eq!(session.add_document("a.pdf", b"x".to_vec()).as_deref(), Some("a.pdf"));
        assert_eq!(session.add_document("a.pdf", b"y".to_vec()).as_deref(), Some("a_2.pdf"));
    }

    #[test]
    fn processing_result_is_cached() {
        let mut session = two_document_session();
        let source = CountingSource(AtomicUsize::new(0));
        let config = ExtractionConfig::default();

        assert_eq!(
            session
                .process(&source, &config, &NullProgress)
                .unwrap()
                .snapshots
                .len(),
            2
        );
        session.process(&source, &config, &NullProgress).unwrap();
        assert_eq!(source.0.load(Ordering::SeqCst), 2);

        session.add_document("new.txt", roster_text(None, &["333333"]).into_bytes());
        session.process(&source, &config, &NullProgress).unwrap();
        assert_eq!(source.0.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn insufficient_documents_keep_reports() {
        let mut session = Session::new();
        session.add_document("one.txt", roster_text(None, &["111111"]).into_bytes());
        session.add_document("bad.txt", b"no positions".to_vec());

        let result = session.process(&PlainTextSource, &ExtractionConfig::default(), &NullProgress);
        assert!(matches!(
            result,
            Err(BatchError::InsufficientDocuments { usable: 1, .. })
        ));
        assert_eq!(session.outcome().map(|o| o.reports.len()), Some(2));
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = two_document_session();
        session.set_active_revision("march");
        session
            .process(&PlainTextSource, &ExtractionConfig::default(), &NullProgress)
            .unwrap();

        session.reset();

        assert!(session.documents().is_empty());
        assert!(session.outcome().is_none());
        assert_eq!(session.active_revision(), None);
        assert_eq!(
            session.add_document("rpt.txt", b"x".to_vec()).as_deref(),
            Some("rpt.txt")
        );
    }
}
