//! Progress reporting for document batches.
//!
//! Processing a batch and moving a revision to or from the store both work
//! through a list of documents one at a time. [`ProgressCallback`] is told
//! about each step; the CLI renders it with `indicatif` bars and callers
//! that show nothing pass [`NullProgress`].

/// Receives updates while a batch of documents is worked through.
pub trait ProgressCallback: Send + Sync {
    /// A batch of `documents` documents is starting.
    fn begin(&self, documents: u64);

    /// `name` is the document now being worked on.
    fn document(&self, name: &str);

    /// The current document is done.
    fn advance(&self);

    /// The batch is complete. `summary` stays on screen.
    fn finish(&self, summary: String);

    /// The batch is complete and leaves nothing on screen.
    fn clear(&self);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn begin(&self, _documents: u64) {}
    fn document(&self, _name: &str) {}
    fn advance(&self) {}
    fn finish(&self, _summary: String) {}
    fn clear(&self) {}
}
