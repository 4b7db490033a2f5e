//! Bulk product import pipeline
//!
//! File read → encoding detection → batched decode → batched upsert.
//! Memory stays proportional to one batch, the store commits atomically
//! per batch, progress is reported after every batch, and cancellation
//! is checked between batches only — a cancelled run leaves every
//! committed batch applied and none partial.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::csv::{self, Decoder, ParseError, RowError};
use crate::repository::ProductStore;
use shared::PersistenceError;

/// Import progress, emitted once per processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    /// 1-based batch number
    pub batch: usize,
    /// Data rows consumed so far (including skipped ones)
    pub rows_processed: usize,
    pub rows_created: usize,
    pub rows_updated: usize,
    pub rows_skipped: usize,
}

/// Final outcome of one import run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rows_created: usize,
    pub rows_updated: usize,
    pub rows_skipped: usize,
    /// Per-row problems, skips and defaulted prices alike
    pub row_errors: Vec<RowError>,
    pub batches_committed: usize,
    /// True when the run stopped at a cancellation checkpoint
    pub cancelled: bool,
}

/// Outcome of a batched delete-all run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    pub rows_deleted: usize,
    pub batches_committed: usize,
    pub cancelled: bool,
}

/// Import failure.
///
/// A batch failure carries the partial report and the failing batch
/// number so a retry can resume after the committed rows instead of
/// restarting from scratch.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("reading import file failed: {0}")]
    Io(#[from] std::io::Error),

    /// Store failure outside the batched upsert path (re-running the
    /// operation is the retry)
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("batch {batch} failed after {} row(s) committed: {source}", report.rows_created + report.rows_updated)]
    Batch {
        /// 1-based number of the batch that failed
        batch: usize,
        /// State as of the last committed batch
        report: ImportReport,
        source: PersistenceError,
    },
}

/// Batched, cancellable product importer over any [`ProductStore`].
pub struct Importer<S> {
    store: S,
    batch_size: usize,
}

impl<S: ProductStore> Importer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            batch_size: csv::DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Import a raw CSV payload.
    #[instrument(skip_all, fields(bytes = bytes.len(), batch_size = self.batch_size))]
    pub async fn import_bytes(
        &self,
        bytes: &[u8],
        mut progress: impl FnMut(ImportProgress),
        cancel: &CancellationToken,
    ) -> Result<ImportReport, ImportError> {
        let text = csv::detect_encoding(bytes)?;
        let mut decoder = Decoder::new(&text)?;

        let mut report = ImportReport::default();
        let mut rows_processed = 0usize;
        let mut batch_no = 0usize;

        loop {
            // Cancellation checkpoint: between batches only
            if cancel.is_cancelled() {
                warn!(batches = report.batches_committed, "import cancelled");
                report.cancelled = true;
                break;
            }

            let Some(batch) = decoder.next_batch(self.batch_size) else {
                break;
            };
            batch_no += 1;
            rows_processed += batch.records.len()
                + batch.errors.iter().filter(|e| e.is_skip()).count();
            report.rows_skipped += batch.errors.iter().filter(|e| e.is_skip()).count();
            report.row_errors.extend(batch.errors);

            if !batch.records.is_empty() {
                match self.store.upsert_batch(batch.records).await {
                    Ok(outcome) => {
                        report.rows_created += outcome.created;
                        report.rows_updated += outcome.updated;
                    }
                    Err(source) => {
                        return Err(ImportError::Batch {
                            batch: batch_no,
                            report,
                            source,
                        });
                    }
                }
            }
            report.batches_committed = batch_no;

            progress(ImportProgress {
                batch: batch_no,
                rows_processed,
                rows_created: report.rows_created,
                rows_updated: report.rows_updated,
                rows_skipped: report.rows_skipped,
            });
        }

        info!(
            created = report.rows_created,
            updated = report.rows_updated,
            skipped = report.rows_skipped,
            cancelled = report.cancelled,
            "import finished"
        );
        Ok(report)
    }

    /// Import a CSV file from disk.
    pub async fn import_file(
        &self,
        path: impl AsRef<Path>,
        progress: impl FnMut(ImportProgress),
        cancel: &CancellationToken,
    ) -> Result<ImportReport, ImportError> {
        let bytes = tokio::fs::read(path).await?;
        self.import_bytes(&bytes, progress, cancel).await
    }

    /// Delete every product, in batches, cancellable between batches.
    #[instrument(skip_all, fields(batch_size = self.batch_size))]
    pub async fn delete_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<DeleteReport, ImportError> {
        let codes: Vec<String> = self
            .store
            .fetch_all()
            .await?
            .into_iter()
            .map(|p| p.code)
            .collect();

        let mut report = DeleteReport::default();
        for (i, chunk) in codes.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                warn!(batches = report.batches_committed, "delete-all cancelled");
                report.cancelled = true;
                break;
            }
            report.rows_deleted += self.store.delete_batch(chunk.to_vec()).await?;
            report.batches_committed = i + 1;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::UpsertOutcome;
    use async_trait::async_trait;
    use shared::models::{Product, ProductRecord};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store with upsert-by-code semantics and an optional
    /// failure injected at a given batch number.
    #[derive(Default)]
    struct MemoryStore {
        products: Mutex<HashMap<String, Product>>,
        batches_seen: AtomicUsize,
        fail_at_batch: Option<usize>,
    }

    impl MemoryStore {
        fn failing_at(batch: usize) -> Self {
            Self {
                fail_at_batch: Some(batch),
                ..Self::default()
            }
        }

        fn len(&self) -> usize {
            self.products.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProductStore for MemoryStore {
        async fn fetch_by_code(&self, code: &str) -> Result<Option<Product>, PersistenceError> {
            Ok(self.products.lock().unwrap().get(code).cloned())
        }

        async fn fetch_all(&self) -> Result<Vec<Product>, PersistenceError> {
            let mut all: Vec<Product> =
                self.products.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.code.cmp(&b.code));
            Ok(all)
        }

        async fn upsert_batch(
            &self,
            records: Vec<ProductRecord>,
        ) -> Result<UpsertOutcome, PersistenceError> {
            let batch = self.batches_seen.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_at_batch == Some(batch) {
                // Atomic per batch: fail before touching anything
                return Err(PersistenceError::Store("disk full".to_string()));
            }
            let mut products = self.products.lock().unwrap();
            let mut outcome = UpsertOutcome::default();
            for record in records {
                match products.get_mut(&record.code) {
                    Some(existing) => {
                        record.apply_to(existing);
                        outcome.updated += 1;
                    }
                    None => {
                        let id = uuid::Uuid::new_v4().to_string();
                        products.insert(record.code.clone(), record.into_product(id));
                        outcome.created += 1;
                    }
                }
            }
            Ok(outcome)
        }

        async fn delete_batch(&self, codes: Vec<String>) -> Result<usize, PersistenceError> {
            let mut products = self.products.lock().unwrap();
            let before = products.len();
            for code in codes {
                products.remove(&code);
            }
            Ok(before - products.len())
        }

        async fn count(&self) -> Result<usize, PersistenceError> {
            Ok(self.len())
        }
    }

    fn csv_of(n: usize) -> String {
        let mut text = String::from("code,name,listPrice,partnerPrice\n");
        for i in 0..n {
            text.push_str(&format!("C{i},Item {i},{}.00,{}.00\n", 100 + i, 50 + i));
        }
        text
    }

    #[tokio::test]
    async fn test_import_creates_then_updates() {
        let importer = Importer::new(MemoryStore::default()).with_batch_size(4);
        let cancel = CancellationToken::new();

        let report = importer
            .import_bytes(csv_of(10).as_bytes(), |_| {}, &cancel)
            .await
            .unwrap();
        assert_eq!(report.rows_created, 10);
        assert_eq!(report.rows_updated, 0);
        assert_eq!(report.batches_committed, 3);
        assert_eq!(importer.store().count().await.unwrap(), 10);

        // Same payload again: pure update, ids preserved
        let id_before = importer
            .store()
            .fetch_by_code("C0")
            .await
            .unwrap()
            .unwrap()
            .id;
        let report = importer
            .import_bytes(csv_of(10).as_bytes(), |_| {}, &cancel)
            .await
            .unwrap();
        assert_eq!(report.rows_created, 0);
        assert_eq!(report.rows_updated, 10);
        let id_after = importer
            .store()
            .fetch_by_code("C0")
            .await
            .unwrap()
            .unwrap()
            .id;
        assert_eq!(id_before, id_after);
    }

    #[tokio::test]
    async fn test_progress_reported_per_batch() {
        let importer = Importer::new(MemoryStore::default()).with_batch_size(3);
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();

        importer
            .import_bytes(csv_of(7).as_bytes(), |p| seen.push(p), &cancel)
            .await
            .unwrap();

        assert_eq!(seen.len(), 3); // 3 + 3 + 1
        assert_eq!(seen[0].batch, 1);
        assert_eq!(seen[0].rows_processed, 3);
        assert_eq!(seen[2].rows_created, 7);
    }

    #[tokio::test]
    async fn test_batch_failure_reports_resume_point() {
        let importer = Importer::new(MemoryStore::failing_at(2)).with_batch_size(4);
        let cancel = CancellationToken::new();

        let err = importer
            .import_bytes(csv_of(10).as_bytes(), |_| {}, &cancel)
            .await
            .unwrap_err();

        match err {
            ImportError::Batch {
                batch,
                report,
                source,
            } => {
                assert_eq!(batch, 2);
                assert_eq!(report.batches_committed, 1);
                assert_eq!(report.rows_created, 4);
                assert_eq!(source, PersistenceError::Store("disk full".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // First batch fully applied, failing batch not at all
        assert_eq!(importer.store().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cancellation_between_batches() {
        let importer = Importer::new(MemoryStore::default()).with_batch_size(2);
        let cancel = CancellationToken::new();
        let cancel_handle = cancel.clone();

        // Cancel from the progress callback after the first batch
        let report = importer
            .import_bytes(
                csv_of(10).as_bytes(),
                move |p| {
                    if p.batch == 1 {
                        cancel_handle.cancel();
                    }
                },
                &cancel,
            )
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.batches_committed, 1);
        // Committed batch stays applied, nothing partial
        assert_eq!(importer.store().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_skipped_rows_counted_not_dropped_silently() {
        let text = "code,name,listPrice\nA1,Widget,10\n,NoCode,5\nB2,Gadget,bad\n";
        let importer = Importer::new(MemoryStore::default());
        let cancel = CancellationToken::new();

        let report = importer
            .import_bytes(text.as_bytes(), |_| {}, &cancel)
            .await
            .unwrap();
        assert_eq!(report.rows_created, 2);
        assert_eq!(report.rows_skipped, 1);
        // Two recorded problems: one skip, one defaulted price
        assert_eq!(report.row_errors.len(), 2);
    }

    #[tokio::test]
    async fn test_import_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        tokio::fs::write(&path, csv_of(5)).await.unwrap();

        let importer = Importer::new(MemoryStore::default());
        let cancel = CancellationToken::new();
        let report = importer.import_file(&path, |_| {}, &cancel).await.unwrap();
        assert_eq!(report.rows_created, 5);
    }

    #[tokio::test]
    async fn test_delete_all_batched() {
        let importer = Importer::new(MemoryStore::default()).with_batch_size(3);
        let cancel = CancellationToken::new();
        importer
            .import_bytes(csv_of(8).as_bytes(), |_| {}, &cancel)
            .await
            .unwrap();

        let report = importer.delete_all(&cancel).await.unwrap();
        assert_eq!(report.rows_deleted, 8);
        assert_eq!(report.batches_committed, 3);
        assert_eq!(importer.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_all_cancelled_before_start() {
        let importer = Importer::new(MemoryStore::default()).with_batch_size(2);
        let cancel = CancellationToken::new();
        importer
            .import_bytes(csv_of(4).as_bytes(), |_| {}, &cancel)
            .await
            .unwrap();

        cancel.cancel();
        let report = importer.delete_all(&cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.rows_deleted, 0);
        assert_eq!(importer.store().count().await.unwrap(), 4);
    }
}
