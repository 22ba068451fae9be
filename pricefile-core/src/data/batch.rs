//! Parallel ingestion of many files.
//!
//! Files are independent, so each one is ingested on the rayon pool. One
//! failing file does not affect the others.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::error::IngestError;
use super::hint::LayoutHint;
use super::ingest::ingest;
use crate::domain::OhlcvTable;

/// Outcome of ingesting one file of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: Result<OhlcvTable, IngestError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ingest every path with the same hint. Results come back in input order.
pub fn ingest_all<P>(paths: &[P], hint: Option<&LayoutHint>) -> Vec<BatchItem>
where
    P: AsRef<Path> + Sync,
{
    let items: Vec<BatchItem> = paths
        .par_iter()
        .map(|p| {
            let path = p.as_ref();
            BatchItem {
                path: path.to_path_buf(),
                result: ingest(path, hint),
            }
        })
        .collect();

    let failed = items.iter().filter(|i| !i.is_ok()).count();
    tracing::debug!(files = items.len(), failed, "batch ingest finished");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn keeps_input_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        fs::write(
            &good,
            "DateTime,Open,High,Low,Close,Volume\n2024-01-02 09:30:00,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        let missing = dir.path().join("missing.csv");

        let paths = vec![good.clone(), missing.clone(), empty.clone(), good.clone()];
        let items = ingest_all(&paths, None);

        let order: Vec<_> = items.iter().map(|i| i.path.clone()).collect();
        assert_eq!(order, paths);
        assert_eq!(items[0].result.as_ref().map(|t| t.len()).ok(), Some(1));
        assert!(matches!(items[1].result, Err(IngestError::NotFound { .. })));
        assert!(matches!(items[2].result, Err(IngestError::Empty)));
        assert!(items[3].is_ok());
    }

    #[test]
    fn empty_batch() {
        let paths: Vec<PathBuf> = Vec::new();
        assert!(ingest_all(&paths, None).is_empty());
    }
}
