use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::{AnalysisError, AnalysisOutcome, Clock, IngestFile};

const MIN_ROWS: u64 = 500;
const ROW_SPAN: u64 = 5000;
const MIN_COLUMNS: u32 = 5;
const COLUMN_SPAN: u32 = 10;

#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, file: &IngestFile) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Stand-in for real parsing: waits `delay`, then reports a table shape derived from
/// the file's name and size. Same input, same shape.
pub struct SimulatedAnalyzer {
    clock: Arc<dyn Clock>,
    delay: Duration,
}

impl SimulatedAnalyzer {
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self { clock, delay }
    }
}

#[async_trait::async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, file: &IngestFile) -> Result<AnalysisOutcome, AnalysisError> {
        self.clock.sleep(self.delay).await;
        if file.size_bytes == 0 {
            return Err(AnalysisError::EmptyFile {
                name: file.name.clone(),
            });
        }
        Ok(simulated_shape(&file.name, file.size_bytes))
    }
}

/// Rows in 500..=5499, columns in 5..=14.
pub fn simulated_shape(name: &str, size_bytes: u64) -> AnalysisOutcome {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(size_bytes.to_le_bytes());
    let digest = hasher.finalize();

    let mut row_bytes = [0u8; 8];
    row_bytes.copy_from_slice(&digest[..8]);
    let rows = MIN_ROWS + u64::from_le_bytes(row_bytes) % ROW_SPAN;
    let columns = MIN_COLUMNS + u32::from(digest[8]) % COLUMN_SPAN;

    AnalysisOutcome { rows, columns }
}
