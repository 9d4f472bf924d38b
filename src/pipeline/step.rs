//! The step contract.

use async_trait::async_trait;

use crate::error::StepError;
use crate::pipeline::record::{Field, Record};

/// One stage of a pipeline.
///
/// A step reads the accumulated record and returns a sparse patch holding
/// only the fields it writes. It never mutates the record it is given and
/// never echoes fields it did not write; merging is the runner's job.
///
/// `reads` and `writes` are checked when the pipeline is built: every read
/// must be a driver input or written by an earlier step, and every field has
/// at most one writer. A step must still tolerate any of its reads being
/// absent at run time.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique name within a pipeline (e.g. "fetch_weather").
    fn name(&self) -> &str;

    /// Fields this step reads.
    fn reads(&self) -> &[Field];

    /// Fields this step may write. The patch returned by [`Step::run`] must
    /// not contain anything else.
    fn writes(&self) -> &[Field];

    /// Execute the step against the current record.
    async fn run(&self, record: &Record) -> Result<Record, StepError>;
}
