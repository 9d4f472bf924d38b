//! Pipeline runner. Validates step order at build time and executes steps
//! strictly in sequence, merging each patch into the accumulating record.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::record::{Field, Record};
use crate::pipeline::step::Step;

/// Owner name recorded for fields supplied by the driver.
const INPUT_OWNER: &str = "input";

/// Collects steps in execution order and validates them into a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    steps: Vec<Box<dyn Step>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Steps run in the order they are added.
    pub fn add_step(self, step: impl Step + 'static) -> Self {
        self.add_boxed(Box::new(step))
    }

    pub fn add_boxed(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate field dependencies and produce a runnable pipeline.
    ///
    /// Rejects an empty pipeline, duplicate step names, a read of a field
    /// that no earlier step (nor the driver) provides, and any field with
    /// more than one writer. Driver inputs count as already written.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if self.steps.is_empty() {
            return Err(PipelineError::Empty);
        }

        let mut names = HashSet::new();
        let mut owners: BTreeMap<Field, String> = Field::INPUTS
            .iter()
            .map(|f| (*f, INPUT_OWNER.to_string()))
            .collect();

        for step in &self.steps {
            let name = step.name().to_string();
            if !names.insert(name.clone()) {
                return Err(PipelineError::DuplicateStep(name));
            }

            for field in step.reads() {
                if !owners.contains_key(field) {
                    return Err(PipelineError::UnsatisfiedRead {
                        step: name,
                        field: field.to_string(),
                    });
                }
            }

            for field in step.writes() {
                if let Some(first) = owners.get(field) {
                    return Err(PipelineError::FieldWrittenTwice {
                        field: field.to_string(),
                        first: first.clone(),
                        second: name,
                    });
                }
                owners.insert(*field, name.clone());
            }
        }

        Ok(Pipeline { steps: self.steps })
    }
}

/// A validated, immutable sequence of steps.
///
/// Holds no per-run state, so one instance can be shared (behind an `Arc`)
/// by any number of concurrent runs.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step once, in order, starting from `initial`.
    ///
    /// After each step its patch is merged into the record: fields present
    /// in the patch overwrite, absent fields are kept. The first step error
    /// aborts the run and no later step executes.
    pub async fn run(&self, initial: Record) -> Result<Record, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);

        async move {
            let started = Instant::now();
            let mut record = initial;

            for step in &self.steps {
                let name = step.name();
                let step_started = Instant::now();

                let patch = step.run(&record).await.map_err(|source| {
                    tracing::error!(step = name, error = %source, "Step failed");
                    PipelineError::Step {
                        step: name.to_string(),
                        source,
                    }
                })?;

                let written = patch.present_fields();
                if let Some(field) = written.iter().find(|f| !step.writes().contains(*f)) {
                    return Err(PipelineError::UndeclaredWrite {
                        step: name.to_string(),
                        field: field.to_string(),
                    });
                }

                debug!(
                    step = name,
                    elapsed_ms = step_started.elapsed().as_millis() as u64,
                    fields = ?written,
                    "Step complete"
                );
                record.merge(patch);
            }

            info!(
                steps = self.steps.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline run complete"
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }
}
