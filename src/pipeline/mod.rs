//! Step pipeline.
//!
//! A run threads one [`Record`] through a fixed sequence of steps:
//! 1. `fetch_weather`: city → structured report + summary text
//! 2. `reason`: question + summary → answer
//! 3. `notify`: answer → email / WhatsApp, per the request flags
//!
//! Steps return sparse patches and the runner merges them. Step order is
//! checked against declared reads and writes when the pipeline is built.

pub mod record;
pub mod runner;
pub mod step;
pub mod steps;

pub use record::{Field, Record};
pub use runner::{Pipeline, PipelineBuilder};
pub use step::Step;
pub use steps::weather_agent_pipeline;
