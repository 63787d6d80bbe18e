//! End-to-end pipelines behind the CLI subcommands.

pub mod index_run;
pub mod layout;

pub use index_run::{run_analyze, run_index, run_taint, IndexOutcome, PipelineError};
