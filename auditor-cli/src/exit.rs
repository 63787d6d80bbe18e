//! Exit-code mapping.
//!
//! 0 success; 1 user error; 2 contract violation; 3 analysis failure;
//! 4 cancellation.

use auditor_core::errors::StorageError;
use auditor_analysis::pipeline::PipelineError;

pub const SUCCESS: i32 = 0;
pub const USER_ERROR: i32 = 1;
pub const CONTRACT_VIOLATION: i32 = 2;
pub const ANALYSIS_FAILURE: i32 = 3;
pub const CANCELLED: i32 = 4;

pub fn code_for(error: &PipelineError) -> i32 {
    match error {
        PipelineError::Scan(_) => USER_ERROR,
        PipelineError::Storage(StorageError::Contract(_)) => CONTRACT_VIOLATION,
        PipelineError::Storage(_) => ANALYSIS_FAILURE,
        PipelineError::Taint(_) => ANALYSIS_FAILURE,
        PipelineError::Io { .. } => ANALYSIS_FAILURE,
    }
}
