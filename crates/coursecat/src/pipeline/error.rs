use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Another run holds the '{lock}' lock")]
    RunInProgress { lock: String },
}
