use sea_orm::DbErr;
use thiserror::Error;

use crate::catalog::tree::TreeError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    UniquenessViolation(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    TreeCycle(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl From<TreeError> for CatalogError {
    fn from(err: TreeError) -> Self {
        CatalogError::TreeCycle(err.to_string())
    }
}
