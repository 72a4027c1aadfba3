use std::error::Error as StdError;

use thiserror::Error;

use crate::domain::product::ProductId;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by a [`crate::store::ProductStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[source] BoxError),
    #[error("decode error: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn backend(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("no products found with id: {id}")]
    NotFound { id: ProductId },
    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl CatalogError {
    pub fn internal(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal { context: context.into(), source: source.into() }
    }

    /// Text that is safe to show to API clients. Internal causes stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NotFound { .. } => self.to_string(),
            Self::Internal { .. } => "an internal error occurred".to_string(),
        }
    }
}
