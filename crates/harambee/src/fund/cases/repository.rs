use crate::fund::repository::{Page, PageRequest, RepositoryError};

use super::domain::{CaseFilter, CaseId, CaseRecord};

/// Storage abstraction for case records. Verification contacts and document
/// metadata are embedded in the record, so deleting a case removes them with
/// it.
pub trait CaseRepository: Send + Sync {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, RepositoryError>;
    fn update(&self, record: CaseRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &CaseId) -> Result<Option<CaseRecord>, RepositoryError>;
    fn delete(&self, id: &CaseId) -> Result<(), RepositoryError>;
    /// Every case identifier currently in storage; input to sequence
    /// computation.
    fn case_ids(&self) -> Result<Vec<String>, RepositoryError>;
    /// Highest case number issued so far.
    fn latest_case_number(&self) -> Result<Option<u32>, RepositoryError>;
    fn list(
        &self,
        filter: &CaseFilter,
        page: PageRequest,
    ) -> Result<Page<CaseRecord>, RepositoryError>;
}

/// Blob-storage collaborator used for case documents.
pub trait DocumentStore: Send + Sync {
    fn put(&self, bytes: &[u8], name: &str) -> Result<StoredObject, StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Location of an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Blob store failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document {0} not found in store")]
    Missing(String),
}
