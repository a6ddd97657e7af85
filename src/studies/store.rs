//! Versioned in-memory store of saving studies.
//!
//! Writes are compare-and-set on `SavingStudy::version`: a writer that read an
//! older version than the stored one gets `StaleStudy` and must reload. A
//! whole study, suggestions included, is swapped in one write so readers never
//! observe a half-regenerated suggestion set.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::models::SavingStudy;

#[derive(Debug, Clone, Default)]
pub struct StudyStore {
    studies: Arc<RwLock<HashMap<Uuid, SavingStudy>>>,
}

impl StudyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new study at version 1.
    pub async fn insert(&self, mut study: SavingStudy) -> SavingStudy {
        study.version = 1;
        self.studies.write().await.insert(study.id, study.clone());
        study
    }

    pub async fn get(&self, id: Uuid) -> EngineResult<SavingStudy> {
        self.studies
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::StudyNotFound(id))
    }

    /// Replace a study if nobody wrote it since it was read.
    pub async fn compare_and_swap(&self, mut study: SavingStudy) -> EngineResult<SavingStudy> {
        let mut studies = self.studies.write().await;
        let stored = studies
            .get(&study.id)
            .ok_or(EngineError::StudyNotFound(study.id))?;

        if stored.version != study.version {
            return Err(EngineError::StaleStudy {
                study_id: study.id,
                expected: study.version,
                found: stored.version,
            });
        }

        study.version += 1;
        studies.insert(study.id, study.clone());
        Ok(study)
    }

    pub async fn len(&self) -> usize {
        self.studies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
