//! Model catalog: `models.txt` + `models_index.txt`, keyed by the
//! decimal string form of the model id.

use std::path::Path;

use keyindex::IndexFile;
use recfile::RecordFile;

use crate::error::{Result, StoreError};
use crate::model::{Model, MODEL_ARITY};

pub const MODELS_FILE: &str = "models.txt";
pub const MODELS_INDEX_FILE: &str = "models_index.txt";

/// Record file + sorted id index for vehicle models.
///
/// Same add/lookup pattern as the vehicle catalog; models carry no
/// status and are never renamed.
pub struct ModelCatalog {
    records: RecordFile,
    index: IndexFile,
}

impl ModelCatalog {
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self {
            records: RecordFile::open(root.join(MODELS_FILE))?,
            index: IndexFile::open(root.join(MODELS_INDEX_FILE))?,
        })
    }

    /// Adds a model. Duplicate ids are rejected before any write.
    pub fn add(&mut self, model: &Model) -> Result<()> {
        let key = model.id.to_string();
        let mut index = self.index.load()?;
        if index.contains(&key) {
            return Err(keyindex::IndexError::Duplicate(key).into());
        }
        let ordinal = self.records.append(&model.to_fields())?;
        index.insert(&key, ordinal)?;
        self.index.save(&index)?;
        Ok(())
    }

    /// Point lookup by id.
    pub fn get_by_id(&self, id: i64) -> Result<Model> {
        let key = id.to_string();
        let ordinal = self
            .index
            .load()?
            .lookup(&key)
            .ok_or_else(|| StoreError::not_found("model", key))?;
        let fields = self.records.read_at(ordinal, MODEL_ARITY)?;
        Model::from_fields(&fields)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.index.load()?.len())
    }

    #[cfg(test)]
    pub(crate) fn record_file(&self) -> &RecordFile {
        &self.records
    }
}
