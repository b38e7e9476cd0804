//! Output patch: overriding copies of the landscape records a run changed

use std::sync::{Mutex, PoisonError};

use indexmap::IndexMap;

use super::{LandscapeRecord, Plugin};
use crate::codec::FormId;

/// Destination for edited landscape records.
///
/// `edit` runs on the stored override, created from `source` on first use.
/// Implementations serialize concurrent calls.
pub trait OverrideStore: Sync {
    fn get_or_add_override(&self, source: &LandscapeRecord, edit: &mut dyn FnMut(&mut LandscapeRecord));
}

/// In-memory patch plugin shared by all workers of a run
#[derive(Debug, Default)]
pub struct PatchMod {
    records: Mutex<IndexMap<FormId, LandscapeRecord>>,
}

impl PatchMod {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, form_id: FormId) -> Option<LandscapeRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&form_id)
            .cloned()
    }

    /// Overrides ordered by form id. Textures are not carried over.
    pub fn into_plugin(self) -> Plugin {
        let mut records = self.records.into_inner().unwrap_or_else(PoisonError::into_inner);
        records.sort_keys();
        Plugin::new(Vec::new(), records.into_values().collect())
    }
}

impl OverrideStore for PatchMod {
    fn get_or_add_override(&self, source: &LandscapeRecord, edit: &mut dyn FnMut(&mut LandscapeRecord)) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records.entry(source.form_id).or_insert_with(|| source.clone());
        edit(record);
    }
}
