use super::PersistenceStrategy;
use crate::binding::FieldTable;
use crate::error::ProfileResult;
use autoconfig_model::{DICTIONARY_EXTENSION, ProfileOperationMode};
use autoconfig_storage::DictionaryDocument;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// One `[+-Accessor-+]` block per registered field, content as compact JSON.
/// Loads mutate the existing instance through the registered setters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryStrategy;

impl<P> PersistenceStrategy<P> for DictionaryStrategy {
    fn mode(&self) -> ProfileOperationMode {
        ProfileOperationMode::Dictionary
    }

    fn extension(&self) -> String {
        DICTIONARY_EXTENSION.to_string()
    }

    fn load(&self, profile: &mut P, text: &str, table: &FieldTable<P>) -> ProfileResult<Option<P>> {
        let document = DictionaryDocument::parse(text)?;
        let mut applied = HashSet::new();
        for entry in &document {
            // First entry wins for duplicated headers.
            if !applied.insert(entry.header.as_str()) {
                continue;
            }
            let (Some(_), Some(setter)) = (table.field_type(&entry.header), table.setter(&entry.header)) else {
                debug!(header = %entry.header, "Skipping unregistered dictionary entry");
                continue;
            };
            let value: Value = serde_json::from_str(&entry.content)?;
            setter(profile, value)?;
        }
        Ok(None)
    }

    fn save(&self, profile: &P, table: &FieldTable<P>) -> ProfileResult<String> {
        let mut document = DictionaryDocument::new();
        for (accessor, getter) in table.getters() {
            let value = getter(profile)?;
            document.push(accessor, serde_json::to_string(&value)?)?;
        }
        Ok(document.render())
    }
}
