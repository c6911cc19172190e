use super::PersistenceStrategy;
use crate::binding::FieldTable;
use crate::error::ProfileResult;
use autoconfig_model::{JSON_EXTENSION, ProfileOperationMode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// The whole instance as one pretty-printed JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStrategy;

impl<P> PersistenceStrategy<P> for JsonStrategy
where
    P: Serialize + DeserializeOwned,
{
    fn mode(&self) -> ProfileOperationMode {
        ProfileOperationMode::Json
    }

    fn extension(&self) -> String {
        JSON_EXTENSION.to_string()
    }

    fn load(&self, _profile: &mut P, text: &str, _table: &FieldTable<P>) -> ProfileResult<Option<P>> {
        Ok(Some(serde_json::from_str(text)?))
    }

    fn save(&self, profile: &P, _table: &FieldTable<P>) -> ProfileResult<String> {
        Ok(serde_json::to_string_pretty(profile)?)
    }
}
