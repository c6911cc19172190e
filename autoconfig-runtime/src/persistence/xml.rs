use super::PersistenceStrategy;
use crate::binding::FieldTable;
use crate::error::{ProfileError, ProfileResult};
use autoconfig_model::{ProfileOperationMode, XML_EXTENSION};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// The whole instance as one XML document, root element named after the type.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlStrategy;

impl<P> PersistenceStrategy<P> for XmlStrategy
where
    P: Serialize + DeserializeOwned,
{
    fn mode(&self) -> ProfileOperationMode {
        ProfileOperationMode::Xml
    }

    fn extension(&self) -> String {
        XML_EXTENSION.to_string()
    }

    /// Blank text yields no replacement.
    fn load(&self, _profile: &mut P, text: &str, _table: &FieldTable<P>) -> ProfileResult<Option<P>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        quick_xml::de::from_str(text)
            .map(Some)
            .map_err(|e| ProfileError::Xml(e.to_string()))
    }

    fn save(&self, profile: &P, _table: &FieldTable<P>) -> ProfileResult<String> {
        quick_xml::se::to_string(profile).map_err(|e| ProfileError::Xml(e.to_string()))
    }
}
