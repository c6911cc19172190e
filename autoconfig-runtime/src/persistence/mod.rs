//! Persistence strategies, one per [`ProfileOperationMode`].
//!
//! A strategy turns a profile into text and back; it never touches the file
//! system. The instance that owns it handles paths and I/O.

mod custom;
mod dictionary;
mod json;
mod xml;

pub use custom::{CustomLoad, CustomOperations, CustomSave, CustomStrategy};
pub use dictionary::DictionaryStrategy;
pub use json::JsonStrategy;
pub use xml::XmlStrategy;

use crate::binding::FieldTable;
use crate::error::ProfileResult;
use crate::profile::Profile;
use autoconfig_model::ProfileOperationMode;
use std::sync::RwLock;

/// Load/save behavior bound to a profile instance at initialization.
pub trait PersistenceStrategy<P>: Send + Sync {
    /// The mode this strategy implements.
    fn mode(&self) -> ProfileOperationMode;

    /// Extension appended to the backing path, including the dot.
    fn extension(&self) -> String;

    /// Applies `text` to `profile`.
    ///
    /// Whole-object strategies return the deserialized replacement and leave
    /// `profile` untouched; field-wise strategies mutate `profile` and
    /// return `None`.
    fn load(&self, profile: &mut P, text: &str, table: &FieldTable<P>) -> ProfileResult<Option<P>>;

    /// Serializes `profile`.
    fn save(&self, profile: &P, table: &FieldTable<P>) -> ProfileResult<String>;

    /// Replaceable delegates, for the custom strategy only.
    fn custom_operations(&self) -> Option<&RwLock<CustomOperations<P>>> {
        None
    }
}

/// Builds the strategy for `mode`. `Custom` starts from
/// [`Profile::custom_operations`].
pub fn strategy_for<P: Profile>(mode: ProfileOperationMode) -> Box<dyn PersistenceStrategy<P>> {
    match mode {
        ProfileOperationMode::Dictionary => Box::new(DictionaryStrategy),
        ProfileOperationMode::Json => Box::new(JsonStrategy),
        ProfileOperationMode::Xml => Box::new(XmlStrategy),
        ProfileOperationMode::Custom => Box::new(CustomStrategy::new(P::custom_operations())),
    }
}
