use super::PersistenceStrategy;
use crate::binding::FieldTable;
use crate::error::ProfileResult;
use autoconfig_model::{DICTIONARY_EXTENSION, ProfileOperationMode};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// User load delegate: applies text, optionally returning a replacement.
pub type CustomLoad<P> = Arc<dyn Fn(&mut P, &str) -> ProfileResult<Option<P>> + Send + Sync>;

/// User save delegate: serializes the instance.
pub type CustomSave<P> = Arc<dyn Fn(&P) -> ProfileResult<String> + Send + Sync>;

/// Delegates and extension for [`ProfileOperationMode::Custom`].
///
/// An unset load delegate makes loads a no-op; an unset save delegate saves
/// an empty document. Without an extension, `.xpf` is used.
pub struct CustomOperations<P> {
    pub load: Option<CustomLoad<P>>,
    pub save: Option<CustomSave<P>>,
    pub extension: Option<String>,
}

impl<P> Default for CustomOperations<P> {
    fn default() -> Self {
        Self {
            load: None,
            save: None,
            extension: None,
        }
    }
}

impl<P> CustomOperations<P> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_load<F>(mut self, load: F) -> Self
    where
        F: Fn(&mut P, &str) -> ProfileResult<Option<P>> + Send + Sync + 'static,
    {
        self.load = Some(Arc::new(load));
        self
    }

    #[must_use]
    pub fn with_save<F>(mut self, save: F) -> Self
    where
        F: Fn(&P) -> ProfileResult<String> + Send + Sync + 'static,
    {
        self.save = Some(Arc::new(save));
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    /// Configured extension, or `.xpf`.
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DICTIONARY_EXTENSION)
    }
}

impl<P> Clone for CustomOperations<P> {
    fn clone(&self) -> Self {
        Self {
            load: self.load.clone(),
            save: self.save.clone(),
            extension: self.extension.clone(),
        }
    }
}

impl<P> fmt::Debug for CustomOperations<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOperations")
            .field("load", &self.load.is_some())
            .field("save", &self.save.is_some())
            .field("extension", &self.extension)
            .finish()
    }
}

/// Dispatches to the current [`CustomOperations`]; the delegates can be
/// swapped while the instance is live.
pub struct CustomStrategy<P> {
    operations: RwLock<CustomOperations<P>>,
}

impl<P> CustomStrategy<P> {
    pub fn new(operations: CustomOperations<P>) -> Self {
        Self {
            operations: RwLock::new(operations),
        }
    }

    fn snapshot(&self) -> CustomOperations<P> {
        self.operations.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl<P: Send + Sync> PersistenceStrategy<P> for CustomStrategy<P> {
    fn mode(&self) -> ProfileOperationMode {
        ProfileOperationMode::Custom
    }

    fn extension(&self) -> String {
        self.snapshot().extension().to_string()
    }

    fn load(&self, profile: &mut P, text: &str, _table: &FieldTable<P>) -> ProfileResult<Option<P>> {
        match self.snapshot().load {
            Some(load) => load(profile, text),
            None => Ok(None),
        }
    }

    fn save(&self, profile: &P, _table: &FieldTable<P>) -> ProfileResult<String> {
        match self.snapshot().save {
            Some(save) => save(profile),
            None => Ok(String::new()),
        }
    }

    fn custom_operations(&self) -> Option<&RwLock<CustomOperations<P>>> {
        Some(&self.operations)
    }
}
