use crate::binding::{
    AccessorBinding, BindingSynthesizer, BindingTable, Diagnostic, FieldTable, GetOutcome, SynthesisMode,
};
use crate::error::{ProfileError, ProfileResult};
use crate::persistence::{CustomOperations, PersistenceStrategy, strategy_for};
use crate::profile::Profile;
use crate::registry::RegistryInner;
use autoconfig_model::{ModelError, ModelResult, ProfileOperationMode, ProfileOwner, SaveTarget};
use autoconfig_storage::ProfileStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of a profile type within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileState {
    /// Not initialized in the registry.
    Unregistered,
    /// Bound and registered, initial load not finished.
    Initializing,
    /// Holds defaults or the last loaded content.
    Loaded,
    /// Changed through an accessor, save not yet issued.
    Mutated,
    /// Save issued.
    Persisted,
    /// Backing file deleted; the in-memory state is kept.
    Deleted,
}

#[derive(Debug, Clone)]
struct Location {
    base: PathBuf,
    extension: String,
    recorded_mode: ProfileOperationMode,
}

/// Everything needed to build an instance.
pub(crate) struct InstanceSeed<P> {
    pub profile: P,
    pub base: PathBuf,
    pub extension: Option<String>,
    pub mode: ProfileOperationMode,
    pub synthesis: SynthesisMode,
    pub strategy: Box<dyn PersistenceStrategy<P>>,
    pub store: ProfileStore,
    pub registry: Weak<RegistryInner>,
}

/// The live instance of a profile type: its value, synthesized accessors,
/// bound persistence strategy and backing location.
pub struct ProfileInstance<P: Profile> {
    id: Uuid,
    name: String,
    profile: RwLock<P>,
    bindings: BindingTable<P>,
    fields: FieldTable<P>,
    diagnostics: Vec<Diagnostic>,
    strategy: Box<dyn PersistenceStrategy<P>>,
    synthesis: SynthesisMode,
    location: RwLock<Location>,
    state: RwLock<ProfileState>,
    store: ProfileStore,
    /// Set pipelines currently holding the profile write lock.
    setting: AtomicUsize,
    /// A save was requested while a set pipeline held the lock.
    deferred_save: AtomicBool,
    self_ref: Weak<Self>,
    registry: Weak<RegistryInner>,
}

impl<P: Profile> ProfileInstance<P> {
    pub(crate) fn create(seed: InstanceSeed<P>) -> ProfileResult<Arc<Self>> {
        let synthesized = BindingSynthesizer::new(seed.synthesis).synthesize(&P::schema())?;
        let fields = FieldTable::from_registrations(&synthesized.registrations);
        let extension = seed.extension.unwrap_or_else(|| seed.strategy.extension());
        let location = Location {
            base: seed.base,
            extension,
            recorded_mode: seed.mode,
        };

        Ok(Arc::new_cyclic(|self_ref| Self {
            id: Uuid::new_v4(),
            name: P::profile_name(),
            profile: RwLock::new(seed.profile),
            bindings: synthesized.bindings,
            fields,
            diagnostics: synthesized.diagnostics,
            strategy: seed.strategy,
            synthesis: seed.synthesis,
            location: RwLock::new(location),
            state: RwLock::new(ProfileState::Initializing),
            store: seed.store,
            setting: AtomicUsize::new(0),
            deferred_save: AtomicBool::new(false),
            self_ref: self_ref.clone(),
            registry: seed.registry,
        }))
    }

    /// Builds the instance that takes over from this one after a
    /// whole-object load. Location, bound mode and custom delegates carry
    /// over; bindings, tables and id are new.
    pub(crate) fn successor(&self, profile: P) -> ProfileResult<Arc<Self>> {
        let location = self.location();
        let strategy = strategy_for::<P>(self.strategy.mode());
        if let (Some(current), Some(next)) = (self.strategy.custom_operations(), strategy.custom_operations()) {
            let operations = current.read().unwrap_or_else(PoisonError::into_inner).clone();
            *next.write().unwrap_or_else(PoisonError::into_inner) = operations;
        }
        let next = Self::create(InstanceSeed {
            profile,
            base: location.base,
            extension: Some(location.extension),
            mode: location.recorded_mode,
            synthesis: self.synthesis,
            strategy,
            store: self.store.clone(),
            registry: self.registry.clone(),
        })?;
        next.set_state(ProfileState::Loaded);
        Ok(next)
    }

    /// Unique per instance; a rebind produces a new id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProfileState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: ProfileState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Full backing path: base path plus extension.
    pub fn path(&self) -> PathBuf {
        let location = self.location();
        let mut path = OsString::from(location.base);
        path.push(&location.extension);
        PathBuf::from(path)
    }

    /// Backing path without the extension.
    pub fn base_path(&self) -> PathBuf {
        self.location().base
    }

    pub fn set_base_path(&self, base: impl AsRef<Path>) {
        self.location_mut().base = base.as_ref().to_path_buf();
    }

    pub fn extension(&self) -> String {
        self.location().extension
    }

    pub fn set_extension(&self, extension: &str) {
        self.location_mut().extension = extension.to_string();
    }

    /// Mode of the strategy bound at initialization.
    pub fn bound_mode(&self) -> ProfileOperationMode {
        self.strategy.mode()
    }

    /// Last mode recorded through [`set_operation_mode`](Self::set_operation_mode).
    pub fn operation_mode(&self) -> ProfileOperationMode {
        self.location().recorded_mode
    }

    /// Records a mode. The bound strategy does not change.
    pub fn set_operation_mode(&self, mode: ProfileOperationMode) {
        if mode != self.strategy.mode() {
            debug!(
                profile = %self.name,
                bound = %self.strategy.mode(),
                recorded = %mode,
                "Operation mode recorded; bound strategy unchanged"
            );
        }
        self.location_mut().recorded_mode = mode;
    }

    /// Replaces the custom load/save delegates. Returns `false`, and changes
    /// nothing, when the bound strategy is not custom.
    pub fn set_custom_operations(&self, operations: CustomOperations<P>) -> bool {
        let Some(slot) = self.strategy.custom_operations() else {
            warn!(
                profile = %self.name,
                mode = %self.strategy.mode(),
                "Custom operations ignored for non-custom profile"
            );
            return false;
        };
        if let Some(extension) = &operations.extension {
            self.set_extension(extension);
        }
        *slot.write().unwrap_or_else(PoisonError::into_inner) = operations;
        true
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn bindings(&self) -> &BindingTable<P> {
        &self.bindings
    }

    pub fn field_table(&self) -> &FieldTable<P> {
        &self.fields
    }

    /// Back-reference handle for containers held by this instance.
    pub fn owner(&self) -> ProfileOwner {
        let target: Weak<dyn SaveTarget> = self.self_ref.clone();
        ProfileOwner::from_weak(target)
    }

    /// Runs `f` against the profile value, bypassing accessors.
    pub fn read<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&*self.read_lock())
    }

    /// Reads an accessor through its get pipeline.
    pub fn get<T>(&self, accessor: &str) -> ProfileResult<T>
    where
        T: DeserializeOwned + 'static,
    {
        let binding = self.binding(accessor)?;
        let owner = self.owner();
        let profile = self.read_lock();
        match binding.run_get(&profile, &self.fields, &owner)? {
            GetOutcome::Field => match binding.access().read_any(&profile).downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => {
                    let value = binding.access().read_value(&profile)?;
                    convert(accessor, binding.declared_type().name(), value)
                }
            },
            GetOutcome::Computed(value) => {
                let actual = json_kind(&value);
                convert(accessor, actual, value)
            }
        }
    }

    /// Reads an accessor as JSON.
    pub fn get_value(&self, accessor: &str) -> ProfileResult<Value> {
        let binding = self.binding(accessor)?;
        let owner = self.owner();
        let profile = self.read_lock();
        match binding.run_get(&profile, &self.fields, &owner)? {
            GetOutcome::Field => Ok(binding.access().read_value(&profile)?),
            GetOutcome::Computed(value) => Ok(value),
        }
    }

    /// Writes an accessor through its set pipeline, which ends in a save.
    pub fn set<T: Serialize>(&self, accessor: &str, value: T) -> ProfileResult<()> {
        self.set_value(accessor, serde_json::to_value(value)?)
    }

    /// JSON form of [`set`](Self::set).
    ///
    /// Saves requested by hooks while the pipeline runs, for example through
    /// a container the profile owns, are folded into the one save issued
    /// after the profile lock is released.
    pub fn set_value(&self, accessor: &str, value: Value) -> ProfileResult<()> {
        let binding = self.binding(accessor)?;
        let result = {
            let mut profile = self.write_lock();
            let _setting = SettingGuard::enter(&self.setting);
            binding.run_set(&mut profile, &self.fields, value)
        };
        let deferred = self.deferred_save.swap(false, Ordering::SeqCst);
        let save = match result {
            Ok(save) => save,
            Err(e) => {
                if deferred {
                    if let Err(save_error) = self.save() {
                        warn!(profile = %self.name, error = %save_error, "Deferred profile save failed");
                    }
                }
                return Err(e);
            }
        };
        self.set_state(ProfileState::Mutated);
        if save || deferred {
            self.save_current()?;
        }
        Ok(())
    }

    /// Serializes with the bound strategy and queues the write.
    ///
    /// Called from inside a running set pipeline, the save is deferred
    /// until the pipeline has released the profile lock.
    pub fn save(&self) -> ProfileResult<()> {
        if self.setting.load(Ordering::SeqCst) > 0 {
            self.deferred_save.store(true, Ordering::SeqCst);
            debug!(profile = %self.name, "Profile save deferred until the set pipeline ends");
            return Ok(());
        }
        let text = self.export()?;
        let path = self.path();
        self.store.write_detached(&path, text)?;
        self.set_state(ProfileState::Persisted);
        debug!(profile = %self.name, path = %path.display(), "Profile save queued");
        Ok(())
    }

    /// Serialized text, without touching the file system.
    pub fn export(&self) -> ProfileResult<String> {
        let profile = self.read_lock();
        self.strategy.save(&profile, &self.fields)
    }

    /// Applies `text` with the bound strategy. A returned value is the
    /// replacement a whole-object strategy produced; the caller rebinds it.
    pub(crate) fn load_text(&self, text: &str) -> ProfileResult<Option<P>> {
        let replacement = {
            let mut profile = self.write_lock();
            self.strategy.load(&mut profile, text, &self.fields)?
        };
        if replacement.is_none() {
            self.set_state(ProfileState::Loaded);
        }
        debug!(
            profile = %self.name,
            bytes = text.len(),
            replaced = replacement.is_some(),
            "Profile text applied"
        );
        Ok(replacement)
    }

    /// Loads the backing file. An absent file keeps the current values.
    pub(crate) fn load_from_store(&self) -> ProfileResult<Option<P>> {
        let path = self.path();
        self.store.flush();
        match self.store.read(&path)? {
            Some(text) => self.load_text(&text),
            None => {
                debug!(profile = %self.name, path = %path.display(), "No profile file, keeping current values");
                self.set_state(ProfileState::Loaded);
                Ok(None)
            }
        }
    }

    /// Deletes the backing file. The in-memory value is kept and a later
    /// save recreates the file.
    pub fn delete(&self) -> ProfileResult<bool> {
        let path = self.path();
        let removed = self.store.delete(&path)?;
        self.set_state(ProfileState::Deleted);
        debug!(profile = %self.name, path = %path.display(), removed, "Profile file deleted");
        Ok(removed)
    }

    fn binding(&self, accessor: &str) -> ProfileResult<&AccessorBinding<P>> {
        self.bindings
            .get(accessor)
            .ok_or_else(|| ProfileError::UnknownAccessor {
                profile: self.name.clone(),
                accessor: accessor.to_string(),
            })
    }

    /// Saves the registry's current instance of `P`, or this one when the
    /// registry is gone or no longer holds the type.
    fn save_current(&self) -> ProfileResult<()> {
        match self.registry.upgrade().and_then(|inner| inner.instance::<P>()) {
            Some(current) => current.save(),
            None => self.save(),
        }
    }

    fn location(&self) -> Location {
        self.location.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn location_mut(&self) -> RwLockWriteGuard<'_, Location> {
        self.location.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, P> {
        self.profile.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, P> {
        self.profile.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a set pipeline as running for as long as it lives.
struct SettingGuard<'a>(&'a AtomicUsize);

impl<'a> SettingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for SettingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<P: Profile> SaveTarget for ProfileInstance<P> {
    fn profile_name(&self) -> &str {
        &self.name
    }

    fn save_profile(&self) -> ModelResult<()> {
        self.save().map_err(|e| ModelError::Save(Box::new(e)))
    }
}

impl<P: Profile> fmt::Debug for ProfileInstance<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field("path", &self.path())
            .field("mode", &self.strategy.mode())
            .field("accessors", &self.bindings.names().collect::<Vec<_>>())
            .finish()
    }
}

fn convert<T: DeserializeOwned>(accessor: &str, actual: &'static str, value: Value) -> ProfileResult<T> {
    serde_json::from_value(value).map_err(|_| ProfileError::TypeMismatch {
        accessor: accessor.to_string(),
        expected: std::any::type_name::<T>(),
        actual,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
