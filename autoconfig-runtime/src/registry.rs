use crate::config::ProfileConfig;
use crate::error::{ProfileError, ProfileResult};
use crate::instance::{InstanceSeed, ProfileInstance, ProfileState};
use crate::persistence::strategy_for;
use crate::profile::Profile;
use autoconfig_storage::ProfileStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, info};

static GLOBAL: OnceLock<ProfileRegistry> = OnceLock::new();

type Slot = Box<dyn Any + Send + Sync>;

pub(crate) struct RegistryInner {
    config: ProfileConfig,
    store: ProfileStore,
    profiles: RwLock<HashMap<TypeId, Slot>>,
}

impl RegistryInner {
    /// Current instance of `P`, if registered.
    pub(crate) fn instance<P: Profile>(&self) -> Option<Arc<ProfileInstance<P>>> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<P>())
            .and_then(|slot| slot.downcast_ref::<Arc<ProfileInstance<P>>>())
            .cloned()
    }

    fn replace<P: Profile>(&self, instance: Arc<ProfileInstance<P>>) {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<P>(), Box::new(instance));
    }

    fn remove<P: Profile>(&self) -> bool {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<P>())
            .is_some()
    }
}

/// Holds the current instance of each initialized profile type.
///
/// Cloning is cheap; clones share the same profiles and writer. Most
/// programs use [`ProfileRegistry::global`]; tests build their own with a
/// temporary root.
#[derive(Clone)]
pub struct ProfileRegistry {
    inner: Arc<RegistryInner>,
}

impl ProfileRegistry {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                store: ProfileStore::new(),
                profiles: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide registry, configured from the environment on first
    /// use unless [`install_global`](Self::install_global) ran first.
    pub fn global() -> &'static ProfileRegistry {
        GLOBAL.get_or_init(|| ProfileRegistry::new(ProfileConfig::from_env()))
    }

    /// Installs the process-wide registry. Fails once it exists.
    pub fn install_global(config: ProfileConfig) -> ProfileResult<&'static ProfileRegistry> {
        GLOBAL
            .set(ProfileRegistry::new(config))
            .map_err(|_| ProfileError::GlobalInstalled)?;
        Ok(Self::global())
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.inner.config
    }

    /// Synthesizes and binds `P`, loads it unless its settings disable
    /// auto-load, then registers it. Returns the existing instance when `P`
    /// is already registered.
    ///
    /// The instance becomes visible to [`current`](Self::current) only after
    /// the load finished, so no caller observes it half-loaded. A failed load
    /// leaves `P` unregistered. When two threads initialize `P` at once, the
    /// first to register wins and the other gets that instance.
    pub fn initialize<P: Profile>(&self) -> ProfileResult<Arc<ProfileInstance<P>>> {
        if let Some(existing) = self.inner.instance::<P>() {
            return Ok(existing);
        }

        let settings = P::settings();
        let base = settings
            .path
            .clone()
            .unwrap_or_else(|| self.inner.config.default_root.join(P::profile_name()));
        let mut instance = ProfileInstance::create(InstanceSeed {
            profile: P::default(),
            base,
            extension: None,
            mode: settings.mode,
            synthesis: settings.synthesis,
            strategy: strategy_for::<P>(settings.mode),
            store: self.inner.store.clone(),
            registry: Arc::downgrade(&self.inner),
        })?;

        if settings.auto_load {
            if let Some(replacement) = instance.load_from_store()? {
                instance = instance.successor(replacement)?;
            }
        } else {
            instance.set_state(ProfileState::Loaded);
        }

        {
            let mut profiles = self.inner.profiles.write().unwrap_or_else(PoisonError::into_inner);
            let key = TypeId::of::<P>();
            if let Some(existing) = profiles
                .get(&key)
                .and_then(|slot| slot.downcast_ref::<Arc<ProfileInstance<P>>>())
            {
                debug!(profile = %instance.name(), "Profile registered concurrently, discarding this instance");
                return Ok(Arc::clone(existing));
            }
            profiles.insert(key, Box::new(Arc::clone(&instance)));
        }

        info!(
            profile = %instance.name(),
            id = %instance.id(),
            mode = %settings.mode,
            path = %instance.path().display(),
            accessors = instance.bindings().len(),
            "Profile registered"
        );
        Ok(instance)
    }

    pub fn is_registered<P: Profile>(&self) -> bool {
        self.inner.instance::<P>().is_some()
    }

    pub fn state<P: Profile>(&self) -> ProfileState {
        self.inner
            .instance::<P>()
            .map_or(ProfileState::Unregistered, |instance| instance.state())
    }

    pub fn current<P: Profile>(&self) -> ProfileResult<Arc<ProfileInstance<P>>> {
        self.inner
            .instance::<P>()
            .ok_or(ProfileError::NotRegistered(std::any::type_name::<P>()))
    }

    pub fn get<P: Profile, T: DeserializeOwned + 'static>(&self, accessor: &str) -> ProfileResult<T> {
        self.current::<P>()?.get(accessor)
    }

    pub fn get_value<P: Profile>(&self, accessor: &str) -> ProfileResult<Value> {
        self.current::<P>()?.get_value(accessor)
    }

    pub fn set<P: Profile, T: Serialize>(&self, accessor: &str, value: T) -> ProfileResult<()> {
        self.current::<P>()?.set(accessor, value)
    }

    pub fn set_value<P: Profile>(&self, accessor: &str, value: Value) -> ProfileResult<()> {
        self.current::<P>()?.set_value(accessor, value)
    }

    /// Loads the backing file into the current instance. Whole-object
    /// strategies replace the instance; the replacement becomes current.
    pub fn load<P: Profile>(&self) -> ProfileResult<()> {
        let instance = self.current::<P>()?;
        if let Some(replacement) = instance.load_from_store()? {
            self.rebind(&instance, replacement)?;
        }
        Ok(())
    }

    /// Applies `text` exactly like a load, without a file.
    pub fn import<P: Profile>(&self, text: &str) -> ProfileResult<()> {
        let instance = self.current::<P>()?;
        if let Some(replacement) = instance.load_text(text)? {
            self.rebind(&instance, replacement)?;
        }
        Ok(())
    }

    pub fn save<P: Profile>(&self) -> ProfileResult<()> {
        self.current::<P>()?.save()
    }

    pub fn export<P: Profile>(&self) -> ProfileResult<String> {
        self.current::<P>()?.export()
    }

    /// Deletes the backing file of `P`. Returns whether a file was removed.
    pub fn delete<P: Profile>(&self) -> ProfileResult<bool> {
        self.current::<P>()?.delete()
    }

    /// Unregisters `P`. The next [`initialize`](Self::initialize) starts over.
    pub fn reset<P: Profile>(&self) -> bool {
        let removed = self.inner.remove::<P>();
        if removed {
            info!(profile = %P::profile_name(), "Profile unregistered");
        }
        removed
    }

    pub fn reset_all(&self) {
        let mut profiles = self.inner.profiles.write().unwrap_or_else(PoisonError::into_inner);
        let count = profiles.len();
        profiles.clear();
        debug!(count, "All profiles unregistered");
    }

    /// Blocks until every queued save has been written.
    pub fn flush(&self) {
        self.inner.store.flush();
    }

    fn rebind<P: Profile>(&self, previous: &ProfileInstance<P>, replacement: P) -> ProfileResult<()> {
        let next = previous.successor(replacement)?;
        info!(
            profile = %next.name(),
            previous = %previous.id(),
            current = %next.id(),
            "Profile instance replaced"
        );
        self.inner.replace(next);
        Ok(())
    }
}

impl std::fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .inner
            .profiles
            .read()
            .map(|profiles| profiles.len())
            .unwrap_or(0);
        f.debug_struct("ProfileRegistry")
            .field("default_root", &self.inner.config.default_root)
            .field("profiles", &count)
            .finish()
    }
}
