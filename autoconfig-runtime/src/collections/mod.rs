//! Containers that persist their owning profile after every mutation.
//!
//! Clones share storage, so a container read out of a profile and the one
//! inside it are the same container. Each mutating call applies the change,
//! releases the container lock, then fires exactly one save through its
//! [`SaveBinding`].

mod list;
mod map;

pub use list::ProfileList;
pub use map::ProfileMap;

use crate::error::ProfileResult;
use crate::profile::Profile;
use autoconfig_model::ProfileOwner;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Where a container's saves go.
pub trait SaveBinding: Clone + Send + Sync {
    /// Persists the owning profile.
    fn fire(&self) -> ProfileResult<()>;
}

/// Saves through the profile type's static entry point,
/// [`Profile::save_profile`]. Always fires.
pub struct TypeBound<P>(PhantomData<fn() -> P>);

impl<P> Default for TypeBound<P> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<P> Clone for TypeBound<P> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<P> fmt::Debug for TypeBound<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeBound<{}>", std::any::type_name::<P>())
    }
}

impl<P: Profile> SaveBinding for TypeBound<P> {
    fn fire(&self) -> ProfileResult<()> {
        P::save_profile()
    }
}

/// Saves through a [`ProfileOwner`] installed after construction. Skipped
/// while no live owner is set.
///
/// The owner slot is shared between clones, so binding one handle binds the
/// container.
#[derive(Clone, Default)]
pub struct InstanceBound {
    owner: Arc<Mutex<ProfileOwner>>,
}

impl InstanceBound {
    pub fn owner(&self) -> ProfileOwner {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn bind(&self, owner: ProfileOwner) {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = owner;
    }
}

impl SaveBinding for InstanceBound {
    fn fire(&self) -> ProfileResult<()> {
        let owner = self.owner();
        if !owner.save()? {
            debug!("Container has no live owner, save skipped");
        }
        Ok(())
    }
}

impl fmt::Debug for InstanceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InstanceBound").field(&self.owner()).finish()
    }
}

/// Weakly-typed view of a container, for code that only knows it holds
/// JSON-representable elements.
pub trait DynamicContainer {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an element equal to `value` (compared as JSON) is present.
    fn contains_value(&self, value: &Value) -> bool;

    /// Converts and appends `value`. Saves like any other mutation.
    fn push_value(&self, value: Value) -> ProfileResult<()>;
}
