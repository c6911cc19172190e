use crate::error::ModelResult;
use std::fmt;
use std::sync::{Arc, Weak};

/// Something that can persist a profile instance on request.
///
/// Implemented by the runtime's profile instances; containers only see it
/// through a [`ProfileOwner`].
pub trait SaveTarget: Send + Sync {
    /// Name of the profile type, for logging.
    fn profile_name(&self) -> &str;

    /// Persists the instance.
    fn save_profile(&self) -> ModelResult<()>;
}

/// Nullable, non-owning back-reference from a container to the profile
/// instance that holds it.
///
/// The instance owns the container, never the reverse, so the handle is a
/// [`Weak`]: once the instance is dropped (for example after a whole-object
/// load replaced it) saves through the handle are skipped.
#[derive(Clone, Default)]
pub struct ProfileOwner {
    target: Option<Weak<dyn SaveTarget>>,
}

impl ProfileOwner {
    /// An owner handle pointing at `target`.
    pub fn new<T: SaveTarget + 'static>(target: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(target);
        Self { target: Some(weak) }
    }

    pub fn from_weak(target: Weak<dyn SaveTarget>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// A handle with no owner; saves are skipped.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Whether the handle currently reaches a live instance.
    pub fn is_attached(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Name of the owning profile, if attached.
    pub fn profile_name(&self) -> Option<String> {
        self.upgrade().map(|target| target.profile_name().to_string())
    }

    /// Saves through the owner. Returns `Ok(false)` when there is no live
    /// owner and the save was skipped.
    pub fn save(&self) -> ModelResult<bool> {
        match self.upgrade() {
            Some(target) => {
                target.save_profile()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether both handles point at the same instance.
    pub fn same_target(&self, other: &ProfileOwner) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn upgrade(&self) -> Option<Arc<dyn SaveTarget>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for ProfileOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.profile_name() {
            Some(name) => f.debug_tuple("ProfileOwner").field(&name).finish(),
            None => f.write_str("ProfileOwner(detached)"),
        }
    }
}
