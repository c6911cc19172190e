//! Self-persisting profile objects.
//!
//! A profile is a plain struct that implements [`Profile`] and describes its
//! persisted fields with [`profile_schema!`](autoconfig_model::profile_schema).
//! [`ProfileRegistry::initialize`] synthesizes one accessor per field, binds
//! the persistence strategy chosen by the profile's settings and loads the
//! backing file. Every write through an accessor, and every mutation of a
//! [`ProfileList`] or [`ProfileMap`] held by the profile, saves it again.
//!
//! ```no_run
//! use autoconfig_model::profile_schema;
//! use autoconfig_runtime::{AccessorHooks, Profile, ProfileConfig, ProfileRegistry, ProfileResult};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Shop {
//!     name: String,
//!     count: i64,
//! }
//!
//! impl AccessorHooks for Shop {}
//!
//! impl Profile for Shop {
//!     fn schema() -> autoconfig_model::ProfileSchema<Self> {
//!         profile_schema!(Shop { name: String, count: i64 })
//!     }
//! }
//!
//! fn main() -> ProfileResult<()> {
//!     let registry = ProfileRegistry::new(ProfileConfig::with_default_root("Profiles"));
//!     registry.initialize::<Shop>()?;
//!     registry.set::<Shop, _>("Name", "shop-1")?;
//!     let name: String = registry.get::<Shop, _>("Name")?;
//!     assert_eq!(name, "shop-1");
//!     registry.flush();
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod collections;
pub mod config;
pub mod error;
pub mod instance;
pub mod persistence;
pub mod profile;
pub mod registry;

pub use binding::{AccessorBinding, AccessorHooks, BindingSynthesizer, Diagnostic, SynthesisMode};
pub use collections::{DynamicContainer, InstanceBound, ProfileList, ProfileMap, SaveBinding, TypeBound};
pub use config::{PROFILE_DIR_ENV, ProfileConfig, ProfileSettings};
pub use error::{ProfileError, ProfileResult};
pub use instance::{ProfileInstance, ProfileState};
pub use persistence::{CustomOperations, PersistenceStrategy};
pub use profile::Profile;
pub use registry::ProfileRegistry;
