//! Profile schema model for autoconfig.
//!
//! Defines the static description of a profile type that every other
//! autoconfig crate consumes:
//! - [`FieldDescriptor`]: one persisted field (name, declared type, hooks, rename)
//! - [`HookDirective`] / [`HookArg`]: code fragments spliced into accessors,
//!   as tagged variants instead of source text
//! - [`Template`]: interpolated hook text (`"{Name} ({value})"`)
//! - [`ProfileOperationMode`]: which persistence format a profile uses
//! - [`ProfileOwner`]: non-owning back-reference used by self-persisting containers
//! - [`ProfileSchema`] and [`profile_schema!`]: the ordered field list for a type
//!
//! Nothing in this crate touches the file system or knows about the
//! registry; it is the contract between schema producers and the runtime.

mod descriptor;
mod error;
mod hook;
mod mode;
mod owner;
mod schema;
mod template;

pub use descriptor::{FieldAccess, FieldDescriptor, FieldType};
pub use error::{ModelError, ModelResult};
pub use hook::{
    GetCallback, GetFlow, GetScope, HookArg, HookDirective, HookKind, Invocation, SetCallback,
    SetFlow, SetScope, get_hook, set_hook,
};
pub use mode::{DICTIONARY_EXTENSION, JSON_EXTENSION, ProfileOperationMode, XML_EXTENSION};
pub use owner::{ProfileOwner, SaveTarget};
pub use schema::ProfileSchema;
pub use template::{Template, TemplatePart};
