use crate::binding::AccessorHooks;
use crate::config::ProfileSettings;
use crate::error::ProfileResult;
use crate::persistence::CustomOperations;
use crate::registry::ProfileRegistry;
use autoconfig_model::ProfileSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A self-persisting configuration type.
///
/// Implementors describe their persisted fields once in [`schema`]; the
/// registry synthesizes accessors from it, binds a persistence strategy
/// from [`settings`], and keeps one current instance per type.
///
/// [`schema`]: Profile::schema
/// [`settings`]: Profile::settings
pub trait Profile: Default + Serialize + DeserializeOwned + AccessorHooks + Send + Sync + 'static {
    /// Persisted fields, in order.
    fn schema() -> ProfileSchema<Self>;

    /// Name used for the default backing path and in logs. Defaults to the
    /// unqualified type name.
    fn profile_name() -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default()
    }

    /// Initial delegates for [`ProfileOperationMode::Custom`](autoconfig_model::ProfileOperationMode::Custom).
    fn custom_operations() -> CustomOperations<Self> {
        CustomOperations::default()
    }

    /// Saves the current instance of this type. Type-bound containers call
    /// this after every mutation.
    fn save_profile() -> ProfileResult<()> {
        ProfileRegistry::global().save::<Self>()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
