use serde_json::Value;

/// Stub methods called by split-mode accessors.
///
/// Every method has a no-op default; a profile type overrides only the
/// ones it needs. Merged-mode accessors never call these.
pub trait AccessorHooks {
    /// Called first in every split-mode read.
    fn before_get(&self, accessor: &str) {
        let _ = accessor;
    }

    /// Called first in every split-mode write. May rewrite the incoming value.
    fn before_set(&mut self, accessor: &str, value: &mut Value) {
        let _ = (accessor, value);
    }
}
