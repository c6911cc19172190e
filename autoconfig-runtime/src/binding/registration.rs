use autoconfig_model::{FieldType, ModelResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reads one field of `P` as JSON.
pub type Getter<P> = Arc<dyn Fn(&P) -> ModelResult<Value> + Send + Sync>;

/// Assigns one field of `P` from JSON.
pub type Setter<P> = Arc<dyn Fn(&mut P, Value) -> ModelResult<()> + Send + Sync>;

/// One registration statement emitted by the synthesizer. Applying every
/// statement of a profile builds its [`FieldTable`].
pub enum Registration<P> {
    Type { accessor: String, field_type: FieldType },
    Setter { accessor: String, setter: Setter<P> },
    Getter { accessor: String, getter: Getter<P> },
}

impl<P> Registration<P> {
    pub fn accessor(&self) -> &str {
        match self {
            Self::Type { accessor, .. } | Self::Setter { accessor, .. } | Self::Getter { accessor, .. } => {
                accessor
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Type { .. } => "type",
            Self::Setter { .. } => "setter",
            Self::Getter { .. } => "getter",
        }
    }
}

impl<P> Clone for Registration<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Type { accessor, field_type } => Self::Type {
                accessor: accessor.clone(),
                field_type: *field_type,
            },
            Self::Setter { accessor, setter } => Self::Setter {
                accessor: accessor.clone(),
                setter: Arc::clone(setter),
            },
            Self::Getter { accessor, getter } => Self::Getter {
                accessor: accessor.clone(),
                getter: Arc::clone(getter),
            },
        }
    }
}

impl<P> fmt::Debug for Registration<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Registration");
        s.field("kind", &self.kind_name()).field("accessor", &self.accessor());
        if let Self::Type { field_type, .. } = self {
            s.field("field_type", &field_type.name());
        }
        s.finish()
    }
}

/// Per-profile maps from accessor name to declared type, setter and getter,
/// with accessor order preserved for persistence.
pub struct FieldTable<P> {
    order: Vec<String>,
    types: HashMap<String, FieldType>,
    setters: HashMap<String, Setter<P>>,
    getters: HashMap<String, Getter<P>>,
}

impl<P> Default for FieldTable<P> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            types: HashMap::new(),
            setters: HashMap::new(),
            getters: HashMap::new(),
        }
    }
}

impl<P> FieldTable<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from registration statements, in order.
    pub fn from_registrations(registrations: &[Registration<P>]) -> Self {
        let mut table = Self::new();
        for registration in registrations {
            table.apply(registration.clone());
        }
        table
    }

    /// Applies one statement. A later statement for the same accessor and
    /// kind replaces the earlier one.
    pub fn apply(&mut self, registration: Registration<P>) {
        let accessor = registration.accessor().to_string();
        if !self.order.contains(&accessor) {
            self.order.push(accessor.clone());
        }
        match registration {
            Registration::Type { field_type, .. } => {
                self.types.insert(accessor, field_type);
            }
            Registration::Setter { setter, .. } => {
                self.setters.insert(accessor, setter);
            }
            Registration::Getter { getter, .. } => {
                self.getters.insert(accessor, getter);
            }
        }
    }

    pub fn field_type(&self, accessor: &str) -> Option<FieldType> {
        self.types.get(accessor).copied()
    }

    pub fn setter(&self, accessor: &str) -> Option<&Setter<P>> {
        self.setters.get(accessor)
    }

    pub fn getter(&self, accessor: &str) -> Option<&Getter<P>> {
        self.getters.get(accessor)
    }

    /// Accessor names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Accessors with a registered getter, in registration order.
    pub fn getters(&self) -> impl Iterator<Item = (&str, &Getter<P>)> {
        self.order
            .iter()
            .filter_map(|name| self.getters.get(name).map(|getter| (name.as_str(), getter)))
    }

    /// Reads one accessor's field as JSON; `None` when no getter is registered.
    pub fn read(&self, profile: &P, accessor: &str) -> ModelResult<Option<Value>> {
        match self.getters.get(accessor) {
            Some(getter) => getter(profile).map(Some),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<P> fmt::Debug for FieldTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("accessors", &self.order)
            .field("setters", &self.setters.len())
            .field("getters", &self.getters.len())
            .finish()
    }
}
