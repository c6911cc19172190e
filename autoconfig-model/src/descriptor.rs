use crate::error::{ModelError, ModelResult};
use crate::hook::{GetCallback, HookArg, HookDirective, SetCallback};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The declared Rust type of a profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    id: TypeId,
    name: &'static str,
}

impl FieldType {
    /// Describes `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, as reported by the compiler.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased access to one field of a profile `P`.
///
/// The runtime only ever sees fields through this trait: persistence goes
/// through the JSON-valued methods, typed accessor reads through
/// [`read_any`](FieldAccess::read_any).
pub trait FieldAccess<P>: Send + Sync {
    /// Declared type of the field.
    fn field_type(&self) -> FieldType;

    /// Serializes the field's current value.
    fn read_value(&self, profile: &P) -> ModelResult<Value>;

    /// Deserializes `value` into the field's type and assigns it.
    fn write_value(&self, profile: &mut P, value: Value) -> ModelResult<()>;

    /// Clones the field's current value behind `dyn Any`.
    fn read_any(&self, profile: &P) -> Box<dyn Any + Send>;
}

struct FieldLens<P, T> {
    name: String,
    get: fn(&P) -> &T,
    get_mut: fn(&mut P) -> &mut T,
    _marker: PhantomData<fn() -> T>,
}

impl<P, T> FieldAccess<P> for FieldLens<P, T>
where
    P: 'static,
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn field_type(&self) -> FieldType {
        FieldType::of::<T>()
    }

    fn read_value(&self, profile: &P) -> ModelResult<Value> {
        serde_json::to_value((self.get)(profile)).map_err(|e| ModelError::value(&self.name, e))
    }

    fn write_value(&self, profile: &mut P, value: Value) -> ModelResult<()> {
        let typed: T = serde_json::from_value(value).map_err(|e| ModelError::value(&self.name, e))?;
        *(self.get_mut)(profile) = typed;
        Ok(())
    }

    fn read_any(&self, profile: &P) -> Box<dyn Any + Send> {
        Box::new((self.get)(profile).clone())
    }
}

/// Static metadata for one persisted field of profile `P`.
///
/// Built once per profile type, usually by [`profile_schema!`](crate::profile_schema),
/// and consumed by the binding synthesizer.
pub struct FieldDescriptor<P> {
    name: String,
    declared_type: FieldType,
    hooks: Vec<HookDirective<P>>,
    rename: Option<String>,
    access: Arc<dyn FieldAccess<P>>,
}

impl<P: 'static> FieldDescriptor<P> {
    /// Describes field `name` of type `T`, reached through the two lenses.
    pub fn new<T>(name: &str, get: fn(&P) -> &T, get_mut: fn(&mut P) -> &mut T) -> Self
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            declared_type: FieldType::of::<T>(),
            hooks: Vec::new(),
            rename: None,
            access: Arc::new(FieldLens {
                name: name.to_string(),
                get,
                get_mut,
                _marker: PhantomData,
            }),
        }
    }

    /// Overrides the derived accessor name.
    #[must_use]
    pub fn rename(mut self, accessor: &str) -> Self {
        self.rename = Some(accessor.to_string());
        self
    }

    /// Appends an `AddGet` directive.
    #[must_use]
    pub fn add_get(mut self, arg: HookArg<GetCallback<P>>) -> Self {
        self.hooks.push(HookDirective::AddGet(arg));
        self
    }

    /// Appends an `AddSet` directive.
    #[must_use]
    pub fn add_set(mut self, arg: HookArg<SetCallback<P>>) -> Self {
        self.hooks.push(HookDirective::AddSet(arg));
        self
    }

    /// Applies a builder closure; lets `profile_schema!` attach hooks inline.
    #[must_use]
    pub fn configure(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }
}

impl<P> FieldDescriptor<P> {
    /// Source field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> FieldType {
        self.declared_type
    }

    /// Explicit accessor name, if one was given.
    pub fn rename_override(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    /// All hook directives in declaration order.
    pub fn hooks(&self) -> &[HookDirective<P>] {
        &self.hooks
    }

    /// `AddGet` arguments in declaration order.
    pub fn get_hooks(&self) -> impl Iterator<Item = &HookArg<GetCallback<P>>> {
        self.hooks.iter().filter_map(|directive| match directive {
            HookDirective::AddGet(arg) => Some(arg),
            HookDirective::AddSet(_) => None,
        })
    }

    /// `AddSet` arguments in declaration order.
    pub fn set_hooks(&self) -> impl Iterator<Item = &HookArg<SetCallback<P>>> {
        self.hooks.iter().filter_map(|directive| match directive {
            HookDirective::AddSet(arg) => Some(arg),
            HookDirective::AddGet(_) => None,
        })
    }

    pub fn access(&self) -> &Arc<dyn FieldAccess<P>> {
        &self.access
    }
}

impl<P> Clone for FieldDescriptor<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            declared_type: self.declared_type,
            hooks: self.hooks.clone(),
            rename: self.rename.clone(),
            access: Arc::clone(&self.access),
        }
    }
}

impl<P> fmt::Debug for FieldDescriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type.name())
            .field("hooks", &self.hooks)
            .field("rename", &self.rename)
            .finish()
    }
}
