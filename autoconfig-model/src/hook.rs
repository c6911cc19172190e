//! Hook directives spliced into generated accessors.
//!
//! A hook is declared as a tagged argument rather than source text; the
//! binding synthesizer compiles each variant once into a pipeline step.

use crate::owner::ProfileOwner;
use crate::template::Template;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback form of an `AddGet` invocation hook.
pub type GetCallback<P> = Arc<dyn Fn(&GetScope<'_, P>) -> GetFlow + Send + Sync>;

/// Callback form of an `AddSet` invocation hook.
pub type SetCallback<P> = Arc<dyn Fn(&mut SetScope<'_, P>) -> SetFlow + Send + Sync>;

/// A hook attached to a field, tagged by the accessor half it extends.
/// Several directives of the same kind may be attached; they run in
/// declaration order.
pub enum HookDirective<P> {
    AddGet(HookArg<GetCallback<P>>),
    AddSet(HookArg<SetCallback<P>>),
}

impl<P> HookDirective<P> {
    pub fn arg_kind(&self) -> HookKind {
        match self {
            Self::AddGet(arg) => arg.kind(),
            Self::AddSet(arg) => arg.kind(),
        }
    }
}

impl<P> Clone for HookDirective<P> {
    fn clone(&self) -> Self {
        match self {
            Self::AddGet(arg) => Self::AddGet(arg.clone()),
            Self::AddSet(arg) => Self::AddSet(arg.clone()),
        }
    }
}

impl<P> fmt::Debug for HookDirective<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddGet(arg) => f.debug_tuple("AddGet").field(arg).finish(),
            Self::AddSet(arg) => f.debug_tuple("AddSet").field(arg).finish(),
        }
    }
}

/// The argument of a hook directive.
#[derive(Clone)]
pub enum HookArg<F> {
    /// Plain literal text. Parsed as JSON when possible, else a JSON string.
    Literal(String),
    /// Interpolated text.
    Template(Template),
    /// A nested call expression, captured as a callback.
    Invocation(Invocation<F>),
    /// An expression kind the schema producer could not classify.
    Unrecognized(String),
}

impl<F> HookArg<F> {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Parses `source` as a template (see [`Template::parse`]).
    pub fn template(source: &str) -> Self {
        Self::Template(Template::parse(source))
    }

    pub fn kind(&self) -> HookKind {
        match self {
            Self::Literal(_) => HookKind::Literal,
            Self::Template(_) => HookKind::Template,
            Self::Invocation(_) => HookKind::Invocation,
            Self::Unrecognized(_) => HookKind::Unrecognized,
        }
    }
}

impl<F> fmt::Debug for HookArg<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Invocation(invocation) => f.debug_tuple("Invocation").field(&invocation.expr).finish(),
            Self::Unrecognized(text) => f.debug_tuple("Unrecognized").field(text).finish(),
        }
    }
}

/// Discriminant of a [`HookArg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Literal,
    Template,
    Invocation,
    Unrecognized,
}

/// A captured call: the expression text (for descriptions and diagnostics)
/// and the callback that implements it.
#[derive(Clone)]
pub struct Invocation<F> {
    pub expr: String,
    pub call: F,
}

/// Builds an `AddGet` invocation hook.
pub fn get_hook<P, F>(expr: &str, call: F) -> HookArg<GetCallback<P>>
where
    F: Fn(&GetScope<'_, P>) -> GetFlow + Send + Sync + 'static,
{
    HookArg::Invocation(Invocation {
        expr: expr.to_string(),
        call: Arc::new(call),
    })
}

/// Builds an `AddSet` invocation hook.
pub fn set_hook<P, F>(expr: &str, call: F) -> HookArg<SetCallback<P>>
where
    F: Fn(&mut SetScope<'_, P>) -> SetFlow + Send + Sync + 'static,
{
    HookArg::Invocation(Invocation {
        expr: expr.to_string(),
        call: Arc::new(call),
    })
}

/// Outcome of a get hook.
#[derive(Debug, Clone, PartialEq)]
pub enum GetFlow {
    /// Fall through to the next step.
    Continue,
    /// Short-circuit the accessor with this value.
    Return(Value),
}

/// Outcome of a set hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFlow {
    /// Fall through; the default assignment still runs.
    Continue,
    /// The hook stored the value itself; skip the default assignment.
    /// The save trigger still fires.
    Handled,
}

/// What a get hook can see.
pub struct GetScope<'a, P> {
    profile: &'a P,
    accessor: &'a str,
    owner: &'a ProfileOwner,
}

impl<'a, P> GetScope<'a, P> {
    pub fn new(profile: &'a P, accessor: &'a str, owner: &'a ProfileOwner) -> Self {
        Self {
            profile,
            accessor,
            owner,
        }
    }

    pub fn profile(&self) -> &'a P {
        self.profile
    }

    /// Public name of the accessor being read.
    pub fn accessor(&self) -> &'a str {
        self.accessor
    }

    /// Back-reference to the instance being read, for installing container owners.
    pub fn owner(&self) -> ProfileOwner {
        self.owner.clone()
    }
}

/// What a set hook can see and change.
pub struct SetScope<'a, P> {
    profile: &'a mut P,
    accessor: &'a str,
    value: &'a mut Value,
}

impl<'a, P> SetScope<'a, P> {
    pub fn new(profile: &'a mut P, accessor: &'a str, value: &'a mut Value) -> Self {
        Self {
            profile,
            accessor,
            value,
        }
    }

    pub fn profile(&self) -> &P {
        &*self.profile
    }

    pub fn profile_mut(&mut self) -> &mut P {
        &mut *self.profile
    }

    pub fn accessor(&self) -> &str {
        self.accessor
    }

    /// The incoming value, as it will be assigned.
    pub fn value(&self) -> &Value {
        &*self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut *self.value
    }

    pub fn set_value(&mut self, value: Value) {
        *self.value = value;
    }
}
