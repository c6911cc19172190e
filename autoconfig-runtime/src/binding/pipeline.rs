use super::hooks::AccessorHooks;
use super::registration::FieldTable;
use crate::error::ProfileResult;
use autoconfig_model::{
    FieldAccess, FieldType, GetCallback, GetFlow, GetScope, Invocation, ProfileOwner, SetCallback, SetFlow,
    SetScope, Template, TemplatePart,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A hook argument compiled once at synthesis time.
pub enum CompiledHook<F> {
    /// Literal text, parsed to JSON (or kept as a JSON string).
    Literal { source: String, value: Value },
    /// Rendered on every run.
    Template(Template),
    /// Invoked on every run.
    Invocation(Invocation<F>),
    /// Unrecognized expression; does nothing at runtime.
    Inert(String),
}

impl<F> CompiledHook<F> {
    /// Parses `text` as JSON; text that is not JSON becomes a JSON string.
    pub fn literal(text: &str) -> Self {
        let value = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        Self::Literal {
            source: text.to_string(),
            value,
        }
    }
}

impl<F> fmt::Display for CompiledHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { source, .. } => write!(f, "literal {source:?}"),
            Self::Template(template) => write!(f, "template {:?}", template.to_string()),
            Self::Invocation(invocation) => write!(f, "call {}", invocation.expr),
            Self::Inert(expr) => write!(f, "inert {expr:?}"),
        }
    }
}

/// One step of a get pipeline.
pub enum GetStep<P> {
    /// `AccessorHooks::before_get` (split mode only).
    BeforeGet,
    Hook(CompiledHook<GetCallback<P>>),
    /// Return the field. Always last.
    ReturnField,
}

/// One step of a set pipeline.
pub enum SetStep<P> {
    /// `AccessorHooks::before_set` (split mode only).
    BeforeSet,
    Hook(CompiledHook<SetCallback<P>>),
    /// Assign the incoming value, unless a hook handled it.
    Assign,
    /// Persist the profile. Always last.
    Save,
}

/// Result of running a get pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum GetOutcome {
    /// The pipeline reached the field itself.
    Field,
    /// A hook produced the value.
    Computed(Value),
}

/// The synthesized public accessor for one field.
pub struct AccessorBinding<P> {
    pub(super) name: String,
    pub(super) field: String,
    pub(super) declared_type: FieldType,
    pub(super) access: Arc<dyn FieldAccess<P>>,
    pub(super) get: Vec<GetStep<P>>,
    pub(super) set: Vec<SetStep<P>>,
}

impl<P> AccessorBinding<P> {
    /// Public accessor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn declared_type(&self) -> FieldType {
        self.declared_type
    }

    pub fn access(&self) -> &Arc<dyn FieldAccess<P>> {
        &self.access
    }

    pub fn get_steps(&self) -> &[GetStep<P>] {
        &self.get
    }

    pub fn set_steps(&self) -> &[SetStep<P>] {
        &self.set
    }
}

impl<P: AccessorHooks> AccessorBinding<P> {
    /// Runs the get pipeline. The first hook that produces a value wins.
    pub fn run_get(&self, profile: &P, table: &FieldTable<P>, owner: &ProfileOwner) -> ProfileResult<GetOutcome> {
        for step in &self.get {
            match step {
                GetStep::BeforeGet => profile.before_get(&self.name),
                GetStep::Hook(CompiledHook::Literal { value, .. }) => {
                    return Ok(GetOutcome::Computed(value.clone()));
                }
                GetStep::Hook(CompiledHook::Template(template)) => {
                    let own = self.access.read_value(profile)?;
                    let rendered = render(template, profile, table, &own)?;
                    return Ok(GetOutcome::Computed(Value::String(rendered)));
                }
                GetStep::Hook(CompiledHook::Invocation(invocation)) => {
                    let scope = GetScope::new(profile, &self.name, owner);
                    if let GetFlow::Return(value) = (invocation.call)(&scope) {
                        return Ok(GetOutcome::Computed(value));
                    }
                }
                GetStep::Hook(CompiledHook::Inert(_)) => {}
                GetStep::ReturnField => return Ok(GetOutcome::Field),
            }
        }
        Ok(GetOutcome::Field)
    }

    /// Runs the set pipeline up to, not including, the save. Returns whether
    /// the pipeline asks for a save; the caller performs it once the
    /// profile is no longer borrowed.
    pub fn run_set(&self, profile: &mut P, table: &FieldTable<P>, value: Value) -> ProfileResult<bool> {
        let mut value = value;
        let mut handled = false;
        let mut save = false;
        for step in &self.set {
            match step {
                SetStep::BeforeSet => profile.before_set(&self.name, &mut value),
                SetStep::Hook(CompiledHook::Literal { value: literal, .. }) => value = literal.clone(),
                SetStep::Hook(CompiledHook::Template(template)) => {
                    let rendered = render(template, profile, table, &value)?;
                    value = Value::String(rendered);
                }
                SetStep::Hook(CompiledHook::Invocation(invocation)) => {
                    let mut scope = SetScope::new(&mut *profile, &self.name, &mut value);
                    if (invocation.call)(&mut scope) == SetFlow::Handled {
                        handled = true;
                    }
                }
                SetStep::Hook(CompiledHook::Inert(_)) => {}
                SetStep::Assign => {
                    if !handled {
                        self.access.write_value(profile, value.clone())?;
                    }
                }
                SetStep::Save => save = true,
            }
        }
        Ok(save)
    }
}

/// Renders a template. `{value}` is `own`; `{Name}` reads accessor `Name`
/// through the field table. Unknown names render verbatim.
fn render<P>(template: &Template, profile: &P, table: &FieldTable<P>, own: &Value) -> ProfileResult<String> {
    let mut out = String::new();
    for part in template.parts() {
        match part {
            TemplatePart::Text(text) => out.push_str(text),
            TemplatePart::Value => push_value(&mut out, own),
            TemplatePart::Field(name) => match table.read(profile, name)? {
                Some(value) => push_value(&mut out, &value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    Ok(out)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(text) => out.push_str(text),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}

impl<P> fmt::Display for GetStep<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeGet => f.write_str("before_get"),
            Self::Hook(hook) => write!(f, "{hook}"),
            Self::ReturnField => f.write_str("return field"),
        }
    }
}

impl<P> fmt::Display for SetStep<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeSet => f.write_str("before_set"),
            Self::Hook(hook) => write!(f, "{hook}"),
            Self::Assign => f.write_str("assign field"),
            Self::Save => f.write_str("save"),
        }
    }
}

/// One line per pipeline, e.g.
///
/// ```text
/// Name (name: alloc::string::String)
///   get: literal "x" -> return field
///   set: assign field -> save
/// ```
impl<P> fmt::Display for AccessorBinding<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}: {})", self.name, self.field, self.declared_type)?;
        f.write_str("  get: ")?;
        write_steps(f, &self.get)?;
        f.write_str("\n  set: ")?;
        write_steps(f, &self.set)
    }
}

fn write_steps<S: fmt::Display>(f: &mut fmt::Formatter<'_>, steps: &[S]) -> fmt::Result {
    for (index, step) in steps.iter().enumerate() {
        if index > 0 {
            f.write_str(" -> ")?;
        }
        write!(f, "{step}")?;
    }
    Ok(())
}

impl<P> fmt::Debug for AccessorBinding<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorBinding")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("declared_type", &self.declared_type.name())
            .field("get", &self.get.iter().map(ToString::to_string).collect::<Vec<_>>())
            .field("set", &self.set.iter().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}
