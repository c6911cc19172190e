use super::naming::accessor_name;
use super::pipeline::{AccessorBinding, CompiledHook, GetStep, SetStep};
use super::registration::{Getter, Registration, Setter};
use crate::error::{ProfileError, ProfileResult};
use autoconfig_model::{FieldDescriptor, HookArg, ProfileSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// How accessor pipelines are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// Hooks and default behavior in one pipeline.
    #[default]
    Merged,
    /// As `Merged`, with `AccessorHooks` stubs called first on each side.
    Split,
}

/// A problem found while synthesizing a profile that did not stop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub profile: String,
    pub accessor: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.profile, self.accessor, self.message)
    }
}

/// Accessor bindings of one profile, looked up by public name.
pub struct BindingTable<P> {
    bindings: Vec<AccessorBinding<P>>,
    index: HashMap<String, usize>,
}

impl<P> BindingTable<P> {
    pub fn get(&self, accessor: &str) -> Option<&AccessorBinding<P>> {
        self.index.get(accessor).map(|&i| &self.bindings[i])
    }

    pub fn contains(&self, accessor: &str) -> bool {
        self.index.contains_key(accessor)
    }

    /// Bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AccessorBinding<P>> {
        self.bindings.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(AccessorBinding::name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<P> fmt::Debug for BindingTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings.iter()).finish()
    }
}

/// Everything synthesized for one profile type.
#[derive(Debug)]
pub struct SynthesizedProfile<P> {
    pub bindings: BindingTable<P>,
    pub registrations: Vec<Registration<P>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns a [`ProfileSchema`] into accessor bindings and registrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingSynthesizer {
    mode: SynthesisMode,
}

impl BindingSynthesizer {
    pub fn new(mode: SynthesisMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SynthesisMode {
        self.mode
    }

    /// Synthesizes every field of `schema`.
    ///
    /// Fails on empty or colliding accessor names. Hooks that cannot be
    /// compiled and template references to unknown accessors are reported
    /// as diagnostics instead.
    pub fn synthesize<P: 'static>(&self, schema: &ProfileSchema<P>) -> ProfileResult<SynthesizedProfile<P>> {
        let profile = schema.profile();
        let mut bindings = Vec::with_capacity(schema.len());
        let mut index = HashMap::with_capacity(schema.len());
        let mut registrations = Vec::with_capacity(schema.len() * 3);
        let mut diagnostics = Vec::new();

        for descriptor in schema.fields() {
            let name = match descriptor.rename_override() {
                Some(rename) => rename.to_string(),
                None => accessor_name(descriptor.name()),
            };
            if name.is_empty() {
                return Err(ProfileError::InvalidField {
                    profile: profile.to_string(),
                    field: descriptor.name().to_string(),
                    reason: "accessor name is empty".to_string(),
                });
            }
            if index.contains_key(&name) {
                return Err(ProfileError::DuplicateAccessor {
                    profile: profile.to_string(),
                    accessor: name,
                });
            }

            let binding = self.bind(profile, &name, descriptor, &mut diagnostics);
            registrations.extend(register(&name, descriptor));
            index.insert(name, bindings.len());
            bindings.push(binding);
        }

        check_template_refs(profile, &bindings, &index, &mut diagnostics);
        for diagnostic in &diagnostics {
            warn!(
                profile = %diagnostic.profile,
                accessor = %diagnostic.accessor,
                "Binding diagnostic: {}",
                diagnostic.message
            );
        }
        debug!(
            profile = %profile,
            accessors = bindings.len(),
            mode = ?self.mode,
            "Synthesized accessor bindings"
        );

        Ok(SynthesizedProfile {
            bindings: BindingTable { bindings, index },
            registrations,
            diagnostics,
        })
    }

    fn bind<P>(
        &self,
        profile: &str,
        name: &str,
        descriptor: &FieldDescriptor<P>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> AccessorBinding<P> {
        let mut get = Vec::new();
        let mut set = Vec::new();
        if self.mode == SynthesisMode::Split {
            get.push(GetStep::BeforeGet);
            set.push(SetStep::BeforeSet);
        }

        for arg in descriptor.get_hooks() {
            get.push(GetStep::Hook(compile(profile, name, "get", arg, diagnostics)));
        }
        get.push(GetStep::ReturnField);

        for arg in descriptor.set_hooks() {
            set.push(SetStep::Hook(compile(profile, name, "set", arg, diagnostics)));
        }
        set.push(SetStep::Assign);
        set.push(SetStep::Save);

        AccessorBinding {
            name: name.to_string(),
            field: descriptor.name().to_string(),
            declared_type: descriptor.declared_type(),
            access: Arc::clone(descriptor.access()),
            get,
            set,
        }
    }
}

fn compile<F: Clone>(
    profile: &str,
    accessor: &str,
    side: &str,
    arg: &HookArg<F>,
    diagnostics: &mut Vec<Diagnostic>,
) -> CompiledHook<F> {
    match arg {
        HookArg::Literal(text) => CompiledHook::literal(text),
        HookArg::Template(template) => CompiledHook::Template(template.clone()),
        HookArg::Invocation(invocation) => CompiledHook::Invocation(invocation.clone()),
        HookArg::Unrecognized(expr) => {
            diagnostics.push(Diagnostic {
                profile: profile.to_string(),
                accessor: accessor.to_string(),
                message: format!("unrecognized {side} hook expression {expr:?} ignored"),
            });
            CompiledHook::Inert(expr.clone())
        }
    }
}

fn register<P: 'static>(name: &str, descriptor: &FieldDescriptor<P>) -> [Registration<P>; 3] {
    let write = Arc::clone(descriptor.access());
    let read = Arc::clone(descriptor.access());
    let setter: Setter<P> = Arc::new(move |profile: &mut P, value: Value| write.write_value(profile, value));
    let getter: Getter<P> = Arc::new(move |profile: &P| read.read_value(profile));
    [
        Registration::Type {
            accessor: name.to_string(),
            field_type: descriptor.declared_type(),
        },
        Registration::Setter {
            accessor: name.to_string(),
            setter,
        },
        Registration::Getter {
            accessor: name.to_string(),
            getter,
        },
    ]
}

fn check_template_refs<P>(
    profile: &str,
    bindings: &[AccessorBinding<P>],
    index: &HashMap<String, usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for binding in bindings {
        let templates = binding
            .get_steps()
            .iter()
            .filter_map(|step| match step {
                GetStep::Hook(CompiledHook::Template(template)) => Some(template),
                _ => None,
            })
            .chain(binding.set_steps().iter().filter_map(|step| match step {
                SetStep::Hook(CompiledHook::Template(template)) => Some(template),
                _ => None,
            }));
        for template in templates {
            for field in template.field_refs() {
                if !index.contains_key(field) {
                    diagnostics.push(Diagnostic {
                        profile: profile.to_string(),
                        accessor: binding.name().to_string(),
                        message: format!("template references unknown accessor {field:?}"),
                    });
                }
            }
        }
    }
}
