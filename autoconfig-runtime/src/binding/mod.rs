//! Binding synthesis: field descriptors in, accessor bindings and
//! registration statements out.
//!
//! Each descriptor becomes one [`AccessorBinding`] whose get pipeline ends
//! in the field's value and whose set pipeline always ends in a save, plus
//! three [`Registration`] statements (type, setter, getter) that let the
//! dictionary strategy work on any profile without per-field code.

mod hooks;
mod naming;
mod pipeline;
mod registration;
mod synthesizer;

pub use hooks::AccessorHooks;
pub use naming::{FIELD_MARKER, accessor_name};
pub use pipeline::{AccessorBinding, CompiledHook, GetOutcome, GetStep, SetStep};
pub use registration::{FieldTable, Getter, Registration, Setter};
pub use synthesizer::{BindingSynthesizer, BindingTable, Diagnostic, SynthesisMode, SynthesizedProfile};
