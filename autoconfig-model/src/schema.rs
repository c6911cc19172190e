use crate::descriptor::FieldDescriptor;
use std::fmt;

/// The ordered field list of one profile type.
pub struct ProfileSchema<P> {
    profile: String,
    fields: Vec<FieldDescriptor<P>>,
}

impl<P> ProfileSchema<P> {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            fields: Vec::new(),
        }
    }

    /// Appends a field; declaration order is preserved.
    #[must_use]
    pub fn field(mut self, descriptor: FieldDescriptor<P>) -> Self {
        self.fields.push(descriptor);
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn fields(&self) -> &[FieldDescriptor<P>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finds a field by its source name.
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor<P>> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

impl<P> Clone for ProfileSchema<P> {
    fn clone(&self) -> Self {
        Self {
            profile: self.profile.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<P> fmt::Debug for ProfileSchema<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileSchema")
            .field("profile", &self.profile)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Declares the schema of a profile struct.
///
/// ```
/// use autoconfig_model::{HookArg, profile_schema};
///
/// #[derive(Default)]
/// struct ShopProfile {
///     name: String,
///     count: i64,
/// }
///
/// let schema = profile_schema!(ShopProfile {
///     name: String => |field| field.add_get(HookArg::template("shop {value}")),
///     count: i64,
/// });
/// assert_eq!(schema.len(), 2);
/// ```
#[macro_export]
macro_rules! profile_schema {
    ($profile:ident { $($field:ident : $ty:ty $(=> $configure:expr)?),* $(,)? }) => {{
        let schema = $crate::ProfileSchema::<$profile>::new(stringify!($profile));
        $(
            let descriptor = $crate::FieldDescriptor::<$profile>::new::<$ty>(
                stringify!($field),
                |profile| &profile.$field,
                |profile| &mut profile.$field,
            );
            $( let descriptor = descriptor.configure($configure); )?
            let schema = schema.field(descriptor);
        )*
        schema
    }};
}
