use std::fmt;

/// One piece of an interpolated hook text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Verbatim text.
    Text(String),
    /// Current value of the registered field with this accessor name.
    Field(String),
    /// The value flowing through the accessor: the incoming value in a set
    /// pipeline, the field's own value in a get pipeline.
    Value,
}

/// Interpolated text, parsed once when the hook is declared.
///
/// `{Name}` refers to a registered accessor, `{value}` to the accessor's
/// own value; `{{` and `}}` are literal braces. An unterminated `{` is kept
/// as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn new(parts: Vec<TemplatePart>) -> Self {
        Self { parts }
    }

    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        text.push('{');
                        text.push_str(&name);
                        continue;
                    }
                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    let name = name.trim();
                    if name == "value" {
                        parts.push(TemplatePart::Value);
                    } else {
                        parts.push(TemplatePart::Field(name.to_string()));
                    }
                }
                other => text.push(other),
            }
        }

        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        Self { parts }
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Accessor names referenced by `{Name}` placeholders.
    pub fn field_refs(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => f.write_str(&text.replace('{', "{{").replace('}', "}}"))?,
                TemplatePart::Field(name) => write!(f, "{{{name}}}")?,
                TemplatePart::Value => f.write_str("{value}")?,
            }
        }
        Ok(())
    }
}
