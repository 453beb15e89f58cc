// lnd-config/src/shape.rs
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Any value, including `null`. Only the key's presence is checked.
    Any,
    String,
    Number,
    Boolean,
    List(Box<Shape>),
    Object(ObjectShape),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    fields: Vec<(&'static str, Shape)>,
    optional: BTreeSet<&'static str>,
}

/// Where a value stopped conforming, as a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub path: String,
    pub expected: &'static str,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "expected {}", self.expected)
        } else {
            write!(f, "{}: expected {}", self.path, self.expected)
        }
    }
}

impl Shape {
    /// Object shape where every listed field is mandatory.
    pub fn object<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Shape)>,
    {
        Shape::Object(ObjectShape {
            fields: fields.into_iter().collect(),
            optional: BTreeSet::new(),
        })
    }

    pub fn list(elem: Shape) -> Self {
        Shape::List(Box::new(elem))
    }

    /// Marks the given fields of an object shape as optional: they may be
    /// absent or `null`.
    ///
    /// No effect on non-object shapes.
    pub fn with_optional<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        if let Shape::Object(obj) = &mut self {
            obj.optional.extend(names);
        }
        self
    }

    pub fn test(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    /// Like [`Shape::test`] but reports the first offending path.
    pub fn check(&self, value: &Value) -> Result<(), Mismatch> {
        self.check_at(value, "")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), Mismatch> {
        let mismatch = |expected| Mismatch {
            path: path.to_string(),
            expected,
        };
        match (self, value) {
            (Shape::Any, _) => Ok(()),
            (Shape::String, Value::String(_)) => Ok(()),
            (Shape::Number, Value::Number(_)) => Ok(()),
            (Shape::Boolean, Value::Bool(_)) => Ok(()),
            (Shape::List(elem), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    elem.check_at(item, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            (Shape::Object(obj), Value::Object(map)) => {
                for (name, shape) in &obj.fields {
                    let child = join(path, name);
                    let optional = obj.optional.contains(name);
                    match map.get(*name) {
                        Some(Value::Null) if optional => {}
                        Some(v) => shape.check_at(v, &child)?,
                        None if optional => {}
                        None => {
                            return Err(Mismatch {
                                path: child,
                                expected: "field to be present",
                            })
                        }
                    }
                }
                Ok(())
            }
            (Shape::String, _) => Err(mismatch("string")),
            (Shape::Number, _) => Err(mismatch("number")),
            (Shape::Boolean, _) => Err(mismatch("boolean")),
            (Shape::List(_), _) => Err(mismatch("list")),
            (Shape::Object(_), _) => Err(mismatch("object")),
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
