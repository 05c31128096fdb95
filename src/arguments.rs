//! Operation variables and the minified `$name:Type!` declaration clause.
use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::shape::{self, GraphQLShape, Shape, TEXT_SCALAR};

/// A variable value together with the shape that names its GraphQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    value: Value,
    shape: Option<Shape>,  // None: classify from the JSON value when encoding
}

/// Per-repetition sub-mappings, suffix key → value.
pub type Group = Vec<IndexMap<String, Argument>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Value(Argument),
    Group(Group),
}

/// Variables as supplied by the caller.
pub type Variables = IndexMap<String, Variable>;

/// Variables as sent on the wire, after repetition groups are exploded.
pub type Arguments = IndexMap<String, Argument>;

impl Argument {
    pub fn new<T: GraphQLShape + Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self { value: serde_json::to_value(value)?, shape: Some(T::shape()) })
    }

    pub fn typed(value: Value, shape: Shape) -> Self {
        Self { value, shape: Some(shape) }
    }

    pub fn untyped(value: Value) -> Self {
        Self { value, shape: None }
    }

    pub fn value(&self) -> &Value { &self.value }
    pub fn shape(&self) -> Option<&Shape> { self.shape.as_ref() }
    pub fn into_value(self) -> Value { self.value }

    fn resolve_shape(&self, variable: &str) -> Result<Cow<'_, Shape>> {
        match &self.shape {
            Some(shape) => Ok(Cow::Borrowed(shape)),
            None => shape::infer::observe_value(&self.value)
                .map(Cow::Owned)
                .map_err(|reason| Error::unrepresentable(variable, reason)),
        }
    }
}

impl Serialize for Argument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl From<Argument> for Variable {
    fn from(arg: Argument) -> Self { Variable::Value(arg) }
}

impl Variable {
    pub fn value<T: GraphQLShape + Serialize + ?Sized>(value: &T) -> Result<Self> {
        Argument::new(value).map(Variable::Value)
    }

    pub fn group<I, M>(repetitions: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (String, Argument)>,
    {
        Variable::Group(repetitions.into_iter().map(|m| m.into_iter().collect()).collect())
    }

    /// Read an untyped variable. Non-empty arrays whose items are all objects
    /// become repetition groups; everything else (the empty array included) is
    /// a plain value classified at encode time.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                Variable::Group(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(map) => Some(
                                map.into_iter()
                                    .map(|(k, v)| (k, Argument::untyped(v)))
                                    .collect(),
                            ),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => Variable::Value(Argument::untyped(other)),
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Variable::Group(g) => Some(g),
            Variable::Value(_) => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENCODER
// ————————————————————————————————————————————————————————————————————————————

/// Minified arguments string for variables.
///
/// E.g. `{"b": Option<bool>, "a": i32}` → `$a:Int!$b:Boolean`.
/// Names are sorted so identical inputs always give identical text.
pub fn encode_arguments(arguments: &Arguments) -> Result<String> {
    let mut names: Vec<&String> = arguments.keys().collect();
    names.sort();

    let mut buf = String::new();
    for name in names {
        let shape = arguments[name.as_str()].resolve_shape(name)?;
        buf.push('$');
        buf.push_str(name);
        buf.push(':');
        write_argument_type(&mut buf, &shape, true)
            .map_err(|reason| Error::unrepresentable(name, reason))?;
        // No comma: commas are insignificant in GraphQL and we want minified output.
    }
    Ok(buf)
}

/// Write the minified GraphQL type of `shape`.
/// `required` appends `!`; optional wrappers clear it for their inner type.
pub fn write_argument_type(w: &mut String, shape: &Shape, required: bool) -> Result<(), &'static str> {
    match shape {
        Shape::Optional(inner) => return write_argument_type(w, inner, false),
        Shape::List(inner) => {
            w.push('[');
            write_argument_type(w, inner, true)?;
            w.push(']');
        }
        // fixed compatibility rule: the native text scalar is declared as `ID`
        Shape::Scalar(name) if name == TEXT_SCALAR => w.push_str("ID"),
        Shape::Scalar(name) => w.push_str(name),
        Shape::Composite { name: Some(name), .. } => w.push_str(name),
        Shape::Composite { name: None, .. } => return Err("anonymous composite has no input type name"),
    }
    if required {
        w.push('!');
    }
    Ok(())
}
