// Strongly-typed shape IR for query compilation. No runtime reflection here:
// every type states its own shape once, through `GraphQLShape`.
pub mod infer;

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of the native text scalar. Rendered as `ID` in argument types.
pub const TEXT_SCALAR: &str = "string";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar(String),          // terminal, never expanded
    Optional(Box<Shape>),    // nullable wrapper, never marked `!`
    List(Box<Shape>),        // `[inner]`
    Composite {
        /// Input-object name, needed only when the shape is passed as an argument.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Declaration order is emission order.
        fields: Vec<Field>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub ident: String,

    /// Verbatim override of the emitted field text: name, alias, arguments
    /// and directives, e.g. `items(first:$n)` or `a:b@include(if:$x)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql: Option<String>,

    /// Splice this field's children into the parent selection set.
    #[serde(default, skip_serializing_if = "is_false")]
    pub inline: bool,

    /// Expand once per entry of the repetition group named by this field.
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeat: bool,

    pub shape: Shape,
}

fn is_false(b: &bool) -> bool { !*b }

impl Shape {
    pub fn scalar(name: impl Into<String>) -> Self { Shape::Scalar(name.into()) }
    pub fn text() -> Self { Shape::Scalar(TEXT_SCALAR.to_string()) }
    pub fn optional(inner: Shape) -> Self { Shape::Optional(Box::new(inner)) }
    pub fn list(inner: Shape) -> Self { Shape::List(Box::new(inner)) }

    /// Output object: expands into a selection set.
    pub fn composite(fields: Vec<Field>) -> Self {
        Shape::Composite { name: None, fields }
    }

    /// Input object: usable as an argument type under `name`.
    pub fn input(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Shape::Composite { name: Some(name.into()), fields }
    }

    pub fn is_scalar(&self) -> bool { matches!(self, Shape::Scalar(_)) }
}

impl Field {
    pub fn new(ident: impl Into<String>, shape: Shape) -> Self {
        Self { ident: ident.into(), graphql: None, inline: false, repeat: false, shape }
    }

    /// Field typed by `T::shape()`.
    pub fn of<T: GraphQLShape + ?Sized>(ident: impl Into<String>) -> Self {
        Self::new(ident, T::shape())
    }

    pub fn graphql(mut self, text: impl Into<String>) -> Self {
        self.graphql = Some(text.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn repeat(mut self) -> Self {
        self.repeat = true;
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CLASSIFIER
// ————————————————————————————————————————————————————————————————————————————

/// Implemented by every type that can appear in a query shape or as an argument.
///
/// Composite types list their fields in declaration order:
///
/// ```
/// use gql_shape::shape::{Field, GraphQLShape, Shape};
///
/// struct Viewer { login: String, bio: Option<String> }
///
/// impl GraphQLShape for Viewer {
///     fn shape() -> Shape {
///         Shape::composite(vec![
///             Field::of::<String>("login"),
///             Field::of::<Option<String>>("bio"),
///         ])
///     }
/// }
/// ```
///
/// A type with its own JSON decoding is a custom scalar; declare it with
/// [`graphql_scalar!`](crate::graphql_scalar) so it is never expanded.
pub trait GraphQLShape {
    fn shape() -> Shape;
}

/// Classify `T` into its shape.
pub fn classify<T: GraphQLShape + ?Sized>() -> Shape {
    T::shape()
}

/// Declare types as terminal scalars with the given GraphQL name.
#[macro_export]
macro_rules! graphql_scalar {
    ($($ty:ty => $name:expr),+ $(,)?) => {
        $(
            impl $crate::shape::GraphQLShape for $ty {
                fn shape() -> $crate::shape::Shape {
                    $crate::shape::Shape::scalar($name)
                }
            }
        )+
    };
}

graphql_scalar! {
    bool => "Boolean",
    i8 => "Int", i16 => "Int", i32 => "Int", i64 => "Int", isize => "Int",
    u8 => "Int", u16 => "Int", u32 => "Int", u64 => "Int", usize => "Int",
    f32 => "Float", f64 => "Float",
    String => TEXT_SCALAR, str => TEXT_SCALAR, char => TEXT_SCALAR,
}

impl GraphQLShape for Cow<'_, str> {
    fn shape() -> Shape { Shape::text() }
}

// nullable
impl<T: GraphQLShape> GraphQLShape for Option<T> {
    fn shape() -> Shape { Shape::optional(T::shape()) }
}

// owning/borrowing pointers cannot be null in Rust; they are transparent
impl<T: GraphQLShape + ?Sized> GraphQLShape for &T {
    fn shape() -> Shape { T::shape() }
}
impl<T: GraphQLShape + ?Sized> GraphQLShape for Box<T> {
    fn shape() -> Shape { T::shape() }
}
impl<T: GraphQLShape + ?Sized> GraphQLShape for Rc<T> {
    fn shape() -> Shape { T::shape() }
}
impl<T: GraphQLShape + ?Sized> GraphQLShape for Arc<T> {
    fn shape() -> Shape { T::shape() }
}

// lists
impl<T: GraphQLShape> GraphQLShape for Vec<T> {
    fn shape() -> Shape { Shape::list(T::shape()) }
}
impl<T: GraphQLShape> GraphQLShape for [T] {
    fn shape() -> Shape { Shape::list(T::shape()) }
}
impl<T: GraphQLShape, const N: usize> GraphQLShape for [T; N] {
    fn shape() -> Shape { Shape::list(T::shape()) }
}
impl<T: GraphQLShape> GraphQLShape for VecDeque<T> {
    fn shape() -> Shape { Shape::list(T::shape()) }
}
impl<T: GraphQLShape> GraphQLShape for BTreeSet<T> {
    fn shape() -> Shape { Shape::list(T::shape()) }
}
impl<T: GraphQLShape, S> GraphQLShape for HashSet<T, S> {
    fn shape() -> Shape { Shape::list(T::shape()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DateTime;
    crate::graphql_scalar!(DateTime => "DateTime");

    #[test]
    fn wrappers_classify_one_level_at_a_time() {
        assert_eq!(classify::<i32>(), Shape::scalar("Int"));
        assert_eq!(classify::<Option<bool>>(), Shape::optional(Shape::scalar("Boolean")));
        assert_eq!(classify::<Vec<Option<String>>>(), Shape::list(Shape::optional(Shape::text())));
        assert_eq!(classify::<[f64; 3]>(), Shape::list(Shape::scalar("Float")));
        assert_eq!(classify::<Box<i64>>(), Shape::scalar("Int"));
        assert_eq!(classify::<&str>(), Shape::text());
    }

    #[test]
    fn custom_scalars_terminate() {
        assert!(classify::<DateTime>().is_scalar());
        assert_eq!(classify::<Option<DateTime>>(), Shape::optional(Shape::scalar("DateTime")));
    }

    #[test]
    fn shape_descriptors_read_from_json() {
        let src = serde_json::json!({
            "composite": { "fields": [
                { "ident": "Foo", "shape": { "scalar": "Int" } },
                { "ident": "items", "graphql": "items(id:$id)", "repeat": true,
                  "shape": { "list": { "composite": { "fields": [
                      { "ident": "id", "shape": { "scalar": "ID" } }
                  ] } } } }
            ] }
        });
        let shape: Shape = serde_json::from_value(src).unwrap();
        let Shape::Composite { name, fields } = shape else { panic!("expected composite") };
        assert_eq!(name, None);
        assert_eq!(fields.len(), 2);
        assert!(!fields[0].repeat && fields[1].repeat);
        assert_eq!(fields[1].graphql.as_deref(), Some("items(id:$id)"));
    }
}
