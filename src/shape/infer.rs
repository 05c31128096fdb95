//! Shape inference for untyped JSON argument values.
//!
//! Typed callers hand over a `Shape` with each argument. Values that arrive
//! as plain JSON (CLI variable files) are classified here instead: scalars by
//! their JSON kind, lists by the join of their elements. Anything that has no
//! nameable GraphQL type is refused with a short reason.

use serde_json::Value;

use super::Shape;

const INT: &str = "Int";
const FLOAT: &str = "Float";
const BOOLEAN: &str = "Boolean";

pub fn observe_value(v: &Value) -> Result<Shape, &'static str> {
    match v {
        Value::Null => Err("untyped null"),
        Value::Bool(_) => Ok(Shape::scalar(BOOLEAN)),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(Shape::scalar(INT))
            } else {
                Ok(Shape::scalar(FLOAT))
            }
        }
        Value::String(_) => Ok(Shape::text()),
        Value::Array(xs) => observe_array(xs),
        Value::Object(_) => Err("anonymous object has no input type name"),
    }
}

fn observe_array(xs: &[Value]) -> Result<Shape, &'static str> {
    let mut nullable = false;
    let mut item: Option<Shape> = None;
    for el in xs {
        if el.is_null() {
            nullable = true;
            continue;
        }
        let obs = observe_value(el)?;
        item = Some(match item {
            None => obs,
            Some(prev) => join(prev, obs)?,
        });
    }
    let item = match item {
        Some(x) => x,
        None if xs.is_empty() => return Err("empty list has no element type"),
        None => return Err("list of nulls has no element type"),
    };
    let item = if nullable { Shape::optional(item) } else { item };
    Ok(Shape::list(item))
}

// Int ⊔ Float = Float; lists join element-wise; anything else must agree.
fn join(a: Shape, b: Shape) -> Result<Shape, &'static str> {
    match (a, b) {
        (a, b) if a == b => Ok(a),
        (Shape::Scalar(x), Shape::Scalar(y))
            if (x == INT || x == FLOAT) && (y == INT || y == FLOAT) =>
        {
            Ok(Shape::scalar(FLOAT))
        }
        (Shape::Optional(x), y) | (y, Shape::Optional(x)) => {
            Ok(Shape::optional(join(*x, strip_optional(y))?))
        }
        (Shape::List(x), Shape::List(y)) => Ok(Shape::list(join(*x, *y)?)),
        _ => Err("heterogeneous list"),
    }
}

fn strip_optional(s: Shape) -> Shape {
    match s {
        Shape::Optional(inner) => *inner,
        other => other,
    }
}
