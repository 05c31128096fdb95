//! Shape → minified GraphQL document.
//!
//! `compile_selection` walks a [`Shape`] and writes its selection set;
//! `construct_query`/`construct_mutation` add the operation header and
//! explode repetition groups into per-copy variables.
use std::borrow::Cow;

use indexmap::map::Entry;

use crate::arguments::{encode_arguments, Argument, Arguments, Variable, Variables};
use crate::error::{Error, Result};
use crate::ident;
use crate::shape::{Field, GraphQLShape, Shape};

/// Separator between a repeated field's name and its copy index.
pub const REPETITION_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Mutation,
}

impl Operation {
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Mutation => "mutation",
        }
    }
}

/// Document text plus the variables to send alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub operation: Operation,
    pub text: String,
    pub variables: Arguments,
}

pub fn construct_query(shape: &Shape, variables: Variables) -> Result<Document> {
    construct(Operation::Query, shape, variables)
}

pub fn construct_mutation(shape: &Shape, variables: Variables) -> Result<Document> {
    construct(Operation::Mutation, shape, variables)
}

/// Same as [`construct_query`] with the shape taken from `Q`.
pub fn query_for<Q: GraphQLShape + ?Sized>(variables: Variables) -> Result<Document> {
    construct_query(&Q::shape(), variables)
}

/// Same as [`construct_mutation`] with the shape taken from `M`.
pub fn mutation_for<M: GraphQLShape + ?Sized>(variables: Variables) -> Result<Document> {
    construct_mutation(&M::shape(), variables)
}

fn construct(operation: Operation, shape: &Shape, variables: Variables) -> Result<Document> {
    let selection = compile_selection(shape, false, &variables)?;
    let variables = explode_variables(variables)?;
    let text = if !variables.is_empty() {
        format!("{}({}){selection}", operation.keyword(), encode_arguments(&variables)?)
    } else {
        match operation {
            Operation::Query => selection,  // anonymous query shorthand
            Operation::Mutation => format!("mutation{selection}"),
        }
    };
    tracing::debug!(operation = operation.keyword(), document = %text, "compiled document");
    Ok(Document { operation, text, variables })
}

/// Flatten repetition groups into `name__index__subkey` entries; plain
/// values keep their key. A flattened key may not shadow a plain one.
pub fn explode_variables(variables: Variables) -> Result<Arguments> {
    let mut out = Arguments::with_capacity(variables.len());
    for (name, variable) in variables {
        match variable {
            Variable::Value(arg) => insert_unique(&mut out, name, arg)?,
            Variable::Group(group) => {
                for (index, repetition) in group.into_iter().enumerate() {
                    for (sub_key, arg) in repetition {
                        insert_unique(&mut out, repetition_variable(&name, index, &sub_key), arg)?;
                    }
                }
            }
        }
    }
    Ok(out)
}

fn insert_unique(out: &mut Arguments, name: String, arg: Argument) -> Result<()> {
    match out.entry(name) {
        Entry::Occupied(e) => Err(Error::VariableCollision { name: e.key().clone() }),
        Entry::Vacant(e) => {
            e.insert(arg);
            Ok(())
        }
    }
}

fn repetition_variable(name: &str, index: usize, sub_key: &str) -> String {
    format!("{name}{REPETITION_SEPARATOR}{index}{REPETITION_SEPARATOR}{sub_key}")
}

// ————————————————————————————————————————————————————————————————————————————
// SELECTION SETS
// ————————————————————————————————————————————————————————————————————————————

/// Minified selection set for `shape`.
///
/// E.g. `{Foo: i32, BarBaz: Option<bool>}` → `{foo,barBaz}`.
/// With `inline`, a composite's fields are written without the enclosing braces.
pub fn compile_selection(shape: &Shape, inline: bool, variables: &Variables) -> Result<String> {
    let mut buf = String::new();
    write_selection(&mut buf, shape, inline, variables)?;
    Ok(buf)
}

fn write_selection(w: &mut String, shape: &Shape, inline: bool, variables: &Variables) -> Result<()> {
    match shape {
        Shape::Scalar(_) => Ok(()),
        Shape::Optional(inner) | Shape::List(inner) => write_selection(w, inner, false, variables),
        Shape::Composite { fields, .. } => {
            if !inline {
                w.push('{');
            }
            let mut wrote_any = false;
            for field in fields {
                let rollback = w.len();
                if wrote_any {
                    w.push(',');
                }
                let start = w.len();
                write_field(w, field, variables)?;
                if w.len() == start {
                    // nothing selected (e.g. zero repetitions); drop the comma
                    w.truncate(rollback);
                } else {
                    wrote_any = true;
                }
            }
            if !inline {
                w.push('}');
            }
            Ok(())
        }
    }
}

fn write_field(w: &mut String, field: &Field, variables: &Variables) -> Result<()> {
    if field.repeat {
        return write_repeated_field(w, field, variables);
    }
    w.push_str(&emitted_name(field));
    write_selection(w, &field.shape, field.inline, variables)
}

fn write_repeated_field(w: &mut String, field: &Field, variables: &Variables) -> Result<()> {
    if field.inline {
        return Err(Error::RepeatOnInlineField { field: field.ident.clone() });
    }
    let emitted = emitted_name(field);
    let variable = variable_name(&emitted);
    let times = match variables.get(variable) {
        Some(Variable::Group(group)) => group.len(),
        Some(Variable::Value(_)) => {
            return Err(Error::NotARepetitionGroup {
                field: field.ident.clone(),
                variable: variable.to_string(),
            });
        }
        None => {
            return Err(Error::MissingRepetitionVariable {
                field: field.ident.clone(),
                variable: variable.to_string(),
            });
        }
    };
    for i in 0..times {
        if i != 0 {
            w.push(',');
        }
        let copy = format!("{variable}{REPETITION_SEPARATOR}{i}");
        w.push_str(&copy);
        w.push(':');
        // each copy gets its own `$copy__name` variables
        w.push_str(&emitted.replace('$', &format!("${copy}{REPETITION_SEPARATOR}")));
        write_selection(w, &field.shape, field.inline, variables)?;
    }
    Ok(())
}

fn emitted_name(field: &Field) -> Cow<'_, str> {
    if field.inline {
        return Cow::Borrowed("");
    }
    match &field.graphql {
        Some(text) => Cow::Borrowed(text.as_str()),
        None => Cow::Owned(ident::to_lower_camel_case(&field.ident)),
    }
}

/// The bare field (or alias) name of an override: everything before the first
/// argument, alias, list, variable, non-null or directive marker.
pub fn variable_name(emitted: &str) -> &str {
    match emitted.find(['(', ':', '[', '$', '!', '@']) {
        Some(i) => &emitted[..i],
        None => emitted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn no_vars() -> Variables {
        Variables::new()
    }

    fn item() -> Shape {
        Shape::composite(vec![Field::of::<String>("id"), Field::of::<Option<String>>("title")])
    }

    fn group(ids: &[i64]) -> Variable {
        Variable::group(ids.iter().map(|id| {
            let mut m = IndexMap::new();
            m.insert("id".to_string(), Argument::new(id).unwrap());
            m
        }))
    }

    #[test]
    fn scalar_fields_in_declared_order() {
        let shape = Shape::composite(vec![
            Field::of::<i32>("Foo"),
            Field::of::<Option<bool>>("BarBaz"),
        ]);
        assert_eq!(compile_selection(&shape, false, &no_vars()).unwrap(), "{foo,barBaz}");

        let doc = construct_query(&shape, no_vars()).unwrap();
        assert_eq!(doc.text, "{foo,barBaz}");
        assert!(doc.variables.is_empty());

        let shape = Shape::composite(vec![Field::of::<i32>("zeta"), Field::of::<i32>("alpha")]);
        assert_eq!(compile_selection(&shape, false, &no_vars()).unwrap(), "{zeta,alpha}");
    }

    #[test]
    fn nested_lists_and_optionals_expand() {
        let shape = Shape::composite(vec![
            Field::new("viewer", Shape::optional(Shape::composite(vec![
                Field::of::<String>("login"),
                Field::new("repositories", Shape::list(item())).graphql("repositories(first:$first)"),
            ]))),
        ]);
        assert_eq!(
            compile_selection(&shape, false, &no_vars()).unwrap(),
            "{viewer{login,repositories(first:$first){id,title}}}"
        );
    }

    #[test]
    fn overrides_are_verbatim() {
        let shape = Shape::composite(vec![
            Field::of::<String>("name").graphql("fullName:name@include(if:$withName)"),
            Field::of::<i32>("count").graphql("total"),
        ]);
        assert_eq!(
            compile_selection(&shape, false, &no_vars()).unwrap(),
            "{fullName:name@include(if:$withName),total}"
        );
    }

    #[test]
    fn inline_fields_splice_into_parent() {
        let common = Shape::composite(vec![Field::of::<String>("id"), Field::of::<String>("url")]);
        let shape = Shape::composite(vec![
            Field::new("Common", common).inline(),
            Field::of::<String>("login"),
        ]);
        assert_eq!(compile_selection(&shape, false, &no_vars()).unwrap(), "{id,url,login}");
        assert_eq!(compile_selection(&shape, true, &no_vars()).unwrap(), "id,url,login");
    }

    #[test]
    fn inline_fragment_override() {
        let shape = Shape::composite(vec![
            Field::new("on_user", Shape::composite(vec![Field::of::<String>("login")]))
                .graphql("... on User"),
        ]);
        assert_eq!(compile_selection(&shape, false, &no_vars()).unwrap(), "{... on User{login}}");
    }

    #[test]
    fn custom_scalars_are_not_expanded() {
        let shape = Shape::composite(vec![
            Field::new("createdAt", Shape::scalar("DateTime")),
            Field::new("tags", Shape::list(Shape::text())),
        ]);
        assert_eq!(compile_selection(&shape, false, &no_vars()).unwrap(), "{createdAt,tags}");
    }

    #[test]
    fn repeat_expansion_copies_per_group_entry() {
        let shape = Shape::composite(vec![
            Field::new("Items", item()).graphql("items(id:$id)").repeat(),
            Field::of::<String>("title"),
        ]);
        let mut vars = Variables::new();
        vars.insert("items".to_string(), group(&[1, 2]));

        assert_eq!(
            compile_selection(&shape, false, &vars).unwrap(),
            "{items__0:items(id:$items__0__id){id,title},items__1:items(id:$items__1__id){id,title},title}"
        );

        let doc = construct_query(&shape, vars).unwrap();
        assert_eq!(
            doc.text,
            "query($items__0__id:Int!$items__1__id:Int!){items__0:items(id:$items__0__id){id,title},items__1:items(id:$items__1__id){id,title},title}"
        );
        assert!(!doc.variables.contains_key("items"));
        assert_eq!(doc.variables["items__0__id"].value(), &json!(1));
        assert_eq!(doc.variables["items__1__id"].value(), &json!(2));
    }

    #[test]
    fn repeat_without_override_uses_camel_case_name() {
        let shape = Shape::composite(vec![Field::new("node_list", item()).repeat()]);
        let mut vars = Variables::new();
        vars.insert("nodeList".to_string(), Variable::group(Vec::<Vec<(String, Argument)>>::from([vec![]])));
        assert_eq!(
            compile_selection(&shape, false, &vars).unwrap(),
            "{nodeList__0:nodeList{id,title}}"
        );
    }

    #[test]
    fn zero_repetitions_emit_nothing() {
        let shape = Shape::composite(vec![
            Field::of::<String>("first"),
            Field::new("Items", item()).graphql("items(id:$id)").repeat(),
            Field::of::<String>("last"),
        ]);
        let mut vars = Variables::new();
        vars.insert("items".to_string(), group(&[]));
        assert_eq!(compile_selection(&shape, false, &vars).unwrap(), "{first,last}");

        // the empty group leaves no variables behind, so no header either
        let doc = construct_query(&shape, vars).unwrap();
        assert_eq!(doc.text, "{first,last}");
    }

    #[test]
    fn malformed_repetition_references_fail() {
        let shape = Shape::composite(vec![Field::new("Items", item()).graphql("items(id:$id)").repeat()]);

        let err = compile_selection(&shape, false, &no_vars()).unwrap_err();
        assert!(matches!(err, Error::MissingRepetitionVariable { ref variable, .. } if variable == "items"));

        let mut vars = Variables::new();
        vars.insert("items".to_string(), Variable::value(&5i32).unwrap());
        let err = compile_selection(&shape, false, &vars).unwrap_err();
        assert!(matches!(err, Error::NotARepetitionGroup { .. }));

        let inline = Shape::composite(vec![Field::new("Items", item()).inline().repeat()]);
        let err = compile_selection(&inline, false, &no_vars()).unwrap_err();
        assert!(matches!(err, Error::RepeatOnInlineField { .. }));
    }

    #[test]
    fn mutation_header() {
        let shape = Shape::composite(vec![
            Field::new("addStar", Shape::composite(vec![Field::of::<String>("clientMutationId")]))
                .graphql("addStar(input:$input)"),
        ]);
        let doc = construct_mutation(&shape, no_vars()).unwrap();
        assert_eq!(doc.text, "mutation{addStar(input:$input){clientMutationId}}");

        let mut vars = Variables::new();
        vars.insert(
            "input".to_string(),
            Argument::typed(json!({"starrableId": "r1"}), Shape::input("AddStarInput", vec![])).into(),
        );
        let doc = construct_mutation(&shape, vars).unwrap();
        assert_eq!(doc.operation, Operation::Mutation);
        assert_eq!(
            doc.text,
            "mutation($input:AddStarInput!){addStar(input:$input){clientMutationId}}"
        );
    }

    #[test]
    fn mutations_explode_groups_like_queries() {
        let shape = Shape::composite(vec![
            Field::new("AddStar", Shape::composite(vec![Field::of::<String>("clientMutationId")]))
                .graphql("addStar(id:$id)")
                .repeat(),
        ]);
        let mut vars = Variables::new();
        vars.insert("addStar".to_string(), group(&[7]));
        let doc = construct_mutation(&shape, vars).unwrap();
        assert_eq!(
            doc.text,
            "mutation($addStar__0__id:Int!){addStar__0:addStar(id:$addStar__0__id){clientMutationId}}"
        );
    }

    #[test]
    fn flattened_keys_may_not_shadow_plain_variables() {
        let shape = Shape::composite(vec![
            Field::of::<String>("a").graphql("a(x:$items__0__id)"),
            Field::new("Items", item()).graphql("items(id:$id)").repeat(),
        ]);
        // plain value first, then the group that would overwrite it
        let mut vars = Variables::new();
        vars.insert("items__0__id".to_string(), Variable::value("s").unwrap());
        vars.insert("items".to_string(), group(&[5]));
        let err = construct_query(&shape, vars).unwrap_err();
        assert!(matches!(err, Error::VariableCollision { ref name } if name == "items__0__id"));

        // and the other way round
        let mut vars = Variables::new();
        vars.insert("items".to_string(), group(&[5]));
        vars.insert("items__0__id".to_string(), Variable::value("s").unwrap());
        assert!(matches!(explode_variables(vars), Err(Error::VariableCollision { .. })));
    }

    #[test]
    fn variable_name_stops_at_markers() {
        assert_eq!(variable_name("items"), "items");
        assert_eq!(variable_name("items(first:$n)"), "items");
        assert_eq!(variable_name("alias:field"), "alias");
        assert_eq!(variable_name("field@skip(if:$x)"), "field");
        assert_eq!(variable_name("$weird"), "");
    }
}
