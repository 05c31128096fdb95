//! Typed shapes → minified GraphQL documents, and JSON responses → typed values.
//!
//! Pipeline:
//! - [`shape`]: every type states its [`Shape`](shape::Shape) through
//!   [`GraphQLShape`](shape::GraphQLShape).
//! - [`arguments`] + [`compile`]: shape and variables become a [`Document`]
//!   (`query($a:Int!){...}`), with repetition groups exploded into per-copy
//!   variables.
//! - [`fold`]: `name__N` keys of the response are folded back into lists.
//! - [`client`]: ties the above to a [`Transport`](client::Transport) and
//!   decodes with JSON-path errors.
pub mod arguments;
pub mod client;
pub mod compile;
pub mod error;
pub mod fold;
pub mod ident;
pub mod path_de;
pub mod shape;

pub use arguments::{encode_arguments, Argument, Arguments, Variable, Variables};
pub use client::{Client, DataError, RawResponse, Request, Response, Transport};
pub use compile::{compile_selection, construct_mutation, construct_query, Document, Operation};
pub use error::{Error, Result};
pub use fold::{fold_data, fold_repetitions};
pub use shape::{classify, Field, GraphQLShape, Shape};
