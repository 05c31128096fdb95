//! Request/response cycle around a pluggable transport.
//!
//! The client compiles the operation, hands the envelope to a [`Transport`],
//! folds repeated fields in the returned `data`, and decodes it into the
//! caller's type. Protocol-level `errors` are returned next to the data.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::arguments::{Arguments, Variables};
use crate::compile::{construct_mutation, construct_query, Document};
use crate::error::Result;
use crate::fold::fold_data;
use crate::path_de;
use crate::shape::GraphQLShape;

/// JSON body posted to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub query: String,
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    pub variables: Arguments,
}

impl From<Document> for Request {
    fn from(doc: Document) -> Self {
        Self { query: doc.text, variables: doc.variables }
    }
}

/// Response envelope before folding and decoding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<DataError>,
}

impl RawResponse {
    /// Parse a response body, reporting the JSON path of any mismatch.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        path_de::from_slice_with_path(body)
    }
}

/// An entry of the `errors` list in a GraphQL response.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DataError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Decoded data (if the server returned any) plus the server's errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub data: Option<T>,
    pub errors: Vec<DataError>,
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool { self.errors.is_empty() }
}

/// Sends one request to `url` and returns the parsed envelope.
///
/// Status handling, timeouts, cancellation and retries all live behind this
/// trait. Any `Fn(&str, &Request) -> Result<RawResponse>` is a transport.
pub trait Transport {
    fn execute(&self, url: &str, request: &Request) -> Result<RawResponse>;
}

impl<F> Transport for F
where
    F: Fn(&str, &Request) -> Result<RawResponse>,
{
    fn execute(&self, url: &str, request: &Request) -> Result<RawResponse> {
        self(url, request)
    }
}

pub struct Client<T> {
    url: String,
    transport: T,
}

impl<T: Transport> Client<T> {
    pub fn new(url: impl Into<String>, transport: T) -> Self {
        Self { url: url.into(), transport }
    }

    pub fn url(&self) -> &str { &self.url }

    /// Run a query shaped by `Q` and decode the result into it.
    pub fn query<Q>(&self, variables: Variables) -> Result<Response<Q>>
    where
        Q: GraphQLShape + DeserializeOwned,
    {
        let document = construct_query(&Q::shape(), variables)?;
        self.run(document)
    }

    /// Run a mutation shaped by `M` and decode the result into it.
    pub fn mutate<M>(&self, variables: Variables) -> Result<Response<M>>
    where
        M: GraphQLShape + DeserializeOwned,
    {
        let document = construct_mutation(&M::shape(), variables)?;
        self.run(document)
    }

    fn run<D: DeserializeOwned>(&self, document: Document) -> Result<Response<D>> {
        let operation = document.operation.keyword();
        let request = Request::from(document);
        let raw = self.transport.execute(&self.url, &request)?;
        if !raw.errors.is_empty() {
            tracing::warn!(
                operation,
                url = %self.url,
                count = raw.errors.len(),
                first = %raw.errors[0],
                "server reported errors"
            );
        }
        let data = match raw.data {
            None | Some(Value::Null) => None,
            Some(data) => Some(path_de::from_value_with_path(fold_data(data)?)?),
        };
        Ok(Response { data, errors: raw.errors })
    }
}
