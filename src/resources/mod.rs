//! Client, index and type resources.

mod client;
mod doc_type;
mod documents;
mod index;

pub use client::{connect, connect_with, Client, Connection};
pub use doc_type::DocType;
pub use documents::Documents;
pub use index::Index;

use serde_json::Value;

use crate::args::{render, truthy, Args};
use crate::error::{Error, Result};
use crate::http::Method;
use crate::response::Reply;

/// Result of a call made through `invoke`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Reply(Reply),
    /// Answer of an existence check.
    Exists(bool),
}

impl Outcome {
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Reply(reply) => reply.into_value(),
            Outcome::Exists(exists) => Value::Bool(exists),
        }
    }
}

/// Split off a required leading argument.
fn leading(values: Vec<Value>, op: &str) -> Result<(Value, Vec<Value>)> {
    let mut values = values.into_iter();
    let first = values
        .next()
        .ok_or_else(|| Error::invalid_argument(format!("`{op}` needs an argument")))?;
    Ok((first, values.collect()))
}

/// Split off a required leading name or id.
fn leading_string(values: Vec<Value>, op: &str) -> Result<(String, Vec<Value>)> {
    let (first, rest) = leading(values, op)?;
    if !truthy(&first) || first.is_object() {
        return Err(Error::invalid_argument(format!(
            "`{op}` needs a name, got {first}"
        )));
    }
    Ok((render(&first), rest))
}

fn unknown(op: &str) -> Error {
    Error::invalid_argument(format!("unknown operation `{op}`"))
}

/// Calls that read without a body and write with one.
fn put_or_get(args: &Args) -> Method {
    if args.document().is_some() {
        Method::Put
    } else {
        Method::Get
    }
}
