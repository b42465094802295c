//! Header bag contract.
//!
//! A header bag type lists the request headers a route reads and, through
//! [`HeadersType::Cookies`], the cookies it reads. Only the field layout is
//! documented here; encoding and decoding belong to the HTTP layer.

use serde::{Deserialize, Serialize};

use crate::schema::{ApiSchema, SchemaRegistry};
use crate::specification::Schema;

/// A typed collection of request headers
pub trait HeadersType: ApiSchema {
    /// Cookies carried alongside the headers; [`EmptyObject`] when there are none
    type Cookies: ApiSchema;
}

/// Object without fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyObject {}

impl ApiSchema for EmptyObject {
    fn api_schema(_registry: &mut SchemaRegistry) -> Schema {
        Schema::of_type("object")
    }
}
