/*!
# routedoc

Fluent OpenAPI 3.0 documentation for HTTP routes.

Routes are declared once and documented in place: each decoration call merges
into the operation the route already carries, so tags, parameters and responses
can be layered by independent helpers. A [`DocumentGenerator`] then walks a
[`Routes`] table and assembles a single specification, resolving inter-route
links and collecting every named schema into `components`.

## Features

- Route-owned documentation state, no global side tables
- Parameters, bodies and responses from example values, Rust types or raw schemas
- Deduplicated component schemas and examples
- Bearer, basic, API key and OAuth2 security schemes
- Links between routes resolved at generation time
- Specification grouping by id, JSON and YAML export

## Usage

```rust,no_run
use routedoc::{DocumentConfig, DocumentGenerator, OperationDoc, ResponseDoc, Routes};
use serde_json::json;

let mut routes = Routes::new();
routes
    .get("/users/{id}")
    .unwrap()
    .openapi(OperationDoc::new().tag("users").summary("Fetch a user"))
    .response(ResponseDoc::ok().body(json!({"id": 1, "name": "Ada"})));

let mut generator = DocumentGenerator::new(DocumentConfig::new("Users API", "1.0.0"));
let spec = generator.generate(&routes, None).unwrap();
assert!(spec.paths.contains_key("/users/{id}"));
```
*/

extern crate self as routedoc;

// Re-export main types
pub use crate::{
    config::DocumentConfig,
    docs::{AuthScheme, LinkKey, LinkLocation, RouteDocs, RouteLink},
    document::{DocumentGenerator, OutputFormat},
    error::{RouteDocError, RouteDocResult},
    headers::{EmptyObject, HeadersType},
    legacy::LegacyOperationDoc,
    operation::{OperationContext, OperationDoc},
    responses::ResponseDoc,
    route::{HttpMethod, PathComponent, Route, RoutePathError, Routes},
    schema::{infer_schema, ApiExample, ApiSchema, ExampleRegistry, SchemaRegistry},
    specification::{OpenApiSpec, ReferenceOr, ResponseKey, Schema},
    validation::{validate_spec, ValidationLevel, ValidationWarning},
    value::{ContentType, ExampleValue, OpenApiBody, OpenApiParameters, OpenApiValue, TypeDescriptor},
};

// Re-export the derive macro from the proc-macro crate
pub use routedoc_derive::ApiSchema;

// Core modules
pub mod config;
pub mod error;
pub mod route;
pub mod specification;

// Schema generation
pub mod headers;
pub mod schema;
pub mod value;

// Route decoration
pub mod docs;
pub mod legacy;
pub mod operation;
pub mod responses;

// Document assembly
pub mod document;
pub mod validation;
