//! OpenAPI 3.0 object model populated by the route documentation layer.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::route::HttpMethod;

/// Prefix of component schema references
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Prefix of component example references
pub const EXAMPLE_REF_PREFIX: &str = "#/components/examples/";

/// Complete OpenAPI 3.0 specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI specification version
    pub openapi: String,

    /// API metadata
    pub info: ApiInfo,

    /// Server URLs
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,

    /// API paths and operations
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// Global security requirements
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,

    /// Tags for grouping operations
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,

    /// External documentation
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,
}

/// API metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title
    pub title: String,

    /// API description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Terms of service URL
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none", default)]
    pub terms_of_service: Option<String>,

    /// Contact information
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contact: Option<Contact>,

    /// License information
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub license: Option<License>,

    /// API version
    pub version: String,
}

/// Contact information
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

/// License information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL
    pub url: String,

    /// Server description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Variable substitutions for server URL
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }
}

/// Server URL variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    /// Default value
    pub default: String,

    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Path item containing operations for a specific path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathItem {
    /// Optional summary
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace: Option<Operation>,

    /// Common parameters for all operations on this path
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<ReferenceOr<Parameter>>,
}

impl PathItem {
    /// Operation slot for an HTTP method
    pub fn operation_mut(&mut self, method: &HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::GET => &mut self.get,
            HttpMethod::PUT => &mut self.put,
            HttpMethod::POST => &mut self.post,
            HttpMethod::DELETE => &mut self.delete,
            HttpMethod::OPTIONS => &mut self.options,
            HttpMethod::HEAD => &mut self.head,
            HttpMethod::PATCH => &mut self.patch,
            HttpMethod::TRACE => &mut self.trace,
        }
    }

    /// All operations defined on this path, in method order
    pub fn operations(&self) -> Vec<(HttpMethod, &Operation)> {
        [
            (HttpMethod::GET, &self.get),
            (HttpMethod::PUT, &self.put),
            (HttpMethod::POST, &self.post),
            (HttpMethod::DELETE, &self.delete),
            (HttpMethod::OPTIONS, &self.options),
            (HttpMethod::HEAD, &self.head),
            (HttpMethod::PATCH, &self.patch),
            (HttpMethod::TRACE, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
        .collect()
    }
}

/// Callback object: runtime expression to the path item it calls
pub type Callback = IndexMap<String, PathItem>;

/// Responses keyed by status code
pub type Responses = BTreeMap<ResponseKey, Response>;

/// HTTP operation (GET, POST, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Operation {
    /// Tags for grouping
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    /// Short summary
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,

    /// Long description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// External documentation
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none", default)]
    pub external_docs: Option<ExternalDocumentation>,

    /// Unique operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none", default)]
    pub operation_id: Option<String>,

    /// Parameters, at most one per (location, name)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<Vec<ReferenceOr<Parameter>>>,

    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none", default)]
    pub request_body: Option<ReferenceOr<RequestBody>>,

    /// Possible responses
    #[serde(default)]
    pub responses: Responses,

    /// Out-of-band callbacks
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub callbacks: Option<IndexMap<String, ReferenceOr<Callback>>>,

    /// Deprecated flag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deprecated: Option<bool>,

    /// Security requirements; `Some(vec![])` removes inherited security
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Servers specific to this operation
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub servers: Option<Vec<Server>>,
}

/// Where a parameter travels in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// Parameter for operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Parameter location (query, header, path, cookie)
    #[serde(rename = "in")]
    pub location: ParameterLocation,

    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Required flag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required: Option<bool>,

    /// Deprecated flag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deprecated: Option<bool>,

    /// Schema defining the parameter
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<ReferenceOr<Schema>>,

    /// Example value
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,
}

impl Parameter {
    /// Create a parameter with a schema
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: ReferenceOr<Schema>) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required: None,
            deprecated: None,
            schema: Some(schema),
            example: None,
        }
    }
}

/// Request body specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Media type content
    pub content: IndexMap<String, MediaType>,

    /// Required flag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required: Option<bool>,
}

/// Key of a responses map: a literal status code or `default`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResponseKey {
    Code(u16),
    Default,
}

impl ResponseKey {
    /// Numeric status code, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            ResponseKey::Code(code) => Some(*code),
            ResponseKey::Default => None,
        }
    }
}

impl Default for ResponseKey {
    fn default() -> Self {
        ResponseKey::Code(200)
    }
}

impl From<u16> for ResponseKey {
    fn from(code: u16) -> Self {
        ResponseKey::Code(code)
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKey::Code(code) => write!(f, "{}", code),
            ResponseKey::Default => write!(f, "default"),
        }
    }
}

impl FromStr for ResponseKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(ResponseKey::Default);
        }
        s.parse::<u16>()
            .map(ResponseKey::Code)
            .map_err(|_| format!("invalid response key: {}", s))
    }
}

impl Serialize for ResponseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResponseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Response specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Description
    #[serde(default)]
    pub description: String,

    /// Headers
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub headers: IndexMap<String, ReferenceOr<Header>>,

    /// Content
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub content: IndexMap<String, MediaType>,

    /// Links to other operations
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub links: IndexMap<String, ReferenceOr<Link>>,
}

/// Header specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<ReferenceOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,
}

/// Media type specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<ReferenceOr<Schema>>,

    /// Example value
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,

    /// Multiple examples
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub examples: IndexMap<String, ReferenceOr<Example>>,
}

/// Example specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<serde_json::Value>,
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none", default)]
    pub external_value: Option<String>,
}

/// Link specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "operationRef", skip_serializing_if = "Option::is_none", default)]
    pub operation_ref: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none", default)]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub parameters: IndexMap<String, serde_json::Value>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none", default)]
    pub request_body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Schema for data types
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Schema title
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,

    /// Data type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub schema_type: Option<String>,

    /// Format specifier
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nullable: Option<bool>,

    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub properties: IndexMap<String, ReferenceOr<Schema>>,

    /// Required properties
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,

    /// Additional properties schema
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none", default)]
    pub additional_properties: Option<Box<ReferenceOr<Schema>>>,

    /// Items schema for arrays
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<Box<ReferenceOr<Schema>>>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty", default)]
    pub all_of: Vec<ReferenceOr<Schema>>,

    #[serde(rename = "anyOf", skip_serializing_if = "Vec::is_empty", default)]
    pub any_of: Vec<ReferenceOr<Schema>>,

    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty", default)]
    pub one_of: Vec<ReferenceOr<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub maximum: Option<f64>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none", default)]
    pub min_length: Option<usize>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none", default)]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<String>,
}

impl Schema {
    /// Schema with only a `type`
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    /// Schema with a `type` and `format`
    pub fn with_format(schema_type: &str, format: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: Some(format.to_string()),
            ..Default::default()
        }
    }

    /// Array schema
    pub fn array(items: ReferenceOr<Schema>) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Whether this schema describes an object with properties
    pub fn is_object(&self) -> bool {
        self.schema_type.as_deref() == Some("object") || !self.properties.is_empty()
    }
}

/// Reusable components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub schemas: IndexMap<String, ReferenceOr<Schema>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub responses: IndexMap<String, ReferenceOr<Response>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub parameters: IndexMap<String, ReferenceOr<Parameter>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub examples: IndexMap<String, ReferenceOr<Example>>,

    #[serde(rename = "requestBodies", skip_serializing_if = "IndexMap::is_empty", default)]
    pub request_bodies: IndexMap<String, ReferenceOr<RequestBody>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub headers: IndexMap<String, ReferenceOr<Header>>,

    #[serde(rename = "securitySchemes", skip_serializing_if = "IndexMap::is_empty", default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub links: IndexMap<String, ReferenceOr<Link>>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
    }
}

/// Security scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ParameterLocation,
    },
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none", default)]
        bearer_format: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 { flows: OAuth2Flows },
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
    },
}

/// OAuth2 flows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OAuth2Flows {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub implicit: Option<OAuth2Flow>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub password: Option<OAuth2Flow>,
    #[serde(rename = "clientCredentials", skip_serializing_if = "Option::is_none", default)]
    pub client_credentials: Option<OAuth2Flow>,
    #[serde(rename = "authorizationCode", skip_serializing_if = "Option::is_none", default)]
    pub authorization_code: Option<OAuth2Flow>,
}

/// OAuth2 flow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OAuth2Flow {
    #[serde(rename = "authorizationUrl", skip_serializing_if = "Option::is_none", default)]
    pub authorization_url: Option<String>,
    #[serde(rename = "tokenUrl", skip_serializing_if = "Option::is_none", default)]
    pub token_url: Option<String>,
    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none", default)]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: IndexMap<String, String>,
}

/// Security requirement: scheme name to required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Tag for grouping operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none", default)]
    pub external_docs: Option<ExternalDocumentation>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::new(name)
    }
}

/// External documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocumentation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Either an inline value or a `$ref` to a reusable component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

impl<T> ReferenceOr<T> {
    pub fn reference(reference: impl Into<String>) -> Self {
        ReferenceOr::Reference {
            reference: reference.into(),
        }
    }

    /// Inline value, if this is not a reference
    pub fn as_item(&self) -> Option<&T> {
        match self {
            ReferenceOr::Item(item) => Some(item),
            ReferenceOr::Reference { .. } => None,
        }
    }

    /// Reference target, if this is a reference
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            ReferenceOr::Reference { reference } => Some(reference),
            ReferenceOr::Item(_) => None,
        }
    }
}

impl<T> From<T> for ReferenceOr<T> {
    fn from(item: T) -> Self {
        ReferenceOr::Item(item)
    }
}

impl OpenApiSpec {
    /// Create a new OpenAPI specification
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            openapi: "3.0.3".to_string(),
            info: ApiInfo {
                title: title.to_string(),
                description: None,
                terms_of_service: None,
                contact: None,
                license: None,
                version: version.to_string(),
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: None,
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_key_ordering_and_serialization() {
        let mut responses = Responses::new();
        responses.insert(ResponseKey::Default, Response::default());
        responses.insert(ResponseKey::Code(404), Response::default());
        responses.insert(ResponseKey::Code(200), Response::default());

        let keys: Vec<String> = responses.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["200", "404", "default"]);

        let value = serde_json::to_value(&responses).unwrap();
        assert!(value.get("200").is_some());
        assert!(value.get("default").is_some());

        let parsed: Responses = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_reference_serializes_as_dollar_ref() {
        let schema: ReferenceOr<Schema> = ReferenceOr::reference("#/components/schemas/User");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"$ref": "#/components/schemas/User"})
        );

        let inline: ReferenceOr<Schema> = serde_json::from_value(json!({"type": "string"})).unwrap();
        assert_eq!(inline.as_item().and_then(|s| s.schema_type.as_deref()), Some("string"));
    }

    #[test]
    fn test_explicit_empty_security_is_serialized() {
        let operation = Operation {
            security: Some(Vec::new()),
            ..Default::default()
        };
        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(value["security"], json!([]));

        let inherited = serde_json::to_value(Operation::default()).unwrap();
        assert!(inherited.get("security").is_none());
    }

    #[test]
    fn test_path_item_operation_slots() {
        let mut item = PathItem::default();
        *item.operation_mut(&HttpMethod::POST) = Some(Operation::default());
        let methods: Vec<HttpMethod> = item.operations().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::POST]);
    }
}
