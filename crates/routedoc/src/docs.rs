//! Per-route documentation record and the auth/link vocabulary it stores.

use indexmap::IndexMap;
use std::any::TypeId;

use crate::route::HttpMethod;
use crate::schema::{ExampleRegistry, SchemaRegistry};
use crate::specification::{
    OAuth2Flows, Operation, ParameterLocation, SecurityRequirement, SecurityScheme, Tag,
};

/// Documentation accumulated on a route by successive decoration calls
#[derive(Debug, Clone, Default)]
pub struct RouteDocs {
    /// Operation built so far; `None` until the first decoration
    pub operation: Option<Operation>,
    /// Named schemas referenced by the operation
    pub schemas: SchemaRegistry,
    /// Named examples referenced by the operation
    pub examples: ExampleRegistry,
    /// Tags, unique by name
    pub tags: Vec<Tag>,
    /// Auth schemes; `Some(vec![])` documents the route as public
    pub auths: Option<Vec<AuthScheme>>,
    /// Values this route produces or consumes that can link operations
    pub links: IndexMap<RouteLink, LinkKey>,
    /// Document the route belongs to
    pub spec_id: Option<String>,
    pub exclude_from_openapi: bool,
    /// Method override used when documenting the route
    pub openapi_method: Option<HttpMethod>,
}

impl RouteDocs {
    /// Add tags not already present, keeping the first occurrence of a name
    pub fn merge_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = Tag>,
    {
        for tag in tags {
            if !self.tags.iter().any(|existing| existing.name == tag.name) {
                self.tags.push(tag);
            }
        }
    }

    /// Append auth schemes, skipping ids already present
    pub fn merge_auths<I>(&mut self, auths: I)
    where
        I: IntoIterator<Item = AuthScheme>,
    {
        let current = self.auths.get_or_insert_with(Vec::new);
        for auth in auths {
            if !current.iter().any(|existing| existing.id == auth.id) {
                current.push(auth);
            }
        }
    }

    /// Security requirements for the stored auth schemes, any one of which suffices
    pub fn security(&self) -> Option<Vec<SecurityRequirement>> {
        self.auths
            .as_ref()
            .map(|auths| auths.iter().map(AuthScheme::requirement).collect())
    }
}

/// A named security scheme together with the scopes a route needs
#[derive(Debug, Clone, PartialEq)]
pub struct AuthScheme {
    /// Key under `components.securitySchemes`
    pub id: String,
    pub scheme: SecurityScheme,
    pub scopes: Vec<String>,
}

impl AuthScheme {
    pub fn new(id: impl Into<String>, scheme: SecurityScheme) -> Self {
        Self {
            id: id.into(),
            scheme,
            scopes: Vec::new(),
        }
    }

    /// HTTP bearer authentication
    pub fn bearer(id: impl Into<String>, bearer_format: Option<&str>) -> Self {
        Self::new(
            id,
            SecurityScheme::Http {
                scheme: "bearer".to_string(),
                bearer_format: bearer_format.map(str::to_string),
            },
        )
    }

    /// HTTP basic authentication
    pub fn basic(id: impl Into<String>) -> Self {
        Self::new(
            id,
            SecurityScheme::Http {
                scheme: "basic".to_string(),
                bearer_format: None,
            },
        )
    }

    /// API key passed in a header, query string or cookie
    pub fn api_key(id: impl Into<String>, name: impl Into<String>, location: ParameterLocation) -> Self {
        Self::new(
            id,
            SecurityScheme::ApiKey {
                name: name.into(),
                location,
            },
        )
    }

    pub fn oauth2(id: impl Into<String>, flows: OAuth2Flows) -> Self {
        Self::new(id, SecurityScheme::OAuth2 { flows })
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Requirement naming only this scheme
    pub fn requirement(&self) -> SecurityRequirement {
        let mut requirement = SecurityRequirement::new();
        requirement.insert(self.id.clone(), self.scopes.clone());
        requirement
    }
}

/// Where a linkable value appears on a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkLocation {
    /// Property of the response body
    ResponseBody,
    /// Response header
    ResponseHeader,
    Path,
    Query,
    Header,
    Cookie,
}

impl LinkLocation {
    /// Whether the value is produced by the route rather than consumed
    pub fn is_response(&self) -> bool {
        matches!(self, LinkLocation::ResponseBody | LinkLocation::ResponseHeader)
    }

    /// Runtime expression selecting `name` from a response
    pub(crate) fn runtime_expression(&self, name: &str) -> Option<String> {
        match self {
            LinkLocation::ResponseBody => Some(format!("$response.body#/{}", name)),
            LinkLocation::ResponseHeader => Some(format!("$response.header.{}", name)),
            _ => None,
        }
    }
}

/// A named value at a location on a route
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteLink {
    pub name: String,
    pub location: LinkLocation,
}

impl RouteLink {
    pub fn new(name: impl Into<String>, location: LinkLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    pub fn response_body(name: impl Into<String>) -> Self {
        Self::new(name, LinkLocation::ResponseBody)
    }

    pub fn response_header(name: impl Into<String>) -> Self {
        Self::new(name, LinkLocation::ResponseHeader)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, LinkLocation::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, LinkLocation::Query)
    }
}

/// Logical identity shared by the two ends of a link.
///
/// Two route links connect when their keys are equal, typically because they
/// were built from the same marker type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkKey {
    type_id: TypeId,
    name: &'static str,
}

impl LinkKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type name of the marker
    pub fn name(&self) -> &'static str {
        self.name
    }
}
