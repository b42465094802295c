//! Routes, their path model, and the identity helpers used in documents.
//!
//! A [`Route`] owns a [`RouteDocs`] record that every decoration call reads and
//! rewrites. [`Routes`] is the ordered table the document pass walks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::docs::RouteDocs;
use crate::error::RouteDocResult;
use crate::specification::{Operation, Parameter, ParameterLocation, ReferenceOr, Schema};

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("valid placeholder regex"));

/// Errors that can occur while parsing a route path
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutePathError {
    #[error("Empty placeholder in segment '{0}'")]
    EmptyPlaceholder(String),
    #[error("Invalid parameter name: {0}")]
    InvalidName(String),
    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),
    #[error("Catch-all must be the last segment")]
    CatchAllNotLast,
}

/// HTTP methods that can be documented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    /// Lowercase name, as used for path item keys
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            HttpMethod::GET => "get",
            HttpMethod::POST => "post",
            HttpMethod::PUT => "put",
            HttpMethod::DELETE => "delete",
            HttpMethod::PATCH => "patch",
            HttpMethod::HEAD => "head",
            HttpMethod::OPTIONS => "options",
            HttpMethod::TRACE => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_lowercase().to_uppercase())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "TRACE" => Ok(HttpMethod::TRACE),
            other => Err(format!("Unsupported HTTP method: {}", other)),
        }
    }
}

/// A single component of a route path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Static text segment
    Static(String),
    /// Named placeholder, `{id}` or `{id:constraint}`
    Parameter(String),
    /// Catch-all placeholder, `*rest` (must be last)
    CatchAll(String),
}

impl PathComponent {
    /// Parse a path such as `/users/{id}/files/*rest`
    pub fn parse_path(path: &str) -> Result<Vec<PathComponent>, RoutePathError> {
        let raw: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut components = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();

        for (index, segment) in raw.iter().enumerate() {
            let component = if segment.starts_with('{') && segment.ends_with('}') {
                // constraints only matter for matching, not for docs
                let inner = &segment[1..segment.len() - 1];
                let name = inner.split(':').next().unwrap_or_default().trim();
                PathComponent::Parameter(Self::checked_name(segment, name, &mut seen)?)
            } else if let Some(name) = segment.strip_prefix('*') {
                if index != raw.len() - 1 {
                    return Err(RoutePathError::CatchAllNotLast);
                }
                PathComponent::CatchAll(Self::checked_name(segment, name, &mut seen)?)
            } else {
                PathComponent::Static(segment.to_string())
            };
            components.push(component);
        }

        Ok(components)
    }

    fn checked_name(
        segment: &str,
        name: &str,
        seen: &mut HashSet<String>,
    ) -> Result<String, RoutePathError> {
        if name.is_empty() {
            return Err(RoutePathError::EmptyPlaceholder(segment.to_string()));
        }
        if !PARAM_NAME.is_match(name) {
            return Err(RoutePathError::InvalidName(name.to_string()));
        }
        if !seen.insert(name.to_string()) {
            return Err(RoutePathError::DuplicateParameter(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Bare name of the component: static text or placeholder name
    pub fn name(&self) -> &str {
        match self {
            PathComponent::Static(text) => text,
            PathComponent::Parameter(name) | PathComponent::CatchAll(name) => name,
        }
    }

    /// Required path parameter for placeholder components
    pub fn path_parameter(&self) -> Option<Parameter> {
        match self {
            PathComponent::Static(_) => None,
            PathComponent::Parameter(name) | PathComponent::CatchAll(name) => {
                let mut parameter = Parameter::new(
                    name.clone(),
                    ParameterLocation::Path,
                    ReferenceOr::Item(Schema::of_type("string")),
                );
                parameter.required = Some(true);
                Some(parameter)
            }
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Static(text) => write!(f, "{}", text),
            PathComponent::Parameter(name) | PathComponent::CatchAll(name) => write!(f, "{{{}}}", name),
        }
    }
}

/// A route together with its accumulated documentation
#[derive(Debug, Clone)]
pub struct Route {
    /// HTTP method the route is registered for
    pub method: HttpMethod,
    /// Parsed path components
    pub path: Vec<PathComponent>,
    /// Free-form route description
    pub description: Option<String>,
    docs: RouteDocs,
}

impl Route {
    /// Create a route from a method and a path pattern
    pub fn new(method: HttpMethod, path: &str) -> RouteDocResult<Self> {
        Ok(Self {
            method,
            path: PathComponent::parse_path(path)?,
            description: None,
            docs: RouteDocs::default(),
        })
    }

    /// Accumulated documentation
    pub fn docs(&self) -> &RouteDocs {
        &self.docs
    }

    pub(crate) fn docs_mut(&mut self) -> &mut RouteDocs {
        &mut self.docs
    }

    /// Path rendered as an OpenAPI path template, e.g. `/users/{id}`
    pub fn path_string(&self) -> String {
        let joined: Vec<String> = self.path.iter().map(|c| c.to_string()).collect();
        format!("/{}", joined.join("/"))
    }

    /// Deterministic operation id: `getUsersId` for `GET /users/{id}`
    pub fn operation_id(&self) -> String {
        let segments: String = self.path.iter().map(|c| upper_first(c.name())).collect();
        format!("{}{}", self.method.as_lowercase(), segments)
    }

    /// JSON-pointer style reference to this operation inside a document.
    ///
    /// Uses [`openapi_method`](Self::openapi_method), not the routing method,
    /// so links reach the slot an overridden route is documented under.
    pub fn operation_ref(&self) -> String {
        let escaped = self.path_string().replace('~', "~0").replace('/', "~1");
        format!("#paths/{}/{}", escaped, self.openapi_method().as_lowercase())
    }

    /// Path parameters derived from the placeholder segments
    pub fn path_parameters(&self) -> Vec<ReferenceOr<Parameter>> {
        self.path
            .iter()
            .filter_map(PathComponent::path_parameter)
            .map(ReferenceOr::Item)
            .collect()
    }

    /// Current operation, or a fresh one carrying the route description
    pub fn operation(&self) -> Operation {
        self.docs.operation.clone().unwrap_or_else(|| Operation {
            description: self.description.clone(),
            ..Default::default()
        })
    }

    /// Method the route is documented under
    pub fn openapi_method(&self) -> HttpMethod {
        self.docs.openapi_method.unwrap_or(self.method)
    }

    /// Exclude route from generated documents
    pub fn exclude_from_openapi(&mut self) -> &mut Self {
        self.docs.exclude_from_openapi = true;
        self
    }

    /// Document the route as requiring no authentication
    pub fn openapi_no_auth(&mut self) -> &mut Self {
        self.docs.auths = Some(Vec::new());
        self.openapi_custom(|operation| operation.security = Some(Vec::new()))
    }

    /// Customize any field of the operation
    pub fn openapi_custom<F>(&mut self, customize: F) -> &mut Self
    where
        F: FnOnce(&mut Operation),
    {
        self.ensure_documented();
        let mut operation = self.operation();
        customize(&mut operation);
        self.docs.operation = Some(operation);
        self
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Ordered table of documented routes
#[derive(Debug, Default, Clone)]
pub struct Routes {
    routes: Vec<Route>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route and return it for decoration
    pub fn add(&mut self, method: HttpMethod, path: &str) -> RouteDocResult<&mut Route> {
        let route = Route::new(method, path)?;
        tracing::debug!("Registered route {} {}", method, route.path_string());
        self.routes.push(route);
        let last = self.routes.len() - 1;
        Ok(&mut self.routes[last])
    }

    pub fn get(&mut self, path: &str) -> RouteDocResult<&mut Route> {
        self.add(HttpMethod::GET, path)
    }

    pub fn post(&mut self, path: &str) -> RouteDocResult<&mut Route> {
        self.add(HttpMethod::POST, path)
    }

    pub fn put(&mut self, path: &str) -> RouteDocResult<&mut Route> {
        self.add(HttpMethod::PUT, path)
    }

    pub fn delete(&mut self, path: &str) -> RouteDocResult<&mut Route> {
        self.add(HttpMethod::DELETE, path)
    }

    pub fn patch(&mut self, path: &str) -> RouteDocResult<&mut Route> {
        self.add(HttpMethod::PATCH, path)
    }

    /// Find a registered route by method and path template
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path_string() == path)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Route> {
        self.routes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Distinct spec identifiers used by the routes, in registration order
    pub fn spec_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.routes.iter().filter_map(|r| r.docs.spec_id.as_ref()) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

impl<'a> IntoIterator for &'a Routes {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
