//! Operation builder.
//!
//! [`Route::openapi`] folds an [`OperationDoc`] into the route's operation.
//! Repeated calls are additive: parameters are keyed by location and name,
//! tags by name, auth schemes by id. Every call documents a response through
//! [`Route::response`](crate::route::Route::response), `200` when none is given.

use indexmap::IndexMap;

use crate::docs::{AuthScheme, LinkKey, RouteLink};
use crate::responses::ResponseDoc;
use crate::route::{HttpMethod, Route};
use crate::schema::{ExampleRegistry, SchemaRegistry};
use crate::specification::{
    Callback, ExternalDocumentation, Operation, Parameter, ParameterLocation, ReferenceOr, Server,
    Tag,
};
use crate::value::{request_body, ContentType, OpenApiBody, OpenApiParameters};

/// Documentation for one operation, applied with [`Route::openapi`]
#[derive(Debug, Clone, Default)]
pub struct OperationDoc {
    pub method: Option<HttpMethod>,
    pub spec_id: Option<String>,
    pub tags: Vec<Tag>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub external_docs: Option<ExternalDocumentation>,
    pub query: Option<OpenApiParameters>,
    pub headers: Option<OpenApiParameters>,
    pub path: Option<OpenApiParameters>,
    pub cookies: Option<OpenApiParameters>,
    pub body: Option<OpenApiBody>,
    pub content_types: Vec<ContentType>,
    pub links: IndexMap<RouteLink, LinkKey>,
    pub callbacks: IndexMap<String, ReferenceOr<Callback>>,
    pub deprecated: Option<bool>,
    pub auth: Vec<AuthScheme>,
    pub servers: Option<Vec<Server>>,
    pub response: Option<ResponseDoc>,
}

impl OperationDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document the route under a different method
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn spec_id(mut self, spec_id: impl Into<String>) -> Self {
        self.spec_id = Some(spec_id.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn external_docs(mut self, url: impl Into<String>, description: Option<&str>) -> Self {
        self.external_docs = Some(ExternalDocumentation {
            url: url.into(),
            description: description.map(str::to_string),
        });
        self
    }

    pub fn query(mut self, query: impl Into<OpenApiParameters>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<OpenApiParameters>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Explicit path parameters; replace the ones derived from the path
    pub fn path(mut self, path: impl Into<OpenApiParameters>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn cookies(mut self, cookies: impl Into<OpenApiParameters>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    pub fn body(mut self, body: impl Into<OpenApiBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.content_types.push(content_type.into());
        self
    }

    pub fn link(mut self, link: RouteLink, key: LinkKey) -> Self {
        self.links.insert(link, key);
        self
    }

    pub fn callback(mut self, name: impl Into<String>, callback: Callback) -> Self {
        self.callbacks.insert(name.into(), ReferenceOr::Item(callback));
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.auth.push(auth);
        self
    }

    pub fn server(mut self, server: Server) -> Self {
        self.servers.get_or_insert_with(Vec::new).push(server);
        self
    }

    /// Response applied after the operation is built
    pub fn response(mut self, response: ResponseDoc) -> Self {
        self.response = Some(response);
        self
    }
}

/// Facts about the route the builder needs
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation_id: String,
    pub path_parameters: Vec<ReferenceOr<Parameter>>,
    /// Tag used when the route has none
    pub default_tag: Option<String>,
    /// Tags accumulated on the route so far
    pub tags: Vec<String>,
}

impl OperationContext {
    pub fn for_route(route: &Route) -> Self {
        Self {
            operation_id: route.operation_id(),
            path_parameters: route.path_parameters(),
            default_tag: route.path.first().map(|c| c.to_string()),
            tags: route.docs().tags.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

/// Fold `doc` into `current`. Responses and security are carried over unchanged.
pub fn build_operation(
    ctx: &OperationContext,
    current: Operation,
    doc: &OperationDoc,
    schemas: &mut SchemaRegistry,
    examples: &mut ExampleRegistry,
) -> Operation {
    let mut operation = current;

    if ctx.tags.is_empty() {
        if operation.tags.is_empty() {
            operation.tags.extend(ctx.default_tag.clone());
        }
    } else {
        // explicit tags replace only the path-derived default
        if let Some(default) = ctx.default_tag.as_ref().filter(|d| !ctx.tags.contains(d)) {
            operation.tags.retain(|tag| tag != default);
        }
        for tag in &ctx.tags {
            if !operation.tags.contains(tag) {
                operation.tags.push(tag.clone());
            }
        }
    }

    if let Some(summary) = &doc.summary {
        operation.summary = Some(summary.clone());
    }
    operation.description = Some(doc.description.clone().unwrap_or_default());
    operation.operation_id = Some(
        doc.operation_id
            .clone()
            .unwrap_or_else(|| ctx.operation_id.clone()),
    );
    if doc.external_docs.is_some() {
        operation.external_docs = doc.external_docs.clone();
    }

    let query = extract(doc.query.as_ref(), ParameterLocation::Query, schemas);
    let headers = extract(doc.headers.as_ref(), ParameterLocation::Header, schemas);
    let path = match extract(doc.path.as_ref(), ParameterLocation::Path, schemas) {
        explicit if !explicit.is_empty() => explicit,
        // derived placeholders never replace a documented path parameter
        _ => ctx
            .path_parameters
            .iter()
            .filter(|derived| {
                !operation
                    .parameters
                    .iter()
                    .flatten()
                    .any(|existing| parameter_key(existing) == parameter_key(derived))
            })
            .cloned()
            .collect(),
    };
    let cookies = extract(doc.cookies.as_ref(), ParameterLocation::Cookie, schemas);
    operation.parameters = merge_parameters(
        operation.parameters.take(),
        query.into_iter().chain(headers).chain(path).chain(cookies),
    );

    if let Some(body) = &doc.body {
        match request_body(body, &doc.content_types, schemas, examples) {
            Ok(body) => operation.request_body = Some(ReferenceOr::Item(body)),
            Err(err) => tracing::warn!("Dropping request body of {}: {}", ctx.operation_id, err),
        }
    }

    if !doc.callbacks.is_empty() {
        operation
            .callbacks
            .get_or_insert_with(IndexMap::new)
            .extend(doc.callbacks.clone());
    }
    if doc.deprecated.is_some() {
        operation.deprecated = doc.deprecated;
    }
    if doc.servers.is_some() {
        operation.servers = doc.servers.clone();
    }

    operation
}

fn extract(
    parameters: Option<&OpenApiParameters>,
    location: ParameterLocation,
    schemas: &mut SchemaRegistry,
) -> Vec<ReferenceOr<Parameter>> {
    let Some(parameters) = parameters else {
        return Vec::new();
    };
    match parameters.parameters(location, schemas) {
        Ok(parameters) => parameters,
        Err(err) => {
            tracing::warn!("Dropping {} parameters: {}", location, err);
            Vec::new()
        }
    }
}

fn parameter_key(parameter: &ReferenceOr<Parameter>) -> (Option<ParameterLocation>, &str) {
    match parameter {
        ReferenceOr::Item(parameter) => (Some(parameter.location), parameter.name.as_str()),
        ReferenceOr::Reference { reference } => (None, reference.as_str()),
    }
}

/// Add parameters, replacing any existing one with the same location and name
fn merge_parameters<I>(
    current: Option<Vec<ReferenceOr<Parameter>>>,
    new: I,
) -> Option<Vec<ReferenceOr<Parameter>>>
where
    I: IntoIterator<Item = ReferenceOr<Parameter>>,
{
    let mut merged = current.unwrap_or_default();
    for parameter in new {
        let position = merged
            .iter()
            .position(|existing| parameter_key(existing) == parameter_key(&parameter));
        match position {
            Some(index) => merged[index] = parameter,
            None => merged.push(parameter),
        }
    }
    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

impl Route {
    /// Document the route's operation
    pub fn openapi(&mut self, doc: OperationDoc) -> &mut Self {
        tracing::debug!("Documenting {} {}", self.method, self.path_string());

        let description = doc.description.clone().unwrap_or_default();
        self.description = Some(description);
        self.docs_mut().merge_tags(doc.tags.iter().cloned());

        let ctx = OperationContext::for_route(self);
        let current = self.operation();

        let docs = self.docs_mut();
        let mut operation = build_operation(
            &ctx,
            current,
            &doc,
            &mut docs.schemas,
            &mut docs.examples,
        );

        if !doc.auth.is_empty() {
            docs.merge_auths(doc.auth.iter().cloned());
            operation.security = docs.security();
        }
        if let Some(spec_id) = &doc.spec_id {
            docs.spec_id = Some(spec_id.clone());
        }
        docs.links
            .extend(doc.links.iter().map(|(link, key)| (link.clone(), key.clone())));
        if let Some(method) = doc.method {
            docs.openapi_method = Some(method);
        }
        docs.operation = Some(operation);

        self.response(doc.response.unwrap_or_else(ResponseDoc::ok))
    }

    /// Give an undecorated route its default operation
    pub(crate) fn ensure_documented(&mut self) {
        if self.docs().operation.is_none() {
            self.openapi(OperationDoc {
                description: self.description.clone(),
                ..Default::default()
            });
        }
    }
}
