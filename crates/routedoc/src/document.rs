use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::{
    config::DocumentConfig,
    error::{RouteDocError, RouteDocResult},
    route::{Route, Routes},
    schema::{
        rename_reference, rename_schema_refs, ExampleRegistry, ReferenceRenames, SchemaRegistry,
    },
    specification::*,
};

/// Output format for saving documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Assembles an OpenAPI document from a table of documented routes
pub struct DocumentGenerator {
    /// Configuration
    config: DocumentConfig,
    /// Generated document
    spec: Option<OpenApiSpec>,
}

impl DocumentGenerator {
    /// Create a new document generator
    pub fn new(config: DocumentConfig) -> Self {
        Self { config, spec: None }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Generate a document for `routes`.
    ///
    /// Excluded routes are skipped. With a `spec_id`, only routes grouped under
    /// that id are included.
    pub fn generate(&mut self, routes: &Routes, spec_id: Option<&str>) -> RouteDocResult<&OpenApiSpec> {
        let mut spec = OpenApiSpec {
            openapi: self.config.openapi_version.clone(),
            info: self.config.info.clone(),
            servers: self.config.servers.clone(),
            paths: IndexMap::new(),
            components: None,
            security: self.global_security(),
            tags: self.config.tags.clone(),
            external_docs: self.config.external_docs.clone(),
        };

        let included: Vec<Route> = routes
            .iter()
            .filter(|route| Self::is_included(route, spec_id))
            .map(|route| {
                let mut route = route.clone();
                route.ensure_documented();
                route
            })
            .collect();

        let mut components = Components {
            security_schemes: self.config.security_schemes.clone(),
            ..Default::default()
        };
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let links = resolve_links(&included);

        for (route, route_links) in included.iter().zip(links) {
            let docs = route.docs();
            let mut operation = route.operation();

            for response in operation.responses.values_mut() {
                for (name, link) in &route_links {
                    response
                        .links
                        .entry(name.clone())
                        .or_insert_with(|| ReferenceOr::Item(link.clone()));
                }
            }

            let mut renames = schemas.merge(&docs.schemas);
            renames.extend(examples.merge(&docs.examples));
            if !renames.is_empty() {
                rename_operation_refs(&mut operation, &renames);
            }

            for auth in docs.auths.iter().flatten() {
                components
                    .security_schemes
                    .entry(auth.id.clone())
                    .or_insert_with(|| auth.scheme.clone());
            }

            let tags = docs
                .tags
                .iter()
                .cloned()
                .chain(operation.tags.iter().map(|name| Tag::new(name.as_str())));
            for tag in tags {
                if !spec.tags.iter().any(|existing| existing.name == tag.name) {
                    spec.tags.push(tag);
                }
            }

            let method = route.openapi_method();
            let path = route.path_string();
            let slot = spec.paths.entry(path.clone()).or_default().operation_mut(&method);
            if slot.is_some() {
                tracing::warn!("Overwriting documented operation {} {}", method, path);
            }
            *slot = Some(operation);
        }

        components.schemas = schemas.entries().clone();
        components.examples = examples.entries().clone();
        if !components.is_empty() {
            spec.components = Some(components);
        }

        tracing::debug!(
            "Generated document '{}' with {} paths from {} routes",
            spec.info.title,
            spec.paths.len(),
            included.len()
        );

        Ok(&*self.spec.insert(spec))
    }

    fn is_included(route: &Route, spec_id: Option<&str>) -> bool {
        let docs = route.docs();
        if docs.exclude_from_openapi {
            return false;
        }
        match spec_id {
            Some(id) => docs.spec_id.as_deref() == Some(id),
            None => true,
        }
    }

    /// Global requirements, any one of which suffices
    fn global_security(&self) -> Vec<SecurityRequirement> {
        self.config
            .security
            .iter()
            .map(|name| {
                let mut requirement = SecurityRequirement::new();
                requirement.insert(name.clone(), Vec::new());
                requirement
            })
            .collect()
    }

    fn generated(&self) -> RouteDocResult<&OpenApiSpec> {
        self.spec.as_ref().ok_or_else(|| {
            RouteDocError::generic("No specification generated yet. Call generate() first.")
        })
    }

    /// Export specification as JSON
    pub fn export_json(&self, pretty: bool) -> RouteDocResult<String> {
        let spec = self.generated()?;

        if pretty {
            serde_json::to_string_pretty(spec).map_err(RouteDocError::from)
        } else {
            serde_json::to_string(spec).map_err(RouteDocError::from)
        }
    }

    /// Export specification as YAML
    pub fn export_yaml(&self) -> RouteDocResult<String> {
        let spec = self.generated()?;

        serde_yaml::to_string(spec).map_err(RouteDocError::from)
    }

    /// Write the generated document to `path`
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> RouteDocResult<()> {
        let content = match format {
            OutputFormat::Json => self.export_json(self.config.pretty_print)?,
            OutputFormat::Yaml => self.export_yaml()?,
        };

        fs::write(path.as_ref(), content)?;
        tracing::debug!("Saved document to {}", path.as_ref().display());

        Ok(())
    }

    /// Get the generated specification
    pub fn specification(&self) -> Option<&OpenApiSpec> {
        self.spec.as_ref()
    }
}

/// Point an operation's component references at the keys they moved to
fn rename_operation_refs(operation: &mut Operation, renames: &ReferenceRenames) {
    for parameter in operation.parameters.iter_mut().flatten() {
        if let ReferenceOr::Item(parameter) = parameter {
            if let Some(schema) = parameter.schema.as_mut() {
                rename_schema_refs(schema, renames);
            }
        }
    }
    if let Some(ReferenceOr::Item(body)) = operation.request_body.as_mut() {
        rename_media_refs(body.content.values_mut(), renames);
    }
    for response in operation.responses.values_mut() {
        rename_media_refs(response.content.values_mut(), renames);
        for header in response.headers.values_mut() {
            if let ReferenceOr::Item(Header {
                schema: Some(schema),
                ..
            }) = header
            {
                rename_schema_refs(schema, renames);
            }
        }
    }
}

fn rename_media_refs<'a>(
    media: impl Iterator<Item = &'a mut MediaType>,
    renames: &ReferenceRenames,
) {
    for media in media {
        if let Some(schema) = media.schema.as_mut() {
            rename_schema_refs(schema, renames);
        }
        for example in media.examples.values_mut() {
            rename_reference(example, renames);
        }
    }
}

/// Links each route's responses gain, keyed by target operation id.
///
/// A response value on one route connects to a parameter on another route
/// when both were declared with the same link key.
fn resolve_links(routes: &[Route]) -> Vec<IndexMap<String, Link>> {
    routes
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let mut links: IndexMap<String, Link> = IndexMap::new();

            for (source_link, key) in &source.docs().links {
                let Some(expression) = source_link.location.runtime_expression(&source_link.name)
                else {
                    continue;
                };

                for (other, target) in routes.iter().enumerate() {
                    if other == index {
                        continue;
                    }
                    let parameters = target
                        .docs()
                        .links
                        .iter()
                        .filter(|(link, target_key)| *target_key == key && !link.location.is_response());

                    for (target_link, _) in parameters {
                        let operation_id = target
                            .operation()
                            .operation_id
                            .unwrap_or_else(|| target.operation_id());
                        let link = links.entry(operation_id).or_insert_with(|| Link {
                            operation_ref: Some(target.operation_ref()),
                            ..Default::default()
                        });
                        link.parameters
                            .insert(target_link.name.clone(), Value::String(expression.clone()));
                    }
                }
            }

            links
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{AuthScheme, LinkKey, RouteLink};
    use crate::operation::OperationDoc;
    use crate::responses::ResponseDoc;
    use crate::route::HttpMethod;
    use crate::validation::{validate_spec, ValidationLevel};
    use crate::value::OpenApiBody;
    use serde_json::json;
    use tracing_test::traced_test;

    mod inventory {
        #[derive(serde::Serialize)]
        pub struct Widget {
            pub size: u32,
        }
    }

    struct UserId;

    #[derive(serde::Serialize)]
    struct Widget {
        name: String,
    }

    impl Widget {
        fn sample() -> Self {
            Widget {
                name: "gear".to_string(),
            }
        }
    }

    fn generator() -> DocumentGenerator {
        DocumentGenerator::new(DocumentConfig::new("Test API", "1.0.0"))
    }

    #[test]
    fn test_generator_creation() {
        let generator = generator();
        assert!(generator.specification().is_none());
        assert!(generator.export_json(true).is_err());
    }

    #[test]
    fn test_empty_routes_generation() {
        let mut generator = generator();
        let spec = generator.generate(&Routes::new(), None).unwrap();

        assert_eq!(spec.info.title, "Test API");
        assert_eq!(spec.info.version, "1.0.0");
        assert!(spec.paths.is_empty());
        assert!(spec.components.is_none());
    }

    #[test]
    fn test_basic_route_generation() {
        let mut routes = Routes::new();
        routes
            .get("/users")
            .unwrap()
            .openapi(OperationDoc::new().summary("List users").tag("Users"))
            .response(ResponseDoc::ok().body(OpenApiBody::example(&json!([{"id": 1}]))));
        routes.post("/users").unwrap();

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();

        assert_eq!(spec.paths.len(), 1);
        let path_item = &spec.paths["/users"];
        let get = path_item.get.as_ref().unwrap();
        assert_eq!(get.summary.as_deref(), Some("List users"));
        assert_eq!(get.tags, vec!["Users".to_string()]);

        let post = path_item.post.as_ref().unwrap();
        assert_eq!(post.operation_id.as_deref(), Some("postUsers"));
        assert_eq!(post.tags, vec!["users".to_string()]);

        let tag_names: Vec<&str> = spec.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["Users", "users"]);
    }

    #[test]
    fn test_every_operation_documents_a_response() {
        let mut routes = Routes::new();
        routes.post("/users").unwrap();
        routes
            .get("/users")
            .unwrap()
            .openapi(OperationDoc::new().summary("List"));

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();

        let path_item = &spec.paths["/users"];
        for operation in [path_item.get.as_ref(), path_item.post.as_ref()] {
            let responses = &operation.unwrap().responses;
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[&ResponseKey::Code(200)].description, "");
        }
        assert!(validate_spec(spec)
            .iter()
            .all(|warning| warning.level != ValidationLevel::Error));
    }

    #[test]
    #[traced_test]
    fn test_same_named_components_from_different_routes() {
        let mut routes = Routes::new();
        routes
            .get("/widgets")
            .unwrap()
            .response(ResponseDoc::ok().body(OpenApiBody::example(&Widget::sample())));
        routes
            .get("/stock")
            .unwrap()
            .response(ResponseDoc::ok().body(OpenApiBody::example(&inventory::Widget { size: 3 })));

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();

        let components = spec.components.as_ref().unwrap();
        assert_eq!(components.schemas.keys().collect::<Vec<_>>(), vec!["Widget", "Widget2"]);
        assert_eq!(components.examples.keys().collect::<Vec<_>>(), vec!["Widget", "Widget2"]);
        assert_eq!(components.examples["Widget2"].as_item().unwrap().value, Some(json!({"size": 3})));

        let stock = spec.paths["/stock"].get.as_ref().unwrap();
        let media = &stock.responses[&ResponseKey::Code(200)].content["application/json"];
        assert_eq!(
            media.schema.as_ref().and_then(ReferenceOr::as_reference),
            Some("#/components/schemas/Widget2")
        );
        assert_eq!(
            media.examples["Widget"].as_reference(),
            Some("#/components/examples/Widget2")
        );

        let widgets = spec.paths["/widgets"].get.as_ref().unwrap();
        let media = &widgets.responses[&ResponseKey::Code(200)].content["application/json"];
        assert_eq!(
            media.schema.as_ref().and_then(ReferenceOr::as_reference),
            Some("#/components/schemas/Widget")
        );
        assert!(logs_contain("Schema name 'Widget' is taken"));
    }

    #[test]
    fn test_excluded_and_grouped_routes() {
        let mut routes = Routes::new();
        routes.get("/public").unwrap();
        routes.get("/internal").unwrap().exclude_from_openapi();
        routes
            .get("/admin/stats")
            .unwrap()
            .openapi(OperationDoc::new().spec_id("admin"));

        let mut generator = generator();
        let all = generator.generate(&routes, None).unwrap();
        assert!(all.paths.contains_key("/public"));
        assert!(all.paths.contains_key("/admin/stats"));
        assert!(!all.paths.contains_key("/internal"));

        let admin = generator.generate(&routes, Some("admin")).unwrap();
        assert_eq!(admin.paths.len(), 1);
        assert!(admin.paths.contains_key("/admin/stats"));
    }

    #[test]
    fn test_documentation_method_override() {
        let mut routes = Routes::new();
        routes
            .post("/search")
            .unwrap()
            .openapi(OperationDoc::new().method(HttpMethod::GET));

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();
        let item = &spec.paths["/search"];
        assert!(item.get.is_some());
        assert!(item.post.is_none());
    }

    #[test]
    fn test_components_and_security_schemes() {
        let mut routes = Routes::new();
        routes
            .post("/a")
            .unwrap()
            .openapi(
                OperationDoc::new()
                    .body(OpenApiBody::example(&Widget::sample()))
                    .auth(AuthScheme::bearer("bearer", Some("JWT"))),
            );
        routes
            .post("/b")
            .unwrap()
            .openapi(
                OperationDoc::new()
                    .body(OpenApiBody::example(&Widget::sample()))
                    .auth(AuthScheme::basic("basic")),
            );

        let config = DocumentConfig::new("Test API", "1.0.0").require_security("bearer");
        let mut generator = DocumentGenerator::new(config);
        let spec = generator.generate(&routes, None).unwrap();

        let components = spec.components.as_ref().unwrap();
        assert_eq!(components.schemas.len(), 1);
        assert!(components.schemas.contains_key("Widget"));
        assert_eq!(components.examples.len(), 1);
        assert_eq!(
            components.security_schemes.keys().collect::<Vec<_>>(),
            vec!["bearer", "basic"]
        );
        assert_eq!(spec.security.len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_duplicate_slot_is_overwritten() {
        let mut routes = Routes::new();
        routes.get("/dup").unwrap().openapi(OperationDoc::new().summary("first"));
        routes.get("/dup").unwrap().openapi(OperationDoc::new().summary("second"));

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();
        let get = spec.paths["/dup"].get.as_ref().unwrap();
        assert_eq!(get.summary.as_deref(), Some("second"));
        assert!(logs_contain("Overwriting documented operation GET /dup"));
    }

    #[test]
    fn test_link_resolution() {
        let mut routes = Routes::new();
        routes
            .post("/users")
            .unwrap()
            .openapi(OperationDoc::new().link(RouteLink::response_body("id"), LinkKey::of::<UserId>()))
            .response(ResponseDoc::new(201).description("Created"));
        routes
            .get("/users/{userId}")
            .unwrap()
            .openapi(OperationDoc::new().link(RouteLink::path("userId"), LinkKey::of::<UserId>()));

        let mut generator = generator();
        let spec = generator.generate(&routes, None).unwrap();

        let post = spec.paths["/users"].post.as_ref().unwrap();
        let created = &post.responses[&ResponseKey::Code(201)];
        let link = created.links["getUsersUserId"].as_item().unwrap();
        assert_eq!(link.operation_ref.as_deref(), Some("#paths/~1users~1{userId}/get"));
        assert_eq!(link.parameters["userId"], json!("$response.body#/id"));

        let get = spec.paths["/users/{userId}"].get.as_ref().unwrap();
        assert!(get.responses.values().all(|r| r.links.is_empty()));
    }

    #[test]
    fn test_export_and_save() {
        let mut routes = Routes::new();
        routes
            .get("/health")
            .unwrap()
            .openapi_no_auth()
            .response(ResponseDoc::ok().description("Healthy"));

        let mut generator = generator();
        generator.generate(&routes, None).unwrap();

        let json = generator.export_json(false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["paths"]["/health"]["get"]["security"], json!([]));
        assert_eq!(
            value["paths"]["/health"]["get"]["responses"]["200"]["description"],
            json!("Healthy")
        );

        let yaml = generator.export_yaml().unwrap();
        assert!(yaml.contains("/health"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");
        generator.save_to_file(&path, OutputFormat::Json).unwrap();
        let saved: OpenApiSpec = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(Some(&saved), generator.specification());
    }
}
