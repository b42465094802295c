//! Response merging keyed by status code.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::route::Route;
use crate::schema::{ExampleRegistry, SchemaRegistry};
use crate::specification::{MediaType, ResponseKey, Responses};
use crate::value::{fan_out, ContentType, OpenApiBody, OpenApiParameters};

/// One documented response, applied with [`Route::response`]
#[derive(Debug, Clone, Default)]
pub struct ResponseDoc {
    pub status: ResponseKey,
    pub body: Option<OpenApiBody>,
    pub content_types: Vec<ContentType>,
    pub headers: Option<OpenApiParameters>,
    pub description: Option<String>,
}

impl ResponseDoc {
    pub fn new(status: impl Into<ResponseKey>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }

    /// `200` response
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Response used for any status code not documented otherwise
    pub fn fallback() -> Self {
        Self::new(ResponseKey::Default)
    }

    pub fn body(mut self, body: impl Into<OpenApiBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.content_types.push(content_type.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<OpenApiParameters>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Merge response descriptors into `current`.
///
/// Every key found in any of the maps is updated; fields not supplied for a key
/// keep their current value and keys not mentioned are left alone.
pub fn merge_responses(
    current: Responses,
    bodies: &IndexMap<ResponseKey, OpenApiBody>,
    descriptions: &IndexMap<ResponseKey, String>,
    content_types: &IndexMap<ResponseKey, Vec<ContentType>>,
    headers: &IndexMap<ResponseKey, OpenApiParameters>,
    schemas: &mut SchemaRegistry,
    examples: &mut ExampleRegistry,
) -> Responses {
    let mut responses = current;

    let keys: BTreeSet<ResponseKey> = bodies
        .keys()
        .chain(descriptions.keys())
        .chain(content_types.keys())
        .chain(headers.keys())
        .copied()
        .collect();

    for key in keys {
        let mut response = responses.remove(&key).unwrap_or_default();
        let types = content_types.get(&key).map(Vec::as_slice).unwrap_or_default();

        if let Some(body) = bodies.get(&key) {
            match body.media_type(schemas, examples) {
                Ok(media) => response.content = fan_out(media, types),
                Err(err) => tracing::warn!("Dropping body of {} response: {}", key, err),
            }
        } else if !types.is_empty() {
            let media = response
                .content
                .values()
                .next()
                .cloned()
                .unwrap_or_else(MediaType::default);
            response.content = fan_out(media, types);
        }

        if let Some(bag) = headers.get(&key) {
            match bag.headers(schemas) {
                Ok(documented) => response.headers = documented,
                Err(err) => tracing::warn!("Dropping headers of {} response: {}", key, err),
            }
        }

        if let Some(description) = descriptions.get(&key) {
            response.description = description.clone();
        }

        responses.insert(key, response);
    }

    responses
}

impl Route {
    /// Document one response of the route
    pub fn response(&mut self, doc: ResponseDoc) -> &mut Self {
        tracing::debug!(
            "Documenting {} response of {} {}",
            doc.status,
            self.method,
            self.path_string()
        );

        let key = doc.status;
        let bodies: IndexMap<_, _> = doc.body.into_iter().map(|b| (key, b)).collect();
        let mut descriptions: IndexMap<_, _> = doc.description.into_iter().map(|d| (key, d)).collect();
        let headers: IndexMap<_, _> = doc.headers.into_iter().map(|h| (key, h)).collect();
        let mut content_types = IndexMap::new();
        if !doc.content_types.is_empty() {
            content_types.insert(key, doc.content_types);
        }
        let documented = self
            .docs()
            .operation
            .as_ref()
            .map_or(false, |operation| operation.responses.contains_key(&key));
        // a bare call documents a new status code and leaves a known one alone
        if bodies.is_empty() && headers.is_empty() && content_types.is_empty() && !documented {
            descriptions.entry(key).or_default();
        }

        self.merge_response_maps(&bodies, &descriptions, &content_types, &headers)
    }

    /// Merge response maps into the route's operation
    pub(crate) fn merge_response_maps(
        &mut self,
        bodies: &IndexMap<ResponseKey, OpenApiBody>,
        descriptions: &IndexMap<ResponseKey, String>,
        content_types: &IndexMap<ResponseKey, Vec<ContentType>>,
        headers: &IndexMap<ResponseKey, OpenApiParameters>,
    ) -> &mut Self {
        self.ensure_documented();
        let mut operation = self.operation();
        let docs = self.docs_mut();
        operation.responses = merge_responses(
            std::mem::take(&mut operation.responses),
            bodies,
            descriptions,
            content_types,
            headers,
            &mut docs.schemas,
            &mut docs.examples,
        );
        docs.operation = Some(operation);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::HttpMethod;
    use crate::specification::{ReferenceOr, Response};
    use crate::value::OpenApiValue;
    use serde_json::json;

    #[allow(clippy::too_many_arguments)]
    fn merge(
        current: Responses,
        key: ResponseKey,
        body: Option<OpenApiBody>,
        description: Option<&str>,
        types: Vec<ContentType>,
        headers: Option<OpenApiParameters>,
        schemas: &mut SchemaRegistry,
        examples: &mut ExampleRegistry,
    ) -> Responses {
        merge_responses(
            current,
            &body.into_iter().map(|b| (key, b)).collect(),
            &description.into_iter().map(|d| (key, d.to_string())).collect(),
            &Some(types).filter(|t| !t.is_empty()).into_iter().map(|t| (key, t)).collect(),
            &headers.into_iter().map(|h| (key, h)).collect(),
            schemas,
            examples,
        )
    }

    #[test]
    fn test_disjoint_codes_do_not_mix() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();

        let responses = merge(
            Responses::new(),
            ResponseKey::Code(200),
            Some(OpenApiBody::example(&json!({"id": 1}))),
            Some("Found"),
            vec![],
            None,
            &mut schemas,
            &mut examples,
        );
        let responses = merge(
            responses,
            ResponseKey::Code(404),
            None,
            Some("Missing"),
            vec![],
            Some(OpenApiValue::example(&json!({"X-Reason": "gone"})).into()),
            &mut schemas,
            &mut examples,
        );

        assert_eq!(responses.len(), 2);
        let ok = &responses[&ResponseKey::Code(200)];
        let missing = &responses[&ResponseKey::Code(404)];
        assert_eq!(ok.description, "Found");
        assert!(ok.headers.is_empty());
        assert!(ok.content.contains_key("application/json"));
        assert_eq!(missing.description, "Missing");
        assert!(missing.content.is_empty());
        assert!(missing.headers.contains_key("X-Reason"));
    }

    #[test]
    fn test_same_code_overwrites_only_supplied_fields() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();

        let responses = merge(
            Responses::new(),
            ResponseKey::Code(201),
            Some(OpenApiBody::example(&json!({"id": 1}))),
            Some("Created"),
            vec![],
            None,
            &mut schemas,
            &mut examples,
        );
        let first_content = responses[&ResponseKey::Code(201)].content.clone();

        let responses = merge(
            responses,
            ResponseKey::Code(201),
            None,
            None,
            vec![],
            Some(OpenApiValue::example(&json!({"Location": "/users/1"})).into()),
            &mut schemas,
            &mut examples,
        );

        let created = &responses[&ResponseKey::Code(201)];
        assert_eq!(created.description, "Created");
        assert_eq!(created.content, first_content);
        assert!(created.headers.contains_key("Location"));
    }

    #[test]
    fn test_content_types_without_body() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();

        let responses = merge(
            Responses::new(),
            ResponseKey::Default,
            None,
            None,
            vec![ContentType::text(), ContentType::octet_stream()],
            None,
            &mut schemas,
            &mut examples,
        );

        let fallback = &responses[&ResponseKey::Default];
        assert_eq!(fallback.description, "");
        assert_eq!(fallback.content.len(), 2);
        assert_eq!(fallback.content["text/plain"], MediaType::default());
    }

    #[test]
    fn test_content_types_reuse_existing_body() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();

        let responses = merge(
            Responses::new(),
            ResponseKey::Code(200),
            Some(OpenApiBody::example(&json!([1, 2]))),
            None,
            vec![],
            None,
            &mut schemas,
            &mut examples,
        );
        let responses = merge(
            responses,
            ResponseKey::Code(200),
            None,
            None,
            vec![ContentType::new("application/xml")],
            None,
            &mut schemas,
            &mut examples,
        );

        let ok = &responses[&ResponseKey::Code(200)];
        assert_eq!(ok.content.len(), 1);
        assert_eq!(ok.content["application/xml"].example, Some(json!([1, 2])));
    }

    #[test]
    fn test_untouched_codes_survive() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let mut current = Responses::new();
        current.insert(
            ResponseKey::Code(500),
            Response {
                description: "Boom".to_string(),
                ..Default::default()
            },
        );

        let responses = merge(
            current.clone(),
            ResponseKey::Code(200),
            None,
            Some("Fine"),
            vec![],
            None,
            &mut schemas,
            &mut examples,
        );

        assert_eq!(responses[&ResponseKey::Code(500)], current[&ResponseKey::Code(500)]);
        assert_eq!(responses.len(), 2);
    }

    #[test]
    fn test_route_response_chain() {
        let mut route = Route::new(HttpMethod::GET, "/users/{id}").unwrap();
        route
            .response(
                ResponseDoc::ok()
                    .body(OpenApiBody::example(&json!({"id": 1, "name": "Ada"})))
                    .description("The user"),
            )
            .response(ResponseDoc::new(404));

        let operation = route.operation();
        assert_eq!(operation.operation_id.as_deref(), Some("getUsersId"));
        assert_eq!(operation.responses.len(), 2);
        assert_eq!(operation.responses[&ResponseKey::Code(404)].description, "");

        let ok = &operation.responses[&ResponseKey::Code(200)];
        let media = &ok.content["application/json"];
        assert!(matches!(media.schema, Some(ReferenceOr::Item(_))));
        assert_eq!(media.example, Some(json!({"id": 1, "name": "Ada"})));
    }
}
