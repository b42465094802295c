//! Loosely typed, single-call documentation kept for existing callers.
//!
//! New code should use [`Route::openapi`] and [`Route::response`].

use indexmap::IndexMap;

use crate::docs::{AuthScheme, LinkKey, RouteLink};
use crate::operation::OperationDoc;
use crate::responses::ResponseDoc;
use crate::route::{HttpMethod, Route};
use crate::specification::{Callback, ReferenceOr, ResponseKey, Server, Tag};
use crate::value::{ContentType, OpenApiBody, OpenApiParameters, OpenApiValue};

/// Everything about an operation in one value, including error responses
#[derive(Debug, Clone, Default)]
pub struct LegacyOperationDoc {
    pub method: Option<HttpMethod>,
    pub spec_id: Option<String>,
    pub tags: Vec<Tag>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub query: Vec<OpenApiValue>,
    pub headers: Vec<OpenApiValue>,
    pub path: Vec<OpenApiValue>,
    pub cookies: Vec<OpenApiValue>,
    pub body: Option<OpenApiValue>,
    pub content_types: Vec<ContentType>,
    pub success_code: ResponseKey,
    pub response: Option<OpenApiValue>,
    pub response_content_types: Vec<ContentType>,
    pub response_headers: Vec<OpenApiValue>,
    pub errors: IndexMap<ResponseKey, OpenApiValue>,
    pub error_descriptions: IndexMap<ResponseKey, String>,
    /// Content types shared by every error response
    pub error_content_types: Vec<ContentType>,
    /// Headers shared by every error response
    pub error_headers: Vec<OpenApiValue>,
    pub links: IndexMap<RouteLink, LinkKey>,
    pub callbacks: IndexMap<String, ReferenceOr<Callback>>,
    pub deprecated: Option<bool>,
    pub auth: Vec<AuthScheme>,
    pub servers: Option<Vec<Server>>,
}

impl LegacyOperationDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
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

    pub fn query(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.query.push(value.into());
        self
    }

    pub fn header(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.headers.push(value.into());
        self
    }

    pub fn path(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.path.push(value.into());
        self
    }

    pub fn cookie(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.cookies.push(value.into());
        self
    }

    pub fn body(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.body = Some(value.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.content_types.push(content_type.into());
        self
    }

    pub fn success_code(mut self, code: impl Into<ResponseKey>) -> Self {
        self.success_code = code.into();
        self
    }

    pub fn response(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.response = Some(value.into());
        self
    }

    pub fn response_content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.response_content_types.push(content_type.into());
        self
    }

    pub fn response_header(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.response_headers.push(value.into());
        self
    }

    pub fn error(mut self, code: impl Into<ResponseKey>, value: impl Into<OpenApiValue>) -> Self {
        self.errors.insert(code.into(), value.into());
        self
    }

    pub fn error_description(
        mut self,
        code: impl Into<ResponseKey>,
        description: impl Into<String>,
    ) -> Self {
        self.error_descriptions.insert(code.into(), description.into());
        self
    }

    pub fn error_content_type(mut self, content_type: impl Into<ContentType>) -> Self {
        self.error_content_types.push(content_type.into());
        self
    }

    pub fn error_header(mut self, value: impl Into<OpenApiValue>) -> Self {
        self.error_headers.push(value.into());
        self
    }

    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.auth.push(auth);
        self
    }
}

fn bag(values: Vec<OpenApiValue>) -> Option<OpenApiParameters> {
    if values.is_empty() {
        None
    } else {
        Some(OpenApiParameters::new(values))
    }
}

impl Route {
    /// Document the operation, its success response and its error responses at once
    #[deprecated(note = "use `Route::openapi` and `Route::response`")]
    pub fn openapi_legacy(&mut self, doc: LegacyOperationDoc) -> &mut Self {
        let success_description = doc.error_descriptions.get(&doc.success_code).cloned();

        self.openapi(OperationDoc {
            method: doc.method,
            spec_id: doc.spec_id,
            tags: doc.tags,
            summary: doc.summary,
            description: doc.description,
            operation_id: doc.operation_id,
            external_docs: None,
            query: bag(doc.query),
            headers: bag(doc.headers),
            path: bag(doc.path),
            cookies: bag(doc.cookies),
            body: doc.body.map(OpenApiBody),
            content_types: doc.content_types,
            links: doc.links,
            callbacks: doc.callbacks,
            deprecated: doc.deprecated,
            auth: doc.auth,
            servers: doc.servers,
            response: Some(ResponseDoc {
                status: doc.success_code,
                body: doc.response.map(OpenApiBody),
                content_types: doc.response_content_types,
                headers: bag(doc.response_headers),
                description: success_description,
            }),
        });

        let success_code = doc.success_code;
        let descriptions: IndexMap<ResponseKey, String> = doc
            .error_descriptions
            .into_iter()
            .filter(|(code, _)| *code != success_code)
            .collect();
        let codes: Vec<ResponseKey> = doc
            .errors
            .keys()
            .chain(descriptions.keys())
            .copied()
            .collect();
        if codes.is_empty() {
            return self;
        }

        let shared_headers = bag(doc.error_headers);
        let mut content_types = IndexMap::new();
        let mut headers = IndexMap::new();
        for code in &codes {
            if !doc.error_content_types.is_empty() {
                content_types.insert(*code, doc.error_content_types.clone());
            }
            if let Some(shared) = &shared_headers {
                headers.insert(*code, shared.clone());
            }
        }
        let bodies: IndexMap<ResponseKey, OpenApiBody> = doc
            .errors
            .into_iter()
            .map(|(code, value)| (code, OpenApiBody(value)))
            .collect();

        self.merge_response_maps(&bodies, &descriptions, &content_types, &headers)
    }
}
