//! Documentation inputs: example values, type descriptors and raw schemas.
//!
//! Every place that accepts a parameter bag, a body or a header bag takes an
//! [`OpenApiValue`], and the extraction here turns it into parameters, media
//! types or headers while registering named schemas and examples.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{RouteDocError, RouteDocResult};
use crate::headers::HeadersType;
use crate::schema::{
    infer_schema, short_type_name, ApiExample, ApiSchema, ExampleRegistry, SchemaRegistry,
};
use crate::specification::{
    Header, MediaType, Parameter, ParameterLocation, ReferenceOr, RequestBody, Schema,
};

/// A concrete value documented by example
#[derive(Debug, Clone)]
pub struct ExampleValue {
    name: Option<String>,
    value: Result<Value, String>,
}

impl ExampleValue {
    /// Serialize `value`; a failure surfaces when the value is extracted
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Self {
        Self {
            name: short_type_name::<T>(),
            value: serde_json::to_value(value).map_err(|e| e.to_string()),
        }
    }

    /// Override the component name used for the example and its schema
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> RouteDocResult<&Value> {
        self.value.as_ref().map_err(RouteDocError::schema_error)
    }
}

impl From<Value> for ExampleValue {
    fn from(value: Value) -> Self {
        Self {
            name: None,
            value: Ok(value),
        }
    }
}

/// A type documented through its [`ApiSchema`] implementation
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    type_name: &'static str,
    schema_name: fn() -> Option<String>,
    resolve: fn(&mut SchemaRegistry) -> ReferenceOr<Schema>,
    example: Option<fn() -> serde_json::Result<Value>>,
}

fn resolve_type<T: ApiSchema + ?Sized>(registry: &mut SchemaRegistry) -> ReferenceOr<Schema> {
    registry.resolve::<T>()
}

fn example_of<T: ApiExample>() -> serde_json::Result<Value> {
    serde_json::to_value(T::api_example())
}

impl TypeDescriptor {
    pub fn of<T: ApiSchema + ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            schema_name: T::schema_name,
            resolve: resolve_type::<T>,
            example: None,
        }
    }

    /// Descriptor that also documents the type's canonical example
    pub fn with_example<T: ApiExample>() -> Self {
        Self {
            example: Some(example_of::<T>),
            ..Self::of::<T>()
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn schema_name(&self) -> Option<String> {
        (self.schema_name)()
    }

    /// Schema of the type, registering it when named
    pub fn resolve(&self, schemas: &mut SchemaRegistry) -> ReferenceOr<Schema> {
        (self.resolve)(schemas)
    }

    pub fn example(&self) -> Option<serde_json::Result<Value>> {
        self.example.map(|example| example())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("has_example", &self.example.is_some())
            .finish()
    }
}

/// One documentation input: an example, a type, or a raw schema
#[derive(Debug, Clone)]
pub enum OpenApiValue {
    Example(ExampleValue),
    Type(TypeDescriptor),
    Schema(ReferenceOr<Schema>),
}

impl OpenApiValue {
    pub fn example<T: Serialize + ?Sized>(value: &T) -> Self {
        OpenApiValue::Example(ExampleValue::new(value))
    }

    pub fn of<T: ApiSchema + ?Sized>() -> Self {
        OpenApiValue::Type(TypeDescriptor::of::<T>())
    }

    pub fn with_example<T: ApiExample>() -> Self {
        OpenApiValue::Type(TypeDescriptor::with_example::<T>())
    }

    pub fn schema(schema: impl Into<ReferenceOr<Schema>>) -> Self {
        OpenApiValue::Schema(schema.into())
    }

    /// Object schema and example object the value describes
    fn object(&self, schemas: &mut SchemaRegistry) -> RouteDocResult<(Schema, Option<Value>)> {
        match self {
            OpenApiValue::Example(example) => {
                let value = example.value()?.clone();
                let schema = infer_schema(&value);
                if !schema.is_object() {
                    return Err(RouteDocError::schema_error(format!(
                        "example value {} is not an object",
                        value
                    )));
                }
                Ok((schema, Some(value)))
            }
            OpenApiValue::Type(descriptor) => {
                let resolved = descriptor.resolve(schemas);
                let schema = schemas.lookup_object(&resolved).cloned().ok_or_else(|| {
                    RouteDocError::schema_error(format!(
                        "{} does not describe an object",
                        descriptor.type_name()
                    ))
                })?;
                let example = descriptor.example().and_then(Result::ok);
                Ok((schema, example))
            }
            OpenApiValue::Schema(schema) => {
                let object = schemas.lookup_object(schema).cloned().ok_or_else(|| {
                    RouteDocError::schema_error("raw schema does not describe an object")
                })?;
                Ok((object, None))
            }
        }
    }

    /// One parameter per property of the described object
    pub fn parameters(
        &self,
        location: ParameterLocation,
        schemas: &mut SchemaRegistry,
    ) -> RouteDocResult<Vec<ReferenceOr<Parameter>>> {
        let (object, example) = self.object(schemas)?;

        let parameters = object
            .properties
            .iter()
            .map(|(name, property)| {
                let mut parameter = Parameter::new(name.clone(), location, property.clone());
                parameter.description = property.as_item().and_then(|s| s.description.clone());
                parameter.required =
                    Some(location == ParameterLocation::Path || object.required.contains(name));
                parameter.example = example.as_ref().and_then(|v| v.get(name)).cloned();
                ReferenceOr::Item(parameter)
            })
            .collect();

        Ok(parameters)
    }

    /// Media type carrying the value's schema and example
    pub fn media_type(
        &self,
        schemas: &mut SchemaRegistry,
        examples: &mut ExampleRegistry,
    ) -> RouteDocResult<MediaType> {
        match self {
            OpenApiValue::Example(example) => {
                let value = example.value()?.clone();
                let schema = infer_schema(&value);
                match example.name() {
                    Some(name) if schema.is_object() => {
                        let schema = schemas.register(name, schema);
                        let (key, reference) = examples.register(name, value);
                        Ok(MediaType {
                            schema: Some(schema),
                            examples: IndexMap::from([(key, reference)]),
                            ..Default::default()
                        })
                    }
                    _ => Ok(MediaType {
                        schema: Some(ReferenceOr::Item(schema)),
                        example: Some(value),
                        ..Default::default()
                    }),
                }
            }
            OpenApiValue::Type(descriptor) => {
                let mut media = MediaType {
                    schema: Some(descriptor.resolve(schemas)),
                    ..Default::default()
                };
                match descriptor.example() {
                    Some(Ok(value)) => match descriptor.schema_name() {
                        Some(name) => {
                            let (key, reference) = examples.register(&name, value);
                            media.examples.insert(key, reference);
                        }
                        None => media.example = Some(value),
                    },
                    Some(Err(err)) => {
                        tracing::warn!(
                            "Dropping example of {}: {}",
                            descriptor.type_name(),
                            err
                        );
                    }
                    None => {}
                }
                Ok(media)
            }
            OpenApiValue::Schema(schema) => Ok(MediaType {
                schema: Some(schema.clone()),
                ..Default::default()
            }),
        }
    }
}

impl From<ExampleValue> for OpenApiValue {
    fn from(example: ExampleValue) -> Self {
        OpenApiValue::Example(example)
    }
}

impl From<Value> for OpenApiValue {
    fn from(value: Value) -> Self {
        OpenApiValue::Example(ExampleValue::from(value))
    }
}

impl From<TypeDescriptor> for OpenApiValue {
    fn from(descriptor: TypeDescriptor) -> Self {
        OpenApiValue::Type(descriptor)
    }
}

impl From<Schema> for OpenApiValue {
    fn from(schema: Schema) -> Self {
        OpenApiValue::Schema(ReferenceOr::Item(schema))
    }
}

impl From<ReferenceOr<Schema>> for OpenApiValue {
    fn from(schema: ReferenceOr<Schema>) -> Self {
        OpenApiValue::Schema(schema)
    }
}

/// Parameters for one location, described by one or more values
#[derive(Debug, Clone, Default)]
pub struct OpenApiParameters {
    values: Vec<OpenApiValue>,
}

impl OpenApiParameters {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = OpenApiValue>,
    {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn of<T: ApiSchema + ?Sized>() -> Self {
        OpenApiValue::of::<T>().into()
    }

    pub fn with_example<T: ApiExample>() -> Self {
        OpenApiValue::with_example::<T>().into()
    }

    pub fn example<T: Serialize + ?Sized>(value: &T) -> Self {
        OpenApiValue::example(value).into()
    }

    pub fn schema(schema: impl Into<ReferenceOr<Schema>>) -> Self {
        OpenApiValue::schema(schema).into()
    }

    /// Concatenation of several parameter bags
    pub fn all_of<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = OpenApiParameters>,
    {
        Self {
            values: parts.into_iter().flat_map(|p| p.values).collect(),
        }
    }

    /// Header fields of a header bag type
    pub fn headers_of<H: HeadersType>() -> Self {
        Self::of::<H>()
    }

    /// Cookie fields declared by a header bag type
    pub fn cookies_of<H: HeadersType>() -> Self {
        Self::of::<H::Cookies>()
    }

    pub fn values(&self) -> &[OpenApiValue] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn parameters(
        &self,
        location: ParameterLocation,
        schemas: &mut SchemaRegistry,
    ) -> RouteDocResult<Vec<ReferenceOr<Parameter>>> {
        let mut parameters = Vec::new();
        for value in &self.values {
            parameters.extend(value.parameters(location, schemas)?);
        }
        Ok(parameters)
    }

    /// Response headers, one per described field
    pub fn headers(
        &self,
        schemas: &mut SchemaRegistry,
    ) -> RouteDocResult<IndexMap<String, ReferenceOr<Header>>> {
        let headers = self
            .parameters(ParameterLocation::Header, schemas)?
            .into_iter()
            .filter_map(|parameter| match parameter {
                ReferenceOr::Item(parameter) => Some(parameter),
                ReferenceOr::Reference { .. } => None,
            })
            .map(|parameter| {
                let name = parameter.name.clone();
                (name, ReferenceOr::Item(header_from(parameter)))
            })
            .collect();
        Ok(headers)
    }
}

fn header_from(parameter: Parameter) -> Header {
    Header {
        description: parameter.description,
        required: parameter.required,
        deprecated: parameter.deprecated,
        schema: parameter.schema,
        example: parameter.example,
    }
}

impl From<OpenApiValue> for OpenApiParameters {
    fn from(value: OpenApiValue) -> Self {
        Self {
            values: vec![value],
        }
    }
}

impl From<Vec<OpenApiValue>> for OpenApiParameters {
    fn from(values: Vec<OpenApiValue>) -> Self {
        Self { values }
    }
}

impl From<Value> for OpenApiParameters {
    fn from(value: Value) -> Self {
        OpenApiValue::from(value).into()
    }
}

/// A request or response body
#[derive(Debug, Clone)]
pub struct OpenApiBody(pub OpenApiValue);

impl OpenApiBody {
    pub fn of<T: ApiSchema + ?Sized>() -> Self {
        Self(OpenApiValue::of::<T>())
    }

    pub fn with_example<T: ApiExample>() -> Self {
        Self(OpenApiValue::with_example::<T>())
    }

    pub fn example<T: Serialize + ?Sized>(value: &T) -> Self {
        Self(OpenApiValue::example(value))
    }

    pub fn schema(schema: impl Into<ReferenceOr<Schema>>) -> Self {
        Self(OpenApiValue::schema(schema))
    }

    pub fn media_type(
        &self,
        schemas: &mut SchemaRegistry,
        examples: &mut ExampleRegistry,
    ) -> RouteDocResult<MediaType> {
        self.0.media_type(schemas, examples)
    }
}

impl From<OpenApiValue> for OpenApiBody {
    fn from(value: OpenApiValue) -> Self {
        Self(value)
    }
}

impl From<Value> for OpenApiBody {
    fn from(value: Value) -> Self {
        Self(value.into())
    }
}

/// Media type name such as `application/json`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType(String);

impl ContentType {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self(media_type.into())
    }

    pub fn json() -> Self {
        Self::new("application/json")
    }

    pub fn form() -> Self {
        Self::new("application/x-www-form-urlencoded")
    }

    pub fn multipart() -> Self {
        Self::new("multipart/form-data")
    }

    pub fn text() -> Self {
        Self::new("text/plain")
    }

    pub fn octet_stream() -> Self {
        Self::new("application/octet-stream")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::json()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentType {
    fn from(media_type: &str) -> Self {
        Self::new(media_type)
    }
}

impl From<String> for ContentType {
    fn from(media_type: String) -> Self {
        Self(media_type)
    }
}

/// One content entry per media type, `application/json` when none are given
pub(crate) fn fan_out(media: MediaType, types: &[ContentType]) -> IndexMap<String, MediaType> {
    if types.is_empty() {
        return IndexMap::from([(ContentType::json().to_string(), media)]);
    }
    types
        .iter()
        .map(|content_type| (content_type.to_string(), media.clone()))
        .collect()
}

/// Required request body documenting `body` under every content type
pub(crate) fn request_body(
    body: &OpenApiBody,
    types: &[ContentType],
    schemas: &mut SchemaRegistry,
    examples: &mut ExampleRegistry,
) -> RouteDocResult<RequestBody> {
    let media = body.media_type(schemas, examples)?;
    Ok(RequestBody {
        description: None,
        content: fan_out(media, types),
        required: Some(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Login {
        user: String,
        remember: bool,
    }

    struct Paging;

    impl ApiSchema for Paging {
        fn schema_name() -> Option<String> {
            Some("Paging".to_string())
        }

        fn api_schema(registry: &mut SchemaRegistry) -> Schema {
            let mut schema = Schema::of_type("object");
            schema.properties.insert("page".to_string(), registry.resolve::<u32>());
            schema.properties.insert(
                "per_page".to_string(),
                ReferenceOr::Item(Schema {
                    description: Some("Items per page".to_string()),
                    ..Schema::with_format("integer", "int32")
                }),
            );
            schema.required.push("page".to_string());
            schema
        }
    }

    #[derive(Serialize)]
    struct PagingExample {
        page: u32,
        per_page: u32,
    }

    impl ApiSchema for PagingExample {
        fn schema_name() -> Option<String> {
            Paging::schema_name()
        }

        fn api_schema(registry: &mut SchemaRegistry) -> Schema {
            Paging::api_schema(registry)
        }
    }

    impl ApiExample for PagingExample {
        fn api_example() -> Self {
            PagingExample { page: 1, per_page: 20 }
        }
    }

    fn parameter(p: &ReferenceOr<Parameter>) -> &Parameter {
        p.as_item().unwrap()
    }

    #[test]
    fn test_parameters_from_type() {
        let mut schemas = SchemaRegistry::new();
        let params = OpenApiParameters::of::<Paging>()
            .parameters(ParameterLocation::Query, &mut schemas)
            .unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(parameter(&params[0]).name, "page");
        assert_eq!(parameter(&params[0]).required, Some(true));
        assert_eq!(parameter(&params[1]).required, Some(false));
        assert_eq!(
            parameter(&params[1]).description.as_deref(),
            Some("Items per page")
        );
        assert!(schemas.contains("Paging"));
    }

    #[test]
    fn test_parameters_carry_examples() {
        let mut schemas = SchemaRegistry::new();
        let params = OpenApiParameters::with_example::<PagingExample>()
            .parameters(ParameterLocation::Query, &mut schemas)
            .unwrap();

        assert_eq!(parameter(&params[0]).example, Some(json!(1)));
        assert_eq!(parameter(&params[1]).example, Some(json!(20)));
    }

    #[test]
    fn test_parameters_from_example_value() {
        let mut schemas = SchemaRegistry::new();
        let params = OpenApiParameters::example(&Login {
            user: "ada".to_string(),
            remember: true,
        })
        .parameters(ParameterLocation::Cookie, &mut schemas)
        .unwrap();

        assert_eq!(params.len(), 2);
        let user = parameter(&params[0]);
        assert_eq!(user.location, ParameterLocation::Cookie);
        assert_eq!(user.example, Some(json!("ada")));
        assert!(schemas.is_empty());
    }

    #[test]
    fn test_non_object_and_unserializable_values_fail() {
        let mut schemas = SchemaRegistry::new();

        let scalar = OpenApiParameters::example(&5).parameters(ParameterLocation::Query, &mut schemas);
        assert!(matches!(scalar, Err(RouteDocError::Schema(_))));

        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys");
        let unserializable =
            OpenApiParameters::example(&bad).parameters(ParameterLocation::Query, &mut schemas);
        assert!(matches!(unserializable, Err(RouteDocError::Schema(_))));
    }

    #[test]
    fn test_path_parameters_are_required() {
        let mut schemas = SchemaRegistry::new();
        let params = OpenApiParameters::of::<Paging>()
            .parameters(ParameterLocation::Path, &mut schemas)
            .unwrap();
        assert!(params.iter().all(|p| parameter(p).required == Some(true)));
    }

    #[test]
    fn test_headers_from_parameters() {
        let mut schemas = SchemaRegistry::new();
        let headers = OpenApiParameters::example(&json!({"X-Rate-Limit": 100}))
            .headers(&mut schemas)
            .unwrap();

        let header = headers["X-Rate-Limit"].as_item().unwrap();
        assert_eq!(header.example, Some(json!(100)));
        assert_eq!(header.required, Some(true));
    }

    #[test]
    fn test_named_example_registers_schema_and_example() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let media = OpenApiBody::example(&Login {
            user: "ada".to_string(),
            remember: false,
        })
        .media_type(&mut schemas, &mut examples)
        .unwrap();

        assert_eq!(
            media.schema.as_ref().and_then(|s| s.as_reference()),
            Some("#/components/schemas/Login")
        );
        assert_eq!(
            media.examples["Login"].as_reference(),
            Some("#/components/examples/Login")
        );
        assert_eq!(examples.len(), 1);
    }

    #[test]
    fn test_anonymous_example_is_inlined() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let media = OpenApiBody::example(&vec![1, 2, 3])
            .media_type(&mut schemas, &mut examples)
            .unwrap();

        assert_eq!(media.example, Some(json!([1, 2, 3])));
        assert!(schemas.is_empty());
        assert!(examples.is_empty());
    }

    #[test]
    fn test_type_with_example_body() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let media = OpenApiBody::with_example::<PagingExample>()
            .media_type(&mut schemas, &mut examples)
            .unwrap();

        assert_eq!(
            media.schema.as_ref().and_then(|s| s.as_reference()),
            Some("#/components/schemas/Paging")
        );
        assert!(media.examples.contains_key("Paging"));
    }

    #[test]
    fn test_request_body_fan_out() {
        let mut schemas = SchemaRegistry::new();
        let mut examples = ExampleRegistry::new();
        let body = request_body(
            &OpenApiBody::of::<Paging>(),
            &[ContentType::json(), ContentType::form()],
            &mut schemas,
            &mut examples,
        )
        .unwrap();

        assert_eq!(body.required, Some(true));
        assert_eq!(body.content.len(), 2);
        assert_eq!(
            body.content["application/json"],
            body.content["application/x-www-form-urlencoded"]
        );

        let default = fan_out(MediaType::default(), &[]);
        assert!(default.contains_key("application/json"));
    }
}
