/*!
Structural checks on generated documents.
*/

use std::collections::{HashMap, HashSet};

use crate::specification::{
    Header, MediaType, OpenApiSpec, Operation, Parameter, ReferenceOr, Schema, SCHEMA_REF_PREFIX,
};

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

/// Validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub message: String,
    pub level: ValidationLevel,
}

impl ValidationWarning {
    pub fn new(message: &str, level: ValidationLevel) -> Self {
        Self {
            message: message.to_string(),
            level,
        }
    }
}

/// Validate a generated document
pub fn validate_spec(spec: &OpenApiSpec) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if spec.info.title.is_empty() {
        warnings.push(ValidationWarning::new(
            "info.title is required but empty",
            ValidationLevel::Error,
        ));
    }

    if spec.info.version.is_empty() {
        warnings.push(ValidationWarning::new(
            "info.version is required but empty",
            ValidationLevel::Error,
        ));
    }

    if !spec.openapi.starts_with("3.0") {
        warnings.push(ValidationWarning::new(
            &format!("OpenAPI version {} may not be fully supported", spec.openapi),
            ValidationLevel::Warning,
        ));
    }

    let mut operation_ids: HashMap<&str, usize> = HashMap::new();

    for (path, path_item) in &spec.paths {
        if !path.starts_with('/') {
            warnings.push(ValidationWarning::new(
                &format!("Path '{}' should start with '/'", path),
                ValidationLevel::Warning,
            ));
        }

        let operations = path_item.operations();
        if operations.is_empty() {
            warnings.push(ValidationWarning::new(
                &format!("Path '{}' has no operations defined", path),
                ValidationLevel::Warning,
            ));
        }

        for (method, operation) in operations {
            if operation.responses.is_empty() {
                warnings.push(ValidationWarning::new(
                    &format!("{} {} has no responses defined", method, path),
                    ValidationLevel::Error,
                ));
            }

            if let Some(id) = &operation.operation_id {
                *operation_ids.entry(id.as_str()).or_default() += 1;
            }
        }
    }

    let mut duplicates: Vec<(&str, usize)> = operation_ids
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    duplicates.sort();
    for (id, count) in duplicates {
        warnings.push(ValidationWarning::new(
            &format!("operationId '{}' is used by {} operations", id, count),
            ValidationLevel::Error,
        ));
    }

    if let Some(components) = &spec.components {
        let referenced = referenced_schemas(spec);
        for name in components.schemas.keys() {
            if !referenced.contains(&format!("{}{}", SCHEMA_REF_PREFIX, name)) {
                warnings.push(ValidationWarning::new(
                    &format!("Schema '{}' is defined but never referenced", name),
                    ValidationLevel::Info,
                ));
            }
        }
    }

    warnings
}

/// Every `$ref` reachable from operations and components
fn referenced_schemas(spec: &OpenApiSpec) -> HashSet<String> {
    let mut refs = HashSet::new();

    for path_item in spec.paths.values() {
        for parameter in &path_item.parameters {
            collect_parameter(parameter, &mut refs);
        }
        for (_, operation) in path_item.operations() {
            collect_operation(operation, &mut refs);
        }
    }

    if let Some(components) = &spec.components {
        for schema in components.schemas.values() {
            collect_schema(schema, &mut refs);
        }
        for response in components.responses.values().filter_map(ReferenceOr::as_item) {
            collect_media(response.content.values(), &mut refs);
            for header in response.headers.values() {
                collect_header(header, &mut refs);
            }
        }
        for body in components.request_bodies.values().filter_map(ReferenceOr::as_item) {
            collect_media(body.content.values(), &mut refs);
        }
        for parameter in components.parameters.values() {
            collect_parameter(parameter, &mut refs);
        }
        for header in components.headers.values() {
            collect_header(header, &mut refs);
        }
    }

    refs
}

fn collect_operation(operation: &Operation, refs: &mut HashSet<String>) {
    for parameter in operation.parameters.iter().flatten() {
        collect_parameter(parameter, refs);
    }
    if let Some(ReferenceOr::Item(body)) = &operation.request_body {
        collect_media(body.content.values(), refs);
    }
    for response in operation.responses.values() {
        collect_media(response.content.values(), refs);
        for header in response.headers.values() {
            collect_header(header, refs);
        }
    }
}

fn collect_parameter(parameter: &ReferenceOr<Parameter>, refs: &mut HashSet<String>) {
    if let Some(schema) = parameter.as_item().and_then(|p| p.schema.as_ref()) {
        collect_schema(schema, refs);
    }
}

fn collect_header(header: &ReferenceOr<Header>, refs: &mut HashSet<String>) {
    if let Some(schema) = header.as_item().and_then(|h| h.schema.as_ref()) {
        collect_schema(schema, refs);
    }
}

fn collect_media<'a, I>(media: I, refs: &mut HashSet<String>)
where
    I: Iterator<Item = &'a MediaType>,
{
    for media_type in media {
        if let Some(schema) = &media_type.schema {
            collect_schema(schema, refs);
        }
    }
}

fn collect_schema(schema: &ReferenceOr<Schema>, refs: &mut HashSet<String>) {
    let schema = match schema {
        ReferenceOr::Reference { reference } => {
            refs.insert(reference.clone());
            return;
        }
        ReferenceOr::Item(schema) => schema,
    };

    for property in schema.properties.values() {
        collect_schema(property, refs);
    }
    if let Some(additional) = &schema.additional_properties {
        collect_schema(additional, refs);
    }
    if let Some(items) = &schema.items {
        collect_schema(items, refs);
    }
    for composed in schema.all_of.iter().chain(&schema.any_of).chain(&schema.one_of) {
        collect_schema(composed, refs);
    }
}
