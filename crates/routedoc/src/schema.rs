//! Schema generation for Rust types and example values.
//!
//! Types describe themselves through [`ApiSchema`]. Named types are stored once
//! in a [`SchemaRegistry`] and referenced everywhere else, so the same type used
//! as a query, a header bag and a body produces a single component schema.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::specification::{Example, ReferenceOr, Schema, EXAMPLE_REF_PREFIX, SCHEMA_REF_PREFIX};

/// Types that can describe themselves as an OpenAPI schema
pub trait ApiSchema {
    /// Stable component name; named types are registered and referenced,
    /// unnamed types are inlined
    fn schema_name() -> Option<String> {
        None
    }

    /// Inline schema of the type, registering any named types it refers to
    fn api_schema(registry: &mut SchemaRegistry) -> Schema;
}

/// Types that carry a canonical example value
pub trait ApiExample: ApiSchema + Serialize + Sized {
    fn api_example() -> Self;
}

/// `$ref` targets moved while merging registries, old reference to new
pub type ReferenceRenames = HashMap<String, String>;

/// Deduplicating store of component schemas keyed by type name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    entries: IndexMap<String, ReferenceOr<Schema>>,
    /// Full Rust type path to the key its schema is stored under
    #[serde(skip)]
    types: HashMap<&'static str, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema for `T`: a `$ref` for named types, inline otherwise.
    ///
    /// Distinct types sharing a schema name get distinct keys (`User`,
    /// `User2`, ...).
    pub fn resolve<T: ApiSchema + ?Sized>(&mut self) -> ReferenceOr<Schema> {
        let name = match T::schema_name() {
            Some(name) => name,
            None => return ReferenceOr::Item(T::api_schema(self)),
        };

        let type_name = std::any::type_name::<T>();
        if let Some(key) = self.types.get(type_name) {
            return schema_reference(key);
        }

        let key = if self.entries.contains_key(&name) {
            numbered_name(&name, |key| self.entries.contains_key(key))
        } else {
            name
        };
        self.types.insert(type_name, key.clone());
        // placeholder first so self-referencing types terminate
        self.entries
            .insert(key.clone(), ReferenceOr::Item(Schema::default()));
        let schema = T::api_schema(self);
        self.entries.insert(key.clone(), ReferenceOr::Item(schema));
        schema_reference(&key)
    }

    /// Register a schema under `name`.
    ///
    /// The same schema under the same name always yields the same reference;
    /// a different schema for a taken name gets a numbered key.
    pub fn register(&mut self, name: &str, schema: Schema) -> ReferenceOr<Schema> {
        let schema = ReferenceOr::Item(schema);
        let mut key = name.to_string();
        let mut suffix = 1;
        while let Some(existing) = self.entries.get(&key) {
            if *existing == schema {
                return schema_reference(&key);
            }
            suffix += 1;
            key = format!("{}{}", name, suffix);
        }
        self.entries.insert(key.clone(), schema);
        schema_reference(&key)
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceOr<Schema>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Follow component references until an inline schema is found
    pub fn lookup<'a>(&'a self, schema: &'a ReferenceOr<Schema>) -> Option<&'a Schema> {
        let mut current = schema;
        for _ in 0..32 {
            match current {
                ReferenceOr::Item(schema) => return Some(schema),
                ReferenceOr::Reference { reference } => {
                    let name = reference.strip_prefix(SCHEMA_REF_PREFIX)?;
                    current = self.entries.get(name)?;
                }
            }
        }
        None
    }

    /// Object schema behind `schema`, unwrapping a nullable `allOf` wrapper
    pub fn lookup_object<'a>(&'a self, schema: &'a ReferenceOr<Schema>) -> Option<&'a Schema> {
        let resolved = self.lookup(schema)?;
        if resolved.is_object() {
            return Some(resolved);
        }
        match resolved.all_of.as_slice() {
            [single] => self.lookup(single).filter(|s| s.is_object()),
            _ => None,
        }
    }

    /// Merge another registry into this one.
    ///
    /// Equal schemas under one name are stored once. An incoming schema whose
    /// name holds a different schema, directly or through the references it
    /// makes, moves to a numbered name. The returned map lists the moved
    /// references so callers can rewrite what points at them.
    pub fn merge(&mut self, other: &SchemaRegistry) -> ReferenceRenames {
        let mut moved: HashMap<&str, String> = HashMap::new();
        let renames = loop {
            let renames = reference_renames(SCHEMA_REF_PREFIX, &moved);
            let mut collided = Vec::new();
            for (name, schema) in &other.entries {
                if moved.contains_key(name.as_str()) {
                    continue;
                }
                if let Some(existing) = self.entries.get(name) {
                    let mut incoming = schema.clone();
                    rename_schema_refs(&mut incoming, &renames);
                    if *existing != incoming {
                        collided.push(name.as_str());
                    }
                }
            }
            if collided.is_empty() {
                break renames;
            }
            for name in collided {
                let key = numbered_name(name, |key| {
                    self.entries.contains_key(key)
                        || other.entries.contains_key(key)
                        || moved.values().any(|taken| taken == key)
                });
                tracing::warn!("Schema name '{}' is taken, storing it as '{}'", name, key);
                moved.insert(name, key);
            }
        };

        for (name, schema) in &other.entries {
            let key = moved.get(name.as_str()).unwrap_or(name);
            let mut schema = schema.clone();
            rename_schema_refs(&mut schema, &renames);
            self.entries.entry(key.clone()).or_insert(schema);
        }
        renames
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ReferenceOr<Schema>> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &IndexMap<String, ReferenceOr<Schema>> {
        &self.entries
    }
}

fn schema_reference(name: &str) -> ReferenceOr<Schema> {
    ReferenceOr::reference(format!("{}{}", SCHEMA_REF_PREFIX, name))
}

/// First of `name2`, `name3`, ... that is not taken
fn numbered_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut suffix = 2;
    loop {
        let key = format!("{}{}", name, suffix);
        if !taken(&key) {
            return key;
        }
        suffix += 1;
    }
}

fn reference_renames(prefix: &str, moved: &HashMap<&str, String>) -> ReferenceRenames {
    moved
        .iter()
        .map(|(from, to)| (format!("{}{}", prefix, from), format!("{}{}", prefix, to)))
        .collect()
}

/// Point a reference at its new target if it moved
pub(crate) fn rename_reference<T>(value: &mut ReferenceOr<T>, renames: &ReferenceRenames) {
    if let ReferenceOr::Reference { reference } = value {
        if let Some(target) = renames.get(reference.as_str()) {
            *reference = target.clone();
        }
    }
}

/// Rewrite every moved reference inside a schema tree
pub(crate) fn rename_schema_refs(schema: &mut ReferenceOr<Schema>, renames: &ReferenceRenames) {
    if renames.is_empty() {
        return;
    }
    rename_reference(schema, renames);
    if let ReferenceOr::Item(schema) = schema {
        let nested = schema
            .properties
            .values_mut()
            .chain(schema.additional_properties.as_deref_mut())
            .chain(schema.items.as_deref_mut())
            .chain(schema.all_of.iter_mut())
            .chain(schema.any_of.iter_mut())
            .chain(schema.one_of.iter_mut());
        for child in nested {
            rename_schema_refs(child, renames);
        }
    }
}

/// Store of component examples keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExampleRegistry {
    entries: IndexMap<String, ReferenceOr<Example>>,
}

impl ExampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an example value and return its key and reference.
    ///
    /// The same value under the same name always yields the same key; a
    /// different value for a taken name gets a numbered key.
    pub fn register(&mut self, name: &str, value: Value) -> (String, ReferenceOr<Example>) {
        let mut key = name.to_string();
        let mut suffix = 1;
        let mut taken = false;
        while let Some(existing) = self.entries.get(&key) {
            if matches!(existing, ReferenceOr::Item(example) if example.value.as_ref() == Some(&value)) {
                taken = true;
                break;
            }
            suffix += 1;
            key = format!("{}{}", name, suffix);
        }
        if !taken {
            self.entries.insert(
                key.clone(),
                ReferenceOr::Item(Example {
                    value: Some(value),
                    ..Default::default()
                }),
            );
        }
        let reference = ReferenceOr::reference(format!("{}{}", EXAMPLE_REF_PREFIX, key));
        (key, reference)
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceOr<Example>> {
        self.entries.get(name)
    }

    /// Merge another registry into this one. Equal examples share a key,
    /// a different example under a taken name moves to a numbered name.
    pub fn merge(&mut self, other: &ExampleRegistry) -> ReferenceRenames {
        let mut renames = ReferenceRenames::new();
        for (name, example) in &other.entries {
            match self.entries.get(name) {
                None => {
                    self.entries.insert(name.clone(), example.clone());
                }
                Some(existing) if existing == example => {}
                Some(_) => {
                    let key = numbered_name(name, |key| {
                        self.entries.contains_key(key) || other.entries.contains_key(key)
                    });
                    renames.insert(
                        format!("{}{}", EXAMPLE_REF_PREFIX, name),
                        format!("{}{}", EXAMPLE_REF_PREFIX, key),
                    );
                    self.entries.insert(key, example.clone());
                }
            }
        }
        renames
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &IndexMap<String, ReferenceOr<Example>> {
        &self.entries
    }
}

/// Infer a schema from an example value
pub fn infer_schema(value: &Value) -> Schema {
    match value {
        Value::Null => Schema {
            nullable: Some(true),
            ..Default::default()
        },
        Value::Bool(_) => Schema::of_type("boolean"),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                if i32::try_from(int).is_ok() {
                    Schema::with_format("integer", "int32")
                } else {
                    Schema::with_format("integer", "int64")
                }
            } else if number.is_u64() {
                Schema::with_format("integer", "int64")
            } else {
                Schema::with_format("number", "double")
            }
        }
        Value::String(text) => {
            if DateTime::parse_from_rfc3339(text).is_ok() {
                Schema::with_format("string", "date-time")
            } else if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() {
                Schema::with_format("string", "date")
            } else if uuid::Uuid::parse_str(text).is_ok() {
                Schema::with_format("string", "uuid")
            } else {
                Schema::of_type("string")
            }
        }
        Value::Array(items) => {
            let item_schema = items.first().map(infer_schema).unwrap_or_default();
            Schema::array(ReferenceOr::Item(item_schema))
        }
        Value::Object(fields) => {
            let mut schema = Schema::of_type("object");
            for (name, field) in fields {
                schema
                    .properties
                    .insert(name.clone(), ReferenceOr::Item(infer_schema(field)));
                if !field.is_null() {
                    schema.required.push(name.clone());
                }
            }
            schema
        }
    }
}

/// Component name for a concrete type: last path segment of a non-generic type
pub(crate) fn short_type_name<T: ?Sized>() -> Option<String> {
    let full = std::any::type_name::<T>().trim_start_matches('&');
    if full.contains('<') || full.contains('(') || full.contains('[') {
        return None;
    }
    let name = full.rsplit("::").next()?;
    if name == "Value" || name.chars().next().map_or(true, |c| c.is_lowercase()) {
        return None;
    }
    Some(name.to_string())
}

macro_rules! impl_api_schema {
    ($($ty:ty => $schema:expr),* $(,)?) => {
        $(
            impl ApiSchema for $ty {
                fn api_schema(_registry: &mut SchemaRegistry) -> Schema {
                    $schema
                }
            }
        )*
    };
}

fn unsigned(format: &str) -> Schema {
    Schema {
        minimum: Some(0.0),
        ..Schema::with_format("integer", format)
    }
}

impl_api_schema! {
    String => Schema::of_type("string"),
    str => Schema::of_type("string"),
    char => Schema { min_length: Some(1), max_length: Some(1), ..Schema::of_type("string") },
    bool => Schema::of_type("boolean"),
    i8 => Schema::with_format("integer", "int32"),
    i16 => Schema::with_format("integer", "int32"),
    i32 => Schema::with_format("integer", "int32"),
    i64 => Schema::with_format("integer", "int64"),
    isize => Schema::with_format("integer", "int64"),
    u8 => unsigned("int32"),
    u16 => unsigned("int32"),
    u32 => unsigned("int32"),
    u64 => unsigned("int64"),
    usize => unsigned("int64"),
    f32 => Schema::with_format("number", "float"),
    f64 => Schema::with_format("number", "double"),
    uuid::Uuid => Schema::with_format("string", "uuid"),
    DateTime<Utc> => Schema::with_format("string", "date-time"),
    NaiveDate => Schema::with_format("string", "date"),
    Value => Schema::default(),
}

impl<T: ApiSchema + ?Sized> ApiSchema for &T {
    fn schema_name() -> Option<String> {
        T::schema_name()
    }

    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        T::api_schema(registry)
    }
}

impl<T: ApiSchema + ?Sized> ApiSchema for Box<T> {
    fn schema_name() -> Option<String> {
        T::schema_name()
    }

    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        T::api_schema(registry)
    }
}

impl<T: ApiSchema> ApiSchema for Option<T> {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        match registry.resolve::<T>() {
            ReferenceOr::Item(mut schema) => {
                schema.nullable = Some(true);
                schema
            }
            reference => Schema {
                all_of: vec![reference],
                nullable: Some(true),
                ..Default::default()
            },
        }
    }
}

impl<T: ApiSchema> ApiSchema for Vec<T> {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        Schema::array(registry.resolve::<T>())
    }
}

impl<T: ApiSchema> ApiSchema for [T] {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        Schema::array(registry.resolve::<T>())
    }
}

impl<T: ApiSchema> ApiSchema for HashSet<T> {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        Schema::array(registry.resolve::<T>())
    }
}

impl<V: ApiSchema> ApiSchema for HashMap<String, V> {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        Schema {
            additional_properties: Some(Box::new(registry.resolve::<V>())),
            ..Schema::of_type("object")
        }
    }
}

impl<V: ApiSchema> ApiSchema for BTreeMap<String, V> {
    fn api_schema(registry: &mut SchemaRegistry) -> Schema {
        Schema {
            additional_properties: Some(Box::new(registry.resolve::<V>())),
            ..Schema::of_type("object")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    struct Pet;

    impl ApiSchema for Pet {
        fn schema_name() -> Option<String> {
            Some("Pet".to_string())
        }

        fn api_schema(registry: &mut SchemaRegistry) -> Schema {
            let mut schema = Schema::of_type("object");
            schema
                .properties
                .insert("name".to_string(), registry.resolve::<String>());
            // recursive reference must not loop
            schema
                .properties
                .insert("parent".to_string(), registry.resolve::<Option<Box<Pet>>>());
            schema.required.push("name".to_string());
            schema
        }
    }

    #[test]
    fn test_primitive_schema_generation() {
        let mut registry = SchemaRegistry::new();

        let string_schema = registry.resolve::<String>();
        assert_eq!(
            string_schema.as_item().unwrap().schema_type,
            Some("string".to_string())
        );

        let int_schema = registry.resolve::<i32>();
        assert_eq!(int_schema.as_item().unwrap().format, Some("int32".to_string()));

        let unsigned_schema = registry.resolve::<u64>();
        assert_eq!(unsigned_schema.as_item().unwrap().minimum, Some(0.0));

        assert!(registry.is_empty());
    }

    #[test]
    fn test_optional_schema_generation() {
        let mut registry = SchemaRegistry::new();
        let schema = registry.resolve::<Option<String>>();
        let schema = schema.as_item().unwrap();
        assert_eq!(schema.schema_type, Some("string".to_string()));
        assert_eq!(schema.nullable, Some(true));
    }

    #[test]
    fn test_array_schema_generation() {
        let mut registry = SchemaRegistry::new();
        let schema = registry.resolve::<Vec<uuid::Uuid>>();
        let schema = schema.as_item().unwrap();
        assert_eq!(schema.schema_type, Some("array".to_string()));
        let items = schema.items.as_ref().unwrap().as_item().unwrap();
        assert_eq!(items.format, Some("uuid".to_string()));
    }

    #[test]
    fn test_named_types_are_registered_once() {
        let mut registry = SchemaRegistry::new();

        let first = registry.resolve::<Pet>();
        let second = registry.resolve::<Vec<Pet>>();

        assert_eq!(first.as_reference(), Some("#/components/schemas/Pet"));
        let items = second.as_item().unwrap().items.as_ref().unwrap();
        assert_eq!(items.as_reference(), Some("#/components/schemas/Pet"));
        assert_eq!(registry.len(), 1);

        let stored = registry.lookup(&first).unwrap();
        assert_eq!(stored.required, vec!["name".to_string()]);
        let parent = stored.properties["parent"].as_item().unwrap();
        assert_eq!(parent.all_of[0].as_reference(), Some("#/components/schemas/Pet"));
        assert_eq!(parent.nullable, Some(true));
    }

    #[test]
    fn test_register_numbers_different_schemas() {
        let mut registry = SchemaRegistry::new();
        let a = registry.register("Thing", Schema::of_type("object"));
        let again = registry.register("Thing", Schema::of_type("object"));
        let b = registry.register("Thing", Schema::of_type("string"));

        assert_eq!(a, again);
        assert_eq!(a.as_reference(), Some("#/components/schemas/Thing"));
        assert_eq!(b.as_reference(), Some("#/components/schemas/Thing2"));
        assert_eq!(
            registry.get("Thing2").unwrap().as_item().unwrap().schema_type.as_deref(),
            Some("string")
        );
    }

    mod billing {
        use super::*;

        pub struct Pet;

        impl ApiSchema for Pet {
            fn schema_name() -> Option<String> {
                Some("Pet".to_string())
            }

            fn api_schema(_: &mut SchemaRegistry) -> Schema {
                Schema::of_type("string")
            }
        }
    }

    #[test]
    fn test_same_short_name_different_types() {
        let mut registry = SchemaRegistry::new();

        let pet = registry.resolve::<Pet>();
        let other = registry.resolve::<billing::Pet>();
        let pet_again = registry.resolve::<Pet>();

        assert_eq!(pet.as_reference(), Some("#/components/schemas/Pet"));
        assert_eq!(other.as_reference(), Some("#/components/schemas/Pet2"));
        assert_eq!(pet_again, pet);
        assert!(registry.lookup(&pet).unwrap().is_object());
        assert_eq!(
            registry.lookup(&other).unwrap().schema_type.as_deref(),
            Some("string")
        );
    }

    #[test]
    #[traced_test]
    fn test_merge_moves_colliding_names() {
        let mut first = SchemaRegistry::new();
        first.resolve::<Vec<Pet>>();

        let mut second = SchemaRegistry::new();
        let mut owner = Schema::of_type("object");
        owner
            .properties
            .insert("pet".to_string(), second.resolve::<billing::Pet>());
        second.register("Owner", owner);

        let mut merged = first.clone();
        assert!(merged.merge(&first).is_empty());
        assert_eq!(merged, first);

        let renames = merged.merge(&second);
        assert_eq!(
            renames.get("#/components/schemas/Pet").map(String::as_str),
            Some("#/components/schemas/Pet2")
        );
        assert!(merged.lookup(&schema_reference("Pet")).unwrap().is_object());

        let owner = merged.get("Owner").unwrap().as_item().unwrap();
        let pet = &owner.properties["pet"];
        assert_eq!(pet.as_reference(), Some("#/components/schemas/Pet2"));
        assert_eq!(
            merged.lookup(pet).unwrap().schema_type.as_deref(),
            Some("string")
        );
        assert!(logs_contain("Schema name 'Pet' is taken"));
    }

    #[test]
    fn test_merge_examples_numbers_different_values() {
        let mut first = ExampleRegistry::new();
        first.register("User", json!({"id": 1}));

        let mut second = ExampleRegistry::new();
        second.register("User", json!({"id": 1}));
        second.register("Admin", json!({"id": 9}));
        let mut third = ExampleRegistry::new();
        third.register("User", json!({"id": 2}));

        assert!(first.merge(&second).is_empty());
        let renames = first.merge(&third);

        assert_eq!(first.len(), 3);
        assert_eq!(
            renames.get("#/components/examples/User").map(String::as_str),
            Some("#/components/examples/User2")
        );
    }

    #[test]
    fn test_lookup_object_unwraps_nullable_reference() {
        let mut registry = SchemaRegistry::new();
        let optional = registry.resolve::<Option<Pet>>();
        let object = registry.lookup_object(&optional).unwrap();
        assert!(object.properties.contains_key("name"));
    }

    #[test]
    fn test_example_registry_keys() {
        let mut examples = ExampleRegistry::new();
        let (first, _) = examples.register("User", json!({"id": 1}));
        let (again, _) = examples.register("User", json!({"id": 1}));
        let (other, reference) = examples.register("User", json!({"id": 2}));

        assert_eq!(first, "User");
        assert_eq!(again, "User");
        assert_eq!(other, "User2");
        assert_eq!(reference.as_reference(), Some("#/components/examples/User2"));
        assert_eq!(examples.len(), 2);
    }

    #[test]
    fn test_infer_schema_from_value() {
        let schema = infer_schema(&json!({
            "id": 7,
            "big": 10_000_000_000i64,
            "ratio": 0.5,
            "created": "2023-12-01T12:00:00Z",
            "day": "2023-12-01",
            "key": "123e4567-e89b-12d3-a456-426614174000",
            "tags": ["a"],
            "nickname": null
        }));

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        let prop = |name: &str| schema.properties[name].as_item().unwrap().clone();
        assert_eq!(prop("id").format.as_deref(), Some("int32"));
        assert_eq!(prop("big").format.as_deref(), Some("int64"));
        assert_eq!(prop("ratio").schema_type.as_deref(), Some("number"));
        assert_eq!(prop("created").format.as_deref(), Some("date-time"));
        assert_eq!(prop("day").format.as_deref(), Some("date"));
        assert_eq!(prop("key").format.as_deref(), Some("uuid"));
        assert_eq!(prop("tags").schema_type.as_deref(), Some("array"));
        assert!(!schema.required.contains(&"nickname".to_string()));
        assert_eq!(schema.required.len(), 7);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Pet>(), Some("Pet".to_string()));
        assert_eq!(short_type_name::<Vec<String>>(), None);
        assert_eq!(short_type_name::<str>(), None);
        assert_eq!(short_type_name::<Value>(), None);
    }
}
