use routedoc::specification::ReferenceOr;
use routedoc::{ApiSchema, SchemaRegistry};
use serde::Serialize;
use serde_json::json;

/// A registered account
#[derive(ApiSchema, Serialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    /// Stable identifier
    account_id: u64,
    display_name: String,
    #[serde(rename = "e-mail")]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(skip)]
    #[allow(dead_code)]
    password_hash: String,
}

#[derive(ApiSchema, Serialize)]
#[serde(rename_all = "snake_case")]
enum Role {
    Admin,
    ReadOnly,
    #[serde(rename = "guest")]
    Visitor,
}

#[derive(ApiSchema, Serialize)]
struct AccountId(u64);

#[derive(ApiSchema, Serialize)]
struct Page<T> {
    items: Vec<T>,
    total: u64,
}

#[test]
fn test_struct_schema_follows_serde() {
    let mut registry = SchemaRegistry::new();
    let reference = registry.resolve::<Account>();
    assert_eq!(reference.as_reference(), Some("#/components/schemas/Account"));

    let account = registry.get("Account").and_then(ReferenceOr::as_item).unwrap();
    assert_eq!(account.title.as_deref(), Some("Account"));
    assert_eq!(account.description.as_deref(), Some("A registered account"));

    let names: Vec<&str> = account.properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["accountId", "displayName", "e-mail", "roles"]);
    assert_eq!(
        account.required,
        vec!["accountId".to_string(), "displayName".to_string()]
    );

    let id = account.properties["accountId"].as_item().unwrap();
    assert_eq!(id.description.as_deref(), Some("Stable identifier"));
    assert_eq!(id.schema_type.as_deref(), Some("integer"));
    assert_eq!(
        account.properties["e-mail"].as_item().and_then(|s| s.nullable),
        Some(true)
    );
}

#[test]
fn test_unit_enum_is_string_enum() {
    let mut registry = SchemaRegistry::new();
    registry.resolve::<Account>();

    let role = registry.get("Role").and_then(ReferenceOr::as_item).unwrap();
    assert_eq!(role.schema_type.as_deref(), Some("string"));
    assert_eq!(
        role.enum_values,
        vec![json!("admin"), json!("read_only"), json!("guest")]
    );
}

#[test]
fn test_newtype_uses_inner_schema() {
    assert_eq!(AccountId::schema_name().as_deref(), Some("AccountId"));

    let mut registry = SchemaRegistry::new();
    let schema = AccountId::api_schema(&mut registry);
    assert_eq!(schema.schema_type.as_deref(), Some("integer"));
    assert_eq!(schema.format.as_deref(), Some("int64"));
}

#[test]
fn test_generic_types_are_inlined() {
    assert_eq!(Page::<Account>::schema_name(), None);

    let mut registry = SchemaRegistry::new();
    let page = registry.resolve::<Page<Account>>();
    let page = page.as_item().unwrap();
    assert!(page.properties.contains_key("items"));
    assert!(registry.contains("Account"));
    assert!(!registry.contains("Page"));
}
