//! Merge engine
//!
//! Folds service-level fragments and action-level path entries into one
//! document. Precedence, from weakest to strongest:
//!
//! 1. the base document (template plus operator overrides)
//! 2. service `settings.openapi` fragments, in registry order
//! 3. action path entries, in registry order (`paths[route][method]`, last wins)

use crate::error::{AggregationStep, ApiForgeError, Result};
use crate::registry::{ActionDescriptor, ServiceDescriptor};
use crate::security;
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Field of a path entry holding `"<METHOD> <ROUTE>"`
pub const PATH_KEY: &str = "$path";

/// HTTP methods an OpenAPI path item can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

/// A resolved action path entry
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub method: HttpMethod,
    pub route: String,
    /// Operation object with [`PATH_KEY`] removed
    pub operation: Value,
}

impl PathEntry {
    /// Parses one path entry element. The element itself is left untouched.
    pub fn from_fragment(element: &Value) -> Result<Self> {
        let Some(object) = element.as_object() else {
            return Err(ApiForgeError::invalid_fragment(format!(
                "path entry must be an object, found {}",
                kind(element)
            )));
        };

        let mut operation = object.clone();
        let (method, route) = match operation.remove(PATH_KEY) {
            Some(Value::String(raw)) => parse_path_key(&raw)?,
            Some(other) => {
                return Err(ApiForgeError::invalid_fragment(format!(
                    "`{PATH_KEY}` must be a string, found {}",
                    kind(&other)
                )));
            }
            None => {
                return Err(ApiForgeError::invalid_fragment(format!(
                    "missing `{PATH_KEY}` field"
                )));
            }
        };

        Ok(Self {
            method,
            route,
            operation: Value::Object(operation),
        })
    }
}

/// Splits `"POST /products"` on the first space into method and route.
pub fn parse_path_key(raw: &str) -> Result<(HttpMethod, String)> {
    let malformed = || {
        ApiForgeError::invalid_fragment(format!(
            "`{PATH_KEY}` value {raw:?} is not of the form \"<METHOD> <ROUTE>\""
        ))
    };

    let (method, route) = raw.trim_start().split_once(' ').ok_or_else(malformed)?;
    let route = route.trim();
    if route.is_empty() {
        return Err(malformed());
    }

    let method = method.parse::<HttpMethod>().map_err(|_| {
        ApiForgeError::invalid_fragment(format!("unsupported HTTP method {method:?} in {raw:?}"))
    })?;

    Ok((method, route.to_string()))
}

/// Recursively merges `source` into `target`.
///
/// Objects merge key by key; anything else in `source` (arrays included)
/// replaces what `target` holds.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Elements of an action fragment: a sequence as-is, a single object as one
/// element, anything else as nothing.
pub fn fragment_elements(fragment: &Value) -> &[Value] {
    match fragment {
        Value::Array(items) => items,
        Value::Object(_) => std::slice::from_ref(fragment),
        _ => &[],
    }
}

/// Assembles one document from `base` and the registry snapshot.
///
/// `bearer_only` selects the public variant, see [`security::accept`].
pub fn build_document(
    base: &Value,
    services: &[ServiceDescriptor],
    bearer_only: bool,
) -> Result<Value> {
    let mut document = base.clone();

    for service in services {
        let Some(fragment) = service.schema_fragment() else {
            continue;
        };
        if !fragment.is_object() {
            return Err(ApiForgeError::aggregation(
                AggregationStep::ServiceFragment,
                format!("service `{}`", service.name),
                ApiForgeError::invalid_fragment(format!(
                    "service fragment must be an object, found {}",
                    kind(fragment)
                )),
            ));
        }
        deep_merge(&mut document, fragment.clone());
    }

    for service in services {
        for action in &service.actions {
            add_action_paths(&mut document, service, action, bearer_only)?;
        }
    }

    Ok(document)
}

fn add_action_paths(
    document: &mut Value,
    service: &ServiceDescriptor,
    action: &ActionDescriptor,
    bearer_only: bool,
) -> Result<()> {
    let Some(fragment) = action.fragment() else {
        return Ok(());
    };
    let context = || format!("service `{}`, action `{}`", service.name, action.name);

    for element in fragment_elements(fragment) {
        if !security::accept(element, bearer_only) {
            continue;
        }

        let entry = PathEntry::from_fragment(element)
            .map_err(|e| ApiForgeError::aggregation(AggregationStep::ParsePath, context(), e))?;

        insert_path(document, entry)
            .map_err(|e| ApiForgeError::aggregation(AggregationStep::InsertPath, context(), e))?;
    }

    Ok(())
}

/// Sets `paths[route][method]`, replacing any operation already there.
fn insert_path(document: &mut Value, entry: PathEntry) -> Result<()> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| ApiForgeError::invalid_fragment("document root is not an object"))?;

    let paths = root
        .entry("paths")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ApiForgeError::invalid_fragment("`paths` is not an object"))?;

    let path_item = paths
        .entry(entry.route.clone())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ApiForgeError::invalid_fragment(format!("`paths.{}` is not an object", entry.route))
        })?;

    path_item.insert(entry.method.to_string(), entry.operation);
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_key_lowercases_method() {
        let (method, route) = parse_path_key("POST /products").unwrap();
        assert_eq!(method, HttpMethod::Post);
        assert_eq!(method.to_string(), "post");
        assert_eq!(route, "/products");
    }

    #[test]
    fn test_parse_path_key_splits_on_first_space_only() {
        let (method, route) = parse_path_key("get /search by name").unwrap();
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(route, "/search by name");
    }

    #[test]
    fn test_parse_path_key_rejects_malformed() {
        assert!(parse_path_key("/products").is_err());
        assert!(parse_path_key("GET ").is_err());
        assert!(parse_path_key("FETCH /products").is_err());
    }

    #[test]
    fn test_path_entry_strips_path_key() {
        let element = json!({
            "$path": "GET /products/{id}",
            "summary": "Get product",
            "security": [{ "bearerAuth": [] }]
        });

        let entry = PathEntry::from_fragment(&element).unwrap();
        assert_eq!(entry.method, HttpMethod::Get);
        assert_eq!(entry.route, "/products/{id}");
        assert_eq!(
            entry.operation,
            json!({ "summary": "Get product", "security": [{ "bearerAuth": [] }] })
        );
        // The source fragment keeps its combined field
        assert_eq!(element["$path"], "GET /products/{id}");
    }

    #[test]
    fn test_path_entry_requires_path_key() {
        let err = PathEntry::from_fragment(&json!({ "summary": "nowhere" })).unwrap_err();
        assert!(err.to_string().contains("missing `$path`"));

        let err = PathEntry::from_fragment(&json!({ "$path": 7 })).unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        let err = PathEntry::from_fragment(&json!("GET /x")).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn test_deep_merge_objects_recurse() {
        let mut target = json!({ "info": { "title": "A", "version": "1" }, "tags": [] });
        deep_merge(
            &mut target,
            json!({ "info": { "title": "B" }, "servers": [{ "url": "x" }] }),
        );
        assert_eq!(
            target,
            json!({
                "info": { "title": "B", "version": "1" },
                "tags": [],
                "servers": [{ "url": "x" }]
            })
        );
    }

    #[test]
    fn test_deep_merge_replaces_arrays_and_scalars() {
        let mut target = json!({ "tags": [{ "name": "a" }], "openapi": "3.0.0", "x": { "y": 1 } });
        deep_merge(
            &mut target,
            json!({ "tags": [{ "name": "b" }], "openapi": "3.0.3", "x": 5 }),
        );
        assert_eq!(
            target,
            json!({ "tags": [{ "name": "b" }], "openapi": "3.0.3", "x": 5 })
        );
    }

    #[test]
    fn test_fragment_elements_shapes() {
        let single = json!({ "$path": "GET /a" });
        assert_eq!(fragment_elements(&single).len(), 1);

        let many = json!([{ "$path": "GET /a" }, { "$path": "GET /b" }]);
        assert_eq!(fragment_elements(&many).len(), 2);

        assert!(fragment_elements(&json!("GET /a")).is_empty());
        assert!(fragment_elements(&Value::Null).is_empty());
    }

    fn base() -> Value {
        json!({ "openapi": "3.0.3", "paths": {}, "components": { "schemas": {} } })
    }

    #[test]
    fn test_build_document_service_fragment_and_actions() {
        let services = vec![
            ServiceDescriptor::new("products")
                .with_schema(json!({
                    "components": { "schemas": { "Product": { "type": "object" } } },
                    "tags": [{ "name": "products" }]
                }))
                .with_action(ActionDescriptor::new("list").with_openapi(json!({
                    "$path": "GET /products",
                    "tags": ["products"]
                }))),
        ];

        let doc = build_document(&base(), &services, false).unwrap();
        assert_eq!(doc["components"]["schemas"]["Product"]["type"], "object");
        assert_eq!(doc["tags"], json!([{ "name": "products" }]));
        assert_eq!(doc["paths"]["/products"]["get"], json!({ "tags": ["products"] }));
    }

    #[test]
    fn test_build_document_skips_non_fragment_actions() {
        let services = vec![
            ServiceDescriptor::new("misc")
                .with_action(ActionDescriptor::new("internal"))
                .with_action(ActionDescriptor::new("weird").with_openapi(json!("GET /x"))),
        ];

        let doc = build_document(&base(), &services, true).unwrap();
        assert_eq!(doc["paths"], json!({}));
    }

    #[test]
    fn test_build_document_rejects_non_object_service_fragment() {
        let services = vec![ServiceDescriptor::new("broken").with_schema(json!(["nope"]))];

        let err = build_document(&base(), &services, false).unwrap_err();
        assert_eq!(err.step(), Some(AggregationStep::ServiceFragment));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_build_document_reports_action_context() {
        let services = vec![
            ServiceDescriptor::new("orders")
                .with_action(ActionDescriptor::new("create").with_openapi(json!({ "summary": "x" }))),
        ];

        let err = build_document(&base(), &services, false).unwrap_err();
        assert_eq!(err.step(), Some(AggregationStep::ParsePath));
        let message = err.to_string();
        assert!(message.contains("orders"));
        assert!(message.contains("create"));
    }

    #[test]
    fn test_filtered_entries_are_not_parsed() {
        // Malformed but basic-only: the public pass never looks at it
        let services = vec![ServiceDescriptor::new("admin").with_action(
            ActionDescriptor::new("purge").with_openapi(json!({ "security": [{ "basicAuth": [] }] })),
        )];

        assert!(build_document(&base(), &services, true).is_ok());
        assert!(build_document(&base(), &services, false).is_err());
    }

    #[test]
    fn test_action_paths_override_service_paths() {
        let services = vec![
            ServiceDescriptor::new("a")
                .with_action(ActionDescriptor::new("get").with_openapi(json!({
                    "$path": "GET /items",
                    "summary": "from action"
                }))),
            ServiceDescriptor::new("b").with_schema(json!({
                "paths": { "/items": { "get": { "summary": "from service" } } }
            })),
        ];

        let doc = build_document(&base(), &services, false).unwrap();
        assert_eq!(doc["paths"]["/items"]["get"]["summary"], "from action");
    }

    #[test]
    fn test_insert_path_rejects_non_object_paths() {
        let services = vec![
            ServiceDescriptor::new("bad").with_schema(json!({ "paths": "oops" })),
            ServiceDescriptor::new("good")
                .with_action(ActionDescriptor::new("x").with_openapi(json!({ "$path": "GET /x" }))),
        ];

        let err = build_document(&base(), &services, false).unwrap_err();
        assert_eq!(err.step(), Some(AggregationStep::InsertPath));
    }
}
