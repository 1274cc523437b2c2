//! Visibility of action fragments in the public (bearer-only) document

use serde_json::Value;

/// Security scheme key for JWT bearer tokens
pub const BEARER_SCHEME: &str = "bearerAuth";

/// Security scheme key for HTTP basic credentials
pub const BASIC_SCHEME: &str = "basicAuth";

/// Decides whether a path entry belongs in the document being built.
///
/// The private document (`bearer_only == false`) accepts everything. The public
/// one drops only entries that declare a non-empty `security` list in which no
/// requirement names [`BEARER_SCHEME`]. Entries without a security declaration
/// fall back to the document default and are kept.
pub fn accept(element: &Value, bearer_only: bool) -> bool {
    if !bearer_only {
        return true;
    }

    match element.get("security") {
        Some(Value::Array(requirements)) if !requirements.is_empty() => requirements
            .iter()
            .any(|requirement| requirement.get(BEARER_SCHEME).is_some()),
        _ => true,
    }
}
