//! Base document every aggregated API description starts from

use crate::error::{ApiForgeError, Result};
use crate::merge::deep_merge;
use crate::security::{BASIC_SCHEME, BEARER_SCHEME};
use chrono::Datelike;
use core_config::docs::DocsConfig;
use serde_json::{Value, json};
use std::path::Path;

/// OpenAPI version emitted by the template
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Metadata interpolated into the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub package_name: String,
    pub version: String,
    pub description: String,
    pub contact_name: String,
    pub contact_url: String,
    pub contact_email: String,
    pub copyright_start_year: i32,
    pub current_year: i32,
    pub sandbox_url: String,
    pub production_url: String,
}

impl From<&DocsConfig> for TemplateInfo {
    fn from(config: &DocsConfig) -> Self {
        Self {
            package_name: config.package_name.clone(),
            version: config.package_version.clone(),
            description: config.description.clone(),
            contact_name: config.contact.name.clone(),
            contact_url: config.contact.url.clone(),
            contact_email: config.contact.email.clone(),
            copyright_start_year: config.copyright_start_year,
            current_year: chrono::Utc::now().year(),
            sandbox_url: config.sandbox_url.clone(),
            production_url: config.production_url.clone(),
        }
    }
}

/// `"2021-2026"`, or a single year when the range is empty.
pub fn copyright_years(start: i32, current: i32) -> String {
    if current > start {
        format!("{start}-{current}")
    } else {
        start.to_string()
    }
}

/// The default document skeleton.
pub fn default_document(info: &TemplateInfo) -> Value {
    let years = copyright_years(info.copyright_start_year, info.current_year);

    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": format!("{} API", info.package_name),
            "version": info.version,
            "description": info.description,
            "contact": {
                "name": info.contact_name,
                "url": info.contact_url,
                "email": info.contact_email,
            },
            "license": {
                "name": format!("Copyright (c) {years} {}", info.contact_name),
                "url": info.contact_url,
            },
        },
        "servers": [
            { "url": info.sandbox_url, "description": "Sandbox server" },
            { "url": info.production_url, "description": "Production server" },
        ],
        "components": {
            "responses": {
                "UnauthorizedErrorToken": {
                    "description": "Access token is missing or invalid, request new one",
                },
                "UnauthorizedErrorBasic": {
                    "description": "Authentication information is missing or invalid",
                    "headers": {
                        "WWW_Authenticate": { "schema": { "type": "string" } },
                    },
                },
                "NotFoundError": {
                    "description": "The requested resource was not found",
                },
                "ServerError": {
                    "description": "Server error",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/Error" },
                        },
                    },
                },
            },
            "securitySchemes": {
                BEARER_SCHEME: {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT",
                },
                BASIC_SCHEME: {
                    "type": "http",
                    "scheme": "basic",
                },
            },
            "schemas": {
                "Error": {
                    "type": "object",
                    "required": ["message"],
                    "properties": {
                        "code": { "type": "integer", "format": "int32" },
                        "error": { "type": "string" },
                        "message": { "type": "string" },
                    },
                    "example": {
                        "code": 6001,
                        "error": "SCHEMA_AGGREGATION_FAILED",
                        "message": "Failed to build the API description",
                    },
                },
            },
        },
        "paths": {},
        "security": [],
        "tags": [],
        "externalDocs": {
            "description": "Find out more about OpenAPI",
            "url": "https://swagger.io/specification/",
        },
    })
}

/// The template with operator `overrides` merged over it (overrides win).
pub fn base_document(info: &TemplateInfo, overrides: Option<Value>) -> Value {
    let mut document = default_document(info);
    if let Some(overrides) = overrides {
        deep_merge(&mut document, overrides);
    }
    document
}

/// Reads an operator override document. YAML and JSON are both accepted.
pub async fn load_overrides(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_yaml_ng::from_str(&raw).map_err(|e| ApiForgeError::Manifest {
        source_name: path.display().to_string(),
        details: e.to_string(),
    })?;

    if !value.is_object() {
        return Err(ApiForgeError::Manifest {
            source_name: path.display().to_string(),
            details: "override document must be a mapping".to_string(),
        });
    }
    Ok(value)
}
