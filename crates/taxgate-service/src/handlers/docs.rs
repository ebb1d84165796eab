//! Documentation handlers.

use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde_json::{json, Value};

const USAGE_TEXT: &str = include_str!("../../assets/usage.txt");
const DOCS_HTML: &str = include_str!("../../assets/docs.html");
const SWAGGER_HTML: &str = include_str!("../../assets/swagger.html");

/// Plain-text usage guide, served at `/` when no API key is sent.
pub async fn usage() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], USAGE_TEXT)
}

/// `GET /docs`: human-readable guide.
pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}

/// `GET /docs/dev`: Swagger UI over [`openapi`].
pub async fn swagger_page() -> Html<&'static str> {
    Html(SWAGGER_HTML)
}

/// `GET /docs/dev/openapi.json`.
pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

fn error_body(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    })
}

/// The OpenAPI 3.0 description of the public API.
#[must_use]
pub fn openapi_document() -> Value {
    let rate_fields = [
        "state",
        "zip",
        "city",
        "country",
        "county",
        "country_rate",
        "state_rate",
        "county_rate",
        "city_rate",
        "combined_district_rate",
        "combined_rate",
    ];
    let mut rate_properties = serde_json::Map::new();
    for field in rate_fields {
        rate_properties.insert(field.to_string(), json!({ "type": "string" }));
    }
    rate_properties.insert("freight_taxable".to_string(), json!({ "type": "boolean" }));

    let param = |name: &str, required: bool, description: &str| {
        json!({
            "name": name,
            "in": "query",
            "required": required,
            "schema": { "type": "string" },
            "description": description
        })
    };

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Tax Calculator API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Authenticated proxy for US sales tax rates by ZIP code"
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Calculate tax rate",
                    "description": "Sales tax rate for a location. Without an x-api-key header the endpoint returns a plain-text usage guide instead.",
                    "security": [{ "ApiKeyAuth": [] }],
                    "parameters": [
                        param("zip", true, "ZIP or postal code"),
                        param("country", false, "Country code, e.g. US"),
                        param("city", false, "City name"),
                        param("street", false, "Street address")
                    ],
                    "responses": {
                        "200": {
                            "description": "Successful response",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "rate": {
                                                "type": "object",
                                                "properties": rate_properties
                                            }
                                        }
                                    }
                                }
                            }
                        },
                        "400": error_body("Bad Request - Missing required parameters"),
                        "401": error_body("Unauthorized - Invalid or missing API key"),
                        "500": error_body("Upstream failure or invalid upstream response")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Health check",
                    "responses": {
                        "200": {
                            "description": "API is healthy",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "status": { "type": "string" },
                                            "timestamp": { "type": "string", "format": "date-time" },
                                            "version": { "type": "string" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "ApiKeyAuth": { "type": "apiKey", "in": "header", "name": "x-api-key" }
            }
        }
    })
}
