//! HTTP route handlers grouped by resource.
//!
//! JSON endpoints are annotated with `#[openapi]` so `rocket_okapi` can derive
//! an OpenAPI document. Multipart uploads, form submissions, redirects and
//! file downloads are mounted through the same macro but left out of the
//! document with `#[openapi(skip)]`.

pub mod campaigns;
pub mod exclusions;
pub mod health;
pub mod recipients;
pub mod unsubscribe;

/// Prefix every route in this module is mounted under.
pub const API_BASE: &str = "/api/v1";
