//! Common utilities shared across exchange clients
//!
//! - Request signing and credentials
//! - Blocking HTTP client construction and request pacing
//! - Cursor pagination of history endpoints

pub mod auth;
pub mod http;
pub mod paging;

pub use auth::{sign_base64, sign_hex, Credentials};
pub use http::{build_client, endpoint_url, send, RequestPacer};
pub use paging::{collect_pages, next_if_full, MAX_PAGES};
