//! OAuth client core: configuration, sessions, signing and the transport seam.

pub mod config;
pub mod crypto;
pub mod http_client;
pub mod oauth_client;
pub mod profile;
pub mod session;
pub mod signed_request;
pub mod types;
pub mod url_encoding;
