//! Synchronous client for the Gogs REST API.
//!
//! # Overview
//! Covers repository and user management: create, read and delete
//! repositories and users, existence checks, user search, admin profile
//! updates and access tokens.
//!
//! # Design
//! - `GogsClient` is stateless; it holds only the API endpoint.
//! - Each operation is split into `build_*` (produces an authenticated
//!   request) and `parse_*` (interprets a response), so the I/O boundary is
//!   explicit and both halves are testable without a network.
//! - `GogsApi` joins the two halves through an injected `Transport`.
//! - `Credential` decides per call how a request is authenticated.
//! - Non-2xx responses become `ApiError::Failure`; malformed success bodies
//!   become `ApiError::Decode`.

pub mod api;
pub mod auth;
pub mod client;
pub mod encode;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod update;

pub use api::{GogsApi, DEFAULT_SEARCH_LIMIT};
pub use auth::Credential;
pub use client::GogsClient;
pub use error::{ApiError, ApiFailure, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{AccessToken, CreateRepoOptions, Permissions, RepoUrls, Repository, User};
pub use update::{UserUpdate, UserUpdateBuilder};
