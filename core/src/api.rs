//! One-call-per-operation facade over `GogsClient` and a `Transport`.
//!
//! Each method builds the request, sends it once through the injected
//! transport and parses the response. No retries, no shared mutable state:
//! a `GogsApi` is as thread-safe as the transport it wraps.

use tracing::debug;

use crate::auth::Credential;
use crate::client::GogsClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{AccessToken, CreateRepoOptions, Repository, User};
use crate::update::UserUpdate;

/// Default page size for `search_users`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct GogsApi<T> {
    client: GogsClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl GogsApi<crate::transport::UreqTransport> {
    /// API bound to `base_url` using the bundled blocking transport.
    pub fn with_ureq(base_url: &str) -> Self {
        Self::new(base_url, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport> GogsApi<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: GogsClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &GogsClient {
        &self.client
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        // The URL alone; the query may hold a token.
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(&request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    pub fn create_repo(
        &self,
        auth: &Credential,
        name: &str,
        options: &CreateRepoOptions,
    ) -> Result<Repository, ApiError> {
        let response = self.dispatch(self.client.build_create_repo(auth, name, options))?;
        self.client.parse_create_repo(response)
    }

    pub fn get_repo(&self, auth: &Credential, owner: &str, repo: &str) -> Result<Repository, ApiError> {
        let response = self.dispatch(self.client.build_get_repo(auth, owner, repo))?;
        self.client.parse_get_repo(response)
    }

    pub fn repo_exists(&self, auth: &Credential, owner: &str, repo: &str) -> Result<bool, ApiError> {
        let response = self.dispatch(self.client.build_repo_exists(auth, owner, repo))?;
        self.client.parse_repo_exists(response)
    }

    pub fn delete_repo(&self, auth: &Credential, owner: &str, repo: &str) -> Result<(), ApiError> {
        let response = self.dispatch(self.client.build_delete_repo(auth, owner, repo))?;
        self.client.parse_delete_repo(response)
    }

    pub fn create_user(
        &self,
        auth: &Credential,
        login_name: &str,
        username: &str,
        email: &str,
        password: &str,
        send_notify: bool,
    ) -> Result<User, ApiError> {
        let request = self
            .client
            .build_create_user(auth, login_name, username, email, password, send_notify);
        let response = self.dispatch(request)?;
        self.client.parse_create_user(response)
    }

    /// Fetch a user's public profile; `auth` may be `Credential::None`.
    pub fn get_user(&self, auth: &Credential, username: &str) -> Result<User, ApiError> {
        let response = self.dispatch(self.client.build_get_user(auth, username))?;
        self.client.parse_get_user(response)
    }

    pub fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        let response = self.dispatch(self.client.build_user_exists(username))?;
        self.client.parse_user_exists(response)
    }

    pub fn search_users(&self, keyword: &str, limit: u32) -> Result<Vec<User>, ApiError> {
        let response = self.dispatch(self.client.build_search_users(keyword, limit))?;
        self.client.parse_search_users(response)
    }

    pub fn update_user(
        &self,
        auth: &Credential,
        username: &str,
        update: &UserUpdate,
    ) -> Result<User, ApiError> {
        let response = self.dispatch(self.client.build_update_user(auth, username, update))?;
        self.client.parse_update_user(response)
    }

    pub fn delete_user(&self, auth: &Credential, username: &str) -> Result<(), ApiError> {
        let response = self.dispatch(self.client.build_delete_user(auth, username))?;
        self.client.parse_delete_user(response)
    }

    pub fn valid_authentication(&self, auth: &Credential) -> Result<bool, ApiError> {
        let response = self.dispatch(self.client.build_valid_authentication(auth))?;
        self.client.parse_valid_authentication(response)
    }

    pub fn authenticated_user(&self, auth: &Credential) -> Result<User, ApiError> {
        let response = self.dispatch(self.client.build_authenticated_user(auth))?;
        self.client.parse_authenticated_user(response)
    }

    pub fn get_tokens(&self, auth: &Credential, username: &str) -> Result<Vec<AccessToken>, ApiError> {
        let response = self.dispatch(self.client.build_get_tokens(auth, username))?;
        self.client.parse_get_tokens(response)
    }

    pub fn create_token(
        &self,
        auth: &Credential,
        username: &str,
        name: &str,
    ) -> Result<AccessToken, ApiError> {
        let response = self.dispatch(self.client.build_create_token(auth, username, name))?;
        self.client.parse_create_token(response)
    }

    /// Return `username`'s token called `name`, creating it if missing.
    pub fn ensure_token(
        &self,
        auth: &Credential,
        username: &str,
        name: &str,
    ) -> Result<AccessToken, ApiError> {
        let existing = self.get_tokens(auth, username)?;
        if let Some(token) = existing.into_iter().find(|token| token.name() == name) {
            return Ok(token);
        }
        self.create_token(auth, username, name)
    }
}
