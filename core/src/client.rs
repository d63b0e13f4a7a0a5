//! Stateless HTTP request builder and response parser for the Gogs API.
//!
//! # Design
//! `GogsClient` holds only the API endpoint and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an authenticated `HttpRequest` and a `parse_*` method that turns
//! an `HttpResponse` into the operation's result. Executing the round trip is
//! left to `GogsApi` or to the host.
//!
//! Status handling per operation:
//! - value-returning calls accept any 2xx and decode the body;
//! - deletes accept exactly 204;
//! - existence checks map 200 to `true` and 404 to `false`.
//!
//! Everything else becomes `ApiError::Failure`.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Credential;
use crate::encode::{join, path_segment};
use crate::error::{ApiError, ApiFailure};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AccessToken, CreateRepoOptions, Repository, SearchEnvelope, User};
use crate::update::UserUpdate;

/// Path of the versioned API below the server's base URL.
pub const API_PREFIX: &str = "api/v1";

/// Synchronous, stateless request builder and response parser.
#[derive(Debug, Clone)]
pub struct GogsClient {
    api_url: String,
}

impl GogsClient {
    /// Client for the Gogs server at `base_url` (e.g. `https://git.example.com/`).
    pub fn new(base_url: &str) -> Self {
        Self {
            api_url: join(base_url, API_PREFIX),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, auth: &Credential, method: HttpMethod, path: &str) -> HttpRequest {
        auth.apply(HttpRequest::new(method, join(&self.api_url, path)))
    }

    fn repo_path(owner: &str, repo: &str) -> String {
        format!("/repos/{}/{}", path_segment(owner), path_segment(repo))
    }

    // -- repositories --------------------------------------------------------

    pub fn build_create_repo(
        &self,
        auth: &Credential,
        name: &str,
        options: &CreateRepoOptions,
    ) -> HttpRequest {
        let request = HttpRequest::new(HttpMethod::Post, join(&self.api_url, "/user/repos"))
            .with_form(options.form_pairs(name));
        auth.apply(request)
    }

    pub fn build_get_repo(&self, auth: &Credential, owner: &str, repo: &str) -> HttpRequest {
        self.request(auth, HttpMethod::Get, &Self::repo_path(owner, repo))
    }

    pub fn build_repo_exists(&self, auth: &Credential, owner: &str, repo: &str) -> HttpRequest {
        self.build_get_repo(auth, owner, repo)
    }

    pub fn build_delete_repo(&self, auth: &Credential, owner: &str, repo: &str) -> HttpRequest {
        self.request(auth, HttpMethod::Delete, &Self::repo_path(owner, repo))
    }

    pub fn parse_create_repo(&self, response: HttpResponse) -> Result<Repository, ApiError> {
        decode(&response)
    }

    pub fn parse_get_repo(&self, response: HttpResponse) -> Result<Repository, ApiError> {
        decode(&response)
    }

    pub fn parse_repo_exists(&self, response: HttpResponse) -> Result<bool, ApiError> {
        presence(&response, 404)
    }

    pub fn parse_delete_repo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    // -- users ---------------------------------------------------------------

    pub fn build_create_user(
        &self,
        auth: &Credential,
        login_name: &str,
        username: &str,
        email: &str,
        password: &str,
        send_notify: bool,
    ) -> HttpRequest {
        let form = vec![
            ("login_name".to_string(), login_name.to_string()),
            ("username".to_string(), username.to_string()),
            ("email".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
            ("send_notify".to_string(), send_notify.to_string()),
        ];
        let request = HttpRequest::new(HttpMethod::Post, join(&self.api_url, "/admin/users"))
            .with_form(form);
        auth.apply(request)
    }

    pub fn build_get_user(&self, auth: &Credential, username: &str) -> HttpRequest {
        let path = format!("/users/{}", path_segment(username));
        self.request(auth, HttpMethod::Get, &path)
    }

    pub fn build_user_exists(&self, username: &str) -> HttpRequest {
        self.build_get_user(&Credential::None, username)
    }

    pub fn build_search_users(&self, keyword: &str, limit: u32) -> HttpRequest {
        self.request(&Credential::None, HttpMethod::Get, "/users/search")
            .with_query("q", keyword)
            .with_query("limit", limit)
    }

    pub fn build_update_user(
        &self,
        auth: &Credential,
        username: &str,
        update: &UserUpdate,
    ) -> HttpRequest {
        let url = join(&self.api_url, &format!("/admin/users/{}", path_segment(username)));
        auth.apply(HttpRequest::new(HttpMethod::Patch, url).with_form(update.form_pairs()))
    }

    pub fn build_delete_user(&self, auth: &Credential, username: &str) -> HttpRequest {
        let path = format!("/admin/users/{}", path_segment(username));
        self.request(auth, HttpMethod::Delete, &path)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    pub fn parse_user_exists(&self, response: HttpResponse) -> Result<bool, ApiError> {
        presence(&response, 404)
    }

    pub fn parse_search_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        let envelope: SearchEnvelope = decode(&response)?;
        Ok(envelope.data)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    // -- authentication and tokens -------------------------------------------

    pub fn build_authenticated_user(&self, auth: &Credential) -> HttpRequest {
        self.request(auth, HttpMethod::Get, "/user")
    }

    pub fn build_valid_authentication(&self, auth: &Credential) -> HttpRequest {
        self.build_authenticated_user(auth)
    }

    pub fn build_get_tokens(&self, auth: &Credential, username: &str) -> HttpRequest {
        let path = format!("/users/{}/tokens", path_segment(username));
        self.request(auth, HttpMethod::Get, &path)
    }

    pub fn build_create_token(&self, auth: &Credential, username: &str, name: &str) -> HttpRequest {
        let url = join(&self.api_url, &format!("/users/{}/tokens", path_segment(username)));
        let form = vec![("name".to_string(), name.to_string())];
        auth.apply(HttpRequest::new(HttpMethod::Post, url).with_form(form))
    }

    pub fn parse_authenticated_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    /// 200 means the credential is accepted, 401 that it is not.
    pub fn parse_valid_authentication(&self, response: HttpResponse) -> Result<bool, ApiError> {
        presence(&response, 401)
    }

    pub fn parse_get_tokens(&self, response: HttpResponse) -> Result<Vec<AccessToken>, ApiError> {
        decode(&response)
    }

    pub fn parse_create_token(&self, response: HttpResponse) -> Result<AccessToken, ApiError> {
        decode(&response)
    }
}

fn reject(response: &HttpResponse) -> ApiError {
    debug!(status = response.status, "request rejected");
    ApiFailure::from_response(response.status, &response.body).into()
}

/// Require exactly `expected`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(reject(response))
}

/// Require any 2xx status and decode the body.
fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(reject(response));
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// 200 is `true`, `absent` is `false`, anything else is a failure.
fn presence(response: &HttpResponse, absent: u16) -> Result<bool, ApiError> {
    match response.status {
        200 => Ok(true),
        status if status == absent => Ok(false),
        _ => Err(reject(response)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{"id":1,"username":"unknwon","full_name":"","email":"u@gogs.io","avatar_url":"/avatars/1"}"#;

    fn client() -> GogsClient {
        GogsClient::new("https://www.example.com/")
    }

    fn token() -> Credential {
        Credential::token("mytoken")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn api_url_is_derived_from_base() {
        assert_eq!(client().api_url(), "https://www.example.com/api/v1");
        assert_eq!(
            GogsClient::new("https://www.example.com").api_url(),
            "https://www.example.com/api/v1"
        );
    }

    #[test]
    fn build_create_repo_produces_correct_request() {
        let req = client().build_create_repo(&token(), "AGreatRepo", &CreateRepoOptions::default());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.full_url(),
            "https://www.example.com/api/v1/user/repos?token=mytoken"
        );
        assert_eq!(
            req.body().as_deref(),
            Some("name=AGreatRepo&private=false&auto_init=false")
        );
    }

    #[test]
    fn build_get_repo_escapes_path() {
        let req = client().build_get_repo(&token(), "some user", "repo");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.full_url(),
            "https://www.example.com/api/v1/repos/some%20user/repo?token=mytoken"
        );
        assert!(req.body().is_none());
    }

    #[test]
    fn build_delete_repo_produces_correct_request() {
        let req = client().build_delete_repo(&token(), "username", "repo1");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(
            req.full_url(),
            "https://www.example.com/api/v1/repos/username/repo1?token=mytoken"
        );
    }

    #[test]
    fn build_create_user_sends_form_and_token() {
        let req = client().build_create_user(
            &token(),
            "loginname",
            "username",
            "user@example.com",
            "password",
            false,
        );
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.full_url(), "https://www.example.com/api/v1/admin/users?token=mytoken");
        let form = req.form.unwrap();
        assert!(form.contains(&("login_name".to_string(), "loginname".to_string())));
        assert!(form.contains(&("username".to_string(), "username".to_string())));
        assert!(form.contains(&("email".to_string(), "user@example.com".to_string())));
        assert!(form.contains(&("password".to_string(), "password".to_string())));
    }

    #[test]
    fn build_user_exists_is_anonymous() {
        let req = client().build_user_exists("username1");
        assert_eq!(req.full_url(), "https://www.example.com/api/v1/users/username1");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_search_users_puts_params_on_query() {
        let req = client().build_search_users("keyword", 4);
        assert_eq!(
            req.full_url(),
            "https://www.example.com/api/v1/users/search?q=keyword&limit=4"
        );
    }

    #[test]
    fn build_update_user_uses_patch_form() {
        let update = UserUpdate::builder("loginname", "user@example.com")
            .set_website("mywebsite.net")
            .build();
        let req = client().build_update_user(&token(), "username", &update);
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(
            req.full_url(),
            "https://www.example.com/api/v1/admin/users/username?token=mytoken"
        );
        assert_eq!(
            req.body().as_deref(),
            Some("login_name=loginname&email=user%40example.com&website=mywebsite.net")
        );
    }

    #[test]
    fn build_delete_user_uses_basic_auth() {
        let auth = Credential::username_password("auth_username", "password");
        let req = client().build_delete_user(&auth, "username1");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.full_url(), "https://www.example.com/api/v1/admin/users/username1");
        assert_eq!(
            req.header("authorization"),
            Some("Basic YXV0aF91c2VybmFtZTpwYXNzd29yZA==")
        );
    }

    #[test]
    fn build_create_token_posts_name() {
        let auth = Credential::username_password("alice", "pw");
        let req = client().build_create_token(&auth, "alice", "ci");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.full_url(), "https://www.example.com/api/v1/users/alice/tokens");
        assert_eq!(req.body().as_deref(), Some("name=ci"));
    }

    #[test]
    fn parse_get_user_accepts_any_2xx() {
        let user = client().parse_get_user(response(200, USER_JSON)).unwrap();
        assert_eq!(user.username(), "unknwon");
        let user = client().parse_create_user(response(201, USER_JSON)).unwrap();
        assert_eq!(user.id(), 1);
    }

    #[test]
    fn parse_get_user_not_found_is_failure() {
        let err = client().parse_get_user(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::Failure(ApiFailure { status_code: 404, .. })));
    }

    #[test]
    fn parse_exists_maps_200_and_404() {
        assert!(client().parse_user_exists(response(200, USER_JSON)).unwrap());
        assert!(!client().parse_user_exists(response(404, "")).unwrap());
        assert!(!client().parse_repo_exists(response(404, "")).unwrap());
    }

    #[test]
    fn parse_exists_surfaces_other_statuses() {
        let err = client().parse_repo_exists(response(500, "boom")).unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        let err = client().parse_user_exists(response(401, "")).unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn parse_delete_requires_204() {
        assert!(client().parse_delete_repo(response(204, "")).is_ok());
        let err = client().parse_delete_repo(response(401, "")).unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        let err = client().parse_delete_user(response(200, "")).unwrap_err();
        assert_eq!(err.status_code(), Some(200));
    }

    #[test]
    fn parse_search_users_reads_data() {
        let body = format!(r#"{{"data": [{USER_JSON}], "ok": true}}"#);
        let users = client().parse_search_users(response(200, &body)).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email(), "u@gogs.io");
    }

    #[test]
    fn parse_valid_authentication_maps_401_to_false() {
        assert!(client().parse_valid_authentication(response(200, USER_JSON)).unwrap());
        assert!(!client().parse_valid_authentication(response(401, "")).unwrap());
        assert!(client().parse_valid_authentication(response(403, "")).is_err());
    }

    #[test]
    fn parse_bad_json_is_decode_error() {
        let err = client().parse_get_repo(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.status_code(), None);
    }
}
