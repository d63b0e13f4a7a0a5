use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const ADMIN_TOKEN: &str = "admin-token";

const EXTERNAL_URL: &str = "http://localhost:3000";
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Permissions {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub owner: User,
    pub full_name: String,
    pub description: String,
    pub private: bool,
    pub fork: bool,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
    pub permissions: Permissions,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub name: String,
    pub sha1: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub data: Vec<User>,
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Deserialize)]
pub struct CreateRepo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EditUser {
    pub login_name: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub admin: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateToken {
    pub name: String,
}

struct Account {
    user: User,
    password: String,
    active: bool,
    admin: bool,
}

struct RepoRecord {
    id: i64,
    owner: String,
    name: String,
    description: String,
    private: bool,
}

struct TokenRecord {
    owner: String,
    name: String,
    sha1: String,
}

/// In-memory server state, seeded with one admin account.
pub struct Store {
    accounts: BTreeMap<String, Account>,
    repos: BTreeMap<(String, String), RepoRecord>,
    tokens: Vec<TokenRecord>,
    next_id: i64,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store {
            accounts: BTreeMap::new(),
            repos: BTreeMap::new(),
            tokens: Vec::new(),
            next_id: 1,
        };
        store.insert_account(ADMIN_USERNAME, "admin@example.com", ADMIN_PASSWORD, true);
        store.tokens.push(TokenRecord {
            owner: ADMIN_USERNAME.to_string(),
            name: "bootstrap".to_string(),
            sha1: ADMIN_TOKEN.to_string(),
        });
        store
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_account(&mut self, username: &str, email: &str, password: &str, admin: bool) -> User {
        let id = self.next_id();
        let user = User {
            id,
            username: username.to_string(),
            full_name: String::new(),
            email: email.to_string(),
            avatar_url: format!("/avatars/{id}"),
        };
        self.accounts.insert(
            username.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
                active: true,
                admin,
            },
        );
        user
    }

    /// Username behind a `token` query parameter or Basic header.
    fn caller(&self, params: &HashMap<String, String>, headers: &HeaderMap) -> Option<String> {
        if let Some(token) = params.get("token") {
            let owner = self.tokens.iter().find(|t| &t.sha1 == token)?.owner.clone();
            return self.accounts.get(&owner).filter(|a| a.active).map(|_| owner);
        }
        self.basic_caller(headers)
    }

    fn basic_caller(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let decoded = STANDARD.decode(value.strip_prefix("Basic ")?).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        let account = self.accounts.get(username)?;
        (account.active && account.password == password).then(|| username.to_string())
    }

    fn is_admin(&self, username: &str) -> bool {
        self.accounts.get(username).is_some_and(|a| a.admin)
    }

    fn require_admin(
        &self,
        params: &HashMap<String, String>,
        headers: &HeaderMap,
    ) -> Result<String, Reject> {
        let caller = self
            .caller(params, headers)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized"))?;
        if !self.is_admin(&caller) {
            return Err(reject(StatusCode::FORBIDDEN, "admin access required"));
        }
        Ok(caller)
    }

    fn can_manage(&self, caller: &str, owner: &str) -> bool {
        caller == owner || self.is_admin(caller)
    }

    fn repo_view(&self, record: &RepoRecord, caller: Option<&str>) -> Option<Repository> {
        let owner = self.accounts.get(&record.owner)?.user.clone();
        let manages = caller.is_some_and(|c| self.can_manage(c, &record.owner));
        let path = format!("{}/{}", record.owner, record.name);
        Some(Repository {
            id: record.id,
            owner,
            full_name: path.clone(),
            description: record.description.clone(),
            private: record.private,
            fork: false,
            html_url: format!("{EXTERNAL_URL}/{path}"),
            clone_url: format!("{EXTERNAL_URL}/{path}.git"),
            ssh_url: format!("git@localhost:{path}.git"),
            permissions: Permissions {
                admin: manages,
                push: manages,
                pull: true,
            },
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

type Reject = (StatusCode, Json<ErrorMessage>);

fn reject(status: StatusCode, message: &str) -> Reject {
    (
        status,
        Json(ErrorMessage {
            message: message.to_string(),
        }),
    )
}

fn not_found() -> Reject {
    reject(StatusCode::NOT_FOUND, "not found")
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/api/v1/user", get(authenticated_user))
        .route("/api/v1/user/repos", post(create_repo))
        .route("/api/v1/repos/{owner}/{repo}", get(get_repo).delete(delete_repo))
        .route("/api/v1/users/search", get(search_users))
        .route("/api/v1/users/{username}", get(get_user))
        .route("/api/v1/users/{username}/tokens", get(list_tokens).post(create_token))
        .route("/api/v1/admin/users", post(create_user))
        .route("/api/v1/admin/users/{username}", patch(update_user).delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn authenticated_user(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<User>, Reject> {
    let store = db.read().await;
    let caller = store
        .caller(&params, &headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized"))?;
    let account = store.accounts.get(&caller).ok_or_else(not_found)?;
    Ok(Json(account.user.clone()))
}

async fn create_repo(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Form(input): Form<CreateRepo>,
) -> Result<(StatusCode, Json<Repository>), Reject> {
    let mut store = db.write().await;
    let caller = store
        .caller(&params, &headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized"))?;
    let key = (caller.clone(), input.name.clone());
    if store.repos.contains_key(&key) {
        return Err(reject(StatusCode::CONFLICT, "repository already exists"));
    }
    let record = RepoRecord {
        id: store.next_id(),
        owner: caller.clone(),
        name: input.name,
        description: input.description.unwrap_or_default(),
        private: input.private,
    };
    let repo = store.repo_view(&record, Some(caller.as_str())).ok_or_else(not_found)?;
    info!(repo = %repo.full_name, "created repository");
    store.repos.insert(key, record);
    Ok((StatusCode::CREATED, Json(repo)))
}

async fn get_repo(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Repository>, Reject> {
    let store = db.read().await;
    let caller = store.caller(&params, &headers);
    let record = store.repos.get(&(owner, repo)).ok_or_else(not_found)?;
    let visible = !record.private
        || caller
            .as_deref()
            .is_some_and(|c| store.can_manage(c, &record.owner));
    if !visible {
        return Err(not_found());
    }
    store
        .repo_view(record, caller.as_deref())
        .map(Json)
        .ok_or_else(not_found)
}

async fn delete_repo(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<StatusCode, Reject> {
    let mut store = db.write().await;
    let caller = store
        .caller(&params, &headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "unauthorized"))?;
    if !store.can_manage(&caller, &owner) {
        return Err(reject(StatusCode::FORBIDDEN, "not the repository owner"));
    }
    store.repos.remove(&(owner, repo)).ok_or_else(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_users(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<SearchResults> {
    let store = db.read().await;
    let keyword = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    let limit = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(DEFAULT_SEARCH_LIMIT);
    let data = store
        .accounts
        .values()
        .filter(|a| a.user.username.to_lowercase().contains(&keyword))
        .take(limit)
        .map(|a| a.user.clone())
        .collect();
    Json(SearchResults { data, ok: true })
}

async fn get_user(
    State(db): State<Db>,
    Path(username): Path<String>,
) -> Result<Json<User>, Reject> {
    let store = db.read().await;
    store
        .accounts
        .get(&username)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(not_found)
}

fn token_owner_check(store: &Store, headers: &HeaderMap, username: &str) -> Result<(), Reject> {
    let caller = store
        .basic_caller(headers)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "basic authentication required"))?;
    if !store.can_manage(&caller, username) {
        return Err(reject(StatusCode::FORBIDDEN, "cannot manage another user's tokens"));
    }
    if !store.accounts.contains_key(username) {
        return Err(not_found());
    }
    Ok(())
}

async fn list_tokens(
    State(db): State<Db>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<AccessToken>>, Reject> {
    let store = db.read().await;
    token_owner_check(&store, &headers, &username)?;
    let tokens = store
        .tokens
        .iter()
        .filter(|t| t.owner == username)
        .map(|t| AccessToken {
            name: t.name.clone(),
            sha1: t.sha1.clone(),
        })
        .collect();
    Ok(Json(tokens))
}

async fn create_token(
    State(db): State<Db>,
    Path(username): Path<String>,
    headers: HeaderMap,
    Form(input): Form<CreateToken>,
) -> Result<(StatusCode, Json<AccessToken>), Reject> {
    let mut store = db.write().await;
    token_owner_check(&store, &headers, &username)?;
    let sha1 = format!("{:040x}", store.next_id());
    store.tokens.push(TokenRecord {
        owner: username,
        name: input.name.clone(),
        sha1: sha1.clone(),
    });
    Ok((
        StatusCode::CREATED,
        Json(AccessToken {
            name: input.name,
            sha1,
        }),
    ))
}

async fn create_user(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Form(input): Form<CreateUser>,
) -> Result<(StatusCode, Json<User>), Reject> {
    let mut store = db.write().await;
    store.require_admin(&params, &headers)?;
    if store.accounts.contains_key(&input.username) {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "user already exists"));
    }
    let user = store.insert_account(&input.username, &input.email, &input.password, false);
    info!(username = %user.username, "created user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Form(input): Form<EditUser>,
) -> Result<Json<User>, Reject> {
    let mut store = db.write().await;
    store.require_admin(&params, &headers)?;
    if input.login_name.is_empty() {
        return Err(reject(StatusCode::UNPROCESSABLE_ENTITY, "login_name is required"));
    }
    let account = store.accounts.get_mut(&username).ok_or_else(not_found)?;
    account.user.email = input.email;
    if let Some(full_name) = input.full_name {
        account.user.full_name = full_name;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    if let Some(active) = input.active {
        account.active = active;
    }
    if let Some(admin) = input.admin {
        account.admin = admin;
    }
    Ok(Json(account.user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<StatusCode, Reject> {
    let mut store = db.write().await;
    store.require_admin(&params, &headers)?;
    store.accounts.remove(&username).ok_or_else(not_found)?;
    store.repos.retain(|(owner, _), _| *owner != username);
    store.tokens.retain(|t| t.owner != username);
    info!(%username, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(username: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        headers.insert(header::AUTHORIZATION, format!("Basic {encoded}").parse().unwrap());
        headers
    }

    fn token_params(token: &str) -> HashMap<String, String> {
        HashMap::from([("token".to_string(), token.to_string())])
    }

    #[test]
    fn seeded_store_has_admin() {
        let store = Store::seeded();
        assert!(store.is_admin(ADMIN_USERNAME));
        assert_eq!(store.accounts[ADMIN_USERNAME].user.id, 1);
    }

    #[test]
    fn caller_resolves_token_and_basic() {
        let store = Store::seeded();
        assert_eq!(
            store.caller(&token_params(ADMIN_TOKEN), &HeaderMap::new()).as_deref(),
            Some(ADMIN_USERNAME)
        );
        assert_eq!(
            store.caller(&HashMap::new(), &basic(ADMIN_USERNAME, ADMIN_PASSWORD)).as_deref(),
            Some(ADMIN_USERNAME)
        );
        assert!(store.caller(&token_params("bogus"), &HeaderMap::new()).is_none());
        assert!(store.caller(&HashMap::new(), &basic(ADMIN_USERNAME, "wrong")).is_none());
    }

    #[test]
    fn inactive_accounts_cannot_authenticate() {
        let mut store = Store::seeded();
        store.insert_account("bob", "bob@example.com", "pw", false);
        store.accounts.get_mut("bob").unwrap().active = false;
        assert!(store.caller(&HashMap::new(), &basic("bob", "pw")).is_none());
    }

    #[test]
    fn repo_serializes_urls_at_top_level() {
        let store = Store::seeded();
        let record = RepoRecord {
            id: 9,
            owner: ADMIN_USERNAME.to_string(),
            name: "demo".to_string(),
            description: String::new(),
            private: false,
        };
        let json = serde_json::to_value(store.repo_view(&record, None).unwrap()).unwrap();
        assert_eq!(json["full_name"], "admin/demo");
        assert_eq!(json["clone_url"], "http://localhost:3000/admin/demo.git");
        assert_eq!(json["permissions"]["pull"], true);
        assert_eq!(json["permissions"]["push"], false);
    }

    #[test]
    fn edit_user_requires_login_name_and_email() {
        let result: Result<EditUser, _> = serde_json::from_str(r#"{"full_name":"x"}"#);
        assert!(result.is_err());
    }
}
