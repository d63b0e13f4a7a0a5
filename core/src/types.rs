//! Domain records decoded from Gogs API responses.
//!
//! # Design
//! Records are only ever produced by deserializing a response body, so their
//! fields are private and exposed through accessors. A missing or mistyped
//! field fails decoding as a whole; there is no partially populated record.
//! The repository's `html_url`/`clone_url`/`ssh_url` sit at the top level of
//! the wire object and are gathered into `RepoUrls` via `#[serde(flatten)]`.

use serde::{Deserialize, Serialize};

use crate::auth::Credential;

/// A Gogs user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: i64,
    username: String,
    full_name: String,
    email: String,
    avatar_url: String,
}

impl User {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }
}

/// What the requesting user may do with a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    admin: bool,
    push: bool,
    pull: bool,
}

impl Permissions {
    pub fn admin(&self) -> bool {
        self.admin
    }

    pub fn push(&self) -> bool {
        self.push
    }

    pub fn pull(&self) -> bool {
        self.pull
    }
}

/// Web and clone locations of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoUrls {
    html_url: String,
    clone_url: String,
    ssh_url: String,
}

impl RepoUrls {
    pub fn html_url(&self) -> &str {
        &self.html_url
    }

    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    pub fn ssh_url(&self) -> &str {
        &self.ssh_url
    }
}

/// A repository as returned by the repo endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    id: i64,
    owner: User,
    full_name: String,
    private: bool,
    fork: bool,
    #[serde(flatten)]
    urls: RepoUrls,
    permissions: Permissions,
}

impl Repository {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn owner(&self) -> &User {
        &self.owner
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn private(&self) -> bool {
        self.private
    }

    pub fn fork(&self) -> bool {
        self.fork
    }

    pub fn urls(&self) -> &RepoUrls {
        &self.urls
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }
}

/// A named access token belonging to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    name: String,
    sha1: String,
}

impl AccessToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    /// Token credential for authenticating later calls with this token.
    pub fn credential(&self) -> Credential {
        Credential::Token(self.sha1.clone())
    }
}

/// Response wrapper used by the user search endpoint. Only `data` is read;
/// the `ok` flag is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub data: Vec<User>,
}

/// Optional settings for a new repository.
///
/// `private` and `auto_init` are always sent; unset strings are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRepoOptions {
    pub description: Option<String>,
    pub private: bool,
    pub auto_init: bool,
    pub gitignores: Option<String>,
    pub license: Option<String>,
    pub readme: Option<String>,
}

impl CreateRepoOptions {
    pub(crate) fn form_pairs(&self, name: &str) -> Vec<(String, String)> {
        let mut pairs = vec![("name".to_string(), name.to_string())];
        let optional = [
            ("description", &self.description),
            ("gitignores", &self.gitignores),
            ("license", &self.license),
            ("readme", &self.readme),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key.to_string(), value.clone()));
            }
        }
        pairs.push(("private".to_string(), self.private.to_string()));
        pairs.push(("auto_init".to_string(), self.auto_init.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO_JSON: &str = r#"{
        "id": 27,
        "owner": {
            "id": 1,
            "username": "unknwon",
            "full_name": "",
            "email": "u@gogs.io",
            "avatar_url": "/avatars/1"
        },
        "full_name": "unknwon/Hello-World",
        "private": false,
        "fork": false,
        "html_url": "http://localhost:3000/unknwon/Hello-World",
        "clone_url": "http://localhost:3000/unknwon/hello-world.git",
        "ssh_url": "jiahuachen@localhost:unknwon/hello-world.git",
        "permissions": {"admin": true, "push": true, "pull": true}
    }"#;

    #[test]
    fn repository_decodes_nested_and_flattened_fields() {
        let repo: Repository = serde_json::from_str(REPO_JSON).unwrap();
        assert_eq!(repo.id(), 27);
        assert_eq!(repo.owner().username(), "unknwon");
        assert_eq!(repo.owner().avatar_url(), "/avatars/1");
        assert_eq!(repo.full_name(), "unknwon/Hello-World");
        assert!(!repo.private());
        assert!(!repo.fork());
        assert_eq!(repo.urls().clone_url(), "http://localhost:3000/unknwon/hello-world.git");
        assert_eq!(repo.urls().ssh_url(), "jiahuachen@localhost:unknwon/hello-world.git");
        assert!(repo.permissions().admin());
        assert!(repo.permissions().push());
        assert!(repo.permissions().pull());
    }

    #[test]
    fn repository_reencodes_to_the_same_record() {
        let repo: Repository = serde_json::from_str(REPO_JSON).unwrap();
        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["html_url"], "http://localhost:3000/unknwon/Hello-World");
        assert!(json.get("urls").is_none());
        let back: Repository = serde_json::from_value(json).unwrap();
        assert_eq!(back, repo);
    }

    #[test]
    fn repository_missing_url_fails() {
        let mut json: serde_json::Value = serde_json::from_str(REPO_JSON).unwrap();
        json.as_object_mut().unwrap().remove("ssh_url");
        assert!(serde_json::from_value::<Repository>(json).is_err());
    }

    #[test]
    fn user_missing_email_fails() {
        let result: Result<User, _> =
            serde_json::from_str(r#"{"id":1,"username":"u","full_name":"","avatar_url":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn access_token_becomes_token_credential() {
        let token: AccessToken = serde_json::from_str(r#"{"name":"ci","sha1":"abc123"}"#).unwrap();
        assert_eq!(token.name(), "ci");
        assert_eq!(token.credential(), Credential::token("abc123"));
    }

    #[test]
    fn search_envelope_only_needs_data() {
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(envelope.data.is_empty());
    }

    #[test]
    fn create_repo_options_omit_unset_strings() {
        let options = CreateRepoOptions {
            description: Some("demo".to_string()),
            private: true,
            ..Default::default()
        };
        assert_eq!(
            options.form_pairs("repo"),
            vec![
                ("name".to_string(), "repo".to_string()),
                ("description".to_string(), "demo".to_string()),
                ("private".to_string(), "true".to_string()),
                ("auto_init".to_string(), "false".to_string()),
            ]
        );
    }
}
