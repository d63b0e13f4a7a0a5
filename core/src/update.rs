//! Partial profile updates for the admin edit-user endpoint.
//!
//! `UserUpdateBuilder` stages fields with chained setters; `build` takes a
//! snapshot, so later setter calls never leak into an update already built.

/// Immutable payload for `update_user`. Unset optional fields are left out
/// of the encoded form so the server keeps their current values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    login_name: String,
    email: String,
    full_name: Option<String>,
    password: Option<String>,
    website: Option<String>,
    location: Option<String>,
    active: Option<bool>,
    admin: Option<bool>,
}

impl UserUpdate {
    pub fn builder(login_name: impl Into<String>, email: impl Into<String>) -> UserUpdateBuilder {
        UserUpdateBuilder::new(login_name, email)
    }

    pub fn login_name(&self) -> &str {
        &self.login_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn active(&self) -> Option<bool> {
        self.active
    }

    pub fn admin(&self) -> Option<bool> {
        self.admin
    }

    /// Form fields for the request body, required fields first.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("login_name".to_string(), self.login_name.clone()),
            ("email".to_string(), self.email.clone()),
        ];
        let strings = [
            ("full_name", &self.full_name),
            ("password", &self.password),
            ("website", &self.website),
            ("location", &self.location),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                pairs.push((key.to_string(), value.clone()));
            }
        }
        let flags = [("active", self.active), ("admin", self.admin)];
        for (key, value) in flags {
            if let Some(value) = value {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        pairs
    }
}

/// Mutable staging area for a `UserUpdate`.
#[derive(Debug, Clone)]
pub struct UserUpdateBuilder {
    staged: UserUpdate,
}

impl UserUpdateBuilder {
    pub fn new(login_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            staged: UserUpdate {
                login_name: login_name.into(),
                email: email.into(),
                full_name: None,
                password: None,
                website: None,
                location: None,
                active: None,
                admin: None,
            },
        }
    }

    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> &mut Self {
        self.staged.full_name = Some(full_name.into());
        self
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.staged.password = Some(password.into());
        self
    }

    pub fn set_website(&mut self, website: impl Into<String>) -> &mut Self {
        self.staged.website = Some(website.into());
        self
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.staged.location = Some(location.into());
        self
    }

    pub fn set_active(&mut self, active: bool) -> &mut Self {
        self.staged.active = Some(active);
        self
    }

    pub fn set_admin(&mut self, admin: bool) -> &mut Self {
        self.staged.admin = Some(admin);
        self
    }

    pub fn build(&self) -> UserUpdate {
        self.staged.clone()
    }
}
