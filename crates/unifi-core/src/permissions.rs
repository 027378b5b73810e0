//! Per-category permission checks for tool operations.
//!
//! A [`Permissions`] value holds a default [`ActionPolicy`] and optional
//! per-category overrides. Overrides are partial: any action not named in
//! a category falls back to the default.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of operation a tool performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// List or inspect.
    Read,
    /// Create a new controller object.
    Create,
    /// Modify an existing object or issue a device command.
    Update,
    /// Remove an object.
    Delete,
}

impl Action {
    /// Lower-case name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which actions are allowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPolicy {
    /// Allow read operations.
    pub read: bool,
    /// Allow create operations.
    pub create: bool,
    /// Allow update operations.
    pub update: bool,
    /// Allow delete operations.
    pub delete: bool,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            read: true,
            create: true,
            update: true,
            delete: false,
        }
    }
}

impl ActionPolicy {
    /// Policy that allows every action.
    pub fn allow_all() -> Self {
        Self {
            read: true,
            create: true,
            update: true,
            delete: true,
        }
    }

    /// Whether `action` is allowed.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

/// Partial override for one category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Override for read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    /// Override for create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    /// Override for update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    /// Override for delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

impl CategoryPolicy {
    fn get(&self, action: Action) -> Option<bool> {
        match action {
            Action::Read => self.read,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

/// Permission table consulted before every tool runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    /// Policy applied when a category has no override for an action.
    pub default: ActionPolicy,
    /// Per-category overrides keyed by category name
    /// (`devices`, `clients`, `networks`, `firewall`, ...).
    pub categories: HashMap<String, CategoryPolicy>,
}

impl Permissions {
    /// Permissions that allow everything. Used by tests.
    pub fn allow_all() -> Self {
        Self {
            default: ActionPolicy::allow_all(),
            categories: HashMap::new(),
        }
    }

    /// Add or replace a category override.
    pub fn with_category(mut self, category: impl Into<String>, policy: CategoryPolicy) -> Self {
        self.categories.insert(category.into(), policy);
        self
    }

    /// Whether `action` is allowed on `category`.
    pub fn allows(&self, category: &str, action: Action) -> bool {
        self.categories
            .get(category)
            .and_then(|policy| policy.get(action))
            .unwrap_or_else(|| self.default.allows(action))
    }

    /// Like [`allows`](Self::allows) but returns a `PermissionDenied` error.
    pub fn check(&self, category: &str, action: Action) -> Result<()> {
        if self.allows(category, action) {
            Ok(())
        } else {
            tracing::warn!(category, action = %action, "permission denied");
            Err(Error::permission_denied(category, action.as_str()))
        }
    }
}
