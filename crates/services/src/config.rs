//! Portal configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use onboard_core::model::{AccountType, AdminScope, LearnerId, StaffMember, StaffRole};

use crate::error::ConfigError;

/// Environment variable that overrides `database_url` from the file.
pub const DATABASE_URL_ENV: &str = "ONBOARD_DATABASE_URL";

/// Top-level portal settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Staff roster supplied by the credential provider.
    #[serde(default)]
    pub staff: Vec<StaffEntry>,
}

fn default_database_url() -> String {
    "sqlite:onboard.db?mode=rwc".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            log_filter: default_log_filter(),
            staff: Vec::new(),
        }
    }
}

/// One `[[staff]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaffEntry {
    pub email: String,
    pub name: String,
    pub role: StaffRole,
    #[serde(default)]
    pub school: String,
    #[serde(default = "default_account_type")]
    pub account_type: AccountType,
    /// `ALL` for HR, or a role name for a department head.
    #[serde(default)]
    pub admin_scope: Option<String>,
}

fn default_account_type() -> AccountType {
    AccountType::New
}

impl StaffEntry {
    /// # Errors
    ///
    /// Returns `ConfigError::Staff` for an empty email or unknown admin scope.
    pub fn to_member(&self) -> Result<StaffMember, ConfigError> {
        let invalid = |reason: String| ConfigError::Staff {
            email: self.email.clone(),
            reason,
        };
        let id = LearnerId::new(&self.email).map_err(|e| invalid(e.to_string()))?;
        let mut member = StaffMember::new(id, self.name.trim(), self.role)
            .with_school(self.school.trim())
            .with_account_type(self.account_type);
        if let Some(raw) = &self.admin_scope {
            let scope: AdminScope = raw.parse().map_err(|e| invalid(format!("{e}")))?;
            member = member.with_admin_scope(scope);
        }
        Ok(member)
    }
}

impl PortalConfig {
    /// Parse a config from TOML text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::EmptyDatabaseUrl` if the url is blank.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validated()
    }

    /// Read the config file at `path`, or use defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, plus any error
    /// from [`PortalConfig::from_toml`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), staff = config.staff.len(), "loaded config");
        Ok(config)
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyDatabaseUrl` if the override is blank.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database_url = url;
        }
        self.validated()
    }

    /// Staff roster as domain values.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::Staff` encountered.
    pub fn staff_members(&self) -> Result<Vec<StaffMember>, ConfigError> {
        self.staff.iter().map(StaffEntry::to_member).collect()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.database_url = self.database_url.trim().to_string();
        if self.database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = PortalConfig::from_toml("").unwrap();
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.database_url, "sqlite:onboard.db?mode=rwc");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn env_overrides_file_database_url() {
        let config = PortalConfig::from_toml(r#"database_url = "sqlite:file.db""#).unwrap();
        let overridden = config
            .clone()
            .with_env_overrides(|key| (key == DATABASE_URL_ENV).then(|| "sqlite:env.db".into()))
            .unwrap();
        assert_eq!(overridden.database_url, "sqlite:env.db");

        let untouched = config.with_env_overrides(|_| None).unwrap();
        assert_eq!(untouched.database_url, "sqlite:file.db");
    }

    #[test]
    fn blank_database_url_is_rejected() {
        assert!(matches!(
            PortalConfig::from_toml(r#"database_url = "  ""#).unwrap_err(),
            ConfigError::EmptyDatabaseUrl
        ));
    }

    #[test]
    fn staff_roster_parses_scope_and_account_type() {
        let config = PortalConfig::from_toml(
            r#"
            [[staff]]
            email = "HR@Darshan.org"
            name = "Hema"
            role = "ADMIN"
            admin_scope = "ALL"

            [[staff]]
            email = "ravi@darshan.org"
            name = "Ravi"
            role = "TEACHER"
            school = "north"
            account_type = "REFRESHER"
            "#,
        )
        .unwrap();
        let staff = config.staff_members().unwrap();
        assert_eq!(staff.len(), 2);
        assert_eq!(staff[0].learner_id.as_str(), "hr@darshan.org");
        assert_eq!(staff[0].admin_scope, Some(AdminScope::All));
        assert_eq!(staff[1].account_type, AccountType::Refresher);
        assert_eq!(staff[1].school_id, "north");
        assert!(!staff[1].is_admin());
    }

    #[test]
    fn unknown_scope_names_the_entry() {
        let config = PortalConfig::from_toml(
            r#"
            [[staff]]
            email = "x@y.org"
            name = "X"
            role = "SECURITY"
            admin_scope = "JANITORIAL"
            "#,
        )
        .unwrap();
        let err = config.staff_members().unwrap_err();
        assert!(matches!(err, ConfigError::Staff { ref email, .. } if email == "x@y.org"));
    }
}
