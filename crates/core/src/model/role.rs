use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoleError {
    #[error("unknown staff role: {0}")]
    UnknownRole(String),

    #[error("unknown admin scope: {0}")]
    UnknownScope(String),

    #[error("unknown account type: {0}")]
    UnknownAccountType(String),

    #[error("unknown module category: {0}")]
    UnknownCategory(String),
}

//
// ─── STAFF ROLE ────────────────────────────────────────────────────────────────
//

/// Job role a staff member trains for. Every module belongs to exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Admin,
    Teacher,
    Accountant,
    CleaningStaff,
    Security,
    Principal,
    Other,
}

impl StaffRole {
    pub const ALL: [StaffRole; 7] = [
        StaffRole::Teacher,
        StaffRole::Accountant,
        StaffRole::CleaningStaff,
        StaffRole::Security,
        StaffRole::Principal,
        StaffRole::Admin,
        StaffRole::Other,
    ];

    /// Storage representation (`TEACHER`, `CLEANING_STAFF`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Admin => "ADMIN",
            StaffRole::Teacher => "TEACHER",
            StaffRole::Accountant => "ACCOUNTANT",
            StaffRole::CleaningStaff => "CLEANING_STAFF",
            StaffRole::Security => "SECURITY",
            StaffRole::Principal => "PRINCIPAL",
            StaffRole::Other => "OTHER",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            StaffRole::Admin => "Administrator",
            StaffRole::Teacher => "Teacher",
            StaffRole::Accountant => "Accountant",
            StaffRole::CleaningStaff => "Cleaning Staff",
            StaffRole::Security => "Security",
            StaffRole::Principal => "Principal",
            StaffRole::Other => "Other Staff",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = RoleError;

    /// Accepts the storage form as well as lowercase / kebab-case input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        StaffRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| RoleError::UnknownRole(s.to_string()))
    }
}

//
// ─── ADMIN SCOPE ───────────────────────────────────────────────────────────────
//

/// What an administrator is allowed to see and manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminScope {
    /// HR: every role, plus staff account management.
    All,
    /// Branch or department head restricted to a single role.
    Role(StaffRole),
}

impl AdminScope {
    #[must_use]
    pub fn covers(self, role: StaffRole) -> bool {
        match self {
            AdminScope::All => true,
            AdminScope::Role(scoped) => scoped == role,
        }
    }

    /// Only HR may create or delete staff accounts.
    #[must_use]
    pub fn can_manage_accounts(self) -> bool {
        matches!(self, AdminScope::All)
    }

    #[must_use]
    pub fn as_storage(self) -> &'static str {
        match self {
            AdminScope::All => "ALL",
            AdminScope::Role(role) => role.as_str(),
        }
    }
}

impl fmt::Display for AdminScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_storage())
    }
}

impl FromStr for AdminScope {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(AdminScope::All);
        }
        s.parse::<StaffRole>()
            .map(AdminScope::Role)
            .map_err(|_| RoleError::UnknownScope(s.to_string()))
    }
}

//
// ─── ACCOUNT TYPE / CATEGORY ───────────────────────────────────────────────────
//

/// Portal a staff account logs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    New,
    Refresher,
}

/// Onboarding content versus refresher content. Informational only: both
/// account types see every module of their role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleCategory {
    #[default]
    New,
    Refresher,
}

impl AccountType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::New => "NEW",
            AccountType::Refresher => "REFRESHER",
        }
    }
}

impl ModuleCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleCategory::New => "NEW",
            ModuleCategory::Refresher => "REFRESHER",
        }
    }
}

impl FromStr for AccountType {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(AccountType::New),
            "REFRESHER" => Ok(AccountType::Refresher),
            _ => Err(RoleError::UnknownAccountType(s.to_string())),
        }
    }
}

impl FromStr for ModuleCategory {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(ModuleCategory::New),
            "REFRESHER" => Ok(ModuleCategory::Refresher),
            _ => Err(RoleError::UnknownCategory(s.to_string())),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_storage_and_cli_forms() {
        assert_eq!("TEACHER".parse::<StaffRole>().unwrap(), StaffRole::Teacher);
        assert_eq!(
            "cleaning-staff".parse::<StaffRole>().unwrap(),
            StaffRole::CleaningStaff
        );
        assert!(matches!(
            "janitor".parse::<StaffRole>(),
            Err(RoleError::UnknownRole(_))
        ));
    }

    #[test]
    fn role_storage_form_round_trips_for_every_role() {
        for role in StaffRole::ALL {
            assert_eq!(role.as_str().parse::<StaffRole>().unwrap(), role);
        }
    }

    #[test]
    fn scope_all_covers_every_role() {
        let scope: AdminScope = "ALL".parse().unwrap();
        assert!(StaffRole::ALL.into_iter().all(|r| scope.covers(r)));
        assert!(scope.can_manage_accounts());
    }

    #[test]
    fn role_scope_covers_only_its_role() {
        let scope: AdminScope = "SECURITY".parse().unwrap();
        assert_eq!(scope, AdminScope::Role(StaffRole::Security));
        assert!(scope.covers(StaffRole::Security));
        assert!(!scope.covers(StaffRole::Teacher));
        assert!(!scope.can_manage_accounts());
    }

    #[test]
    fn unknown_scope_is_rejected() {
        assert!(matches!(
            "everyone".parse::<AdminScope>(),
            Err(RoleError::UnknownScope(_))
        ));
    }
}
