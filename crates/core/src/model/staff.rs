use crate::model::ids::LearnerId;
use crate::model::role::{AccountType, AdminScope, StaffRole};

/// Identity of a signed-in staff member, supplied by the credential provider.
///
/// The core never checks credentials; it only needs a stable id and a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub learner_id: LearnerId,
    pub name: String,
    pub role: StaffRole,
    pub school_id: String,
    pub account_type: AccountType,
    pub admin_scope: Option<AdminScope>,
}

impl StaffMember {
    #[must_use]
    pub fn new(learner_id: LearnerId, name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            learner_id,
            name: name.into(),
            role,
            school_id: String::new(),
            account_type: AccountType::New,
            admin_scope: None,
        }
    }

    #[must_use]
    pub fn with_school(mut self, school_id: impl Into<String>) -> Self {
        self.school_id = school_id.into();
        self
    }

    #[must_use]
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    #[must_use]
    pub fn with_admin_scope(mut self, scope: AdminScope) -> Self {
        self.admin_scope = Some(scope);
        self
    }

    /// Admin-role accounts and anyone holding a scope may open the admin view.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == StaffRole::Admin || self.admin_scope.is_some()
    }

    /// Case-insensitive match on name, or substring match on email.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term.to_lowercase())
            || self.learner_id.as_str().contains(&term.to_lowercase())
    }
}
