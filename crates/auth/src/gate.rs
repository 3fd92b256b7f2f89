//! Authorization checks applied after authentication.
//!
//! - No IO
//! - No panics
//! - Operates on an account already resolved by the session layer

use elearn_core::CourseId;

use crate::{Account, AuthError, Role};

/// Permit the account only if its role is one of `allowed`.
pub fn require_role(account: &Account, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&account.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Course content is readable only by accounts that own the course; the
/// admin role grants no bypass.
pub fn authorize_course_access(account: &Account, course_id: &CourseId) -> Result<(), AuthError> {
    if account.owns_course(course_id) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular() -> Account {
        Account::social("Lin", "lin@example.com", None, chrono::Utc::now())
    }

    #[test]
    fn regular_account_is_denied_admin_operations() {
        assert_eq!(require_role(&regular(), &[Role::Admin]), Err(AuthError::Forbidden));
    }

    #[test]
    fn admin_passes_admin_gate() {
        let admin = regular().with_role(Role::Admin);
        assert_eq!(require_role(&admin, &[Role::Admin]), Ok(()));
    }

    #[test]
    fn gate_accepts_any_listed_role() {
        assert_eq!(require_role(&regular(), &[Role::Regular, Role::Admin]), Ok(()));
    }

    #[test]
    fn course_access_requires_ownership() {
        let course = CourseId::new();
        let mut account = regular();
        assert_eq!(authorize_course_access(&account, &course), Err(AuthError::Forbidden));

        account.courses.insert(course);
        assert_eq!(authorize_course_access(&account, &course), Ok(()));
    }

    #[test]
    fn admins_need_ownership_too() {
        let course = CourseId::new();
        let mut admin = regular().with_role(Role::Admin);
        assert_eq!(authorize_course_access(&admin, &course), Err(AuthError::Forbidden));

        admin.courses.insert(course);
        assert_eq!(authorize_course_access(&admin, &course), Ok(()));
    }
}
