use crate::models::Role;

/// Role gate: decides whether a caller may run an operation that declares
/// a set of required roles.
///
/// An empty requirement allows everyone, an absent caller is always
/// denied, otherwise the caller's role must be one of the required ones.
pub fn authorize(required: &[Role], caller: Option<Role>) -> bool {
    if required.is_empty() {
        return true;
    }
    match caller {
        Some(role) => required.contains(&role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_required_roles_allows_anyone() {
        assert!(authorize(&[], Some(Role::User)));
        assert!(authorize(&[], Some(Role::Admin)));
        assert!(authorize(&[], None));
    }

    #[test]
    fn test_absent_caller_is_denied() {
        assert!(!authorize(&[Role::Admin], None));
        assert!(!authorize(&[Role::User], None));
    }

    #[test]
    fn test_wrong_role_is_denied() {
        assert!(!authorize(&[Role::Admin], Some(Role::User)));
        assert!(!authorize(&[Role::User], Some(Role::Admin)));
    }

    #[test]
    fn test_matching_role_is_allowed() {
        assert!(authorize(&[Role::Admin], Some(Role::Admin)));
        assert!(authorize(&[Role::User], Some(Role::User)));
    }

    #[test]
    fn test_membership_in_multiple_required_roles() {
        assert!(authorize(&[Role::User, Role::Admin], Some(Role::User)));
        assert!(authorize(&[Role::User, Role::Admin], Some(Role::Admin)));
    }
}
