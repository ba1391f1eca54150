// security/src/roles.rs
use models::Role;

use crate::AuthError;

/// Numeric role ids as carried in the `role_id` token claim.
pub const PATIENT_ROLE_ID: u32 = 1;
pub const DOCTOR_ROLE_ID: u32 = 2;
pub const ADMIN_ROLE_ID: u32 = 3;

pub fn role_id(role: Role) -> u32 {
    match role {
        Role::Patient => PATIENT_ROLE_ID,
        Role::Doctor => DOCTOR_ROLE_ID,
        Role::Admin => ADMIN_ROLE_ID,
    }
}

pub fn role_from_id(role_id: u32) -> Result<Role, AuthError> {
    match role_id {
        PATIENT_ROLE_ID => Ok(Role::Patient),
        DOCTOR_ROLE_ID => Ok(Role::Doctor),
        ADMIN_ROLE_ID => Ok(Role::Admin),
        other => Err(AuthError::UnknownRole(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_role_ids_both_ways() {
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(role_from_id(role_id(role)).unwrap(), role);
        }
        assert!(matches!(role_from_id(0), Err(AuthError::UnknownRole(0))));
    }
}
