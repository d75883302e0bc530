use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    AccessCatalog,
    EditCatalog,
    ManagePermissions,
}

impl Permission {
    pub fn as_int(self) -> i32 {
        match self {
            Permission::AccessCatalog => 1,
            Permission::EditCatalog => 2,
            Permission::ManagePermissions => 3,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Permission::AccessCatalog),
            2 => Some(Permission::EditCatalog),
            3 => Some(Permission::ManagePermissions),
            _ => None,
        }
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::AccessCatalog,
    Permission::EditCatalog,
    Permission::ManagePermissions,
];
const REGULAR_PERMISSIONS: &[Permission] = &[Permission::AccessCatalog];

/// Admin is the store owner: the only role allowed to add, edit and delete captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    Regular,
}

impl UserRole {
    pub const ALL: &'static [UserRole] = &[UserRole::Admin, UserRole::Regular];

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::Regular => REGULAR_PERMISSIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Regular => "Regular",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "regular" => Some(UserRole::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_int_roundtrip_and_unknown_values() {
        for permission in [
            Permission::AccessCatalog,
            Permission::EditCatalog,
            Permission::ManagePermissions,
        ] {
            assert_eq!(Permission::from_int(permission.as_int()), Some(permission));
        }
        assert_eq!(Permission::from_int(0), None);
        assert_eq!(Permission::from_int(42), None);
    }

    #[test]
    fn only_admin_can_edit_catalog() {
        assert!(UserRole::Admin
            .permissions()
            .contains(&Permission::EditCatalog));
        assert!(!UserRole::Regular
            .permissions()
            .contains(&Permission::EditCatalog));
        assert!(UserRole::Regular
            .permissions()
            .contains(&Permission::AccessCatalog));
    }

    #[test]
    fn role_from_str_is_case_insensitive() {
        assert_eq!(UserRole::from_str("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("regular"), Some(UserRole::Regular));
        assert_eq!(UserRole::from_str("owner"), None);
        assert_eq!(UserRole::Admin.to_string(), "Admin");
    }
}
