use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform role of a user.
///
/// New accounts start as `Pending` until they pick Jobseeker or Recruiter;
/// `Pending` is the only role the role-selection operation can leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Pending = 0,
    Jobseeker = 1,
    Recruiter = 2,
    Admin = 3,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Pending => "pending",
            Jobseeker => "jobseeker",
            Recruiter => "recruiter",
            Admin => "admin",
        }
    }

    /// Roles a user may select for themselves (role-selection operation)
    #[inline]
    pub const fn is_selectable(&self) -> bool {
        use UserRole::*;
        matches!(self, Jobseeker | Recruiter)
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(Pending),
            1 => Some(Jobseeker),
            2 => Some(Recruiter),
            3 => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "pending" => Some(Pending),
            "jobseeker" => Some(Jobseeker),
            "recruiter" => Some(Recruiter),
            "admin" => Some(Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_id() {
        assert_eq!(UserRole::from_id(0), Some(UserRole::Pending));
        assert_eq!(UserRole::from_id(1), Some(UserRole::Jobseeker));
        assert_eq!(UserRole::from_id(2), Some(UserRole::Recruiter));
        assert_eq!(UserRole::from_id(3), Some(UserRole::Admin));
        assert_eq!(UserRole::from_id(9), None);
    }

    #[test]
    fn test_user_role_from_code() {
        assert_eq!(UserRole::from_code("pending"), Some(UserRole::Pending));
        assert_eq!(UserRole::from_code("jobseeker"), Some(UserRole::Jobseeker));
        assert_eq!(UserRole::from_code("recruiter"), Some(UserRole::Recruiter));
        assert_eq!(UserRole::from_code("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_code("superuser"), None);
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(UserRole::default(), UserRole::Pending);
    }

    #[test]
    fn test_selectable_roles() {
        assert!(!UserRole::Pending.is_selectable());
        assert!(UserRole::Jobseeker.is_selectable());
        assert!(UserRole::Recruiter.is_selectable());
        assert!(!UserRole::Admin.is_selectable());
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Pending.to_string(), "pending");
        assert_eq!(UserRole::Jobseeker.to_string(), "jobseeker");
        assert_eq!(UserRole::Recruiter.to_string(), "recruiter");
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
