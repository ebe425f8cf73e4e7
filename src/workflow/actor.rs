use std::fmt;

use uuid::Uuid;

/// Who is asking for a change. Passed explicitly into every workflow call;
/// used for logs and the status audit trail, not for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Reviewer(Uuid),
    /// Public submission form.
    Author,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Admin => f.write_str("admin"),
            Actor::Reviewer(id) => write!(f, "reviewer:{}", id),
            Actor::Author => f.write_str("author"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable_for_audit_rows() {
        let id = Uuid::nil();
        assert_eq!(Actor::Admin.to_string(), "admin");
        assert_eq!(
            Actor::Reviewer(id).to_string(),
            "reviewer:00000000-0000-0000-0000-000000000000"
        );
    }
}
