/// Shared-password gate in front of the admin dashboard.
///
/// There is a single operator password, no expiry, and no lockout.
#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

/// Proof that the admin password was presented. Only [`AdminGate::login`]
/// creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    _issued: (),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("비밀번호가 틀렸습니다.")]
    InvalidPassword,
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn login(&self, attempt: &str) -> Result<AdminSession, AuthError> {
        if attempt == self.password {
            Ok(AdminSession { _issued: () })
        } else {
            Err(AuthError::InvalidPassword)
        }
    }
}
