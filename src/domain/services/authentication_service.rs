use crate::domain::{models::account::Account, services::password_service::PasswordHasher};

/// Outcome of one login attempt. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    NoSuchAccount,
    PendingCredential,
    Mismatch,
    Success,
}

/// How a pending credential is reported back to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingMode {
    /// Report it as an ordinary mismatch, so callers cannot tell which
    /// accounts are still waiting for their first password
    #[default]
    Collapsed,
    Distinct,
}

/// Decide whether `plaintext` authenticates `account`.
///
/// `account` is the result of the lookup by public identifier; `None` means
/// nothing matched.
pub fn decide<P: PasswordHasher>(
    account: Option<&Account>,
    plaintext: &str,
    hasher: &P,
    mode: PendingMode,
) -> VerificationResult {
    let Some(account) = account else {
        return VerificationResult::NoSuchAccount;
    };

    if account.verify_password(plaintext, hasher) {
        return VerificationResult::Success;
    }

    match mode {
        PendingMode::Distinct if account.is_pending() => VerificationResult::PendingCredential,
        _ => VerificationResult::Mismatch,
    }
}
