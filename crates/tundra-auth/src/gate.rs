//! Credential gate — one-time codes and the gated credential mutations.

use chrono::{Duration, Utc};
use tracing::{info, warn};
use tundra_core::collaborator::{Notification, Notifier};
use tundra_core::error::{TundraError, TundraResult};
use tundra_core::models::account::{Account, PendingEmailChange};
use tundra_core::repository::AccountRepository;
use uuid::Uuid;

use crate::code::{CodeSource, NumericCodeSource, OneTimeCode};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::{Argon2Hasher, SecretHasher};

/// Credential gate.
///
/// Generic over the account repository and every collaborator so the
/// gate has no dependency on the database crate.
pub struct CredentialGate<A, N, H = Argon2Hasher, C = NumericCodeSource> {
    accounts: A,
    notifier: N,
    hasher: H,
    codes: C,
    config: AuthConfig,
}

impl<A: AccountRepository, N: Notifier> CredentialGate<A, N> {
    /// Build a gate with the Argon2id hasher and numeric code source
    /// configured from `config`.
    pub fn new(accounts: A, notifier: N, config: AuthConfig) -> Self {
        let hasher = Argon2Hasher::new(config.pepper.clone());
        let codes = NumericCodeSource::new(config.one_time_code_length);
        Self::with_parts(accounts, notifier, hasher, codes, config)
    }
}

impl<A, N, H, C> CredentialGate<A, N, H, C>
where
    A: AccountRepository,
    N: Notifier,
    H: SecretHasher,
    C: CodeSource,
{
    pub fn with_parts(accounts: A, notifier: N, hasher: H, codes: C, config: AuthConfig) -> Self {
        Self {
            accounts,
            notifier,
            hasher,
            codes,
            config,
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Check `provided` against `stored_hash`. A mismatch is `Ok(false)`.
    pub fn verify_secret(&self, provided: &str, stored_hash: &str) -> TundraResult<bool> {
        Ok(self.hasher.verify(provided, stored_hash)?)
    }

    /// Generate a code and its hash, expiring after the configured window.
    pub fn issue_one_time_code(&self) -> TundraResult<OneTimeCode> {
        let lifetime_secs = self.config.one_time_code_lifetime_secs;
        let expires_at = i64::try_from(lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "one-time code lifetime of {lifetime_secs}s is out of range"
                ))
            })?;

        let code = self.codes.generate();
        let code_hash = self.hasher.hash(&code)?;
        Ok(OneTimeCode {
            code,
            code_hash,
            expires_at,
        })
    }

    /// Step one of an email change: park the new address with a hashed
    /// code and send the plaintext code to the new address.
    ///
    /// A second request replaces the first; its code stops working.
    pub async fn request_email_change(
        &self,
        account_id: Uuid,
        new_email: &str,
    ) -> TundraResult<OneTimeCode> {
        let account = self.accounts.get_by_id(account_id).await?;
        self.ensure_email_available(&account, new_email).await?;

        let issued = self.issue_one_time_code()?;
        self.accounts
            .set_pending_email(
                account_id,
                PendingEmailChange {
                    email: new_email.to_owned(),
                    code_hash: issued.code_hash.clone(),
                    expires_at: issued.expires_at,
                },
            )
            .await?;

        self.notifier.emit(Notification::ConfirmEmailChange {
            to: new_email.to_owned(),
            code: issued.code.clone(),
        });

        info!(account_id = %account_id, expires_at = %issued.expires_at, "Email change requested");
        Ok(issued)
    }

    /// Step two of an email change: redeem the code and swap the address
    /// in the same conditional write.
    ///
    /// Fails with `NotFound` when nothing is pending (including a code
    /// that was already redeemed), `InvalidCredential` on a wrong code
    /// and `Expired` past the window.
    pub async fn confirm_email_change(&self, account_id: Uuid, code: &str) -> TundraResult<Account> {
        let account = self.accounts.get_by_id(account_id).await?;
        let pending = account
            .pending_email
            .clone()
            .ok_or(AuthError::CodeNotPending)?;

        if !self.hasher.verify(code, &pending.code_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        if now > pending.expires_at {
            return Err(AuthError::CodeExpired.into());
        }

        // The address may have been claimed since the request.
        self.ensure_email_available(&account, &pending.email).await?;

        let updated = self
            .accounts
            .apply_pending_email(account_id, &pending.code_hash, now)
            .await?
            .ok_or_else(|| {
                warn!(account_id = %account_id, "Email change code redeemed concurrently");
                TundraError::from(AuthError::CodeNotPending)
            })?;

        info!(account_id = %account_id, "Email change confirmed");
        Ok(updated)
    }

    /// Verify the current password, store the new one and bump
    /// `credentials_changed_at`. An informational code goes to the
    /// account's address afterwards; it gates nothing.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> TundraResult<Account> {
        let account = self.accounts.get_by_id(account_id).await?;

        if !self.hasher.verify(old_password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        if new_password.chars().count() < self.config.min_password_length {
            return Err(AuthError::Policy(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            ))
            .into());
        }

        if self.hasher.verify(new_password, &account.password_hash)? {
            return Err(TundraError::conflict(
                "new password must differ from the current one",
            ));
        }

        let password_hash = self.hasher.hash(new_password)?;
        let updated = self
            .accounts
            .set_password(account_id, password_hash, Utc::now())
            .await?;

        self.notifier.emit(Notification::PasswordChanged {
            to: updated.email.clone(),
            code: self.codes.generate(),
        });

        info!(account_id = %account_id, "Password changed");
        Ok(updated)
    }

    async fn ensure_email_available(&self, account: &Account, email: &str) -> TundraResult<()> {
        if account.email == email {
            return Err(TundraError::conflict("new email matches the current one"));
        }
        match self.accounts.get_by_email(email).await {
            Ok(_) => Err(TundraError::conflict("email already exists")),
            Err(TundraError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
