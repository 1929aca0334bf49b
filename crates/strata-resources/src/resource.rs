//! Resource state machine boundary.

use async_trait::async_trait;
use strata_core::{AuthenticatedUser, Chain, ResourceKind, ResourceScope, Result};
use strata_sessions::{Authenticator, SiwxOverrides};

/// A capability that holds its own authenticated session.
///
/// Implementations move through three states:
///
/// - **Disconnected**: no usable backend handle. Only `connect` is valid.
/// - **Connected**: backend reachable, no session. `authorize` and
///   `set_session` are valid.
/// - **Authorized**: a session and its owning user are held. Operations
///   that need the session are valid; `clear_session` returns to Connected.
///
/// `connect` is idempotent. All state transitions are serialized behind the
/// implementation's internal lock; reads observe a consistent snapshot.
#[async_trait]
pub trait AuthenticatedResource: Send + Sync {
    /// Which capability this resource provides.
    fn kind(&self) -> ResourceKind;

    /// The scope presented to wallets during sign-in.
    fn scope(&self) -> ResourceScope;

    /// Chains this resource can authorize.
    fn supported_chains(&self) -> &'static [Chain];

    /// Whether a chain is in the supported set.
    fn supports_chain(&self, chain: Chain) -> bool {
        self.supported_chains().contains(&chain)
    }

    /// Establish the backend connection. Safe to call repeatedly.
    async fn connect(&self) -> Result<()>;

    /// Run the full authentication flow and install the resulting session,
    /// returning its serialized form for persistence.
    async fn authorize(
        &self,
        authenticator: &Authenticator,
        overrides: Option<&SiwxOverrides>,
    ) -> Result<String>;

    /// Install a previously serialized session after verifying it belongs
    /// to `user`. On any verification failure the session slot is cleared
    /// before the error is returned.
    async fn set_session(&self, user: &AuthenticatedUser, serialized: &str) -> Result<()>;

    /// Drop the held session, returning to Connected.
    async fn clear_session(&self);

    /// Whether the held session belongs to `user`. False when no session
    /// is held.
    async fn is_current_user(&self, user: &AuthenticatedUser) -> bool;

    /// Serialized form of the held session, if any.
    async fn serialized_session(&self) -> Result<Option<String>>;

    /// The user the held session belongs to, if any.
    async fn user(&self) -> Option<AuthenticatedUser>;
}
