//! Driving port for checkout.
//!
//! The server half creates the session; the client half turns it into the
//! hosted page the browser is sent to.

use async_trait::async_trait;
use url::Url;

use crate::domain::{CheckoutDraft, CheckoutError, CheckoutSession};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutInitiator: Send + Sync {
    /// Validate the draft and open a hosted subscription checkout.
    async fn start_checkout(&self, draft: CheckoutDraft) -> Result<CheckoutSession, CheckoutError>;

    /// Hosted payment page for `session`.
    fn redirect_url(&self, session: &CheckoutSession) -> Result<Url, CheckoutError>;

    /// Client-side gateway key, when configured.
    fn publishable_key(&self) -> Option<String>;
}
