//! Domain primitives, services and ports.
//!
//! Purpose: hold the transport-agnostic core of the three collaborators
//! (symptom normalization, subscription synchronisation and checkout).
//! Inbound and outbound adapters depend on this module; it depends on none of
//! them.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: the shared error payload and its stable codes.
//! - `TraceId`: request-scoped correlation identifier.
//! - `UserId`, `EmailAddress`, `SubscriptionTier`, `PaidTier`, `UserProfile`.
//! - `Credentials`, `IdentitySession`: identity-provider session values.
//! - `SymptomDescription`, `NormalizedSymptoms`, `ModelPrompt` and
//!   `SymptomNormalizationService`.
//! - `CheckoutPlan`, `CheckoutDraft`, `CheckoutSessionRequest` and
//!   `CheckoutService`.
//! - `SubscriptionSynchronizer`, `ProfileState` and `AccountService`.

pub mod account;
pub mod checkout;
pub mod checkout_service;
pub mod error;
pub mod identity;
pub mod ports;
pub mod subscription;
pub mod symptom_service;
pub mod symptoms;
pub mod trace_id;
pub mod user;

pub use self::account::{AccountError, AccountService, SignedIn};
pub use self::checkout::{
    BillingInterval, CHECKOUT_CURRENCY, CheckoutDraft, CheckoutError, CheckoutPlan,
    CheckoutRequest, CheckoutSession, CheckoutSessionId, CheckoutSessionRequest, MinorUnits,
    MonthlyPrice, PlanName,
};
pub use self::checkout_service::{CheckoutService, CheckoutSettings};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{
    Credentials, CredentialsValidationError, DEFAULT_RECENT_LOGIN_WINDOW, IdToken,
    IdentitySession, Password,
};
pub use self::subscription::{ProfileState, SubscriptionError, SubscriptionSynchronizer};
pub use self::symptom_service::SymptomNormalizationService;
pub use self::symptoms::{
    ModelPrompt, NORMALIZED_SYMPTOMS_FIELD, NormalizedSymptoms, SafetyCategory, SafetyOverride,
    SafetyThreshold, SymptomDescription, SymptomNormalizationError, SymptomValidationError,
    parse_normalized_output,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, PaidTier, SubscriptionTier, TierParseError, UserId, UserProfile,
    UserValidationError,
};
