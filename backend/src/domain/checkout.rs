//! Hosted checkout model.
//!
//! Prices arrive as decimal currency amounts and leave as integer minor units.
//! The conversion rounds to the nearest cent; truncation would underbill every
//! price whose binary product falls just short (19.99 * 100 is
//! 1998.9999999999998).

use std::fmt;

use serde_json::json;
use url::Url;

use super::{EmailAddress, Error, PaidTier};

/// Currency used for every checkout session.
pub const CHECKOUT_CURRENCY: &str = "usd";
/// Largest amount the gateway accepts for a single line item.
pub const MAX_MINOR_UNITS: i64 = 99_999_999;
/// Placeholder the gateway substitutes with the created session id.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Failure taxonomy for checkout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The gateway secret is not configured.
    #[error("payment gateway is not configured")]
    Configuration,
    /// Plan or email input is missing or malformed.
    #[error("{message}")]
    Validation { message: String },
    /// The gateway call failed.
    #[error("{message}")]
    Gateway { message: String },
    /// The browser-side redirect cannot be performed.
    #[error("cannot redirect to checkout: {message}")]
    ClientRedirect { message: String },
}

impl CheckoutError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    pub fn client_redirect(message: impl Into<String>) -> Self {
        Self::ClientRedirect {
            message: message.into(),
        }
    }
}

impl From<CheckoutError> for Error {
    fn from(value: CheckoutError) -> Self {
        match value {
            CheckoutError::Configuration => Error::internal("payment gateway is not configured"),
            CheckoutError::Validation { message } => Error::invalid_request(message),
            CheckoutError::Gateway { message } => Error::upstream_failure(message)
                .with_details(json!({ "code": "payment_gateway" })),
            CheckoutError::ClientRedirect { message } => {
                Error::internal(format!("cannot redirect to checkout: {message}"))
            }
        }
    }
}

/// Display name of a plan, e.g. `Standard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanName(String);

impl PlanName {
    pub fn new(raw: impl Into<String>) -> Result<Self, CheckoutError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CheckoutError::validation("plan name must not be empty"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly price in major currency units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPrice(f64);

impl MonthlyPrice {
    pub fn new(value: f64) -> Result<Self, CheckoutError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CheckoutError::validation(
                "plan price must be a positive amount",
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to integer minor units, rounding to the nearest cent.
    ///
    /// ```
    /// use healthsyntra::domain::MonthlyPrice;
    ///
    /// let price = MonthlyPrice::new(9.99).expect("positive price");
    /// assert_eq!(price.to_minor_units().expect("chargeable").value(), 999);
    /// ```
    pub fn to_minor_units(self) -> Result<MinorUnits, CheckoutError> {
        let cents = (self.0 * 100.0).round();
        if cents < 1.0 {
            return Err(CheckoutError::validation(
                "plan price must be at least one cent",
            ));
        }
        if cents > MAX_MINOR_UNITS as f64 {
            return Err(CheckoutError::validation(
                "plan price exceeds the largest chargeable amount",
            ));
        }
        Ok(MinorUnits(cents as i64))
    }
}

/// Amount in the currency's smallest unit (cents for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub fn value(self) -> i64 {
        self.0
    }
}

/// A purchasable plan from the static catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    id: PaidTier,
    name: PlanName,
    monthly_price: MonthlyPrice,
}

impl CheckoutPlan {
    /// Plan offered for `tier`.
    pub fn for_tier(tier: PaidTier) -> Self {
        let (name, price) = match tier {
            PaidTier::Standard => ("Standard", 9.99),
            PaidTier::Premium => ("Premium", 19.99),
        };
        Self {
            id: tier,
            name: PlanName(name.to_owned()),
            monthly_price: MonthlyPrice(price),
        }
    }

    /// Every purchasable plan, cheapest first.
    pub fn catalogue() -> Vec<Self> {
        PaidTier::ALL.into_iter().map(Self::for_tier).collect()
    }

    pub fn id(&self) -> PaidTier {
        self.id
    }

    pub fn name(&self) -> &PlanName {
        &self.name
    }

    pub fn monthly_price(&self) -> MonthlyPrice {
        self.monthly_price
    }
}

/// Unvalidated checkout input as received from a client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutDraft {
    pub plan_name: Option<String>,
    pub price: Option<f64>,
    pub customer_email: Option<String>,
}

impl CheckoutDraft {
    /// Draft for a catalogue plan bought by `email`.
    pub fn for_plan(plan: &CheckoutPlan, email: &EmailAddress) -> Self {
        Self {
            plan_name: Some(plan.name().as_str().to_owned()),
            price: Some(plan.monthly_price().value()),
            customer_email: Some(email.as_str().to_owned()),
        }
    }
}

/// Validated checkout input.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    plan_name: PlanName,
    price: MonthlyPrice,
    customer_email: EmailAddress,
}

impl TryFrom<CheckoutDraft> for CheckoutRequest {
    type Error = CheckoutError;

    fn try_from(draft: CheckoutDraft) -> Result<Self, Self::Error> {
        let plan_name = PlanName::new(draft.plan_name.unwrap_or_default())?;
        let price = draft
            .price
            .ok_or_else(|| CheckoutError::validation("plan price is required"))
            .and_then(MonthlyPrice::new)?;
        let customer_email = EmailAddress::new(draft.customer_email.unwrap_or_default())
            .map_err(|err| CheckoutError::validation(err.to_string()))?;
        Ok(Self {
            plan_name,
            price,
            customer_email,
        })
    }
}

impl CheckoutRequest {
    pub fn plan_name(&self) -> &PlanName {
        &self.plan_name
    }

    pub fn price(&self) -> MonthlyPrice {
        self.price
    }

    pub fn customer_email(&self) -> &EmailAddress {
        &self.customer_email
    }
}

/// Recurring billing interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingInterval {
    Month,
}

impl BillingInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
        }
    }
}

/// Everything the gateway needs to open a hosted subscription checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub product_name: String,
    pub product_description: String,
    pub unit_amount: MinorUnits,
    pub currency: &'static str,
    pub interval: BillingInterval,
    pub quantity: u32,
    pub customer_email: EmailAddress,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    /// Single-item monthly subscription for `request`, returning to `base_url`.
    pub fn monthly_subscription(
        request: &CheckoutRequest,
        base_url: &Url,
    ) -> Result<Self, CheckoutError> {
        let base = base_url.as_str().trim_end_matches('/');
        let name = request.plan_name();
        Ok(Self {
            product_name: format!("{name} Plan"),
            product_description: format!("Monthly subscription to the Healthsyntra {name} plan."),
            unit_amount: request.price().to_minor_units()?,
            currency: CHECKOUT_CURRENCY,
            interval: BillingInterval::Month,
            quantity: 1,
            customer_email: request.customer_email().clone(),
            success_url: format!("{base}/checkout/success?session_id={SESSION_ID_PLACEHOLDER}"),
            cancel_url: format!("{base}/checkout/cancel"),
        })
    }
}

/// Opaque session identifier issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionId(String);

impl CheckoutSessionId {
    pub fn new(raw: impl Into<String>) -> Result<Self, CheckoutError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CheckoutError::gateway("payment gateway returned an empty session id"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CheckoutSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A created hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    /// Hosted payment page, when the gateway returns one.
    pub url: Option<Url>,
}
