//! Checkout use-case: validate, price and open a hosted session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;
use zeroize::Zeroizing;

use super::ports::{CheckoutGateway, CheckoutGatewayError, CheckoutInitiator};
use super::{CheckoutDraft, CheckoutError, CheckoutRequest, CheckoutSession, CheckoutSessionRequest};

/// Settings shared by both halves of checkout.
#[derive(Clone)]
pub struct CheckoutSettings {
    /// Application origin used for success and cancel redirects.
    pub app_base_url: Url,
    /// Client-side gateway key; absent means the browser cannot redirect.
    pub publishable_key: Option<Zeroizing<String>>,
}

/// Checkout over an optional gateway.
///
/// The gateway is absent when its secret key is not configured.
pub struct CheckoutService<G: ?Sized> {
    gateway: Option<Arc<G>>,
    settings: CheckoutSettings,
}

impl<G: ?Sized> CheckoutService<G> {
    pub fn new(gateway: Option<Arc<G>>, settings: CheckoutSettings) -> Self {
        Self { gateway, settings }
    }
}

fn gateway_message(err: CheckoutGatewayError) -> String {
    match err {
        CheckoutGatewayError::Rejected { message } => message,
        other => other.to_string(),
    }
}

#[async_trait]
impl<G> CheckoutInitiator for CheckoutService<G>
where
    G: CheckoutGateway + ?Sized,
{
    async fn start_checkout(&self, draft: CheckoutDraft) -> Result<CheckoutSession, CheckoutError> {
        let gateway = self.gateway.as_ref().ok_or(CheckoutError::Configuration)?;
        let request = CheckoutRequest::try_from(draft)?;
        let session_request =
            CheckoutSessionRequest::monthly_subscription(&request, &self.settings.app_base_url)?;

        let session = gateway
            .create_session(&session_request)
            .await
            .map_err(|err| {
                warn!(error = %err, "checkout session creation failed");
                CheckoutError::gateway(gateway_message(err))
            })?;
        info!(
            session_id = %session.id,
            plan = %request.plan_name(),
            amount = session_request.unit_amount.value(),
            "checkout session created"
        );
        Ok(session)
    }

    fn redirect_url(&self, session: &CheckoutSession) -> Result<Url, CheckoutError> {
        if self.settings.publishable_key.is_none() {
            return Err(CheckoutError::client_redirect(
                "payment gateway publishable key is not configured",
            ));
        }
        session
            .url
            .clone()
            .ok_or_else(|| CheckoutError::client_redirect("checkout session has no hosted page"))
    }

    fn publishable_key(&self) -> Option<String> {
        self.settings
            .publishable_key
            .as_ref()
            .map(|key| key.as_str().to_owned())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockCheckoutGateway;
    use crate::domain::CheckoutSessionId;
    use rstest::{fixture, rstest};

    #[fixture]
    fn settings() -> CheckoutSettings {
        CheckoutSettings {
            app_base_url: Url::parse("https://app.example").expect("base url"),
            publishable_key: Some(Zeroizing::new("pk_test_123".to_owned())),
        }
    }

    fn draft(price: Option<f64>, email: Option<&str>) -> CheckoutDraft {
        CheckoutDraft {
            plan_name: Some("Standard".to_owned()),
            price,
            customer_email: email.map(str::to_owned),
        }
    }

    fn hosted_session() -> CheckoutSession {
        CheckoutSession {
            id: CheckoutSessionId::new("cs_test_1").expect("session id"),
            url: Some(Url::parse("https://checkout.example/c/cs_test_1").expect("url")),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn sends_rounded_minor_units_to_gateway(settings: CheckoutSettings) {
        let mut gateway = MockCheckoutGateway::new();
        gateway
            .expect_create_session()
            .withf(|request| {
                request.unit_amount.value() == 999
                    && request.customer_email.as_str() == "ada@example.com"
            })
            .times(1)
            .returning(|_| Ok(hosted_session()));
        let service = CheckoutService::new(Some(Arc::new(gateway)), settings);

        let session = service
            .start_checkout(draft(Some(9.99), Some("ada@example.com")))
            .await
            .expect("session created");

        assert_eq!(session.id.as_str(), "cs_test_1");
    }

    #[rstest]
    #[case::missing_price(draft(None, Some("ada@example.com")))]
    #[case::missing_email(draft(Some(9.99), None))]
    #[tokio::test]
    async fn invalid_drafts_never_reach_gateway(
        settings: CheckoutSettings,
        #[case] draft: CheckoutDraft,
    ) {
        let mut gateway = MockCheckoutGateway::new();
        gateway.expect_create_session().never();
        let service = CheckoutService::new(Some(Arc::new(gateway)), settings);

        let err = service.start_checkout(draft).await.expect_err("validation");

        assert!(matches!(err, CheckoutError::Validation { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_gateway_is_a_configuration_error(settings: CheckoutSettings) {
        let service = CheckoutService::<MockCheckoutGateway>::new(None, settings);

        let err = service
            .start_checkout(draft(None, None))
            .await
            .expect_err("configuration");

        assert_eq!(err, CheckoutError::Configuration);
    }

    #[rstest]
    #[tokio::test]
    async fn gateway_rejections_keep_the_gateway_message(settings: CheckoutSettings) {
        let mut gateway = MockCheckoutGateway::new();
        gateway
            .expect_create_session()
            .returning(|_| Err(CheckoutGatewayError::rejected("Invalid email address: x")));
        let service = CheckoutService::new(Some(Arc::new(gateway)), settings);

        let err = service
            .start_checkout(draft(Some(9.99), Some("x")))
            .await
            .expect_err("gateway failure");

        assert_eq!(err, CheckoutError::gateway("Invalid email address: x"));
    }

    #[rstest]
    fn redirect_requires_publishable_key(mut settings: CheckoutSettings) {
        settings.publishable_key = None;
        let service = CheckoutService::<MockCheckoutGateway>::new(None, settings);

        let err = service
            .redirect_url(&hosted_session())
            .expect_err("client redirect");

        assert!(matches!(err, CheckoutError::ClientRedirect { .. }));
    }

    #[rstest]
    fn redirect_requires_hosted_page(settings: CheckoutSettings) {
        let service = CheckoutService::<MockCheckoutGateway>::new(None, settings);
        let mut session = hosted_session();
        session.url = None;

        assert!(matches!(
            service.redirect_url(&session),
            Err(CheckoutError::ClientRedirect { .. })
        ));
    }

    #[rstest]
    fn redirect_uses_hosted_page(settings: CheckoutSettings) {
        let service = CheckoutService::<MockCheckoutGateway>::new(None, settings);

        let url = service.redirect_url(&hosted_session()).expect("redirect url");

        assert_eq!(url.as_str(), "https://checkout.example/c/cs_test_1");
    }
}
