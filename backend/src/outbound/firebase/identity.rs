//! Identity Toolkit REST adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use zeroize::Zeroizing;

use super::dto::{
    DeleteAccountRequestDto, GoogleErrorEnvelopeDto, PasswordAuthRequestDto,
    PasswordAuthResponseDto,
};
use super::{API_KEY_HEADER, FirebaseSettings, transport_message};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{Credentials, EmailAddress, IdToken, IdentitySession, UserId};
use crate::outbound::http_support::{client_with_timeout, status_message};

/// Email/password accounts managed by Firebase Authentication.
pub struct FirebaseIdentityProvider {
    client: Client,
    api_key: Zeroizing<String>,
    sign_up: Url,
    sign_in: Url,
    delete: Url,
    clock: Arc<dyn Clock>,
    recent_login_window: Duration,
}

impl FirebaseIdentityProvider {
    /// # Errors
    ///
    /// Returns [`IdentityProviderError::Transport`] when an endpoint or the
    /// client cannot be built.
    pub fn new(
        settings: &FirebaseSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, IdentityProviderError> {
        let client = client_with_timeout(settings.timeout)
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            sign_up: accounts_endpoint(&settings.identity_api_base, "signUp")?,
            sign_in: accounts_endpoint(&settings.identity_api_base, "signInWithPassword")?,
            delete: accounts_endpoint(&settings.identity_api_base, "delete")?,
            clock,
            recent_login_window: settings.recent_login_window,
        })
    }

    async fn call<B: Serialize + Sync>(
        &self,
        endpoint: &Url,
        body: &B,
    ) -> Result<Vec<u8>, IdentityProviderError> {
        let response = self
            .client
            .post(endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(map_status_error(status, body.as_ref()))
        }
    }

    async fn password_auth(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> Result<IdentitySession, IdentityProviderError> {
        let request = PasswordAuthRequestDto {
            email: credentials.email().as_str(),
            password: credentials.password().expose(),
            return_secure_token: true,
        };
        let body = self.call(endpoint, &request).await?;
        decode_session(&body, credentials.email(), self.clock.utc())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> Result<IdentitySession, IdentityProviderError> {
        self.password_auth(&self.sign_up, credentials).await
    }

    async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<IdentitySession, IdentityProviderError> {
        self.password_auth(&self.sign_in, credentials).await
    }

    fn is_session_fresh(&self, session: &IdentitySession) -> bool {
        session.is_recent(self.clock.utc(), self.recent_login_window)
    }

    async fn delete_account(&self, session: &IdentitySession) -> Result<(), IdentityProviderError> {
        let request = DeleteAccountRequestDto {
            id_token: session.id_token().expose(),
        };
        self.call(&self.delete, &request).await.map(drop)
    }
}

fn accounts_endpoint(base: &Url, method: &str) -> Result<Url, IdentityProviderError> {
    let base = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/accounts:{method}")).map_err(|err| {
        IdentityProviderError::transport(format!("invalid identity endpoint: {err}"))
    })
}

fn decode_session(
    body: &[u8],
    fallback_email: &EmailAddress,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<IdentitySession, IdentityProviderError> {
    let dto: PasswordAuthResponseDto = serde_json::from_slice(body).map_err(|err| {
        IdentityProviderError::decode(format!("invalid account payload: {err}"))
    })?;
    if dto.id_token.is_empty() {
        return Err(IdentityProviderError::decode("account payload carried no id token"));
    }
    let user_id =
        UserId::new(dto.local_id).map_err(|err| IdentityProviderError::decode(err.to_string()))?;
    let email = match dto.email.filter(|email| !email.trim().is_empty()) {
        Some(email) => {
            EmailAddress::new(email).map_err(|err| IdentityProviderError::decode(err.to_string()))?
        }
        None => fallback_email.clone(),
    };
    Ok(IdentitySession::new(
        user_id,
        email,
        IdToken::new(dto.id_token),
        now,
    ))
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::transport(transport_message(error))
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let Ok(envelope) = serde_json::from_slice::<GoogleErrorEnvelopeDto>(body) else {
        return if status.is_server_error() {
            IdentityProviderError::transport(status_message(status, body))
        } else {
            IdentityProviderError::rejected(status_message(status, body))
        };
    };
    let (code, detail) = envelope.error.code_and_detail();
    match code {
        "EMAIL_EXISTS" => IdentityProviderError::email_in_use(),
        "WEAK_PASSWORD" => IdentityProviderError::weak_password(
            detail.unwrap_or("Password should be at least 6 characters"),
        ),
        "INVALID_LOGIN_CREDENTIALS" | "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_EMAIL"
        | "USER_DISABLED" => IdentityProviderError::invalid_credentials(),
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => IdentityProviderError::requires_recent_login(),
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND" => {
            IdentityProviderError::session_expired()
        }
        other if status.is_server_error() => {
            IdentityProviderError::transport(format!("status {}: {other}", status.as_u16()))
        }
        other => IdentityProviderError::rejected(other.to_owned()),
    }
}
