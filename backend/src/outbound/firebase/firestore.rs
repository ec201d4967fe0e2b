//! Firestore REST adapter for profile documents under `users/{uid}`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use tracing::debug;

use super::dto::{DocumentDto, FIELD_PLAN, GoogleErrorEnvelopeDto};
use super::{FirebaseSettings, transport_message};
use crate::domain::ports::{
    ProfileListener, ProfileSnapshot, ProfileStore, ProfileStoreError, SubscriptionHandle,
};
use crate::domain::{IdentitySession, SubscriptionTier, UserId, UserProfile};
use crate::outbound::http_support::{client_with_timeout, status_message};
use crate::outbound::profile_feed::ProfileFeed;

const COLLECTION: &str = "users";

/// Low-level document calls; cheap to clone into subscription tasks.
#[derive(Clone)]
struct Documents {
    client: Client,
    root: Url,
}

impl Documents {
    fn collection_url(&self) -> Result<Url, ProfileStoreError> {
        let mut url = self.root.clone();
        url.path_segments_mut()
            .map_err(|()| ProfileStoreError::query("documents root cannot hold a path"))?
            .push(COLLECTION);
        Ok(url)
    }

    fn document_url(&self, uid: &UserId) -> Result<Url, ProfileStoreError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|()| ProfileStoreError::query("documents root cannot hold a path"))?
            .push(uid.as_str());
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, session: &IdentitySession) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(session.id_token().expose())
    }

    async fn send(request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), ProfileStoreError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, body.to_vec()))
    }

    async fn get(&self, session: &IdentitySession) -> Result<Option<UserProfile>, ProfileStoreError> {
        let url = self.document_url(session.user_id())?;
        let (status, body) = Self::send(self.request(Method::GET, url, session)).await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            _ if status.is_success() => decode_profile(&body).map(Some),
            _ => Err(map_status_error(status, &body)),
        }
    }
}

/// Profile documents stored in Cloud Firestore.
///
/// Live subscriptions are fed by writes made through this adapter; changes
/// made by other processes are picked up on the next resync.
pub struct FirestoreProfileStore {
    documents: Documents,
    feed: Arc<ProfileFeed>,
}

impl FirestoreProfileStore {
    /// # Errors
    ///
    /// Returns [`ProfileStoreError::Connection`] when the client cannot be
    /// built and [`ProfileStoreError::Query`] for an unusable API base.
    pub fn new(settings: &FirebaseSettings, feed: Arc<ProfileFeed>) -> Result<Self, ProfileStoreError> {
        let client = client_with_timeout(settings.timeout)
            .map_err(|err| ProfileStoreError::connection(err.to_string()))?;
        Ok(Self {
            documents: Documents {
                client,
                root: documents_root(&settings.firestore_api_base, &settings.project_id)?,
            },
            feed,
        })
    }
}

#[async_trait]
impl ProfileStore for FirestoreProfileStore {
    async fn fetch(
        &self,
        session: &IdentitySession,
    ) -> Result<Option<UserProfile>, ProfileStoreError> {
        self.documents.get(session).await
    }

    async fn create(
        &self,
        session: &IdentitySession,
        profile: &UserProfile,
    ) -> Result<(), ProfileStoreError> {
        let mut url = self.documents.collection_url()?;
        url.query_pairs_mut()
            .append_pair("documentId", profile.uid().as_str());
        let request = self
            .documents
            .request(Method::POST, url, session)
            .json(&DocumentDto::from_profile(profile));
        let (status, body) = Documents::send(request).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        self.feed
            .publish(profile.uid(), ProfileSnapshot::Present(profile.clone()));
        Ok(())
    }

    async fn update_tier(
        &self,
        session: &IdentitySession,
        tier: SubscriptionTier,
    ) -> Result<(), ProfileStoreError> {
        let mut url = self.documents.document_url(session.user_id())?;
        url.query_pairs_mut()
            .append_pair("updateMask.fieldPaths", FIELD_PLAN)
            .append_pair("currentDocument.exists", "true");
        let request = self
            .documents
            .request(Method::PATCH, url, session)
            .json(&DocumentDto::tier_only(tier));
        let (status, body) = Documents::send(request).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        match decode_profile(&body) {
            Ok(profile) => self
                .feed
                .publish(session.user_id(), ProfileSnapshot::Present(profile)),
            Err(err) => debug!(error = %err, "tier write acknowledged without a full document"),
        }
        Ok(())
    }

    async fn delete(&self, session: &IdentitySession) -> Result<(), ProfileStoreError> {
        let url = self.documents.document_url(session.user_id())?;
        let (status, body) =
            Documents::send(self.documents.request(Method::DELETE, url, session)).await?;
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(map_status_error(status, &body));
        }
        self.feed
            .publish(session.user_id(), ProfileSnapshot::Missing);
        Ok(())
    }

    fn subscribe(
        &self,
        session: &IdentitySession,
        listener: ProfileListener,
    ) -> Result<SubscriptionHandle, ProfileStoreError> {
        let documents = self.documents.clone();
        let owner = session.clone();
        self.feed.subscribe(
            session.user_id().clone(),
            move || {
                let documents = documents.clone();
                let owner = owner.clone();
                async move { documents.get(&owner).await }
            },
            listener,
        )
    }
}

fn documents_root(api_base: &Url, project_id: &str) -> Result<Url, ProfileStoreError> {
    let project_id = project_id.trim();
    if project_id.is_empty() || project_id.contains('/') {
        return Err(ProfileStoreError::query(format!(
            "invalid project id {project_id:?}"
        )));
    }
    let base = api_base.as_str().trim_end_matches('/');
    Url::parse(&format!(
        "{base}/projects/{project_id}/databases/(default)/documents"
    ))
    .map_err(|err| ProfileStoreError::query(format!("invalid documents root: {err}")))
}

fn decode_profile(body: &[u8]) -> Result<UserProfile, ProfileStoreError> {
    let document: DocumentDto = serde_json::from_slice(body)
        .map_err(|err| ProfileStoreError::query(format!("invalid document payload: {err}")))?;
    document.into_profile().map_err(ProfileStoreError::query)
}

fn map_transport_error(error: reqwest::Error) -> ProfileStoreError {
    ProfileStoreError::connection(transport_message(error))
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ProfileStoreError {
    let envelope = serde_json::from_slice::<GoogleErrorEnvelopeDto>(body).ok();
    let grpc_status = envelope
        .as_ref()
        .and_then(|envelope| envelope.error.status.as_deref());
    let message = envelope
        .as_ref()
        .map(|envelope| envelope.error.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status_message(status, body));

    match (status, grpc_status) {
        (StatusCode::NOT_FOUND, _) | (_, Some("NOT_FOUND")) => ProfileStoreError::not_found(),
        (StatusCode::CONFLICT, _) | (_, Some("ALREADY_EXISTS")) => {
            ProfileStoreError::already_exists()
        }
        (StatusCode::UNAUTHORIZED, _) | (_, Some("UNAUTHENTICATED")) => {
            ProfileStoreError::session_expired(message)
        }
        (StatusCode::FORBIDDEN, _) => ProfileStoreError::permission_denied(message),
        _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            ProfileStoreError::connection(message)
        }
        _ => ProfileStoreError::query(message),
    }
}
