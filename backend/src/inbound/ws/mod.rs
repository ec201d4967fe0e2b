//! WebSocket inbound adapter streaming the signed-in user's profile.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, signed-in session)
//! - run one [`SubscriptionSynchronizer`](crate::domain::SubscriptionSynchronizer)
//!   per connection and forward its state changes as JSON frames

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use state::OriginAllowList;

/// Upgrade `GET /ws/profile` to the live profile stream.
#[get("/ws/profile")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        warn!("missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        warn!("multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin_header)?;

    let identity = session.require_identity()?;
    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorBadRequest("WebSocket upgrade failed")
    })?;
    actix_web::rt::spawn(session::handle_ws_session(
        state.get_ref().clone(),
        identity,
        ws_session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(allowed: &OriginAllowList, header: &HeaderValue) -> actix_web::Result<()> {
    let value = header.to_str().map_err(|error| {
        warn!(error = %error, "Origin header is not visible ASCII");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(value).map_err(|error| {
        warn!(error = %error, "Origin header is not a URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(origin = value, "rejected WebSocket upgrade from disallowed origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockIdentityProvider, MockProfileStore};
    use crate::inbound::http::test_utils::{
        FIXTURE_LOGIN_PATH, fixture_login_route, session_cookie, test_session_middleware,
    };
    use crate::inbound::ws::state::WsState;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use std::sync::Arc;

    fn allow_list() -> OriginAllowList {
        OriginAllowList::parse(["http://localhost:3000"]).expect("allow-list")
    }

    #[rstest]
    #[case(HeaderValue::from_static("http://localhost:3000"), None)]
    #[case(HeaderValue::from_static("https://evil.example"), Some(StatusCode::FORBIDDEN))]
    #[case(HeaderValue::from_static("not a url"), Some(StatusCode::BAD_REQUEST))]
    #[case(HeaderValue::from_bytes(&[0x80]).expect("opaque header"), Some(StatusCode::BAD_REQUEST))]
    fn checks_the_origin_header(#[case] header: HeaderValue, #[case] rejection: Option<StatusCode>) {
        let outcome = validate_origin(&allow_list(), &header)
            .err()
            .map(|error| error.as_response_error().status_code());
        assert_eq!(outcome, rejection);
    }

    async fn upgrade_status(origin: Option<&'static str>, signed_in: bool) -> StatusCode {
        let state = WsState::new(
            Arc::new(MockProfileStore::new()),
            Arc::new(MockIdentityProvider::new()),
            allow_list(),
        );
        let app = actix_test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(state))
                .configure(fixture_login_route)
                .service(ws_entry),
        )
        .await;
        let mut req = actix_test::TestRequest::get()
            .uri("/ws/profile")
            .insert_header(("upgrade", "websocket"))
            .insert_header(("connection", "upgrade"))
            .insert_header(("sec-websocket-version", "13"))
            .insert_header(("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="));
        if let Some(origin) = origin {
            req = req.insert_header((ORIGIN, origin));
        }
        if signed_in {
            let login = actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri(&format!("{FIXTURE_LOGIN_PATH}/uid-1"))
                    .to_request(),
            )
            .await;
            req = req.cookie(session_cookie(&login));
        }
        actix_test::call_service(&app, req.to_request()).await.status()
    }

    #[rstest]
    #[case(None, true, StatusCode::FORBIDDEN)]
    #[case(Some("https://evil.example"), true, StatusCode::FORBIDDEN)]
    #[case(Some("http://localhost:3000"), false, StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn refuses_upgrades_before_the_handshake(
        #[case] origin: Option<&'static str>,
        #[case] signed_in: bool,
        #[case] status: StatusCode,
    ) {
        assert_eq!(upgrade_status(origin, signed_in).await, status);
    }
}
