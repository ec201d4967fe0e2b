//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use healthsyntra::Trace;
#[cfg(debug_assertions)]
use healthsyntra::doc::ApiDoc;
use healthsyntra::inbound::http::checkout::create_checkout_session;
use healthsyntra::inbound::http::health::{HealthState, live, ready};
use healthsyntra::inbound::http::session_config::SessionSettings;
use healthsyntra::inbound::http::state::HttpState;
use healthsyntra::inbound::http::{configure_api, json_config};
use healthsyntra::inbound::ws;
use healthsyntra::inbound::ws::state::WsState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use state_builders::build_states;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    session: Arc<SessionSettings>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        session,
    } = deps;

    let api = web::scope("/api/v1").configure(configure_api);

    // Sessions wrap the whole app: the profile stream and the legacy checkout
    // path both read the signed-in identity.
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(json_config())
        .wrap(session.middleware())
        .wrap(Trace)
        .service(api)
        .service(create_checkout_session)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when an adapter cannot be built from the
/// settings, or when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        settings,
        session,
        bind_addr,
    } = config;
    let states = build_states(&settings)?;
    let http_state = web::Data::new(states.http);
    let ws_state = web::Data::new(states.ws);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            session: session.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
