//! # Server Configuration
//!
//! Router assembly, shared state and the HTTP server loop.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{self, auth, concerns, events, farmers, profile, qr};
use crate::mail::{Mailer, create_mailer_from_config};
use crate::sms::{SmsGateway, create_gateway_from_config};
use crate::telemetry::{REQUEST_ID_HEADER, TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
    pub sms: Arc<dyn SmsGateway>,
}

impl AppState {
    /// Build state with the mail and SMS transports selected by configuration.
    pub fn from_config(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let mailer = create_mailer_from_config(&config.mail)?;
        let sms = create_gateway_from_config(&config.sms)?;
        Ok(Self {
            config: Arc::new(config),
            db,
            mailer,
            sms,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/api/v1/auth/admin/login", post(auth::admin_login))
        .route("/api/v1/auth/farmer/login", post(auth::farmer_login))
        .route(
            "/api/v1/auth/organic-farmer/login",
            post(auth::organic_farmer_login),
        )
        .route("/api/v1/registrations", post(farmers::register));

    let protected = Router::new()
        .route("/api/v1/me", get(profile::me))
        .route("/api/v1/me/concerns", get(concerns::my_concerns))
        .route("/api/v1/farmers", get(farmers::list_farmers))
        .route(
            "/api/v1/farmers/{id}",
            get(farmers::get_farmer).patch(farmers::update_farmer),
        )
        .route("/api/v1/farmers/{id}/status", post(farmers::change_status))
        .route("/api/v1/farmers/{id}/farms", post(farmers::add_farm))
        .route(
            "/api/v1/farmers/{id}/farms/{farm_id}",
            delete(farmers::delete_farm),
        )
        .route(
            "/api/v1/farmers/{id}/household",
            put(farmers::upsert_household),
        )
        .route("/api/v1/qr/lookup", get(qr::lookup))
        .route(
            "/api/v1/concerns",
            get(concerns::list_concerns).post(concerns::open_concern),
        )
        .route("/api/v1/concerns/{id}", get(concerns::get_concern))
        .route(
            "/api/v1/concerns/{id}/messages",
            post(concerns::post_message),
        )
        .route(
            "/api/v1/concerns/{id}/resolve",
            post(concerns::resolve_concern),
        )
        .route("/api/v1/concerns/{id}/reopen", post(concerns::reopen_concern))
        .route(
            "/api/v1/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/v1/events/calendar", get(events::calendar))
        .route(
            "/api/v1/events/{id}",
            patch(events::update_event).delete(events::delete_event),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    let cors = cors_layer(&state.config.cors_allowed_origins);

    public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured browser origins; unparsable entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            REQUEST_ID_HEADER,
        ])
        .expose_headers([header::LOCATION, TRACE_ID_HEADER])
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {e}"))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::from_config(config, db)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Farmer registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token from one of the `/api/v1/auth/*/login` endpoints",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::auth::admin_login,
        crate::handlers::auth::farmer_login,
        crate::handlers::auth::organic_farmer_login,
        crate::handlers::farmers::register,
        crate::handlers::farmers::list_farmers,
        crate::handlers::farmers::get_farmer,
        crate::handlers::farmers::update_farmer,
        crate::handlers::farmers::change_status,
        crate::handlers::farmers::add_farm,
        crate::handlers::farmers::delete_farm,
        crate::handlers::farmers::upsert_household,
        crate::handlers::profile::me,
        crate::handlers::qr::lookup,
        crate::handlers::concerns::open_concern,
        crate::handlers::concerns::my_concerns,
        crate::handlers::concerns::list_concerns,
        crate::handlers::concerns::get_concern,
        crate::handlers::concerns::post_message,
        crate::handlers::concerns::resolve_concern,
        crate::handlers::concerns::reopen_concern,
        crate::handlers::events::list_events,
        crate::handlers::events::calendar,
        crate::handlers::events::create_event,
        crate::handlers::events::update_event,
        crate::handlers::events::delete_event,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::ApplicantStatus,
            crate::models::FarmerKind,
            crate::auth::Role,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::types::FarmerDto,
            crate::handlers::types::FarmDto,
            crate::handlers::types::HouseholdDto,
            crate::handlers::types::FarmerProfileDto,
            crate::handlers::types::ConcernDto,
            crate::handlers::types::ConcernMessageDto,
            crate::handlers::types::ConcernThreadDto,
            crate::handlers::types::EventDto,
            crate::handlers::auth::AdminLoginRequest,
            crate::handlers::auth::FarmerLoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::farmers::FarmInput,
            crate::handlers::farmers::RegistrationRequest,
            crate::handlers::farmers::UpdateFarmerRequest,
            crate::handlers::farmers::StatusChangeRequest,
            crate::handlers::farmers::StatusChangeResponse,
            crate::handlers::farmers::NotificationReport,
            crate::status_workflow::NotificationOutcome,
            crate::handlers::concerns::OpenConcernRequest,
            crate::handlers::concerns::PostMessageRequest,
            crate::handlers::concerns::PostMessageResponse,
            crate::handlers::events::CreateEventRequest,
            crate::handlers::events::UpdateEventRequest,
            crate::handlers::events::CalendarDay,
            crate::handlers::events::CalendarResponse,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Farmer Registry API",
        description = "Registration, review and support for regular and organic farmers",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
