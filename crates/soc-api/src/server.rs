//! API server implementation.

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::dto::*;
use crate::error::ErrorResponse;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::routes;
use crate::state::AppState;
use soc_core::{
    AnalystMetrics, AnalystMetricsUpdate, AnalystPerformance, AnalyticsOverview, Incident,
    IncidentStatus, LayoutItem, NewIncident, NewTrainingRecord, NewUser, PreferencesUpdate,
    RecentIncident, Report, Role, Severity, Theme, TrainingRecord, TrainingRecordView,
    TrainingStatus, User, UserPreferences, Widget,
};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
    /// Requests running longer than this get a 408.
    pub request_timeout: Duration,
    /// Enable Swagger UI.
    pub enable_swagger: bool,
    /// Serve empty analytics flagged `degraded` instead of 500 on storage errors.
    pub degrade_on_storage_error: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
            enable_swagger: true,
            degrade_on_storage_error: false,
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::health::readiness_check,
        crate::routes::health::liveness_check,
        crate::routes::analytics::get_analytics,
        crate::routes::preferences::get_preferences,
        crate::routes::preferences::save_preferences,
        crate::routes::users::list_users,
        crate::routes::users::create_user,
        crate::routes::incidents::create_incident,
        crate::routes::incidents::get_incident,
        crate::routes::incidents::transition_incident,
        crate::routes::analysts::get_metrics,
        crate::routes::analysts::update_metrics,
        crate::routes::training::create_training_record,
    ),
    components(
        schemas(
            HealthResponse,
            DatabaseHealth,
            AnalyticsResponse,
            Report,
            AnalyticsOverview,
            AnalystPerformance,
            RecentIncident,
            TrainingRecordView,
            PreferencesResponse,
            SavePreferencesRequest,
            SavePreferencesResponse,
            UserPreferences,
            PreferencesUpdate,
            LayoutItem,
            Widget,
            Theme,
            StatusTransitionRequest,
            User,
            NewUser,
            Role,
            Incident,
            NewIncident,
            IncidentStatus,
            Severity,
            AnalystMetrics,
            AnalystMetricsUpdate,
            TrainingRecord,
            NewTrainingRecord,
            TrainingStatus,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Analytics", description = "Incident analytics reports"),
        (name = "Preferences", description = "Dashboard preferences"),
        (name = "Users", description = "User administration"),
        (name = "Incidents", description = "Incident administration"),
        (name = "Analysts", description = "Analyst metric snapshots"),
        (name = "Training", description = "Training records"),
    ),
    info(
        title = "SOC Dashboard API",
        version = "0.1.0",
        description = "Incident analytics and dashboard preferences for a Security Operations Center",
        license(name = "MIT"),
    )
)]
pub struct ApiDoc;

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server.
    ///
    /// The degraded-analytics flag of `config` overrides the one on `state`.
    pub fn new(state: AppState, config: ApiServerConfig) -> Self {
        let state = state.with_degraded_analytics(config.degrade_on_storage_error);
        Self { config, state }
    }

    /// Creates a new API server with default configuration.
    pub fn with_state(state: AppState) -> Self {
        Self::new(state, ApiServerConfig::default())
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        routes::health::init_start_time();

        let mut app = routes::create_router(self.state.clone());

        if self.config.enable_swagger {
            app = app.merge(
                SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
            );
        }

        // Innermost first
        app.layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_logging))
            .layer(middleware::from_fn(request_id))
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer())
            .layer(CatchPanicLayer::new())
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), std::io::Error> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the server with a custom shutdown signal.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = self.config.bind_address;

        info!(
            %addr,
            db_type = self.state.db.db_type(),
            degraded_analytics = self.state.degrade_on_storage_error,
            "Starting API server"
        );

        let listener = TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server shut down gracefully");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soc_core::db::create_pool;

    #[tokio::test]
    async fn test_router_creation() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let server = ApiServer::with_state(AppState::new(pool));
        let _router = server.router();
    }

    #[test]
    fn test_openapi_lists_analytics_and_preferences() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/analytics"));
        assert!(doc.paths.paths.contains_key("/api/preferences"));
        assert!(doc.paths.paths.contains_key("/health"));
    }

    #[test]
    fn test_config_overrides_degraded_flag() {
        let config = ApiServerConfig {
            degrade_on_storage_error: true,
            ..Default::default()
        };
        assert!(config.degrade_on_storage_error);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
