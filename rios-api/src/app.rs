/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use rios_api::{app::{build_router, AppState}, config::Config};
/// use rios_shared::db::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{cors::cors_layer, security::SecurityHeadersLayer},
};
use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::CookieJar;
use rios_shared::{
    auth::middleware::authenticate,
    db::Store,
    service::{
        company::CompanyService, custom_filter::CustomFilterService, task::TaskService,
        user::UserService, AuthService, EntityService,
    },
    models::area::Area,
};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, Level};

/// Shared application state
///
/// Cloned per request; both fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn companies(&self) -> CompanyService {
        EntityService::new(self.store.clone())
    }

    pub fn areas(&self) -> EntityService<Area> {
        EntityService::new(self.store.clone())
    }

    pub fn tasks(&self) -> TaskService {
        EntityService::new(self.store.clone())
    }

    pub fn users(&self) -> UserService {
        EntityService::new(self.store.clone())
    }

    pub fn custom_filters(&self) -> CustomFilterService {
        EntityService::new(self.store.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.store.clone(), self.config.session_settings())
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth
/// │   ├── POST /login
/// │   ├── POST /logout
/// │   └── GET  /me                          (session)
/// ├── /tasks                                (session)
/// │   ├── GET  /my-tasks
/// │   └── PUT  /:id/status
/// └── /admin
///     ├── /companies     GET, POST          (session)
///     │   ├── GET /check-nit                (public)
///     │   └── PUT, DELETE /:id              (session)
///     ├── /areas         GET, POST; PUT, DELETE /:id      (session)
///     ├── /tasks         GET, POST; PUT, DELETE /:id      (session)
///     ├── /users         GET, POST; DELETE /:id           (session)
///     └── /custom-filters
///         ├── GET, POST                     (public)
///         └── DELETE /:id                   (session)
/// ```
///
/// Role checks happen in the handlers; the session layer only establishes
/// who is calling.
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then session
/// authentication on protected routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route(
            "/admin/companies/check-nit",
            get(routes::companies::check_nit),
        )
        .route(
            "/admin/custom-filters",
            get(routes::custom_filters::list_filters).post(routes::custom_filters::create_filter),
        );

    let protected = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/tasks/my-tasks", get(routes::tasks::my_tasks))
        .route("/tasks/:id/status", put(routes::tasks::update_status))
        .route(
            "/admin/companies",
            get(routes::companies::list_companies).post(routes::companies::create_company),
        )
        .route(
            "/admin/companies/:id",
            put(routes::companies::update_company).delete(routes::companies::delete_company),
        )
        .route(
            "/admin/areas",
            get(routes::areas::list_areas).post(routes::areas::create_area),
        )
        .route(
            "/admin/areas/:id",
            put(routes::areas::update_area).delete(routes::areas::delete_area),
        )
        .route(
            "/admin/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/admin/tasks/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route(
            "/admin/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/admin/users/:id",
            axum::routing::delete(routes::users::delete_user),
        )
        .route(
            "/admin/custom-filters/:id",
            axum::routing::delete(routes::custom_filters::delete_filter),
        )
        .route_layer(from_fn_with_state(state.clone(), session_auth_layer));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.cors))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Verifies the session cookie and inserts the caller's `AuthContext` into
/// request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = authenticate(&jar, &state.config.session.secret)?;
    debug!(user_id = %ctx.user_id, role = %ctx.role, "Session verified");

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
