use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::models::Role;
use crate::handlers::{health, protected, public};
use crate::middleware::{authorization_middleware, Guard};
use crate::state::AppState;

/// Assemble the full router.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_get))
        .merge(auth_public_routes())
        .merge(protected_routes(&state))
        .merge(admin_routes(&state))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup_post))
        .route("/auth/signin", post(auth::signin_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

/// Any valid access token
fn protected_routes(state: &AppState) -> Router<AppState> {
    let guard = Guard::authenticated(state.gate.clone());

    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami_get))
        .route("/api/posts", get(protected::posts_get))
        .route_layer(from_fn_with_state(guard, authorization_middleware))
}

/// Access token whose identity holds the admin role
fn admin_routes(state: &AppState) -> Router<AppState> {
    let guard = Guard::with_role(state.gate.clone(), Role::ADMIN);

    Router::new()
        .route("/api/users", get(protected::users_get))
        .route_layer(from_fn_with_state(guard, authorization_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(allowed)
}
