use axum::{extract::State, http::Method, response::IntoResponse, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod flights;
pub mod mailer;
pub mod middleware;
pub mod payments;
pub mod state;

pub use state::AppState;

const RATE_LIMIT_REQUESTS: i64 = 100;
const RATE_LIMIT_WINDOW_SECONDS: i64 = 60;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .merge(auth::routes())
        .merge(flights::public_routes())
        .merge(payments::public_routes());

    let authenticated = Router::new()
        .merge(flights::routes())
        .merge(bookings::routes())
        .merge(payments::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::customer_auth_middleware,
        ));

    let admin = admin::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::admin_auth_middleware,
    ));

    Router::new()
        .nest("/api", public.merge(authenticated).nest("/admin", admin))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Fixed-window per-IP rate limit backed by Redis. Fails open: if Redis
/// is unreachable (or no peer address is known) the request goes through.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let peer = req
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let Some(addr) = peer else {
        return Ok(next.run(req).await);
    };

    let key = format!("ratelimit:{}", addr.ip());
    match state
        .redis
        .check_rate_limit(&key, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS)
        .await
    {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        )),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
