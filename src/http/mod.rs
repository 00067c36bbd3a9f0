use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::AuthUser;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth())
        .merge(routes::users())
        .merge(routes::photos())
        .merge(routes::likes())
        .merge(routes::saves())
        .merge(routes::follows())
        .merge(routes::comments())
        .merge(routes::uploads());

    Router::new()
        .merge(routes::health())
        .nest("/api", api)
        .with_state(state)
}
