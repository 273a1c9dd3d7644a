pub mod health;
pub mod intent;
pub mod recommend;

use axum::Router;

use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(recommend::routes())
        .merge(intent::routes())
}
