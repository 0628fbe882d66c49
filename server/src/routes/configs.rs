use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::configs::{
    create_config, delete_config, get_config, get_config_value, list_configs, update_config,
    update_config_value,
};

pub fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_config).get(list_configs))
        .route("/:key", get(get_config).put(update_config).delete(delete_config))
        .route("/:key/value", get(get_config_value).put(update_config_value))
}
