use crate::AppState;
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub theme: String,
    pub base_theme: String,
    pub authoring_enabled: bool,
}

#[utoipa::path(
    get,
    path = "/clientConfig",
    responses(
        (status = 200, description = "Settings the authoring UI needs at startup", body = ClientConfig)
    ),
    tag = "system"
)]
pub async fn get_client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(ClientConfig {
        theme: state.config.effective_theme().to_string(),
        base_theme: state.config.base_theme_name.clone(),
        authoring_enabled: state.config.authoring_enabled,
    })
}
