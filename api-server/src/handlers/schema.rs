//! Questionnaire schema handler

use axum::Json;

use mindbloom_core::logic::features::{minimal_input_schema, InputSchema};

/// Question catalogue for front-end validation
pub async fn get() -> Json<InputSchema> {
    Json(minimal_input_schema())
}
