use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct BadRequestResponse {
    pub message: String,
}

impl BadRequestResponse {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!("rejected request: {}", message);
        Self { message }
    }
}

#[derive(Object, Debug)]
pub struct InternalServerErrorResponse {
    pub detail: String,
}

impl InternalServerErrorResponse {
    pub fn new(filepath: &str, function: &str, identifier: &str, err: &str) -> Self {
        let msg = format!(
            "error: on {}::{} iden: {} error: {}",
            filepath, function, identifier, err
        );
        tracing::error!("{}", msg);
        Self {
            detail: msg.to_string(),
        }
    }
}

#[derive(Object, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub output_root: String,
}
