use poem_openapi::{ApiResponse, Object, payload::Json};
use serde_json::{Map, Value as JsonValue};

use super::common::{BadRequestResponse, InternalServerErrorResponse};

const MAX_DIMENSION: u32 = 16384;

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

#[derive(Object, Clone, Debug)]
pub struct HtmlRequest {
    /// HTML document text
    pub text: String,

    /// Viewport width in pixels, used for PNG output
    #[oai(default = "default_width")]
    pub width: u32,

    /// Viewport height in pixels, used for PNG output
    #[oai(default = "default_height")]
    pub height: u32,

    /// File name to save under; defaults to a timestamp
    pub filename: Option<String>,
}

#[derive(Object, Clone, Debug)]
pub struct UrlRequest {
    /// Page to load
    pub url: String,

    /// Viewport width in pixels, used for PNG output
    #[oai(default = "default_width")]
    pub width: u32,

    /// Viewport height in pixels, used for PNG output
    #[oai(default = "default_height")]
    pub height: u32,

    /// Script run in the page after it loads (url2png only)
    #[oai(default)]
    pub javascript: String,

    /// File name to save under; defaults to a timestamp
    pub filename: Option<String>,
}

#[derive(Object, Clone, Debug)]
pub struct JsonRequest {
    /// Content to display; must be a JSON object
    pub data: JsonValue,

    /// File name prefix
    pub filename: String,
}

#[derive(Object, Clone, Debug, PartialEq)]
pub struct ConversionResult {
    /// Download link of the generated file
    pub url: String,

    /// Generated file name, without extension
    pub filename: String,
}

#[derive(ApiResponse)]
pub enum ConvertResponse {
    #[oai(status = 200, content_type = "application/json")]
    Ok(Json<ConversionResult>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

/// An empty name counts as absent; anything that could leave the
/// category directory is refused.
fn check_filename(filename: &str) -> Result<(), String> {
    if filename == "." || filename == ".." || filename.contains(['/', '\\']) {
        return Err(format!("filename {:?} must not be a path", filename));
    }
    Ok(())
}

fn check_viewport(width: u32, height: u32) -> Result<(), String> {
    if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
        return Err(format!(
            "viewport {}x{} out of range (1..={})",
            width, height, MAX_DIMENSION
        ));
    }
    Ok(())
}

impl HtmlRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_viewport(self.width, self.height)?;
        match &self.filename {
            Some(name) => check_filename(name),
            None => Ok(()),
        }
    }
}

impl UrlRequest {
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.url).map_err(|e| format!("invalid url {:?}: {}", self.url, e))?;
        check_viewport(self.width, self.height)?;
        match &self.filename {
            Some(name) => check_filename(name),
            None => Ok(()),
        }
    }

    /// Script to evaluate, if the caller sent one.
    pub fn script(&self) -> Option<String> {
        if self.javascript.trim().is_empty() {
            None
        } else {
            Some(self.javascript.clone())
        }
    }
}

impl JsonRequest {
    /// Checks the request and returns the data as an ordered object.
    pub fn validate(&self) -> Result<&Map<String, JsonValue>, String> {
        check_filename(&self.filename)?;
        self.data
            .as_object()
            .ok_or_else(|| "data must be a JSON object".to_string())
    }
}
