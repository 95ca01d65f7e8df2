use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::{
    AppState,
    core::{
        exporter::ArtifactKind,
        loader::Content,
        renderer::RenderJob,
    },
    schemas::{
        common::{BadRequestResponse, HealthResponse, InternalServerErrorResponse},
        convert::{ConvertResponse, HtmlRequest, JsonRequest, UrlRequest},
    },
};

#[derive(Tags)]
enum ApiConvertTags {
    /// Conversions from HTML text or structured data
    Html,
    /// Conversions from remote pages
    Url,
}

pub struct ApiConvert;

async fn run(state: &AppState, function: &str, job: RenderJob) -> ConvertResponse {
    match state.engine.render(job).await {
        Ok(result) => ConvertResponse::Ok(Json(result)),
        Err(e) => ConvertResponse::InternalServerError(Json(InternalServerErrorResponse::new(
            "route.convert",
            function,
            "Conversion failed",
            &format!("{:#}", e),
        ))),
    }
}

fn bad_request(message: String) -> ConvertResponse {
    ConvertResponse::BadRequest(Json(BadRequestResponse::new(message)))
}

#[OpenApi()]
impl ApiConvert {
    /// HTML to PDF
    ///
    /// Render HTML text in a headless browser and print it to a PDF document.
    #[oai(path = "/html2pdf", method = "post", tag = "ApiConvertTags::Html")]
    async fn html2pdf(
        &self,
        Json(json): Json<HtmlRequest>,
        state: Data<&Arc<AppState>>,
    ) -> ConvertResponse {
        tracing::info!("Converting HTML to PDF ({} bytes)", json.text.len());
        if let Err(message) = json.validate() {
            return bad_request(message);
        }

        let job = RenderJob {
            content: Content::Html(json.text),
            kind: ArtifactKind::Pdf,
            viewport: None,
            filename: json.filename,
        };
        run(&state, "html2pdf", job).await
    }

    /// HTML to PNG
    ///
    /// Render HTML text at the requested viewport size and capture the full page.
    #[oai(path = "/html2png", method = "post", tag = "ApiConvertTags::Html")]
    async fn html2png(
        &self,
        Json(json): Json<HtmlRequest>,
        state: Data<&Arc<AppState>>,
    ) -> ConvertResponse {
        tracing::info!(
            "Converting HTML to PNG, size={}x{}",
            json.width,
            json.height
        );
        if let Err(message) = json.validate() {
            return bad_request(message);
        }

        let job = RenderJob {
            content: Content::Html(json.text),
            kind: ArtifactKind::Png,
            viewport: Some((json.width, json.height)),
            filename: json.filename,
        };
        run(&state, "html2png", job).await
    }

    /// URL to PDF
    ///
    /// Load a page and print it to a PDF document.
    #[oai(path = "/url2pdf", method = "post", tag = "ApiConvertTags::Url")]
    async fn url2pdf(
        &self,
        Json(json): Json<UrlRequest>,
        state: Data<&Arc<AppState>>,
    ) -> ConvertResponse {
        tracing::info!("Converting {} to pdf...", json.url);
        if let Err(message) = json.validate() {
            return bad_request(message);
        }

        let job = RenderJob {
            content: Content::Url {
                url: json.url,
                script: None,
            },
            kind: ArtifactKind::Pdf,
            viewport: None,
            filename: json.filename,
        };
        run(&state, "url2pdf", job).await
    }

    /// URL to PNG
    ///
    /// Load a page at the requested viewport size, optionally run a script in it,
    /// then capture the full page.
    ///
    /// # Example Request
    /// ```json
    /// {
    ///   "url": "https://example.com",
    ///   "width": 1280,
    ///   "height": 720,
    ///   "javascript": "document.querySelector('header').remove()",
    ///   "filename": "example"
    /// }
    /// ```
    #[oai(path = "/url2png", method = "post", tag = "ApiConvertTags::Url")]
    async fn url2png(
        &self,
        Json(json): Json<UrlRequest>,
        state: Data<&Arc<AppState>>,
    ) -> ConvertResponse {
        tracing::info!("Converting {} to png...", json.url);
        if let Err(message) = json.validate() {
            return bad_request(message);
        }

        let script = json.script();
        let job = RenderJob {
            content: Content::Url {
                url: json.url,
                script,
            },
            kind: ArtifactKind::Png,
            viewport: Some((json.width, json.height)),
            filename: json.filename,
        };
        run(&state, "url2png", job).await
    }

    /// JSON to HTML
    ///
    /// Write a page showing the data as TOML and JSON.
    #[oai(path = "/json2html", method = "post", tag = "ApiConvertTags::Html")]
    async fn json2html(
        &self,
        Json(json): Json<JsonRequest>,
        state: Data<&Arc<AppState>>,
    ) -> ConvertResponse {
        tracing::info!("Converting {} to html...", json.data);
        let data = match json.validate() {
            Ok(data) => data,
            Err(message) => return bad_request(message),
        };

        match state.engine.render_report(data, &json.filename).await {
            Ok(result) => ConvertResponse::Ok(Json(result)),
            Err(e) => ConvertResponse::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.convert",
                    "json2html",
                    "Report failed",
                    &format!("{:#}", e),
                ),
            )),
        }
    }

    #[oai(path = "/health", method = "get")]
    async fn health(&self, state: Data<&Arc<AppState>>) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "healthy".to_string(),
            output_root: state.engine.output_root().display().to_string(),
        })
    }
}
