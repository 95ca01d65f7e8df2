use std::sync::Arc;

use poem::{
    EndpointExt, Route,
    endpoint::StaticFilesEndpoint,
    middleware::{AddData, AddDataEndpoint, Cors, CorsEndpoint},
};
use poem_openapi::OpenApiService;

use crate::core::renderer::RenderingEngine;
use crate::settings::Config;

use crate::routes::convert::ApiConvert;

pub mod core;
pub mod routes;
pub mod schemas;
pub mod settings;

pub struct AppState {
    pub engine: Arc<RenderingEngine>,
}

pub fn init_openapi_route(
    app_state: Arc<AppState>,
    config: &Config,
) -> CorsEndpoint<AddDataEndpoint<Route, Arc<AppState>>> {
    let prefix = config.prefix.clone().unwrap_or("/".to_string());
    let openapi_route = OpenApiService::new(ApiConvert, "Page Converter API", "1.0")
        .description("Convert HTML text or web pages to PDF/PNG, and structured data to HTML.")
        .server(prefix.clone());

    let openapi_json_endpoint = openapi_route.spec_endpoint();
    let ui = openapi_route.swagger_ui();
    Route::new()
        .nest(
            format!("/{}", crate::core::result::STATIC_PREFIX),
            StaticFilesEndpoint::new(&config.output_dir),
        )
        .nest("/docs", ui)
        .at("openapi.json", openapi_json_endpoint)
        .nest(prefix, openapi_route)
        .with(AddData::new(app_state))
        .with(Cors::new())
}
