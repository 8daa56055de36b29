use std::io::Write;

use actix_web::http::StatusCode;
use actix_web::{
    get, middleware, post, web, web::Data, App, HttpResponse, HttpServer, Responder, ResponseError,
};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::provider::diagnostics::Diagnostics;
use crate::provider::{Provider, PROVIDER_TYPE_NAME};

/// First field of the line printed on startup.
pub const HANDSHAKE_PREFIX: &str = "K8S_CRDS_PROVIDER";
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ConfigRequest {
    #[serde(default)]
    pub config: Value,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PlanRequest {
    #[serde(default)]
    pub prior_state: Option<Value>,
    pub proposed_state: Value,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateRequest {
    pub planned_state: Value,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ReadRequest {
    pub current_state: Value,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateRequest {
    pub prior_state: Value,
    pub planned_state: Value,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct DeleteRequest {
    pub current_state: Value,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct DiagnosticsResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct StateResponse {
    pub new_state: Value,
    pub diagnostics: Diagnostics,
}

impl StateResponse {
    fn ok(new_state: Value) -> HttpResponse {
        HttpResponse::Ok().json(StateResponse {
            new_state,
            diagnostics: Diagnostics::new(),
        })
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::UnknownResourceType(_) => StatusCode::NOT_FOUND,
            Error::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(DiagnosticsResponse {
            diagnostics: self.diagnostics(),
        })
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(PROVIDER_TYPE_NAME)
}

#[get("/v1/metadata")]
async fn metadata(provider: Data<Provider>) -> impl Responder {
    HttpResponse::Ok().json(provider.metadata())
}

#[get("/v1/schema")]
async fn schema(provider: Data<Provider>) -> impl Responder {
    HttpResponse::Ok().json(provider.schema().to_json())
}

#[post("/v1/configure")]
async fn configure(
    provider: Data<Provider>,
    body: web::Json<ConfigRequest>,
) -> Result<HttpResponse, Error> {
    let diagnostics = provider.configure(&body.config)?;
    Ok(HttpResponse::Ok().json(DiagnosticsResponse { diagnostics }))
}

#[post("/v1/resources/{type_name}/validate")]
async fn validate(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<ConfigRequest>,
) -> Result<HttpResponse, Error> {
    let diagnostics = provider.resource(&type_name)?.validate(&body.config);
    Ok(HttpResponse::Ok().json(DiagnosticsResponse { diagnostics }))
}

#[post("/v1/resources/{type_name}/plan")]
async fn plan(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<PlanRequest>,
) -> Result<HttpResponse, Error> {
    let result = provider
        .resource(&type_name)?
        .plan(body.prior_state.as_ref(), &body.proposed_state)?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/v1/resources/{type_name}/create")]
async fn create(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<CreateRequest>,
) -> Result<HttpResponse, Error> {
    let state = provider.resource(&type_name)?.create(&body.planned_state)?;
    Ok(StateResponse::ok(state))
}

#[post("/v1/resources/{type_name}/read")]
async fn read(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<ReadRequest>,
) -> Result<HttpResponse, Error> {
    let state = provider.resource(&type_name)?.read(&body.current_state)?;
    Ok(StateResponse::ok(state))
}

#[post("/v1/resources/{type_name}/update")]
async fn update(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<UpdateRequest>,
) -> Result<HttpResponse, Error> {
    let state = provider
        .resource(&type_name)?
        .update(&body.prior_state, &body.planned_state)?;
    Ok(StateResponse::ok(state))
}

#[post("/v1/resources/{type_name}/delete")]
async fn delete(
    provider: Data<Provider>,
    type_name: web::Path<String>,
    body: web::Json<DeleteRequest>,
) -> Result<HttpResponse, Error> {
    provider.resource(&type_name)?.delete(&body.current_state)?;
    Ok(HttpResponse::Ok().json(DiagnosticsResponse::default()))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(metadata)
        .service(schema)
        .service(configure)
        .service(validate)
        .service(plan)
        .service(create)
        .service(read)
        .service(update)
        .service(delete);
}

pub fn handshake(address: &std::net::SocketAddr) -> String {
    format!("{HANDSHAKE_PREFIX}|{PROTOCOL_VERSION}|{address}")
}

/// Binds the protocol server, announces its address on stdout and serves
/// until a shutdown signal arrives.
pub async fn serve(provider: Provider, address: &str, port: u16) -> Result<()> {
    let provider = Data::new(provider);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(provider.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((address, port))?
    .shutdown_timeout(5);

    let bound = server.addrs();
    let announced = bound.first().ok_or_else(|| {
        Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("could not bind {address}:{port}"),
        ))
    })?;
    info!("serving provider protocol on {}", announced);

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", handshake(announced))?;
    stdout.flush()?;

    server.run().await?;
    info!("provider server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{
        call_and_read_body_json, call_service, init_service, read_body_json, TestRequest,
    };
    use serde_json::json;

    macro_rules! app {
        () => {
            init_service(
                App::new()
                    .app_data(Data::new(Provider::new().unwrap()))
                    .configure(routes),
            )
            .await
        };
    }

    fn mapping_config() -> Value {
        json!({
            "metadata": {"name": "quote"},
            "spec": {"prefix": "/quote/", "service": "quote:8080"}
        })
    }

    #[actix_web::test]
    async fn index_returns_provider_name() {
        let app = app!();
        let req = TestRequest::get().uri("/").to_request();
        let resp: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(resp, json!("k8s"));
    }

    #[actix_web::test]
    async fn create_returns_new_state() {
        let app = app!();
        let req = TestRequest::post()
            .uri("/v1/resources/k8s_getambassador_io_mapping_v2/create")
            .set_json(json!({ "planned_state": mapping_config() }))
            .to_request();
        let resp: StateResponse = call_and_read_body_json(&app, req).await;
        assert_eq!(resp.new_state["kind"], "Mapping");
        assert!(resp.new_state["yaml"].as_str().unwrap().contains("service: quote:8080"));
        assert!(resp.diagnostics.is_empty());
    }

    #[actix_web::test]
    async fn unknown_resource_is_not_found() {
        let app = app!();
        let req = TestRequest::post()
            .uri("/v1/resources/k8s_nope_v1/create")
            .set_json(json!({ "planned_state": {} }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_configuration_is_bad_request() {
        let app = app!();
        let req = TestRequest::post()
            .uri("/v1/resources/k8s_getambassador_io_mapping_v2/plan")
            .set_json(json!({ "proposed_state": {"metadata": {"name": "quote"}, "spec": {}} }))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: DiagnosticsResponse = read_body_json(resp).await;
        assert_eq!(body.diagnostics.len(), 2);
    }

    #[actix_web::test]
    async fn validate_reports_diagnostics_without_failing() {
        let app = app!();
        let req = TestRequest::post()
            .uri("/v1/resources/k8s_data_fluid_io_thin_runtime_v1alpha1/validate")
            .set_json(json!({ "config": {"metadata": {"name": "nfs", "labels": {"-x": "y"}}} }))
            .to_request();
        let resp: DiagnosticsResponse = call_and_read_body_json(&app, req).await;
        assert!(resp.diagnostics.has_errors());
    }

    #[test]
    fn handshake_line() {
        let addr: std::net::SocketAddr = "127.0.0.1:4567".parse().unwrap();
        assert_eq!(handshake(&addr), "K8S_CRDS_PROVIDER|1|127.0.0.1:4567");
    }
}
