// config-server/src/main.rs
use actix_web::{
    get,
    middleware::Logger,
    post,
    web::{Data, Json},
    App, HttpResponse, HttpServer, Responder,
};
use anyhow::Result;
use lnd_config::{MigrationError, MigrationInfo, Settings, Version, CATALOGUE, CHAIN};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;

// ---------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------
#[derive(Deserialize)]
struct ValidateReq {
    config: Value,
}

#[derive(Deserialize)]
struct MigrateReq {
    from: String,
    #[serde(default)]
    to: Option<String>,
    config: Value,
}

#[derive(Serialize)]
struct MigrationsResp {
    stored: String,
    current: Version,
    migrations: Vec<MigrationInfo>,
}

/// What the server knows about the stored record.
#[derive(Clone)]
struct RecordInfo {
    stored_version: String,
}

fn unprocessable(error: impl ToString) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({ "error": error.to_string() }))
}

// ---------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------
#[get("/spec")]
async fn get_spec() -> impl Responder {
    HttpResponse::Ok().json(&*CATALOGUE)
}

#[get("/defaults")]
async fn get_defaults() -> impl Responder {
    let record = CATALOGUE.default_record(&mut rand::thread_rng());
    HttpResponse::Ok().json(record)
}

#[post("/validate")]
async fn validate(payload: Json<ValidateReq>) -> impl Responder {
    let report = lnd_config::validate(&payload.config);
    HttpResponse::Ok().json(json!({ "valid": report.is_valid(), "report": report }))
}

// ---------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------
#[get("/migrations")]
async fn list_migrations(info: Data<RecordInfo>) -> impl Responder {
    HttpResponse::Ok().json(MigrationsResp {
        stored: info.stored_version.clone(),
        current: CHAIN.current().clone(),
        migrations: CHAIN.entries().map(|m| m.info()).collect(),
    })
}

#[post("/migrate")]
async fn migrate(payload: Json<MigrateReq>) -> impl Responder {
    let MigrateReq { from, to, config } = payload.into_inner();
    let from: Version = match from.parse() {
        Ok(v) => v,
        Err(e) => return unprocessable(e),
    };
    let to: Version = match to.map(|s| s.parse()) {
        Some(Ok(v)) => v,
        Some(Err(e)) => return unprocessable(e),
        None => CHAIN.current().clone(),
    };

    match CHAIN.migrate(&from, &to, config) {
        Ok(migrated) => HttpResponse::Ok().json(migrated),
        Err(e @ MigrationError::CannotDowngrade { .. }) => {
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
        Err(e) => unprocessable(e),
    }
}

// ---------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------
#[actix_web::main]
async fn main() -> Result<()> {
    lnd_config::init_logging("info,actix_web=info");
    let settings = Settings::load(None)?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(settings.server.port);
    let addr: SocketAddr = (settings.server.host.parse::<std::net::IpAddr>()?, port).into();

    let info = RecordInfo {
        stored_version: settings.record.version.clone(),
    };

    tracing::info!(%addr, current = %CHAIN.current(), "config server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(info.clone()))
            .wrap(Logger::default())
            .service(get_spec)
            .service(get_defaults)
            .service(validate)
            .service(list_migrations)
            .service(migrate)
    })
    .bind(addr)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("server error: {}", e))
}
