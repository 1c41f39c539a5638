use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpRequest, HttpResponse, HttpServer};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use tracing::info;
use tracing_subscriber::prelude::*;

use ytca_gateway::clients::ServiceClients;
use ytca_gateway::config::Config;
use ytca_gateway::inference::CallerIdentity;
use ytca_gateway::schema::{self, AppSchema};

async fn graphql_handler(
    schema: web::Data<AppSchema>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    // Captured here so the pipeline can forward the caller's credential when
    // no shared inference key is configured.
    let caller = CallerIdentity {
        authorization: header_string(&http_req, header::AUTHORIZATION.as_str()),
        forwarded_for: header_string(&http_req, "x-forwarded-for"),
    };
    schema.execute(req.into_inner().data(caller)).await.into()
}

fn header_string(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// SDL endpoint for schema introspection and client code generation
async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

async fn playground_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allowed_header("x-requested-with")
        .allowed_header("x-forwarded-for")
        .max_age(3600);
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,ytca_gateway=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true),
        )
        .init();

    info!("Starting YTCA gateway...");

    let config = Config::from_env()?;

    let clients = ServiceClients::new(&config);
    info!("Service clients initialized");

    let schema = schema::build_schema(clients, config.graphql.introspection);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = config.server.workers;
    let allowed_origins = config.cors.allowed_origins.clone();
    let playground = config.graphql.playground;

    info!("YTCA gateway listening on http://{}", bind_addr);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::default())
            .wrap(build_cors(&allowed_origins))
            .app_data(web::Data::new(schema.clone()))
            .route("/graphql", web::post().to(graphql_handler))
            .route("/graphql/schema", web::get().to(schema_handler))
            .route("/schema", web::get().to(schema_handler))
            .route("/health", web::get().to(health_handler));
        if playground {
            app = app.route("/playground", web::get().to(playground_handler));
        }
        app
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
