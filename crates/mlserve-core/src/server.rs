//! Route registrar and server
//!
//! [`Server`] is the Registering-state object: prediction routes are added
//! to it, each validated against the type registry and the reserved path
//! set. [`Server::into_router`] is the one-way transition to Serving: it
//! consumes the server, freezes the route table, and produces the axum
//! router that performs extract → decode → invoke → encode → wrap per
//! request.

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::codec::{TypedInput, TypedOutput};
use crate::config::ServerConfig;
use crate::envelope::{RequestEnvelope, ResponsePayload};
use crate::error::{Error, Result};
use crate::http::RequestError;
use crate::registry::{InputCodec, OutputCodec, TypeRegistry};
use crate::tag::{InputTag, OutputTag};

/// Discovery endpoint path.
pub const DISCOVERY_PATH: &str = "/get_available_models";

/// Static asset mount point.
pub const STATIC_PATH: &str = "/static";

/// Paths held by the server itself; prediction routes cannot claim them and
/// discovery never lists them.
pub const RESERVED_PATHS: &[&str] = &["/", DISCOVERY_PATH, STATIC_PATH];

/// A prediction function: typed input in, typed output out. Any error is
/// treated uniformly as a server-side prediction failure.
pub type PredictFn = dyn Fn(TypedInput) -> anyhow::Result<TypedOutput> + Send + Sync;

/// Immutable description of one registered route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub name: String,
    pub input: InputTag,
    pub output: OutputTag,
}

/// Registration request for one prediction route.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub path: String,
    /// Unique endpoint name (the original keyed routes by function name).
    pub name: String,
    pub input: InputTag,
    pub output: OutputTag,
    /// Opaque UI-facing task schema, stored and served verbatim at
    /// `<path>/task_schema` when present.
    pub schema: Option<Value>,
}

impl RouteSpec {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        input: InputTag,
        output: OutputTag,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            input,
            output,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

struct Route {
    desc: RouteDescriptor,
    input: InputCodec,
    output: OutputCodec,
    schema: Option<Value>,
    predict: Arc<PredictFn>,
}

/// The server in its Registering state.
pub struct Server {
    config: ServerConfig,
    registry: TypeRegistry,
    // Insertion-ordered: the single source of truth for dispatch and
    // discovery.
    routes: Vec<Route>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: TypeRegistry::with_defaults(),
            routes: Vec::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a prediction function under `spec.path`.
    ///
    /// Fails with [`Error::Config`] when either tag has no registry entry,
    /// the path is reserved or malformed, or the path or endpoint name is
    /// already taken. All of these are caught here, before serving starts.
    pub fn register<F>(&mut self, spec: RouteSpec, predict: F) -> Result<()>
    where
        F: Fn(TypedInput) -> anyhow::Result<TypedOutput> + Send + Sync + 'static,
    {
        let input = *self.registry.input(spec.input)?;
        let output = *self.registry.output(spec.output)?;

        if !spec.path.starts_with('/') || spec.path.len() < 2 {
            return Err(Error::Config(format!(
                "route path `{}` must start with `/` and be non-empty",
                spec.path
            )));
        }
        if RESERVED_PATHS.contains(&spec.path.as_str()) {
            return Err(Error::Config(format!(
                "route path `{}` is reserved by the server",
                spec.path
            )));
        }
        if self.routes.iter().any(|r| r.desc.path == spec.path) {
            return Err(Error::Config(format!(
                "route path `{}` is already registered",
                spec.path
            )));
        }
        if self.routes.iter().any(|r| r.desc.name == spec.name) {
            return Err(Error::Config(format!(
                "endpoint name `{}` is already registered",
                spec.name
            )));
        }

        let desc = RouteDescriptor {
            path: spec.path,
            name: spec.name,
            input: spec.input,
            output: spec.output,
        };
        info!(path = %desc.path, name = %desc.name, input = %desc.input, output = %desc.output,
            "registered prediction route");
        self.routes.push(Route {
            desc,
            input,
            output,
            schema: spec.schema,
            predict: Arc::new(predict),
        });
        Ok(())
    }

    /// Snapshot of the registered routes, in registration order.
    pub fn routes(&self) -> Vec<RouteDescriptor> {
        self.routes.iter().map(|r| r.desc.clone()).collect()
    }

    /// Transition Registering → Serving. Consumes the server, so no route
    /// can be added afterwards; the frozen table backs both dispatch and
    /// discovery.
    pub fn into_router(self) -> Router {
        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let upload_dir = self.config.upload_dir.clone();

        // Discovery payload, in registration order, reserved paths and
        // schema subroutes excluded by construction. The leading slash is
        // stripped from each entry, matching the original wire format.
        let listing: Arc<Vec<String>> = Arc::new(
            self.routes
                .iter()
                .map(|r| r.desc.path.trim_start_matches('/').to_string())
                .collect(),
        );

        let mut router = Router::new()
            .route("/", get(landing))
            .route(
                DISCOVERY_PATH,
                get(move || async move { Json(json!({ "result": listing.as_ref() })) }),
            )
            .nest_service(
                STATIC_PATH,
                tower_http::services::ServeDir::new("static"),
            );

        for route in self.routes {
            if let Some(schema) = route.schema.clone() {
                router = router.route(
                    &format!("{}/task_schema", route.desc.path),
                    get(move || async move { Json(schema) }),
                );
            }
            let path = route.desc.path.clone();
            let ctx = Arc::new(RouteContext {
                desc: route.desc,
                input: route.input,
                output: route.output,
                predict: route.predict,
                limiter: limiter.clone(),
                upload_dir: upload_dir.clone(),
            });
            router = router.route(
                &path,
                post(move |req: Request| {
                    let ctx = ctx.clone();
                    async move { handle_predict(ctx, req).await }
                }),
            );
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
    }
}

async fn landing() -> Json<Value> {
    Json(json!({
        "service": "mlserve",
        "discovery": DISCOVERY_PATH,
    }))
}

struct RouteContext {
    desc: RouteDescriptor,
    input: InputCodec,
    output: OutputCodec,
    predict: Arc<PredictFn>,
    limiter: Arc<Semaphore>,
    upload_dir: Option<PathBuf>,
}

async fn handle_predict(ctx: Arc<RouteContext>, req: Request) -> Response {
    let _permit = ctx
        .limiter
        .acquire()
        .await
        .expect("Semaphore should never be closed");

    let envelope = match RequestEnvelope::from_request(req, ctx.upload_dir.as_deref()).await {
        Ok(envelope) => envelope,
        Err(err) => return fail(&ctx, err),
    };

    // The pipeline is synchronous and the prediction function may block for
    // a long time, so it runs off the async runtime.
    let pipeline_ctx = ctx.clone();
    match tokio::task::spawn_blocking(move || run_pipeline(&pipeline_ctx, envelope)).await {
        Ok(Ok(payload)) => (StatusCode::OK, Json(payload)).into_response(),
        Ok(Err(err)) => fail(&ctx, err),
        Err(join_err) => {
            error!(path = %ctx.desc.path, error = %join_err, "prediction task panicked");
            RequestError::internal("prediction failed").into_response()
        }
    }
}

/// Extract → decode → invoke → encode → wrap. Runs to completion with no
/// suspension points; the envelope (and its upload spool) lives until the
/// payload is built.
fn run_pipeline(ctx: &RouteContext, envelope: RequestEnvelope) -> Result<Value> {
    let raw = (ctx.input.extract)(&envelope)?;
    let typed = (ctx.input.decode)(raw)?;
    let output = (ctx.predict)(typed).map_err(|e| Error::Prediction(e.to_string()))?;
    let encoded = (ctx.output.encode)(output)?;

    let mut payload = ResponsePayload::default();
    payload.insert(ctx.output.key, encoded)?;
    Ok(payload.into_value())
}

fn fail(ctx: &RouteContext, err: Error) -> Response {
    if matches!(err, Error::Prediction(_) | Error::Config(_) | Error::Io(_)) {
        error!(path = %ctx.desc.path, error = %err, "prediction route failed");
    }
    RequestError::from(err).into_response()
}
