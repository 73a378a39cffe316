use crate::api::routes;
use crate::config::Shared;
use crate::refresh::Refresher;
use crate::resolver::Resolver;
use axum::routing::IntoMakeService;
use axum::Router;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};

#[derive(Clone)]
pub(super) struct AppState {
    pub resolver: Resolver,
    pub refresher: Refresher,
}

/// Serve the HTTP API on `addr`.
pub fn new(
    config: &Shared,
    addr: SocketAddr,
    resolver: Resolver,
    refresher: Refresher,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&addr).serve(make_service(config, resolver, refresher))
}

/// Serve the HTTP API on an already bound listener.
///
/// # Errors
///
/// Returns the underlying [`hyper::Error`] if the listener can't be adopted by the runtime.
pub fn from_tcp(
    config: &Shared,
    listener: TcpListener,
    resolver: Resolver,
    refresher: Refresher,
) -> hyper::Result<impl Future<Output = hyper::Result<()>>> {
    Ok(axum::Server::from_tcp(listener)?.serve(make_service(config, resolver, refresher)))
}

fn make_service(
    config: &Shared,
    resolver: Resolver,
    refresher: Refresher,
) -> IntoMakeService<Router> {
    routes::new(
        AppState {
            resolver,
            refresher,
        },
        config.api_timeout,
    )
    .into_make_service()
}
