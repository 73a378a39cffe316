use crate::config::Shared;
use crate::dns::handlers::Handler;
use crate::resolver::Resolver;
use tokio::net::UdpSocket;
use trust_dns_server::ServerFuture;

/// Bind [`Config::dns_udp_bind_addr`][crate::config::Config::dns_udp_bind_addr] and serve the
/// zone on it.
pub async fn new(config: Shared, resolver: Resolver) -> anyhow::Result<ServerFuture<Handler>> {
    let udp_addr = config.dns_udp_bind_addr();
    let socket = UdpSocket::bind(udp_addr).await?;
    with_socket(config, resolver, socket)
}

/// Serve the zone on an already bound UDP socket.
pub fn with_socket(
    config: Shared,
    resolver: Resolver,
    socket: UdpSocket,
) -> anyhow::Result<ServerFuture<Handler>> {
    let dns_handler = Handler::new(config, resolver)?;
    let mut dns_server = ServerFuture::new(dns_handler);
    dns_server.register_socket(socket);
    Ok(dns_server)
}
