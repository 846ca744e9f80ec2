use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpListener;

const LISTEN_BACKLOG: i32 = 1024;

/// Binds the HTTP listener.
///
/// A host of `*` listens on every interface: IPv6 dual-stack when the
/// system allows it, IPv4 only otherwise.
pub async fn create_listener(host: &str, port: u16) -> std::io::Result<(String, TcpListener)> {
    if host == "*" {
        return bind_wildcard(port);
    }

    let addr = format!("{}:{}", host, port);
    tracing::info!("Attempting to bind server to {}...", addr);

    let listener = TcpListener::bind(&addr).await?;
    let bound = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or(addr);

    Ok((bound, listener))
}

fn bind_wildcard(port: u16) -> std::io::Result<(String, TcpListener)> {
    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    tracing::info!("Attempting to bind server to {}... (IPv6 + IPv4 dual-stack)", v6);

    match bind_socket(Domain::IPV6, v6) {
        Ok(listener) => Ok((v6.to_string(), listener)),
        Err(e) => {
            tracing::warn!("Failed to bind IPv6 listener: {}. Attempting IPv4 only.", e);

            let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
            tracing::info!("Attempting to bind server to {}... (IPv4)", v4);
            Ok((v4.to_string(), bind_socket(Domain::IPV4, v4)?))
        }
    }
}

fn bind_socket(domain: Domain, addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    if domain == Domain::IPV6 {
        // Some systems refuse dual-stack; IPv6 alone still works there
        if let Err(e) = socket.set_only_v6(false) {
            tracing::warn!(
                "Failed to set dual-stack mode for IPv6 socket: {}. Continuing anyway.",
                e
            );
        }
    }

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    TcpListener::from_std(socket.into())
}
