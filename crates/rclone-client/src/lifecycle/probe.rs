//! TCP reachability checks for the remote-control endpoint.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use rclone_config::ServiceEndpoint;

use super::error::LifecycleError;

const ENDPOINT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fails with [`LifecycleError::EndpointInUse`] when something is listening.
pub(crate) fn ensure_endpoint_available(endpoint: &ServiceEndpoint) -> Result<(), LifecycleError> {
    if endpoint_is_reachable(endpoint)? {
        return Err(LifecycleError::EndpointInUse {
            endpoint: endpoint.to_string(),
        });
    }
    Ok(())
}

/// Whether a TCP connection to the endpoint succeeds.
fn endpoint_is_reachable(endpoint: &ServiceEndpoint) -> Result<bool, LifecycleError> {
    match try_connect(endpoint) {
        Ok(()) => Ok(true),
        Err(error) if is_endpoint_available(&error) => Ok(false),
        Err(source) => Err(LifecycleError::EndpointProbe {
            endpoint: endpoint.to_string(),
            source,
        }),
    }
}

fn try_connect(endpoint: &ServiceEndpoint) -> io::Result<()> {
    let address = resolve(endpoint)?;
    TcpStream::connect_timeout(&address, ENDPOINT_PROBE_TIMEOUT).map(|_| ())
}

fn resolve(endpoint: &ServiceEndpoint) -> io::Result<SocketAddr> {
    (endpoint.resolvable_host(), endpoint.port())
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved address"))
}

/// Whether a connect error means nobody is listening.
///
/// `ConnectionReset` is not included: a reset implies a listener accepted
/// the connection first.
fn is_endpoint_available(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable
    )
}
