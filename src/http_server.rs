use crate::clock::now_local;
use crate::config::{http_credentials, http_listen_port, relay_pulse};
use crate::relay::pulse_relay;
use crate::utils::{abort_connection, wait_for_connection, write_tcp_buf};
use crate::WifiStack;

use core::fmt;
use core::net::Ipv4Addr;
use embassy_net::{tcp::TcpSocket, IpListenEndpoint};
use embassy_time::{Duration, Instant, Timer};
use garagesp::auth::{authorize, Credentials};
use garagesp::http::{
    decide, head_complete, parse_request, route, switch_reply, write_response_head, Action,
    Reply, Status,
};
use garagesp::pages::{render_home, render_info, DeviceInfo};
use heapless::String;

/// The buffer size for the TCP socket.
/// It should be big enough to contain the HTTP requests and responses.
const TCP_BUFFER_SIZE: usize = 2048;

/// The embassy task that handles the HTTP server.
#[embassy_executor::task]
pub async fn http_server_task(stack: &'static WifiStack) {
    let listening_endpoint = IpListenEndpoint {
        addr: None,
        port: http_listen_port(),
    };
    let credentials = http_credentials();
    if credentials.is_none() {
        log::warn!("HTTP | HTTP_AUTH_USER is empty, the door switch is not protected");
    }

    // Setup TCP socket
    let mut rx_buffer = [0; TCP_BUFFER_SIZE];
    let mut tx_buffer = [0; TCP_BUFFER_SIZE];
    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(10)));

    let mut read_buffer = [0u8; TCP_BUFFER_SIZE];
    let mut response: String<TCP_BUFFER_SIZE> = String::new();

    loop {
        wait_for_connection(stack).await;

        // Wait for incoming connection
        log::info!(
            "HTTP | Waiting for connection on port {}...",
            listening_endpoint.port
        );
        if let Err(e) = socket.accept(listening_endpoint).await {
            log::error!("HTTP | Error accepting connection: {:?}", e);
            abort_connection(&mut socket).await;
            continue;
        };

        let remote_endpoint_addr = match socket.remote_endpoint() {
            Some(v) => v.addr,
            None => {
                log::error!("HTTP | Could not get remote endpoint");
                abort_connection(&mut socket).await;
                continue;
            }
        };
        log::info!("HTTP | Accepted connection to {}", remote_endpoint_addr);

        match read_request(&mut socket, &mut read_buffer).await {
            Ok(0) => log::info!("HTTP | Connection closed"),
            Ok(len) => {
                let query = match core::str::from_utf8(&read_buffer[..len]) {
                    Ok(v) => v,
                    Err(e) => {
                        log::error!("HTTP | Query was not UTF8: {:?}", e);
                        abort_connection(&mut socket).await;
                        continue;
                    }
                };

                response.clear();
                if let Err(e) =
                    handle_http_query(stack, query, credentials.as_ref(), &mut response).await
                {
                    log::error!("HTTP | Response does not fit in TCP buffer: {:?}", e);
                    abort_connection(&mut socket).await;
                    continue;
                }

                if (write_tcp_buf(&mut socket, response.as_bytes()).await).is_err() {
                    log::error!("HTTP | Error writing response");
                    abort_connection(&mut socket).await;
                    continue;
                }
            }
            Err(e) => log::error!("HTTP | Error reading request: {:?}", e),
        };

        log::info!("HTTP | Closing connection to {}", remote_endpoint_addr);
        socket.close();
        Timer::after(Duration::from_millis(50)).await;
        abort_connection(&mut socket).await;
    }
}

/// Reads until the end of the request headers, the end of the stream or a full buffer.
/// Returns the number of bytes received.
async fn read_request(
    socket: &mut TcpSocket<'_>,
    buffer: &mut [u8],
) -> Result<usize, embassy_net::tcp::Error> {
    let mut len = 0;
    while len < buffer.len() {
        match socket.read(&mut buffer[len..]).await? {
            0 => break,
            n => len += n,
        }
        if head_complete(&buffer[..len]) {
            break;
        }
    }

    if len == buffer.len() && !head_complete(buffer) {
        log::warn!("HTTP | Request headers do not fit in {} bytes", buffer.len());
    }
    Ok(len)
}

/// Handle the HTTP query and write the full response to `out`.
async fn handle_http_query(
    stack: &'static WifiStack,
    query: &str,
    credentials: Option<&Credentials<'_>>,
    out: &mut String<TCP_BUFFER_SIZE>,
) -> fmt::Result {
    let date = now_local();

    let request = match parse_request(query) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("HTTP | Could not parse request: {}", e);
            return Reply::BAD_REQUEST.write(out, date);
        }
    };
    log::info!("HTTP | {:?} {}", request.method, request.path);

    let authorized = authorize(credentials, request.header("Authorization"));
    match decide(route(request.method, request.path), authorized) {
        Action::Home => {
            write_response_head(out, Status::Ok, &[])?;
            render_home(out, date)
        }
        Action::Info => {
            let info = DeviceInfo {
                uptime_secs: Instant::now().as_secs(),
                address: stack
                    .config_v4()
                    .map(|config| Ipv4Addr::from(config.address.address().0)),
            };
            write_response_head(out, Status::Ok, &[])?;
            render_info(out, &info, date)
        }
        Action::PulseRelay => {
            let pulsed = pulse_relay(relay_pulse()).await.is_ok();
            if pulsed {
                log::info!("HTTP | Door switched");
            }
            switch_reply(pulsed).write(out, date)
        }
        Action::Reply(reply) => {
            if reply == Reply::UNAUTHORIZED {
                log::warn!("HTTP | Rejected unauthenticated door switch");
            }
            reply.write(out, date)
        }
    }
}
