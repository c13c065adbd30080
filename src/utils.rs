use crate::WifiStack;
use embassy_net::tcp::TcpSocket;
use embassy_time::{Duration, Timer};

/// Wait for the wifi device to connect to the network and until it gets an IP address
pub async fn wait_for_connection(stack: &'static WifiStack) {
    while !stack.is_link_up() {
        Timer::after(Duration::from_millis(500)).await;
    }

    if stack.config_v4().is_none() {
        log::info!("SYS | Waiting to get IP address...");
        while stack.config_v4().is_none() {
            Timer::after(Duration::from_millis(500)).await;
        }
    }

    if let Some(config) = stack.config_v4() {
        log::info!("SYS | Device IP: {}", config.address);
    }
}

/// Writes a buffer to a TCP socket.
pub async fn write_tcp_buf(
    socket: &mut TcpSocket<'_>,
    mut buf: &[u8],
) -> Result<(), embassy_net::tcp::Error> {
    while !buf.is_empty() {
        match socket.write(buf).await {
            Ok(0) => log::warn!("TCP buffer writer wrote 0 bytes to the buffer"),
            Ok(n) => buf = &buf[n..],
            Err(e) => return Err(e),
        }
    }

    if let Err(e) = socket.flush().await {
        log::error!("flush error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

/// Resets the socket so it can accept a new connection.
pub async fn abort_connection(socket: &mut TcpSocket<'_>) {
    socket.abort();
    if let Err(e) = socket.flush().await {
        log::warn!("SYS | Error flushing aborted socket: {:?}", e);
    }
}
