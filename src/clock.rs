use crate::config::{ntp_sync_interval, NTP_HOST};
use crate::utils::wait_for_connection;
use crate::WifiStack;
use core::cell::Cell;
use embassy_futures::select::{select, Either};
use embassy_net::{
    dns::DnsQueryType,
    udp::{PacketMetadata, UdpSocket},
    IpAddress, IpEndpoint,
};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Instant, Timer};
use garagesp::civil::DateTime;
use garagesp::sntp::{self, NTP_PORT, PACKET_LEN};

/// Local port used for SNTP requests.
const SNTP_LOCAL_PORT: u16 = 50_123;
/// Receive size, room for extension fields and a MAC after the header.
const SNTP_RX_SIZE: usize = 128;
/// How long to wait for the server to answer.
const SNTP_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay before retrying a failed synchronisation.
const SNTP_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Unix time received from the server and the instant it was received at.
static LAST_SYNC: Mutex<CriticalSectionRawMutex, Cell<Option<(u64, Instant)>>> =
    Mutex::new(Cell::new(None));

pub fn set_unix_time(secs: u64) {
    LAST_SYNC.lock(|sync| sync.set(Some((secs, Instant::now()))));
}

/// Current Unix time, or `None` before the first synchronisation.
pub fn now_unix() -> Option<u64> {
    let (secs, at) = LAST_SYNC.lock(|sync| sync.get())?;
    Some(secs + at.elapsed().as_secs())
}

/// Current EST wall time.
pub fn now_local() -> Option<DateTime> {
    let secs = i64::try_from(now_unix()?).ok()?;
    DateTime::from_unix_est(secs)
}

/// The embassy task that keeps the clock synchronised.
#[embassy_executor::task]
pub async fn sntp_task(stack: &'static WifiStack) {
    let sync_interval = ntp_sync_interval();
    loop {
        wait_for_connection(stack).await;

        match query_time(stack).await {
            Ok(secs) => {
                set_unix_time(secs);
                if let Some(now) = now_local() {
                    log::info!("SNTP | Clock set to {} EST", now);
                }
                Timer::after(sync_interval).await;
            }
            Err(_) => {
                log::warn!(
                    "SNTP | Synchronisation failed, retrying in {} seconds",
                    SNTP_RETRY_DELAY.as_secs()
                );
                Timer::after(SNTP_RETRY_DELAY).await;
            }
        }
    }
}

/// Asks the SNTP server for the time and returns it in Unix seconds.
async fn query_time(stack: &'static WifiStack) -> Result<u64, ()> {
    let server = get_server_endpoint(stack).await?;

    // Setup UDP socket
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0; 2 * SNTP_RX_SIZE];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0; 2 * PACKET_LEN];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(SNTP_LOCAL_PORT) {
        log::error!("SNTP | Error binding UDP socket to port: {:?}", e);
        return Err(());
    }

    let result = exchange(&mut socket, server).await;
    socket.close();
    result
}

async fn exchange(socket: &mut UdpSocket<'_>, server: IpEndpoint) -> Result<u64, ()> {
    if let Err(e) = socket.send_to(&sntp::request_packet(), server).await {
        log::error!("SNTP | Error sending request to {}: {:?}", server, e);
        return Err(());
    }

    let mut buf = [0u8; SNTP_RX_SIZE];
    loop {
        let (len, remote) = match select(socket.recv_from(&mut buf), Timer::after(SNTP_TIMEOUT)).await
        {
            Either::First(Ok(v)) => v,
            Either::First(Err(e)) => {
                log::error!("SNTP | Reception error: {:?}", e);
                return Err(());
            }
            Either::Second(()) => {
                log::warn!("SNTP | No answer from {} in time", server);
                return Err(());
            }
        };

        if remote.addr != server.addr {
            log::warn!("SNTP | Ignoring datagram from {}", remote);
            continue;
        }

        return match sntp::parse_response(&buf[..len]) {
            Ok(secs) => Ok(secs),
            Err(e) => {
                log::error!("SNTP | Invalid response from {}: {}", server, e);
                Err(())
            }
        };
    }
}

/// Resolves the SNTP server to its first IPv4 address.
async fn get_server_endpoint(stack: &'static WifiStack) -> Result<IpEndpoint, ()> {
    log::info!("SNTP | Resolving IP for {}...", NTP_HOST);
    let ip_list = match stack.dns_query(NTP_HOST, DnsQueryType::A).await {
        Ok(v) => v,
        Err(e) => {
            log::error!("SNTP | Error querying DNS server: {:?}", e);
            return Err(());
        }
    };

    match ip_list.iter().find(|x| matches!(x, IpAddress::Ipv4(_))) {
        Some(addr) => {
            log::info!("SNTP | Found IP for {}: {}", NTP_HOST, addr);
            Ok(IpEndpoint::new(*addr, NTP_PORT))
        }
        None => {
            log::error!("SNTP | No IP found for {}", NTP_HOST);
            Err(())
        }
    }
}
