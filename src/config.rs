//! Compile time configuration, set through `[env]` in `.cargo/config.toml`.

use core::{fmt::Display, str::FromStr};
use embassy_time::Duration;
use garagesp::auth::Credentials;

/// The SSID of the wifi network.
pub const SSID: &str = env!("SSID");
/// The password of the wifi network.
pub const PASSWORD: &str = env!("PASSWORD");
/// The hostname sent with DHCP requests.
pub const HOSTNAME: &str = "garagesp";

/// The port on which the device will listen for HTTP requests.
const HTTP_LISTEN_PORT: &str = env!("HTTP_LISTEN_PORT");
/// The fallback port on which the device will listen for HTTP requests.
const HTTP_LISTEN_PORT_FALLBACK: u16 = 80;
/// Basic auth user for the door switch. Empty disables authentication.
const HTTP_AUTH_USER: &str = env!("HTTP_AUTH_USER");
const HTTP_AUTH_PASSWORD: &str = env!("HTTP_AUTH_PASSWORD");

/// How long the relay stays closed, in milliseconds.
const RELAY_PULSE_MS: &str = env!("RELAY_PULSE_MS");
const RELAY_PULSE_MS_FALLBACK: u64 = 500;

/// The SNTP server.
pub const NTP_HOST: &str = env!("NTP_HOST");
/// Seconds between two clock synchronisations.
const NTP_SYNC_INTERVAL: &str = env!("NTP_SYNC_INTERVAL");
const NTP_SYNC_INTERVAL_FALLBACK: u64 = 3600;

pub fn http_listen_port() -> u16 {
    parse_or("HTTP_LISTEN_PORT", HTTP_LISTEN_PORT, HTTP_LISTEN_PORT_FALLBACK)
}

pub fn http_credentials() -> Option<Credentials<'static>> {
    Credentials::from_config(HTTP_AUTH_USER, HTTP_AUTH_PASSWORD)
}

pub fn relay_pulse() -> Duration {
    Duration::from_millis(parse_or(
        "RELAY_PULSE_MS",
        RELAY_PULSE_MS,
        RELAY_PULSE_MS_FALLBACK,
    ))
}

pub fn ntp_sync_interval() -> Duration {
    Duration::from_secs(parse_or(
        "NTP_SYNC_INTERVAL",
        NTP_SYNC_INTERVAL,
        NTP_SYNC_INTERVAL_FALLBACK,
    ))
}

/// Parse a configuration value and fallback to `fallback` if there is an error
fn parse_or<T>(name: &str, value: &str, fallback: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value.trim().parse::<T>() {
        Ok(v) => v,
        Err(e) => {
            log::error!("SYS | Error parsing {} -> {}: {}", name, e, value);
            log::error!("SYS | Using fallback {}: {}", name, fallback);
            fallback
        }
    }
}
