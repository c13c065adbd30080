//! HTML fragments served by the opener and the pages assembled from them.
//!
//! The fragments are served verbatim, unclosed tags included, so they must
//! not be reformatted.

use crate::civil::DateTime;
use core::fmt::{self, Write};
use core::net::Ipv4Addr;

/// Build timestamp, in EST, as `Mmm dd yyyy hh:mm:ss EST`.
pub const COMPILE_DATE: &str = concat!(env!("GARAGESP_COMPILE_DATE"), " EST");
/// Version label shown on the info page.
pub const VERSION: &str = concat!("Version ", env!("CARGO_PKG_VERSION"));

/// Page header.
pub const HEAD: &str = "<html><head><meta name=viewport content='width=device-width, initial-scale=1.0' /></head><body>";
/// Footer start, followed by the current date.
pub const FOOTER_START: &str = "<br><a href=/>Home</a><footer><i>Date: ";
/// Footer end, with the three monkeys.
pub const FOOTER_END: &str = "</i><br>&#128584; &#128585; &#128586;</footer></body><html>";
/// Timezone label written right after the date.
pub const TZ_LABEL: &str = " EST<br>";
/// Button posting to `/switch`.
pub const PUSH_TO_OPEN: &str = "<form action=switch method=POST><button type=submit style='width: 200;height:50;'>Open/Close garage door</button></form>";

/// Shown in the footer until the clock has been synchronised.
pub const DATE_UNKNOWN: &str = "not synced";

/// Runtime facts shown on the info page.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub uptime_secs: u64,
    pub address: Option<Ipv4Addr>,
}

/// Writes a full page around `body`.
pub fn render_page<W: Write>(out: &mut W, body: &str, date: Option<DateTime>) -> fmt::Result {
    render_page_with(out, date, |out| out.write_str(body))
}

/// Writes the home page with the door button.
pub fn render_home<W: Write>(out: &mut W, date: Option<DateTime>) -> fmt::Result {
    render_page(out, PUSH_TO_OPEN, date)
}

/// Writes the info page.
pub fn render_info<W: Write>(
    out: &mut W,
    info: &DeviceInfo,
    date: Option<DateTime>,
) -> fmt::Result {
    render_page_with(out, date, |out| {
        write!(out, "{}<br>Compiled: {}<br>", VERSION, COMPILE_DATE)?;
        write!(out, "Uptime: {} s<br>", info.uptime_secs)?;
        match info.address {
            Some(addr) => write!(out, "IP: {}<br>", addr),
            None => out.write_str("IP: none<br>"),
        }
    })
}

/// Writes a page carrying a single paragraph.
pub fn render_message<W: Write>(out: &mut W, message: &str, date: Option<DateTime>) -> fmt::Result {
    render_page_with(out, date, |out| write!(out, "<p>{}</p>", message))
}

fn render_page_with<W, F>(out: &mut W, date: Option<DateTime>, body: F) -> fmt::Result
where
    W: Write,
    F: FnOnce(&mut W) -> fmt::Result,
{
    out.write_str(HEAD)?;
    body(out)?;
    out.write_str(FOOTER_START)?;
    match date {
        Some(date) => write!(out, "{}", date)?,
        None => out.write_str(DATE_UNKNOWN)?,
    }
    out.write_str(TZ_LABEL)?;
    out.write_str(FOOTER_END)
}
