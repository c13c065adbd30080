//! SNTPv4 client packets (RFC 4330).

/// Size of an SNTP packet without extension fields.
pub const PACKET_LEN: usize = 48;
/// Server port.
pub const NTP_PORT: u16 = 123;

/// Seconds between the NTP era 0 start (1900-01-01) and the Unix epoch.
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

const VERSION: u8 = 4;
const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;
const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    TooShort,
    /// The packet was not sent by a server.
    UnexpectedMode(u8),
    /// Stratum 0, the server refuses to serve us.
    KissOfDeath,
    /// The server did not fill in its transmit timestamp.
    Unsynchronized,
}

impl core::fmt::Display for SntpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SntpError::TooShort => f.write_str("packet too short"),
            SntpError::UnexpectedMode(mode) => write!(f, "unexpected mode {}", mode),
            SntpError::KissOfDeath => f.write_str("kiss-of-death"),
            SntpError::Unsynchronized => f.write_str("server not synchronized"),
        }
    }
}

/// Builds a client request. Every field but the header byte is left zero.
pub fn request_packet() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Extracts the server transmit time, in Unix seconds, from a response.
pub fn parse_response(packet: &[u8]) -> Result<u64, SntpError> {
    if packet.len() < PACKET_LEN {
        return Err(SntpError::TooShort);
    }

    let mode = packet[0] & 0b111;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(SntpError::UnexpectedMode(mode));
    }
    if packet[1] == 0 {
        return Err(SntpError::KissOfDeath);
    }

    let mut seconds = [0u8; 4];
    seconds.copy_from_slice(&packet[TRANSMIT_TIMESTAMP_OFFSET..TRANSMIT_TIMESTAMP_OFFSET + 4]);
    let ntp_seconds = u64::from(u32::from_be_bytes(seconds));
    if ntp_seconds == 0 {
        return Err(SntpError::Unsynchronized);
    }

    // Era 1 starts in 2036, its small values wrap past the 32-bit counter
    if ntp_seconds >= NTP_UNIX_OFFSET {
        Ok(ntp_seconds - NTP_UNIX_OFFSET)
    } else {
        Ok(ntp_seconds + (1u64 << 32) - NTP_UNIX_OFFSET)
    }
}
