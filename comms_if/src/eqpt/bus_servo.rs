//! # Serial bus servo wire protocol
//!
//! Packets exchanged with the LX-16A style servos sharing the half duplex serial bus have the
//! form
//!
//! ```text
//! 0x55 0x55 <id> <len> <cmd> [params...] <checksum>
//! ```
//!
//! where `len = params.len() + 3` and `checksum = !(id + len + cmd + sum(params)) & 0xFF`.
//! Replies from a servo use the same framing, with the payload in place of the parameters.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Two sync bytes which start every packet.
pub const SYNC: [u8; 2] = [0x55, 0x55];

/// Bytes in a packet which are not parameters (sync, id, len, cmd, checksum).
pub const FRAME_OVERHEAD: usize = 6;

/// Id which every servo on the bus listens to.
pub const BROADCAST_ID: u8 = 0xFE;

/// Highest addressable servo id.
pub const MAX_ID: u8 = 253;

/// Most parameter bytes a packet can carry, the length byte counts them plus three.
pub const MAX_PARAMS: usize = u8::MAX as usize - 3;

/// Highest position in device units.
pub const MAX_POSITION: u16 = 1000;

/// Mechanical travel covered by `0..=MAX_POSITION`.
///
/// Units: degrees
pub const TRAVEL_DEG: f64 = 240.0;

/// Longest move time accepted by the servos.
///
/// Units: milliseconds
pub const MAX_MOVE_TIME_MS: u16 = 30000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single packet on the bus, either a request or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusPacket {
    id: u8,
    cmd: BusCmd,
    params: Vec<u8>,
}

/// Telemetry read back from one servo.
///
/// Each field is `None` if the corresponding read failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Units: device position units (0-1000)
    pub position: Option<u16>,

    /// Units: degrees celsius
    pub temperature_c: Option<u8>,

    /// Units: millivolts
    pub voltage_mv: Option<u16>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Command codes understood by the servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BusCmd {
    MoveTimeWrite = 1,
    MoveTimeRead = 2,
    MoveTimeWaitWrite = 7,
    MoveTimeWaitRead = 8,
    MoveStart = 11,
    MoveStop = 12,
    IdWrite = 13,
    IdRead = 14,
    AngleOffsetAdjust = 17,
    AngleOffsetWrite = 18,
    AngleOffsetRead = 19,
    AngleLimitWrite = 20,
    AngleLimitRead = 21,
    VinLimitWrite = 22,
    VinLimitRead = 23,
    TempMaxLimitWrite = 24,
    TempMaxLimitRead = 25,
    TempRead = 26,
    VinRead = 27,
    PosRead = 28,
    ServoOrMotorModeWrite = 29,
    ServoOrMotorModeRead = 30,
    LoadOrUnloadWrite = 31,
    LoadOrUnloadRead = 32,
}

/// Reasons a received byte sequence is not a valid packet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Packet is too short ({0} bytes)")]
    TooShort(usize),

    #[error("Packet does not start with the sync bytes (found {0:02X?})")]
    BadSync([u8; 2]),

    #[error("Packet declares a length of {declared} but {actual} bytes follow the id")]
    LengthMismatch { declared: u8, actual: usize },

    #[error("Checksum mismatch: computed 0x{computed:02X}, found 0x{found:02X}")]
    BadChecksum { computed: u8, found: u8 },

    #[error("Unknown command code {0}")]
    UnknownCommand(u8),

    #[error("Expected a reply from servo {expected}, got one from {found}")]
    WrongId { expected: u8, found: u8 },

    #[error("Expected a {expected:?} reply, got {found:?}")]
    WrongCommand { expected: BusCmd, found: BusCmd },

    #[error("Expected a {expected} byte payload, got {found}")]
    WrongPayloadSize { expected: usize, found: usize },
}

/// Reasons a packet cannot be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0} parameter bytes do not fit in a packet, at most {} are allowed", MAX_PARAMS)]
    TooManyParams(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusCmd {
    /// Every command, in code order.
    pub const ALL: [BusCmd; 24] = [
        BusCmd::MoveTimeWrite,
        BusCmd::MoveTimeRead,
        BusCmd::MoveTimeWaitWrite,
        BusCmd::MoveTimeWaitRead,
        BusCmd::MoveStart,
        BusCmd::MoveStop,
        BusCmd::IdWrite,
        BusCmd::IdRead,
        BusCmd::AngleOffsetAdjust,
        BusCmd::AngleOffsetWrite,
        BusCmd::AngleOffsetRead,
        BusCmd::AngleLimitWrite,
        BusCmd::AngleLimitRead,
        BusCmd::VinLimitWrite,
        BusCmd::VinLimitRead,
        BusCmd::TempMaxLimitWrite,
        BusCmd::TempMaxLimitRead,
        BusCmd::TempRead,
        BusCmd::VinRead,
        BusCmd::PosRead,
        BusCmd::ServoOrMotorModeWrite,
        BusCmd::ServoOrMotorModeRead,
        BusCmd::LoadOrUnloadWrite,
        BusCmd::LoadOrUnloadRead,
    ];

    /// Look up a command from its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        BusCmd::ALL.iter().find(|c| c.code() == code).copied()
    }

    /// The wire code of the command.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size of the payload the servo replies with, for the read queries.
    pub fn reply_payload_len(self) -> Option<usize> {
        match self {
            BusCmd::PosRead => Some(2),
            BusCmd::TempRead => Some(1),
            BusCmd::VinRead => Some(2),
            BusCmd::MoveTimeRead => Some(4),
            BusCmd::IdRead => Some(1),
            BusCmd::AngleOffsetRead => Some(1),
            BusCmd::AngleLimitRead => Some(4),
            BusCmd::VinLimitRead => Some(4),
            BusCmd::TempMaxLimitRead => Some(1),
            BusCmd::ServoOrMotorModeRead => Some(4),
            BusCmd::LoadOrUnloadRead => Some(1),
            _ => None,
        }
    }

    /// Total size of the reply to this query, including framing.
    pub fn reply_len(self) -> Option<usize> {
        self.reply_payload_len().map(|n| n + FRAME_OVERHEAD)
    }
}

impl BusPacket {
    /// Build a packet with arbitrary parameters.
    ///
    /// Fails if the parameters would overflow the length byte.
    pub fn new(id: u8, cmd: BusCmd, params: Vec<u8>) -> Result<Self, EncodeError> {
        if params.len() > MAX_PARAMS {
            return Err(EncodeError::TooManyParams(params.len()));
        }

        Ok(Self { id, cmd, params })
    }

    /// A request without parameters, such as a read query.
    pub fn query(id: u8, cmd: BusCmd) -> Self {
        Self {
            id,
            cmd,
            params: vec![],
        }
    }

    /// Move to `position` (0-1000) over `time_ms`.
    pub fn move_time_write(id: u8, position: u16, time_ms: u16) -> Self {
        let mut params = [0u8; 4];
        LittleEndian::write_u16(&mut params[0..2], position);
        LittleEndian::write_u16(&mut params[2..4], time_ms);

        Self {
            id,
            cmd: BusCmd::MoveTimeWrite,
            params: params.to_vec(),
        }
    }

    /// Stop any motion in progress.
    pub fn move_stop(id: u8) -> Self {
        Self::query(id, BusCmd::MoveStop)
    }

    pub fn pos_read(id: u8) -> Self {
        Self::query(id, BusCmd::PosRead)
    }

    pub fn temp_read(id: u8) -> Self {
        Self::query(id, BusCmd::TempRead)
    }

    pub fn vin_read(id: u8) -> Self {
        Self::query(id, BusCmd::VinRead)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn cmd(&self) -> BusCmd {
        self.cmd
    }

    pub fn params(&self) -> &[u8] {
        &self.params
    }

    /// Value of the length byte for this packet.
    pub fn len_byte(&self) -> u8 {
        // Bounded by MAX_PARAMS on construction
        (self.params.len() + 3) as u8
    }

    /// Serialise the packet into its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.params.len() + FRAME_OVERHEAD);

        bytes.extend_from_slice(&SYNC);
        bytes.push(self.id);
        bytes.push(self.len_byte());
        bytes.push(self.cmd.code());
        bytes.extend_from_slice(&self.params);
        bytes.push(checksum(&bytes[2..]));

        bytes
    }

    /// Parse a complete packet from `bytes`.
    ///
    /// The sync bytes and declared length are checked before anything else in the packet is
    /// trusted.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < FRAME_OVERHEAD {
            return Err(DecodeError::TooShort(bytes.len()));
        }

        if bytes[0..2] != SYNC {
            return Err(DecodeError::BadSync([bytes[0], bytes[1]]));
        }

        // The length byte counts itself, the command, the params and the checksum
        let declared = bytes[3];
        let actual = bytes.len() - 3;
        if declared as usize != actual {
            return Err(DecodeError::LengthMismatch { declared, actual });
        }

        let last = bytes.len() - 1;
        let computed = checksum(&bytes[2..last]);
        if computed != bytes[last] {
            return Err(DecodeError::BadChecksum {
                computed,
                found: bytes[last],
            });
        }

        let cmd = BusCmd::from_code(bytes[4]).ok_or(DecodeError::UnknownCommand(bytes[4]))?;

        Ok(Self {
            id: bytes[2],
            cmd,
            params: bytes[5..last].to_vec(),
        })
    }

    /// Decode a reply to `cmd` from servo `id`, checking the payload has the expected size.
    pub fn decode_reply(bytes: &[u8], id: u8, cmd: BusCmd) -> Result<Self, DecodeError> {
        let packet = Self::decode(bytes)?;

        if packet.id != id {
            return Err(DecodeError::WrongId {
                expected: id,
                found: packet.id,
            });
        }

        if packet.cmd != cmd {
            return Err(DecodeError::WrongCommand {
                expected: cmd,
                found: packet.cmd,
            });
        }

        if let Some(expected) = cmd.reply_payload_len() {
            if packet.params.len() != expected {
                return Err(DecodeError::WrongPayloadSize {
                    expected,
                    found: packet.params.len(),
                });
            }
        }

        Ok(packet)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the checksum over the bytes from the id through the last parameter.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Parse the reply to a position read.
pub fn parse_position_reply(bytes: &[u8], id: u8) -> Result<u16, DecodeError> {
    let packet = BusPacket::decode_reply(bytes, id, BusCmd::PosRead)?;
    Ok(LittleEndian::read_u16(&packet.params))
}

/// Parse the reply to a temperature read.
pub fn parse_temperature_reply(bytes: &[u8], id: u8) -> Result<u8, DecodeError> {
    let packet = BusPacket::decode_reply(bytes, id, BusCmd::TempRead)?;
    Ok(packet.params[0])
}

/// Parse the reply to a voltage read, in millivolts.
pub fn parse_voltage_reply(bytes: &[u8], id: u8) -> Result<u16, DecodeError> {
    let packet = BusPacket::decode_reply(bytes, id, BusCmd::VinRead)?;
    Ok(LittleEndian::read_u16(&packet.params))
}

/// Convert an angle into device position units.
///
/// Returns `None` if the angle is outside the servo's `0..=240` degree travel.
pub fn angle_to_units(angle_deg: f64) -> Option<u16> {
    if !(0.0..=TRAVEL_DEG).contains(&angle_deg) {
        return None;
    }

    Some((angle_deg * MAX_POSITION as f64 / TRAVEL_DEG).round() as u16)
}

/// Convert device position units into an angle in degrees.
pub fn units_to_angle(units: u16) -> f64 {
    units as f64 * TRAVEL_DEG / MAX_POSITION as f64
}
