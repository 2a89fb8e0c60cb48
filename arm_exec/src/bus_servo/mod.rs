//! # Serial bus servo controller
//!
//! Drives the chain of LX-16A servos sharing one half-duplex serial line. Commands are written and
//! forgotten, queries write a request, wait a fixed interval for the servo to answer, then decode
//! whatever has arrived.
//!
//! Two handles onto the line are held. Transactions (any write, and a query's request and reply)
//! are serialised through one, stop commands go out on the other so that an emergency stop never
//! waits behind a query in flight.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod transport;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{io, sync::Mutex, thread, time::Duration};

use comms_if::eqpt::bus_servo::{
    self as codec, BusCmd, BusPacket, DecodeError, TelemetrySample, FRAME_OVERHEAD, MAX_ID,
};
use util::{diag::Diagnostics, diag_debug, diag_error, diag_trace};

pub use transport::{BusTransport, SimBus};

use crate::{lock, FailureKind};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Controller for every servo on one bus.
pub struct BusServoCtrl<T: BusTransport> {
    /// Line used for commands and queries, one transaction at a time.
    link: Mutex<T>,

    /// Line used only for stop commands.
    stop_line: Mutex<T>,

    /// How long a servo is given to reply to a query.
    response_wait: Duration,

    diag: Diagnostics,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Servo ID {0} is not valid, IDs are 1 to 253")]
    InvalidId(u8),

    #[error("Servo {id} did not reply, got {received} of {expected} bytes")]
    NoResponse {
        id: u8,
        expected: usize,
        received: usize,
    },

    #[error("Reply from servo {id} is malformed: {source}")]
    Malformed {
        id: u8,
        #[source]
        source: DecodeError,
    },

    #[error("Serial line error talking to servo {id}: {source}")]
    Io {
        id: u8,
        #[source]
        source: io::Error,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: BusTransport> BusServoCtrl<T> {
    /// Create a new controller.
    ///
    /// `link` and `stop_line` must both write onto the same physical bus.
    pub fn new(link: T, stop_line: T, response_wait: Duration, diag: Diagnostics) -> Self {
        Self {
            link: Mutex::new(link),
            stop_line: Mutex::new(stop_line),
            response_wait,
            diag,
        }
    }

    /// Start a move of servo `id` to `position` (0-1000) taking `time_ms`.
    pub fn move_time_write(&self, id: u8, position: u16, time_ms: u16) -> Result<(), BusError> {
        check_id(id)?;

        diag_trace!(
            self.diag,
            "Servo {} -> position {} over {} ms",
            id,
            position,
            time_ms
        );

        self.send(&BusPacket::move_time_write(id, position, time_ms))
    }

    /// Send a stop command to each servo in `ids`, in the order given.
    ///
    /// This never takes the transaction line, so it does not wait for a query in progress. A
    /// failure to write to one servo is logged and the remaining servos are still stopped.
    pub fn stop_all(&self, ids: &[u8]) {
        let mut line = lock(&self.stop_line);

        for &id in ids {
            let bytes = BusPacket::move_stop(id).encode();

            if let Err(e) = line.write_packet(&bytes) {
                diag_error!(self.diag, "Could not send stop to servo {}: {}", id, e);
            }
        }
    }

    /// Read the position of servo `id` (0-1000).
    pub fn read_position(&self, id: u8) -> Result<u16, BusError> {
        let reply = self.query(id, BusCmd::PosRead)?;
        codec::parse_position_reply(&reply, id).map_err(|source| BusError::Malformed { id, source })
    }

    /// Read the internal temperature of servo `id`.
    ///
    /// Units: degrees Celsius
    pub fn read_temperature(&self, id: u8) -> Result<u8, BusError> {
        let reply = self.query(id, BusCmd::TempRead)?;
        codec::parse_temperature_reply(&reply, id)
            .map_err(|source| BusError::Malformed { id, source })
    }

    /// Read the supply voltage seen by servo `id`.
    ///
    /// Units: millivolts
    pub fn read_voltage(&self, id: u8) -> Result<u16, BusError> {
        let reply = self.query(id, BusCmd::VinRead)?;
        codec::parse_voltage_reply(&reply, id).map_err(|source| BusError::Malformed { id, source })
    }

    /// Read position, temperature and voltage of servo `id`.
    ///
    /// Each reading is taken independently, any which fail are left empty.
    pub fn read_telemetry(&self, id: u8) -> TelemetrySample {
        TelemetrySample {
            position: self.reading(id, "position", self.read_position(id)),
            temperature_c: self.reading(id, "temperature", self.read_temperature(id)),
            voltage_mv: self.reading(id, "voltage", self.read_voltage(id)),
        }
    }

    fn reading<V>(&self, id: u8, what: &str, result: Result<V, BusError>) -> Option<V> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                diag_debug!(self.diag, "No {} from servo {}: {}", what, id, e);
                None
            }
        }
    }

    /// Write a packet on the transaction line.
    fn send(&self, packet: &BusPacket) -> Result<(), BusError> {
        let mut link = lock(&self.link);

        link.write_packet(&packet.encode())
            .map_err(|source| BusError::Io {
                id: packet.id(),
                source,
            })
    }

    /// Send a query and return the raw reply.
    ///
    /// The line is held for the whole exchange so replies cannot be interleaved.
    fn query(&self, id: u8, cmd: BusCmd) -> Result<Vec<u8>, BusError> {
        check_id(id)?;

        let io_err = |source: io::Error| BusError::Io { id, source };
        let expected = cmd.reply_len().unwrap_or(FRAME_OVERHEAD);
        let request = BusPacket::query(id, cmd).encode();

        let mut link = lock(&self.link);

        link.clear_input().map_err(io_err)?;
        link.write_packet(&request).map_err(io_err)?;

        thread::sleep(self.response_wait);

        let received = link.bytes_available().map_err(io_err)?;
        if received < expected {
            return Err(BusError::NoResponse {
                id,
                expected,
                received,
            });
        }

        let mut reply = vec![0u8; expected];
        link.read_bytes(&mut reply).map_err(io_err)?;

        diag_trace!(self.diag, "Servo {} replied {:02X?}", id, reply);

        Ok(reply)
    }
}

impl BusError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BusError::InvalidId(_) => FailureKind::ConfigurationError,
            _ => FailureKind::CommunicationFailure,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_id(id: u8) -> Result<(), BusError> {
    if id == 0 || id > MAX_ID {
        Err(BusError::InvalidId(id))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{reply, Event, MockBus};
    use std::{sync::Arc, time::Instant};

    fn ctrl() -> (BusServoCtrl<MockBus>, MockBus) {
        let bus = MockBus::new();
        let ctrl = BusServoCtrl::new(
            bus.clone(),
            bus.stop_line(),
            Duration::from_millis(1),
            Diagnostics::null(),
        );

        (ctrl, bus)
    }

    #[test]
    fn test_move_time_write_bytes() {
        let (ctrl, bus) = ctrl();

        ctrl.move_time_write(5, 500, 1000).unwrap();

        let mut expected = vec![0x55, 0x55, 0x05, 0x07, 0x01, 0xF4, 0x01, 0xE8, 0x03];
        expected.push(codec::checksum(&expected[2..]));

        assert_eq!(bus.events(), vec![Event::Bus(expected)]);
    }

    #[test]
    fn test_read_position() {
        let (ctrl, bus) = ctrl();
        bus.queue_reply(reply(7, BusCmd::PosRead, &[0x2C, 0x01]));

        assert_eq!(ctrl.read_position(7).unwrap(), 300);
        assert_eq!(
            bus.events(),
            vec![Event::Bus(BusPacket::pos_read(7).encode())]
        );
    }

    #[test]
    fn test_missing_reply() {
        let (ctrl, _bus) = ctrl();

        let err = ctrl.read_position(3).unwrap_err();
        assert!(matches!(
            err,
            BusError::NoResponse {
                id: 3,
                expected: 8,
                received: 0
            }
        ));
        assert_eq!(err.kind(), FailureKind::CommunicationFailure);
    }

    #[test]
    fn test_short_and_corrupt_replies() {
        let (ctrl, bus) = ctrl();

        let good = reply(2, BusCmd::TempRead, &[41]);
        bus.queue_reply(good[..good.len() - 1].to_vec());
        assert!(matches!(
            ctrl.read_temperature(2),
            Err(BusError::NoResponse { .. })
        ));

        let mut corrupt = good.clone();
        corrupt[5] ^= 0x01;
        bus.queue_reply(corrupt);
        assert!(matches!(
            ctrl.read_temperature(2),
            Err(BusError::Malformed {
                source: DecodeError::BadChecksum { .. },
                ..
            })
        ));

        // Another servo answering
        bus.queue_reply(reply(4, BusCmd::TempRead, &[41]));
        assert!(matches!(
            ctrl.read_temperature(2),
            Err(BusError::Malformed {
                source: DecodeError::WrongId { .. },
                ..
            })
        ));

        bus.queue_reply(good);
        assert_eq!(ctrl.read_temperature(2).unwrap(), 41);
    }

    #[test]
    fn test_telemetry_is_partial() {
        let (ctrl, bus) = ctrl();
        bus.queue_reply(reply(9, BusCmd::PosRead, &[0xF4, 0x01]));
        bus.queue_reply(vec![]);
        bus.queue_reply(reply(9, BusCmd::VinRead, &[0x60, 0x1D]));

        let sample = ctrl.read_telemetry(9);
        assert_eq!(sample.position, Some(500));
        assert_eq!(sample.temperature_c, None);
        assert_eq!(sample.voltage_mv, Some(7520));
    }

    #[test]
    fn test_invalid_ids() {
        let (ctrl, bus) = ctrl();

        assert!(matches!(ctrl.read_position(0), Err(BusError::InvalidId(0))));
        assert!(matches!(
            ctrl.move_time_write(254, 0, 0),
            Err(BusError::InvalidId(254))
        ));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_stop_does_not_wait_for_query() {
        let bus = MockBus::new();
        bus.set_reply_delay(Duration::from_millis(500));
        let ctrl = Arc::new(BusServoCtrl::new(
            bus.clone(),
            bus.stop_line(),
            Duration::from_millis(1),
            Diagnostics::null(),
        ));

        let reader = {
            let ctrl = ctrl.clone();
            thread::spawn(move || ctrl.read_position(1))
        };

        // Let the reader get hold of the transaction line
        while bus.events().is_empty() {
            thread::sleep(Duration::from_millis(1));
        }

        let start = Instant::now();
        ctrl.stop_all(&[1, 2]);
        assert!(start.elapsed() < Duration::from_millis(250));

        assert!(reader.join().unwrap().is_err());
        assert_eq!(
            bus.events()[1..].to_vec(),
            vec![
                Event::Stop(BusPacket::move_stop(1).encode()),
                Event::Stop(BusPacket::move_stop(2).encode()),
            ]
        );
    }
}
