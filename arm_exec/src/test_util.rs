//! Mock hardware shared by the unit tests

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use comms_if::eqpt::bus_servo::{BusCmd, BusPacket};
use util::diag::Diagnostics;

use crate::{
    actuators::{Actuators, JointMap},
    arm_ctrl::Sleeper,
    bus_servo::{BusServoCtrl, BusTransport},
    lock,
    servo_ctrl::{check_command, check_pulse, ServoDriver, ServoError},
};

/// Something which happened to the mock hardware.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Angle {
        board: u8,
        channel: u8,
        angle_deg: f64,
    },
    Pulse {
        board: u8,
        channel: u8,
        pulse_us: u16,
    },
    Bus(Vec<u8>),
    Stop(Vec<u8>),
    Wait(Duration),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// A servo board which records every command.
pub struct MockServoBoard {
    board: u8,
    log: EventLog,
}

/// A bus which records every packet and answers queries from a queue of canned replies.
///
/// Clones share the log and the reply queue.
#[derive(Clone)]
pub struct MockBus {
    log: EventLog,
    replies: Arc<Mutex<VecDeque<Vec<u8>>>>,
    reply_delay: Arc<Mutex<Duration>>,
    pending: Vec<u8>,
    is_stop_line: bool,
}

/// A sleeper which records waits instead of sleeping.
pub struct RecordingSleeper {
    log: EventLog,
}

impl MockServoBoard {
    pub fn new(board: u8, log: EventLog) -> Self {
        Self { board, log }
    }
}

impl ServoDriver for MockServoBoard {
    fn set_angle(&mut self, channel: u8, angle_deg: f64) -> Result<(), ServoError> {
        check_command(channel, angle_deg)?;

        lock(&self.log).push(Event::Angle {
            board: self.board,
            channel,
            angle_deg,
        });

        Ok(())
    }

    fn set_pulse_us(&mut self, channel: u8, pulse_us: u16) -> Result<(), ServoError> {
        check_pulse(channel, pulse_us)?;

        lock(&self.log).push(Event::Pulse {
            board: self.board,
            channel,
            pulse_us,
        });

        Ok(())
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            log: EventLog::default(),
            replies: Arc::default(),
            reply_delay: Arc::default(),
            pending: Vec::new(),
            is_stop_line: false,
        }
    }

    /// A handle which records its writes as stop line traffic.
    pub fn stop_line(&self) -> Self {
        Self {
            pending: Vec::new(),
            is_stop_line: true,
            ..self.clone()
        }
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        lock(&self.log).clone()
    }

    /// Queue the bytes the next query will receive.
    pub fn queue_reply(&self, bytes: Vec<u8>) {
        lock(&self.replies).push_back(bytes);
    }

    /// Delay before received bytes become visible.
    pub fn set_reply_delay(&self, delay: Duration) {
        *lock(&self.reply_delay) = delay;
    }
}

impl BusTransport for MockBus {
    fn write_packet(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.is_stop_line {
            lock(&self.log).push(Event::Stop(bytes.to_vec()));
            return Ok(());
        }

        lock(&self.log).push(Event::Bus(bytes.to_vec()));

        let is_query = bytes
            .get(4)
            .and_then(|c| BusCmd::from_code(*c))
            .and_then(|c| c.reply_len())
            .is_some();
        if is_query {
            self.pending = lock(&self.replies).pop_front().unwrap_or_default();
        }

        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let delay = *lock(&self.reply_delay);
        thread::sleep(delay);

        Ok(self.pending.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if buf.len() > self.pending.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short reply"));
        }

        let rest = self.pending.split_off(buf.len());
        buf.copy_from_slice(&self.pending);
        self.pending = rest;

        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}

impl RecordingSleeper {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        lock(&self.log).push(Event::Wait(duration));
    }
}

/// Encode a reply from servo `id`.
pub fn reply(id: u8, cmd: BusCmd, params: &[u8]) -> Vec<u8> {
    BusPacket::new(id, cmd, params.to_vec()).unwrap().encode()
}

/// Two mock boards and a mock bus, all logging into the returned bus's event log.
pub fn mock_actuators(map: JointMap) -> (Actuators<MockServoBoard, MockBus>, MockBus) {
    let bus = MockBus::new();
    let ctrl = BusServoCtrl::new(
        bus.clone(),
        bus.stop_line(),
        Duration::from_millis(1),
        Diagnostics::null(),
    );
    let boards = vec![
        MockServoBoard::new(1, bus.log()),
        MockServoBoard::new(2, bus.log()),
    ];

    let actuators = match Actuators::new(map, boards, ctrl, Diagnostics::null()) {
        Ok(a) => a,
        Err(e) => panic!("Could not build mock actuators: {}", e),
    };

    (actuators, bus)
}
