//! Simulated angle servo board

use util::{diag::Diagnostics, diag_debug};

use super::{check_command, check_pulse, ServoDriver, ServoError};

/// A board which logs the commands it is given instead of driving any hardware.
#[derive(Debug)]
pub struct SimServoBoard {
    board: u8,
    diag: Diagnostics,
}

impl SimServoBoard {
    pub fn new(board: u8, diag: Diagnostics) -> Self {
        Self { board, diag }
    }
}

impl ServoDriver for SimServoBoard {
    fn set_angle(&mut self, channel: u8, angle_deg: f64) -> Result<(), ServoError> {
        check_command(channel, angle_deg)?;

        diag_debug!(
            self.diag,
            "Board {} channel {} -> {:.1} deg",
            self.board,
            channel,
            angle_deg
        );

        Ok(())
    }

    fn set_pulse_us(&mut self, channel: u8, pulse_us: u16) -> Result<(), ServoError> {
        check_pulse(channel, pulse_us)?;

        diag_debug!(
            self.diag,
            "Board {} channel {} -> {} us",
            self.board,
            channel,
            pulse_us
        );

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::diag::{Level, MemorySink};

    #[test]
    fn test_logs_commands() {
        let sink = MemorySink::new();
        let mut board = SimServoBoard::new(1, Diagnostics::new(sink.clone(), "board_1"));

        board.set_angle(3, 45.0).unwrap();
        board.set_pulse_us(4, 1500).unwrap();
        assert!(sink.contains(Level::Debug, "Board 1 channel 3 -> 45.0 deg"));
        assert!(sink.contains(Level::Debug, "Board 1 channel 4 -> 1500 us"));

        assert_eq!(board.set_angle(3, 181.0), Err(ServoError::InvalidAngle(181.0)));
        assert_eq!(board.set_angle(16, 10.0), Err(ServoError::InvalidChannel(16)));
        assert_eq!(board.set_pulse_us(3, 3000), Err(ServoError::InvalidPulse(3000)));

        // Rejected commands are not logged
        assert_eq!(sink.records().len(), 2);
    }
}
