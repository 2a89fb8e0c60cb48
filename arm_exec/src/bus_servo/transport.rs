//! Byte transports the servo bus can run over

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use serialport::{ClearBuffer, SerialPort};
use util::{diag::Diagnostics, diag_debug};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A half-duplex byte link onto the servo bus.
pub trait BusTransport: Send {
    /// Write a complete packet onto the bus.
    fn write_packet(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read exactly `buf.len()` bytes.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Throw away anything received but not yet read.
    fn clear_input(&mut self) -> io::Result<()>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A bus with nothing on it.
///
/// Written packets are logged, no servo ever replies.
#[derive(Debug)]
pub struct SimBus {
    diag: Diagnostics,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusTransport for Box<dyn SerialPort> {
    fn write_packet(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }
}

impl SimBus {
    pub fn new(diag: Diagnostics) -> Self {
        Self { diag }
    }
}

impl BusTransport for SimBus {
    fn write_packet(&mut self, bytes: &[u8]) -> io::Result<()> {
        diag_debug!(self.diag, "TX {:02X?}", bytes);
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    fn read_bytes(&mut self, _buf: &mut [u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "nothing is connected to the simulated bus",
        ))
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open a serial port for the bus.
///
/// Returns two handles onto the same port. The first carries request/reply transactions, the
/// second is kept for stop commands so they never queue behind a transaction.
pub fn open_serial(
    port_name: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<(Box<dyn SerialPort>, Box<dyn SerialPort>), serialport::Error> {
    let port = serialport::new(port_name, baud_rate)
        .timeout(timeout)
        .open()?;
    let stop_line = port.try_clone()?;

    Ok((port, stop_line))
}
