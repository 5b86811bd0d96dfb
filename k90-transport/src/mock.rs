//! In-memory transport that records every control transfer
//!
//! Available to unit tests and, through the `mock` feature, to dependent
//! crates' tests.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::ControlTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// One attempted control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub direction: Direction,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Payload for OUT transfers, empty for IN
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MockTransport {
    transfers: Mutex<Vec<Transfer>>,
    responses: Mutex<HashMap<u8, Vec<u8>>>,
    failing: Mutex<HashSet<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes returned by IN transfers for `request`
    pub fn respond(&self, request: u8, data: &[u8]) {
        self.responses.lock().insert(request, data.to_vec());
    }

    /// Make every later transfer for `request` fail with `Pipe`
    pub fn fail(&self, request: u8) {
        self.failing.lock().insert(request);
    }

    pub fn succeed(&self, request: u8) {
        self.failing.lock().remove(&request);
    }

    /// All attempted transfers, including failed ones
    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers.lock().clone()
    }

    pub fn outgoing(&self) -> Vec<Transfer> {
        self.transfers
            .lock()
            .iter()
            .filter(|t| t.direction == Direction::Out)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.transfers.lock().clear();
    }

    fn record(&self, direction: Direction, request: u8, value: u16, index: u16, data: &[u8]) {
        self.transfers.lock().push(Transfer {
            direction,
            request,
            value,
            index,
            data: data.to_vec(),
        });
    }

    fn check(&self, request: u8) -> Result<(), TransportError> {
        if self.failing.lock().contains(&request) {
            return Err(TransportError::Usb(rusb::Error::Pipe));
        }
        Ok(())
    }
}

impl ControlTransport for MockTransport {
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        self.record(Direction::In, request, value, index, &[]);
        self.check(request)?;
        let responses = self.responses.lock();
        let data = responses
            .get(&request)
            .ok_or(TransportError::Usb(rusb::Error::Timeout))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn control_out(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.record(Direction::Out, request, value, index, data);
        self.check(request)
    }
}
