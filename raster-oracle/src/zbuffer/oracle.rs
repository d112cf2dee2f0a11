use log::trace;
use serde::{Deserialize, Serialize};

use crate::Result;

use super::{DepthBuffer, DepthBufferConfig, DepthFunc};

/// A single request of the hardware towards the depth memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryRequest {
    Read { address: usize },
    Write { address: usize, data: u32 },
}

/// The answer to a `MemoryRequest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryResponse {
    ReadData(u32),
    WriteAck,
}

/// Golden model of the depth test stage. The test and the write are separate phases like in the
/// hardware, i.e., `commit` must only be called after `test_and_would_pass` returned true.
pub struct DepthTestOracle {
    buffer: DepthBuffer,
}

impl DepthTestOracle {
    /// Creates a new oracle with a freshly flushed depth buffer.
    ///
    /// # Arguments
    /// * `config` - The geometry of the depth memory.
    pub fn new(config: DepthBufferConfig) -> Result<Self> {
        let buffer = DepthBuffer::new(config)?;

        Ok(Self { buffer })
    }

    /// Returns the depth buffer of the oracle.
    #[inline]
    pub fn buffer(&self) -> &DepthBuffer {
        &self.buffer
    }

    /// Evaluates the depth function for the incoming depth against the stored one without
    /// modifying the buffer.
    ///
    /// # Arguments
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    /// * `z` - The incoming depth value.
    /// * `func` - The depth comparison function.
    pub fn test_and_would_pass(&self, x: usize, y: usize, z: u32, func: DepthFunc) -> Result<bool> {
        let stored = self.buffer.get(x, y)?;
        let pass = func.passes(z, stored);

        trace!(
            "Depth test ({}, {}): z={} {:?} stored={} -> {}",
            x,
            y,
            z,
            func,
            stored,
            pass
        );

        Ok(pass)
    }

    /// Overwrites the stored depth of the pixel. The depth is not tested again.
    ///
    /// # Arguments
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    /// * `z` - The new depth value, masked to the word size.
    pub fn commit(&mut self, x: usize, y: usize, z: u32) -> Result<()> {
        self.buffer.set(x, y, z)
    }

    /// Runs the depth test and commits the depth if it passed. Returns the test result.
    pub fn test_and_commit(&mut self, x: usize, y: usize, z: u32, func: DepthFunc) -> Result<bool> {
        let pass = self.test_and_would_pass(x, y, z, func)?;
        if pass {
            self.commit(x, y, z)?;
        }

        Ok(pass)
    }

    /// Resets the whole buffer to the farthest depth.
    pub fn flush(&mut self) {
        self.buffer.flush();
    }

    /// Reads the word at the given memory address.
    pub fn read_at(&self, address: usize) -> Result<u32> {
        self.buffer.read_at(address)
    }

    /// Writes the word at the given memory address.
    pub fn write_at(&mut self, address: usize, value: u32) -> Result<()> {
        self.buffer.write_at(address, value)
    }

    /// Serves exactly one memory request in the order issued by the harness.
    ///
    /// # Arguments
    /// * `request` - The read or write request of the hardware.
    pub fn serve(&mut self, request: MemoryRequest) -> Result<MemoryResponse> {
        trace!("Memory request {:?}", request);

        match request {
            MemoryRequest::Read { address } => {
                let data = self.read_at(address)?;
                Ok(MemoryResponse::ReadData(data))
            }
            MemoryRequest::Write { address, data } => {
                self.write_at(address, data)?;
                Ok(MemoryResponse::WriteAck)
            }
        }
    }
}
