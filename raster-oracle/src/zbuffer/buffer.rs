use std::io::{BufWriter, Write};

use log::{debug, warn};

use crate::{Error, Result};

use super::{BoundsPolicy, DepthBufferConfig};

/// A row-major depth memory of `x_res * y_res` words with `z_size` bits each. The word of pixel
/// (x, y) lives at address `base + y * x_res + x`.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    config: DepthBufferConfig,

    /// The stored depth values, indexed by address minus base.
    depths: Vec<u32>,
}

impl DepthBuffer {
    /// Creates a new depth buffer where every pixel holds the farthest depth.
    ///
    /// # Arguments
    /// * `config` - The geometry of the depth memory.
    pub fn new(config: DepthBufferConfig) -> Result<Self> {
        config.validate()?;

        let depths = vec![config.far(); config.num_pixels()];

        Ok(Self { config, depths })
    }

    /// Returns the geometry of the depth memory.
    #[inline]
    pub fn config(&self) -> &DepthBufferConfig {
        &self.config
    }

    /// Returns the mask for a single depth word.
    #[inline]
    pub fn mask(&self) -> u32 {
        self.config.far()
    }

    /// Returns the stored depths in address order.
    #[inline]
    pub fn depths(&self) -> &[u32] {
        &self.depths
    }

    /// Returns the memory address of the given pixel.
    ///
    /// # Arguments
    /// * `x` - The column of the pixel.
    /// * `y` - The row of the pixel.
    pub fn address_of(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.config.x_res || y >= self.config.y_res {
            return Err(Error::PixelOutOfRange {
                x,
                y,
                x_res: self.config.x_res,
                y_res: self.config.y_res,
            });
        }

        Ok(self.config.base + y * self.config.x_res + x)
    }

    /// Maps the address onto an index of the depth array or returns `None` if the address is
    /// outside of the memory.
    fn index_of(&self, address: usize) -> Option<usize> {
        address
            .checked_sub(self.config.base)
            .filter(|index| *index < self.depths.len())
    }

    fn out_of_range(&self, address: usize) -> Error {
        Error::AddressOutOfRange {
            address,
            base: self.config.base,
            end: self.config.base + self.depths.len(),
        }
    }

    /// Reads the depth stored at the given pixel.
    pub fn get(&self, x: usize, y: usize) -> Result<u32> {
        let address = self.address_of(x, y)?;
        self.read_at(address)
    }

    /// Stores the depth at the given pixel. The depth is masked to the word size.
    pub fn set(&mut self, x: usize, y: usize, z: u32) -> Result<()> {
        let address = self.address_of(x, y)?;
        self.write_at(address, z)
    }

    /// Reads the word at the given address.
    ///
    /// # Arguments
    /// * `address` - The memory address.
    pub fn read_at(&self, address: usize) -> Result<u32> {
        match self.index_of(address) {
            Some(index) => Ok(self.depths[index]),
            None => match self.config.bounds {
                BoundsPolicy::Strict => Err(self.out_of_range(address)),
                BoundsPolicy::Lenient => {
                    warn!("Read from address {} outside of the depth memory", address);
                    Ok(0)
                }
            },
        }
    }

    /// Writes the word at the given address. The value is masked to the word size.
    ///
    /// # Arguments
    /// * `address` - The memory address.
    /// * `value` - The depth value to store.
    pub fn write_at(&mut self, address: usize, value: u32) -> Result<()> {
        match self.index_of(address) {
            Some(index) => {
                self.depths[index] = value & self.mask();
                Ok(())
            }
            None => match self.config.bounds {
                BoundsPolicy::Strict => Err(self.out_of_range(address)),
                BoundsPolicy::Lenient => {
                    warn!("Dropped write to address {} outside of the depth memory", address);
                    Ok(())
                }
            },
        }
    }

    /// Resets every word to the farthest depth.
    pub fn flush(&mut self) {
        debug!(
            "Flushing {}x{} depth buffer",
            self.config.x_res, self.config.y_res
        );

        let far = self.config.far();
        self.depths.fill(far);
    }

    /// Writes the depths as PGM file with gray colors, where near is bright and far is black.
    ///
    /// # Arguments
    /// * `writer` - The writer to which the depth-buffer will be serialized as PGM.
    pub fn write_as_pgm<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = BufWriter::new(writer);
        let far = self.config.far() as f64;

        writeln!(out, "P2")?;
        writeln!(out, "{} {}", self.config.x_res, self.config.y_res)?;
        writeln!(out, "255")?;

        for row in self.depths.chunks_exact(self.config.x_res) {
            let line = row
                .iter()
                .map(|depth| {
                    let gray = ((1f64 - *depth as f64 / far) * 255f64).round() as u32;
                    gray.to_string()
                })
                .collect::<Vec<_>>()
                .join(" ");

            writeln!(out, "{}", line)?;
        }

        out.flush()?;

        Ok(())
    }
}
