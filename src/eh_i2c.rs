use embedded_hal::i2c::{ErrorType, I2c, Operation};
use log::debug;

use crate::modes;
use crate::session::Port;
use crate::{BusPirate, Error};

impl<P: Port> ErrorType for BusPirate<modes::I2c, P> {
    type Error = Error;
}

impl<P: Port> I2c for BusPirate<modes::I2c, P> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // Each operation is its own bracketed console command, so the bus
        // sees a Stop between operations rather than a repeated Start.
        for operation in operations {
            match operation {
                Operation::Read(read_buffer) => {
                    debug!("I2C Read 0x{address:02X} r:{}", read_buffer.len());
                    if read_buffer.is_empty() {
                        continue;
                    }
                    let data = self.bus_read(address, read_buffer.len())?;
                    read_buffer.copy_from_slice(&data);
                }
                Operation::Write(bytes_to_write) => {
                    debug!("I2C Write 0x{address:02X} w:{}", bytes_to_write.len());
                    self.bus_write(address, bytes_to_write)?;
                }
            }
        }
        Ok(())
    }
}
