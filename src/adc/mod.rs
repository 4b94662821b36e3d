//! ADC front end - LTC2497 driver and TWI bus helpers.
//!
//! Both are generic over the blocking `embedded_hal::i2c::I2c` trait so
//! they run against the nRF52840 TWIM on target and against a mock bus
//! in host tests.

pub mod bus;
pub mod ltc2497;

pub use ltc2497::{Ltc2497, Reading, Setup};

#[cfg(test)]
pub(crate) mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

    /// Recording I²C bus for driver tests.
    #[derive(Default)]
    pub struct MockI2c {
        /// `(address, bytes)` of every write.
        pub writes: Vec<(u8, Vec<u8>)>,
        /// `(address, len)` of every read.
        pub reads: Vec<(u8, usize)>,
        /// Bytes handed out by reads (zero-padded).
        pub read_data: Vec<u8>,
        /// When set, only these addresses acknowledge.
        pub devices: Option<Vec<u8>>,
        /// When set, every transaction fails with this error.
        pub fail: Option<ErrorKind>,
    }

    impl ErrorType for MockI2c {
        type Error = ErrorKind;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if let Some(kind) = self.fail {
                return Err(kind);
            }
            if let Some(devices) = &self.devices {
                if !devices.contains(&address) {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.read_data.get(i).copied().unwrap_or(0);
                        }
                        self.reads.push((address, buf.len()));
                    }
                }
            }
            Ok(())
        }
    }
}
