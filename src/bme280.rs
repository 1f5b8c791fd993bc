//! Temperature from a Bosch BME280.
//!
//! The sensor reports a 20-bit raw ADC value that only means something
//! together with the factory calibration constants stored in its NVM. The
//! constants are read once per driver; [`compensate`] applies the integer
//! formula from the datasheet to turn a raw value into hundredths of a degree.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, warn};

/// 7-bit address with SDO tied high.
pub const DEFAULT_ADDRESS: u8 = 0x77;
pub const CHIP_ID: u8 = 0x60;

mod register {
    pub const CHIP_ID: u8 = 0xD0;
    pub const CTRL_MEAS: u8 = 0xF4;
    /// Pressure, temperature and humidity, 8 bytes from here.
    pub const DATA: u8 = 0xF7;
    /// dig_T1 to dig_T3, 6 bytes from here.
    pub const CALIBRATION: u8 = 0x88;
}

/// Temperature x2, pressure x16, forced mode.
const CTRL_MEAS_VALUE: u8 = 0x55;
const MODE_MASK: u8 = 0b11;
/// Worst case conversion time for the oversampling above.
const MEASUREMENT_MS: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum Bme280Error<E: core::fmt::Debug> {
    #[error("bus error: {0:?}")]
    Bus(E),
    #[error("failed to read calibration constants: {0:?}")]
    CalibrationRead(E),
    #[error("calibration constants have not been read")]
    UninitializedCalibration,
}

/// Temperature calibration constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
}

impl Calibration {
    /// Unpack the little-endian register block starting at 0x88.
    pub fn from_registers(bytes: [u8; 6]) -> Self {
        Self {
            t1: u16::from_le_bytes([bytes[0], bytes[1]]),
            t2: i16::from_le_bytes([bytes[2], bytes[3]]),
            t3: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Raw temperature from the measurement block: MSB, LSB, then XLSB whose
/// low nibble is padding.
pub fn raw_temperature(block: &[u8; 8]) -> u32 {
    let raw = (u32::from(block[3]) << 16) | (u32::from(block[4]) << 8) | u32::from(block[5]);
    raw >> 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature {
    centidegrees: i32,
}

impl Temperature {
    pub fn from_centidegrees(centidegrees: i32) -> Self {
        Self { centidegrees }
    }

    pub fn centidegrees(&self) -> i32 {
        self.centidegrees
    }

    pub fn celsius(&self) -> f64 {
        f64::from(self.centidegrees) / 100.0
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} °C", self.celsius())
    }
}

/// Datasheet fixed-point temperature compensation.
pub fn compensate(raw: u32, calibration: &Calibration) -> Temperature {
    let raw = i64::from(raw);
    let t1 = i64::from(calibration.t1);
    let t2 = i64::from(calibration.t2);
    let t3 = i64::from(calibration.t3);

    let var1 = (((raw >> 3) - (t1 << 1)) * t2) >> 11;
    let var2 = (((((raw >> 4) - t1) * ((raw >> 4) - t1)) >> 12) * t3) >> 14;
    let fine = var1 + var2;
    // A 20-bit input keeps the result far inside i32.
    Temperature::from_centidegrees(((fine * 5 + 128) >> 8) as i32)
}

pub struct Bme280<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Option<Calibration>,
}

impl<I2C: I2c> Bme280<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            calibration: None,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_registers<const N: usize>(&mut self, register: u8) -> Result<[u8; N], I2C::Error> {
        let mut buf = [0u8; N];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf)
    }

    /// Read the chip id. A mismatch is logged but not an error.
    pub fn chip_id(&mut self) -> Result<u8, Bme280Error<I2C::Error>> {
        let [id] = self
            .read_registers(register::CHIP_ID)
            .map_err(Bme280Error::Bus)?;
        if id != CHIP_ID {
            warn!("unexpected chip id 0x{id:02X}, expected 0x{CHIP_ID:02X}");
        }
        Ok(id)
    }

    /// Start a conversion and read the control register back.
    pub fn configure(&mut self) -> Result<(), Bme280Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[register::CTRL_MEAS, CTRL_MEAS_VALUE])
            .map_err(Bme280Error::Bus)?;

        let [ctrl_meas] = self
            .read_registers(register::CTRL_MEAS)
            .map_err(Bme280Error::Bus)?;
        // The mode bits drop back to sleep once a forced conversion ends.
        if ctrl_meas & !MODE_MASK != CTRL_MEAS_VALUE & !MODE_MASK {
            warn!("control register reads back 0x{ctrl_meas:02X}, wrote 0x{CTRL_MEAS_VALUE:02X}");
        }
        Ok(())
    }

    /// Read and keep the calibration constants, replacing any read earlier.
    pub fn read_calibration(&mut self) -> Result<Calibration, Bme280Error<I2C::Error>> {
        let bytes = self
            .read_registers(register::CALIBRATION)
            .map_err(Bme280Error::CalibrationRead)?;
        let calibration = Calibration::from_registers(bytes);
        debug!("{calibration:?}");
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Read the measurement block and return the raw temperature.
    pub fn read_raw_sample(&mut self) -> Result<u32, Bme280Error<I2C::Error>> {
        let block = self
            .read_registers(register::DATA)
            .map_err(Bme280Error::Bus)?;
        let raw = raw_temperature(&block);
        debug!("raw temperature {raw}");
        Ok(raw)
    }

    pub fn compensate(&self, raw: u32) -> Result<Temperature, Bme280Error<I2C::Error>> {
        let calibration = self
            .calibration
            .as_ref()
            .ok_or(Bme280Error::UninitializedCalibration)?;
        Ok(compensate(raw, calibration))
    }

    /// Trigger a conversion, wait for it, and return the temperature.
    pub fn measure(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> Result<Temperature, Bme280Error<I2C::Error>> {
        // No bus traffic without calibration.
        let calibration = self
            .calibration
            .ok_or(Bme280Error::UninitializedCalibration)?;
        self.configure()?;
        delay.delay_ms(MEASUREMENT_MS);
        let raw = self.read_raw_sample()?;
        Ok(compensate(raw, &calibration))
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::*;
    use crate::fake::{bus_ready, FakeBridge};

    const REFERENCE: Calibration = Calibration {
        t1: 27504,
        t2: 26435,
        t3: -1000,
    };

    /// Registers 0x88..0x8D holding the reference constants.
    const REFERENCE_REGISTERS: [u8; 6] = [0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC];

    #[test]
    fn datasheet_reference_value() {
        let temperature = compensate(519888, &REFERENCE);
        assert_eq!(temperature.centidegrees(), 2508);
        assert!((temperature.celsius() - 25.08).abs() < 0.01);
        assert_eq!(temperature.to_string(), "25.08 °C");
    }

    #[test]
    fn below_zero() {
        // Low raw values land below freezing with the reference constants.
        let temperature = compensate(400_000, &REFERENCE);
        assert!(temperature.centidegrees() < 0);
        assert!(temperature.to_string().starts_with('-'));
    }

    #[test]
    fn calibration_is_little_endian_and_signed() {
        assert_eq!(Calibration::from_registers(REFERENCE_REGISTERS), REFERENCE);
    }

    #[test]
    fn raw_sample_drops_padding_nibble() {
        let block = [0x00, 0x00, 0x00, 0x7E, 0xED, 0x00, 0x00, 0x00];
        assert_eq!(raw_temperature(&block), 519888);
    }

    #[test]
    fn compensation_needs_calibration() {
        let expectations: [I2cTransaction; 0] = [];
        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Bme280::new(i2c.clone());

        assert!(matches!(
            sensor.compensate(519888),
            Err(Bme280Error::UninitializedCalibration)
        ));
        assert!(matches!(
            sensor.measure(&mut NoopDelay::new()),
            Err(Bme280Error::UninitializedCalibration)
        ));
        i2c.done();
    }

    #[test]
    fn chip_id_mismatch_is_not_an_error() {
        let expectations = [
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0xD0], vec![0x60]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0xD0], vec![0x58]),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Bme280::new(i2c.clone());

        assert_eq!(sensor.chip_id().unwrap(), CHIP_ID);
        assert_eq!(sensor.chip_id().unwrap(), 0x58);
        i2c.done();
    }

    #[test]
    fn measurement_cycle() {
        let expectations = [
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x88], REFERENCE_REGISTERS.to_vec()),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xF4, 0x55]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0xF4], vec![0x54]),
            I2cTransaction::write_read(
                DEFAULT_ADDRESS,
                vec![0xF7],
                vec![0x50, 0x00, 0x00, 0x7E, 0xED, 0x00, 0x80, 0x00],
            ),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Bme280::new(i2c.clone());

        assert_eq!(sensor.read_calibration().unwrap(), REFERENCE);
        let temperature = sensor.measure(&mut NoopDelay::new()).unwrap();
        assert_eq!(temperature.centidegrees(), 2508);
        i2c.done();
    }

    #[test]
    fn failed_calibration_read() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x88],
            REFERENCE_REGISTERS.to_vec(),
        )
        .with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expectations);
        let mut sensor = Bme280::new(i2c.clone());

        assert!(matches!(
            sensor.read_calibration(),
            Err(Bme280Error::CalibrationRead(ErrorKind::Other))
        ));
        assert!(sensor.calibration().is_none());
        i2c.done();
    }

    #[test]
    fn short_calibration_over_the_bridge() {
        let bp = bus_ready(
            FakeBridge::new()
                .on("[0xEE 0x88]", "TX: 0xEE ACK 0x88 ACK\r\nI2C STOP\r\nI2C> ")
                .on(
                    "[0xEFr:6]",
                    "TX: 0xEF ACK\r\nRX: 0x70 ACK 0x6B ACK 0x43 ACK 0x67 NACK\r\nI2C STOP\r\nI2C> ",
                ),
        );
        let mut sensor = Bme280::new(bp);

        assert!(matches!(
            sensor.read_calibration(),
            Err(Bme280Error::CalibrationRead(crate::Error::ShortRead {
                expected: 6,
                got: 4
            }))
        ));
    }

    #[test]
    fn temperature_over_the_bridge() {
        let ack = "TX: 0xEE ACK 0x00 ACK\r\nI2C STOP\r\nI2C> ";
        let bp = bus_ready(
            FakeBridge::new()
                .on("[0xEE 0x88]", ack)
                .on(
                    "[0xEFr:6]",
                    "RX: 0x70 ACK 0x6B ACK 0x43 ACK 0x67 ACK 0x18 ACK 0xFC NACK\r\nI2C> ",
                )
                .on("[0xEE 0xF4 0x55]", ack)
                .on("[0xEE 0xF4]", ack)
                .on("[0xEFr:1]", "RX: 0x54 NACK\r\n3.30V 3.30V GND\r\nI2C> ")
                .on("[0xEE 0xF7]", ack)
                .on(
                    "[0xEFr:8]",
                    "RX: 0x50 ACK 0x00 ACK 0x00 ACK 0x7E ACK 0xED ACK 0x00 ACK 0x80 ACK 0x00 NACK\r\nI2C> ",
                ),
        );
        let mut sensor = Bme280::new(bp);

        sensor.read_calibration().unwrap();
        let temperature = sensor.measure(&mut NoopDelay::new()).unwrap();
        assert_eq!(temperature.to_string(), "25.08 °C");
    }
}
