//! Print the BME280 temperature once a second.
use std::time::Duration;

use buspirate_bme280::Bme280;
use embedded_hal_mock::eh1::delay::StdSleep;

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Provide the serial port path as the first argument.");
        std::process::exit(1)
    };

    let mut bp = buspirate_bme280::open(&path)?.enter_i2c_mode()?;
    let found = bp.scan()?;
    println!("I2C addresses: {found:02X?}");

    let mut sensor = Bme280::new(bp);
    println!("Chip id: 0x{:02X}", sensor.chip_id()?);

    let mut delay = StdSleep::new();
    while let Err(e) = sensor.read_calibration() {
        eprintln!("Calibration read failed, retrying: {e}");
        std::thread::sleep(Duration::from_secs(1));
    }

    loop {
        match sensor.measure(&mut delay) {
            Ok(temperature) => println!("{temperature}"),
            Err(e) => eprintln!("Skipping sample: {e}"),
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}
