// ServeSense - ICM-20600 IMU Driver
//
// Register-level driver over I2C.  The register map is MPU-6050 compatible.

use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::controller::SensorSource;
use crate::events::SensorData;

// ICM-20600 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 14-byte sensor burst
const REG_WHO_AM_I: u8 = 0x75;

pub struct Icm20600<'d> {
    bus: I2cDriver<'d>,
}

impl<'d> Icm20600<'d> {
    pub fn new(bus: I2cDriver<'d>) -> Self {
        Self { bus }
    }

    /// Wake the sensor (PLL clock) and configure accel ±2 g, gyro ±250 °/s.
    /// Returns the WHO_AM_I value.
    pub fn init(&mut self) -> anyhow::Result<u8> {
        // Wake up, clock from gyro PLL
        self.bus.write(I2C_ADDR_ICM20600, &[REG_PWR_MGMT_1, 0x01], I2C_TIMEOUT_TICKS)?;
        std::thread::sleep(std::time::Duration::from_millis(50));

        // Accelerometer: ±2 g
        self.bus.write(I2C_ADDR_ICM20600, &[REG_ACCEL_CONFIG, 0x00], I2C_TIMEOUT_TICKS)?;

        // Gyroscope: ±250 °/s
        self.bus.write(I2C_ADDR_ICM20600, &[REG_GYRO_CONFIG, 0x00], I2C_TIMEOUT_TICKS)?;
        std::thread::sleep(std::time::Duration::from_millis(10));

        let mut who = [0u8; 1];
        self.bus
            .write_read(I2C_ADDR_ICM20600, &[REG_WHO_AM_I], &mut who, I2C_TIMEOUT_TICKS)?;

        log::info!("ICM-20600 ready (WHO_AM_I=0x{:02X}, ±2g, ±250°/s)", who[0]);
        Ok(who[0])
    }

    /// Burst-read all 6 axes and convert to physical units.
    pub fn read_data(&mut self) -> anyhow::Result<SensorData> {
        let mut raw = [0u8; 14];
        self.bus.write_read(
            I2C_ADDR_ICM20600,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        Ok(SensorData {
            ax: i16::from_be_bytes([raw[0], raw[1]]) as f32 / ACCEL_SCALE_2G,
            ay: i16::from_be_bytes([raw[2], raw[3]]) as f32 / ACCEL_SCALE_2G,
            az: i16::from_be_bytes([raw[4], raw[5]]) as f32 / ACCEL_SCALE_2G,
            // raw[6..8] = temperature - skipped
            gx: i16::from_be_bytes([raw[8], raw[9]]) as f32 / GYRO_SCALE_250,
            gy: i16::from_be_bytes([raw[10], raw[11]]) as f32 / GYRO_SCALE_250,
            gz: i16::from_be_bytes([raw[12], raw[13]]) as f32 / GYRO_SCALE_250,
        })
    }
}

impl SensorSource for Icm20600<'_> {
    fn read(&mut self) -> anyhow::Result<SensorData> {
        self.read_data()
    }
}
