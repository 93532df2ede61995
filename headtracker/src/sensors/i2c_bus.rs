use super::{SensorBus, SensorSample};
use nalgebra::Vector3;
use rppal::i2c::I2c;

const IMU_ADDRESS: u16 = 0x68;
const IMU_WHO_AM_I_REGISTER: u8 = 0x75;
// ACCEL_XOUT_H; accelerometer, die temperature and gyroscope follow as one
// 14-byte big-endian burst
const IMU_DATA_REGISTER: u8 = 0x3b;

const MAG_ADDRESS: u16 = 0x1e;
const MAG_ID_REGISTER: u8 = 0x0a;
// Data registers hold the axes in X, Z, Y order
const MAG_DATA_REGISTER: u8 = 0x03;

// ±4 g and ±500 °/s ranges, configured at bring-up
const ACC_COUNTS_PER_G: f64 = 8192.0;
const GYR_COUNTS_PER_DPS: f64 = 65.5;

/// The real sensor head: an MPU-6500-class IMU and an HMC5883L compass on
/// the same I2C bus.
pub struct I2cSensorBus {
	i2c: I2c,
}

impl I2cSensorBus {
	pub fn new() -> anyhow::Result<Self> {
		Ok(I2cSensorBus { i2c: I2c::new()? })
	}

	fn probe(&mut self, address: u16, register: u8) -> bool {
		let mut id = [0u8; 1];

		self.i2c.set_slave_address(address).is_ok()
			&& self.i2c.write_read(&[register], &mut id).is_ok()
	}
}

impl SensorBus for I2cSensorBus {
	fn probe_imu(&mut self) -> bool {
		self.probe(IMU_ADDRESS, IMU_WHO_AM_I_REGISTER)
	}

	fn probe_mag(&mut self) -> bool {
		self.probe(MAG_ADDRESS, MAG_ID_REGISTER)
	}

	fn read_sample(&mut self, include_mag: bool) -> anyhow::Result<SensorSample> {
		let mut imu_data = [0u8; 14];
		self.i2c.set_slave_address(IMU_ADDRESS)?;
		self.i2c.write_read(&[IMU_DATA_REGISTER], &mut imu_data)?;

		let imu_word =
			|high: usize| i16::from_be_bytes([imu_data[high], imu_data[high + 1]]) as f64;

		let acc = Vector3::new(imu_word(0), imu_word(2), imu_word(4)) / ACC_COUNTS_PER_G;
		// Bytes 6..8 are the die temperature
		let gyr = Vector3::new(imu_word(8), imu_word(10), imu_word(12))
			.scale(std::f64::consts::PI / 180.0 / GYR_COUNTS_PER_DPS);

		let mag = if include_mag {
			let mut mag_data = [0u8; 6];
			self.i2c.set_slave_address(MAG_ADDRESS)?;
			self.i2c.write_read(&[MAG_DATA_REGISTER], &mut mag_data)?;

			let mag_word =
				|high: usize| i16::from_be_bytes([mag_data[high], mag_data[high + 1]]) as f64;

			Vector3::new(mag_word(0), mag_word(4), mag_word(2))
		} else {
			Vector3::zeros()
		};

		Ok(SensorSample { gyr, acc, mag })
	}
}
