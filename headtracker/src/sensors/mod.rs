use nalgebra::Vector3;

pub use i2c_bus::I2cSensorBus;
pub use synthetic::SyntheticSensorBus;

pub mod i2c_bus;
pub mod synthetic;

/// One tick worth of inertial data: gyroscope in rad/s, accelerometer in g
/// (the fusion filter only uses its direction), magnetometer in raw counts
/// pending calibration. An all-zero magnetometer vector means no data.
#[derive(Debug, Clone)]
pub struct SensorSample {
	pub gyr: Vector3<f64>,
	pub acc: Vector3<f64>,
	pub mag: Vector3<f64>,
}

/// Access to the inertial peripherals. Bring-up (register configuration,
/// ranges, power management) is assumed done before the pipeline starts.
pub trait SensorBus
where
	Self: Send + 'static,
{
	fn probe_imu(&mut self) -> bool;

	fn probe_mag(&mut self) -> bool;

	/// Reads one sample. The magnetometer is only touched when
	/// `include_mag` is set; otherwise the sample carries the all-zero
	/// no-data vector.
	fn read_sample(&mut self, include_mag: bool) -> anyhow::Result<SensorSample>;
}
