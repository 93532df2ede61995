use super::{SensorBus, SensorSample};
use nalgebra::Vector3;

/// Deterministic stand-in for the I2C bus: a level device with a slow roll
/// wobble and a fixed local magnetic field. Useful on a bench with no
/// hardware attached.
pub struct SyntheticSensorBus {
	tick: u64,
}

impl SyntheticSensorBus {
	const WOBBLE_PERIOD_TICKS: f64 = 400.0;
	const WOBBLE_AMPLITUDE_RAD: f64 = 0.05;
	const TICK_SECONDS: f64 = 0.01;

	pub fn new() -> Self {
		SyntheticSensorBus { tick: 0 }
	}
}

impl SensorBus for SyntheticSensorBus {
	fn probe_imu(&mut self) -> bool {
		true
	}

	fn probe_mag(&mut self) -> bool {
		true
	}

	fn read_sample(&mut self, include_mag: bool) -> anyhow::Result<SensorSample> {
		self.tick += 1;

		let phase_rate = 2.0 * std::f64::consts::PI / Self::WOBBLE_PERIOD_TICKS;
		let phase = phase_rate * self.tick as f64;

		// Gravity tilted around the x axis and the matching roll rate
		let tilt = Self::WOBBLE_AMPLITUDE_RAD * phase.sin();
		let acc = Vector3::new(0.0, tilt.sin(), tilt.cos());
		let gyr = Vector3::new(
			Self::WOBBLE_AMPLITUDE_RAD * phase.cos() * phase_rate / Self::TICK_SECONDS,
			0.0,
			0.0,
		);

		let mag = if include_mag {
			Vector3::new(200.0, 0.0, -400.0)
		} else {
			Vector3::zeros()
		};

		Ok(SensorSample { gyr, acc, mag })
	}
}
