#![allow(non_snake_case)]
#![allow(clippy::many_single_char_names)]

use crate::{Ahrs, AhrsError};
use nalgebra::{Matrix4, Matrix6, Quaternion, UnitQuaternion, Vector2, Vector3, Vector4, Vector6};

/// Gradient-descent attitude filter. `beta` trades responsiveness against
/// noise rejection.
#[derive(Debug)]
pub struct Madgwick {
	beta: f64,
	quaternion: Quaternion<f64>,
}

impl Madgwick {
	pub fn new(beta: f64) -> Self {
		Madgwick::with_quaternion(beta, Quaternion::new(1.0, 0.0, 0.0, 0.0))
	}

	pub fn with_quaternion(beta: f64, quaternion: Quaternion<f64>) -> Self {
		Madgwick { beta, quaternion }
	}

	pub fn quaternion(&self) -> &Quaternion<f64> {
		&self.quaternion
	}

	/// 9-axis update: gravity and magnetic field direction both contribute
	/// to the corrective step.
	pub fn update_marg(
		&mut self,
		gyroscope: &Vector3<f64>,
		accelerometer: &Vector3<f64>,
		magnetometer: &Vector3<f64>,
		dt: f64,
	) -> Result<UnitQuaternion<f64>, AhrsError> {
		let q = self.quaternion;

		// Normalize accelerometer measurement
		let accel = accelerometer
			.try_normalize(0.0)
			.ok_or(AhrsError::NullAccelerometerNorm)?;

		// Normalize magnetometer measurement
		let mag = magnetometer
			.try_normalize(0.0)
			.ok_or(AhrsError::NullMagnetometerNorm)?;

		// Reference direction of Earth's magnetic field
		let h = q * (Quaternion::from_parts(0.0, mag) * q.conjugate());
		let b = Quaternion::new(0.0, Vector2::new(h[0], h[1]).norm(), 0.0, h[2]);

		// Objective function comparing measured directions against the ones
		// predicted by the current quaternion
		#[rustfmt::skip]
		let F = Vector6::new(
			2.0 * (q[0] * q[2] - q[3] * q[1]) - accel[0],
			2.0 * (q[3] * q[0] + q[1] * q[2]) - accel[1],
			2.0 * (0.5 - q[0] * q[0] - q[1] * q[1]) - accel[2],
			2.0 * b[0] * (0.5 - q[1] * q[1] - q[2] * q[2]) + 2.0 * b[2] * (q[0] * q[2] - q[3] * q[1]) - mag[0],
			2.0 * b[0] * (q[0] * q[1] - q[3] * q[2]) + 2.0 * b[2] * (q[3] * q[0] + q[1] * q[2]) - mag[1],
			2.0 * b[0] * (q[3] * q[1] + q[0] * q[2]) + 2.0 * b[2] * (0.5 - q[0] * q[0] - q[1] * q[1]) - mag[2],
		);

		#[rustfmt::skip]
		let J_t = Matrix6::new(
			-2.0 * q[1], 2.0 * q[0], 0.0, -2.0 * b[2] * q[1], -2.0 * b[0] * q[2] + 2.0 * b[2] * q[0], 2.0 * b[0] * q[1],
			2.0 * q[2], 2.0 * q[3], -4.0 * q[0], 2.0 * b[2] * q[2], 2.0 * b[0] * q[1] + 2.0 * b[2] * q[3], 2.0 * b[0] * q[2] - 4.0 * b[2] * q[0],
			-2.0 * q[3], 2.0 * q[2], -4.0 * q[1], -4.0 * b[0] * q[1] - 2.0 * b[2] * q[3], 2.0 * b[0] * q[0] + 2.0 * b[2] * q[2], 2.0 * b[0] * q[3] - 4.0 * b[2] * q[1],
			2.0 * q[0], 2.0 * q[1], 0.0, -4.0 * b[0] * q[2] + 2.0 * b[2] * q[0], -2.0 * b[0] * q[3] + 2.0 * b[2] * q[1], 2.0 * b[0] * q[0],
			0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
			0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
		);

		let gradient = J_t * F;

		self.integrate(
			gyroscope,
			Vector4::new(gradient[0], gradient[1], gradient[2], gradient[3]),
			dt,
		)
	}

	/// 6-axis update: magnetic correction term dropped.
	pub fn update_imu(
		&mut self,
		gyroscope: &Vector3<f64>,
		accelerometer: &Vector3<f64>,
		dt: f64,
	) -> Result<UnitQuaternion<f64>, AhrsError> {
		let q = self.quaternion;

		// Normalize accelerometer measurement
		let accel = accelerometer
			.try_normalize(0.0)
			.ok_or(AhrsError::NullAccelerometerNorm)?;

		#[rustfmt::skip]
		let F = Vector4::new(
			2.0 * (q[0] * q[2] - q[3] * q[1]) - accel[0],
			2.0 * (q[3] * q[0] + q[1] * q[2]) - accel[1],
			2.0 * (0.5 - q[0] * q[0] - q[1] * q[1]) - accel[2],
			0.0,
		);

		#[rustfmt::skip]
		let J_t = Matrix4::new(
			-2.0 * q[1], 2.0 * q[0], 0.0, 0.0,
			2.0 * q[2], 2.0 * q[3], -4.0 * q[0], 0.0,
			-2.0 * q[3], 2.0 * q[2], -4.0 * q[1], 0.0,
			2.0 * q[0], 2.0 * q[1], 0.0, 0.0,
		);

		self.integrate(gyroscope, J_t * F, dt)
	}

	fn integrate(
		&mut self,
		gyroscope: &Vector3<f64>,
		gradient: Vector4<f64>,
		dt: f64,
	) -> Result<UnitQuaternion<f64>, AhrsError> {
		let q = self.quaternion;

		// Rate of change of quaternion from the gyroscope, with the
		// normalized gradient as the corrective step. A null gradient means
		// the measurements already agree with the estimate and contributes
		// nothing.
		let mut q_dot = q * Quaternion::from_parts(0.0, *gyroscope) * 0.5;

		if let Some(step) = gradient.try_normalize(0.0) {
			q_dot = q_dot - Quaternion::new(step[0], step[1], step[2], step[3]) * self.beta;
		}

		// Integrate to yield quaternion
		let candidate = (q + q_dot * dt).normalize();

		// A diverged update is rejected and the previous estimate kept as is.
		if !(candidate.w.is_finite()
			&& candidate.i.is_finite()
			&& candidate.j.is_finite()
			&& candidate.k.is_finite())
		{
			return Err(AhrsError::NonFiniteUpdate);
		}

		self.quaternion = candidate;

		Ok(UnitQuaternion::from_quaternion(candidate))
	}
}

impl Ahrs for Madgwick {
	fn update(
		&mut self,
		gyroscope: &Vector3<f64>,
		accelerometer: &Vector3<f64>,
		magnetometer: Option<&Vector3<f64>>,
		dt: f64,
	) -> Result<UnitQuaternion<f64>, AhrsError> {
		match magnetometer {
			// A null magnetic vector carries no heading information: fall
			// back to the 6-axis update rather than fail normalization.
			Some(mag) if mag.norm_squared() != 0.0 => {
				self.update_marg(gyroscope, accelerometer, mag, dt)
			}
			_ => self.update_imu(gyroscope, accelerometer, dt),
		}
	}

	fn orientation(&self) -> UnitQuaternion<f64> {
		UnitQuaternion::from_quaternion(self.quaternion)
	}

	fn reset(&mut self) {
		self.quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);
	}
}
