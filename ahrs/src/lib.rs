pub use crate::madgwick::Madgwick;
use nalgebra::{UnitQuaternion, Vector3};

mod madgwick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AhrsError {
	/// The accelerometer vector had a null norm and could not be normalized.
	NullAccelerometerNorm,
	/// The magnetometer vector had a null norm and could not be normalized.
	NullMagnetometerNorm,
	/// The integration step produced a non-finite quaternion; the previous
	/// estimate was kept.
	NonFiniteUpdate,
}

pub trait Ahrs where Self: Send + 'static {
	/// Advances the estimate by one tick. The magnetic correction term is
	/// applied only when a magnetometer vector is provided; the choice is
	/// re-evaluated on every call.
	fn update(&mut self,
			  gyroscope: &Vector3<f64>,
			  accelerometer: &Vector3<f64>,
			  magnetometer: Option<&Vector3<f64>>,
			  dt: f64) -> Result<UnitQuaternion<f64>, AhrsError>;

	fn orientation(&self) -> UnitQuaternion<f64>;

	/// Restores the identity orientation.
	fn reset(&mut self);
}

/// Roll, pitch and yaw of `q` in radians.
///
/// The pitch `asin` argument is clamped against floating-point overshoot at
/// the gimbal boundary.
pub fn euler_angles(q: &UnitQuaternion<f64>) -> (f64, f64, f64) {
	let roll = (2.0 * (q.w * q.i + q.j * q.k))
		.atan2(1.0 - 2.0 * (q.i * q.i + q.j * q.j));

	let sin_pitch = (2.0 * (q.w * q.j - q.k * q.i)).max(-1.0).min(1.0);
	let pitch = sin_pitch.asin();

	let yaw = (2.0 * (q.w * q.k + q.i * q.j))
		.atan2(1.0 - 2.0 * (q.j * q.j + q.k * q.k));

	(roll, pitch, yaw)
}
