use nalgebra::Vector3;

/// Hard- and soft-iron correction for raw magnetometer counts.
///
/// The capture tool guarantees strictly positive scales (a collapsed
/// min/max range is written out as a scale of 1), so correction never
/// divides.
#[derive(Debug, Clone)]
pub struct MagCalibration {
	offset: Vector3<f64>,
	scale: Vector3<f64>,
	units_per_count: f64,
}

impl MagCalibration {
	pub fn new(offset: Vector3<f64>, scale: Vector3<f64>, units_per_count: f64) -> Self {
		MagCalibration {
			offset,
			scale,
			units_per_count,
		}
	}

	/// Applies the affine per-axis correction.
	///
	/// An all-zero raw vector means the magnetometer produced no data this
	/// tick and yields `None`; a legitimate zero field after correction
	/// stays `Some`.
	pub fn correct(&self, raw: &Vector3<f64>) -> Option<Vector3<f64>> {
		if raw.x == 0.0 && raw.y == 0.0 && raw.z == 0.0 {
			return None;
		}

		Some(Vector3::new(
			(raw.x - self.offset.x) * self.scale.x * self.units_per_count,
			(raw.y - self.offset.y) * self.scale.y * self.units_per_count,
			(raw.z - self.offset.z) * self.scale.z * self.units_per_count,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_approx_eq::assert_approx_eq;

	fn identity() -> MagCalibration {
		MagCalibration::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), 1.0)
	}

	#[test]
	fn identity_profile_passes_values_through() {
		let raw = Vector3::new(120.0, -45.5, 3.0);

		assert_eq!(identity().correct(&raw), Some(raw));
	}

	#[test]
	fn correction_is_affine_per_axis() {
		let calibration = MagCalibration::new(
			Vector3::new(10.0, -20.0, 5.0),
			Vector3::new(1.1, 0.9, 1.0),
			100.0 / 1090.0,
		);

		let corrected = calibration.correct(&Vector3::new(120.0, 60.0, 5.0)).unwrap();

		assert_approx_eq!(corrected.x, (120.0 - 10.0) * 1.1 * 100.0 / 1090.0);
		assert_approx_eq!(corrected.y, (60.0 + 20.0) * 0.9 * 100.0 / 1090.0);
		assert_approx_eq!(corrected.z, 0.0);
	}

	#[test]
	fn all_zero_raw_vector_means_no_data() {
		assert_eq!(identity().correct(&Vector3::zeros()), None);
	}

	#[test]
	fn zero_after_correction_is_still_data() {
		let calibration = MagCalibration::new(
			Vector3::new(7.0, 7.0, 7.0),
			Vector3::new(1.0, 1.0, 1.0),
			1.0,
		);

		let corrected = calibration.correct(&Vector3::new(7.0, 7.0, 7.0));

		assert_eq!(corrected, Some(Vector3::zeros()));
	}
}
