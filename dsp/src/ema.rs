/// Exponential smoothing of an angle in degrees, aware of the ±180°
/// wraparound: the correction always follows the short way around, so a
/// jump from 350° to 10° moves forward through 360°, not backward.
///
/// Smaller `alpha` smooths more and lags more.
pub struct AngleEma {
	alpha: f64,
	smoothed: Option<f64>,
}

impl AngleEma {
	pub fn new(alpha: f64) -> Self {
		AngleEma {
			alpha,
			smoothed: None,
		}
	}

	pub fn update(&mut self, raw: f64) -> f64 {
		let smoothed = match self.smoothed {
			// The first sample bootstraps the state; smoothing it against an
			// implicit zero would produce a startup transient.
			None => raw,
			Some(smoothed) => {
				let mut diff = raw - smoothed;

				while diff > 180.0 {
					diff -= 360.0;
				}
				while diff < -180.0 {
					diff += 360.0;
				}

				smoothed + self.alpha * diff
			}
		};

		self.smoothed = Some(smoothed);
		smoothed
	}

	pub fn reset(&mut self) {
		self.smoothed = None;
	}
}

/// Per-axis smoothing of a roll/pitch/yaw triple.
pub struct EulerEma {
	roll: AngleEma,
	pitch: AngleEma,
	yaw: AngleEma,
}

impl EulerEma {
	pub fn new(alpha: f64) -> Self {
		EulerEma {
			roll: AngleEma::new(alpha),
			pitch: AngleEma::new(alpha),
			yaw: AngleEma::new(alpha),
		}
	}

	pub fn update(&mut self, roll: f64, pitch: f64, yaw: f64) -> (f64, f64, f64) {
		(
			self.roll.update(roll),
			self.pitch.update(pitch),
			self.yaw.update(yaw),
		)
	}

	pub fn reset(&mut self) {
		self.roll.reset();
		self.pitch.reset();
		self.yaw.reset();
	}
}
