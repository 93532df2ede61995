use nalgebra::Vector3;

/// Direct form 1 biquad section, applied per axis to a vector signal.
pub struct Biquad {
	b: (f64, f64, f64),
	a: (f64, f64),
	input_state: (Vector3<f64>, Vector3<f64>),
	output_state: (Vector3<f64>, Vector3<f64>),
}

impl Biquad {
	/// Low-pass section with the given cutoff frequency and quality factor,
	/// for a signal sampled at `sample_rate` Hz.
	pub fn low_pass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
		let omega = 2.0 * std::f64::consts::PI * cutoff / sample_rate;

		let omega_s = omega.sin();
		let omega_c = omega.cos();
		let alpha = omega_s / (2.0 * q);

		let a0 = 1.0 + alpha;

		Biquad {
			b: (
				(1.0 - omega_c) * 0.5 / a0,
				(1.0 - omega_c) / a0,
				(1.0 - omega_c) * 0.5 / a0,
			),
			a: (-2.0 * omega_c / a0, (1.0 - alpha) / a0),
			input_state: (Vector3::zeros(), Vector3::zeros()),
			output_state: (Vector3::zeros(), Vector3::zeros()),
		}
	}

	pub fn update(&mut self, input: Vector3<f64>) -> Vector3<f64> {
		let output = input.scale(self.b.0)
			+ self.input_state.0.scale(self.b.1)
			+ self.input_state.1.scale(self.b.2)
			- self.output_state.0.scale(self.a.0)
			- self.output_state.1.scale(self.a.1);

		self.input_state = (input, self.input_state.0);
		self.output_state = (output, self.output_state.0);

		output
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn low_pass_has_unit_dc_gain() {
		let mut filter = Biquad::low_pass(20.0, 0.5, 100.0);

		let input = Vector3::new(1.0, -2.0, 0.5);

		let mut output = Vector3::zeros();
		for _ in 0..500 {
			output = filter.update(input);
		}

		assert!((output - input).norm() < 1e-6, "settled at {:?}", output);
	}

	#[test]
	fn low_pass_attenuates_alternating_signal() {
		let mut filter = Biquad::low_pass(5.0, 0.5, 100.0);

		// Nyquist-rate alternation, far above the cutoff
		let mut peak: f64 = 0.0;
		for i in 0..500 {
			let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
			let output = filter.update(Vector3::new(sign, 0.0, 0.0));
			if i > 100 {
				peak = peak.max(output[0].abs());
			}
		}

		assert!(peak < 0.1, "high-frequency peak {} not attenuated", peak);
	}
}
