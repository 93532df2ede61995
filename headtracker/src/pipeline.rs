use crate::calibration::MagCalibration;
use crate::headtracker_config::HeadTrackerConfig;
use crate::health::HealthMonitor;
use crate::sensors::{SensorBus, SensorSample};
use ahrs::{Ahrs, Madgwick};
use crossbeam_channel::Receiver;
use dsp::{Biquad, EulerEma};
use nalgebra::Vector3;
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use telemetry::{Frame, Link, PrimaryLink, RollPitchYaw, TransportManager};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
	Stop,
	/// Resets the orientation estimate and the smoothing state to identity.
	Recenter,
}

/// The fusion-and-streaming loop: one cooperative execution context owning
/// every piece of mutable state, so no locking is needed anywhere.
pub struct Pipeline<B: SensorBus, P: PrimaryLink, F: Link> {
	bus: B,
	transport: TransportManager<P, F>,
	health: HealthMonitor,
	filter: Madgwick,
	smoother: EulerEma,
	mag_calibration: MagCalibration,
	acc_low_pass: Biquad,
	gyr_low_pass: Biquad,
	sample_period: Duration,
	diagnostics_period: Duration,
	last_sample_instant: Option<Instant>,
	last_diagnostics_instant: Option<Instant>,
	rejected_updates: u32,
	max_rejected_updates: u32,
}

impl<B: SensorBus, P: PrimaryLink, F: Link> Pipeline<B, P, F> {
	pub fn new(bus: B, transport: TransportManager<P, F>, config: &HeadTrackerConfig) -> Self {
		let sample_rate = 1000.0 / config.sample_period_ms as f64;

		let (acc_cutoff, acc_q) = config.filter_acc_low_pass;
		let (gyr_cutoff, gyr_q) = config.filter_gyr_low_pass;

		Pipeline {
			bus,
			transport,
			health: HealthMonitor::new(Duration::from_millis(config.health_period_ms)),
			filter: Madgwick::new(config.ahrs_madgwick_beta),
			smoother: EulerEma::new(config.ema_alpha),
			mag_calibration: MagCalibration::new(
				Vector3::new(
					config.mag_offset[0],
					config.mag_offset[1],
					config.mag_offset[2],
				),
				Vector3::new(config.mag_scale[0], config.mag_scale[1], config.mag_scale[2]),
				config.mag_units_per_count,
			),
			acc_low_pass: Biquad::low_pass(acc_cutoff, acc_q, sample_rate),
			gyr_low_pass: Biquad::low_pass(gyr_cutoff, gyr_q, sample_rate),
			sample_period: Duration::from_millis(config.sample_period_ms),
			diagnostics_period: Duration::from_millis(config.diagnostics_period_ms),
			last_sample_instant: None,
			last_diagnostics_instant: None,
			rejected_updates: 0,
			max_rejected_updates: config.max_rejected_updates,
		}
	}

	/// Runs until a `Stop` command arrives. Every periodic behavior is
	/// gated by its own elapsed-time check, in a fixed order the later
	/// checks rely on; the sleep only paces the loop.
	pub fn run(&mut self, commands: Receiver<Command>) {
		const LOOP_DELAY: Duration = Duration::from_millis(2);

		loop {
			match commands.try_recv() {
				Ok(Command::Stop) => {
					info!("Pipeline stopped");
					return;
				}
				Ok(Command::Recenter) => self.recenter(),
				Err(_) => {}
			}

			self.tick(Instant::now());

			thread::sleep(LOOP_DELAY);
		}
	}

	pub fn spawn(mut self, commands: Receiver<Command>) -> JoinHandle<()> {
		thread::spawn(move || self.run(commands))
	}

	fn recenter(&mut self) {
		info!("Recentering orientation");
		self.filter.reset();
		self.smoother.reset();
	}

	fn tick(&mut self, now: Instant) {
		self.transport.poll_watchdog(now);

		let health = self.health.poll(now, &mut self.bus, &mut self.transport);

		let sample_due = match self.last_sample_instant {
			None => true,
			Some(last) => now.duration_since(last) >= self.sample_period,
		};

		if sample_due && health.imu_present {
			let dt = match self.last_sample_instant {
				None => self.sample_period.as_secs_f64(),
				Some(last) => now.duration_since(last).as_secs_f64(),
			};
			self.last_sample_instant = Some(now);

			match self.bus.read_sample(health.mag_present) {
				Ok(sample) => self.fuse_and_send(sample, dt, now),
				Err(e) => error!(target: "sensors", "Failed to read sample: {}", e),
			}
		}
	}

	fn fuse_and_send(&mut self, sample: SensorSample, dt: f64, now: Instant) {
		let acc = self.acc_low_pass.update(sample.acc);
		let gyr = self.gyr_low_pass.update(sample.gyr);
		let mag = self.mag_calibration.correct(&sample.mag);

		// 9-axis when the magnetometer delivered data this tick, 6-axis
		// otherwise; re-decided on every sample
		match self.filter.update(&gyr, &acc, mag.as_ref(), dt) {
			Ok(orientation) => {
				self.rejected_updates = 0;

				let (roll, pitch, yaw) = ahrs::euler_angles(&orientation);
				let (roll, pitch, yaw) =
					self.smoother
						.update(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees());

				self.transport
					.send(&Frame::Euler(RollPitchYaw { roll, pitch, yaw }));

				let diagnostics_due = match self.last_diagnostics_instant {
					None => true,
					Some(last) => now.duration_since(last) >= self.diagnostics_period,
				};

				if diagnostics_due {
					self.last_diagnostics_instant = Some(now);
					debug!(
						target: "diagnostics",
						"acc=({:.2},{:.2},{:.2}) gyr=({:.2},{:.2},{:.2}) mag_valid={} rpy=({:.1},{:.1},{:.1})",
						acc.x, acc.y, acc.z,
						gyr.x, gyr.y, gyr.z,
						mag.is_some(),
						roll, pitch, yaw
					);
				}
			}
			Err(e) => {
				// The estimate is untouched and nothing is emitted for this
				// tick
				self.rejected_updates += 1;
				debug!(
					target: "fusion",
					"Update rejected: {:?} ({} in a row)",
					e,
					self.rejected_updates
				);

				if self.max_rejected_updates > 0
					&& self.rejected_updates >= self.max_rejected_updates
				{
					warn!(
						target: "fusion",
						"{} consecutive rejected updates, resetting the estimator",
						self.rejected_updates
					);
					self.recenter();
					self.rejected_updates = 0;
				}
			}
		}
	}
}
