use crate::sensors::SensorBus;
use std::time::{Duration, Instant};
use telemetry::{Frame, Link, PrimaryLink, TransportManager};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HealthStatus {
	pub imu_present: bool,
	pub mag_present: bool,
}

/// Periodic presence probe for the two upstream peripherals.
///
/// Devices are probed independently of whether fusion currently uses them;
/// absence only degrades the fusion mode, it never stops the pipeline.
pub struct HealthMonitor {
	period: Duration,
	last_probe_instant: Option<Instant>,
	status: HealthStatus,
}

impl HealthMonitor {
	pub fn new(period: Duration) -> Self {
		HealthMonitor {
			period,
			last_probe_instant: None,
			status: HealthStatus::default(),
		}
	}

	/// Probes on period and emits a `STATUS` frame. Returns the (possibly
	/// refreshed) presence snapshot either way.
	pub fn poll<B: SensorBus, P: PrimaryLink, F: Link>(
		&mut self,
		now: Instant,
		bus: &mut B,
		transport: &mut TransportManager<P, F>,
	) -> HealthStatus {
		let due = match self.last_probe_instant {
			None => true,
			Some(last) => now.duration_since(last) >= self.period,
		};

		if due {
			self.last_probe_instant = Some(now);

			let status = HealthStatus {
				imu_present: bus.probe_imu(),
				mag_present: bus.probe_mag(),
			};

			if status != self.status {
				info!(
					target: "health",
					"Peripheral presence changed: imu={} mag={}",
					status.imu_present,
					status.mag_present
				);
			}

			self.status = status;

			transport.send(&Frame::Status {
				imu_present: status.imu_present,
				mag_present: status.mag_present,
			});
		}

		self.status
	}
}
