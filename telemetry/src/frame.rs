use crate::RollPitchYaw;
use std::fmt;
use std::fmt::{Display, Formatter};

/// One line of telemetry, in the wire format shared by every link: ASCII,
/// comma separated, tag first, newline terminated. Consumers treat frames
/// as latest-value state updates.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
	/// Active transport announcement, sent at startup and on every switch.
	TransportMode(&'static str),
	/// Peripheral presence, sent on every health probe.
	Status {
		imu_present: bool,
		mag_present: bool,
	},
	/// Smoothed orientation in degrees, sent once per valid fusion tick.
	Euler(RollPitchYaw<f64>),
}

impl Display for Frame {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Frame::TransportMode(label) => write!(f, "TRANSPORT,{}", label),
			Frame::Status {
				imu_present,
				mag_present,
			} => write!(f, "STATUS,{},{}", *imu_present as u8, *mag_present as u8),
			Frame::Euler(angles) => write!(
				f,
				"EULER,{:.2},{:.2},{:.2}",
				angles.roll, angles.pitch, angles.yaw
			),
		}
	}
}
