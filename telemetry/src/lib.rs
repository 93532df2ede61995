#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

mod frame;
mod link;
mod manager;
mod roll_pitch_yaw;

pub use frame::Frame;
pub use link::{Link, PrimaryLink, SerialLink, UdpLink};
pub use manager::{TransportManager, TransportMode};
pub use roll_pitch_yaw::RollPitchYaw;
