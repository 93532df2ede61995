use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize, Clone)]
pub struct HeadTrackerConfig {
	pub log_level_filter: String,
	pub udp_bind_address: String,
	pub udp_peer_address: String,
	pub serial_path: String,
	pub serial_baud_rate: u32,
	pub connect_timeout_s: f64,
	pub ahrs_madgwick_beta: f64,
	pub ema_alpha: f64,
	pub sample_period_ms: u64,
	pub health_period_ms: u64,
	pub watchdog_period_ms: u64,
	pub diagnostics_period_ms: u64,
	pub max_rejected_updates: u32,
	pub mag_offset: [f64; 3],
	pub mag_scale: [f64; 3],
	pub mag_units_per_count: f64,
	pub filter_acc_low_pass: (f64, f64),
	pub filter_gyr_low_pass: (f64, f64),
}

pub trait TryIntoLevelFilter {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()>;
}

impl TryIntoLevelFilter for String {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		Ok(match self.as_str() {
			"none" => LevelFilter::Off,
			"error" => LevelFilter::Error,
			"warn" => LevelFilter::Warn,
			"info" => LevelFilter::Info,
			"debug" => LevelFilter::Debug,
			"all" => LevelFilter::Trace,
			_ => return Err(()),
		})
	}
}

impl Default for HeadTrackerConfig {
	fn default() -> Self {
		HeadTrackerConfig {
			log_level_filter: String::from("info"),
			udp_bind_address: String::from("0.0.0.0:0"),
			udp_peer_address: String::from("192.168.1.100:4210"),
			serial_path: String::from("/dev/ttyAMA0"),
			serial_baud_rate: 921_600,
			connect_timeout_s: 5.0,
			ahrs_madgwick_beta: 0.1,
			ema_alpha: 0.15,
			sample_period_ms: 10,
			health_period_ms: 500,
			watchdog_period_ms: 2000,
			diagnostics_period_ms: 3000,
			max_rejected_updates: 50,
			mag_offset: [0.0, 0.0, 0.0],
			mag_scale: [1.0, 1.0, 1.0],
			// HMC5883L at the default gain: 100 / 1090 µT per count
			mag_units_per_count: 100.0 / 1090.0,
			filter_acc_low_pass: (20.0, 0.48),
			filter_gyr_low_pass: (20.0, 0.45),
		}
	}
}

/// Reads the configuration file, or falls back to the defaults when no file
/// exists at `path`. A file that exists but does not parse is an error.
pub fn read_or_default(path: &str) -> Result<HeadTrackerConfig, Box<dyn Error>> {
	if !Path::new(path).exists() {
		return Ok(HeadTrackerConfig::default());
	}

	let config_file = File::open(path)?;

	let config: HeadTrackerConfig = serde_json::from_reader(config_file)?;

	Ok(config)
}
