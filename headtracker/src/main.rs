#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

use crate::headtracker_config::TryIntoLevelFilter;
use crate::pipeline::{Command, Pipeline};
use crate::sensors::{I2cSensorBus, SyntheticSensorBus};
use black_box::BlackBox;
use crossbeam_channel::unbounded;
use std::error::Error;
use std::time::{Duration, Instant};
use telemetry::{SerialLink, TransportManager, UdpLink};

mod calibration;
mod headtracker_config;
mod health;
mod pipeline;
mod sensors;

fn main() -> Result<(), Box<dyn Error>> {
	std::env::set_var("RUST_BACKTRACE", "full");

	// Command line arguments
	const SYNTHETIC_ARG: &'static str = "synthetic";
	const CONFIG_ARG: &'static str = "config";

	let args = clap::App::new("Head tracker")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Vincent Leporcher <vincent.leporcher@telecom-paris.fr>")
		.arg(clap::Arg::new(SYNTHETIC_ARG)
			.long("synthetic")
			.about("Use a synthetic sensor source instead of the I2C bus")
			.takes_value(false))
		.arg(clap::Arg::new(CONFIG_ARG)
			.long("config")
			.about("Path of the configuration file")
			.takes_value(true)
			.default_value("headtracker.json"))
		.get_matches();

	// Configuration
	let config = headtracker_config::read_or_default(args.value_of(CONFIG_ARG).unwrap())?;

	// Log
	let level_filter = config.log_level_filter
		.try_into_level_filter()
		.map_err(|_| anyhow!("Failed to parse log level filter"))?;

	BlackBox::new().spawn(level_filter);

	info!("Head tracker {}", env!("CARGO_PKG_VERSION"));

	// Transports
	let udp = UdpLink::new(
		config.udp_bind_address.parse()?,
		config.udp_peer_address.parse()?,
	);

	let serial = SerialLink::open(&config.serial_path, config.serial_baud_rate)?;

	let transport = TransportManager::establish(
		udp,
		serial,
		Duration::from_secs_f64(config.connect_timeout_s),
		Duration::from_millis(config.watchdog_period_ms),
		Instant::now(),
	);

	// Pipeline
	let (command_sender, command_receiver) = unbounded::<Command>();

	let pipeline_handle = if args.is_present(SYNTHETIC_ARG) {
		info!("Using the synthetic sensor source");
		Pipeline::new(SyntheticSensorBus::new(), transport, &config).spawn(command_receiver)
	} else {
		Pipeline::new(I2cSensorBus::new()?, transport, &config).spawn(command_receiver)
	};

	info!("Press enter to stop, r + enter to recenter");

	loop {
		let mut line = String::new();
		std::io::stdin().read_line(&mut line)?;

		match line.trim() {
			"r" => command_sender.send(Command::Recenter)?,
			_ => break,
		}
	}

	command_sender.send(Command::Stop)?;

	pipeline_handle
		.join()
		.map_err(|_| anyhow!("Pipeline thread panicked"))?;

	Ok(())
}
