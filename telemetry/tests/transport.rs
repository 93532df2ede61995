use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use telemetry::{Frame, Link, PrimaryLink, RollPitchYaw, TransportManager, TransportMode};

const WATCHDOG_PERIOD: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Clone, Default)]
struct LinkProbe {
	lines: Arc<Mutex<Vec<String>>>,
	connected: Arc<AtomicBool>,
	connectable: Arc<AtomicBool>,
	reconnect_attempts: Arc<AtomicUsize>,
}

impl LinkProbe {
	fn lines(&self) -> Vec<String> {
		self.lines.lock().unwrap().clone()
	}

	fn lines_with_prefix(&self, prefix: &str) -> Vec<String> {
		self.lines()
			.into_iter()
			.filter(|line| line.starts_with(prefix))
			.collect()
	}

	fn reconnect_attempts(&self) -> usize {
		self.reconnect_attempts.load(Ordering::SeqCst)
	}
}

struct ScriptedPrimary {
	probe: LinkProbe,
}

impl Link for ScriptedPrimary {
	fn label(&self) -> &'static str {
		"wifi"
	}

	fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
		self.probe.lines.lock().unwrap().push(line.to_string());
		Ok(())
	}
}

impl PrimaryLink for ScriptedPrimary {
	fn establish(&mut self, _timeout: Duration) -> bool {
		self.try_reconnect()
	}

	fn is_connected(&self) -> bool {
		self.probe.connected.load(Ordering::SeqCst)
	}

	fn try_reconnect(&mut self) -> bool {
		self.probe.reconnect_attempts.fetch_add(1, Ordering::SeqCst);

		let up = self.probe.connectable.load(Ordering::SeqCst);
		self.probe.connected.store(up, Ordering::SeqCst);
		up
	}
}

struct ScriptedFallback {
	probe: LinkProbe,
}

impl Link for ScriptedFallback {
	fn label(&self) -> &'static str {
		"serial"
	}

	fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
		self.probe.lines.lock().unwrap().push(line.to_string());
		Ok(())
	}
}

fn scripted_manager(
	primary_up: bool,
) -> (
	TransportManager<ScriptedPrimary, ScriptedFallback>,
	LinkProbe,
	LinkProbe,
	Instant,
) {
	let primary_probe = LinkProbe::default();
	primary_probe.connectable.store(primary_up, Ordering::SeqCst);

	let fallback_probe = LinkProbe::default();

	let start = Instant::now();
	let manager = TransportManager::establish(
		ScriptedPrimary {
			probe: primary_probe.clone(),
		},
		ScriptedFallback {
			probe: fallback_probe.clone(),
		},
		CONNECT_TIMEOUT,
		WATCHDOG_PERIOD,
		start,
	);

	(manager, primary_probe, fallback_probe, start)
}

#[test]
fn startup_announces_the_primary_link() {
	let (manager, primary, fallback, _) = scripted_manager(true);

	assert_eq!(manager.mode(), TransportMode::UsingPrimary);
	assert_eq!(primary.lines(), vec!["TRANSPORT,wifi\n"]);
	assert!(fallback.lines().is_empty());
}

#[test]
fn startup_falls_back_when_primary_never_comes_up() {
	let (manager, primary, fallback, _) = scripted_manager(false);

	assert_eq!(manager.mode(), TransportMode::UsingFallback);
	assert!(primary.lines().is_empty());
	assert_eq!(fallback.lines(), vec!["TRANSPORT,serial\n"]);
}

#[test]
fn watchdog_fails_over_within_one_period() {
	let (mut manager, primary, fallback, start) = scripted_manager(true);

	primary.connected.store(false, Ordering::SeqCst);

	// Between periods nothing happens
	manager.poll_watchdog(start + Duration::from_secs(1));
	assert_eq!(manager.mode(), TransportMode::UsingPrimary);
	assert!(fallback.lines().is_empty());

	manager.poll_watchdog(start + WATCHDOG_PERIOD);
	assert_eq!(manager.mode(), TransportMode::UsingFallback);
	assert_eq!(
		fallback.lines_with_prefix("TRANSPORT"),
		vec!["TRANSPORT,serial\n"]
	);
}

#[test]
fn watchdog_reconnects_an_established_primary() {
	let (mut manager, primary, fallback, start) = scripted_manager(true);

	// Drop the link, fail over
	primary.connected.store(false, Ordering::SeqCst);
	primary.connectable.store(false, Ordering::SeqCst);
	manager.poll_watchdog(start + WATCHDOG_PERIOD);
	assert_eq!(manager.mode(), TransportMode::UsingFallback);

	// Still down on the next period
	manager.poll_watchdog(start + 2 * WATCHDOG_PERIOD);
	assert_eq!(manager.mode(), TransportMode::UsingFallback);

	// Link restored: exactly one recovery announcement on the primary
	primary.connectable.store(true, Ordering::SeqCst);
	manager.poll_watchdog(start + 3 * WATCHDOG_PERIOD);
	assert_eq!(manager.mode(), TransportMode::UsingPrimary);
	assert_eq!(
		primary.lines_with_prefix("TRANSPORT"),
		vec!["TRANSPORT,wifi\n", "TRANSPORT,wifi\n"]
	);
	assert_eq!(
		fallback.lines_with_prefix("TRANSPORT"),
		vec!["TRANSPORT,serial\n"]
	);
}

#[test]
fn watchdog_never_retries_an_unestablished_primary() {
	let (mut manager, primary, _, start) = scripted_manager(false);

	let attempts_at_startup = primary.reconnect_attempts();

	for period in 1u32..6 {
		manager.poll_watchdog(start + period * WATCHDOG_PERIOD);
	}

	assert_eq!(manager.mode(), TransportMode::UsingFallback);
	assert_eq!(primary.reconnect_attempts(), attempts_at_startup);
}

#[test]
fn frames_route_through_the_active_link() {
	let (mut manager, primary, fallback, start) = scripted_manager(true);

	let euler = Frame::Euler(RollPitchYaw {
		roll: 1.0,
		pitch: -2.5,
		yaw: 180.004,
	});

	manager.send(&euler);
	assert_eq!(
		primary.lines_with_prefix("EULER"),
		vec!["EULER,1.00,-2.50,180.00\n"]
	);

	primary.connected.store(false, Ordering::SeqCst);
	primary.connectable.store(false, Ordering::SeqCst);
	manager.poll_watchdog(start + WATCHDOG_PERIOD);

	manager.send(&Frame::Status {
		imu_present: true,
		mag_present: true,
	});
	assert_eq!(
		fallback.lines_with_prefix("STATUS"),
		vec!["STATUS,1,1\n"]
	);
	assert_eq!(primary.lines_with_prefix("STATUS"), Vec::<String>::new());
}
