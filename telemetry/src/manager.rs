use crate::{Frame, Link, PrimaryLink};
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportMode {
	UsingPrimary,
	UsingFallback,
}

/// Two-state link selection: prefer the primary, fall back on loss, and
/// retry the primary only if it was established at least once.
///
/// Frames are never queued or replayed; one sent during a transition may be
/// dropped, which consumers tolerate because telemetry is latest-value.
pub struct TransportManager<P: PrimaryLink, F: Link> {
	primary: P,
	fallback: F,
	mode: TransportMode,
	primary_ever_established: bool,
	watchdog_period: Duration,
	last_watchdog_instant: Instant,
}

impl<P: PrimaryLink, F: Link> TransportManager<P, F> {
	/// Brings the manager up with one bounded attempt to establish the
	/// primary link, and announces the resulting mode on the active link.
	pub fn establish(
		mut primary: P,
		fallback: F,
		connect_timeout: Duration,
		watchdog_period: Duration,
		now: Instant,
	) -> Self {
		let (mode, primary_ever_established) = if primary.establish(connect_timeout) {
			info!(target: "transport", "Primary link ({}) established", primary.label());
			(TransportMode::UsingPrimary, true)
		} else {
			warn!(
				target: "transport",
				"Primary link failed to establish, using {}",
				fallback.label()
			);
			(TransportMode::UsingFallback, false)
		};

		let mut manager = TransportManager {
			primary,
			fallback,
			mode,
			primary_ever_established,
			watchdog_period,
			last_watchdog_instant: now,
		};

		manager.announce_mode();
		manager
	}

	pub fn mode(&self) -> TransportMode {
		self.mode
	}

	pub fn active_label(&self) -> &'static str {
		match self.mode {
			TransportMode::UsingPrimary => self.primary.label(),
			TransportMode::UsingFallback => self.fallback.label(),
		}
	}

	/// Periodic link supervision; a cheap no-op between periods.
	pub fn poll_watchdog(&mut self, now: Instant) {
		if now.duration_since(self.last_watchdog_instant) < self.watchdog_period {
			return;
		}
		self.last_watchdog_instant = now;

		match self.mode {
			TransportMode::UsingPrimary => {
				if !self.primary.is_connected() {
					warn!(
						target: "transport",
						"Primary link lost, switching to {}",
						self.fallback.label()
					);
					self.mode = TransportMode::UsingFallback;
					self.announce_mode();
				}
			}
			TransportMode::UsingFallback => {
				// A primary that never came up is not retried: there is
				// nothing configured to reconnect to.
				if self.primary_ever_established && self.primary.try_reconnect() {
					info!(
						target: "transport",
						"Primary link ({}) recovered",
						self.primary.label()
					);
					self.mode = TransportMode::UsingPrimary;
					self.announce_mode();
				}
			}
		}
	}

	/// Sends a frame through the active link. A failed write is logged and
	/// the frame dropped.
	pub fn send(&mut self, frame: &Frame) {
		let line = format!("{}\n", frame);

		let result = match self.mode {
			TransportMode::UsingPrimary => self.primary.send_line(&line),
			TransportMode::UsingFallback => self.fallback.send_line(&line),
		};

		if let Err(e) = result {
			error!(target: "transport", "Failed to send {}: {}", frame, e);
		}
	}

	fn announce_mode(&mut self) {
		let label = self.active_label();
		self.send(&Frame::TransportMode(label));
	}
}
