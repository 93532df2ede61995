use std::io::Write;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// A channel able to carry newline-terminated telemetry lines.
pub trait Link: Send + 'static {
	/// Wire label of this link, as announced in `TRANSPORT` frames.
	fn label(&self) -> &'static str;

	fn send_line(&mut self, line: &str) -> anyhow::Result<()>;
}

/// The preferred link. Unlike the fallback it can come and go, so it also
/// reports connectivity and supports reconnection attempts.
pub trait PrimaryLink: Link {
	/// Bounded initial establishment. Returns whether the link came up
	/// before the timeout.
	fn establish(&mut self, timeout: Duration) -> bool;

	fn is_connected(&self) -> bool;

	/// A single reconnection attempt.
	fn try_reconnect(&mut self) -> bool;
}

/// Connectionless datagram channel to a fixed peer, one frame per datagram.
pub struct UdpLink {
	bind_address: SocketAddr,
	peer_address: SocketAddr,
	socket: Option<UdpSocket>,
}

impl UdpLink {
	const ESTABLISH_RETRY_DELAY: Duration = Duration::from_millis(100);

	pub fn new(bind_address: SocketAddr, peer_address: SocketAddr) -> Self {
		UdpLink {
			bind_address,
			peer_address,
			socket: None,
		}
	}

	fn connect(&mut self) -> anyhow::Result<()> {
		let socket = UdpSocket::bind(self.bind_address)?;
		socket.connect(self.peer_address)?;
		// Fire-and-forget: the pipeline must never stall on the network
		// stack.
		socket.set_nonblocking(true)?;

		self.socket = Some(socket);

		Ok(())
	}
}

impl Link for UdpLink {
	fn label(&self) -> &'static str {
		"wifi"
	}

	fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
		let socket = self
			.socket
			.as_ref()
			.ok_or_else(|| anyhow!("link is down"))?;

		match socket.send(line.as_bytes()) {
			Ok(_) => Ok(()),
			// A full socket buffer drops the frame, it does not take the
			// link down.
			Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(()),
			Err(e) => {
				self.socket = None;
				Err(e.into())
			}
		}
	}
}

impl PrimaryLink for UdpLink {
	fn establish(&mut self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;

		loop {
			if self.try_reconnect() {
				return true;
			}

			if Instant::now() >= deadline {
				return false;
			}

			std::thread::sleep(Self::ESTABLISH_RETRY_DELAY);
		}
	}

	fn is_connected(&self) -> bool {
		self.socket.is_some()
	}

	fn try_reconnect(&mut self) -> bool {
		match self.connect() {
			Ok(()) => true,
			Err(e) => {
				debug!(target: "transport", "UDP link unavailable: {}", e);
				self.socket = None;
				false
			}
		}
	}
}

/// Raw serial byte stream; the fallback, assumed always present.
pub struct SerialLink {
	port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
	pub fn open(path: &str, baud_rate: u32) -> anyhow::Result<Self> {
		let port = serialport::new(path, baud_rate)
			.timeout(Duration::from_millis(50))
			.open()?;

		Ok(SerialLink { port })
	}
}

impl Link for SerialLink {
	fn label(&self) -> &'static str {
		"serial"
	}

	fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
		self.port.write_all(line.as_bytes())?;
		// The whole line goes out before anything else writes to the port.
		self.port.flush()?;

		Ok(())
	}
}
