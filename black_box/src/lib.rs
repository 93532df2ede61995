#[macro_use]
extern crate lazy_static;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::{
	collections::VecDeque,
	error::Error,
	fs::{File, OpenOptions},
	io::Write,
	thread,
	thread::JoinHandle,
	time::{Duration, Instant},
};

lazy_static! {
	static ref BLACK_BOX_CHANNEL: (Sender<Message>, Receiver<Message>) = unbounded::<Message>();
	static ref BLACK_BOX_LOGGER: BlackBoxLogger = BlackBoxLogger {
		start_instant: Instant::now()
	};
}

enum Message {
	Log(String),
	Flush,
}

/// Buffered flight-recorder sink for the `log` facade: every record goes to
/// stdout and to a timestamped log file, drained on a dedicated thread so
/// the emitting threads never block on disk.
pub struct BlackBox {
	file: File,
	buffer: VecDeque<String>,
	last_flush_instant: Instant,
}

impl BlackBox {
	const MAX_BUFFER_LEN: usize = 8;

	pub fn new() -> Self {
		let log_file_name = format!(
			"headtracker_{}.log",
			chrono::offset::Local::now().format("%Y-%m-%d_%H-%M-%S")
		);

		BlackBox {
			buffer: VecDeque::<String>::new(),
			file: OpenOptions::new()
				.write(true)
				.create(true)
				.truncate(true)
				.open(log_file_name)
				.unwrap(),
			last_flush_instant: Instant::now(),
		}
	}

	fn try_flush(&mut self) {
		match self.flush() {
			Ok(()) => self.last_flush_instant = Instant::now(),
			Err(e) => {
				self.buffer
					.push_back(format!("Failed to flush black box: {}", e));
			}
		}
	}

	fn flush(&mut self) -> Result<(), Box<dyn Error>> {
		while let Some(message) = self.buffer.pop_front() {
			println!("{}", message);
			writeln!(self.file, "{}", message)?;
		}
		Ok(())
	}

	fn receive_loop(&mut self) {
		const RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);

		while let Ok(message) = BLACK_BOX_CHANNEL.1.recv_timeout(RECEIVE_TIMEOUT) {
			match message {
				Message::Log(content) => self.buffer.push_back(content),
				Message::Flush => self.try_flush(),
			}

			if self.buffer.len() > Self::MAX_BUFFER_LEN {
				self.try_flush();
			}
		}

		if !self.buffer.is_empty() {
			self.try_flush();
		}
	}

	pub fn spawn(mut self, level_filter: LevelFilter) -> JoinHandle<()> {
		log::set_logger(&*BLACK_BOX_LOGGER)
			.map(|()| log::set_max_level(level_filter))
			.unwrap();

		thread::spawn(move || loop {
			self.receive_loop()
		})
	}
}

/// A `Log` implementation that timestamps records against process start and
/// appends the call site for errors.
struct BlackBoxLogger {
	start_instant: Instant,
}

impl Log for BlackBoxLogger {
	fn enabled(&self, _: &Metadata) -> bool {
		true
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			let formatted = {
				if record.metadata().level() == Level::Error {
					format!(
						"[{:.3}][{:?}][{}] {} ({:?}:{:?})",
						(Instant::now() - self.start_instant).as_secs_f32(),
						record.level(),
						record.module_path_static().unwrap_or("unknown"),
						record.args(),
						record.file_static().unwrap_or("unknown"),
						record.line().unwrap_or(0)
					)
				} else {
					format!(
						"[{:.3}][{:?}][{}] {}",
						(Instant::now() - self.start_instant).as_secs_f32(),
						record.level(),
						record.module_path_static().unwrap_or("unknown"),
						record.args(),
					)
				}
			};
			BLACK_BOX_CHANNEL.0.send(Message::Log(formatted)).unwrap();
		}
	}

	fn flush(&self) {
		BLACK_BOX_CHANNEL.0.send(Message::Flush).unwrap();
	}
}
