//! Logging backend which writes to a file in the plugin folder.
//!
//! The host may already have a logger installed, in which case this backend is never set up and
//! our `log` records go wherever the host sends them.

use chrono::Local;
use eyre::{eyre, Context, Result};
use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::{mpsc, Mutex},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MessageType {
    Normal,
    Error,
    Warning,
    Debug,
}

#[derive(Debug)]
struct Message {
    module: String,
    msg_type: MessageType,
    string: String,
    time: String,
}

impl Message {
    fn from_record(record: &Record) -> Message {
        let msg_type = match record.level() {
            Level::Error => MessageType::Error,
            Level::Warn => MessageType::Warning,
            Level::Info => MessageType::Normal,
            Level::Debug | Level::Trace => MessageType::Debug,
        };

        Message {
            module: record
                .module_path()
                .and_then(|path| path.split("::").last())
                .unwrap_or("unknown")
                .to_string(),
            msg_type,
            string: format!("{}", record.args()),
            time: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        }
    }

    /// Formats the message as a log file line.
    fn line(&self) -> String {
        let level_name = match self.msg_type {
            MessageType::Normal => "info",
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Debug => "debug",
        };

        //      [date time] [module] [level] Text
        format!(
            "[{}] [{}] [{}] {}\n",
            self.time, self.module, level_name, self.string
        )
    }

    fn write_to(&self, out: &mut impl Write) {
        let _ = out.write_all(self.line().as_bytes());
    }
}

pub struct Logger;

impl Logger {
    pub fn commit(&self, record: &Record) {
        if let Some(Err(err)) = MSG_SENDER
            .get()
            .map(|s| s.lock().map(|s| s.send(Message::from_record(record))))
        {
            eprintln!("error in log sender chain: {}", err);
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.commit(record);
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;
static MSG_SENDER: OnceCell<Mutex<mpsc::Sender<Message>>> = OnceCell::new();

/// Where the crash report goes, set when the panic hook is installed.
static PANIC_REPORT_PATH: OnceCell<PathBuf> = OnceCell::new();

fn panic_report(message: &str, location: &str) -> String {
    let time = Local::now();
    let backtrace = std::backtrace::Backtrace::force_capture();

    format!(
        "PDAssist panicked while loading content.

Plugin version: {version}
Message: {message}
Location: {location}
Time: {time}
Backtrace: see below

{backtrace}",
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn install_panic_hook(report_path: PathBuf) {
    if PANIC_REPORT_PATH.set(report_path).is_err() {
        return;
    }

    // Keep whatever hook the host installed, and run it after writing our report.
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "no message".to_string());

        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());

        let report = panic_report(&message, &location);
        log::error!("{report}");

        if let Some(path) = PANIC_REPORT_PATH.get() {
            let _ = std::fs::write(path, &report);
        }

        previous(info);
    }));
}

/// Installs the file logger, writing to `path` at `level`. If `write_panic_report` is set, a
/// report is written to `PANIC.txt` next to the log whenever the plugin panics.
pub fn init(path: &Path, level: log::LevelFilter, write_panic_report: bool) -> Result<()> {
    let mut file = File::create(path).wrap_err_with(|| format!("creating log file {:?}", path))?;

    let (sender, receiver) = mpsc::channel::<Message>();

    MSG_SENDER
        .set(Mutex::new(sender))
        .map_err(|_| eyre!("logging has already been initialised"))?;

    log::set_logger(&LOGGER).map_err(|err| eyre!("a logger is already installed: {}", err))?;
    log::set_max_level(level);

    if write_panic_report {
        install_panic_hook(path.with_file_name("PANIC.txt"));
    }

    // Write on a background thread so that loading content isn't slowed down by file I/O. The
    // thread ends when the sender is dropped.
    std::thread::spawn(move || {
        for msg in receiver {
            msg.write_to(&mut file);
        }
    });

    Ok(())
}
