//! Centralized logging configuration for the tile compiler.
//!
//! Every component logs through [`log()`] with a [`LogCategory`] and a
//! [`LogLevel`]. Filtering happens here, before the message is even built, so
//! chatty allocation traces cost nothing when disabled.
//!
//! # Architecture
//!
//! - **LogConfig**: Thread-safe global configuration using atomic operations
//! - **LogLevel**: Hierarchical log levels (Off < Error < Warn < Info < Debug < Trace)
//! - **LogCategory**: Registry, Allocation, Materialize, Manifest, CodeGen
//! - **log()**: Common logging function; forwards to the `log` facade and,
//!   optionally, to a log file written by a background thread
//!
//! # Usage
//!
//! ```rust
//! use vramc_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Allocation, LogLevel::Debug, || {
//!     format!("slot {} taken, trying next", 5)
//! });
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Mutex;
use std::thread;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }

    /// Matching `log` crate level, `None` for `Off`.
    pub fn to_log_level(self) -> Option<::log::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(::log::Level::Error),
            LogLevel::Warn => Some(::log::Level::Warn),
            LogLevel::Info => Some(::log::Level::Info),
            LogLevel::Debug => Some(::log::Level::Debug),
            LogLevel::Trace => Some(::log::Level::Trace),
        }
    }
}

/// Log category for the compiler's components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Tile registration and deduplication
    Registry,
    /// Slot placement (collisions and pairs)
    Allocation,
    /// Copying tiles into tile memory
    Materialize,
    /// Manifest loading and validation
    Manifest,
    /// Generated source output
    CodeGen,
}

impl LogCategory {
    pub const ALL: [LogCategory; 5] = [
        LogCategory::Registry,
        LogCategory::Allocation,
        LogCategory::Materialize,
        LogCategory::Manifest,
        LogCategory::CodeGen,
    ];

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "registry" => Some(LogCategory::Registry),
            "allocation" | "alloc" => Some(LogCategory::Allocation),
            "materialize" => Some(LogCategory::Materialize),
            "manifest" => Some(LogCategory::Manifest),
            "codegen" => Some(LogCategory::CodeGen),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// `log` target used when forwarding messages
    pub fn target(self) -> &'static str {
        match self {
            LogCategory::Registry => "vramc::registry",
            LogCategory::Allocation => "vramc::allocation",
            LogCategory::Materialize => "vramc::materialize",
            LogCategory::Manifest => "vramc::manifest",
            LogCategory::CodeGen => "vramc::codegen",
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    /// Global log level (applies to all categories unless overridden)
    global_level: AtomicU8,
    /// Per-category overrides, indexed by `LogCategory`
    category_levels: [AtomicU8; 5],
    /// Channel for sending log messages to the file writer thread
    log_sender: Mutex<Option<Sender<String>>>,
    /// Flag indicating if logging to file is enabled
    file_logging_enabled: AtomicBool,
}

impl LogConfig {
    /// Create a new LogConfig with all logging disabled
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: [
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
            ],
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    /// Set the global log level (applies to all categories unless overridden)
    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    /// Set log level for a specific category
    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// Check if a message should be logged for the given category and level
    ///
    /// A category level other than `Off` wins; otherwise the global level
    /// decides.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Also append every emitted message to `path`.
    ///
    /// Writing happens on a background thread. Calling this again replaces
    /// the previous file; the old writer exits once its sender is dropped.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    // A failing log file must not abort the build
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        if let Ok(mut log_sender) = self.log_sender.lock() {
            *log_sender = Some(sender);
        }
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop logging to file
    pub fn clear_log_file(&self) {
        if let Ok(mut log_sender) = self.log_sender.lock() {
            *log_sender = None;
        }
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, category: LogCategory, level: LogLevel, message: &str) {
        if let Some(level) = level.to_log_level() {
            ::log::log!(target: category.target(), level, "{}", message);
        }

        if self.file_logging_enabled.load(Ordering::Relaxed) {
            if let Ok(log_sender) = self.log_sender.lock() {
                if let Some(sender) = log_sender.as_ref() {
                    let _ = sender.send(format!("[{:?}] {}", category, message));
                }
            }
        }
    }
}

/// Log a message with the specified category and level
///
/// The message is lazily evaluated via a closure, so formatting only happens
/// when logging is enabled for the given category and level.
///
/// ```rust
/// use vramc_core::logging::{log, LogCategory, LogLevel};
///
/// log(LogCategory::Registry, LogLevel::Trace, || {
///     format!("registered tile #{}", 3)
/// });
/// ```
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if config.should_log(category, level) {
        let message = message_fn();
        config.write_message(category, level, &message);
    }
}
