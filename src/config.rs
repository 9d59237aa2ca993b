//! Centralized configuration for the handle monitor.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - MonitorConfig::from_env() reads the HANDLEMON_* variables; fluent with_* setters override.
//!
//! Defaults:
//! - enabled = false (monitoring is opt-in for LocalFileSystem)
//! - backtrace = env (std Backtrace::capture, honours RUST_BACKTRACE / RUST_LIB_BACKTRACE)
//! - dump_level = info
//! - block_busy_ops = false (busy delete/rename is only reported, not refused)

use log::Level;
use std::fmt;
use std::str::FromStr;

/// How the creation context of a stream captures its call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BacktraceMode {
    /// No backtrace (thread/time/id are still recorded).
    Off,
    /// `Backtrace::capture()`: only when RUST_BACKTRACE/RUST_LIB_BACKTRACE enable it.
    Env,
    /// `Backtrace::force_capture()` on every open.
    Always,
}

impl FromStr for BacktraceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" | "false" | "no" => Ok(Self::Off),
            "env" => Ok(Self::Env),
            "always" | "1" | "true" | "yes" | "on" => Ok(Self::Always),
            other => Err(format!("unknown backtrace mode '{other}' (off|env|always)")),
        }
    }
}

impl fmt::Display for BacktraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Env => "env",
            Self::Always => "always",
        };
        f.write_str(s)
    }
}

/// Top-level configuration for the monitor and the host filesystem.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Whether LocalFileSystem::new creates a monitor at all.
    /// Env: HANDLEMON_ENABLED (default false; "1|true|on|yes" => true)
    pub enabled: bool,

    /// Creation-context stack capture.
    /// Env: HANDLEMON_BACKTRACE = off|env|always (default env)
    pub backtrace: BacktraceMode,

    /// Level used for dump output.
    /// Env: HANDLEMON_DUMP_LEVEL = error|warn|info|debug|trace (default info)
    pub dump_level: Level,

    /// Refuse delete/rename of files that still have open streams.
    /// Env: HANDLEMON_BLOCK_BUSY (default false)
    pub block_busy_ops: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backtrace: BacktraceMode::Env,
            dump_level: Level::Info,
            block_busy_ops: false,
        }
    }
}

fn parse_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl MonitorConfig {
    /// Load configuration from HANDLEMON_* environment variables.
    /// Unparsable values keep the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("HANDLEMON_ENABLED") {
            cfg.enabled = parse_flag(&v);
        }

        if let Ok(v) = std::env::var("HANDLEMON_BACKTRACE") {
            if let Ok(mode) = v.parse::<BacktraceMode>() {
                cfg.backtrace = mode;
            }
        }

        if let Ok(v) = std::env::var("HANDLEMON_DUMP_LEVEL") {
            if let Ok(lvl) = v.trim().parse::<Level>() {
                cfg.dump_level = lvl;
            }
        }

        if let Ok(v) = std::env::var("HANDLEMON_BLOCK_BUSY") {
            cfg.block_busy_ops = parse_flag(&v);
        }

        cfg
    }

    // Fluent setters (builder-style) to override specific fields.

    pub fn with_enabled(mut self, on: bool) -> Self {
        self.enabled = on;
        self
    }

    pub fn with_backtrace(mut self, mode: BacktraceMode) -> Self {
        self.backtrace = mode;
        self
    }

    pub fn with_dump_level(mut self, level: Level) -> Self {
        self.dump_level = level;
        self
    }

    /// Refuse (instead of only reporting) delete/rename of busy files.
    pub fn with_block_busy_ops(mut self, on: bool) -> Self {
        self.block_busy_ops = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MonitorConfig {{ \
             enabled: {}, \
             backtrace: {}, \
             dump_level: {}, \
             block_busy_ops: {} \
             }}",
            self.enabled, self.backtrace, self.dump_level, self.block_busy_ops,
        )
    }
}
