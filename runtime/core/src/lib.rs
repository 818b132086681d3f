// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Utilities for service programs which add user-defined control elements to ALSA control
//! character device and dispatch events for them.

pub mod card_cntr;
pub mod cmdline;
pub mod dispatcher;
pub mod elem_value_accessor;

use {clap::ValueEnum, glib::Error, tracing::Level};

/// The level to debug runtime.
#[derive(ValueEnum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogLevel {
    Debug,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Debug
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
        }
    }
}

/// Install the subscriber to format events up to the level. Nothing is printed without level.
pub fn init_tracing(log_level: Option<LogLevel>) {
    if let Some(level) = log_level {
        tracing_subscriber::fmt()
            .with_max_level(Level::from(level))
            .init();
    }
}

/// The operations of runtime, called in the order of new, listen, and run.
pub trait RuntimeOperation<T>: Sized {
    fn new(arg: T, log_level: Option<LogLevel>) -> Result<Self, Error>;
    fn listen(&mut self) -> Result<(), Error>;
    fn run(&mut self) -> Result<(), Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_level_to_tracing_level() {
        assert_eq!(Level::from(LogLevel::default()), Level::DEBUG);
    }
}
