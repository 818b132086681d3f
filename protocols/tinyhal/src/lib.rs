// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod config;
pub mod ctl;
pub mod hal;
pub mod mask;
pub mod route;
pub mod switch;

#[cfg(test)]
mod testing;

use glib::{error::ErrorDomain, Quark};

/// The error about audio routing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RouteError {
    /// The configuration resource is not available.
    ConfigNotFound,
    /// The configuration resource includes malformed markup.
    ConfigParse,
    /// Fail to read the configuration resource.
    ConfigRead,
    /// The mixer is not available.
    MixerUnavailable,
    /// The device mask is not acceptable for the direction.
    InvalidDeviceMask,
    Invalid(i32),
}

impl ErrorDomain for RouteError {
    fn domain() -> Quark {
        Quark::from_str("tinyhal-route-error-quark")
    }

    fn code(self) -> i32 {
        match self {
            Self::ConfigNotFound => 0,
            Self::ConfigParse => 1,
            Self::ConfigRead => 2,
            Self::MixerUnavailable => 3,
            Self::InvalidDeviceMask => 4,
            Self::Invalid(val) => val,
        }
    }

    fn from(code: i32) -> Option<Self> {
        let enumeration = match code {
            0 => Self::ConfigNotFound,
            1 => Self::ConfigParse,
            2 => Self::ConfigRead,
            3 => Self::MixerUnavailable,
            4 => Self::InvalidDeviceMask,
            _ => Self::Invalid(code),
        };

        Some(enumeration)
    }
}
