// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Settings of mixer control and the way to apply them.
//!
//! The sequence of settings is applied in declared order, since a write can have side effect
//! which the later write depends on; e.g. power-up before unmute. The application is best-effort
//! so that any failure at one setting does not prevent the rest from being applied.

use {
    glib::Error,
    std::fmt,
    tracing::{debug, error, warn},
};

/// The value of mixer control.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CtlValue {
    /// Written to all of sub-channels of the control.
    Int(i64),
    /// Written as the label of enumerated control.
    Label(String),
}

impl Default for CtlValue {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl CtlValue {
    /// Interpret the literal in configuration.
    ///
    /// The leading integer of the literal is parsed, then the literal is regarded as integer
    /// if the result is not zero or the literal is exactly "0". Else the literal is regarded as
    /// label. Note that the literal for label which begins with digits is regarded as integer.
    pub fn from_literal(literal: &str) -> Self {
        match parse_leading_integer(literal) {
            0 if literal != "0" => Self::Label(literal.to_string()),
            val => Self::Int(val),
        }
    }
}

impl fmt::Display for CtlValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(val) => write!(f, "{}", val),
            Self::Label(label) => write!(f, "'{}'", label),
        }
    }
}

// Leading whitespaces, optional sign, then decimal digits up to the first other character.
fn parse_leading_integer(literal: &str) -> i64 {
    let mut chars = literal
        .trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r'))
        .chars()
        .peekable();

    let negative = match chars.peek() {
        Some('-') => {
            chars.next();
            true
        }
        Some('+') => {
            chars.next();
            false
        }
        _ => false,
    };

    let magnitude = chars
        .map_while(|c| c.to_digit(10))
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(digit as i64)
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// One write to mixer control.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CtlSetting {
    /// The name of mixer control.
    pub name: String,
    pub value: CtlValue,
}

impl CtlSetting {
    pub fn new(name: &str, value: CtlValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }

    /// Instantiate with the literal of value in configuration.
    pub fn from_literal(name: &str, literal: &str) -> Self {
        Self::new(name, CtlValue::from_literal(literal))
    }
}

/// The trait for primitive operations of mixer.
pub trait MixerOperation {
    /// The handle of control.
    type Ctl;

    /// Find the control by its name.
    fn find_ctl(&mut self, name: &str) -> Option<Self::Ctl>;

    /// The number of sub-channels in the control.
    fn value_count(&mut self, ctl: &Self::Ctl) -> usize;

    /// The minimum and maximum of value in the control, if available.
    fn value_range(&mut self, ctl: &Self::Ctl) -> Option<(i64, i64)>;

    /// Write the value to the sub-channel of the control.
    fn write_value(&mut self, ctl: &Self::Ctl, index: usize, value: i64) -> Result<(), Error>;

    /// Write the value of enumerated control by the label.
    fn write_label(&mut self, ctl: &Self::Ctl, label: &str) -> Result<(), Error>;
}

/// The failure at one setting, which does not abort the sequence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CtlFault {
    /// The control is not found in the mixer.
    UnknownCtl { name: String },
    /// The write failed. The index of sub-channel is not available for enumerated label.
    WriteFailed {
        name: String,
        index: Option<usize>,
        cause: String,
    },
}

impl fmt::Display for CtlFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownCtl { name } => write!(f, "Unknown control '{}'", name),
            Self::WriteFailed {
                name,
                index: Some(index),
                cause,
            } => write!(f, "Failed to set '{}'.{}: {}", name, index, cause),
            Self::WriteFailed {
                name,
                index: None,
                cause,
            } => write!(f, "Failed to set '{}': {}", name, cause),
        }
    }
}

/// Apply the sequence of settings to the mixer in the order and return faults in the way.
pub fn apply_ctl_sequence<M: MixerOperation>(mixer: &mut M, settings: &[CtlSetting]) -> Vec<CtlFault> {
    settings.iter().fold(Vec::new(), |mut faults, setting| {
        apply_ctl_setting(mixer, setting, &mut faults);
        faults
    })
}

fn apply_ctl_setting<M: MixerOperation>(
    mixer: &mut M,
    setting: &CtlSetting,
    faults: &mut Vec<CtlFault>,
) {
    let ctl = match mixer.find_ctl(&setting.name) {
        Some(ctl) => ctl,
        None => {
            error!(name = setting.name.as_str(), "Unknown control");
            faults.push(CtlFault::UnknownCtl {
                name: setting.name.clone(),
            });
            return;
        }
    };

    match &setting.value {
        CtlValue::Label(label) => match mixer.write_label(&ctl, label) {
            Ok(_) => debug!("Set '{}' to '{}'", setting.name, label),
            Err(e) => {
                warn!("Failed to set '{}' to '{}': {}", setting.name, label, e);
                faults.push(CtlFault::WriteFailed {
                    name: setting.name.clone(),
                    index: None,
                    cause: e.to_string(),
                });
            }
        },
        &CtlValue::Int(value) => {
            if let Some((min, max)) = mixer.value_range(&ctl) {
                if value < min || value > max {
                    warn!(
                        name = setting.name.as_str(),
                        value, min, max, "Value out of range"
                    );
                }
            }

            // Sub-channels move in lockstep; e.g. stereo volume.
            let count = mixer.value_count(&ctl);
            (0..count).for_each(|index| match mixer.write_value(&ctl, index, value) {
                Ok(_) => debug!("Set '{}'.{} to {}", setting.name, index, value),
                Err(e) => {
                    warn!("Failed to set '{}'.{} to {}: {}", setting.name, index, value, e);
                    faults.push(CtlFault::WriteFailed {
                        name: setting.name.clone(),
                        index: Some(index),
                        cause: e.to_string(),
                    });
                }
            });
        }
    }
}
