// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

use {
    super::ctl::MixerOperation,
    glib::{Error, FileError},
    std::sync::{Arc, Mutex},
};

/// The write recorded by the fake mixer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MixerWrite {
    Value {
        name: String,
        index: usize,
        value: i64,
    },
    Label {
        name: String,
        label: String,
    },
}

impl MixerWrite {
    pub fn value(name: &str, index: usize, value: i64) -> Self {
        Self::Value {
            name: name.to_string(),
            index,
            value,
        }
    }

    pub fn label(name: &str, label: &str) -> Self {
        Self::Label {
            name: name.to_string(),
            label: label.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Value { name, .. } => name,
            Self::Label { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeCtl {
    name: String,
    count: usize,
    labels: Vec<String>,
    failing: bool,
}

/// The mixer which records writes. The record is shared between clones.
#[derive(Debug, Clone, Default)]
pub struct RecordingMixer {
    ctls: Vec<FakeCtl>,
    trace: Arc<Mutex<Vec<MixerWrite>>>,
}

impl RecordingMixer {
    pub fn with_ctl(mut self, name: &str, count: usize) -> Self {
        self.ctls.push(FakeCtl {
            name: name.to_string(),
            count,
            labels: Vec::new(),
            failing: false,
        });
        self
    }

    pub fn with_enum_ctl(mut self, name: &str, count: usize, labels: &[&str]) -> Self {
        self.ctls.push(FakeCtl {
            name: name.to_string(),
            count,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            failing: false,
        });
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.ctls
            .iter_mut()
            .filter(|ctl| ctl.name == name)
            .for_each(|ctl| ctl.failing = true);
        self
    }

    pub fn writes(&self) -> Vec<MixerWrite> {
        self.trace.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.trace.lock().unwrap().clear();
    }
}

impl MixerOperation for RecordingMixer {
    type Ctl = usize;

    fn find_ctl(&mut self, name: &str) -> Option<usize> {
        self.ctls.iter().position(|ctl| ctl.name == name)
    }

    fn value_count(&mut self, &ctl: &usize) -> usize {
        self.ctls[ctl].count
    }

    fn value_range(&mut self, &ctl: &usize) -> Option<(i64, i64)> {
        let ctl = &self.ctls[ctl];
        if ctl.labels.is_empty() {
            Some((0, 255))
        } else {
            Some((0, ctl.labels.len() as i64 - 1))
        }
    }

    fn write_value(&mut self, &ctl: &usize, index: usize, value: i64) -> Result<(), Error> {
        let ctl = &self.ctls[ctl];
        if ctl.failing || index >= ctl.count {
            Err(Error::new(FileError::Io, "Fake failure"))
        } else {
            self.trace
                .lock()
                .unwrap()
                .push(MixerWrite::value(&ctl.name, index, value));
            Ok(())
        }
    }

    fn write_label(&mut self, &ctl: &usize, label: &str) -> Result<(), Error> {
        let ctl = &self.ctls[ctl];
        if ctl.failing || !ctl.labels.iter().any(|l| l == label) {
            Err(Error::new(FileError::Inval, "Label not found"))
        } else {
            self.trace
                .lock()
                .unwrap()
                .push(MixerWrite::label(&ctl.name, label));
            Ok(())
        }
    }
}
