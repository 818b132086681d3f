// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Mixer over control elements in ALSA control character device.

use {super::*, std::convert::TryFrom};

/// The mixer to write control elements found by name.
pub struct CardMixer {
    card: Card,
}

impl CardMixer {
    pub fn open(card_id: u32) -> Result<Self, Error> {
        let card = Card::new();
        card.open(card_id, 0).map_err(|e| {
            let msg = format!("Failed to open mixer {}: {}", card_id, e);
            Error::new(RouteError::MixerUnavailable, &msg)
        })?;
        Ok(Self { card })
    }
}

fn elem_value_count(elem_info: &ElemInfo) -> usize {
    match elem_info {
        ElemInfo::Boolean(info) => info.value_count() as usize,
        ElemInfo::Bytes(info) => info.value_count() as usize,
        ElemInfo::Integer(info) => info.value_count() as usize,
        ElemInfo::Integer64(info) => info.value_count() as usize,
        ElemInfo::Enumerated(info) => info.value_count() as usize,
        ElemInfo::Iec60958(_) => 0,
    }
}

fn elem_value_range(elem_info: &ElemInfo) -> Option<(i64, i64)> {
    match elem_info {
        ElemInfo::Boolean(_) => Some((0, 1)),
        ElemInfo::Bytes(_) => Some((u8::MIN as i64, u8::MAX as i64)),
        ElemInfo::Integer(info) => Some((info.value_min() as i64, info.value_max() as i64)),
        ElemInfo::Integer64(info) => Some((info.value_min(), info.value_max())),
        ElemInfo::Enumerated(info) => Some((0, info.labels().len() as i64 - 1)),
        ElemInfo::Iec60958(_) => None,
    }
}

fn saturate<T: TryFrom<i64> + Copy>(value: i64, min: T, max: T) -> T {
    T::try_from(value).unwrap_or(if value < 0 { min } else { max })
}

// Replace the value at the index, with the other values retained.
fn update_elem_value(
    elem_info: &ElemInfo,
    elem_value: &ElemValue,
    index: usize,
    value: i64,
) -> Result<(), Error> {
    let count = elem_value_count(elem_info);
    if index >= count {
        let msg = format!("Index {} out of {} values", index, count);
        Err(Error::new(FileError::Inval, &msg))?;
    }

    match elem_info {
        ElemInfo::Boolean(_) => {
            let mut vals = elem_value.boolean()[..count].to_vec();
            vals[index] = value != 0;
            elem_value.set_bool(&vals);
        }
        ElemInfo::Bytes(_) => {
            let mut vals = elem_value.bytes()[..count].to_vec();
            vals[index] = saturate(value, u8::MIN, u8::MAX);
            elem_value.set_bytes(&vals);
        }
        ElemInfo::Integer(_) => {
            let mut vals = elem_value.int()[..count].to_vec();
            vals[index] = saturate(value, i32::MIN, i32::MAX);
            elem_value.set_int(&vals);
        }
        ElemInfo::Integer64(_) => {
            let mut vals = elem_value.int64()[..count].to_vec();
            vals[index] = value;
            elem_value.set_int64(&vals);
        }
        ElemInfo::Enumerated(_) => {
            let mut vals = elem_value.enumerated()[..count].to_vec();
            vals[index] = saturate(value, u32::MIN, u32::MAX);
            elem_value.set_enum(&vals);
        }
        ElemInfo::Iec60958(_) => unreachable!(),
    }

    Ok(())
}

impl MixerOperation for CardMixer {
    type Ctl = ElemId;

    fn find_ctl(&mut self, name: &str) -> Option<ElemId> {
        self.card
            .elem_id_list()
            .ok()?
            .into_iter()
            .find(|elem_id| elem_id.name().as_str() == name)
    }

    fn value_count(&mut self, elem_id: &ElemId) -> usize {
        self.card
            .elem_info(elem_id)
            .map(|elem_info| elem_value_count(&elem_info))
            .unwrap_or_default()
    }

    fn value_range(&mut self, elem_id: &ElemId) -> Option<(i64, i64)> {
        self.card
            .elem_info(elem_id)
            .ok()
            .and_then(|elem_info| elem_value_range(&elem_info))
    }

    fn write_value(&mut self, elem_id: &ElemId, index: usize, value: i64) -> Result<(), Error> {
        let elem_info = self.card.elem_info(elem_id)?;
        let mut elem_value = ElemValue::new();
        self.card.read_elem_value(elem_id, &mut elem_value)?;
        update_elem_value(&elem_info, &elem_value, index, value)?;
        self.card.write_elem_value(elem_id, &elem_value)
    }

    fn write_label(&mut self, elem_id: &ElemId, label: &str) -> Result<(), Error> {
        let info = match self.card.elem_info(elem_id)? {
            ElemInfo::Enumerated(info) => info,
            _ => {
                let msg = format!("{} is not enumerated", elem_id.name());
                return Err(Error::new(FileError::Inval, &msg));
            }
        };

        let pos = info
            .labels()
            .iter()
            .position(|l| l.as_str() == label)
            .ok_or_else(|| {
                let msg = format!("Label '{}' not found in {}", label, elem_id.name());
                Error::new(FileError::Inval, &msg)
            })?;

        let vals = vec![pos as u32; info.value_count() as usize];
        let elem_value = ElemValue::new();
        elem_value.set_enum(&vals);
        self.card.write_elem_value(elem_id, &elem_value)
    }
}
