// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Container of user-defined control elements added by the service.
//!
//! The container keeps the last value of each element, and dispatches the change of value by
//! the other process to the model of controls.

use {
    super::*,
    alsactl::{prelude::*, *},
    glib::FileError,
    tracing::{debug, debug_span, enabled, warn, Level},
};

#[derive(Default)]
pub struct CardCntr {
    pub card: Card,
    entries: Vec<(ElemInfo, ElemValue)>,
}

/// The model of controls operating the object.
pub trait CtlModel<O: Sized> {
    fn cache(&mut self, _: &mut O) -> Result<(), Error>;
    fn load(&mut self, card_cntr: &mut CardCntr) -> Result<(), Error>;
    fn read(
        &mut self,
        obj: &mut O,
        elem_id: &ElemId,
        elem_value: &mut ElemValue,
    ) -> Result<bool, Error>;
    fn write(
        &mut self,
        obj: &mut O,
        elem_id: &ElemId,
        old: &ElemValue,
        new: &ElemValue,
    ) -> Result<bool, Error>;
}

impl Drop for CardCntr {
    fn drop(&mut self) {
        self.entries
            .iter()
            .filter_map(|(elem_info, _)| elem_id_from_elem_info(elem_info))
            .for_each(|elem_id| {
                let _ = self.card.remove_elems(&elem_id);
            });
    }
}

fn elem_id_from_elem_info(elem_info: &ElemInfo) -> Option<ElemId> {
    match elem_info {
        ElemInfo::Iec60958(info) => info.elem_id(),
        ElemInfo::Boolean(info) => info.elem_id(),
        ElemInfo::Bytes(info) => info.elem_id(),
        ElemInfo::Integer(info) => info.elem_id(),
        ElemInfo::Integer64(info) => info.elem_id(),
        ElemInfo::Enumerated(info) => info.elem_id(),
    }
}

fn match_elem_id(elem_info: &ElemInfo, elem_id: &ElemId) -> bool {
    elem_id_from_elem_info(elem_info)
        .map(|e| e.eq(elem_id))
        .unwrap_or_default()
}

fn dump_elem_info(elem_id: &ElemId, elem_info: &ElemInfo) {
    match elem_info {
        ElemInfo::Boolean(info) => debug!(
            numid = ?elem_id.numid(),
            access = ?info.access(),
            value_count = ?info.value_count(),
        ),
        ElemInfo::Integer(info) => debug!(
            numid = ?elem_id.numid(),
            access = ?info.access(),
            value_count = ?info.value_count(),
            value_min = ?info.value_min(),
            value_max = ?info.value_max(),
            value_step = ?info.value_step(),
        ),
        _ => debug!(numid = ?elem_id.numid(), "Unexpected type of element"),
    }
}

fn value_array_literal(elem_info: &ElemInfo, elem_value: &ElemValue) -> String {
    match elem_info {
        ElemInfo::Boolean(info) => {
            let count = info.value_count() as usize;
            format!("{:?}", &elem_value.boolean()[..count])
        }
        ElemInfo::Integer(info) => {
            let count = info.value_count() as usize;
            format!("{:?}", &elem_value.int()[..count])
        }
        _ => String::new(),
    }
}

impl CardCntr {
    pub fn add_bool_elems(
        &mut self,
        elem_id: &ElemId,
        elem_count: usize,
        value_count: usize,
        unlock: bool,
    ) -> Result<Vec<ElemId>, Error> {
        let _entry = debug_span!("boolean").entered();

        let elem_info = ElemInfoBoolean::new();
        elem_info.set_value_count(value_count as u32);
        elem_info.set_access(ElemAccessFlag::READ | ElemAccessFlag::WRITE | ElemAccessFlag::VOLATILE);

        let res = self.register_elems(elem_id, elem_count, &elem_info, unlock);
        debug!(
            name = ?elem_id.name().as_str(),
            ?elem_count,
            ?value_count,
            ?unlock,
            ?res,
        );
        res
    }

    pub fn add_int_elems(
        &mut self,
        elem_id: &ElemId,
        elem_count: usize,
        min: i32,
        max: i32,
        step: i32,
        value_count: usize,
        unlock: bool,
    ) -> Result<Vec<ElemId>, Error> {
        let _entry = debug_span!("integer").entered();

        let elem_info = ElemInfoInteger::new();
        elem_info.set_value_count(value_count as u32);
        elem_info.set_value_min(min);
        elem_info.set_value_max(max);
        elem_info.set_value_step(step);
        elem_info.set_access(ElemAccessFlag::READ | ElemAccessFlag::WRITE | ElemAccessFlag::VOLATILE);

        let res = self.register_elems(elem_id, elem_count, &elem_info, unlock);
        debug!(
            name = ?elem_id.name().as_str(),
            ?elem_count,
            ?min,
            ?max,
            ?step,
            ?value_count,
            ?unlock,
            ?res,
        );
        res
    }

    // The elements left by the former instance of service are reused when they are compatible.
    fn find_reusable_elems<O: AsRef<ElemInfoCommon>>(
        &self,
        elem_id: &ElemId,
        elem_count: usize,
        elem_info: &O,
    ) -> Result<Option<Vec<ElemId>>, Error> {
        let elem_id_list = self.card.elem_id_list()?;
        if !elem_id_list.iter().any(|eid| eid.eq(elem_id)) {
            return Ok(None);
        }

        let elem_id_list: Vec<ElemId> = elem_id_list
            .into_iter()
            .filter(|eid| {
                eid.name() == elem_id.name()
                    && eid.device_id() == elem_id.device_id()
                    && eid.subdevice_id() == elem_id.subdevice_id()
                    && eid.iface() == elem_id.iface()
            })
            .collect();

        if elem_id_list.len() != elem_count {
            let msg = format!(
                "{} is already added however the count is unexpected.",
                elem_id.name()
            );
            Err(Error::new(FileError::Inval, &msg))?;
        }

        elem_id_list.iter().try_for_each(|eid| {
            let info = self.card.elem_info(eid)?;
            let access = info.as_ref().access();

            let msg = if access.contains(ElemAccessFlag::OWNER) {
                format!("{} is already added by runtime.", eid.name())
            } else if access.contains(ElemAccessFlag::LOCK) {
                format!("{} is locked by the other process.", eid.name())
            } else if info.as_ref().elem_type() != elem_info.as_ref().elem_type() {
                format!("{} is already added but has unexpected type.", eid.name())
            } else {
                return Ok(());
            };
            Err(Error::new(FileError::Inval, &msg))
        })?;

        Ok(Some(elem_id_list))
    }

    fn register_elems<O: AsRef<ElemInfoCommon>>(
        &mut self,
        elem_id: &ElemId,
        elem_count: usize,
        elem_info: &O,
        unlock: bool,
    ) -> Result<Vec<ElemId>, Error> {
        let _enter = debug_span!("register").entered();

        let elem_id_list = match self.find_reusable_elems(elem_id, elem_count, elem_info)? {
            Some(elem_id_list) => elem_id_list,
            None => self
                .card
                .add_elems(elem_id, elem_count as u32, elem_info)?,
        };

        let res = elem_id_list.iter().try_for_each(|eid| {
            let info = self.card.elem_info(eid)?;
            let eid = info.as_ref().elem_id().ok_or_else(|| {
                Error::new(FileError::Io, "Unexpected result to detect element id")
            })?;

            let mut v = ElemValue::new();
            self.card.read_elem_value(&eid, &mut v)?;

            if enabled!(Level::DEBUG) {
                dump_elem_info(&eid, &info);
            }

            self.entries.push((info, v));
            Ok(())
        });

        if let Err(e) = res {
            let _ = self.card.remove_elems(&elem_id_list[0]);
            return Err(e);
        }

        if unlock {
            elem_id_list.iter().for_each(|eid| {
                // Ignore any errors.
                let res = self.card.lock_elem(eid, false);
                debug!(numid = ?eid.numid(), ?unlock, ?res);
            });
        }

        Ok(elem_id_list)
    }

    /// Update the elements by the values read from the model, when they differ from the last
    /// values.
    pub fn update_elems<O, T>(
        &mut self,
        obj: &mut O,
        elem_id_list: &[ElemId],
        ctl_model: &mut T,
    ) -> Result<(), Error>
    where
        O: Sized,
        T: CtlModel<O>,
    {
        let card = &self.card;
        let entries = &mut self.entries;

        elem_id_list.iter().try_for_each(|elem_id| {
            entries
                .iter_mut()
                .filter(|(elem_info, _)| match_elem_id(elem_info, elem_id))
                .try_for_each(|(elem_info, v)| {
                    let mut val = ElemValue::new();
                    if !ctl_model.read(obj, elem_id, &mut val)? || v.equal(&val) {
                        return Ok(());
                    }

                    let res = card.write_elem_value(elem_id, &val);
                    debug!(
                        numid = elem_id.numid(),
                        values = value_array_literal(elem_info, &val),
                        ?res,
                    );
                    res.map(|_| *v = val)
                })
        })
    }

    pub fn dispatch_elem_event<O, T>(
        &mut self,
        obj: &mut O,
        elem_id: &ElemId,
        events: &ElemEventMask,
        ctl_model: &mut T,
    ) -> Result<(), Error>
    where
        O: Sized,
        T: CtlModel<O>,
    {
        if events.contains(ElemEventMask::REMOVE) {
            let _enter = debug_span!("remove").entered();
            debug!(numid = ?elem_id.numid());

            self.entries
                .retain(|(elem_info, _)| !match_elem_id(elem_info, elem_id));
            return Ok(());
        }

        if events.contains(ElemEventMask::ADD) {
            let _enter = debug_span!("add").entered();
            let list = [elem_id.clone()];
            self.update_elems(obj, &list, ctl_model)?;
        }

        if events.contains(ElemEventMask::VALUE) {
            let _enter = debug_span!("value").entered();

            for (elem_info, v) in &mut self.entries {
                if !match_elem_id(elem_info, elem_id) {
                    continue;
                }

                let mut val = ElemValue::new();
                let res = self.card.read_elem_value(elem_id, &mut val);
                debug!(
                    numid = elem_id.numid(),
                    old_values = value_array_literal(elem_info, v),
                    new_values = value_array_literal(elem_info, &val),
                    ?res,
                );

                if res.is_err() || v.equal(&val) {
                    continue;
                }

                let _enter = debug_span!("model").entered();

                match ctl_model.write(obj, elem_id, v, &val) {
                    Ok(true) => {
                        *v = val;
                        return Ok(());
                    }
                    Ok(false) => (),
                    Err(e) => {
                        warn!(numid = elem_id.numid(), "Revert to old values: {}", e);
                        self.card.write_elem_value(elem_id, v)?;
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }
}
