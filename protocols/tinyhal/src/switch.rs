// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Engine to switch physical devices.
//!
//! The engine keeps the set of devices requested by streams (desired) and the set of devices
//! whose routes are enabled in the mixer (active), for each direction. At request, the routes
//! newly covered by the desired set are enabled at first, then the routes no longer covered are
//! disabled, so that the audio path is never left without any device in the middle of switch.
//!
//! The state and the mixer are guarded by one lock, thus the whole computation and application
//! of difference is atomic against the other request.

use {
    super::{ctl::*, mask::Direction, route::*, RouteError},
    glib::Error,
    std::sync::{Mutex, MutexGuard, PoisonError},
    tracing::{debug, debug_span, info},
};

/// The set of desired and active devices for both directions.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DeviceSwitchState {
    pub desired_out: u32,
    pub active_out: u32,
    pub desired_in: u32,
    pub active_in: u32,
}

impl DeviceSwitchState {
    pub fn desired(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Output => self.desired_out,
            Direction::Input => self.desired_in,
        }
    }

    pub fn active(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Output => self.active_out,
            Direction::Input => self.active_in,
        }
    }

    fn desired_mut(&mut self, direction: Direction) -> &mut u32 {
        match direction {
            Direction::Output => &mut self.desired_out,
            Direction::Input => &mut self.desired_in,
        }
    }

    fn active_mut(&mut self, direction: Direction) -> &mut u32 {
        match direction {
            Direction::Output => &mut self.active_out,
            Direction::Input => &mut self.active_in,
        }
    }
}

/// The result of switch; masks of routes enabled and disabled in the order, and faults at
/// applying their sequences.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SwitchReport {
    pub enabled: Vec<u32>,
    pub disabled: Vec<u32>,
    pub faults: Vec<CtlFault>,
}

impl SwitchReport {
    /// Whether no sequence was applied.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }

    fn enable<M: MixerOperation>(&mut self, mixer: &mut M, route: &DeviceRoute) {
        debug!("Enabling devices 0x{:08x}", route.mask);
        self.faults.extend(apply_ctl_sequence(mixer, &route.on));
        self.enabled.push(route.mask);
    }

    fn disable<M: MixerOperation>(&mut self, mixer: &mut M, route: &DeviceRoute) {
        debug!("Disabling devices 0x{:08x}", route.mask);
        self.faults.extend(apply_ctl_sequence(mixer, &route.off));
        self.disabled.push(route.mask);
    }
}

struct RouterState<M> {
    state: DeviceSwitchState,
    mixer: M,
}

/// The router of physical devices over the mixer.
pub struct DeviceRouter<M: MixerOperation> {
    table: RouteTable,
    guard: Mutex<RouterState<M>>,
}

impl<M: MixerOperation> DeviceRouter<M> {
    pub fn new(table: RouteTable, mixer: M) -> Self {
        Self {
            table,
            guard: Mutex::new(RouterState {
                state: Default::default(),
                mixer,
            }),
        }
    }

    // The state is consistent at any point of panic, since it is updated after application.
    fn lock(&self) -> MutexGuard<'_, RouterState<M>> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The union of masks for all of routes.
    pub fn supported_devices(&self) -> u32 {
        self.table.supported_devices()
    }

    /// The snapshot of current state.
    pub fn state(&self) -> DeviceSwitchState {
        self.lock().state
    }

    /// Request the set of devices for the direction, then enable and disable routes to converge
    /// the active set to the desired set.
    pub fn request_devices(&self, direction: Direction, mask: u32) -> Result<SwitchReport, Error> {
        if !direction.accepts(mask) {
            let msg = format!("Invalid mask 0x{:08x} for {:?} devices", mask, direction);
            Err(Error::new(RouteError::InvalidDeviceMask, &msg))?;
        }

        let mut guard = self.lock();
        let RouterState { state, mixer } = &mut *guard;

        let desired = (state.desired(direction) & !direction.all_devices()) | mask;
        *state.desired_mut(direction) = desired;

        let active = state.active(direction);
        if desired == active {
            return Ok(Default::default());
        }

        let _enter = debug_span!("switch").entered();
        info!(
            "Switching {:?} devices 0x{:08x} -> 0x{:08x}",
            direction, active, desired
        );

        let mut report = SwitchReport::default();

        self.table
            .routes(direction)
            .filter(|route| route.overlaps(desired) && !route.overlaps(active))
            .for_each(|route| report.enable(mixer, route));

        self.table
            .routes(direction)
            .filter(|route| route.overlaps(active) && !route.overlaps(desired))
            .for_each(|route| report.disable(mixer, route));

        *state.active_mut(direction) = desired;

        Ok(report)
    }

    pub fn request_output_devices(&self, mask: u32) -> Result<SwitchReport, Error> {
        self.request_devices(Direction::Output, mask)
    }

    pub fn request_input_devices(&self, mask: u32) -> Result<SwitchReport, Error> {
        self.request_devices(Direction::Input, mask)
    }

    /// Enable routes for all of desired devices without regard to active set. This is used at
    /// the first transfer of stream, since the codec can lose its state during standby.
    pub fn reapply_devices(&self, direction: Direction) -> SwitchReport {
        let mut guard = self.lock();
        let RouterState { state, mixer } = &mut *guard;

        let desired = state.desired(direction);
        let _enter = debug_span!("reapply").entered();

        let mut report = SwitchReport::default();
        self.table
            .routes(direction)
            .filter(|route| route.overlaps(desired))
            .for_each(|route| report.enable(mixer, route));

        *state.active_mut(direction) |= desired;

        report
    }

    /// Disable routes for active devices except for the retained ones. The desired set is kept
    /// so that the routes are enabled again at next transfer.
    pub fn release_devices(&self, direction: Direction, retained: u32) -> SwitchReport {
        let mut guard = self.lock();
        let RouterState { state, mixer } = &mut *guard;

        let active = state.active(direction);
        let _enter = debug_span!("release").entered();

        let mut report = SwitchReport::default();
        self.table
            .routes(direction)
            .filter(|route| route.overlaps(active) && !route.overlaps(retained))
            .for_each(|route| report.disable(mixer, route));

        let bits = direction.device_bits(active) & direction.device_bits(retained);
        *state.active_mut(direction) = direction.compose(bits);

        report
    }
}
