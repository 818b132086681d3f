// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Table of routes for physical devices.

use super::{ctl::CtlSetting, mask::Direction};

/// The sequences of control settings to enable and disable devices.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeviceRoute {
    /// The mask of device bits covered by the route.
    pub mask: u32,
    /// The sequence to enable the devices.
    pub on: Vec<CtlSetting>,
    /// The sequence to disable the devices.
    pub off: Vec<CtlSetting>,
}

impl DeviceRoute {
    pub fn new(mask: u32) -> Self {
        Self {
            mask,
            ..Default::default()
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::of(self.mask)
    }

    /// Whether the route covers any of device bits in the mask. The mask is expected in the
    /// same namespace as the route.
    pub fn overlaps(&self, mask: u32) -> bool {
        let direction = self.direction();
        direction.device_bits(self.mask) & direction.device_bits(mask) > 0
    }
}

/// The table of routes in declared order. The same mask can appear in several routes.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RouteTable {
    routes: Vec<DeviceRoute>,
}

impl RouteTable {
    /// Append the route and return its position.
    pub fn push(&mut self, route: DeviceRoute) -> usize {
        self.routes.push(route);
        self.routes.len() - 1
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut DeviceRoute> {
        self.routes.get_mut(pos)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceRoute> {
        self.routes.iter()
    }

    /// The routes in the namespace of direction, in declared order.
    pub fn routes(&self, direction: Direction) -> impl Iterator<Item = &DeviceRoute> {
        self.routes
            .iter()
            .filter(move |route| route.direction() == direction)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The union of all masks in the table.
    pub fn supported_devices(&self) -> u32 {
        self.routes.iter().fold(0, |mask, route| mask | route.mask)
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::mask::*};

    #[test]
    fn route_overlap() {
        let route = DeviceRoute::new(DEVICE_OUT_WIRED_HEADSET | DEVICE_OUT_WIRED_HEADPHONE);
        assert!(route.overlaps(DEVICE_OUT_WIRED_HEADPHONE));
        assert!(route.overlaps(DEVICE_OUT_SPEAKER | DEVICE_OUT_WIRED_HEADSET));
        assert!(!route.overlaps(DEVICE_OUT_SPEAKER));
        assert!(!route.overlaps(0));

        // The flag of input is not regarded as device.
        let route = DeviceRoute::new(DEVICE_IN_BUILTIN_MIC);
        assert!(route.overlaps(DEVICE_IN_BUILTIN_MIC));
        assert!(!route.overlaps(DEVICE_IN_BACK_MIC));
        assert!(!route.overlaps(DEVICE_BIT_IN));
    }

    #[test]
    fn table_order_and_namespace() {
        let mut table = RouteTable::default();
        table.push(DeviceRoute::new(DEVICE_OUT_SPEAKER));
        table.push(DeviceRoute::new(DEVICE_IN_BUILTIN_MIC));
        table.push(DeviceRoute::new(DEVICE_OUT_EARPIECE));
        table.push(DeviceRoute::new(DEVICE_OUT_SPEAKER));

        let masks: Vec<u32> = table.routes(Direction::Output).map(|r| r.mask).collect();
        assert_eq!(
            masks,
            vec![DEVICE_OUT_SPEAKER, DEVICE_OUT_EARPIECE, DEVICE_OUT_SPEAKER]
        );

        let masks: Vec<u32> = table.routes(Direction::Input).map(|r| r.mask).collect();
        assert_eq!(masks, vec![DEVICE_IN_BUILTIN_MIC]);

        assert_eq!(table.len(), 4);
        assert_eq!(
            table.supported_devices(),
            DEVICE_OUT_SPEAKER | DEVICE_OUT_EARPIECE | DEVICE_IN_BUILTIN_MIC
        );
    }
}
