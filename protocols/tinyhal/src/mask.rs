// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Bit masks of physical audio devices.
//!
//! The layout of bits follows the one of Android audio devices. The most significant bit
//! distinguishes devices for input from devices for output.

/// The flag of devices for input.
pub const DEVICE_BIT_IN: u32 = 0x80000000;
/// The flag of default device.
pub const DEVICE_BIT_DEFAULT: u32 = 0x40000000;

pub const DEVICE_OUT_EARPIECE: u32 = 0x00000001;
pub const DEVICE_OUT_SPEAKER: u32 = 0x00000002;
pub const DEVICE_OUT_WIRED_HEADSET: u32 = 0x00000004;
pub const DEVICE_OUT_WIRED_HEADPHONE: u32 = 0x00000008;
pub const DEVICE_OUT_BLUETOOTH_SCO: u32 = 0x00000010;
pub const DEVICE_OUT_BLUETOOTH_SCO_HEADSET: u32 = 0x00000020;
pub const DEVICE_OUT_BLUETOOTH_SCO_CARKIT: u32 = 0x00000040;
pub const DEVICE_OUT_BLUETOOTH_A2DP: u32 = 0x00000080;
pub const DEVICE_OUT_BLUETOOTH_A2DP_HEADPHONES: u32 = 0x00000100;
pub const DEVICE_OUT_BLUETOOTH_A2DP_SPEAKER: u32 = 0x00000200;
pub const DEVICE_OUT_AUX_DIGITAL: u32 = 0x00000400;
pub const DEVICE_OUT_ANLG_DOCK_HEADSET: u32 = 0x00000800;
pub const DEVICE_OUT_DGTL_DOCK_HEADSET: u32 = 0x00001000;
pub const DEVICE_OUT_USB_ACCESSORY: u32 = 0x00002000;
pub const DEVICE_OUT_USB_DEVICE: u32 = 0x00004000;
pub const DEVICE_OUT_REMOTE_SUBMIX: u32 = 0x00008000;
pub const DEVICE_OUT_DEFAULT: u32 = DEVICE_BIT_DEFAULT;

/// All of bits for output devices.
pub const DEVICE_OUT_ALL: u32 = DEVICE_OUT_EARPIECE
    | DEVICE_OUT_SPEAKER
    | DEVICE_OUT_WIRED_HEADSET
    | DEVICE_OUT_WIRED_HEADPHONE
    | DEVICE_OUT_BLUETOOTH_SCO
    | DEVICE_OUT_BLUETOOTH_SCO_HEADSET
    | DEVICE_OUT_BLUETOOTH_SCO_CARKIT
    | DEVICE_OUT_BLUETOOTH_A2DP
    | DEVICE_OUT_BLUETOOTH_A2DP_HEADPHONES
    | DEVICE_OUT_BLUETOOTH_A2DP_SPEAKER
    | DEVICE_OUT_AUX_DIGITAL
    | DEVICE_OUT_ANLG_DOCK_HEADSET
    | DEVICE_OUT_DGTL_DOCK_HEADSET
    | DEVICE_OUT_USB_ACCESSORY
    | DEVICE_OUT_USB_DEVICE
    | DEVICE_OUT_REMOTE_SUBMIX
    | DEVICE_OUT_DEFAULT;

pub const DEVICE_IN_COMMUNICATION: u32 = DEVICE_BIT_IN | 0x00000001;
pub const DEVICE_IN_AMBIENT: u32 = DEVICE_BIT_IN | 0x00000002;
pub const DEVICE_IN_BUILTIN_MIC: u32 = DEVICE_BIT_IN | 0x00000004;
pub const DEVICE_IN_BLUETOOTH_SCO_HEADSET: u32 = DEVICE_BIT_IN | 0x00000008;
pub const DEVICE_IN_WIRED_HEADSET: u32 = DEVICE_BIT_IN | 0x00000010;
pub const DEVICE_IN_AUX_DIGITAL: u32 = DEVICE_BIT_IN | 0x00000020;
pub const DEVICE_IN_VOICE_CALL: u32 = DEVICE_BIT_IN | 0x00000040;
pub const DEVICE_IN_BACK_MIC: u32 = DEVICE_BIT_IN | 0x00000080;
pub const DEVICE_IN_REMOTE_SUBMIX: u32 = DEVICE_BIT_IN | 0x00000100;
pub const DEVICE_IN_ANLG_DOCK_HEADSET: u32 = DEVICE_BIT_IN | 0x00000200;
pub const DEVICE_IN_DGTL_DOCK_HEADSET: u32 = DEVICE_BIT_IN | 0x00000400;
pub const DEVICE_IN_USB_ACCESSORY: u32 = DEVICE_BIT_IN | 0x00000800;
pub const DEVICE_IN_USB_DEVICE: u32 = DEVICE_BIT_IN | 0x00001000;
pub const DEVICE_IN_DEFAULT: u32 = DEVICE_BIT_IN | DEVICE_BIT_DEFAULT;

/// All of bits for input devices, including the flag of input.
pub const DEVICE_IN_ALL: u32 = DEVICE_IN_COMMUNICATION
    | DEVICE_IN_AMBIENT
    | DEVICE_IN_BUILTIN_MIC
    | DEVICE_IN_BLUETOOTH_SCO_HEADSET
    | DEVICE_IN_WIRED_HEADSET
    | DEVICE_IN_AUX_DIGITAL
    | DEVICE_IN_VOICE_CALL
    | DEVICE_IN_BACK_MIC
    | DEVICE_IN_REMOTE_SUBMIX
    | DEVICE_IN_ANLG_DOCK_HEADSET
    | DEVICE_IN_DGTL_DOCK_HEADSET
    | DEVICE_IN_USB_ACCESSORY
    | DEVICE_IN_USB_DEVICE
    | DEVICE_IN_DEFAULT;

/// The name of device in configuration and the mask of device bits for it.
pub const DEVICE_NAMES: &[(&str, u32)] = &[
    ("speaker", DEVICE_OUT_SPEAKER),
    (
        "headphone",
        DEVICE_OUT_WIRED_HEADSET | DEVICE_OUT_WIRED_HEADPHONE,
    ),
    ("earpiece", DEVICE_OUT_EARPIECE),
    ("analog-dock", DEVICE_OUT_ANLG_DOCK_HEADSET),
    ("digital-dock", DEVICE_OUT_DGTL_DOCK_HEADSET),
    ("comms", DEVICE_IN_COMMUNICATION),
    ("ambient", DEVICE_IN_AMBIENT),
    ("builtin-mic", DEVICE_IN_BUILTIN_MIC),
    ("headset", DEVICE_IN_WIRED_HEADSET),
    ("digital", DEVICE_IN_AUX_DIGITAL),
    ("back-mic", DEVICE_IN_BACK_MIC),
];

/// Find the mask of device bits for the name in configuration.
pub fn device_mask_by_name(name: &str) -> Option<u32> {
    DEVICE_NAMES
        .iter()
        .find(|(n, _)| n.eq(&name))
        .map(|&(_, mask)| mask)
}

/// The direction of audio stream, as well as namespace of device masks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Output,
    Input,
}

impl Default for Direction {
    fn default() -> Self {
        Self::Output
    }
}

impl Direction {
    /// Detect the namespace of the mask.
    pub fn of(mask: u32) -> Self {
        if mask >= DEVICE_BIT_IN {
            Self::Input
        } else {
            Self::Output
        }
    }

    /// All of bits addressed by the direction.
    pub fn all_devices(&self) -> u32 {
        match self {
            Self::Output => DEVICE_OUT_ALL,
            Self::Input => DEVICE_IN_ALL,
        }
    }

    /// Strip the flag of namespace so that only device bits remain.
    pub fn device_bits(&self, mask: u32) -> u32 {
        match self {
            Self::Output => mask,
            Self::Input => mask & !DEVICE_BIT_IN,
        }
    }

    /// Compose the mask in the namespace from device bits.
    pub fn compose(&self, bits: u32) -> u32 {
        match self {
            Self::Output => bits,
            Self::Input if bits == 0 => 0,
            Self::Input => bits | DEVICE_BIT_IN,
        }
    }

    /// Whether the mask is acceptable as request for the direction.
    pub fn accepts(&self, mask: u32) -> bool {
        match self {
            Self::Output => mask & DEVICE_BIT_IN == 0,
            Self::Input => mask == 0 || mask & DEVICE_BIT_IN > 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn device_name_table() {
        assert_eq!(device_mask_by_name("speaker"), Some(0x00000002));
        assert_eq!(device_mask_by_name("headphone"), Some(0x0000000c));
        assert_eq!(device_mask_by_name("earpiece"), Some(0x00000001));
        assert_eq!(device_mask_by_name("analog-dock"), Some(0x00000800));
        assert_eq!(device_mask_by_name("digital-dock"), Some(0x00001000));
        assert_eq!(device_mask_by_name("comms"), Some(0x80000001));
        assert_eq!(device_mask_by_name("ambient"), Some(0x80000002));
        assert_eq!(device_mask_by_name("builtin-mic"), Some(0x80000004));
        assert_eq!(device_mask_by_name("headset"), Some(0x80000010));
        assert_eq!(device_mask_by_name("digital"), Some(0x80000020));
        assert_eq!(device_mask_by_name("back-mic"), Some(0x80000080));
        assert_eq!(device_mask_by_name("hdmi"), None);
        assert_eq!(device_mask_by_name("Speaker"), None);
    }

    #[test]
    fn direction_namespace() {
        DEVICE_NAMES.iter().for_each(|&(name, mask)| {
            let expected = if name == "comms"
                || name == "ambient"
                || name == "builtin-mic"
                || name == "headset"
                || name == "digital"
                || name == "back-mic"
            {
                Direction::Input
            } else {
                Direction::Output
            };
            assert_eq!(Direction::of(mask), expected, "{}", name);
        });

        assert_eq!(Direction::of(DEVICE_BIT_IN), Direction::Input);
        assert_eq!(Direction::of(DEVICE_BIT_IN - 1), Direction::Output);
    }

    #[test]
    fn direction_bits() {
        assert_eq!(Direction::Input.device_bits(DEVICE_IN_BUILTIN_MIC), 0x00000004);
        assert_eq!(Direction::Output.device_bits(DEVICE_OUT_SPEAKER), 0x00000002);
        assert_eq!(Direction::Input.compose(0x00000004), DEVICE_IN_BUILTIN_MIC);
        assert_eq!(Direction::Input.compose(0), 0);
        assert_eq!(Direction::Output.compose(0x00000002), DEVICE_OUT_SPEAKER);

        assert!(Direction::Output.accepts(DEVICE_OUT_SPEAKER));
        assert!(!Direction::Output.accepts(DEVICE_IN_BUILTIN_MIC));
        assert!(Direction::Input.accepts(DEVICE_IN_BUILTIN_MIC));
        assert!(Direction::Input.accepts(0));
        assert!(!Direction::Input.accepts(DEVICE_OUT_SPEAKER));

        assert_eq!(DEVICE_OUT_ALL & DEVICE_BIT_IN, 0);
        assert_eq!(DEVICE_IN_ALL & DEVICE_BIT_IN, DEVICE_BIT_IN);
    }
}
