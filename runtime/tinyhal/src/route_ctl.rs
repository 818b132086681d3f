// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Control elements to operate the audio device.
//!
//! The mask of input devices is expressed without the flag of input, since the value of
//! integer element is signed 32 bit.

use {super::*, std::convert::TryFrom};

const OUTPUT_DEVICES_NAME: &str = "output-devices";
const INPUT_DEVICES_NAME: &str = "input-devices";
const SUPPORTED_DEVICES_NAME: &str = "supported-devices";
const MIC_MUTE_NAME: &str = "mic-mute";
const AUDIO_MODE_NAME: &str = "audio-mode";

const AUDIO_MODES: &[AudioMode] = &[
    AudioMode::Normal,
    AudioMode::Ringtone,
    AudioMode::InCall,
    AudioMode::InCommunication,
];

#[derive(Default, Debug)]
pub struct RouteCtl {
    pub elem_id_list: Vec<ElemId>,
    state: DeviceSwitchState,
    // For output and input.
    supported: [u32; 2],
    mic_mute: bool,
    mode: AudioMode,
}

fn device_bits_to_val(direction: Direction, mask: u32) -> i32 {
    direction.device_bits(mask) as i32
}

fn audio_mode_to_val(mode: AudioMode) -> i32 {
    AUDIO_MODES
        .iter()
        .position(|&m| m == mode)
        .map(|pos| pos as i32)
        .unwrap_or_default()
}

fn val_to_audio_mode(val: i32) -> Result<AudioMode, Error> {
    usize::try_from(val)
        .ok()
        .and_then(|pos| AUDIO_MODES.get(pos).copied())
        .ok_or_else(|| {
            let msg = format!("Invalid value for audio mode: {}", val);
            Error::new(FileError::Inval, &msg)
        })
}

fn val_to_device_mask(direction: Direction, val: i32) -> Result<u32, Error> {
    u32::try_from(val)
        .ok()
        .filter(|bits| bits & DEVICE_BIT_IN == 0)
        .map(|bits| direction.compose(bits))
        .ok_or_else(|| {
            let msg = format!("Invalid value for {:?} devices: {}", direction, val);
            Error::new(RouteError::InvalidDeviceMask, &msg)
        })
}

impl RouteCtl {
    fn request_devices<M: MixerOperation>(
        &mut self,
        device: &mut AudioHwDevice<M>,
        direction: Direction,
        val: i32,
    ) -> Result<(), Error> {
        let mask = val_to_device_mask(direction, val)?;
        let report = device.router().request_devices(direction, mask)?;
        report
            .faults
            .iter()
            .for_each(|fault| warn!("{}", fault));
        self.cache(device)
    }
}

impl<M: MixerOperation> CtlModel<AudioHwDevice<M>> for RouteCtl {
    fn cache(&mut self, device: &mut AudioHwDevice<M>) -> Result<(), Error> {
        self.state = device.route_state();
        let table = device.router().table();
        self.supported = [Direction::Output, Direction::Input]
            .iter()
            .fold([0; 2], |mut supported, &direction| {
                supported[direction as usize] = table
                    .routes(direction)
                    .fold(0, |mask, route| mask | route.mask);
                supported
            });
        self.mic_mute = device.mic_mute();
        self.mode = device.mode();
        Ok(())
    }

    fn load(&mut self, card_cntr: &mut CardCntr) -> Result<(), Error> {
        let output_max = device_bits_to_val(Direction::Output, DEVICE_OUT_ALL);
        let input_max = device_bits_to_val(Direction::Input, DEVICE_IN_ALL);

        let elem_id = ElemId::new_by_name(ElemIfaceType::Mixer, 0, 0, OUTPUT_DEVICES_NAME, 0);
        card_cntr
            .add_int_elems(&elem_id, 1, 0, output_max, 1, 1, true)
            .map(|mut elem_id_list| self.elem_id_list.append(&mut elem_id_list))?;

        let elem_id = ElemId::new_by_name(ElemIfaceType::Mixer, 0, 0, INPUT_DEVICES_NAME, 0);
        card_cntr
            .add_int_elems(&elem_id, 1, 0, input_max, 1, 1, true)
            .map(|mut elem_id_list| self.elem_id_list.append(&mut elem_id_list))?;

        // For output and input devices.
        let elem_id =
            ElemId::new_by_name(ElemIfaceType::Mixer, 0, 0, SUPPORTED_DEVICES_NAME, 0);
        card_cntr
            .add_int_elems(&elem_id, 1, 0, output_max.max(input_max), 1, 2, true)
            .map(|mut elem_id_list| self.elem_id_list.append(&mut elem_id_list))?;

        let elem_id = ElemId::new_by_name(ElemIfaceType::Mixer, 0, 0, MIC_MUTE_NAME, 0);
        card_cntr
            .add_bool_elems(&elem_id, 1, 1, true)
            .map(|mut elem_id_list| self.elem_id_list.append(&mut elem_id_list))?;

        let elem_id = ElemId::new_by_name(ElemIfaceType::Mixer, 0, 0, AUDIO_MODE_NAME, 0);
        let mode_max = AUDIO_MODES.len() as i32 - 1;
        card_cntr
            .add_int_elems(&elem_id, 1, 0, mode_max, 1, 1, true)
            .map(|mut elem_id_list| self.elem_id_list.append(&mut elem_id_list))?;

        Ok(())
    }

    fn read(
        &mut self,
        _: &mut AudioHwDevice<M>,
        elem_id: &ElemId,
        elem_value: &mut ElemValue,
    ) -> Result<bool, Error> {
        match elem_id.name().as_str() {
            OUTPUT_DEVICES_NAME => {
                let val = device_bits_to_val(Direction::Output, self.state.desired_out);
                ElemValueAccessor::<i32>::set_val(elem_value, || Ok(val))?;
                Ok(true)
            }
            INPUT_DEVICES_NAME => {
                let val = device_bits_to_val(Direction::Input, self.state.desired_in);
                ElemValueAccessor::<i32>::set_val(elem_value, || Ok(val))?;
                Ok(true)
            }
            SUPPORTED_DEVICES_NAME => {
                let supported = self.supported;
                ElemValueAccessor::<i32>::set_vals(elem_value, 2, |idx| {
                    let direction = if idx == 0 {
                        Direction::Output
                    } else {
                        Direction::Input
                    };
                    Ok(device_bits_to_val(direction, supported[idx]))
                })?;
                Ok(true)
            }
            MIC_MUTE_NAME => {
                let mic_mute = self.mic_mute;
                ElemValueAccessor::<bool>::set_val(elem_value, || Ok(mic_mute))?;
                Ok(true)
            }
            AUDIO_MODE_NAME => {
                let val = audio_mode_to_val(self.mode);
                ElemValueAccessor::<i32>::set_val(elem_value, || Ok(val))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn write(
        &mut self,
        device: &mut AudioHwDevice<M>,
        elem_id: &ElemId,
        _: &ElemValue,
        new: &ElemValue,
    ) -> Result<bool, Error> {
        match elem_id.name().as_str() {
            OUTPUT_DEVICES_NAME => {
                ElemValueAccessor::<i32>::get_val(new, |val| {
                    self.request_devices(device, Direction::Output, val)
                })?;
                Ok(true)
            }
            INPUT_DEVICES_NAME => {
                ElemValueAccessor::<i32>::get_val(new, |val| {
                    self.request_devices(device, Direction::Input, val)
                })?;
                Ok(true)
            }
            SUPPORTED_DEVICES_NAME => {
                let msg = "Supported devices are not writable";
                Err(Error::new(FileError::Perm, msg))
            }
            MIC_MUTE_NAME => {
                ElemValueAccessor::<bool>::get_val(new, |val| {
                    device.set_mic_mute(val);
                    self.mic_mute = val;
                    Ok(())
                })?;
                Ok(true)
            }
            AUDIO_MODE_NAME => {
                ElemValueAccessor::<i32>::get_val(new, |val| {
                    let mode = val_to_audio_mode(val)?;
                    device.set_mode(mode);
                    self.mode = mode;
                    Ok(())
                })?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
