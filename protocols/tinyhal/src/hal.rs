// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Audio device and streams.
//!
//! The audio device owns the router and is shared by streams. Each stream requests its devices
//! at open, enables the routes at the first transfer, and releases them at standby. The routes
//! for the direction are released when the last running stream in the direction goes standby.

use {
    super::{config::*, ctl::MixerOperation, mask::*, switch::*, RouteError},
    glib::Error,
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    tracing::{debug, error, warn},
};

/// The card for built-in codec.
pub const CARD_DEFAULT: u32 = 0;
/// The card for USB audio device in dock.
pub const CARD_USB: u32 = 2;

/// The port for multimedia playback.
pub const PORT_MM_LP: u32 = 0;
/// The port for capture from microphone.
pub const PORT_MIC_CAP: u32 = 3;

pub const MM_SAMPLING_RATE: u32 = 44100;
pub const MM_PERIOD_SIZE: u32 = 24 * 80;
pub const PLAYBACK_PERIOD_COUNT: u32 = 4;
pub const CAPTURE_PERIOD_COUNT: u32 = 2;

/// The key of parameter to route stream.
pub const PARAMETER_STREAM_ROUTING: &str = "routing";

/// The mode of audio device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AudioMode {
    Normal,
    Ringtone,
    InCall,
    InCommunication,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self::Normal
    }
}

/// The device of PCM transport.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PcmTarget {
    pub card: u32,
    pub port: u32,
}

impl PcmTarget {
    /// Select the device for the direction. Playback goes to USB audio device when any dock is
    /// desired.
    pub fn select(direction: Direction, devices: u32) -> Self {
        match direction {
            Direction::Output => {
                let card = if devices & (DEVICE_OUT_ANLG_DOCK_HEADSET | DEVICE_OUT_DGTL_DOCK_HEADSET)
                    > 0
                {
                    CARD_USB
                } else {
                    CARD_DEFAULT
                };
                Self {
                    card,
                    port: PORT_MM_LP,
                }
            }
            Direction::Input => Self {
                card: CARD_DEFAULT,
                port: PORT_MIC_CAP,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PcmFormat {
    S16Le,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::S16Le
    }
}

/// The configuration of PCM transport.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PcmConfig {
    pub channels: u32,
    pub rate: u32,
    pub period_size: u32,
    pub period_count: u32,
    pub format: PcmFormat,
}

impl PcmConfig {
    pub fn playback() -> Self {
        Self {
            channels: 2,
            rate: MM_SAMPLING_RATE,
            period_size: MM_PERIOD_SIZE,
            period_count: PLAYBACK_PERIOD_COUNT,
            format: PcmFormat::S16Le,
        }
    }

    pub fn capture(channels: u32) -> Self {
        Self {
            channels,
            rate: MM_SAMPLING_RATE,
            period_size: MM_PERIOD_SIZE,
            period_count: CAPTURE_PERIOD_COUNT,
            format: PcmFormat::S16Le,
        }
    }
}

/// The trait for primitive operations of PCM transport.
pub trait PcmOperation {
    fn open(&mut self, target: &PcmTarget, config: &PcmConfig) -> Result<(), Error>;
    fn close(&mut self) -> Result<(), Error>;
    fn write(&mut self, data: &[u8]) -> Result<(), Error>;
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error>;
}

/// Parse the routing parameter in the list of `key=value` pairs delimited by semicolon. The
/// value is decimal, signed or unsigned. The zero value is ignored as well as missing key.
pub fn parse_routing_param(kvpairs: &str) -> Result<Option<u32>, Error> {
    let value = kvpairs
        .split(';')
        .filter_map(|pair| {
            let mut entries = pair.splitn(2, '=');
            let key = entries.next()?.trim();
            let value = entries.next().unwrap_or("").trim();
            Some((key, value))
        })
        .filter(|(key, _)| *key == PARAMETER_STREAM_ROUTING)
        .map(|(_, value)| value)
        .last();

    let value = match value {
        Some(value) => value,
        None => return Ok(None),
    };

    let mask = value
        .parse::<u32>()
        .or_else(|_| value.parse::<i32>().map(|val| val as u32))
        .map_err(|_| {
            let msg = format!("Invalid routing value '{}'", value);
            Error::new(RouteError::InvalidDeviceMask, &msg)
        })?;

    if mask == 0 {
        warn!("Routing with no devices");
        Ok(None)
    } else {
        Ok(Some(mask))
    }
}

#[derive(Debug, Default)]
struct RunningStreams {
    output: usize,
    input: usize,
}

impl RunningStreams {
    fn count_mut(&mut self, direction: Direction) -> &mut usize {
        match direction {
            Direction::Output => &mut self.output,
            Direction::Input => &mut self.input,
        }
    }
}

/// The audio device to route physical devices for streams.
pub struct AudioHwDevice<M: MixerOperation> {
    router: DeviceRouter<M>,
    // Counted under the lock together with release of routes.
    streams: Mutex<RunningStreams>,
    mode: Mutex<AudioMode>,
    mic_mute: AtomicBool,
}

impl<M: MixerOperation> AudioHwDevice<M> {
    /// Load the route configuration with the mixer, then bootstrap routes.
    pub fn open(mut mixer: M, source: &RouteSource) -> Result<Self, Error> {
        let table = load_route_config(source, &mut mixer)?;
        Self::new(DeviceRouter::new(table, mixer))
    }

    /// Enable speaker for output and built-in microphone for input.
    pub fn new(router: DeviceRouter<M>) -> Result<Self, Error> {
        router.request_output_devices(DEVICE_OUT_SPEAKER)?;
        router.request_input_devices(DEVICE_IN_BUILTIN_MIC)?;

        Ok(Self {
            router,
            streams: Default::default(),
            mode: Default::default(),
            mic_mute: Default::default(),
        })
    }

    fn lock_streams(&self) -> MutexGuard<'_, RunningStreams> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn router(&self) -> &DeviceRouter<M> {
        &self.router
    }

    pub fn supported_devices(&self) -> u32 {
        self.router.supported_devices()
    }

    pub fn route_state(&self) -> DeviceSwitchState {
        self.router.state()
    }

    /// Request devices for the stream just opened.
    pub fn stream_opened(&self, direction: Direction, devices: u32) -> Result<SwitchReport, Error> {
        debug!("Stream opened for {:?} devices 0x{:08x}", direction, devices);
        self.router.request_devices(direction, devices)
    }

    /// Enable routes for the stream starting transfer.
    pub fn first_transfer(&self, direction: Direction) -> SwitchReport {
        let mut streams = self.lock_streams();
        *streams.count_mut(direction) += 1;
        self.router.reapply_devices(direction)
    }

    /// Disable routes for the stream going standby, unless the other stream in the direction
    /// is still running.
    pub fn stream_standby(&self, direction: Direction) -> SwitchReport {
        let mut streams = self.lock_streams();
        let count = streams.count_mut(direction);
        *count = count.saturating_sub(1);
        if *count > 0 {
            debug!("{} {:?} streams still running", count, direction);
            Default::default()
        } else {
            self.router.release_devices(direction, 0)
        }
    }

    #[cfg(test)]
    fn running_streams(&self, direction: Direction) -> usize {
        *self.lock_streams().count_mut(direction)
    }

    pub fn set_mode(&self, mode: AudioMode) {
        debug!("Mode: {:?}", mode);
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn mode(&self) -> AudioMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mic_mute(&self, state: bool) {
        debug!("Mic mute: {}", state);
        self.mic_mute.store(state, Ordering::SeqCst);
    }

    pub fn mic_mute(&self) -> bool {
        self.mic_mute.load(Ordering::SeqCst)
    }
}

/// The common interface of streams.
pub trait AudioStream {
    fn direction(&self) -> Direction;

    /// Apply the list of `key=value` pairs.
    fn set_parameters(&mut self, kvpairs: &str) -> Result<(), Error>;

    /// Stop transfer and release the routes.
    fn standby(&mut self) -> Result<(), Error>;
}

struct StreamCore<M: MixerOperation, P: PcmOperation> {
    device: Arc<AudioHwDevice<M>>,
    direction: Direction,
    pcm: P,
    config: PcmConfig,
    running: bool,
}

impl<M: MixerOperation, P: PcmOperation> StreamCore<M, P> {
    fn new(
        device: Arc<AudioHwDevice<M>>,
        direction: Direction,
        devices: u32,
        pcm: P,
        config: PcmConfig,
    ) -> Result<Self, Error> {
        device.stream_opened(direction, devices)?;
        Ok(Self {
            device,
            direction,
            pcm,
            config,
            running: false,
        })
    }

    fn start(&mut self) -> Result<(), Error> {
        if self.running {
            return Ok(());
        }

        self.device.first_transfer(self.direction);

        let devices = self.device.route_state().desired(self.direction);
        let target = PcmTarget::select(self.direction, devices);
        debug!("Opening PCM ({}, {})", target.card, target.port);

        if let Err(e) = self.pcm.open(&target, &self.config) {
            error!("Failed to open {:?} PCM: {}", self.direction, e);
            self.device.stream_standby(self.direction);
            return Err(e);
        }

        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        if !self.running {
            return Ok(());
        }

        debug!("Closing {:?} PCM", self.direction);
        self.pcm.close().map_err(|e| {
            error!("Failed to close {:?} PCM: {}", self.direction, e);
            e
        })?;
        self.running = false;

        self.device.stream_standby(self.direction);
        Ok(())
    }

    fn set_parameters(&mut self, kvpairs: &str) -> Result<(), Error> {
        if let Some(devices) = parse_routing_param(kvpairs)? {
            self.device
                .router()
                .request_devices(self.direction, devices)?;
        }
        Ok(())
    }
}

impl<M: MixerOperation, P: PcmOperation> Drop for StreamCore<M, P> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop stream at close: {}", e);
        }
    }
}

/// The stream for playback.
pub struct OutputStream<M: MixerOperation, P: PcmOperation>(StreamCore<M, P>);

impl<M: MixerOperation, P: PcmOperation> OutputStream<M, P> {
    pub fn open(device: Arc<AudioHwDevice<M>>, devices: u32, pcm: P) -> Result<Self, Error> {
        StreamCore::new(
            device,
            Direction::Output,
            devices,
            pcm,
            PcmConfig::playback(),
        )
        .map(Self)
    }

    /// Write the frames. The PCM is opened at the first write after open or standby.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.0.start()?;
        self.0.pcm.write(data)?;
        Ok(data.len())
    }

    pub fn is_running(&self) -> bool {
        self.0.running
    }
}

impl<M: MixerOperation, P: PcmOperation> AudioStream for OutputStream<M, P> {
    fn direction(&self) -> Direction {
        Direction::Output
    }

    fn set_parameters(&mut self, kvpairs: &str) -> Result<(), Error> {
        self.0.set_parameters(kvpairs)
    }

    fn standby(&mut self) -> Result<(), Error> {
        self.0.stop()
    }
}

/// The stream for capture.
pub struct InputStream<M: MixerOperation, P: PcmOperation>(StreamCore<M, P>);

impl<M: MixerOperation, P: PcmOperation> InputStream<M, P> {
    pub fn open(
        device: Arc<AudioHwDevice<M>>,
        devices: u32,
        channels: u32,
        pcm: P,
    ) -> Result<Self, Error> {
        StreamCore::new(
            device,
            Direction::Input,
            devices,
            pcm,
            PcmConfig::capture(channels),
        )
        .map(Self)
    }

    /// Read the frames. The PCM is opened at the first read after open or standby.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.0.start()?;
        self.0.pcm.read(buf)?;
        Ok(buf.len())
    }

    pub fn is_running(&self) -> bool {
        self.0.running
    }
}

impl<M: MixerOperation, P: PcmOperation> AudioStream for InputStream<M, P> {
    fn direction(&self) -> Direction {
        Direction::Input
    }

    fn set_parameters(&mut self, kvpairs: &str) -> Result<(), Error> {
        self.0.set_parameters(kvpairs)
    }

    fn standby(&mut self) -> Result<(), Error> {
        self.0.stop()
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::testing::*,
        glib::FileError,
        std::{path::Path, sync::Mutex},
    };

    const HAL_CONFIG: &str = r#"<audiohal>
  <device name="speaker">
    <path name="on"><ctl name="SPK" val="1"/></path>
    <path name="off"><ctl name="SPK" val="0"/></path>
  </device>
  <device name="headphone">
    <path name="on"><ctl name="HP" val="1"/></path>
    <path name="off"><ctl name="HP" val="0"/></path>
  </device>
  <device name="digital-dock">
    <path name="on"><ctl name="DOCK" val="1"/></path>
    <path name="off"><ctl name="DOCK" val="0"/></path>
  </device>
  <device name="builtin-mic">
    <path name="on"><ctl name="MIC" val="1"/></path>
    <path name="off"><ctl name="MIC" val="0"/></path>
  </device>
  <device name="headset">
    <path name="on"><ctl name="HSMIC" val="1"/></path>
    <path name="off"><ctl name="HSMIC" val="0"/></path>
  </device>
</audiohal>"#;

    #[derive(Debug, Clone, Eq, PartialEq)]
    enum PcmEvent {
        Open(PcmTarget, PcmConfig),
        Close,
        Write(usize),
        Read(usize),
    }

    #[derive(Debug, Clone, Default)]
    struct FakePcm {
        events: Arc<Mutex<Vec<PcmEvent>>>,
        failing_open: bool,
    }

    impl FakePcm {
        fn events(&self) -> Vec<PcmEvent> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, event: PcmEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl PcmOperation for FakePcm {
        fn open(&mut self, target: &PcmTarget, config: &PcmConfig) -> Result<(), Error> {
            if self.failing_open {
                Err(Error::new(FileError::Busy, "PCM busy"))
            } else {
                self.record(PcmEvent::Open(*target, *config));
                Ok(())
            }
        }

        fn close(&mut self) -> Result<(), Error> {
            self.record(PcmEvent::Close);
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<(), Error> {
            self.record(PcmEvent::Write(data.len()));
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            self.record(PcmEvent::Read(buf.len()));
            Ok(())
        }
    }

    fn device() -> (Arc<AudioHwDevice<RecordingMixer>>, RecordingMixer) {
        let mut mixer = ["SPK", "HP", "DOCK", "MIC", "HSMIC"]
            .iter()
            .fold(RecordingMixer::default(), |mixer, name| {
                mixer.with_ctl(name, 1)
            });
        let recorder = mixer.clone();
        let table = parse_route_config(HAL_CONFIG.as_bytes(), &mut mixer).unwrap();
        let device = AudioHwDevice::new(DeviceRouter::new(table, mixer)).unwrap();
        (Arc::new(device), recorder)
    }

    #[test]
    fn bootstrap_routes() {
        let (device, mixer) = device();
        assert_eq!(
            mixer.writes(),
            vec![MixerWrite::value("SPK", 0, 1), MixerWrite::value("MIC", 0, 1)]
        );

        let state = device.route_state();
        assert_eq!(state.active_out, DEVICE_OUT_SPEAKER);
        assert_eq!(state.active_in, DEVICE_IN_BUILTIN_MIC);
        assert_eq!(
            device.supported_devices(),
            DEVICE_OUT_SPEAKER
                | DEVICE_OUT_WIRED_HEADSET
                | DEVICE_OUT_WIRED_HEADPHONE
                | DEVICE_OUT_DGTL_DOCK_HEADSET
                | DEVICE_IN_BUILTIN_MIC
                | DEVICE_IN_WIRED_HEADSET
        );
        assert_eq!(device.mode(), AudioMode::Normal);
        assert!(!device.mic_mute());
    }

    #[test]
    fn output_stream_lifecycle() {
        let (device, mixer) = device();
        mixer.clear();

        let pcm = FakePcm::default();
        let mut stream =
            OutputStream::open(device.clone(), DEVICE_OUT_WIRED_HEADPHONE, pcm.clone()).unwrap();
        assert_eq!(
            mixer.writes(),
            vec![MixerWrite::value("HP", 0, 1), MixerWrite::value("SPK", 0, 0)]
        );
        assert!(pcm.events().is_empty());

        mixer.clear();
        assert_eq!(stream.write(&[0; 16]).unwrap(), 16);
        assert_eq!(stream.write(&[0; 8]).unwrap(), 8);
        assert!(stream.is_running());
        assert_eq!(mixer.writes(), vec![MixerWrite::value("HP", 0, 1)]);
        assert_eq!(
            pcm.events(),
            vec![
                PcmEvent::Open(
                    PcmTarget {
                        card: CARD_DEFAULT,
                        port: PORT_MM_LP
                    },
                    PcmConfig::playback()
                ),
                PcmEvent::Write(16),
                PcmEvent::Write(8),
            ]
        );
        assert_eq!(device.running_streams(Direction::Output), 1);

        mixer.clear();
        stream.standby().unwrap();
        assert!(!stream.is_running());
        assert_eq!(mixer.writes(), vec![MixerWrite::value("HP", 0, 0)]);
        assert_eq!(pcm.events().last(), Some(&PcmEvent::Close));

        let state = device.route_state();
        assert_eq!(state.desired_out, DEVICE_OUT_WIRED_HEADPHONE);
        assert_eq!(state.active_out, 0);

        // Standby again has no effect.
        mixer.clear();
        stream.standby().unwrap();
        assert!(mixer.writes().is_empty());

        // Transfer after standby enables the routes again.
        stream.write(&[0; 4]).unwrap();
        assert_eq!(mixer.writes(), vec![MixerWrite::value("HP", 0, 1)]);
        assert_eq!(device.route_state().active_out, DEVICE_OUT_WIRED_HEADPHONE);
    }

    #[test]
    fn output_to_dock() {
        let (device, _) = device();
        let pcm = FakePcm::default();
        let mut stream =
            OutputStream::open(device, DEVICE_OUT_DGTL_DOCK_HEADSET, pcm.clone()).unwrap();
        stream.write(&[0; 4]).unwrap();
        assert_eq!(
            pcm.events()[0],
            PcmEvent::Open(
                PcmTarget {
                    card: CARD_USB,
                    port: PORT_MM_LP
                },
                PcmConfig::playback()
            )
        );
    }

    #[test]
    fn input_stream_lifecycle() {
        let (device, mixer) = device();
        mixer.clear();

        let pcm = FakePcm::default();
        let mut stream =
            InputStream::open(device.clone(), DEVICE_IN_WIRED_HEADSET, 1, pcm.clone()).unwrap();
        assert_eq!(stream.direction(), Direction::Input);
        assert_eq!(
            mixer.writes(),
            vec![
                MixerWrite::value("HSMIC", 0, 1),
                MixerWrite::value("MIC", 0, 0)
            ]
        );

        let mut buf = [0; 32];
        assert_eq!(stream.read(&mut buf).unwrap(), 32);
        assert_eq!(
            pcm.events(),
            vec![
                PcmEvent::Open(
                    PcmTarget {
                        card: CARD_DEFAULT,
                        port: PORT_MIC_CAP
                    },
                    PcmConfig::capture(1)
                ),
                PcmEvent::Read(32),
            ]
        );

        mixer.clear();
        stream.standby().unwrap();
        assert_eq!(mixer.writes(), vec![MixerWrite::value("HSMIC", 0, 0)]);
        assert_eq!(device.route_state().active_out, DEVICE_OUT_SPEAKER);
    }

    #[test]
    fn standby_with_other_running_stream() {
        let (device, mixer) = device();

        let mut first = OutputStream::open(device.clone(), DEVICE_OUT_SPEAKER, FakePcm::default())
            .unwrap();
        let mut second =
            OutputStream::open(device.clone(), DEVICE_OUT_SPEAKER, FakePcm::default()).unwrap();
        first.write(&[0; 4]).unwrap();
        second.write(&[0; 4]).unwrap();
        assert_eq!(device.running_streams(Direction::Output), 2);

        mixer.clear();
        first.standby().unwrap();
        assert!(mixer.writes().is_empty());
        assert_eq!(device.route_state().active_out, DEVICE_OUT_SPEAKER);

        second.standby().unwrap();
        assert_eq!(mixer.writes(), vec![MixerWrite::value("SPK", 0, 0)]);
        assert_eq!(device.running_streams(Direction::Output), 0);
    }

    #[test]
    fn close_running_stream() {
        let (device, mixer) = device();
        let pcm = FakePcm::default();
        let mut stream = OutputStream::open(device.clone(), DEVICE_OUT_SPEAKER, pcm.clone()).unwrap();
        stream.write(&[0; 4]).unwrap();

        mixer.clear();
        drop(stream);
        assert_eq!(pcm.events().last(), Some(&PcmEvent::Close));
        assert_eq!(mixer.writes(), vec![MixerWrite::value("SPK", 0, 0)]);
        assert_eq!(device.running_streams(Direction::Output), 0);
    }

    #[test]
    fn pcm_open_failure() {
        let (device, mixer) = device();
        let pcm = FakePcm {
            failing_open: true,
            ..Default::default()
        };
        let mut stream = OutputStream::open(device.clone(), DEVICE_OUT_SPEAKER, pcm).unwrap();

        mixer.clear();
        let error = stream.write(&[0; 4]).unwrap_err();
        assert_eq!(error.kind::<FileError>(), Some(FileError::Busy));
        assert!(!stream.is_running());
        assert_eq!(device.running_streams(Direction::Output), 0);
        assert_eq!(
            mixer.writes(),
            vec![MixerWrite::value("SPK", 0, 1), MixerWrite::value("SPK", 0, 0)]
        );
    }

    #[test]
    fn stream_parameters() {
        let (device, mixer) = device();
        let mut stream =
            OutputStream::open(device.clone(), DEVICE_OUT_SPEAKER, FakePcm::default()).unwrap();
        mixer.clear();

        stream.set_parameters("routing=8").unwrap();
        assert_eq!(
            mixer.writes(),
            vec![MixerWrite::value("HP", 0, 1), MixerWrite::value("SPK", 0, 0)]
        );

        mixer.clear();
        stream.set_parameters("routing=0").unwrap();
        stream.set_parameters("format=1;channels=3").unwrap();
        assert!(mixer.writes().is_empty());

        let error = stream.set_parameters("routing=speaker").unwrap_err();
        assert_eq!(
            error.kind::<RouteError>(),
            Some(RouteError::InvalidDeviceMask)
        );
        let error = stream.set_parameters("routing=-2147483644").unwrap_err();
        assert_eq!(
            error.kind::<RouteError>(),
            Some(RouteError::InvalidDeviceMask)
        );
        assert!(mixer.writes().is_empty());

        let mut stream =
            InputStream::open(device.clone(), DEVICE_IN_BUILTIN_MIC, 2, FakePcm::default())
                .unwrap();
        stream.set_parameters("routing=-2147483632").unwrap();
        assert_eq!(device.route_state().active_in, DEVICE_IN_WIRED_HEADSET);
    }

    #[test]
    fn routing_param() {
        assert_eq!(parse_routing_param("routing=2").unwrap(), Some(2));
        assert_eq!(
            parse_routing_param("format=1;routing=12;channels=2").unwrap(),
            Some(12)
        );
        assert_eq!(
            parse_routing_param("routing=2147483652").unwrap(),
            Some(DEVICE_IN_BUILTIN_MIC)
        );
        assert_eq!(
            parse_routing_param("routing=-2147483644").unwrap(),
            Some(DEVICE_IN_BUILTIN_MIC)
        );
        assert_eq!(parse_routing_param("routing=2;routing=4").unwrap(), Some(4));
        assert_eq!(parse_routing_param("routing=0").unwrap(), None);
        assert_eq!(parse_routing_param("").unwrap(), None);
        assert_eq!(parse_routing_param("screen_state=on").unwrap(), None);

        ["routing=", "routing=0x2", "routing=2a", "routing=99999999999"]
            .iter()
            .for_each(|kvpairs| {
                let error = parse_routing_param(kvpairs).unwrap_err();
                assert_eq!(
                    error.kind::<RouteError>(),
                    Some(RouteError::InvalidDeviceMask),
                    "{}",
                    kvpairs
                );
            });
    }

    #[test]
    fn device_mode_and_mic_mute() {
        let (device, _) = device();
        device.set_mode(AudioMode::InCall);
        assert_eq!(device.mode(), AudioMode::InCall);
        device.set_mic_mute(true);
        assert!(device.mic_mute());
        device.set_mic_mute(false);
        assert!(!device.mic_mute());
    }

    #[test]
    fn open_without_config() {
        let source = RouteSource::new(Some(Path::new("/nonexistent/tinyhal")), None);
        let result = AudioHwDevice::open(RecordingMixer::default(), &source);
        match result {
            Err(e) => assert_eq!(e.kind::<RouteError>(), Some(RouteError::ConfigNotFound)),
            Ok(_) => unreachable!(),
        }
    }
}
