// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Loader of route configuration.
//!
//! The configuration is XML markup with `device`, `path`, and `ctl` elements. The `device`
//! element has the name of physical device, and includes `path` elements with `on` or `off`
//! role. The `path` element includes `ctl` elements with the name of mixer control and the
//! literal of value. The `path` element outside of any `device` element is the default path,
//! which is applied to the mixer at once when it is closed.
//!
//! The content is read and parsed incrementally by fixed-size chunk.

use {
    super::{ctl::*, mask::device_mask_by_name, route::*, RouteError},
    glib::Error,
    quick_xml::{
        events::{BytesStart, Event},
        Reader,
    },
    std::{
        fs::File,
        io::{BufReader, Read},
        path::{Path, PathBuf},
    },
    tracing::{debug, error, info, warn},
};

/// The size of chunk to read the configuration.
pub const CONFIG_CHUNK_SIZE: usize = 256;

/// The directory to look up configuration.
pub const DEFAULT_CONFIG_DIR: &str = "/system/etc/sound";

/// The name of board used when no board is identified.
pub const DEFAULT_BOARD_NAME: &str = "tiny_hw";

/// The location of configuration resource for the board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RouteSource {
    pub dir: PathBuf,
    pub board: String,
}

impl Default for RouteSource {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            board: DEFAULT_BOARD_NAME.to_string(),
        }
    }
}

impl RouteSource {
    /// Fallback to the default directory and board name when they are not given. The empty
    /// name of board is regarded as unset.
    pub fn new(dir: Option<&Path>, board: Option<&str>) -> Self {
        let dir = dir
            .map(|d| d.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        let board = board
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BOARD_NAME)
            .to_string();
        Self { dir, board }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.board)
    }
}

/// Open the configuration resource and parse it. Default paths are applied to the mixer.
pub fn load_route_config<M: MixerOperation>(
    source: &RouteSource,
    mixer: &mut M,
) -> Result<RouteTable, Error> {
    let path = source.path();
    debug!("Reading configuration from {}", path.display());

    let file = File::open(&path).map_err(|e| {
        let msg = format!("Failed to open {}: {}", path.display(), e);
        error!("{}", msg);
        Error::new(RouteError::ConfigNotFound, &msg)
    })?;

    parse_route_config(file, mixer)
}

/// Parse the configuration from the source. Default paths are applied to the mixer.
pub fn parse_route_config<R: Read, M: MixerOperation>(
    src: R,
    mixer: &mut M,
) -> Result<RouteTable, Error> {
    parse_route_config_in_chunks(src, mixer, CONFIG_CHUNK_SIZE)
}

fn parse_route_config_in_chunks<R: Read, M: MixerOperation>(
    src: R,
    mixer: &mut M,
    chunk_size: usize,
) -> Result<RouteTable, Error> {
    let tracker = LineTracker::new(src);
    let mut reader = Reader::from_reader(BufReader::with_capacity(chunk_size, tracker));
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = true;

    let mut parser = RouteConfigParser::new(mixer);
    let mut depth = 0usize;
    let mut has_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 0 && has_root {
                    let pos = reader.buffer_position() as u64;
                    Err(parse_error(&reader, pos, "junk after document element"))?;
                }
                depth += 1;

                let attrs = ElemAttrs::parse(&e).map_err(|msg| {
                    let pos = reader.buffer_position() as u64;
                    parse_error(&reader, pos, &msg)
                })?;
                parser.start_element(e.name().as_ref(), &attrs);
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    has_root = true;
                }
                parser.end_element(e.name().as_ref());
            }
            Ok(Event::Text(t)) => {
                if depth == 0 && t.iter().any(|b| !b.is_ascii_whitespace()) {
                    let pos = reader.buffer_position() as u64;
                    Err(parse_error(&reader, pos, "junk outside document element"))?;
                }
            }
            Ok(Event::CData(_)) if depth == 0 => {
                let pos = reader.buffer_position() as u64;
                Err(parse_error(&reader, pos, "junk outside document element"))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => (),
            Err(quick_xml::Error::Io(e)) => {
                let msg = format!("I/O error reading config: {}", e);
                error!("{}", msg);
                Err(Error::new(RouteError::ConfigRead, &msg))?;
            }
            Err(e) => {
                let pos = reader.error_position() as u64;
                Err(parse_error(&reader, pos, &e.to_string()))?;
            }
        }
        buf.clear();
    }

    if depth > 0 {
        let pos = reader.buffer_position() as u64;
        Err(parse_error(&reader, pos, "unclosed element"))?;
    } else if !has_root {
        let pos = reader.buffer_position() as u64;
        Err(parse_error(&reader, pos, "no element found"))?;
    }

    Ok(parser.table)
}

fn parse_error<R: Read>(
    reader: &Reader<BufReader<LineTracker<R>>>,
    pos: u64,
    cause: &str,
) -> Error {
    let line = reader.get_ref().get_ref().line_at(pos);
    let msg = format!("Parse error at line {}: {}", line, cause);
    error!("{}", msg);
    Error::new(RouteError::ConfigParse, &msg)
}

// Record offsets of newline as bytes are consumed, to report line number at any position.
struct LineTracker<R> {
    inner: R,
    consumed: u64,
    newlines: Vec<u64>,
}

impl<R: Read> LineTracker<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            newlines: Vec::new(),
        }
    }

    fn line_at(&self, pos: u64) -> usize {
        1 + self.newlines.partition_point(|&offset| offset < pos)
    }
}

impl<R: Read> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = self.inner.read(buf)?;
        let consumed = self.consumed;
        buf[..len]
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == b'\n')
            .for_each(|(i, _)| self.newlines.push(consumed + i as u64));
        self.consumed += len as u64;
        Ok(len)
    }
}

#[derive(Debug, Default)]
struct ElemAttrs {
    name: Option<String>,
    val: Option<String>,
}

impl ElemAttrs {
    fn parse(elem: &BytesStart) -> Result<Self, String> {
        let mut attrs = Self::default();
        for attr in elem.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            if attr.value.contains(&b'<') {
                let key = String::from_utf8_lossy(attr.key.as_ref());
                return Err(format!("not well-formed (invalid token) in attribute {}", key));
            }
            let value = attr
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            match attr.key.as_ref() {
                b"name" => attrs.name = Some(value),
                b"val" => attrs.val = Some(value),
                _ => (),
            }
        }
        Ok(attrs)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DeviceScope {
    Outside,
    Route(usize),
    Ignored,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum PathRole {
    Default,
    On,
    Off,
    Discarded,
}

#[derive(Debug)]
struct OpenPath {
    role: PathRole,
    settings: Vec<CtlSetting>,
    // The number of path elements opened inside.
    nesting: usize,
}

struct RouteConfigParser<'a, M: MixerOperation> {
    mixer: &'a mut M,
    table: RouteTable,
    device: DeviceScope,
    path: Option<OpenPath>,
}

impl<'a, M: MixerOperation> RouteConfigParser<'a, M> {
    fn new(mixer: &'a mut M) -> Self {
        Self {
            mixer,
            table: Default::default(),
            device: DeviceScope::Outside,
            path: None,
        }
    }

    fn start_element(&mut self, elem: &[u8], attrs: &ElemAttrs) {
        match elem {
            b"device" => self.start_device(attrs),
            b"path" => self.start_path(attrs),
            b"ctl" => self.start_ctl(attrs),
            _ => (),
        }
    }

    fn end_element(&mut self, elem: &[u8]) {
        match elem {
            b"path" => self.end_path(),
            b"device" => self.device = DeviceScope::Outside,
            _ => (),
        }
    }

    fn start_device(&mut self, attrs: &ElemAttrs) {
        self.device = match attrs.name.as_deref() {
            None => {
                error!("Unnamed device");
                DeviceScope::Ignored
            }
            Some(name) => match device_mask_by_name(name) {
                Some(mask) => {
                    info!("Allocating device {} [0x{:x}]", name, mask);
                    let pos = self.table.push(DeviceRoute::new(mask));
                    DeviceScope::Route(pos)
                }
                None => {
                    warn!(name, "Unknown device name");
                    DeviceScope::Ignored
                }
            },
        };
    }

    fn start_path(&mut self, attrs: &ElemAttrs) {
        if let Some(path) = &mut self.path {
            warn!("Nested paths");
            path.nesting += 1;
            return;
        }

        let role = match self.device {
            DeviceScope::Outside => PathRole::Default,
            DeviceScope::Ignored => PathRole::Discarded,
            DeviceScope::Route(_) => match attrs.name.as_deref() {
                Some("on") => PathRole::On,
                Some("off") => PathRole::Off,
                name => {
                    warn!("Unknown path name {:?}", name);
                    PathRole::Discarded
                }
            },
        };

        self.path = Some(OpenPath {
            role,
            settings: Vec::new(),
            nesting: 0,
        });
    }

    fn start_ctl(&mut self, attrs: &ElemAttrs) {
        let path = match &mut self.path {
            Some(path) => path,
            None => {
                warn!("Control outside of path");
                return;
            }
        };

        let name = match &attrs.name {
            Some(name) => name,
            None => {
                error!("Unnamed control");
                return;
            }
        };

        let val = match &attrs.val {
            Some(val) => val,
            None => {
                error!("No value specified for {}", name);
                return;
            }
        };

        debug!("Parsing control {} => {}", name, val);
        path.settings.push(CtlSetting::from_literal(name, val));
    }

    fn end_path(&mut self) {
        if let Some(path) = &mut self.path {
            if path.nesting > 0 {
                path.nesting -= 1;
                return;
            }
        }

        let path = match self.path.take() {
            Some(path) => path,
            None => return,
        };

        if path.settings.is_empty() {
            warn!("Empty path");
        }

        match path.role {
            PathRole::Default => {
                debug!("Applying {} element default route", path.settings.len());
                apply_ctl_sequence(&mut *self.mixer, &path.settings)
                    .iter()
                    .for_each(|fault| warn!("{}", fault));
            }
            PathRole::On => {
                debug!("{} element on sequence", path.settings.len());
                if let Some(route) = self.current_route() {
                    route.on = path.settings;
                }
            }
            PathRole::Off => {
                debug!("{} element off sequence", path.settings.len());
                if let Some(route) = self.current_route() {
                    route.off = path.settings;
                }
            }
            PathRole::Discarded => {
                debug!("Discard {} element sequence", path.settings.len());
            }
        }
    }

    fn current_route(&mut self) -> Option<&mut DeviceRoute> {
        match self.device {
            DeviceScope::Route(pos) => self.table.get_mut(pos),
            _ => None,
        }
    }
}
