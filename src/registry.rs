/*!
# Opening devices

Backends are registered with a [`Registry`] under a protocol name. [`Registry::open`] picks the
protocol for an [`OpenConfig`], hands the request to that protocol's factory and wraps the
result in a [`Device`].

```no_run
use gridlink::{OpenConfig, Registry};

let mut registry = Registry::new();
registry.register("series", |request| {
    // talk to the serial port at request.config.target at request.baud_rate() baud...
    # unimplemented!()
});

let device = registry.open(&OpenConfig {
    target: "/dev/ttyUSB0".into(),
    serial: Some("m128-0042".into()),
    ..Default::default()
})?;
assert_eq!(device.protocol(), "series");
# Ok::<(), gridlink::Error>(())
```
*/

use std::collections::HashMap;

use crate::{Device, DeviceParts, Error, Result};

/// Protocol used for every target that looks like a URL
pub const NETWORK_PROTOCOL: &str = "osc";

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How to reach a device. Which fields matter depends on the protocol
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OpenConfig {
    /// A tty path for serial devices or a URL such as `osc.udp://127.0.0.1:8080/monome`
    pub target: String,
    /// The vendor serial of a serial device, as reported by the platform
    pub serial: Option<String>,
    /// Skip protocol detection and use this protocol
    pub protocol: Option<String>,
    /// Overrides the baud rate the device map implies
    pub baud_rate: Option<u32>,
    /// Local port for network transports
    pub port: Option<u16>,
}

/// Device needs a particular treatment on the wire
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Quirk {
    None,
    /// Kit boards talk at 57600 baud instead of the usual 115200
    Baud57600,
}

/// One row of the serial to protocol table
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeviceMapping {
    /// Literal serial prefix, followed by a number in the actual serial
    pub prefix: &'static str,
    pub protocol: &'static str,
    /// Physical columns, 0 if the device reports its size itself
    pub cols: u32,
    /// Physical rows, 0 if the device reports its size itself
    pub rows: u32,
    pub friendly: &'static str,
    pub quirk: Quirk,
}

impl DeviceMapping {
    /// Whether `serial` is this mapping's prefix followed by at least one digit
    pub fn matches(&self, serial: &str) -> bool {
        serial
            .strip_prefix(self.prefix)
            .and_then(|rest| rest.chars().next())
            .map_or(false, |c| c.is_ascii_digit())
    }

    pub fn baud_rate(&self) -> u32 {
        match self.quirk {
            Quirk::Baud57600 => 57_600,
            Quirk::None => DEFAULT_BAUD_RATE,
        }
    }
}

/// Known serial formats, most specific first
pub const DEVICE_MAP: &[DeviceMapping] = &[
    DeviceMapping { prefix: "m64-", protocol: "series", cols: 8, rows: 8, friendly: "monome 64", quirk: Quirk::None },
    DeviceMapping { prefix: "m128-", protocol: "series", cols: 16, rows: 8, friendly: "monome 128", quirk: Quirk::None },
    DeviceMapping { prefix: "m256-", protocol: "series", cols: 16, rows: 16, friendly: "monome 256", quirk: Quirk::None },
    DeviceMapping { prefix: "mk", protocol: "series", cols: 8, rows: 8, friendly: "monome kit", quirk: Quirk::Baud57600 },
    DeviceMapping { prefix: "m40h", protocol: "40h", cols: 8, rows: 8, friendly: "monome 40h", quirk: Quirk::None },
    DeviceMapping { prefix: "a40h-", protocol: "40h", cols: 8, rows: 8, friendly: "arduinome", quirk: Quirk::None },
    DeviceMapping { prefix: "m", protocol: "mext", cols: 0, rows: 0, friendly: "monome i2c", quirk: Quirk::None },
];

/// What a factory gets to work with
#[derive(Debug, Clone, Copy)]
pub struct OpenRequest<'a> {
    pub config: &'a OpenConfig,
    pub protocol: &'a str,
    /// The device map entry the serial matched, if protocol detection went through the map
    pub mapping: Option<&'a DeviceMapping>,
}

impl OpenRequest<'_> {
    /// Explicit configuration first, then the device's quirk, then the default
    pub fn baud_rate(&self) -> u32 {
        self.config
            .baud_rate
            .or_else(|| self.mapping.map(DeviceMapping::baud_rate))
            .unwrap_or(DEFAULT_BAUD_RATE)
    }
}

pub type Factory = Box<dyn Fn(&OpenRequest<'_>) -> Result<DeviceParts>>;

/// Protocol name to backend factory, plus the serial to protocol device map
pub struct Registry {
    factories: HashMap<String, Factory>,
    device_map: Vec<DeviceMapping>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry using [`DEVICE_MAP`]
    pub fn new() -> Self {
        Self { factories: HashMap::new(), device_map: DEVICE_MAP.to_vec() }
    }

    /// Register `factory` under `protocol`, replacing any previous registration
    pub fn register<F>(&mut self, protocol: impl Into<String>, factory: F)
    where
        F: Fn(&OpenRequest<'_>) -> Result<DeviceParts> + 'static,
    {
        let protocol = protocol.into();
        log::debug!("registering backend for protocol {:?}", protocol);
        self.factories.insert(protocol, Box::new(factory));
    }

    pub fn is_registered(&self, protocol: &str) -> bool {
        self.factories.contains_key(protocol)
    }

    /// Add a mapping that takes precedence over all existing ones
    pub fn add_mapping(&mut self, mapping: DeviceMapping) {
        self.device_map.insert(0, mapping);
    }

    pub fn device_map(&self) -> &[DeviceMapping] {
        &self.device_map
    }

    pub fn map_serial(&self, serial: &str) -> Option<&DeviceMapping> {
        self.device_map.iter().find(|mapping| mapping.matches(serial))
    }

    /// Decide which protocol serves `config`, and through which device map entry if any
    pub fn resolve<'a>(&'a self, config: &'a OpenConfig) -> Result<(&'a str, Option<&'a DeviceMapping>)> {
        let mapping = config.serial.as_deref().and_then(|serial| self.map_serial(serial));

        if let Some(protocol) = &config.protocol {
            return Ok((protocol.as_str(), mapping));
        }

        if config.target.contains("://") {
            return Ok((NETWORK_PROTOCOL, None));
        }

        let serial = config
            .serial
            .as_deref()
            .ok_or(Error::InvalidArgument("serial devices need a serial to pick a protocol"))?;

        match mapping {
            Some(mapping) => Ok((mapping.protocol, Some(mapping))),
            None => Err(Error::UnknownSerial(serial.to_owned())),
        }
    }

    pub fn open(&self, config: &OpenConfig) -> Result<Device> {
        let (protocol, mapping) = self.resolve(config)?;
        let factory = self
            .factories
            .get(protocol)
            .ok_or_else(|| Error::UnknownProtocol(protocol.to_owned()))?;

        let request = OpenRequest { config, protocol, mapping };
        let mut parts = factory(&request)?;

        if parts.serial.is_none() {
            parts.serial = config.serial.clone();
        }
        if parts.friendly.is_none() {
            parts.friendly = mapping.map(|mapping| mapping.friendly.to_owned());
        }

        let device = Device::new(protocol, config.target.clone(), parts);
        log::debug!(
            "opened {} via {} as {}: {}x{}",
            device.path(),
            device.protocol(),
            device.id(),
            device.cols(),
            device.rows(),
        );
        Ok(device)
    }
}
