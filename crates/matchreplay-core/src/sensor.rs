//! Sensor providers
//!
//! The recorder reads named channels through [`SensorProvider`] and never
//! talks to hardware directly.

use std::collections::HashMap;
use thiserror::Error;

use crate::timeline::SensorValue;

/// Errors a provider can report for a single channel read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider has no channel by this name
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// The channel exists but the read failed
    #[error("Failed to read '{channel}': {message}")]
    ReadFailed {
        /// Channel that was being read
        channel: String,
        /// Provider's description of the failure
        message: String,
    },
}

/// Source of named sensor readings
pub trait SensorProvider {
    /// Read the current value of one channel
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError>;
}

impl<P: SensorProvider + ?Sized> SensorProvider for &mut P {
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError> {
        (**self).read_value(name)
    }
}

/// Provider backed by a map of last-known values
#[derive(Debug, Clone, Default)]
pub struct StaticSensors {
    values: HashMap<String, SensorValue>,
}

impl StaticSensors {
    /// Empty provider; every channel is unknown until set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a channel value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SensorValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a channel, so later reads report `UnknownChannel`
    pub fn remove(&mut self, name: &str) -> Option<SensorValue> {
        self.values.remove(name)
    }
}

impl SensorProvider for StaticSensors {
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownChannel(name.to_string()))
    }
}

/// Provider that delegates every read to a closure
pub struct FnSensors<F>(pub F);

impl<F> SensorProvider for FnSensors<F>
where
    F: FnMut(&str) -> Result<SensorValue, ProviderError>,
{
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError> {
        (self.0)(name)
    }
}

/// Provider with no channels at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensors;

impl SensorProvider for NoSensors {
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError> {
        Err(ProviderError::UnknownChannel(name.to_string()))
    }
}
