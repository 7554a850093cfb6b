use std::collections::BTreeMap;

use crate::{foundation::core::Geometry, scene::model::SlotKind};

/// What the core believes is registered on the compositor under one layer name.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerRecord {
    /// Registration kind, which selects the removal call.
    pub kind: SlotKind,
    /// Identity of the content behind the layer (stream id, device id or image path).
    pub source: String,
    /// Last geometry sent.
    pub geometry: Geometry,
    /// Last visibility sent.
    pub visible: bool,
}

/// What the core believes is registered on the audio mixer under one device name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MixerRecord {
    /// Whether the input is currently muted.
    pub muted: bool,
}

/// Name-keyed bookkeeping of compositor layers.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    layers: BTreeMap<String, LayerRecord>,
}

impl LayerRegistry {
    /// Record for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&LayerRecord> {
        self.layers.get(name)
    }

    /// Mutable record for `name`, if present.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut LayerRecord> {
        self.layers.get_mut(name)
    }

    /// Whether `name` is tracked.
    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, record: LayerRecord) {
        self.layers.insert(name, record);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<LayerRecord> {
        self.layers.remove(name)
    }

    /// Tracked names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Tracked `(name, record)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerRecord)> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of tracked layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer is tracked.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Name-keyed bookkeeping of audio mixer inputs.
#[derive(Clone, Debug, Default)]
pub struct MixerRegistry {
    devices: BTreeMap<String, MixerRecord>,
}

impl MixerRegistry {
    /// Record for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&MixerRecord> {
        self.devices.get(name)
    }

    /// Whether `name` is tracked.
    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, record: MixerRecord) {
        self.devices.insert(name, record);
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut MixerRecord> {
        self.devices.get_mut(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<MixerRecord> {
        self.devices.remove(name)
    }

    /// Tracked names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Number of tracked devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is tracked.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
