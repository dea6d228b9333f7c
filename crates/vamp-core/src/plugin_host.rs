//! Plugin host boundary: the engine delegates all effect/instrument audio
//! processing to an opaque host implementing [`PluginHost`]. No concrete
//! VST/CLAP/AU bridge lives in this crate — that hosting layer is owned
//! outside the core, the way the teacher keeps plugin UI windows external.
//! Two deterministic in-process doubles ([`NullPluginHost`], [`GainTestHost`])
//! are provided for headless operation and tests.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable handle to an instantiated plugin, lent to the RT thread across a
/// snapshot install. A handle's lifetime outlives any snapshot referencing
/// it; only the control thread creates or destroys one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginHandle(pub u64);

#[derive(Debug, Clone, Default)]
pub struct ParameterTree {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PluginInfo {
    pub latency_in_samples: u64,
}

/// One scheduled automation update for a single callback.
#[derive(Debug, Clone)]
pub struct ParameterAutomation {
    pub address: String,
    pub value: f32,
    /// Sample offset within the callback this value should take effect at.
    pub sample_offset: usize,
}

/// A MIDI event with its sample-accurate position inside the callback.
#[derive(Debug, Clone, Copy)]
pub struct HostMidiEvent {
    pub sample_offset: usize,
    pub channel: u8,
    pub kind: HostMidiKind,
}

#[derive(Debug, Clone, Copy)]
pub enum HostMidiKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
    PitchBend { value: i16 },
}

/// Opaque effect/instrument processing boundary. Implementations may be
/// backed by a real plugin format; none is shipped here, matching the
/// spec's "plugin hosting UX is out of scope" boundary.
pub trait PluginHost: Send + Sync {
    fn instantiate(&self, identifier: &str) -> Result<PluginHandle>;
    fn destroy(&self, handle: PluginHandle);

    /// Process `frames` of audio in place. Implementations must be RT-safe:
    /// no allocation, no blocking, no unbounded work.
    fn process(
        &self,
        handle: PluginHandle,
        in_bufs: &[&[f32]],
        out_bufs: &mut [&mut [f32]],
        midi_events: &[HostMidiEvent],
        automation: &[ParameterAutomation],
        bypass: bool,
    ) -> Result<()>;

    fn set_parameter_immediate(&self, handle: PluginHandle, address: &str, value: f32) -> Result<()>;
    fn query(&self, handle: PluginHandle) -> Result<(ParameterTree, PluginInfo)>;
}

/// Deterministic no-op host: every plugin is silent and immediately ready.
/// Used for headless operation and for parts of the test suite that don't
/// care about plugin processing, the way the teacher exercises its graph
/// with pure in-memory nodes.
pub struct NullPluginHost {
    next_handle: AtomicU64,
}

impl NullPluginHost {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
        }
    }
}

impl Default for NullPluginHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginHost for NullPluginHost {
    fn instantiate(&self, _identifier: &str) -> Result<PluginHandle> {
        Ok(PluginHandle(self.next_handle.fetch_add(1, Ordering::Relaxed)))
    }

    fn destroy(&self, _handle: PluginHandle) {}

    fn process(
        &self,
        _handle: PluginHandle,
        _in_bufs: &[&[f32]],
        out_bufs: &mut [&mut [f32]],
        _midi_events: &[HostMidiEvent],
        _automation: &[ParameterAutomation],
        _bypass: bool,
    ) -> Result<()> {
        for buf in out_bufs.iter_mut() {
            buf.fill(0.0);
        }
        Ok(())
    }

    fn set_parameter_immediate(&self, _handle: PluginHandle, _address: &str, _value: f32) -> Result<()> {
        Ok(())
    }

    fn query(&self, _handle: PluginHandle) -> Result<(ParameterTree, PluginInfo)> {
        Ok((ParameterTree::default(), PluginInfo { latency_in_samples: 0 }))
    }
}

/// Deterministic test double that applies a single "gain" parameter to its
/// input, useful for exercising automation/parameter-set plumbing without
/// a real plugin bridge.
pub struct GainTestHost {
    next_handle: AtomicU64,
    gains: parking_lot::Mutex<HashMap<PluginHandle, f32>>,
}

impl GainTestHost {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            gains: parking_lot::Mutex::new(HashMap::new()),
        }
    }
}

impl Default for GainTestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginHost for GainTestHost {
    fn instantiate(&self, _identifier: &str) -> Result<PluginHandle> {
        let handle = PluginHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.gains.lock().insert(handle, 1.0);
        Ok(handle)
    }

    fn destroy(&self, handle: PluginHandle) {
        self.gains.lock().remove(&handle);
    }

    fn process(
        &self,
        handle: PluginHandle,
        in_bufs: &[&[f32]],
        out_bufs: &mut [&mut [f32]],
        _midi_events: &[HostMidiEvent],
        automation: &[ParameterAutomation],
        bypass: bool,
    ) -> Result<()> {
        let mut gains = self.gains.lock();
        let gain = gains.entry(handle).or_insert(1.0);
        for update in automation {
            if update.address == "gain" {
                *gain = update.value;
            }
        }
        let gain = *gain;
        drop(gains);

        if bypass {
            for (out, inp) in out_bufs.iter_mut().zip(in_bufs.iter()) {
                out.copy_from_slice(inp);
            }
            return Ok(());
        }

        for (out, inp) in out_bufs.iter_mut().zip(in_bufs.iter()) {
            for (o, i) in out.iter_mut().zip(inp.iter()) {
                *o = i * gain;
            }
        }
        Ok(())
    }

    fn set_parameter_immediate(&self, handle: PluginHandle, address: &str, value: f32) -> Result<()> {
        if address == "gain" {
            self.gains.lock().insert(handle, value);
            Ok(())
        } else {
            Err(Error::PluginHost(format!("unknown parameter {address}")))
        }
    }

    fn query(&self, handle: PluginHandle) -> Result<(ParameterTree, PluginInfo)> {
        if self.gains.lock().contains_key(&handle) {
            Ok((
                ParameterTree {
                    addresses: vec!["gain".to_string()],
                },
                PluginInfo { latency_in_samples: 0 },
            ))
        } else {
            Err(Error::PluginHost("unknown plugin handle".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_host_outputs_silence() {
        let host = NullPluginHost::new();
        let handle = host.instantiate("anything").unwrap();
        let mut out = vec![1.0f32; 4];
        let mut out_bufs: Vec<&mut [f32]> = vec![&mut out];
        host.process(handle, &[], &mut out_bufs, &[], &[], false).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn gain_host_applies_immediate_gain() {
        let host = GainTestHost::new();
        let handle = host.instantiate("gain").unwrap();
        host.set_parameter_immediate(handle, "gain", 0.5).unwrap();

        let input = vec![1.0f32; 4];
        let mut output = vec![0.0f32; 4];
        let in_bufs: Vec<&[f32]> = vec![&input];
        let mut out_bufs: Vec<&mut [f32]> = vec![&mut output];
        host.process(handle, &in_bufs, &mut out_bufs, &[], &[], false)
            .unwrap();

        assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn gain_host_bypass_passes_through() {
        let host = GainTestHost::new();
        let handle = host.instantiate("gain").unwrap();
        host.set_parameter_immediate(handle, "gain", 0.1).unwrap();

        let input = vec![0.3f32; 4];
        let mut output = vec![0.0f32; 4];
        let in_bufs: Vec<&[f32]> = vec![&input];
        let mut out_bufs: Vec<&mut [f32]> = vec![&mut output];
        host.process(handle, &in_bufs, &mut out_bufs, &[], &[], true)
            .unwrap();

        assert!(output.iter().all(|&s| (s - 0.3).abs() < 1e-6));
    }

    #[test]
    fn gain_host_rejects_unknown_parameter() {
        let host = GainTestHost::new();
        let handle = host.instantiate("gain").unwrap();
        assert!(host.set_parameter_immediate(handle, "cutoff", 0.5).is_err());
    }
}
