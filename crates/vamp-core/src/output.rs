//! Audio driver boundary: an opaque trait for device I/O, with a concrete
//! `cpal`-backed adapter as the engine's default runtime. Grounded on the
//! teacher's `AudioEngine`/`StreamHandle` — a `cpal::Stream` wrapped to be
//! `Send` because it only ever lives behind a single-threaded owner.

use crate::error::{Error, Result};
use crate::events::EngineEvent;
use crate::transport::TransportManager;
use crossbeam_channel::Sender;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub name_index: usize,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
    pub default_sample_rate: u32,
}

/// The callback invoked once per audio period. `input` is empty when the
/// device has no input channels configured. Implementations must treat
/// this as the real-time thread: no allocation, no locking, no blocking.
pub trait AudioCallback: Send {
    fn render(&mut self, input: &[f32], output: &mut [f32], frames: usize, channels: usize);
}

pub trait AudioDriver {
    fn device_list(&self) -> Result<Vec<DeviceInfo>>;
    fn open_device(&mut self, sample_rate: u32, buffer_size: u32) -> Result<()>;
    fn start_callback(&mut self, callback: Box<dyn AudioCallback>) -> Result<()>;
    fn stop_callback(&mut self) -> Result<()>;
    fn output_latency_in_samples(&self) -> u64;
    fn input_channel_count(&self) -> u16;
    fn output_channel_count(&self) -> u16;

    /// Installs the sink used to report device-level underruns (§7:
    /// "Increment counter; report at <=1 Hz"). Default is a no-op; only a
    /// driver that can actually observe underruns (the cpal backend) needs
    /// to override it.
    fn set_underrun_sink(&mut self, _transport: Arc<TransportManager>, _events: Sender<EngineEvent>) {}
}

#[cfg(feature = "std")]
pub mod cpal_driver {
    use super::*;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    /// `cpal::Stream` is `!Send` on some platforms; this wrapper is only
    /// ever accessed from the single thread that owns the `CpalAudioDriver`
    /// (or behind a mutex upstream), matching the teacher's `StreamHandle`.
    struct StreamHandle(#[allow(dead_code)] cpal::Stream);

    // SAFETY: see module doc — single-threaded ownership is an invariant
    // of how `CpalAudioDriver` is used, never of the stream itself.
    unsafe impl Send for StreamHandle {}

    /// Best-effort, rate-limited underrun reporter shared between the data
    /// and error callbacks so a burst of xruns doesn't flood the event
    /// channel.
    fn report_underrun(
        transport: &Option<Arc<TransportManager>>,
        events: &Option<Sender<EngineEvent>>,
        start: &std::time::Instant,
        next_allowed_ms: &std::sync::atomic::AtomicU64,
    ) {
        use std::sync::atomic::Ordering;

        let Some(transport) = transport else { return };
        transport.record_underrun();
        let now_ms = start.elapsed().as_millis() as u64;
        let prev = next_allowed_ms.load(Ordering::Relaxed);
        if now_ms >= prev {
            next_allowed_ms.store(now_ms + 1000, Ordering::Relaxed);
            if let Some(events) = events {
                let _ = events.try_send(EngineEvent::AudioDeviceUnderrun {
                    count: transport.underrun_count(),
                });
            }
        }
    }

    pub struct CpalAudioDriver {
        device: Option<cpal::Device>,
        config: Option<cpal::StreamConfig>,
        stream: Option<StreamHandle>,
        output_latency_samples: u64,
        underrun_transport: Option<Arc<TransportManager>>,
        underrun_events: Option<Sender<EngineEvent>>,
    }

    impl CpalAudioDriver {
        pub fn new() -> Self {
            Self {
                device: None,
                config: None,
                stream: None,
                output_latency_samples: 0,
                underrun_transport: None,
                underrun_events: None,
            }
        }
    }

    impl Default for CpalAudioDriver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioDriver for CpalAudioDriver {
        fn device_list(&self) -> Result<Vec<DeviceInfo>> {
            let host = cpal::default_host();
            let devices = host
                .output_devices()
                .map_err(|e| Error::AudioDriver(e.to_string()))?;
            let mut infos = Vec::new();
            for (index, device) in devices.enumerate() {
                if let Ok(config) = device.default_output_config() {
                    infos.push(DeviceInfo {
                        name_index: index,
                        max_input_channels: 0,
                        max_output_channels: config.channels(),
                        default_sample_rate: config.sample_rate().0,
                    });
                }
            }
            Ok(infos)
        }

        fn open_device(&mut self, sample_rate: u32, buffer_size: u32) -> Result<()> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| Error::AudioDriver("no output device available".into()))?;
            let supported = device
                .default_output_config()
                .map_err(|e| Error::AudioDriver(e.to_string()))?;

            let config = cpal::StreamConfig {
                channels: supported.channels(),
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Fixed(buffer_size),
            };

            self.device = Some(device);
            self.config = Some(config);
            Ok(())
        }

        fn start_callback(&mut self, mut callback: Box<dyn AudioCallback>) -> Result<()> {
            let device = self
                .device
                .as_ref()
                .ok_or_else(|| Error::AudioDriver("device not opened".into()))?;
            let config = self
                .config
                .clone()
                .ok_or_else(|| Error::AudioDriver("device not opened".into()))?;
            let channels = config.channels as usize;

            let underrun_start = std::time::Instant::now();
            let next_allowed_ms = Arc::new(std::sync::atomic::AtomicU64::new(0));
            let data_transport = self.underrun_transport.clone();
            let data_events = self.underrun_events.clone();
            let data_next_allowed = Arc::clone(&next_allowed_ms);
            let error_transport = self.underrun_transport.clone();
            let error_events = self.underrun_events.clone();

            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            let frames = data.len() / channels.max(1);
                            callback.render(&[], data, frames, channels);
                        }));
                        if result.is_err() {
                            data.fill(0.0);
                            report_underrun(&data_transport, &data_events, &underrun_start, &data_next_allowed);
                        }
                    },
                    move |err| {
                        tracing::error!(error = %err, "cpal output stream error");
                        report_underrun(&error_transport, &error_events, &underrun_start, &next_allowed_ms);
                    },
                    None,
                )
                .map_err(|e| Error::AudioDriver(e.to_string()))?;

            stream.play().map_err(|e| Error::AudioDriver(e.to_string()))?;
            self.stream = Some(StreamHandle(stream));
            Ok(())
        }

        fn stop_callback(&mut self) -> Result<()> {
            self.stream = None;
            Ok(())
        }

        fn output_latency_in_samples(&self) -> u64 {
            self.output_latency_samples
        }

        fn input_channel_count(&self) -> u16 {
            0
        }

        fn output_channel_count(&self) -> u16 {
            self.config.as_ref().map(|c| c.channels).unwrap_or(0)
        }

        fn set_underrun_sink(&mut self, transport: Arc<TransportManager>, events: Sender<EngineEvent>) {
            self.underrun_transport = Some(transport);
            self.underrun_events = Some(events);
        }
    }
}

#[cfg(feature = "std")]
pub use cpal_driver::CpalAudioDriver;

/// In-memory driver double for tests: records rendered buffers instead of
/// opening a real device.
pub struct NullAudioDriver {
    pub rendered_frames: usize,
    channels: u16,
}

impl NullAudioDriver {
    pub fn new(channels: u16) -> Self {
        Self {
            rendered_frames: 0,
            channels,
        }
    }
}

impl AudioDriver for NullAudioDriver {
    fn device_list(&self) -> Result<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo {
            name_index: 0,
            max_input_channels: 0,
            max_output_channels: self.channels,
            default_sample_rate: 44_100,
        }])
    }

    fn open_device(&mut self, _sample_rate: u32, _buffer_size: u32) -> Result<()> {
        Ok(())
    }

    fn start_callback(&mut self, _callback: Box<dyn AudioCallback>) -> Result<()> {
        Ok(())
    }

    fn stop_callback(&mut self) -> Result<()> {
        Ok(())
    }

    fn output_latency_in_samples(&self) -> u64 {
        0
    }

    fn input_channel_count(&self) -> u16 {
        0
    }

    fn output_channel_count(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingCallback {
        calls: usize,
    }

    impl AudioCallback for CountingCallback {
        fn render(&mut self, _input: &[f32], output: &mut [f32], _frames: usize, _channels: usize) {
            self.calls += 1;
            output.fill(0.0);
        }
    }

    #[test]
    fn null_driver_reports_configured_channels() {
        let driver = NullAudioDriver::new(2);
        assert_eq!(driver.output_channel_count(), 2);
        assert_eq!(driver.output_latency_in_samples(), 0);
    }

    #[test]
    fn null_driver_start_stop_is_a_no_op() {
        let mut driver = NullAudioDriver::new(2);
        driver.open_device(44_100, 256).unwrap();
        driver
            .start_callback(Box::new(CountingCallback { calls: 0 }))
            .unwrap();
        driver.stop_callback().unwrap();
    }
}
