use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use std::sync::Arc;
use tracing::info;

use crate::mix::AudioMix;

/// Audio engine that manages the CPAL output stream pulling from the mixer.
///
/// The stream is !Send, so the engine has to stay on the thread that built
/// it; a host without an output device simply runs without one and the
/// mixer keeps tracking state silently.
pub struct AudioEngine {
    _stream: Stream, // Keep stream alive
    config: StreamConfig,
}

impl AudioEngine {
    pub fn start(mix: Arc<AudioMix>) -> Result<Self, anyhow::Error> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No default output device"))?;

        // Select a config with f32 sample format
        let supported_config = device
            .supported_output_configs()?
            .find(|config| config.sample_format() == SampleFormat::F32)
            .ok_or_else(|| anyhow::anyhow!("No f32 output config found"))?;
        let config = supported_config.with_max_sample_rate().config();

        let sample_rate_hz = config.sample_rate as u32;

        info!(
            "Selected device: {}, config: {} Hz, {} channels",
            device.description()?,
            sample_rate_hz,
            config.channels
        );

        let channels = config.channels;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut mixer = mix.mixer().lock().unwrap();
                mixer.render(data, channels, sample_rate_hz);
            },
            |err| eprintln!("Stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            config,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate as u32
    }
}
