//! Best-effort sound loading. A failed decode marks that sound unplayable
//! and is queryable; it never aborts the rest of the set.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, Source};
use tracing::{debug, warn};

use crate::defs::SoundKey;

#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("open failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// Observable outcome of a sound's load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loaded,
    Failed,
    /// Never attempted (`load_all` not called, or key absent from the set).
    Missing,
}

/// Decoded mono PCM, kept at the source sample rate; the mixer resamples.
#[derive(Debug)]
pub struct SoundData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[derive(Default)]
pub struct SoundBank {
    sounds: HashMap<SoundKey, Result<Arc<SoundData>, SoundError>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts every sound in the fixed set. Per-sound failures are
    /// recorded and logged; the call itself never fails.
    pub fn load_all(&mut self, dir: &Path) {
        self.sounds.clear();
        for key in SoundKey::ALL {
            let path = dir.join(key.file_name());
            let result = load_one(&path);
            match &result {
                Ok(data) => debug!(?key, frames = data.samples.len(), "sound loaded"),
                Err(err) => warn!(?key, %err, "sound load failed, marked unplayable"),
            }
            self.sounds.insert(key, result.map(Arc::new));
        }
    }

    /// Injects a pre-decoded sound, for hosts with embedded assets.
    pub fn insert(&mut self, key: SoundKey, data: SoundData) {
        self.sounds.insert(key, Ok(Arc::new(data)));
    }

    pub fn get(&self, key: SoundKey) -> Option<Arc<SoundData>> {
        match self.sounds.get(&key) {
            Some(Ok(data)) => Some(Arc::clone(data)),
            _ => None,
        }
    }

    pub fn load_state(&self, key: SoundKey) -> LoadState {
        match self.sounds.get(&key) {
            Some(Ok(_)) => LoadState::Loaded,
            Some(Err(_)) => LoadState::Failed,
            None => LoadState::Missing,
        }
    }

    pub fn failure(&self, key: SoundKey) -> Option<&SoundError> {
        match self.sounds.get(&key) {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }
}

fn load_one(path: &Path) -> Result<SoundData, SoundError> {
    let file = BufReader::new(File::open(path)?);
    let source = Decoder::new(file)?;
    let channels = source.channels().max(1) as usize;
    let sample_rate = source.sample_rate();
    let raw: Vec<f32> = source.convert_samples::<f32>().collect();

    let samples = if channels == 1 {
        raw
    } else {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok(SoundData {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_marks_all_failed() {
        let mut bank = SoundBank::new();
        bank.load_all(Path::new("/nonexistent/audio"));
        for key in SoundKey::ALL {
            assert_eq!(bank.load_state(key), LoadState::Failed);
            assert!(bank.get(key).is_none());
            assert!(matches!(bank.failure(key), Some(SoundError::Io(_))));
        }
    }

    #[test]
    fn test_unloaded_bank_reports_missing() {
        let bank = SoundBank::new();
        assert_eq!(bank.load_state(SoundKey::Wind), LoadState::Missing);
    }

    #[test]
    fn test_insert_marks_loaded() {
        let mut bank = SoundBank::new();
        bank.insert(
            SoundKey::Wind,
            SoundData {
                samples: vec![0.0; 64],
                sample_rate: 48_000,
            },
        );
        assert_eq!(bank.load_state(SoundKey::Wind), LoadState::Loaded);
        assert!(bank.get(SoundKey::Wind).is_some());
    }
}
