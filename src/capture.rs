//! Module L — live microphone capture.
//!
//! A convenience composition over the already-specified core (A-E): record
//! a fixed window from the default input device, then hand the buffer to
//! the same fingerprinting pipeline used for file-based snippets. This is
//! not the interactive front-end itself (spec.md §1 keeps that external);
//! it is the thinnest possible bridge from a live device to the core.

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use audio_gate::NoiseGate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfig;
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::FingerprintError;
use crate::types::PcmSignal;

/// Records `duration_secs` of audio from the default input device and
/// returns mono PCM at the device's native sample rate. If `wav_dump_path`
/// is given, the raw (pre-downmix) capture is also saved there for
/// debugging, mirroring the teacher's record/save-as-wav pairing.
pub fn record(
    duration_secs: u64,
    wav_dump_path: Option<&str>,
) -> Result<PcmSignal, FingerprintError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| FingerprintError::StoreUnavailable("no input device found".to_string()))?;
    let config = device
        .default_input_config()
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    // Constructed but not wired in: see DESIGN.md's "Known gap carried
    // from the teacher" for why the processing entry point isn't called.
    let _gate = NoiseGate::new(
        -36.0,   // open threshold (dB)
        -54.0,   // close threshold (dB)
        sample_rate as f32,
        channels,
        150.0, // release rate
        25.0,  // attack rate
        150.0, // hold time
    );

    let samples = Arc::new(Mutex::new(Vec::<f32>::new()));
    let samples_clone = samples.clone();
    let (err_tx, err_rx) = mpsc::channel();

    let stream = device
        .build_input_stream(
            &config.clone().into(),
            move |data: &[f32], _| {
                samples_clone.lock().unwrap().extend_from_slice(data);
            },
            move |err| {
                let _ = err_tx.send(err.to_string());
            },
            None,
        )
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;

    stream
        .play()
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
    thread::sleep(Duration::from_secs(duration_secs));
    drop(stream);

    if let Ok(err) = err_rx.try_recv() {
        return Err(FingerprintError::StoreUnavailable(err));
    }

    let raw = samples.lock().unwrap().clone();

    if let Some(path) = wav_dump_path {
        save_as_wav(&raw, &config, path)?;
    }

    let mono: Vec<f32> = raw
        .chunks_exact(channels.max(1))
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok(PcmSignal::new(mono, sample_rate))
}

/// Saves raw samples to a WAV file at the given config. Called from
/// `record` when a dump path is requested.
pub fn save_as_wav(
    samples: &[f32],
    config: &SupportedStreamConfig,
    path: &str,
) -> Result<(), FingerprintError> {
    let spec = WavSpec {
        channels: config.channels(),
        sample_rate: config.sample_rate().0,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
    for &sample in samples {
        let amplitude = i16::MAX as f32;
        writer
            .write_sample((sample * amplitude) as i16)
            .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| FingerprintError::StoreUnavailable(e.to_string()))?;
    Ok(())
}
