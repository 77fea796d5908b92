//! Module F — decoder adapter.
//!
//! Decodes a file on disk into mono f32 PCM via `symphonia`, down-mixing any
//! channel count by averaging. Title is derived from the file stem, matching
//! the catalog's "stable identifier" convention (spec.md §4.D step 1).

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecRegistry, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};

use crate::error::FingerprintError;
use crate::types::PcmSignal;

#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub title: String,
    pub pcm: PcmSignal,
}

pub struct Decoder {
    codec_registry: &'static CodecRegistry,
    format_options: FormatOptions,
    metadata_options: MetadataOptions,
    probe: &'static Probe,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            codec_registry: symphonia::default::get_codecs(),
            format_options: FormatOptions::default(),
            metadata_options: MetadataOptions::default(),
            probe: symphonia::default::get_probe(),
        }
    }

    /// Decodes `path` to mono PCM, deriving the title from the file stem.
    pub fn decode(&self, path: &Path) -> Result<DecodedAudio, FingerprintError> {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let pcm = self.decode_pcm(path)?;
        Ok(DecodedAudio { title, pcm })
    }

    fn decode_pcm(&self, path: &Path) -> Result<PcmSignal, FingerprintError> {
        let file = File::open(path)
            .map_err(|e| FingerprintError::Decode(format!("{}: {e}", path.display())))?;
        let source: Box<dyn MediaSource> = Box::new(file);
        let stream = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = self
            .probe
            .format(&hint, stream, &self.format_options, &self.metadata_options)
            .map_err(|e| FingerprintError::Decode(e.to_string()))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .first()
            .ok_or_else(|| FingerprintError::Decode("no audio track found".to_string()))?;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| FingerprintError::Decode("unknown sample rate".to_string()))?;

        let mut decoder = self
            .codec_registry
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| FingerprintError::Decode(e.to_string()))?;

        let mut mono_samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(_)) => break,
                Err(e) => return Err(FingerprintError::Decode(e.to_string())),
            };

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(e) => return Err(FingerprintError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let num_channels = spec.channels.count();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            for frame in sample_buf.samples().chunks_exact(num_channels.max(1)) {
                let mono = frame.iter().sum::<f32>() / num_channels as f32;
                mono_samples.push(mono);
            }
        }

        Ok(PcmSignal::new(mono_samples, sample_rate))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
