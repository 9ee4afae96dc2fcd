//! Audio decoding using symphonia
//!
//! Any container/codec enabled in symphonia's feature set decodes to a mono
//! f32 [`Waveform`]. Multi-channel audio is averaged down to one channel.

use crate::error::{KeyShiftError, Result};
use crate::model::Waveform;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an audio file to a mono waveform
pub fn decode_file(path: &Path) -> Result<Waveform> {
    log::debug!("Decoding audio file: {:?}", path);

    let file = std::fs::File::open(path).map_err(|e| KeyShiftError::io(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| unsupported(path, "failed to probe audio format", e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            KeyShiftError::UnsupportedFormat(format!("no audio track found in {:?}", path))
        })?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        KeyShiftError::UnsupportedFormat(format!("no sample rate in audio track of {:?}", path))
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(path, "failed to create audio decoder", e))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(e) => {
                end_of_stream(path, e)?;
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(unsupported(path, "failed to decode", e)),
        };

        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        let channels = spec.channels.count();
        if channels > 1 {
            for chunk in samples.chunks(channels) {
                let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        } else {
            all_samples.extend_from_slice(samples);
        }
    }

    if all_samples.is_empty() {
        return Err(KeyShiftError::UnsupportedFormat(format!(
            "no decodable audio in {:?}",
            path
        )));
    }

    log::debug!(
        "Decoded {} samples ({:.1}s) at {}Hz",
        all_samples.len(),
        all_samples.len() as f32 / sample_rate as f32,
        sample_rate
    );

    Waveform::new(all_samples, sample_rate)
}

/// `Ok` for a clean end of stream, the mapped error for anything else
fn end_of_stream(path: &Path, err: SymphoniaError) -> Result<()> {
    match err {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        SymphoniaError::IoError(e) => Err(KeyShiftError::io(path, e)),
        SymphoniaError::ResetRequired => Err(KeyShiftError::UnsupportedFormat(format!(
            "stream parameters change mid-file in {:?}",
            path
        ))),
        other => Err(unsupported(path, "failed to read packet from", other)),
    }
}

fn unsupported(path: &Path, what: &str, err: SymphoniaError) -> KeyShiftError {
    KeyShiftError::UnsupportedFormat(format!("{} {:?}: {}", what, path, err))
}
