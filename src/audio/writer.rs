//! WAV output with atomic replacement
//!
//! The waveform is written to a temporary file next to the destination and
//! renamed over it once complete, so a failed write never destroys the
//! previous content at the destination. A replaced file keeps its
//! permissions; a new one gets the usual umask-filtered mode.

use crate::error::{KeyShiftError, Result};
use crate::model::Waveform;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Write a waveform as 16-bit PCM mono WAV, atomically replacing `dest`
pub fn write_wav_atomic(waveform: &Waveform, dest: &Path) -> Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = create_temp(dir, dest)?;

    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    {
        let mut writer =
            WavWriter::new(BufWriter::new(tmp.as_file()), spec).map_err(|e| hound_error(dest, e))?;
        for &sample in waveform.samples() {
            writer
                .write_sample(to_pcm16(sample))
                .map_err(|e| hound_error(dest, e))?;
        }
        writer.finalize().map_err(|e| hound_error(dest, e))?;
    }

    tmp.as_file()
        .sync_all()
        .map_err(|e| KeyShiftError::io(tmp.path(), e))?;
    tmp.persist(dest)
        .map_err(|e| KeyShiftError::io(dest, e.error))?;

    log::debug!(
        "Wrote {} samples at {}Hz to {:?}",
        waveform.len(),
        waveform.sample_rate(),
        dest
    );
    Ok(())
}

/// Temp file in `dir` carrying the permissions `dest` should end up with
fn create_temp(dir: &Path, dest: &Path) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let tmp = builder
        .tempfile_in(dir)
        .map_err(|e| KeyShiftError::io(dir, e))?;

    if let Ok(existing) = fs::metadata(dest) {
        if existing.is_file() {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| KeyShiftError::io(tmp.path(), e))?;
        }
    }
    Ok(tmp)
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn hound_error(path: &Path, err: hound::Error) -> KeyShiftError {
    match err {
        hound::Error::IoError(e) => KeyShiftError::io(path, e),
        other => KeyShiftError::UnsupportedFormat(format!("cannot encode WAV: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ramp() -> Waveform {
        let samples = (0..1000).map(|i| (i as f32 / 1000.0) - 0.5).collect();
        Waveform::new(samples, 16000).unwrap()
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.wav");
        std::fs::write(&dest, b"previous content").unwrap();

        write_wav_atomic(&ramp(), &dest).unwrap();

        let reader = hound::WavReader::open(&dest).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 1000);
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_file_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.wav");
        for mode in [0o644, 0o640] {
            std::fs::write(&dest, b"previous content").unwrap();
            std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(mode)).unwrap();

            write_wav_atomic(&ramp(), &dest).unwrap();

            let after = std::fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
            assert_eq!(after, mode, "mode {:o} became {:o}", mode, after);
        }
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing-dir").join("out.wav");

        let result = write_wav_atomic(&ramp(), &dest);
        assert!(matches!(result, Err(KeyShiftError::Io { .. })));
    }

    #[test]
    fn test_failed_persist_keeps_previous_content() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the destination makes the final rename fail.
        let dest = dir.path().join("occupied");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep.txt"), b"keep me").unwrap();

        let result = write_wav_atomic(&ramp(), &dest);
        assert!(matches!(result, Err(KeyShiftError::Io { .. })));
        assert_eq!(std::fs::read(dest.join("keep.txt")).unwrap(), b"keep me");

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_samples_are_clamped() {
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-2.0), -i16::MAX);
        assert_eq!(to_pcm16(0.0), 0);
    }
}
