//! Waveform container and RIFF WAV I/O.

use std::io::Cursor;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

/// PCM 16-bit audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waveform {
    pub samplerate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl Waveform {
    pub fn new(samplerate: u32, samples: Vec<i16>) -> Self {
        Waveform { samplerate, channels: 1, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.samplerate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.channels.max(1) as f64 / self.samplerate as f64
    }

    /// Read a WAV file. Integer samples are kept as 16-bit (wider formats
    /// are shifted down); float samples are scaled into 16-bit range.
    pub fn read(path: &Path) -> Result<Waveform> {
        let mut reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
        let spec = reader.spec();
        let samples: Vec<i16> = match spec.sample_format {
            SampleFormat::Int => {
                if spec.bits_per_sample > 16 {
                    let shift = spec.bits_per_sample - 16;
                    reader
                        .samples::<i32>()
                        .map(|s| s.map(|v| (v >> shift) as i16))
                        .collect::<std::result::Result<_, _>>()
                        .context("Failed to read WAV samples")?
                } else {
                    reader
                        .samples::<i16>()
                        .collect::<std::result::Result<_, _>>()
                        .context("Failed to read WAV samples")?
                }
            }
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read WAV samples")?,
        };
        Ok(Waveform {
            samplerate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels.max(1),
            sample_rate: self.samplerate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    /// Write a 16-bit PCM WAV file, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut writer = WavWriter::create(path, self.spec())
            .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(())
    }

    /// The complete RIFF byte stream, as written to a file.
    pub fn riff_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                WavWriter::new(&mut cursor, self.spec()).context("Failed to build RIFF stream")?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize().context("Failed to finalize RIFF stream")?;
        }
        Ok(cursor.into_inner())
    }

    /// Play through the default audio device, blocking until done.
    pub fn play(&self) -> Result<()> {
        if self.samplerate == 0 || self.is_empty() {
            bail!("nothing to play");
        }
        let (_stream, handle) =
            rodio::OutputStream::try_default().context("Failed to open audio output")?;
        let sink = rodio::Sink::try_new(&handle).context("Failed to create audio sink")?;
        let buffer = rodio::buffer::SamplesBuffer::new(
            self.channels.max(1),
            self.samplerate,
            self.samples.clone(),
        );
        sink.append(buffer);
        sink.sleep_until_end();
        Ok(())
    }
}
