use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use mf_core::FeatureConfig;

use crate::pcm::encode_samples;

/// A recorded clip as raw interleaved 16-bit little-endian PCM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcmClip {
    /// Interleaved samples, 2 bytes each.
    pub bytes: Vec<u8>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl PcmClip {
    /// Bytes per sample of [`PcmClip::bytes`].
    pub const BYTES_PER_SAMPLE: u16 = 2;

    /// Copy of `base` with the signal fields describing this clip.
    #[must_use]
    pub fn apply_to(&self, base: &FeatureConfig) -> FeatureConfig {
        FeatureConfig {
            bytes_per_sample: Self::BYTES_PER_SAMPLE,
            channels: self.channels,
            sample_rate: self.sample_rate,
            ..base.clone()
        }
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        let frame_bytes =
            usize::from(Self::BYTES_PER_SAMPLE) * usize::from(self.channels.max(1));
        (self.bytes.len() / frame_bytes) as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Decode an audio file into interleaved 16-bit PCM.
///
/// Supports WAV, MP3, FLAC, OGG via symphonia. Channels are kept
/// interleaved; mixdown happens in the feature pipeline.
///
/// # Errors
/// Returns an error if the file cannot be opened, probed, or decoded.
///
/// # Example
/// ```no_run
/// use mf_audio::decode::decode_file;
/// let clip = decode_file("utterance.wav").unwrap();
/// println!("{} Hz, {} channel(s)", clip.sample_rate, clip.channels);
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<PcmClip> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Cannot open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

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
        .context("Failed to probe audio format")?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .context("No default audio track found")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Audio track has no sample rate")?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);
    let channels = u16::try_from(channels).context("Too many audio channels")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let track_id = track.id;
    let mut interleaved: Vec<f64> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(e) if is_end_of_stream(&e) => break,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Corrupt audio stream in {}", path.display()));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Audio decode frame error, packet skipped: {e}");
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to decode audio in {}", path.display()));
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.capacity();
        // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<i16>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        interleaved.extend(buf.samples().iter().map(|&s| f64::from(s)));
    }

    let bytes = encode_samples(&interleaved, PcmClip::BYTES_PER_SAMPLE)?;
    let clip = PcmClip {
        bytes,
        sample_rate,
        channels,
    };

    log::info!(
        "Decoded {:.2}s @ {}Hz, {} channel(s) from {}",
        clip.duration_secs(),
        sample_rate,
        channels,
        path.display()
    );

    Ok(clip)
}

/// A clean end of stream, as opposed to a truncated or corrupt container.
fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}
