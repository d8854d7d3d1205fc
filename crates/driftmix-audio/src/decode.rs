//! Audio file decoding with symphonia.

use std::fs::File;
use std::path::Path;

use driftmix_core::{DriftmixError, PcmData, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode a whole file into interleaved f32 samples.
///
/// `id` names the sound in errors.
pub fn decode_file(id: &str, path: &Path) -> Result<PcmData> {
    let fail = |reason: String| DriftmixError::load(id, reason);

    let file = File::open(path).map_err(|e| fail(format!("{}: {}", path.display(), e)))?;
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
        .map_err(|e| fail(format!("unrecognised format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| fail("no audio track".to_string()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(fail(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped, not fatal.
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(sound = id, error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(fail(e.to_string())),
        };
        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(fail("file contains no audio".to_string()));
    }

    let pcm = PcmData::new(samples, sample_rate, channels);
    debug!(
        sound = id,
        frames = pcm.frames(),
        sample_rate,
        channels,
        "Decoded sound"
    );
    Ok(pcm)
}
