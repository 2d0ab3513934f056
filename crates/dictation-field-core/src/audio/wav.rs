use crate::audio::AudioData;

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const CHANNELS: u16 = 1;
const PCM_FORMAT: u16 = 1;

/// In-memory WAV (16-bit signed PCM, mono) suitable for a multipart upload.
///
/// The header is written by hand; an in-memory `Vec` has no need for the
/// seek-and-patch dance a streaming writer does.
pub fn encode_wav(audio: &AudioData) -> Vec<u8> {
    let data_len = (audio.samples.len() * 2) as u32;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = audio.sample_rate * block_align as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(HEADER_LEN as u32 - 8 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    for field in [PCM_FORMAT, CHANNELS] {
        out.extend_from_slice(&field.to_le_bytes());
    }
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    for field in [block_align, BITS_PER_SAMPLE] {
        out.extend_from_slice(&field.to_le_bytes());
    }

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend(
        audio
            .samples
            .iter()
            .flat_map(|s| to_pcm16(*s).to_le_bytes()),
    );
    out
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(samples: Vec<f32>, sample_rate: u32) -> AudioData {
        AudioData {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn header_layout() {
        let bytes = encode_wav(&audio(vec![0.0; 10], 8000));
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[36..40], b"data");
        let rate = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(rate, 8000);
        let riff_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_len as usize, bytes.len() - 8);
    }

    #[test]
    fn two_bytes_per_sample() {
        let bytes = encode_wav(&audio(vec![0.25; 3200], 16000));
        assert_eq!(bytes.len(), HEADER_LEN + 3200 * 2);
        assert_eq!(encode_wav(&audio(vec![], 16000)).len(), HEADER_LEN);
    }

    #[test]
    fn out_of_range_samples_clamp() {
        let bytes = encode_wav(&audio(vec![2.0, -2.0], 16000));
        let hi = i16::from_le_bytes([bytes[44], bytes[45]]);
        let lo = i16::from_le_bytes([bytes[46], bytes[47]]);
        assert_eq!(hi, i16::MAX);
        assert_eq!(lo, -i16::MAX);
    }
}
