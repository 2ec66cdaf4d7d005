use base64::Engine;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate the Live API accepts for microphone input.
pub const LIVE_INPUT_SAMPLE_RATE: f64 = gemini_live::LIVE_INPUT_SAMPLE_RATE_HZ as f64;
/// Sample rate of the PCM16 audio the Live API emits.
pub const LIVE_OUTPUT_SAMPLE_RATE: f64 = gemini_live::LIVE_OUTPUT_SAMPLE_RATE_HZ as f64;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1, // mono
    )?;
    Ok(resampler)
}

/// Decodes a base64 string of PCM16 audio into normalized f32 samples.
pub fn decode_f32_from_base64_i16(base64_fragment: &str) -> Vec<f32> {
    if let Ok(pcm16_bytes) = base64::engine::general_purpose::STANDARD.decode(base64_fragment) {
        pcm16_bytes
            .chunks_exact(2)
            .map(|chunk| {
                let v = i16::from_le_bytes([chunk[0], chunk[1]]);
                (v as f32 / 32768.0).clamp(-1.0, 1.0)
            })
            .collect()
    } else {
        tracing::error!("Failed to decode base64 fragment to f32");
        Vec::new()
    }
}

/// Encodes f32 samples into a base64 string of PCM16 audio.
pub fn encode_f32_to_base64_i16(pcm32: &[f32]) -> String {
    let pcm16: Vec<u8> = pcm32
        .iter()
        .flat_map(|&sample| {
            let v = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            v.to_le_bytes().to_vec()
        })
        .collect();
    base64::engine::general_purpose::STANDARD.encode(&pcm16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_create_resampler() {
        assert!(create_resampler(48000.0, LIVE_INPUT_SAMPLE_RATE, 1024).is_ok());
        assert!(create_resampler(LIVE_OUTPUT_SAMPLE_RATE, 48000.0, 1024).is_ok());
    }

    #[test]
    fn test_decode_f32_from_base64_i16() {
        // i16 value 16384 = [0x00, 0x40] little endian; normalized 0.5.
        let test_data = vec![0x00u8, 0x40u8, 0x00u8, 0x80u8]; // [16384, -32768]
        let base64_input = base64::engine::general_purpose::STANDARD.encode(&test_data);

        let result = decode_f32_from_base64_i16(&base64_input);
        assert_eq!(result.len(), 2);
        assert_abs_diff_eq!(result[0], 0.5, epsilon = 0.0001);
        assert_abs_diff_eq!(result[1], -1.0, epsilon = 0.0001);

        assert!(decode_f32_from_base64_i16("invalid_base64!").is_empty());
        assert!(decode_f32_from_base64_i16("").is_empty());
    }

    #[test]
    fn test_encode_clamps_out_of_range_samples() {
        let input = vec![2.0f32, -2.0f32, 0.5f32];
        let encoded = encode_f32_to_base64_i16(&input);
        let decoded = decode_f32_from_base64_i16(&encoded);
        assert_eq!(decoded.len(), 3);
        assert!(decoded[0] <= 1.0);
        assert!(decoded[1] >= -1.0);
        assert_abs_diff_eq!(decoded[2], 0.5, epsilon = 0.001);
    }

    #[test]
    fn test_extreme_values_stay_in_range() {
        let extreme = vec![f32::MAX, f32::MIN, f32::INFINITY, f32::NEG_INFINITY];
        let decoded = decode_f32_from_base64_i16(&encode_f32_to_base64_i16(&extreme));
        for value in decoded {
            assert!((-1.0..=1.0).contains(&value));
        }
    }
}
