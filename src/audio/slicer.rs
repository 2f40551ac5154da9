use crate::error::ExtractionError;
use crate::types::{AudioData, AudioSegment};

/// Borrow the samples spanning `[start_time, end_time)` seconds.
///
/// Bounds that overhang the recording are clamped to it; only an interval
/// lying entirely outside the recording (or an inverted one) is rejected.
pub fn extract_segment(
    audio: &AudioData,
    start_time: f64,
    end_time: f64,
) -> Result<AudioSegment<'_>, ExtractionError> {
    let duration = audio.duration();
    let out_of_range = || ExtractionError::SegmentOutOfRange {
        start: start_time,
        end: end_time,
        duration,
    };

    if !start_time.is_finite() || !end_time.is_finite() || end_time <= start_time {
        return Err(out_of_range());
    }
    if start_time >= duration || end_time <= 0.0 {
        return Err(out_of_range());
    }

    // Convert time boundaries to sample indices, clamped to valid range
    let sr = audio.sample_rate as f64;
    let total = audio.samples.len();
    let start_sample = ((start_time.max(0.0) * sr) as usize).min(total);
    let end_sample = ((end_time * sr) as usize).clamp(start_sample, total);

    Ok(AudioSegment {
        samples: &audio.samples[start_sample..end_sample],
        sample_rate: audio.sample_rate,
        start_time,
        end_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_second(sample_rate: u32) -> AudioData {
        AudioData {
            samples: (0..sample_rate).map(|i| i as f32).collect(),
            sample_rate,
        }
    }

    #[test]
    fn test_basic_slicing() {
        let audio = one_second(44100);

        let first = extract_segment(&audio, 0.0, 0.5).unwrap();
        let second = extract_segment(&audio, 0.5, 1.0).unwrap();

        assert_eq!(first.samples.len(), 22050); // 0.5 * 44100
        assert_eq!(second.samples.len(), 22050);
        assert_eq!(second.samples[0], 22050.0);
    }

    #[test]
    fn segment_borrows_source_samples() {
        let audio = one_second(1000);
        let segment = extract_segment(&audio, 0.25, 0.5).unwrap();
        assert!(std::ptr::eq(&segment.samples[0], &audio.samples[250]));
    }

    #[test]
    fn test_boundary_clamping() {
        let audio = one_second(1000);

        // Boundary extends beyond audio length
        let segment = extract_segment(&audio, 0.5, 2.0).unwrap();
        assert_eq!(segment.samples.len(), 500);

        let leading = extract_segment(&audio, -0.1, 0.1).unwrap();
        assert_eq!(leading.samples.len(), 100);
    }

    #[test]
    fn rejects_interval_outside_recording() {
        let audio = one_second(1000);
        assert!(matches!(
            extract_segment(&audio, 1.5, 2.0),
            Err(ExtractionError::SegmentOutOfRange { .. })
        ));
        assert!(matches!(
            extract_segment(&audio, -2.0, -1.0),
            Err(ExtractionError::SegmentOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_inverted_interval() {
        let audio = one_second(1000);
        assert!(extract_segment(&audio, 0.6, 0.4).is_err());
    }

    #[test]
    fn sub_sample_interval_yields_empty_view() {
        let audio = one_second(1000);
        let segment = extract_segment(&audio, 0.1001, 0.1002).unwrap();
        assert!(segment.samples.is_empty());
    }
}
