use super::Sample;

/// Lazily yields every `stride`th sample, starting with the first.
///
/// A stride of zero is treated as one.
pub fn decimate(samples: &[Sample], stride: usize) -> impl Iterator<Item = Sample> + '_ {
    samples.iter().step_by(stride.max(1)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::DECIMATION_STRIDE;

    #[test]
    fn keeps_positions_that_are_multiples_of_the_stride() {
        let samples: Vec<Sample> = (0..200).map(|v| v as Sample).collect();
        let points: Vec<Sample> = decimate(&samples, DECIMATION_STRIDE).collect();
        assert_eq!(points, vec![0.0, 48.0, 96.0, 144.0, 192.0]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(decimate(&[], DECIMATION_STRIDE).count(), 0);
    }

    #[test]
    fn short_input_keeps_only_the_first_sample() {
        let points: Vec<Sample> = decimate(&[7.0, 8.0, 9.0], DECIMATION_STRIDE).collect();
        assert_eq!(points, vec![7.0]);
    }

    #[test]
    fn zero_stride_is_identity() {
        let points: Vec<Sample> = decimate(&[1.0, 2.0], 0).collect();
        assert_eq!(points, vec![1.0, 2.0]);
    }
}
