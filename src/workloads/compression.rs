//! Compress/decompress round trips of a fixed text payload.

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};

/// Round trips per trial never exceed this, whatever the hint.
pub const MAX_ROUND_TRIPS: u64 = 100_000;

const SENTENCE: &str = "The quick brown fox jumps over the lazy dog. ";

/// zstd round trips of a repetitive text block.
pub struct Compression {
    pub level: i32,
    pub payload: Vec<u8>,
}

impl Default for Compression {
    fn default() -> Self {
        Self {
            level: 3,
            payload: SENTENCE.repeat(100).into_bytes(),
        }
    }
}

fn verify_restored(restored: &[u8], payload: &[u8]) -> Result<(), TrialError> {
    if restored != payload {
        return Err(TrialError::Checksum(format!(
            "decompressed {} bytes differ from the {} byte payload",
            restored.len(),
            payload.len()
        )));
    }
    Ok(())
}

impl Compression {
    fn round_trip(&self) -> Result<usize, TrialError> {
        let compressed = zstd::bulk::compress(&self.payload, self.level)?;
        let restored = zstd::bulk::decompress(&compressed, self.payload.len())?;
        verify_restored(&restored, &self.payload)?;
        Ok(compressed.len())
    }
}

impl Workload for Compression {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "compression",
            default_iteration_hint: 1_000,
            quick_iteration_hint: 200,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let round_trips = ctx.iteration_hint.clamp(1, MAX_ROUND_TRIPS);

        let mut compressed_bytes = 0;
        for _ in 0..round_trips {
            compressed_bytes = self.round_trip()?;
        }

        Ok(TrialOutput::new(round_trips as f64)
            .with("round_trips", round_trips)
            .with("payload_bytes", self.payload.len())
            .with("compressed_bytes", compressed_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_round_trips_shrink_repetitive_text() {
        let out = run_one(&Compression::default(), 20);

        assert_eq!(out.ops_done, 20.0);
        assert_eq!(out.aux["payload_bytes"], 4_500);
        let compressed = out.aux["compressed_bytes"].as_u64().unwrap();
        assert!(compressed > 0 && compressed < 4_500);
    }

    #[test]
    fn test_hint_is_capped() {
        let wl = Compression {
            payload: b"x".to_vec(),
            ..Default::default()
        };
        let out = run_one(&wl, MAX_ROUND_TRIPS * 3);
        assert_eq!(out.aux["round_trips"], MAX_ROUND_TRIPS);
    }

    #[test]
    fn test_mismatch_is_a_checksum_error() {
        let err = verify_restored(b"abc", b"abd").unwrap_err();
        assert!(matches!(err, TrialError::Checksum(_)));
        assert!(verify_restored(b"abc", b"abc").is_ok());
    }

    #[test]
    fn test_zero_hint_runs_once() {
        let out = run_one(&Compression::default(), 0);
        assert_eq!(out.ops_done, 1.0);
    }
}
