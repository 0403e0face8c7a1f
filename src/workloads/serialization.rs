use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::TrialError;
use crate::harness::{TrialContext, TrialOutput, Workload, WorkloadSpec};

fn per_doc_seed(base_seed: u64, index: usize) -> u64 {
    base_seed
        .wrapping_add(index as u64)
        .wrapping_mul(0x517cc1b727220a95)
}

/// Encode then decode `iteration_hint` nested JSON documents.
///
/// Throughput is in encoded bytes per second.
pub struct JsonRoundTrip {
    pub depth: u32,
    pub fanout: usize,
}

impl Default for JsonRoundTrip {
    fn default() -> Self {
        Self {
            depth: 2,
            fanout: 50,
        }
    }
}

fn nested_doc(rng: &mut ChaCha8Rng, depth: u32, fanout: usize) -> Value {
    if depth == 0 {
        return json!({
            "id": rng.gen_range(1..=1_000_000u32),
            "value": rng.gen::<f64>(),
            "active": rng.gen::<bool>(),
            "text": "x".repeat(50),
        });
    }
    let children: Map<String, Value> = (0..fanout)
        .map(|i| (format!("child_{i}"), nested_doc(rng, depth - 1, fanout)))
        .collect();
    Value::Object(children)
}

impl Workload for JsonRoundTrip {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "json_serialization",
            default_iteration_hint: 20,
            quick_iteration_hint: 5,
            median_fields: &["encode_s", "decode_s"],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let docs = ctx.iteration_hint as usize;
        let base_seed: u64 = ctx.rng.gen();

        // Index-derived seeds keep the parallel build deterministic.
        let data: Vec<Value> = (0..docs)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(per_doc_seed(base_seed, i));
                nested_doc(&mut rng, self.depth, self.fanout)
            })
            .collect();

        let (encoded, encode_s) = ctx.time(|| serde_json::to_string(&data));
        let encoded = encoded?;
        let (decoded, decode_s) = ctx.time(|| serde_json::from_str::<Vec<Value>>(&encoded));
        let decoded = decoded?;

        if decoded.len() != data.len() {
            return Err(TrialError::Workload(format!(
                "decoded {} documents, expected {}",
                decoded.len(),
                data.len()
            )));
        }

        Ok(TrialOutput::new(encoded.len() as f64)
            .measured(encode_s + decode_s)
            .with("documents", docs)
            .with("bytes", encoded.len())
            .with("encode_s", encode_s)
            .with("decode_s", decode_s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Flagged {
    val: f64,
    flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    nested: Flagged,
    tags: Vec<String>,
}

fn record_batch(len: usize) -> Vec<Record> {
    (0..len)
        .map(|i| Record {
            id: i as u64,
            name: format!("Object_{i}"),
            nested: Flagged {
                val: i as f64 * 0.12345,
                flag: i % 2 == 0,
            },
            tags: (0..5).map(|j| format!("tag_{j}")).collect(),
        })
        .collect()
}

/// `iteration_hint` decode + re-encode cycles of a record batch with bincode.
pub struct BincodeRoundTrip {
    pub records: usize,
}

impl Default for BincodeRoundTrip {
    fn default() -> Self {
        Self { records: 1_000 }
    }
}

impl Workload for BincodeRoundTrip {
    fn spec(&self) -> WorkloadSpec {
        WorkloadSpec {
            name: "binary_serialization",
            default_iteration_hint: 200,
            quick_iteration_hint: 20,
            median_fields: &[],
        }
    }

    fn run_once(&self, ctx: &mut TrialContext<'_>) -> Result<TrialOutput, TrialError> {
        let round_trips = ctx.iteration_hint;
        let batch = record_batch(self.records);
        let encoded = bincode::serialize(&batch)?;

        let (result, seconds) = ctx.time(|| -> Result<(u64, Vec<Record>), TrialError> {
            let mut bytes = encoded.clone();
            let mut processed = 0u64;
            let mut last = Vec::new();
            for _ in 0..round_trips {
                last = bincode::deserialize::<Vec<Record>>(&bytes)?;
                bytes = bincode::serialize(&last)?;
                processed += bytes.len() as u64;
            }
            Ok((processed, last))
        });
        let (size_processed, last) = result?;

        if round_trips > 0 && last != batch {
            return Err(TrialError::Workload("round trip changed the batch".to_string()));
        }

        Ok(TrialOutput::new(round_trips as f64)
            .measured(seconds)
            .with("records", self.records)
            .with("size_processed", size_processed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workloads::test_support::run_one;

    #[test]
    fn test_json_docs_are_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(per_doc_seed(9, 3));
        let mut b = ChaCha8Rng::seed_from_u64(per_doc_seed(9, 3));
        assert_eq!(nested_doc(&mut a, 1, 4), nested_doc(&mut b, 1, 4));
    }

    #[test]
    fn test_json_round_trip_counts_bytes() {
        let wl = JsonRoundTrip { depth: 1, fanout: 5 };
        let out = run_one(&wl, 3);
        assert_eq!(out.aux["documents"], 3);
        assert_eq!(out.aux["bytes"].as_f64(), Some(out.ops_done));
        assert!(out.ops_done > 0.0);
    }

    #[test]
    fn test_bincode_round_trips() {
        let wl = BincodeRoundTrip { records: 10 };
        let out = run_one(&wl, 4);
        assert_eq!(out.ops_done, 4.0);
        let one = bincode::serialize(&record_batch(10)).unwrap().len() as u64;
        assert_eq!(out.aux["size_processed"].as_u64(), Some(4 * one));
    }
}
