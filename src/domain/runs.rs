use std::collections::BTreeMap;

use serde_json::Value;

/// Parsed `input_runs` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSpec {
    /// Bare run numbers, in input order.
    Runs(Vec<String>),
    /// Run number mapped to `[start, end]` lumisection ranges.
    Lumisections(BTreeMap<String, Vec<(u64, u64)>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRunSpec(pub String);

impl RunSpec {
    /// Accepts a comma/newline separated list of runs or a JSON object of
    /// lumisection ranges. Input containing both braces is always treated as
    /// JSON.
    pub fn parse(input: &str) -> Result<Self, MalformedRunSpec> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(RunSpec::Runs(Vec::new()));
        }
        if !(input.contains('{') && input.contains('}')) {
            return Ok(RunSpec::Runs(split_entries(input)));
        }

        let value: Value = serde_json::from_str(input)
            .map_err(|err| MalformedRunSpec(format!("invalid JSON: {err}")))?;
        let Value::Object(object) = value else {
            return Err(MalformedRunSpec(
                "lumisections must be a JSON object".to_string(),
            ));
        };

        let mut lumis = BTreeMap::new();
        for (run, ranges) in object {
            let ranges = parse_ranges(&run, &ranges)?;
            lumis.insert(run.trim().to_string(), ranges);
        }
        Ok(RunSpec::Lumisections(lumis))
    }

    pub fn run_ids(&self) -> Vec<String> {
        match self {
            RunSpec::Runs(runs) => runs.clone(),
            RunSpec::Lumisections(lumis) => lumis.keys().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RunSpec::Runs(runs) => runs.is_empty(),
            RunSpec::Lumisections(lumis) => lumis.is_empty(),
        }
    }
}

fn parse_ranges(run: &str, ranges: &Value) -> Result<Vec<(u64, u64)>, MalformedRunSpec> {
    let malformed = || MalformedRunSpec(format!("run {run}: expected a list of [start, end] pairs"));
    let list = ranges.as_array().ok_or_else(malformed)?;

    list.iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([start, end]) => {
                let start = start.as_u64().ok_or_else(malformed)?;
                let end = end.as_u64().ok_or_else(malformed)?;
                if start > end {
                    return Err(MalformedRunSpec(format!(
                        "run {run}: range [{start}, {end}] is reversed"
                    )));
                }
                Ok((start, end))
            }
            _ => Err(malformed()),
        })
        .collect()
}

/// Splits a comma or newline separated list, dropping blank entries.
pub fn split_entries(input: &str) -> Vec<String> {
    input
        .split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
