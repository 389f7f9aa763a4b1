//! Sectioned comma-delimited encoding.
//!
//! ```text
//! [state]
//! version,1
//! temperature,2.5
//! ...
//! [parameters]
//! grid_size,3
//! boundary,mixed
//! edge.left,open
//! ...
//! [grid]
//! 1,-1,1
//! ...
//! [metrics]
//! acceptance_rate,0.4
//! energy_history,-4.0,-8.0
//! ```
//!
//! Records have varying lengths, so both ends run in `flexible` mode without
//! headers. Floats are written with Rust's shortest round-tripping
//! representation, so decoding restores them bit-exact.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use super::codec::{Format, StateCodec};
use super::state::{MetricsState, Parameters, SimulationState};
use crate::error::{Result, SimError};

const EDGE_PREFIX: &str = "edge.";

/// Histories every sample appends to; derived series may be absent.
const REQUIRED_SERIES: [&str; 3] = [
    "energy_history",
    "magnetization_history",
    "temperature_history",
];

pub struct CsvCodec;

impl StateCodec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn encode(&self, state: &SimulationState, writer: &mut dyn Write) -> Result<()> {
        let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);
        for record in records(state) {
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<SimulationState> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .from_reader(reader);
        let mut sections: BTreeMap<String, Vec<StringRecord>> = BTreeMap::new();
        let mut current: Option<String> = None;
        for record in rdr.records() {
            let record = record?;
            let first = record.get(0).unwrap_or("");
            if let Some(name) = first.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }
            match &current {
                Some(name) => sections.entry(name.clone()).or_default().push(record),
                None => {
                    return Err(SimError::InvalidState(format!(
                        "csv record outside of any section: '{first}'"
                    )))
                }
            }
        }
        parse(&sections)
    }
}

fn keyed(key: &str, values: impl IntoIterator<Item = String>) -> Vec<String> {
    std::iter::once(key.to_string()).chain(values).collect()
}

fn floats(values: &[f64]) -> impl Iterator<Item = String> + '_ {
    values.iter().map(|v| format!("{v:?}"))
}

/// The records of `state`, one `Vec` per CSV line.
fn records(state: &SimulationState) -> Vec<Vec<String>> {
    let mut out = vec![
        vec!["[state]".to_string()],
        keyed("version", [state.version.to_string()]),
        keyed("temperature", [format!("{:?}", state.temperature)]),
        keyed("energy", [format!("{:?}", state.energy)]),
        keyed("magnetization", [state.magnetization.to_string()]),
        keyed("accepted_moves", [state.accepted_moves.to_string()]),
        keyed("total_moves", [state.total_moves.to_string()]),
    ];

    let p = &state.parameters;
    out.push(vec!["[parameters]".to_string()]);
    out.push(keyed("grid_size", [p.grid_size.to_string()]));
    out.push(keyed("boundary", [p.boundary.clone()]));
    out.push(keyed("update_rule", [p.update_rule.clone()]));
    out.push(keyed("fixed_value", [p.fixed_value.to_string()]));
    for (edge, kind) in &p.edges {
        out.push(keyed(&format!("{EDGE_PREFIX}{edge}"), [kind.clone()]));
    }

    out.push(vec!["[grid]".to_string()]);
    for row in &state.grid {
        out.push(row.iter().map(i8::to_string).collect());
    }

    let m = &state.metrics;
    out.push(vec!["[metrics]".to_string()]);
    out.push(keyed("acceptance_rate", [format!("{:?}", m.acceptance_rate)]));
    out.push(keyed("step_count", [m.step_count.to_string()]));
    for (name, series) in m.series() {
        out.push(keyed(name, floats(series)));
    }
    out
}

/// Records of a key/value section, by their first field.
fn by_key(records: &[StringRecord]) -> BTreeMap<&str, &StringRecord> {
    records
        .iter()
        .filter_map(|r| r.get(0).map(|key| (key, r)))
        .collect()
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| SimError::InvalidState(format!("field '{name}': cannot parse '{raw}'")))
}

fn field<T: FromStr>(map: &BTreeMap<&str, &StringRecord>, name: &'static str) -> Result<T> {
    let record = map.get(name).ok_or(SimError::MissingField(name))?;
    parse_value(name, record.get(1).unwrap_or(""))
}

/// Every field of `record` after the first `skip`.
fn list<T: FromStr>(name: &str, record: &StringRecord, skip: usize) -> Result<Vec<T>> {
    record
        .iter()
        .skip(skip)
        .map(|v| parse_value(name, v))
        .collect()
}

fn parse(sections: &BTreeMap<String, Vec<StringRecord>>) -> Result<SimulationState> {
    let section = |name: &'static str| {
        sections
            .get(name)
            .map(Vec::as_slice)
            .ok_or(SimError::MissingField(name))
    };

    let state = by_key(section("state")?);
    let params = by_key(section("parameters")?);
    let metrics = by_key(section("metrics")?);

    let grid = section("grid")?
        .iter()
        .map(|row| list::<i8>("grid", row, 0))
        .collect::<Result<Vec<_>>>()?;

    let edges = params
        .iter()
        .filter_map(|(k, r)| {
            k.strip_prefix(EDGE_PREFIX)
                .map(|edge| (edge.to_string(), r.get(1).unwrap_or("").to_string()))
        })
        .collect();
    let parameters = Parameters {
        grid_size: field(&params, "grid_size")?,
        boundary: field(&params, "boundary")?,
        update_rule: field(&params, "update_rule")?,
        fixed_value: field(&params, "fixed_value")?,
        edges,
    };

    let mut metrics_state = MetricsState {
        acceptance_rate: field(&metrics, "acceptance_rate")?,
        step_count: field(&metrics, "step_count")?,
        ..MetricsState::default()
    };
    for name in MetricsState::SERIES {
        let record = match metrics.get(name) {
            Some(record) => record,
            None if REQUIRED_SERIES.contains(&name) => return Err(SimError::MissingField(name)),
            None => continue,
        };
        if let Some(series) = metrics_state.series_mut(name) {
            *series = list(name, record, 1)?;
        }
    }

    Ok(SimulationState {
        version: field(&state, "version")?,
        grid,
        temperature: field(&state, "temperature")?,
        energy: field(&state, "energy")?,
        magnetization: field(&state, "magnetization")?,
        accepted_moves: field(&state, "accepted_moves")?,
        total_moves: field(&state, "total_moves")?,
        metrics: metrics_state,
        parameters,
    })
}
