use std::collections::HashMap;

use anyhow::Result;

/// NOMADS encodes missing samples (e.g. absent swell partitions) as 9.999e20.
const FILL_VALUE_THRESHOLD: f64 = 9.0e20;

/// Time series per requested variable, parsed from a point-constrained
/// `.ascii` response. Index = forecast step.
#[derive(Debug, Clone, Default)]
pub struct ParsedGridSeries {
    series: HashMap<String, Vec<Option<f64>>>,
}

impl ParsedGridSeries {
    pub fn value(&self, variable: &str, step: usize) -> Option<f64> {
        self.series.get(variable)?.get(step).copied().flatten()
    }

    pub fn variable_count(&self) -> usize {
        self.series.len()
    }
}

/// Parse a gfswave `.ascii` response for a single grid cell.
///
/// Variable blocks are introduced by a header line holding the variable name
/// and a comma (`htsgwsfc, [56][1][1]`); data lines match `[<i>][0], <float>`
/// where `i` is the forecast step. The trailing `time`/`lat`/`lon` axis
/// blocks are not bracket-prefixed and are skipped.
pub fn parse_gfswave_ascii(ascii_data: &str) -> Result<ParsedGridSeries> {
    let mut parsed = ParsedGridSeries::default();
    let mut current_variable: Option<String> = None;

    for line in ascii_data.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // Variable declaration line
        if trimmed
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic())
            && trimmed.contains(',')
        {
            let name = trimmed.split(',').next().unwrap_or("").trim();
            // Axis vectors close the data section
            if name == "time" || name == "lat" || name == "lon" {
                current_variable = None;
            } else {
                current_variable = Some(name.to_string());
                parsed.series.entry(name.to_string()).or_default();
            }
            continue;
        }

        // Data line: [step][0], value
        if trimmed.starts_with('[') {
            let Some(variable) = current_variable.as_ref() else {
                continue;
            };
            let Some(step) = leading_index(trimmed) else {
                continue;
            };
            let value = trimmed
                .rsplit(',')
                .next()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && v.abs() < FILL_VALUE_THRESHOLD);

            let steps = parsed.series.get_mut(variable).unwrap();
            if steps.len() <= step {
                steps.resize(step + 1, None);
            }
            steps[step] = value;
        }
    }

    if parsed.series.is_empty() {
        anyhow::bail!("no variable blocks found in gfswave ascii response");
    }

    Ok(parsed)
}

/// Extract `i` from a `[i][0], ...` prefix.
fn leading_index(line: &str) -> Option<usize> {
    let inner = line.strip_prefix('[')?;
    let end = inner.find(']')?;
    inner[..end].parse::<usize>().ok()
}
