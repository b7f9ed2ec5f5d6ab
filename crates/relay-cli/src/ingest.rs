use anyhow::Context;
use relay_core::types::TestEvent;
use std::path::Path;

/// Load outcome records from a results file.
///
/// Accepts either a JSON array of records or one JSON object per line, so
/// both batch exports and streamed runner logs work unchanged.
pub fn load_events(path: &Path) -> anyhow::Result<Vec<TestEvent>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read results file '{}'", path.display()))?;
    let trimmed = data.trim_start();
    if trimmed.starts_with('[') {
        serde_json::from_str(&data)
            .with_context(|| format!("invalid results array in '{}'", path.display()))
    } else {
        data.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("invalid record on line {} of '{}'", i + 1, path.display())
                })
            })
            .collect()
    }
}
