//! Replay command implementation.

use clap::ValueEnum;
use midend_core::{CacheState, EntityReducer, EntityReducerConfig, MergePolicy, Record, Reducer};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Merge policy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MergeMode {
    /// Merge only entities carrying a truthy `_top` field.
    Top,
    /// Always merge into stored entities.
    Always,
    /// Always replace stored entities.
    Never,
}

impl From<MergeMode> for MergePolicy {
    fn from(mode: MergeMode) -> Self {
        match mode {
            MergeMode::Top => MergePolicy::TopFlag,
            MergeMode::Always => MergePolicy::Always,
            MergeMode::Never => MergePolicy::Never,
        }
    }
}

/// Runs the replay command.
pub fn run(
    path: &Path,
    entities: Vec<String>,
    merge: MergeMode,
    indexes_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let state = replay(BufReader::new(file), entities, merge)?;

    let value = if indexes_only {
        state.indexes.to_value()
    } else {
        state.to_value()
    };
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}

/// Reduces every record line of `reader` from the initial cache state.
///
/// Blank lines are skipped. A malformed line aborts with its line number.
pub fn replay<R: BufRead>(
    reader: R,
    entities: Vec<String>,
    merge: MergeMode,
) -> Result<CacheState, Box<dyn std::error::Error>> {
    let reducer = EntityReducer::new(
        EntityReducerConfig::new()
            .with_entity_types(entities)
            .with_merge_policy(merge),
    );

    let mut state = reducer.initial_state();
    let mut applied = 0_usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: {}", number + 1, e))?;
        state = reducer.reduce(&state, &record);
        applied += 1;
    }

    debug!(records = applied, "replay finished");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midend_value::Value;
    use std::io::{Cursor, Write};

    const LOG: &str = r#"
{"type":"dogs/fetch/BEGIN","meta":{"index":"dogs/fetch"}}
{"type":"dogs/fetch/SUCCESS","payload":{"result":[20],"entities":{"dogs":{"20":{"id":20,"name":"Ren","age":4}}}},"meta":{"index":"dogs/fetch","original":null}}
{"type":"dogs/rename/SUCCESS","payload":{"result":[20],"entities":{"dogs":{"20":{"id":20,"name":"Renny"}}}}}
"#;

    #[test]
    fn replays_log_with_merge() {
        let state = replay(Cursor::new(LOG), vec!["dogs".into()], MergeMode::Always).unwrap();

        let dog = state.entities.get("dogs", "20").unwrap();
        assert_eq!(dog.get("name"), Some(&Value::from("Renny")));
        assert_eq!(dog.get("age"), Some(&Value::Integer(4)));

        let entry = state.indexes.get("dogs/fetch").unwrap();
        assert_eq!(entry.in_flight, 0);
        assert_eq!(entry.original, Value::Null);
    }

    #[test]
    fn top_mode_merges_flagged_entities_only() {
        let log = concat!(
            r#"{"type":"A/SUCCESS","payload":{"result":[1],"entities":{"dogs":{"1":{"id":1,"age":4},"2":{"id":2,"age":5}}}}}"#,
            "\n",
            r#"{"type":"B/SUCCESS","payload":{"result":[1,2],"entities":{"dogs":{"1":{"id":1,"name":"Ren","_top":true},"2":{"id":2,"name":"Stimpy"}}}}}"#,
        );
        let state = replay(Cursor::new(log), vec!["dogs".into()], MergeMode::Top).unwrap();

        assert_eq!(state.entities.get("dogs", "1").unwrap().get("age"), Some(&Value::Integer(4)));
        assert_eq!(state.entities.get("dogs", "2").unwrap().get("age"), None);
    }

    #[test]
    fn replays_log_with_replace() {
        let state = replay(Cursor::new(LOG), vec!["dogs".into()], MergeMode::Never).unwrap();

        let dog = state.entities.get("dogs", "20").unwrap();
        assert_eq!(dog.get("age"), None);
    }

    #[test]
    fn undeclared_entities_are_dropped() {
        let state = replay(Cursor::new(LOG), vec!["people".into()], MergeMode::Top).unwrap();
        assert!(state.entities.get("dogs", "20").is_none());
        assert!(state.entities.dictionary("people").unwrap().is_empty());
    }

    #[test]
    fn malformed_line_reports_number() {
        let log = "{\"type\":\"X/BEGIN\"}\n\nnot json\n";
        let err = replay(Cursor::new(log), Vec::new(), MergeMode::Top).unwrap_err();
        assert!(err.to_string().starts_with("line 3:"), "{err}");
    }

    #[test]
    fn run_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOG.as_bytes()).unwrap();

        run(file.path(), vec!["dogs".into()], MergeMode::Top, false).unwrap();
        run(file.path(), Vec::new(), MergeMode::Top, true).unwrap();
    }

    #[test]
    fn run_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("absent.jsonl"), Vec::new(), MergeMode::Top, false).is_err());
    }
}
