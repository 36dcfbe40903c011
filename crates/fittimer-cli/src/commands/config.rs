use clap::Subcommand;
use fittimer_core::Config;
use serde_json::{Map, Value};

use crate::workspace::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dotted key
    Get {
        /// e.g. "timer.tick_interval_ms", "feedback.tabata.phase_chimes"
        key: String,
    },
    /// Change one value and save
    Set {
        key: String,
        value: String,
    },
    /// Every settable key with its current value
    List,
    /// Write the defaults back to disk
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!(%key, "config updated");
            print_json(&serde_json::json!({ "key": key, "value": config.get(&key) }))
        }
        ConfigAction::List => print_json(&dotted_keys(&Config::load()?)?),
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            print_json(&dotted_keys(&config)?)
        }
    }
}

/// Flatten the config into `"section.key": value` pairs, the same paths
/// `get` and `set` accept.
fn dotted_keys(config: &Config) -> CliResult<Map<String, Value>> {
    let mut out = Map::new();
    flatten("", serde_json::to_value(config)?, &mut out);
    Ok(out)
}

fn flatten(prefix: &str, value: Value, out: &mut Map<String, Value>) {
    match value {
        Value::Object(fields) => {
            for (name, field) in fields {
                let path = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(&path, field, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_keys_round_trip_through_get() {
        let config = Config::default();
        let keys = dotted_keys(&config).unwrap();
        assert!(keys.contains_key("timer.tick_interval_ms"));
        assert!(keys.contains_key("feedback.tabata.phase_chimes"));
        for key in keys.keys() {
            assert!(config.get(key).is_some(), "{key} not gettable");
        }
    }
}
