use std::fs;
use std::path::Path;

use catalog_core::config::{config_file, read_env, ENV_BINDINGS};
use serde_json::{json, Map, Value};

use crate::commands::{load_config, CommandResult};

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config("config", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let effective = match serde_json::to_value(&config) {
        Ok(value) => value,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "serialization",
                format!("could not render configuration: {error}"),
                3,
            );
        }
    };

    let config_file_path = config_file(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut fields = Map::new();
    for (key_path, env_keys) in ENV_BINDINGS {
        let value = lookup(&effective, key_path).cloned().unwrap_or(Value::Null);
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        fields.insert(key_path.to_string(), json!({ "value": value, "source": source }));
    }

    CommandResult::success_with_details(
        "config",
        "effective config (source precedence: env > file > default)",
        Some(Value::Object(fields)),
    )
}

fn load_config_file_doc(path: Option<&Path>) -> Option<toml::Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<toml::Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&toml::Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| read_env(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &toml::Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn lookup<'a>(root: &'a Value, key_path: &str) -> Option<&'a Value> {
    key_path.split('.').try_fold(root, |current, key| current.get(key))
}
