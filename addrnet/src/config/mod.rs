//! # Application Config
//!
//! Layered configuration loading for applications that carry [`Addr`] values
//! (and anything else serde can handle) in their config structs.
//!
//! Layers are applied in order, later layers overriding earlier ones key by key:
//!
//! 1. defaults: any `Serialize` value, usually the config struct itself
//! 2. `<dir>/<app>.json`
//! 3. `<dir>/<app>.yml`, then `<dir>/<app>.yaml`
//! 4. environment variables prefixed `<APP>_`
//!
//! File names use the lowercased app name, the env prefix the uppercased one.
//! Env keys are mapped to dotted paths by stripping the prefix, lowercasing and
//! turning `_` into `.`, so `MYAPP_LOG_LEVEL` sets `log.level`. Field names
//! containing `_` therefore can't be reached from the environment.
//!
//! Missing files are skipped. Files that exist but can't be read or parsed are
//! reported as [`ConfigErrors`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use addrnet::config::{ConfigLoader, Log, Server};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Config {
//!     log: Log,
//!     upstream: Server,
//! }
//!
//! // MYAPP_UPSTREAM_ADDR=tcp://10.0.0.5:5432 overrides whatever the files say.
//! let config: Config = ConfigLoader::new("myapp")
//!     .with_config_dir("/etc/myapp")
//!     .load(Some(&Config::default()))
//!     .and_then(|layered| layered.unmarshal())
//!     .unwrap();
//!
//! println!("dialing {}", config.upstream.addr);
//! ```
use crate::addr::Addr;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub mod logger;
mod types;

pub use types::{List, Map, SPLITTER, split};

type JsonMap = serde_json::Map<String, Value>;

/// Directory searched for config files unless [`ConfigLoader::with_config_dir`]
/// says otherwise.
pub const DEFAULT_CONFIG_DIR: &str = ".";

/// Logging config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Log {
    pub level: String,
    /// Comma-separated outputs: `stdout`, `stderr` or a file path.
    pub outputs: List,
}

/// Communication with some external server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub addr: Addr,
}

/// Errors that can occur while loading config.
#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("could not read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config file {} must hold a mapping at the top level", .path.display())]
    NotAMapping { path: PathBuf },
    #[error("defaults could not be encoded: {0}")]
    Defaults(#[source] serde_json::Error),
    #[error("config could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Loads layered config for one application.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    app_name: String,
    config_dir: PathBuf,
    env: Option<Vec<(String, String)>>,
}

impl ConfigLoader {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            env: None,
        }
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Uses `vars` instead of the process environment for the env layer.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Prefix env variables need to be picked up, e.g. `MYAPP_`.
    pub fn env_prefix(&self) -> String {
        format!("{}_", self.app_name.to_uppercase())
    }

    /// Applies every layer on top of `defaults`.
    ///
    /// # Errors
    /// Returns [`ConfigErrors`] if the defaults can't be encoded or a config
    /// file exists but can't be read or parsed.
    pub fn load<T>(&self, defaults: Option<&T>) -> Result<Layered, ConfigErrors>
    where
        T: Serialize + ?Sized,
    {
        let mut tree = Value::Object(JsonMap::new());
        if let Some(defaults) = defaults {
            merge(
                &mut tree,
                serde_json::to_value(defaults).map_err(ConfigErrors::Defaults)?,
            );
        }

        let stem = self.app_name.to_lowercase();

        let path = self.config_dir.join(format!("{stem}.json"));
        if let Some(content) = read_optional(&path)? {
            let value = serde_json::from_str(&content)
                .map_err(|source| ConfigErrors::Json { path: path.clone(), source })?;
            merge_file(&mut tree, value, path)?;
        }

        for ext in ["yml", "yaml"] {
            let path = self.config_dir.join(format!("{stem}.{ext}"));
            if let Some(content) = read_optional(&path)? {
                let value = serde_yaml::from_str(&content)
                    .map_err(|source| ConfigErrors::Yaml { path: path.clone(), source })?;
                merge_file(&mut tree, value, path)?;
            }
        }

        self.apply_env(&mut tree);

        Ok(Layered(tree))
    }

    /// Renders `conf` (with every layer applied) as the env variables that
    /// would reproduce it, e.g. `MYAPP_LOG_LEVEL=debug`.
    ///
    /// # Errors
    /// Same as [`ConfigLoader::load`].
    pub fn to_env_vars<T>(&self, conf: &T) -> Result<BTreeMap<String, String>, ConfigErrors>
    where
        T: Serialize + ?Sized,
    {
        let prefix = self.env_prefix();
        Ok(self
            .load(Some(conf))?
            .all()
            .into_iter()
            .map(|(key, val)| {
                (
                    format!("{prefix}{}", key.to_uppercase().replace('.', "_")),
                    display_value(&val),
                )
            })
            .collect())
    }

    fn apply_env(&self, tree: &mut Value) {
        let prefix = self.env_prefix();
        let vars: Vec<(String, String)> = match &self.env {
            Some(vars) => vars.clone(),
            None => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        };

        for (key, raw) in vars {
            let Some(path) = key.strip_prefix(&prefix) else {
                continue;
            };
            let path = path.to_lowercase().replace('_', ".");
            tracing::trace!(%key, %path, "config override from env");
            set_path(tree, &path, raw);
        }
    }
}

/// The merged config tree produced by [`ConfigLoader::load`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layered(Value);

impl Layered {
    /// Decodes the tree into `T`.
    ///
    /// # Errors
    /// Returns [`ConfigErrors::Decode`] if the tree doesn't fit `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, ConfigErrors> {
        T::deserialize(&self.0).map_err(ConfigErrors::Decode)
    }

    /// Looks up a dotted path such as `log.level`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.0, |node, key| node.get(key))
    }

    /// Every leaf of the tree keyed by its dotted path.
    pub fn all(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        flatten(&self.0, String::new(), &mut out);
        out
    }

    /// Hands back the raw tree, e.g. to decode it with a different serde front end.
    pub fn into_value(self) -> Value {
        self.0
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigErrors> {
    match fs::read_to_string(path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Ok(Some(content))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::trace!(path = %path.display(), "no config file");
            Ok(None)
        }
        Err(source) => Err(ConfigErrors::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn merge_file(tree: &mut Value, value: Value, path: PathBuf) -> Result<(), ConfigErrors> {
    match value {
        // empty YAML documents
        Value::Null => Ok(()),
        Value::Object(_) => {
            merge(tree, value);
            Ok(())
        }
        _ => Err(ConfigErrors::NotAMapping { path }),
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn as_object(node: &mut Value) -> &mut JsonMap {
    match node {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(JsonMap::new());
            as_object(other)
        }
    }
}

fn set_path(tree: &mut Value, path: &str, raw: String) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut node = tree;
    for key in parents.into_iter().flat_map(|p| p.split('.')) {
        node = as_object(node)
            .entry(key)
            .or_insert_with(|| Value::Object(JsonMap::new()));
    }

    let map = as_object(node);
    let value = coerce(map.get(leaf), raw);
    map.insert(leaf.to_string(), value);
}

/// Env values are text; give them the type of whatever they replace.
fn coerce(existing: Option<&Value>, raw: String) -> Value {
    match existing {
        Some(Value::Bool(_)) => match raw.trim().parse::<bool>() {
            Ok(b) => Value::Bool(b),
            Err(_) => Value::String(raw),
        },
        Some(Value::Number(_)) => {
            let text = raw.trim();
            if let Ok(n) = text.parse::<i64>() {
                Value::from(n)
            } else if let Ok(n) = text.parse::<u64>() {
                Value::from(n)
            } else if let Some(n) = text
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                Value::String(raw)
            }
        }
        Some(Value::Array(_)) => Value::Array(
            split(&raw)
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.to_string()))
                .collect(),
        ),
        _ => Value::String(raw),
    }
}

fn flatten(node: &Value, prefix: String, out: &mut BTreeMap<String, Value>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(value, path, out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<String>>()
            .join(SPLITTER),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::Proto;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct FakeConfig {
        log: Log,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct ServiceConfig {
        log: Log,
        upstream: Server,
        workers: u32,
        verbose: bool,
        tags: Vec<String>,
    }

    impl Default for ServiceConfig {
        fn default() -> Self {
            Self {
                log: Log {
                    level: "info".to_string(),
                    outputs: List::from("stderr"),
                },
                upstream: Server {
                    addr: Addr::new_tcp("localhost", 5432),
                },
                workers: 4,
                verbose: false,
                tags: vec!["a".to_string()],
            }
        }
    }

    #[test]
    fn test_config_init_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("skiff.json"), r#"{"log": {"level": "debug"}}"#).unwrap();

        let actual: FakeConfig = ConfigLoader::new("skiff")
            .with_config_dir(dir.path())
            .with_env([("SKIFF_LOG_OUTPUTS", "stderr"), ("OTHER_LOG_LEVEL", "error")])
            .load(Some(&FakeConfig::default()))
            .unwrap()
            .unmarshal()
            .unwrap();

        let expected = FakeConfig {
            log: Log {
                level: "debug".to_string(),
                outputs: List::from("stderr"),
            },
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_config_layer_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("svc.json"),
            r#"{"log": {"level": "debug"}, "workers": 8}"#,
        )
        .unwrap();
        fs::write(dir.path().join("svc.yml"), "log:\n  level: warn\nverbose: true\n").unwrap();
        fs::write(
            dir.path().join("svc.yaml"),
            "log:\n  outputs: [stdout, /tmp/svc.log]\n",
        )
        .unwrap();

        let config: ServiceConfig = ConfigLoader::new("Svc")
            .with_config_dir(dir.path())
            .with_env([
                ("SVC_UPSTREAM_ADDR", "https://db.internal"),
                ("SVC_WORKERS", "16"),
                ("SVC_TAGS", "x,y"),
            ])
            .load(Some(&ServiceConfig::default()))
            .unwrap()
            .unmarshal()
            .unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.outputs.to_vec(), vec!["stdout", "/tmp/svc.log"]);
        assert!(config.verbose);
        assert_eq!(config.workers, 16);
        assert_eq!(config.tags, vec!["x", "y"]);
        assert_eq!(config.upstream.addr.proto(), Proto::Https);
        assert_eq!(config.upstream.addr.to_string(), "https://db.internal");
    }

    #[test]
    fn test_config_defaults_only() {
        let dir = tempfile::tempdir().unwrap();
        let layered = ConfigLoader::new("svc")
            .with_config_dir(dir.path())
            .with_env(Vec::<(String, String)>::new())
            .load(Some(&ServiceConfig::default()))
            .unwrap();

        assert_eq!(
            layered.get("upstream.addr"),
            Some(&Value::from("tcp://localhost:5432"))
        );
        assert_eq!(layered.get("log.missing"), None);
        let config: ServiceConfig = layered.unmarshal().unwrap();
        assert_eq!(config, ServiceConfig::default());

        let tree = layered.into_value();
        assert_eq!(tree["workers"], Value::from(4));
        assert_eq!(tree["log"]["outputs"], Value::from("stderr"));
    }

    #[test]
    fn test_config_env_creates_unknown_paths() {
        let layered = ConfigLoader::new("svc")
            .with_config_dir(tempfile::tempdir().unwrap().path())
            .with_env([("SVC_EXTRA_DEEP_KEY", "1"), ("SVC_WORKERS", "many")])
            .load(Some(&ServiceConfig::default()))
            .unwrap();

        assert_eq!(layered.get("extra.deep.key"), Some(&Value::from("1")));
        // Not a number: kept as text and rejected on decode.
        assert_eq!(layered.get("workers"), Some(&Value::from("many")));
        assert!(matches!(
            layered.unmarshal::<ServiceConfig>(),
            Err(ConfigErrors::Decode(_))
        ));
    }

    #[test]
    fn test_config_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.json"), "{not json").unwrap();
        let err = ConfigLoader::new("svc")
            .with_config_dir(dir.path())
            .with_env(Vec::<(String, String)>::new())
            .load::<ServiceConfig>(None)
            .unwrap_err();
        assert!(matches!(err, ConfigErrors::Json { .. }));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.yaml"), "- just\n- a list\n").unwrap();
        let err = ConfigLoader::new("svc")
            .with_config_dir(dir.path())
            .with_env(Vec::<(String, String)>::new())
            .load::<ServiceConfig>(None)
            .unwrap_err();
        assert!(matches!(err, ConfigErrors::NotAMapping { .. }));
    }

    #[test]
    fn test_config_empty_yaml_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.yml"), "").unwrap();
        let config: ServiceConfig = ConfigLoader::new("svc")
            .with_config_dir(dir.path())
            .with_env(Vec::<(String, String)>::new())
            .load(Some(&ServiceConfig::default()))
            .unwrap()
            .unmarshal()
            .unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_config_to_env_vars() {
        #[derive(Serialize)]
        struct Config {
            str: String,
            int: i32,
            bool: bool,
            float: f32,
            list: List,
        }

        let con = Config {
            str: "derp".to_string(),
            int: 1,
            bool: true,
            float: 2.0,
            list: List::default(),
        };

        let actual = ConfigLoader::new("test")
            .with_config_dir(tempfile::tempdir().unwrap().path())
            .with_env([("TEST_LIST", "1,2,3")])
            .to_env_vars(&con)
            .unwrap();

        let expected: BTreeMap<String, String> = [
            ("TEST_STR", "derp"),
            ("TEST_INT", "1"),
            ("TEST_BOOL", "true"),
            ("TEST_FLOAT", "2"),
            ("TEST_LIST", "1,2,3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_config_to_env_vars_nested() {
        let vars = ConfigLoader::new("svc")
            .with_config_dir(tempfile::tempdir().unwrap().path())
            .with_env(Vec::<(String, String)>::new())
            .to_env_vars(&ServiceConfig::default())
            .unwrap();

        assert_eq!(vars["SVC_LOG_LEVEL"], "info");
        assert_eq!(vars["SVC_LOG_OUTPUTS"], "stderr");
        assert_eq!(vars["SVC_UPSTREAM_ADDR"], "tcp://localhost:5432");
        assert_eq!(vars["SVC_WORKERS"], "4");
        assert_eq!(vars["SVC_VERBOSE"], "false");
        assert_eq!(vars["SVC_TAGS"], "a");
    }
}
