// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG: OnceLock<FensterConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static FensterConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = path.as_ref().to_path_buf();
    let cfg = FensterConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static FensterConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = FensterConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static FensterConfig> {
    init_from_env_or_default()
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("FENSTER_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let candidates = [PathBuf::from("fenster.toml")];
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "missing config file: set $FENSTER_CONFIG or create ./fenster.toml"
    ))
}

#[derive(Clone, Deserialize)]
pub struct FensterConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "fenster=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl FensterConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: FensterConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }

    pub fn effective_log_filter(&self) -> String {
        match &self.log_filter {
            Some(f) if !f.trim().is_empty() => f.clone(),
            _ => self.log_level.clone(),
        }
    }
}

impl Default for FensterConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Sliding-window fast path for min/max over frames whose edges only
    /// move forward. Disable to force the per-frame scan.
    #[serde(default = "default_min_max_deque_enable")]
    pub min_max_deque_enable: bool,
}

fn default_min_max_deque_enable() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            min_max_deque_enable: default_min_max_deque_enable(),
        }
    }
}

/// Accessors with defaults for code paths that must not fail when no config
/// file is present (the library is usually embedded, not run standalone).
pub fn min_max_deque_enabled() -> bool {
    CONFIG
        .get()
        .map(|c| c.runtime.min_max_deque_enable)
        .unwrap_or_else(default_min_max_deque_enable)
}

pub fn log_filter() -> String {
    CONFIG
        .get()
        .map(|c| c.effective_log_filter())
        .unwrap_or_else(default_log_level)
}

#[cfg(test)]
mod tests {
    use super::FensterConfig;

    #[test]
    fn test_min_max_deque_default_is_enabled() {
        let cfg: FensterConfig = toml::from_str(
            r#"
[runtime]
"#,
        )
        .expect("parse config");
        assert!(cfg.runtime.min_max_deque_enable);
    }

    #[test]
    fn test_min_max_deque_can_be_disabled() {
        let cfg: FensterConfig = toml::from_str(
            r#"
[runtime]
min_max_deque_enable = false
"#,
        )
        .expect("parse config");
        assert!(!cfg.runtime.min_max_deque_enable);
    }

    #[test]
    fn test_log_filter_overrides_level() {
        let cfg: FensterConfig = toml::from_str(
            r#"
log_level = "warn"
log_filter = "fenster=debug"
"#,
        )
        .expect("parse config");
        assert_eq!(cfg.effective_log_filter(), "fenster=debug");
    }
}
