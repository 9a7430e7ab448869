use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct XAppConfig {
    pub http: HttpConf,
    pub features: FeatureConf,
    pub timeouts: TimeoutConf,
    pub retry: RetryConf,
    pub mqtt: Option<MqttConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub addr: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FeatureConf {
    pub ai_ml_enabled: bool,
    pub model_endpoint: Option<String>,
    /// Reported on readiness only; nothing in the steering path reads it.
    pub python_o1_sim: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TimeoutConf {
    pub process_secs: u64,
    pub control_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConf {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_elapsed_ms: u64,
    pub factor: f32,
    pub max_retries: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String, // messages arrive on "{topic_prefix}/{message_type}"
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_topic_prefix() -> String {
    "ric/rmr".into()
}

fn default_client_id() -> String {
    "traffic-steering-xapp".into()
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { addr: "0.0.0.0:8080".into() }
    }
}

impl Default for TimeoutConf {
    fn default() -> Self {
        Self { process_secs: 30, control_secs: 15 }
    }
}

impl TimeoutConf {
    pub fn process(&self) -> Duration {
        Duration::from_secs(self.process_secs)
    }

    pub fn control(&self) -> Duration {
        Duration::from_secs(self.control_secs)
    }
}

impl Default for RetryConf {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            initial_interval_ms: p.initial_interval.as_millis() as u64,
            max_interval_ms: p.max_interval.as_millis() as u64,
            max_elapsed_ms: p.max_elapsed.as_millis() as u64,
            factor: p.factor,
            max_retries: p.max_retries,
        }
    }
}

impl RetryConf {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            max_elapsed: Duration::from_millis(self.max_elapsed_ms),
            factor: self.factor,
            max_retries: self.max_retries,
        }
    }
}

impl FeatureConf {
    /// The model-assisted strategy needs somewhere to send features.
    pub fn is_ready(&self) -> bool {
        !self.ai_ml_enabled || self.model_endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }
}

impl XAppConfig {
    /// Environment wins over the file for the feature flags and listen address.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AI_ML_ENABLED") {
            self.features.ai_ml_enabled = v == "true";
        }
        if let Some(v) = lookup("ML_MODEL_ENDPOINT") {
            self.features.model_endpoint = Some(v).filter(|e| !e.is_empty());
        }
        if let Some(v) = lookup("PYTHON_O1_SIMULATOR") {
            self.features.python_o1_sim = v == "enabled";
        }
        if let Some(v) = lookup("XAPP_HTTP_ADDR") {
            self.http.addr = v;
        }
    }
}

pub fn parse_config(txt: &str) -> Result<XAppConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(XAppConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> XAppConfig {
    let path = std::env::var("XAPP_CONFIG").unwrap_or_else(|_| "xapp.yaml".into());
    let mut cfg = if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        parse_config(&txt).unwrap_or_else(|e| {
            warn!(path = %path, error = %e, "invalid config, using defaults");
            XAppConfig::default()
        })
    } else {
        info!(path = %path, "no config file, using defaults");
        XAppConfig::default()
    };
    cfg.apply_env_overrides(|key| std::env::var(key).ok());
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = XAppConfig::default();
        assert_eq!(cfg.http.addr, "0.0.0.0:8080");
        assert_eq!(cfg.timeouts.process(), Duration::from_secs(30));
        assert_eq!(cfg.timeouts.control(), Duration::from_secs(15));
        assert_eq!(cfg.retry.policy().max_interval, Duration::from_secs(10));
        assert!(cfg.mqtt.is_none());
        assert!(cfg.features.is_ready());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let cfg = parse_config(
            "features:\n  ai_ml_enabled: true\nmqtt:\n  host: broker\n  port: 1884\nretry:\n  max_elapsed_ms: 2000\n",
        )
        .unwrap();
        assert!(cfg.features.ai_ml_enabled);
        assert!(!cfg.features.is_ready());
        let mqtt = cfg.mqtt.unwrap();
        assert_eq!(mqtt.host, "broker");
        assert_eq!(mqtt.topic_prefix, "ric/rmr");
        assert_eq!(cfg.retry.max_elapsed_ms, 2000);
        assert_eq!(cfg.retry.initial_interval_ms, 1000);
        assert_eq!(cfg.http.addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_empty_file_is_default() {
        let cfg = parse_config("  \n").unwrap();
        assert!(!cfg.features.ai_ml_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AI_ML_ENABLED", "true"),
            ("ML_MODEL_ENDPOINT", "http://model:9000"),
            ("PYTHON_O1_SIMULATOR", "enabled"),
        ]
        .into_iter()
        .collect();

        let mut cfg = XAppConfig::default();
        cfg.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert!(cfg.features.ai_ml_enabled);
        assert!(cfg.features.python_o1_sim);
        assert!(cfg.features.is_ready());

        // anything but "true" switches the flag off
        cfg.apply_env_overrides(|k| (k == "AI_ML_ENABLED").then(|| "yes".to_string()));
        assert!(!cfg.features.ai_ml_enabled);
    }
}
