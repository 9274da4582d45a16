//! Per-adapter LoRA hyperparameters
//!
//! Exported into `adapter_config.json` in a layout compatible with the
//! HuggingFace PEFT library.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_rank() -> usize {
    8
}

fn default_alpha() -> f32 {
    16.0
}

fn default_bias() -> String {
    "none".to_string()
}

/// LoRA adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoraConfig {
    /// Adapter name, unique within a training run
    pub name: String,
    /// LoRA rank
    #[serde(default = "default_rank")]
    pub r: usize,
    /// LoRA alpha scaling parameter
    #[serde(default = "default_alpha")]
    pub lora_alpha: f32,
    /// LoRA dropout rate (0.0 if not used)
    #[serde(default)]
    pub lora_dropout: f32,
    /// Target module names for LoRA adaptation
    #[serde(default)]
    pub target_modules: Vec<String>,
    /// Bias handling: "none", "all", or "lora_only"
    #[serde(default = "default_bias")]
    pub bias: String,
}

impl LoraConfig {
    pub fn new(name: impl Into<String>, r: usize, lora_alpha: f32) -> Self {
        Self {
            name: name.into(),
            r,
            lora_alpha,
            lora_dropout: 0.0,
            target_modules: Vec::new(),
            bias: default_bias(),
        }
    }

    /// Target the q/k/v/o attention projections
    pub fn target_attention_projections(mut self) -> Self {
        self.target_modules =
            ["q_proj", "k_proj", "v_proj", "o_proj"].iter().map(|m| (*m).to_string()).collect();
        self
    }

    /// Set dropout rate
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.lora_dropout = dropout;
        self
    }

    /// Serializable hyperparameters for `adapter_config.json`
    ///
    /// Target modules are sorted for deterministic output. The adapter name is not
    /// part of the exported mapping; it is encoded in the checkpoint directory.
    pub fn export(&self) -> Map<String, Value> {
        let mut target_modules = self.target_modules.clone();
        target_modules.sort();

        let mut map = Map::new();
        map.insert("peft_type".to_string(), Value::from("LORA"));
        map.insert("r".to_string(), Value::from(self.r));
        map.insert("lora_alpha".to_string(), Value::from(self.lora_alpha));
        map.insert("lora_dropout".to_string(), Value::from(self.lora_dropout));
        map.insert("target_modules".to_string(), Value::from(target_modules));
        map.insert("bias".to_string(), Value::from(self.bias.clone()));
        map.insert("fan_in_fan_out".to_string(), Value::from(false));
        map.insert("inference_mode".to_string(), Value::from(false));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_schema_keys() {
        let config = LoraConfig::new("alpaca", 16, 32.0).target_attention_projections();
        let exported = config.export();

        assert_eq!(exported["peft_type"], "LORA");
        assert_eq!(exported["r"], 16);
        assert_eq!(exported["lora_alpha"], 32.0);
        assert_eq!(exported["bias"], "none");
        assert!(!exported.contains_key("name"));
    }

    #[test]
    fn test_export_sorts_target_modules() {
        let mut config = LoraConfig::new("a", 8, 8.0);
        config.target_modules = vec!["v_proj".into(), "q_proj".into()];
        let exported = config.export();
        assert_eq!(exported["target_modules"], serde_json::json!(["q_proj", "v_proj"]));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: LoraConfig = serde_json::from_str(r#"{"name": "a"}"#).unwrap();
        assert_eq!(config.r, 8);
        assert_eq!(config.lora_alpha, 16.0);
        assert_eq!(config.lora_dropout, 0.0);
        assert!(config.target_modules.is_empty());
        assert_eq!(config.bias, "none");
    }

    #[test]
    fn test_builder_methods() {
        let config = LoraConfig::new("a", 4, 8.0).with_dropout(0.05);
        assert_eq!(config.lora_dropout, 0.05);
        assert_eq!(config.r, 4);
    }
}
