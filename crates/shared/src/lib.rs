pub mod attachment;
pub mod output;

pub mod settings {
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Low temperature: the optimizer should answer the same way for the same input.
    pub const DEFAULT_TEMPERATURE: f32 = 0.35;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    impl ProviderAuth {
        /// True when a non-blank key is stored in the settings file.
        pub fn has_api_key(&self) -> bool {
            self.api_key
                .as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModelSettings {
        pub gemini_model: String,    // e.g., "gemini-2.5-pro"
        pub temperature: f32,
        pub base_url: String,
        pub timeout_secs: u64,
        pub gemini_auth: ProviderAuth,
    }

    impl Default for ModelSettings {
        fn default() -> Self {
            Self {
                gemini_model: DEFAULT_GEMINI_MODEL.into(),
                temperature: DEFAULT_TEMPERATURE,
                base_url: DEFAULT_GEMINI_BASE_URL.into(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                gemini_auth: ProviderAuth::default(),
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub model: ModelSettings,
    }

    impl AppSettings {
        /// Copy safe to print: the API key is replaced by a marker.
        pub fn redacted(&self) -> Self {
            let mut copy = self.clone();
            if copy.model.gemini_auth.has_api_key() {
                copy.model.gemini_auth.api_key = Some("<redacted>".into());
            }
            copy
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_partial_settings_fill_defaults() {
            let s: AppSettings =
                serde_json::from_str(r#"{"model":{"gemini_model":"gemini-2.5-flash"}}"#).unwrap();
            assert_eq!(s.model.gemini_model, "gemini-2.5-flash");
            assert_eq!(s.model.temperature, DEFAULT_TEMPERATURE);
            assert_eq!(s.model.base_url, DEFAULT_GEMINI_BASE_URL);
            assert!(!s.model.gemini_auth.has_api_key());
        }

        #[test]
        fn test_empty_object_is_default() {
            let s: AppSettings = serde_json::from_str("{}").unwrap();
            assert_eq!(s, AppSettings::default());
        }

        #[test]
        fn test_redacted_hides_key() {
            let mut s = AppSettings::default();
            s.model.gemini_auth.api_key = Some("secret-key".into());
            let shown = serde_json::to_string(&s.redacted()).unwrap();
            assert!(!shown.contains("secret-key"));
            assert!(shown.contains("<redacted>"));
        }

        #[test]
        fn test_blank_key_does_not_count() {
            let auth = ProviderAuth {
                api_key: Some("   ".into()),
            };
            assert!(!auth.has_api_key());
        }
    }
}
