use std::path::Path;

use relay_agents::AssistantConfig;
use relay_api::ApiSettings;

pub const TEST_API_KEY: &str = "test-relay-key";

/// Configuration whose collaborators never leave the machine: Notion is left
/// unconfigured, calendar credentials point into `dir`, and the vault and
/// history live under `dir`.
pub fn offline_config(dir: &Path) -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.default_timezone = "Europe/Berlin".to_string();
    config.vault_path = dir.join("vault");
    config.history_log_file = dir.join("history.txt");
    config.calendar.credentials_file = dir.join("credentials.json");
    config.calendar.token_file = dir.join("token.json");
    config.voice_feedback_enabled = false;
    config
}

pub fn test_settings(rate_limit_max: usize) -> ApiSettings {
    ApiSettings {
        api_key: TEST_API_KEY.to_string(),
        rate_limit_max,
        ..ApiSettings::default()
    }
}
