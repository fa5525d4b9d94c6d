use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub config: ConfigOptions,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigOptions {
    pub site_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_partial_outage_threshold")]
    pub partial_outage_threshold: usize,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub access_token: Option<String>,
    pub posting_endpoint_url: Option<String>,
    /// Set from `DISABLE_MASTO`, never from the file.
    #[serde(skip)]
    pub disable_publishing: bool,
    /// Set from `FAIL_EVERYTHING`, never from the file.
    #[serde(skip)]
    pub fail_everything: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub name: String,
    pub url: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_partial_outage_threshold() -> usize {
    1
}

/// `<os config dir>/statusping/config.toml`, or `./config.toml` when the
/// platform has no config directory.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from("config.toml"),
        |dir| dir.join("statusping").join("config.toml"),
    )
}

impl Config {
    /// Loads and validates the configuration file, filling the posting
    /// credentials from `ACCESS_TOKEN` / `POSTING_ENDPOINT_URL` when the file
    /// leaves them unset and picking up the `DISABLE_MASTO` and
    /// `FAIL_EVERYTHING` flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if the service
    /// list is empty or contains an invalid URL, or if publishing is enabled
    /// without credentials.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        // if the credentials are not set use env with dotenvy
        if config.config.access_token.is_none() {
            config.config.access_token = optional_env("ACCESS_TOKEN")?;
        }
        if config.config.posting_endpoint_url.is_none() {
            config.config.posting_endpoint_url = optional_env("POSTING_ENDPOINT_URL")?;
        }
        config.config.disable_publishing = env_flag("DISABLE_MASTO")?;
        config.config.fail_everything = env_flag("FAIL_EVERYTHING")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.services.is_empty() {
            return Err(Error::Config(
                "no services configured, add at least one [[services]] entry".to_string(),
            ));
        }
        for service in &self.services {
            Url::parse(&service.url)?;
        }

        if !self.config.disable_publishing {
            if self.config.access_token.is_none() {
                return Err(Error::Config(
                    "access_token is required unless DISABLE_MASTO is set".to_string(),
                ));
            }
            match &self.config.posting_endpoint_url {
                None => {
                    return Err(Error::Config(
                        "posting_endpoint_url is required unless DISABLE_MASTO is set".to_string(),
                    ));
                }
                Some(url) => {
                    Url::parse(url)?;
                }
            }
        }
        Ok(())
    }
}

/// Reads an environment variable, treating "not set" as `None` rather than an
/// error.
fn optional_env(key: &str) -> Result<Option<String>, Error> {
    match dotenvy::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(None),
        Err(e) => Err(Error::EnvVar(e)),
    }
}

/// Boolean flag semantics: set to anything other than "", "0" or "false"
/// means on.
fn env_flag(key: &str) -> Result<bool, Error> {
    Ok(optional_env(key)?.is_some_and(|value| !matches!(value.as_str(), "" | "0" | "false")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(toml_content: &str) -> Config {
        toml::from_str(toml_content).expect("Failed to parse config")
    }

    #[test]
    fn test_load_config_from_toml() {
        let toml_content = r##"
            [config]
            site_name = "revolt.chat"
            timeout_secs = 5
            partial_outage_threshold = 2
            hashtags = ["#revoltchat", "#serverstatus"]
            access_token = "secret"
            posting_endpoint_url = "https://mastodon.example"

            [[services]]
            name = "API"
            url = "https://api.revolt.chat"

            [[services]]
            name = "Client"
            url = "https://app.revolt.chat"
        "##;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        write!(temp_file, "{toml_content}").expect("Failed to write to temp file");

        let config = Config::load(temp_file.path()).expect("Failed to load config");

        assert_eq!(config.config.site_name, "revolt.chat");
        assert_eq!(config.config.timeout_secs, 5);
        assert_eq!(config.config.partial_outage_threshold, 2);
        assert_eq!(config.config.hashtags.len(), 2);
        assert_eq!(config.config.access_token, Some("secret".to_string()));
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].name, "API");
        assert_eq!(config.services[1].url, "https://app.revolt.chat");
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
            [config]
            site_name = "revolt.chat"

            [[services]]
            name = "API"
            url = "https://api.revolt.chat"
        "#,
        );

        assert_eq!(config.config.timeout_secs, 10);
        assert_eq!(config.config.partial_outage_threshold, 1);
        assert!(config.config.hashtags.is_empty());
        assert!(!config.config.disable_publishing);
        assert!(!config.config.fail_everything);
    }

    #[test]
    fn test_empty_service_list_is_rejected() {
        let mut config = parse(
            r#"
            [config]
            site_name = "revolt.chat"
            access_token = "secret"
            posting_endpoint_url = "https://mastodon.example"
        "#,
        );
        config.config.disable_publishing = true;

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_service_url_is_rejected() {
        let mut config = parse(
            r#"
            [config]
            site_name = "revolt.chat"

            [[services]]
            name = "API"
            url = "not a url"
        "#,
        );
        config.config.disable_publishing = true;

        assert!(matches!(config.validate(), Err(Error::UrlParse(_))));
    }

    #[test]
    fn test_missing_credentials_are_rejected_when_publishing() {
        let config = parse(
            r#"
            [config]
            site_name = "revolt.chat"

            [[services]]
            name = "API"
            url = "https://api.revolt.chat"
        "#,
        );

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_credentials_are_fine_for_a_dry_run() {
        let mut config = parse(
            r#"
            [config]
            site_name = "revolt.chat"

            [[services]]
            name = "API"
            url = "https://api.revolt.chat"
        "#,
        );
        config.config.disable_publishing = true;

        assert!(config.validate().is_ok());
    }
}
