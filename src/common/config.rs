//! Allows engine defaults to be read from settings.json
//!
//! The practice app ships sensible defaults for the gate, gain and
//! compressor; a settings.json file next to the binary can override
//! them per install (useful for quiet microphones).
use json::JsonValue;
use log::{info, warn};
use regex::Regex;
use std::{error::Error, fmt, io::ErrorKind};

#[derive(Debug)]
pub struct MissingConfigError {
    key: String,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Required configuration value '{}' is missing", self.key)
    }
}

impl Error for MissingConfigError {}

pub struct Config {
    filename: String,
    settings: JsonValue,
    defaults: JsonValue,
}

impl Config {
    pub fn build(filename: String, defaults: JsonValue) -> Result<Config, std::io::Error> {
        // Validate filename only contains valid characters and ends in .json
        let filename_regex = Regex::new(r"^[a-zA-Z0-9_\-\.]+\.json$").unwrap();
        if !filename_regex.is_match(&filename) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "Invalid filename - must contain only letters, numbers, underscore, dash, dot and end in .json"
            ));
        }

        let mut config = Config {
            filename,
            settings: json::object! {},
            defaults,
        };

        if let Err(err) = config.load_from_file() {
            warn!("Using default settings: {}", err);
        }

        Ok(config)
    }

    fn load_from_file(&mut self) -> std::io::Result<()> {
        match std::fs::read_to_string(&self.filename) {
            Ok(raw_data) => match json::parse(&raw_data) {
                Ok(parsed) => {
                    self.settings.clone_from(&parsed);
                    info!("Loaded settings from {}", self.filename);
                    Ok(())
                }
                Err(err) => {
                    warn!("Failed to parse config file {}: {}", self.filename, err);
                    Ok(())
                }
            },
            Err(err) => Err(err),
        }
    }

    pub fn get_str_value(
        &self,
        key: &str,
        default: Option<String>,
    ) -> Result<String, MissingConfigError> {
        if let Some(val) = self.settings[key].as_str() {
            return Ok(val.to_string());
        }
        if let Some(def) = default {
            return Ok(def);
        }
        if let Some(val) = self.defaults[key].as_str() {
            return Ok(val.to_string());
        }
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

    pub fn get_f64_value(&self, key: &str, default: Option<f64>) -> Result<f64, MissingConfigError> {
        if let Some(val) = self.settings[key].as_f64() {
            return Ok(val);
        }
        if let Some(def) = default {
            return Ok(def);
        }
        if let Some(val) = self.defaults[key].as_f64() {
            return Ok(val);
        }
        Err(MissingConfigError {
            key: key.to_string(),
        })
    }

}

#[cfg(test)]
mod test_config {
    use super::*;

    fn test_defaults() -> JsonValue {
        json::object! {
            "device": "default",
            "gain": 1.0,
            "sensitivity": 5.0
        }
    }

    #[test]
    fn rejects_bad_filename() {
        assert!(Config::build("../evil/path.json".to_string(), test_defaults()).is_err());
        assert!(Config::build("settings.txt".to_string(), test_defaults()).is_err());
    }

    #[test]
    fn falls_back_to_defaults() {
        let config =
            Config::build("no_such_settings_file.json".to_string(), test_defaults()).unwrap();
        assert_eq!(config.get_f64_value("gain", None).unwrap(), 1.0);
        assert_eq!(config.get_str_value("device", None).unwrap(), "default");
        assert!(config.get_f64_value("bogus", None).is_err());
        assert_eq!(config.get_f64_value("bogus", Some(2.0)).unwrap(), 2.0);
    }

    #[test]
    fn reads_a_real_settings_file() {
        let filename = "test_pitchtrack_settings.json".to_string();
        std::fs::write(&filename, r#"{ "gain": 0.5 }"#).unwrap();
        let config = Config::build(filename.clone(), test_defaults()).unwrap();
        let _res = std::fs::remove_file(&filename);
        // file overrides the default; untouched keys still fall through
        assert_eq!(config.get_f64_value("gain", None).unwrap(), 0.5);
        assert_eq!(config.get_str_value("device", None).unwrap(), "default");
    }
}
