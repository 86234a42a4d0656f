use nanoserde::{DeJson, SerJson};

use std::{fs, io::ErrorKind};

#[derive(DeJson, SerJson)]
pub struct Config {
    pub script_path: String,
    pub frames: u32,
    pub log_level: String,
}

static CONFIG_PATH: &str = "config.json";

impl Config {
    pub fn new() -> Config {
        Config {
            script_path: String::new(),
            frames: 1,
            log_level: "info".to_string(),
        }
    }

    /// Loads the config from the working directory, a missing file gives the defaults
    pub fn load() -> Result<Config, String> {
        match fs::read_to_string(CONFIG_PATH) {
            Ok(json) => Config::from_json(&json),
            Err(why) if why.kind() == ErrorKind::NotFound => Ok(Config::new()),
            Err(why) => Err(format!("Reading {} failed: {}", CONFIG_PATH, why)),
        }
    }

    pub fn from_json(json: &str) -> Result<Config, String> {
        Config::deserialize_json(json)
            .map_err(|why| format!("Parsing {} failed: {:?}", CONFIG_PATH, why))
    }

    pub fn save(&self) -> Result<(), String> {
        fs::write(CONFIG_PATH, self.serialize_json())
            .map_err(|why| format!("Writing {} failed: {}", CONFIG_PATH, why))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let mut config = Config::new();
        config.script_path = "demos/hdma_gradient.json".to_string();
        config.frames = 3;
        let parsed = Config::from_json(&config.serialize_json()).unwrap();
        assert_eq!("demos/hdma_gradient.json", parsed.script_path);
        assert_eq!(3, parsed.frames);
        assert_eq!("info", parsed.log_level);
    }

    #[test]
    fn malformed() {
        assert!(Config::from_json("{\"frames\": \"many\"}").is_err());
    }
}
