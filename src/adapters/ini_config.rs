//! INI file configuration adapter.

use configparser::ini::Ini;
use std::path::Path;

use crate::ports::config_source::ConfigSource;

pub struct IniConfigAdapter {
    config: Ini,
}

impl IniConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigSource for IniConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[strategy]
kind = market_timing
risk_symbol = SPY

[replay]
data_dir = /data/bars
"#;
        let adapter = IniConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "kind"),
            Some("market_timing".to_string())
        );
        assert_eq!(
            adapter.get_string("replay", "data_dir"),
            Some("/data/bars".to_string())
        );
    }

    #[test]
    fn missing_keys_return_none_or_default() {
        let adapter = IniConfigAdapter::from_string("[strategy]\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
        assert_eq!(adapter.get_double("strategy", "missing", 0.5), 0.5);
        assert!(adapter.get_bool("strategy", "missing", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_default() {
        let adapter =
            IniConfigAdapter::from_string("[strategy]\nwarmup = lots\npercentile = many\n")
                .unwrap();
        assert_eq!(adapter.get_int("strategy", "warmup", 175), 175);
        assert_eq!(adapter.get_double("strategy", "percentile", 0.9), 0.9);
    }

    #[test]
    fn bool_spellings() {
        let adapter = IniConfigAdapter::from_string(
            "[flags]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(adapter.get_bool("flags", "b", false));
        assert!(adapter.get_bool("flags", "c", false));
        assert!(!adapter.get_bool("flags", "d", true));
        assert!(!adapter.get_bool("flags", "e", true));
        assert!(!adapter.get_bool("flags", "f", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[strategy]\nkind = momentum_rank\n").unwrap();
        let adapter = IniConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "kind"),
            Some("momentum_rank".to_string())
        );
    }

    #[test]
    fn from_file_errors_on_missing_file() {
        assert!(IniConfigAdapter::from_file("/nonexistent/config.ini").is_err());
    }
}
