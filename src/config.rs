use crate::av::{AudioFormat, Fraction, PixelFormat};
use crate::error::{Result, VdkError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// When out-of-band decoder configuration is written inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecInfoMode {
    /// Never inserted
    No,
    /// Inserted before the first unit of each file
    First,
    /// Inserted before every stream access point
    Sap,
    /// `first` for codecs that need it, `no` otherwise
    #[default]
    Auto,
}

impl std::str::FromStr for DecInfoMode {
    type Err = VdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" => Ok(DecInfoMode::No),
            "first" => Ok(DecInfoMode::First),
            "sap" => Ok(DecInfoMode::Sap),
            "auto" => Ok(DecInfoMode::Auto),
            other => Err(VdkError::Config(format!("unknown decinfo mode '{}'", other))),
        }
    }
}

/// Options of the stream writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Report progress on the output port
    pub exporter: bool,
    /// Write every unit to its own file
    pub frame: bool,
    /// One output unit per input sample; disables TTML aggregation
    pub split: bool,
    /// First unit index to forward, 1-based, 0 forwards from the start
    pub sstart: u64,
    /// Last unit index to forward, 0 is unbounded
    pub send: u64,
    /// Forward only this much media time, measured from the first unit
    pub dur: Option<Fraction>,
    pub decinfo: DecInfoMode,
    pub pfmt: Option<PixelFormat>,
    pub afmt: Option<AudioFormat>,
    /// Merge TTML divs by `region` instead of by position
    pub merge_region: bool,
    /// Always print the hour field of WebVTT timestamps
    pub vtt_hours: bool,
}

const CONFIG_PATHS: [&str; 2] = ["./vdkdump.toml", "./config.toml"];

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WriterConfig =
            toml::from_str(content).map_err(|e| VdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Default file locations first, then `VDKDUMP_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = WriterConfig::default();
        for path in &CONFIG_PATHS {
            if Path::new(path).exists() {
                debug!("Loading writer config from {}", path);
                config = Self::from_file(path)?;
                break;
            }
        }
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `VDKDUMP_<FIELD>` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_flag("VDKDUMP_EXPORTER")? {
            self.exporter = v;
        }
        if let Some(v) = env_flag("VDKDUMP_FRAME")? {
            self.frame = v;
        }
        if let Some(v) = env_flag("VDKDUMP_SPLIT")? {
            self.split = v;
        }
        if let Some(v) = env_flag("VDKDUMP_MERGE_REGION")? {
            self.merge_region = v;
        }
        if let Some(v) = env_flag("VDKDUMP_VTT_HOURS")? {
            self.vtt_hours = v;
        }
        if let Ok(v) = env::var("VDKDUMP_SSTART") {
            self.sstart = v.trim().parse()?;
        }
        if let Ok(v) = env::var("VDKDUMP_SEND") {
            self.send = v.trim().parse()?;
        }
        if let Ok(v) = env::var("VDKDUMP_DUR") {
            self.dur = Some(v.parse()?);
        }
        if let Ok(v) = env::var("VDKDUMP_DECINFO") {
            self.decinfo = v.parse()?;
        }
        if let Ok(v) = env::var("VDKDUMP_PFMT") {
            self.pfmt = Some(v.trim().parse()?);
        }
        if let Ok(v) = env::var("VDKDUMP_AFMT") {
            self.afmt = Some(v.trim().parse()?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.send != 0 && self.send < self.sstart {
            return Err(VdkError::Config(format!(
                "send ({}) is before sstart ({})",
                self.send, self.sstart
            )));
        }
        if let Some(dur) = &self.dur {
            if dur.den == 0 {
                return Err(VdkError::Config("duration has a zero denominator".into()));
            }
        }
        Ok(())
    }

    /// True when the caller asked for one file or unit per sample.
    pub fn per_unit(&self) -> bool {
        self.frame || self.split
    }
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            other => Err(VdkError::Config(format!("{}: not a boolean '{}'", name, other))),
        },
        Err(_) => Ok(None),
    }
}

/// Writes a commented config template if the file does not exist yet
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# vdkdump writer configuration

# one file per unit
frame = false
# forward units 1..=send (0 = unbounded)
sstart = 0
send = 0
# duration window in seconds, e.g. "1/3"
# dur = "10/1"
# no | first | sap | auto
decinfo = "auto"
merge_region = false
"#;
        std::fs::write(path, template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.decinfo, DecInfoMode::Auto);
        assert_eq!(config.dur, None);
        assert!(!config.per_unit());
    }

    #[test]
    fn test_from_toml() {
        let config = WriterConfig::from_toml_str(
            r#"
            frame = true
            sstart = 2
            send = 5
            dur = "1/3"
            decinfo = "sap"
            pfmt = "bgr"
            afmt = "s16"
            merge_region = true
            "#,
        )
        .unwrap();
        assert!(config.frame);
        assert_eq!(config.sstart, 2);
        assert_eq!(config.send, 5);
        assert_eq!(config.dur, Some(Fraction::new(1, 3)));
        assert_eq!(config.decinfo, DecInfoMode::Sap);
        assert_eq!(config.pfmt, Some(PixelFormat::Bgr));
        assert_eq!(config.afmt, Some(AudioFormat::S16));
        assert!(config.merge_region);
    }

    #[test]
    fn test_whole_second_duration() {
        let config = WriterConfig::from_toml_str("dur = 4").unwrap();
        assert_eq!(config.dur, Some(Fraction::new(4, 1)));
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(WriterConfig::from_toml_str("sstart = 10\nsend = 3").is_err());
        assert!(WriterConfig::from_toml_str("decinfo = \"always\"").is_err());
        assert!(WriterConfig::from_toml_str("pfmt = \"xyz\"").is_err());
    }

    #[test]
    fn test_from_file_and_template() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"split = true\n").unwrap();
        let config = WriterConfig::from_file(file.path()).unwrap();
        assert!(config.split);
        assert!(config.per_unit());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vdkdump.toml");
        create_default_config_template(&path).unwrap();
        let config = WriterConfig::from_file(&path).unwrap();
        assert_eq!(config, WriterConfig::default());
    }
}
