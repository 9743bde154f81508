use crate::error::{ProcessorError, ProcessorResult};
use pulse_features::{ChannelConfig, ChannelConfigs, ChargeWindow, Polarity};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};

/// The layout of a channel configuration file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    channels: ChannelConfigs,
}

/// Loads and validates the channel configuration held in the JSON file at `path`.
pub(crate) fn load_channel_configs(path: &Path) -> ProcessorResult<ChannelConfigs> {
    let file = File::open(path).map_err(|source| ProcessorError::ConfigFile {
        path: path.to_owned(),
        source,
    })?;
    let config: ConfigFile = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        ProcessorError::ConfigJson {
            path: path.to_owned(),
            source,
        }
    })?;
    if config.channels.is_empty() {
        return Err(ProcessorError::NoChannels);
    }
    Ok(config.channels)
}

/// Two positive channels, one with a fixed and one with a dynamic window,
/// and one negative channel.
pub(crate) fn default_channel_configs() -> ProcessorResult<ChannelConfigs> {
    let dynamic = ChargeWindow::Dynamic {
        before: 50,
        after: 150,
    };
    Ok(ChannelConfigs::try_from(vec![
        ChannelConfig::new(
            0,
            Polarity::Positive,
            100,
            ChargeWindow::Fixed { start: 0, end: 200 },
            20.0,
            0.5,
        )?,
        ChannelConfig::new(1, Polarity::Positive, 100, dynamic, 15.0, 0.3)?,
        ChannelConfig::new(2, Polarity::Negative, 100, dynamic, 10.0, 0.5)?,
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, path::PathBuf};

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("{name}-{}.json", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn default_configs() {
        let configs = default_channel_configs().unwrap();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs.get(2).unwrap().polarity(), Polarity::Negative);
    }

    #[test]
    fn load_valid() {
        let path = write_config(
            "config_load_valid",
            r#"{
                "channels": [
                    {
                        "channel-id": 4,
                        "polarity": "negative",
                        "baseline-samples": 64,
                        "charge-method": "fixed",
                        "charge-window": [100, 300],
                        "threshold": 25.0,
                        "cfd-fraction": 0.2
                    },
                    { "channel-id": 0, "polarity": 1 }
                ]
            }"#,
        );
        let configs = load_channel_configs(&path).unwrap();
        fs::remove_file(path).unwrap();

        assert_eq!(
            configs.iter().map(ChannelConfig::channel_id).collect::<Vec<_>>(),
            vec![4, 0]
        );
        let config = configs.get(4).unwrap();
        assert_eq!(
            config.charge_window(),
            ChargeWindow::Fixed {
                start: 100,
                end: 300
            }
        );
        assert_eq!(config.baseline_samples(), 64);
    }

    #[test]
    fn duplicate_channels() {
        let path = write_config(
            "config_duplicate_channels",
            r#"{ "channels": [ { "channel-id": 1, "polarity": 1 }, { "channel-id": 1, "polarity": -1 } ] }"#,
        );
        let result = load_channel_configs(&path);
        fs::remove_file(path).unwrap();
        assert!(matches!(result, Err(ProcessorError::ConfigJson { .. })));
    }

    #[test]
    fn invalid_fraction() {
        let path = write_config(
            "config_invalid_fraction",
            r#"{ "channels": [ { "channel-id": 1, "polarity": 1, "cfd-fraction": 1.5 } ] }"#,
        );
        let result = load_channel_configs(&path);
        fs::remove_file(path).unwrap();
        let message = result.unwrap_err().to_string();
        assert!(message.contains("CFD fraction"), "{message}");
    }

    #[test]
    fn no_channels() {
        let path = write_config("config_no_channels", r#"{ "channels": [] }"#);
        let result = load_channel_configs(&path);
        fs::remove_file(path).unwrap();
        assert!(matches!(result, Err(ProcessorError::NoChannels)));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_channel_configs(Path::new("/no/such/config.json")),
            Err(ProcessorError::ConfigFile { .. })
        ));
    }
}
