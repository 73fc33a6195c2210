//! Configuration loader for Kindred.
//!
//! Reads `config.toml` from the data directory (`~/.kindred/` in production)
//! and deserializes it into [`KindredConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use kindred_types::config::KindredConfig;

/// Smallest thread depth that still lets a thread hold its main topic.
const MIN_THREAD_DEPTH: usize = 1;

/// Upper bound for minute-valued settings (one year).
const MAX_MINUTES: i64 = 525_600;

/// Resolve the data directory: `KINDRED_DATA_DIR`, else `~/.kindred`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KINDRED_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kindred")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`KindredConfig::default()`].
/// - Unreadable or unparseable file: logs a warning and returns the default.
/// - Otherwise returns the parsed config with out-of-range values floored.
pub async fn load_config(data_dir: &Path) -> KindredConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return KindredConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return KindredConfig::default();
        }
    };

    match toml::from_str::<KindredConfig>(&content) {
        Ok(config) => sanitize(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            KindredConfig::default()
        }
    }
}

/// Clamp `value` into `[0, 1]`, replacing NaN with `fallback`.
fn unit_interval(value: f64, fallback: f64, key: &str) -> f64 {
    if value.is_nan() {
        tracing::warn!("{key} is NaN, using {fallback}");
        return fallback;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        tracing::warn!(value, "{key} outside [0, 1], using {clamped}");
    }
    clamped
}

fn minutes(value: i64, min: i64, key: &str) -> i64 {
    let clamped = value.clamp(min, MAX_MINUTES);
    if clamped != value {
        tracing::warn!(value, "{key} outside [{min}, {MAX_MINUTES}], using {clamped}");
    }
    clamped
}

/// Clamp values that would make a subsystem degenerate or overflow.
pub fn sanitize(mut config: KindredConfig) -> KindredConfig {
    let defaults = KindredConfig::default();

    if config.topic.max_thread_depth < MIN_THREAD_DEPTH {
        tracing::warn!(
            value = config.topic.max_thread_depth,
            "topic.max_thread_depth below minimum, using {MIN_THREAD_DEPTH}"
        );
        config.topic.max_thread_depth = MIN_THREAD_DEPTH;
    }
    if config.mood.max_intensity.is_nan() || config.mood.max_intensity <= 0.0 {
        tracing::warn!(value = config.mood.max_intensity, "mood.max_intensity must be positive, using 1.0");
        config.mood.max_intensity = 1.0;
    }
    config.mood.decay_rate =
        unit_interval(config.mood.decay_rate, defaults.mood.decay_rate, "mood.decay_rate");
    config.mood.shift_threshold = unit_interval(
        config.mood.shift_threshold,
        defaults.mood.shift_threshold,
        "mood.shift_threshold",
    );
    config.topic.decay_rate =
        unit_interval(config.topic.decay_rate, defaults.topic.decay_rate, "topic.decay_rate");
    config.topic.thread_timeout_minutes = minutes(
        config.topic.thread_timeout_minutes,
        1,
        "topic.thread_timeout_minutes",
    );
    config.persona.cooldown_minutes =
        minutes(config.persona.cooldown_minutes, 0, "persona.cooldown_minutes");
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.topic.max_thread_depth, 5);
        assert_eq!(config.persona.cooldown_minutes, 5);
        assert!(config.persona.personas.is_empty());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[mood]
decay_rate = 0.2

[persona]
cooldown_minutes = 10

[timeline]
recall_limit = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.mood.decay_rate, 0.2);
        assert_eq!(config.persona.cooldown_minutes, 10);
        assert_eq!(config.timeline.recall_limit, 5);
        // untouched sections keep defaults
        assert_eq!(config.session.max_checkpoints, 100);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.mood.decay_rate, 0.1);
    }

    #[test]
    fn sanitize_floors_degenerate_values() {
        let mut config = KindredConfig::default();
        config.topic.max_thread_depth = 0;
        config.mood.max_intensity = -1.0;
        config.mood.decay_rate = 3.0;
        config.persona.cooldown_minutes = -4;

        let config = sanitize(config);
        assert_eq!(config.topic.max_thread_depth, 1);
        assert_eq!(config.mood.max_intensity, 1.0);
        assert_eq!(config.mood.decay_rate, 1.0);
        assert_eq!(config.persona.cooldown_minutes, 0);
    }

    #[test]
    fn sanitize_bounds_minutes_and_thresholds() {
        let mut config = KindredConfig::default();
        config.topic.thread_timeout_minutes = i64::MAX;
        config.persona.cooldown_minutes = 9_000_000_000_000_000;
        config.mood.shift_threshold = 7.5;
        config.topic.decay_rate = f64::NAN;

        let config = sanitize(config);
        assert_eq!(config.topic.thread_timeout_minutes, MAX_MINUTES);
        assert_eq!(config.persona.cooldown_minutes, MAX_MINUTES);
        assert_eq!(config.mood.shift_threshold, 1.0);
        assert_eq!(config.topic.decay_rate, 0.1);

        let mut config = KindredConfig::default();
        config.topic.thread_timeout_minutes = -3;
        assert_eq!(sanitize(config).topic.thread_timeout_minutes, 1);
    }

    #[tokio::test]
    async fn huge_minutes_in_file_are_clamped() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "[topic]\nthread_timeout_minutes = 9223372036854775807\n",
        )
        .await
        .unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.topic.thread_timeout_minutes, MAX_MINUTES);
    }

    #[test]
    fn resolve_data_dir_ends_with_kindred_or_env() {
        let dir = resolve_data_dir();
        match std::env::var("KINDRED_DATA_DIR") {
            Ok(env) => assert_eq!(dir, PathBuf::from(env)),
            Err(_) => assert!(dir.ends_with(".kindred")),
        }
    }
}
