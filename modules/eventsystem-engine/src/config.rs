use std::env;

use typed_builder::TypedBuilder;

use crate::error::{EngineError, EngineResult};

/// Engine settings, fixed at construction.
#[derive(Debug, Clone, TypedBuilder)]
pub struct EngineConfig {
    /// Emit diagnostics for registration, publish, and every failure path.
    #[builder(default = false)]
    pub log_enabled: bool,

    /// Serialize processing attempts within this process so one record is
    /// in flight at a time. With this off, two attempts triggered close
    /// together can both claim the same candidate and run its handlers twice.
    #[builder(default = true)]
    pub single_flight: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Load from `EVENTSYSTEM_LOG` and `EVENTSYSTEM_SINGLE_FLIGHT`, falling
    /// back to the defaults for unset variables. Reads `.env` if present.
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            log_enabled: parse_flag(
                "EVENTSYSTEM_LOG",
                env::var("EVENTSYSTEM_LOG").ok(),
                false,
            )?,
            single_flight: parse_flag(
                "EVENTSYSTEM_SINGLE_FLIGHT",
                env::var("EVENTSYSTEM_SINGLE_FLIGHT").ok(),
                true,
            )?,
        })
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> EngineResult<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EngineError::InvalidConfig {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_quiet_and_single_flight() {
        let config = EngineConfig::default();
        assert!(!config.log_enabled);
        assert!(config.single_flight);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = EngineConfig::builder()
            .log_enabled(true)
            .single_flight(false)
            .build();
        assert!(config.log_enabled);
        assert!(!config.single_flight);
    }

    #[test]
    fn unset_flag_uses_default() {
        assert!(parse_flag("K", None, true).unwrap());
        assert!(!parse_flag("K", Some("  ".into()), false).unwrap());
    }

    #[test]
    fn flag_accepts_common_spellings() {
        assert!(parse_flag("K", Some("TRUE".into()), false).unwrap());
        assert!(parse_flag("K", Some("on".into()), false).unwrap());
        assert!(!parse_flag("K", Some("0".into()), true).unwrap());
    }

    #[test]
    fn garbage_flag_is_rejected() {
        let err = parse_flag("EVENTSYSTEM_LOG", Some("maybe".into()), false).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidConfig { ref key, .. } if key == "EVENTSYSTEM_LOG"
        ));
    }

    // One test owns both variables; the harness runs tests on parallel threads
    // that share the process environment.
    #[test]
    fn from_env_reads_both_flags() {
        env::remove_var("EVENTSYSTEM_LOG");
        env::remove_var("EVENTSYSTEM_SINGLE_FLIGHT");
        let config = EngineConfig::from_env().unwrap();
        assert!(!config.log_enabled);
        assert!(config.single_flight);

        env::set_var("EVENTSYSTEM_LOG", "yes");
        env::set_var("EVENTSYSTEM_SINGLE_FLIGHT", "off");
        let config = EngineConfig::from_env().unwrap();
        assert!(config.log_enabled);
        assert!(!config.single_flight);

        env::set_var("EVENTSYSTEM_SINGLE_FLIGHT", "sometimes");
        let err = EngineConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidConfig { ref key, ref value }
                if key == "EVENTSYSTEM_SINGLE_FLIGHT" && value == "sometimes"
        ));

        env::remove_var("EVENTSYSTEM_LOG");
        env::remove_var("EVENTSYSTEM_SINGLE_FLIGHT");
    }
}
