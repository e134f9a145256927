use tracing::Level;

use crate::error::{SdkError, SdkResult};

/// Install a global `fmt` subscriber at `level`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_tracing(level: &str) -> SdkResult<bool> {
    let level: Level = level
        .parse()
        .map_err(|_| SdkError::Config(format!("unknown log level {level:?}")))?;
    Ok(tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_types::ErrorKind;

    #[test]
    fn second_install_is_a_no_op() {
        init_tracing("debug").unwrap();
        assert!(!init_tracing("warn").unwrap());
    }

    #[test]
    fn unknown_level_is_config_error() {
        assert_eq!(init_tracing("chatty").unwrap_err().kind(), ErrorKind::Config);
    }
}
