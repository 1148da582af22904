use anyhow::{Result, bail};
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub config: PathBuf,
}

/// Directory holding profv's own files.
///
/// `$XDG_CONFIG_HOME/profile-versions`, falling back to
/// `$HOME/.config/profile-versions`.
pub fn profv_home() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => match env::var_os("HOME").filter(|v| !v.is_empty()) {
            Some(home) => PathBuf::from(home).join(".config"),
            None => bail!("neither XDG_CONFIG_HOME nor HOME is set"),
        },
    };
    Ok(base.join("profile-versions"))
}

pub fn paths() -> Result<Paths> {
    let home = profv_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
        home,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard(Vec<(&'static str, Option<std::ffi::OsString>)>);

    impl EnvGuard {
        fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
            let saved = vars.iter().map(|(k, _)| (*k, env::var_os(k))).collect();
            for (k, v) in vars {
                // SAFETY: tests touching the environment are serialized.
                unsafe {
                    match v {
                        Some(v) => env::set_var(k, v),
                        None => env::remove_var(k),
                    }
                }
            }
            Self(saved)
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (k, v) in &self.0 {
                // SAFETY: see `EnvGuard::set`.
                unsafe {
                    match v {
                        Some(v) => env::set_var(k, v),
                        None => env::remove_var(k),
                    }
                }
            }
        }
    }

    #[test]
    #[serial]
    fn prefers_xdg_config_home() {
        let _g = EnvGuard::set(&[("XDG_CONFIG_HOME", Some("/xdg")), ("HOME", Some("/home/u"))]);
        assert_eq!(profv_home().unwrap(), PathBuf::from("/xdg/profile-versions"));
        assert_eq!(
            paths().unwrap().config,
            PathBuf::from("/xdg/profile-versions/config.toml")
        );
    }

    #[test]
    #[serial]
    fn falls_back_to_home_config() {
        let _g = EnvGuard::set(&[("XDG_CONFIG_HOME", None), ("HOME", Some("/home/u"))]);
        assert_eq!(
            profv_home().unwrap(),
            PathBuf::from("/home/u/.config/profile-versions")
        );
    }

    #[test]
    #[serial]
    fn errors_without_any_home() {
        let _g = EnvGuard::set(&[("XDG_CONFIG_HOME", None), ("HOME", None)]);
        assert!(profv_home().is_err());
    }
}
