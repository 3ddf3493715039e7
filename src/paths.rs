use std::{path::PathBuf, sync::LazyLock};

pub static DEFAULT_VAULT_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    let mut path = dirs::home_dir().unwrap_or_default();

    if std::env::var("NWN_VAULT_XDG_PATH").is_ok() {
        path.push(".config")
    }

    path.push("NwnVault");
    path
});

/// Computes a path inside the NwnVault data directory.
///
/// Returns a `&Path` to the data directory itself if no arguments are passed in, or a
/// `PathBuf` joining all of the arguments onto it otherwise.
///
/// # Examples
///
/// ```
/// use nwn_vault::vault_path;
///
/// let logs = vault_path!("logs");
/// assert!(logs.ends_with("NwnVault/logs"));
/// assert!(vault_path!().ends_with("NwnVault"));
/// ```
#[macro_export]
macro_rules! vault_path {
    () => {
        $crate::paths::DEFAULT_VAULT_PATH.as_path()
    };

    ( $( $path:expr ),+ $(,)? ) => {
        [
            $crate::paths::DEFAULT_VAULT_PATH.as_path(),
            $( std::path::Path::new(&$path) ),+
        ].into_iter().collect::<std::path::PathBuf>()
    };
}

/// Resolve a configured path: absolute paths are kept, relative ones hang off `$HOME`.
pub fn resolve_home_relative(path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dirs::home_dir().unwrap_or_default().join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(
            resolve_home_relative(Path::new("/opt/nwn")),
            PathBuf::from("/opt/nwn")
        );
    }

    #[test]
    fn relative_paths_hang_off_home() {
        let resolved = resolve_home_relative(Path::new(".wine/drive_c"));
        assert!(resolved.ends_with(".wine/drive_c"));
        assert!(resolved.is_absolute() || dirs::home_dir().is_none());
    }
}
