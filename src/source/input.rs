use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use url::Url;

use crate::error::SourceError;

/// Where a source's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputReference {
    /// Nothing set, or data supplied in memory.
    #[default]
    None,
    Local(PathBuf),
    Remote(Url),
}

impl InputReference {
    /// Interpret a user-supplied location.
    ///
    /// `file:` URLs become local paths. Only `scheme://` locations that do not
    /// name an existing path are remote; `notes:v2.txt` and `C:\dir` stay local.
    pub fn parse(location: &str) -> Self {
        if location.is_empty() {
            return InputReference::None;
        }
        let local = PathBuf::from(location);
        let url_like = location.contains("://") || location.starts_with("file:");
        if !url_like || local.exists() {
            return InputReference::Local(local);
        }
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => InputReference::Local(path),
                Err(()) => InputReference::Remote(url),
            },
            Ok(url) if url.scheme().len() > 1 => InputReference::Remote(url),
            _ => InputReference::Local(local),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, InputReference::None)
    }

    pub fn is_local(&self) -> bool {
        matches!(self, InputReference::Local(_))
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            InputReference::Local(path) => Some(path),
            _ => None,
        }
    }

    /// A path whose file name can be used to guess the content type.
    pub fn name_hint(&self) -> Option<PathBuf> {
        match self {
            InputReference::None => None,
            InputReference::Local(path) => Some(path.clone()),
            InputReference::Remote(url) => Some(PathBuf::from(url.path())),
        }
    }

    /// Remote locations are not probed; they report `true` until fetched.
    pub fn exists(&self) -> bool {
        match self {
            InputReference::None => false,
            InputReference::Local(path) => path.exists(),
            InputReference::Remote(_) => true,
        }
    }

    pub fn size(&self) -> Option<u64> {
        let path = self.local_path()?;
        fs::metadata(path).ok().map(|m| m.len())
    }

    pub fn modified(&self) -> Option<SystemTime> {
        let path = self.local_path()?;
        fs::metadata(path).ok()?.modified().ok()
    }

    /// Reject devices, directories and unreadable entries.
    ///
    /// A local path that does not exist passes; the pipeline then yields empty
    /// buffers for it.
    pub(crate) fn check_regular(&self) -> Result<(), SourceError> {
        let Some(path) = self.local_path() else {
            return Ok(());
        };
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            _ => Err(SourceError::NotRegularFile {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for InputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputReference::None => Ok(()),
            InputReference::Local(path) => write!(f, "{}", path.display()),
            InputReference::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Copies a remote location into a local writer.
pub trait RemoteFetcher: fmt::Debug + Send + Sync {
    fn fetch(&self, url: &Url, dest: &mut dyn Write) -> io::Result<()>;
}

/// Refuses every remote scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnlyFetcher;

impl RemoteFetcher for LocalOnlyFetcher {
    fn fetch(&self, url: &Url, _dest: &mut dyn Write) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no access layer for '{}' locations", url.scheme()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert_eq!(InputReference::parse(""), InputReference::None);
        assert_eq!(
            InputReference::parse("src/main.rs"),
            InputReference::Local(PathBuf::from("src/main.rs"))
        );
        assert!(matches!(
            InputReference::parse("https://example.com/a.txt"),
            InputReference::Remote(_)
        ));
        assert_eq!(
            InputReference::parse("C:\\temp\\a.txt"),
            InputReference::Local(PathBuf::from("C:\\temp\\a.txt"))
        );
    }

    #[test]
    fn test_colon_in_file_name_stays_local() {
        assert_eq!(
            InputReference::parse("notes:v2.txt"),
            InputReference::Local(PathBuf::from("notes:v2.txt"))
        );
        assert_eq!(
            InputReference::parse("mailto:someone"),
            InputReference::Local(PathBuf::from("mailto:someone"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_is_local() {
        assert_eq!(
            InputReference::parse("file:///tmp/x.txt"),
            InputReference::Local(PathBuf::from("/tmp/x.txt"))
        );
    }

    #[test]
    fn test_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "12345").unwrap();

        let input = InputReference::Local(path);
        assert!(input.is_valid());
        assert!(input.is_local());
        assert!(input.exists());
        assert_eq!(input.size(), Some(5));
        assert!(input.modified().is_some());
        assert!(input.check_regular().is_ok());

        let dir_ref = InputReference::Local(dir.path().to_path_buf());
        assert!(matches!(
            dir_ref.check_regular(),
            Err(SourceError::NotRegularFile { .. })
        ));

        let missing = InputReference::Local(dir.path().join("missing"));
        assert!(!missing.exists());
        assert!(missing.check_regular().is_ok());
    }

    #[test]
    fn test_remote_name_hint() {
        let input = InputReference::parse("https://example.com/dir/code.cpp");
        assert_eq!(input.name_hint(), Some(PathBuf::from("/dir/code.cpp")));
        assert!(!input.is_local());
        assert_eq!(input.size(), None);
    }
}
