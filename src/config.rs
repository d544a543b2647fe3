use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DB_ENV: &str = "JOBBOARD_DB";
pub const PAGE_SIZE_ENV: &str = "JOBBOARD_PAGE_SIZE";

const DEFAULT_PAGE_SIZE: usize = 9;
const DEFAULT_FEATURED_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding the key-value mirror.
    pub db_path: PathBuf,
    /// Jobs per page in listings and search results.
    pub page_size: usize,
    /// How many featured jobs the front page shows.
    pub featured_limit: usize,
}

impl Config {
    /// Precedence: `--db` flag, then `JOBBOARD_DB`, then the platform data dir.
    pub fn resolve(db_flag: Option<PathBuf>) -> Result<Self> {
        Self::from_sources(db_flag, std::env::var(DB_ENV).ok(), std::env::var(PAGE_SIZE_ENV).ok())
    }

    fn from_sources(
        db_flag: Option<PathBuf>,
        db_env: Option<String>,
        page_size_env: Option<String>,
    ) -> Result<Self> {
        let db_path = match db_flag {
            Some(path) => path,
            None => match db_env.filter(|v| !v.is_empty()) {
                Some(path) => PathBuf::from(path),
                None => default_db_path(),
            },
        };

        let page_size = match page_size_env {
            Some(raw) => {
                let size: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid {} '{}'", PAGE_SIZE_ENV, raw))?;
                anyhow::ensure!(size > 0, "{} must be greater than zero", PAGE_SIZE_ENV);
                size
            }
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            db_path,
            page_size,
            featured_limit: DEFAULT_FEATURED_LIMIT,
        })
    }
}

fn default_db_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
        proj_dirs.data_dir().join("jobboard.db")
    } else {
        PathBuf::from("jobboard.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_env() {
        let config = Config::from_sources(
            Some(PathBuf::from("/tmp/flag.db")),
            Some("/tmp/env.db".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/flag.db"));
        assert_eq!(config.page_size, 9);
        assert_eq!(config.featured_limit, 3);
    }

    #[test]
    fn test_env_used_without_flag() {
        let config = Config::from_sources(
            None,
            Some("/tmp/env.db".to_string()),
            Some("20".to_string()),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/env.db"));
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_default_path_ends_with_db_name() {
        let config = Config::from_sources(None, Some(String::new()), None).unwrap();
        assert!(config.db_path.ends_with("jobboard.db"));
    }

    #[test]
    fn test_bad_page_size_is_rejected() {
        let err = Config::from_sources(None, None, Some("lots".to_string())).unwrap_err();
        assert!(err.to_string().contains(PAGE_SIZE_ENV));
        assert!(Config::from_sources(None, None, Some("0".to_string())).is_err());
    }
}
