use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::content::repository::DEFAULT_EXCERPT_SEPARATOR;
use crate::query::Visibility;
use crate::render::DEFAULT_CODE_THEME;
use crate::util::toml_date::TomlDate;

#[derive(Deserialize)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub content_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub resume_file: Option<PathBuf>,
}

#[derive(Deserialize)]
pub struct Personal {
    pub name: String,
    pub activity_start_year: i32,
    pub blog_start_date: TomlDate,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    Development,
    Production,
}

impl SiteMode {
    pub fn visibility(&self) -> Visibility {
        match self {
            SiteMode::Development => Visibility::All,
            SiteMode::Production => Visibility::PublishedOnly,
        }
    }
}

#[derive(Deserialize)]
pub struct Site {
    pub mode: SiteMode,
    pub base_url: String,
    pub page_size: u32,
    pub home_post_count: Option<u32>,
    pub excerpt_separator: Option<String>,
    pub code_theme: Option<String>,
    pub render_cache_enabled: bool,
}

impl Site {
    pub fn home_post_count(&self) -> u32 {
        self.home_post_count.unwrap_or(2)
    }

    pub fn excerpt_separator(&self) -> &str {
        self.excerpt_separator.as_deref().unwrap_or(DEFAULT_EXCERPT_SEPARATOR)
    }

    pub fn code_theme(&self) -> &str {
        self.code_theme.as_deref().unwrap_or(DEFAULT_CODE_THEME)
    }

    /// Rendered documents are only memoized in production.
    pub fn caching(&self) -> bool {
        self.render_cache_enabled && self.mode == SiteMode::Production
    }
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct CodeHost {
    pub user: String,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
    pub page_size: Option<u32>,
}

#[derive(Deserialize)]
pub struct Search {
    pub app_id: String,
    pub index_name: String,
    /// Name of the environment variable holding the admin key.
    pub api_key_env: String,
}

#[derive(Deserialize)]
pub struct Config {
    pub personal: Personal,
    pub paths: Paths,
    pub site: Site,
    pub server: Server,
    pub log: Option<Log>,
    pub code_host: Option<CodeHost>,
    pub search: Option<Search>,
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    let Some(str_path) = path.to_str() else {
        return Ok(path);
    };
    if !str_path.starts_with("${exe_dir}") {
        return Ok(path);
    }

    let cur_exe = env::current_exe()?;
    let exe_dir = cur_exe.parent()
        .and_then(Path::to_str)
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Could not resolve the executable directory"))?;
    Ok(PathBuf::from(str_path.replace("${exe_dir}", exe_dir)))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir)?,
        public_dir: parse_path(cfg.paths.public_dir)?,
        content_dir: parse_path(cfg.paths.content_dir)?,
        pages_dir: parse_path(cfg.paths.pages_dir)?,
        resume_file: cfg.paths.resume_file.map(parse_path).transpose()?,
    };

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[personal]
name = "Jane Doe"
activity_start_year = 2008
blog_start_date = 2020-03-01

[paths]
template_dir = "res/template"
public_dir = "res/public"
content_dir = "res/content"
pages_dir = "res/pages"

[site]
mode = "production"
base_url = "https://example.com"
page_size = 10
render_cache_enabled = true

[server]
address = "127.0.0.1"
port = 8001

[code_host]
user = "janedoe"
token_env = "GITHUB_TOKEN"
"#;

    #[test]
    fn test_parse_config() {
        let cfg = parse_config(CONFIG).unwrap();
        assert_eq!(cfg.personal.name, "Jane Doe");
        assert_eq!(cfg.site.mode, SiteMode::Production);
        assert_eq!(cfg.site.mode.visibility(), Visibility::PublishedOnly);
        assert_eq!(cfg.site.excerpt_separator(), DEFAULT_EXCERPT_SEPARATOR);
        assert_eq!(cfg.site.code_theme(), DEFAULT_CODE_THEME);
        assert_eq!(cfg.site.home_post_count(), 2);
        assert!(cfg.site.caching());
        assert!(cfg.paths.resume_file.is_none());
        assert!(cfg.log.is_none());
        assert!(cfg.search.is_none());
        assert_eq!(cfg.code_host.unwrap().user, "janedoe");
    }

    #[test]
    fn test_development_mode() {
        let cfg = parse_config(&CONFIG.replace("\"production\"", "\"development\"")).unwrap();
        assert_eq!(cfg.site.mode.visibility(), Visibility::All);
        assert!(!cfg.site.caching());
    }

    #[test]
    fn test_invalid_mode() {
        let err = parse_config(&CONFIG.replace("\"production\"", "\"staging\"")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_exe_dir_paths() {
        let path = parse_path(PathBuf::from("${exe_dir}/template")).unwrap();
        assert!(!path.to_string_lossy().contains("${exe_dir}"));
        assert_eq!(parse_path(PathBuf::from("res")).unwrap(), PathBuf::from("res"));
    }
}
