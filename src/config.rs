use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SERVICE_TITLE, DEFAULT_SWAGGER_URL};

static APP_CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::load);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub page: PageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

/// Viewer defaults for the documentation page. These apply only to
/// constants the docs tree's `service-constants.js` leaves undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub swagger_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            page: PageConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_SERVICE_TITLE.to_string(),
            swagger_url: DEFAULT_SWAGGER_URL.to_string(),
        }
    }
}

impl AppConfig {
    fn load() -> Self {
        let path = config_path();

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_yaml::from_str::<AppConfig>(&raw) {
                Ok(mut cfg) => {
                    let env_map = EnvSource::new(&path);
                    cfg.resolve_env(&env_map);
                    cfg.normalize();
                    cfg
                }
                Err(err) => {
                    eprintln!(
                        "swagger-doc-viewer: Failed to parse config at {}: {err}",
                        path.display()
                    );
                    AppConfig::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if let Err(write_err) = write_default_template(&path) {
                    eprintln!(
                        "swagger-doc-viewer: Unable to create default config at {}: {write_err}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "swagger-doc-viewer: Created config template at {}",
                        path.display()
                    );
                }
                AppConfig::default()
            }
            Err(err) => {
                eprintln!(
                    "swagger-doc-viewer: Unable to read config at {}: {err}",
                    path.display()
                );
                AppConfig::default()
            }
        }
    }

    fn normalize(&mut self) {
        if self.server.addr.trim().is_empty() {
            self.server.addr = ServerConfig::default().addr;
        } else {
            self.server.addr = self.server.addr.trim().to_string();
        }
        if self.server.port == 0 {
            self.server.port = ServerConfig::default().port;
        }

        if self.page.title.trim().is_empty() {
            self.page.title = PageConfig::default().title;
        } else {
            self.page.title = self.page.title.trim().to_string();
        }
        if self.page.swagger_url.trim().is_empty() {
            self.page.swagger_url = PageConfig::default().swagger_url;
        } else {
            self.page.swagger_url = self.page.swagger_url.trim().to_string();
        }
    }

    fn resolve_env(&mut self, source: &EnvSource) {
        resolve_string(&mut self.server.addr, "server.addr", source);
        resolve_string(&mut self.page.title, "page.title", source);
        resolve_string(&mut self.page.swagger_url, "page.swagger_url", source);
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        match self.addr.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port),
            Err(_) => {
                eprintln!(
                    "swagger-doc-viewer: Invalid server.addr {:?} in config; using 127.0.0.1",
                    self.addr
                );
                SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.port)
            }
        }
    }
}

pub fn app_config() -> &'static AppConfig {
    &APP_CONFIG
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var("SDV_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    default_config_path()
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|mut dir| {
            dir.push(".swagger-doc-viewer");
            dir.push("config.yaml");
            dir
        })
        .unwrap_or_else(|| PathBuf::from(".swagger-doc-viewer/config.yaml"))
}

fn write_default_template(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
    Ok(())
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Swagger Doc Viewer configuration
# Automatically generated on first launch. Values may reference environment
# variables via $VAR or ${VAR}; lookups check the process environment, a .env
# file next to this config, the current working directory, then $HOME/.env.
server:
  addr: 127.0.0.1
  port: 7878
page:
  # Defaults for constants the docs tree's service-constants.js leaves unset.
  title: REST Services
  swagger_url: ../../api/swagger/swagger.json
"#;

struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    fn new(config_path: &Path) -> Self {
        let mut vars: HashMap<String, String> = env::vars().collect();

        Self::merge_env_file(config_path.parent(), &mut vars);
        Self::merge_env_file(env::current_dir().ok().as_deref(), &mut vars);
        Self::merge_env_file(dirs::home_dir().as_deref(), &mut vars);

        Self { vars }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    fn merge_env_file(dir: Option<&Path>, vars: &mut HashMap<String, String>) {
        let Some(dir) = dir else {
            return;
        };
        let env_path = dir.join(".env");
        if let Ok(iter) = dotenvy::from_path_iter(&env_path) {
            for item in iter.flatten() {
                if !vars.contains_key(&item.0) {
                    vars.insert(item.0, item.1);
                }
            }
        }
    }
}

fn resolve_string(value: &mut String, field: &str, env: &EnvSource) {
    let trimmed = value.trim();
    if let Some(name) = extract_env_ref(trimmed) {
        if let Some(resolved) = env.lookup(name) {
            *value = resolved.to_string();
        } else {
            eprintln!(
                "swagger-doc-viewer: Environment placeholder ${name} for {field} not found; leaving empty."
            );
            value.clear();
        }
    }
}

fn extract_env_ref(value: &str) -> Option<&str> {
    if let Some(rest) = value.strip_prefix("${") {
        return rest.strip_suffix('}');
    }
    if let Some(rest) = value.strip_prefix('$') {
        if rest.chars().all(is_valid_env_char) && !rest.is_empty() {
            return Some(rest);
        }
    }
    None
}

fn is_valid_env_char(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_env_placeholders() {
        let mut cfg = AppConfig::default();
        cfg.page.title = "$DOCS_TITLE".to_string();
        cfg.page.swagger_url = "${DOCS_SWAGGER_URL}".to_string();

        let env = EnvSource {
            vars: HashMap::from([
                ("DOCS_TITLE".to_string(), "Assistant v2".to_string()),
                (
                    "DOCS_SWAGGER_URL".to_string(),
                    "/v2/swagger.json".to_string(),
                ),
            ]),
        };

        cfg.resolve_env(&env);

        assert_eq!(cfg.page.title, "Assistant v2");
        assert_eq!(cfg.page.swagger_url, "/v2/swagger.json");
    }

    #[test]
    fn missing_placeholder_falls_back_to_default_after_normalize() {
        let mut cfg = AppConfig::default();
        cfg.page.title = "$SDV_NO_SUCH_VAR".to_string();

        let env = EnvSource {
            vars: HashMap::new(),
        };
        cfg.resolve_env(&env);
        cfg.normalize();

        assert_eq!(cfg.page.title, DEFAULT_SERVICE_TITLE);
    }

    #[test]
    fn normalize_backfills_blank_values() {
        let mut cfg = AppConfig::default();
        cfg.server.addr = "  ".to_string();
        cfg.server.port = 0;
        cfg.page.swagger_url = String::new();

        cfg.normalize();

        assert_eq!(cfg.server.addr, "127.0.0.1");
        assert_eq!(cfg.server.port, 7878);
        assert_eq!(cfg.page.swagger_url, DEFAULT_SWAGGER_URL);
    }

    #[test]
    fn invalid_addr_falls_back_to_loopback() {
        let cfg = ServerConfig {
            addr: "not-an-ip".to_string(),
            port: 9000,
        };
        let addr = cfg.socket_addr();
        assert_eq!(addr, SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9000));
    }
}
