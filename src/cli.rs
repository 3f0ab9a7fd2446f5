use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Parsed {
    Help,
    Command(CliOptions),
}

#[derive(Debug)]
pub struct CliOptions {
    pub docs_root: PathBuf,
    pub docs_root_was_provided: bool,
    pub command: Command,
}

#[derive(Debug)]
pub enum Command {
    Serve {
        addr: Option<SocketAddr>,
        port: Option<u16>,
    },
    Install,
    Revert,
}

#[derive(Debug)]
pub struct CliError {
    message: String,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for CliError {}

pub fn parse<I>(args: I) -> Result<Parsed, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let mut docs_root: Option<PathBuf> = None;
    let mut docs_root_was_provided = false;
    let mut mode: Option<Mode> = None;
    let mut addr: Option<SocketAddr> = None;
    let mut port: Option<u16> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Parsed::Help),
            "-d" | "--docs-dir" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::new("--docs-dir requires a value"))?;
                docs_root = Some(PathBuf::from(value));
                docs_root_was_provided = true;
            }
            "--port" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::new("--port requires a value"))?;
                let parsed = value
                    .parse()
                    .map_err(|_| CliError::new("invalid value for --port"))?;
                port = Some(parsed);
            }
            "--addr" | "--bind" | "--listen" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::new("--addr requires a value"))?;
                let parsed = value
                    .parse()
                    .map_err(|_| CliError::new("invalid socket address for --addr"))?;
                addr = Some(parsed);
            }
            other if other.starts_with('-') => {
                return Err(CliError::new(format!("unrecognized option: {other}")));
            }
            other => match other {
                "serve" | "server" => mode = Some(Mode::Serve),
                "install" => mode = Some(Mode::Install),
                "revert" => mode = Some(Mode::Revert),
                _ => {
                    if docs_root.is_none() {
                        docs_root = Some(PathBuf::from(other));
                        docs_root_was_provided = true;
                    } else {
                        return Err(CliError::new(format!(
                            "unexpected positional argument: {other}"
                        )));
                    }
                }
            },
        }
    }

    let (docs_root, docs_root_was_provided) = match docs_root {
        Some(path) => (path, docs_root_was_provided),
        None => (default_docs_root()?, false),
    };

    match mode.unwrap_or(Mode::Serve) {
        Mode::Serve => Ok(Parsed::Command(CliOptions {
            docs_root,
            docs_root_was_provided,
            command: Command::Serve { addr, port },
        })),
        Mode::Install => {
            reject_serve_flags(&addr, &port)?;
            Ok(Parsed::Command(CliOptions {
                docs_root,
                docs_root_was_provided,
                command: Command::Install,
            }))
        }
        Mode::Revert => {
            reject_serve_flags(&addr, &port)?;
            Ok(Parsed::Command(CliOptions {
                docs_root,
                docs_root_was_provided,
                command: Command::Revert,
            }))
        }
    }
}

pub fn usage() -> &'static str {
    "swagger-doc-viewer\n\nUSAGE:\n  swagger-doc-viewer [serve] [-d|--docs-dir <path>] [--addr <ip:port>] [--port <port>]\n  swagger-doc-viewer install [-d|--docs-dir <path>]\n  swagger-doc-viewer revert [-d|--docs-dir <path>]\n\nDESCRIPTION:\n  Serve a service's docs tree with the Swagger documentation page overlaid\n  at /documentation/api/ (default), or install/remove the\n  service-constants.js override template a project edits to customize the\n  page title and swagger.json location.\n\nEXAMPLES:\n  swagger-doc-viewer serve --port 8080\n  swagger-doc-viewer install --docs-dir webapp\n  swagger-doc-viewer revert --docs-dir webapp\n"
}

#[derive(Debug, Copy, Clone)]
enum Mode {
    Serve,
    Install,
    Revert,
}

fn reject_serve_flags(addr: &Option<SocketAddr>, port: &Option<u16>) -> Result<(), CliError> {
    if addr.is_some() || port.is_some() {
        return Err(CliError::new(
            "--addr/--port are only valid with the serve command",
        ));
    }
    Ok(())
}

// A project's static resources conventionally live in webapp/ when present.
fn default_docs_root() -> Result<PathBuf, CliError> {
    let cwd = env::current_dir()
        .map_err(|e| CliError::new(format!("unable to determine current directory: {e}")))?;
    let webapp = cwd.join("webapp");
    if webapp.is_dir() {
        Ok(webapp)
    } else {
        Ok(cwd)
    }
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn options(list: &[&str]) -> CliOptions {
        match parse(args(list)).expect("parse") {
            Parsed::Command(options) => options,
            Parsed::Help => panic!("expected a command"),
        }
    }

    #[test]
    fn defaults_to_serve() {
        let options = options(&["swagger-doc-viewer"]);
        assert!(matches!(
            options.command,
            Command::Serve {
                addr: None,
                port: None
            }
        ));
        assert!(!options.docs_root_was_provided);
    }

    #[test]
    fn serve_accepts_addr_and_port() {
        let options = options(&["swagger-doc-viewer", "serve", "--addr", "0.0.0.0:8080"]);
        match options.command {
            Command::Serve { addr, port } => {
                assert_eq!(addr, Some("0.0.0.0:8080".parse().unwrap()));
                assert_eq!(port, None);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn install_takes_the_docs_dir() {
        let options = options(&["swagger-doc-viewer", "install", "-d", "webapp"]);
        assert!(matches!(options.command, Command::Install));
        assert_eq!(options.docs_root, PathBuf::from("webapp"));
        assert!(options.docs_root_was_provided);
    }

    #[test]
    fn positional_argument_is_the_docs_dir() {
        let options = options(&["swagger-doc-viewer", "revert", "webapp"]);
        assert!(matches!(options.command, Command::Revert));
        assert_eq!(options.docs_root, PathBuf::from("webapp"));
    }

    #[test]
    fn port_is_rejected_outside_serve() {
        let err = parse(args(&["swagger-doc-viewer", "install", "--port", "8080"]))
            .expect_err("should reject");
        assert!(err.to_string().contains("serve"));
    }

    #[test]
    fn help_wins() {
        assert!(matches!(
            parse(args(&["swagger-doc-viewer", "--help"])).expect("parse"),
            Parsed::Help
        ));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        parse(args(&["swagger-doc-viewer", "--watch"])).expect_err("should reject");
    }
}
