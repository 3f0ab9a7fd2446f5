mod assets;
mod cli;
mod config;
mod constants;
mod injector;
mod scaffold;
mod server;

use std::env;
use std::net::SocketAddr;
use std::process;

use cli::{CliOptions, Command, Parsed};
use constants::OVERRIDE_RELATIVE_PATH;

#[tokio::main]
async fn main() {
    let parsed = match cli::parse(env::args()) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("swagger-doc-viewer: {err}");
            eprintln!("Run with --help for usage.");
            process::exit(2);
        }
    };

    let options = match parsed {
        Parsed::Help => {
            print!("{}", cli::usage());
            return;
        }
        Parsed::Command(options) => options,
    };

    if !options.docs_root.exists() {
        eprintln!("Docs root not found: {}", options.docs_root.display());
        if options.docs_root_was_provided {
            eprintln!("Hint: check the -d/--docs-dir path.");
        }
        process::exit(1);
    }

    match &options.command {
        Command::Serve { addr, port } => serve(&options, *addr, *port).await,
        Command::Install => install(&options),
        Command::Revert => revert(&options),
    }
}

async fn serve(options: &CliOptions, addr: Option<SocketAddr>, port: Option<u16>) {
    // Config supplies the listen address; flags override it.
    let mut socket = config::app_config().server.socket_addr();
    if let Some(addr) = addr {
        socket = addr;
    }
    if let Some(port) = port {
        socket.set_port(port);
    }

    if let Err(err) = server::run(&options.docs_root, socket).await {
        eprintln!("Server error: {err}");
        process::exit(1);
    }
}

fn install(options: &CliOptions) {
    match scaffold::install(&options.docs_root) {
        Ok(summary) if summary.modified > 0 => {
            println!(
                "Installed {} under {}.",
                OVERRIDE_RELATIVE_PATH,
                options.docs_root.display()
            );
            println!("Edit it to set serviceTitle and swaggerUrl for your service.");
        }
        Ok(_) => println!("Override already present; nothing installed."),
        Err(err) => {
            eprintln!("Error installing override: {err}");
            process::exit(1);
        }
    }
}

fn revert(options: &CliOptions) {
    match scaffold::revert(&options.docs_root) {
        Ok(summary) if summary.modified > 0 => {
            println!(
                "Removed pristine {} under {}.",
                OVERRIDE_RELATIVE_PATH,
                options.docs_root.display()
            );
        }
        Ok(_) => println!("No pristine override to remove."),
        Err(err) => {
            eprintln!("Error reverting override: {err}");
            process::exit(1);
        }
    }
}
