//! Entry point for the `waystation` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    pretty_env_logger::init();
    if let Err(err) = waystation_cli::run() {
        eprintln!("waystation: {err}");
        std::process::exit(1);
    }
}
