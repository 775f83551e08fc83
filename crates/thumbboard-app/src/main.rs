//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    use clap::Parser;
    use thumbboard_app::{App, AppConfig};

    env_logger::init();
    let config = AppConfig::parse();
    log::info!("Replaying {}", config.script.display());

    match App::run(&config) {
        Ok(summary) => {
            println!("{}", summary);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("thumbboard: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
