use std::process::ExitCode;

use pointswarm::SwarmConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => match SwarmConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}: {err}", path.to_string_lossy());
                return ExitCode::FAILURE;
            }
        },
        None => SwarmConfig::default(),
    };

    match pointswarm::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
