use std::process::ExitCode;

fn main() -> ExitCode {
    match repo_info_proxy::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
