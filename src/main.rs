use std::process::ExitCode;

fn main() -> ExitCode {
    match medimate_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("MediMate failed: {e}");
            ExitCode::FAILURE
        }
    }
}
