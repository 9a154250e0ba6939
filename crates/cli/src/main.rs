use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(error) = expenseflow_cli::telemetry::init() {
        eprintln!("failed to initialize logging: {error:#}");
        return ExitCode::from(1);
    }
    expenseflow_cli::run()
}
