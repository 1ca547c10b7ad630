use std::process::ExitCode;

fn main() -> ExitCode {
    stoktakip_cli::run()
}
