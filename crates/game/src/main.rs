use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    app::run(&args)
}
