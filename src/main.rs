use std::process::ExitCode;

fn main() -> ExitCode {
    pom_harvest::run()
}
