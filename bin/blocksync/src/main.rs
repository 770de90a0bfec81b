use std::io::Write;
use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    run_with(env::args_os(), &mut stdout, &mut stderr)
}

fn run_with<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let status = cli::run(args, stdout, stderr);
    cli::exit_code_from(status)
}

#[cfg(test)]
mod tests {
    use super::run_with;

    // `std::process::ExitCode` has no `PartialEq` impl, so these smoke-test
    // `run_with` for panics and check the underlying status through
    // `cli::run` directly rather than comparing `ExitCode` values.

    #[test]
    fn version_flag_reports_success() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        run_with(["blocksync", "--version"], &mut stdout, &mut stderr);
        assert_eq!(cli::run(["blocksync", "--version"], &mut Vec::new(), &mut Vec::new()), 0);
        assert!(!stdout.is_empty(), "version output should not be empty");
        assert!(stderr.is_empty(), "version flag should not write to stderr");
    }

    #[test]
    fn missing_arguments_report_failure() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        run_with(["blocksync"], &mut stdout, &mut stderr);
        assert_ne!(cli::run(["blocksync"], &mut Vec::new(), &mut Vec::new()), 0);
    }
}
