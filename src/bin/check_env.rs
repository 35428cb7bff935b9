use anyhow::Result;
use clap::{Arg, Command};

use dossier::config::check::{validate_process_env, EnvIssue};

fn main() -> Result<()> {
    let matches = Command::new("check-env")
        .about("Validate environment variables before starting the server")
        .arg(
            Arg::new("strict")
                .help("Treat warnings as errors")
                .long("strict")
                .short('s')
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let strict = matches.get_flag("strict");
    let report = validate_process_env();

    for name in &report.ok {
        println!("  ok    {}", name);
    }
    print_issues("warn ", &report.warnings);
    print_issues("error", &report.errors);

    println!(
        "\n{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    );

    if !report.is_ok() || (strict && report.has_warnings()) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_issues(label: &str, issues: &[EnvIssue]) {
    for issue in issues {
        println!("  {} {}: {}", label, issue.variable, issue.message);
    }
}
