use std::{env, path::PathBuf, process};

use markily_core::{
    cli::{self, CliOptions},
    domain::{OwnerId, TenantId},
    init,
    utils::build_info,
};

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            process::exit(2);
        }
    };

    init();
    tracing::info!(build = %build_info::current().summary(), "starting console transport");

    if let Err(err) = cli::run(options) {
        cli::output::error(&err);
        process::exit(1);
    }
}

/// `Ok(None)` when the invocation was fully handled (`--version`, `--help`).
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("{}", build_info::current().summary());
                return Ok(None);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--home" => {
                let dir = args.next().ok_or("--home needs a directory")?;
                options.home = Some(PathBuf::from(dir));
            }
            "--user" => options.session.owner = OwnerId(id_arg(&arg, args.next())?),
            "--chat" => options.session.tenant = TenantId(id_arg(&arg, args.next())?),
            other => return Err(format!("unknown argument `{other}`")),
        }
    }
    Ok(Some(options))
}

fn id_arg(flag: &str, value: Option<String>) -> Result<i64, String> {
    value
        .as_deref()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| format!("{flag} needs a numeric id"))
}

fn print_usage() {
    eprintln!("Usage: markily_cli [--home <dir>] [--user <id>] [--chat <id>] [--version]");
}
