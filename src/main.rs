mod check;
mod cli;
mod logging;
mod output;
mod testcmd;

use std::path::Path;
use std::process;

use clap::Parser;

use keyrand::config::{self, Thresholds};
use keyrand::error::Error;
use keyrand::keygen;

use cli::{Cli, Command, ThresholdArgs};

/// Build Thresholds by layering: defaults → TOML file → CLI overrides.
///
/// An explicitly given config path that cannot be loaded is an error; only
/// the implicit default path falls back to defaults with a warning.
fn layer_thresholds(
    config_file: Option<&Path>,
    args: &ThresholdArgs,
) -> Result<Thresholds, Error> {
    let mut t = match config::load_config(config_file) {
        Ok(c) => c.thresholds,
        Err(e) if config_file.is_some() => return Err(e),
        Err(e) => {
            log::warn!("{}", e);
            Thresholds::default()
        }
    };

    // Apply CLI overrides (only if explicitly set)
    if let Some(v) = args.monobit_min {
        t.monobit_min = v;
    }
    if let Some(v) = args.monobit_max {
        t.monobit_max = v;
    }
    if let Some(v) = args.series_max {
        t.series_max = v;
    }
    if let Some(v) = args.poker_min {
        t.poker_min = v;
    }
    if let Some(v) = args.poker_max {
        t.poker_max = v;
    }
    if args.check_final_run {
        t.check_final_run = true;
    }

    t.validate()?;
    Ok(t)
}

fn build_thresholds(config_file: Option<&Path>, args: &ThresholdArgs) -> Thresholds {
    match layer_thresholds(config_file, args) {
        Ok(t) => t,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}

fn run_generate(cli: &Cli) {
    if cli.bytes == 0 {
        log::error!("byte count must be greater than 0");
        process::exit(1);
    }

    match keygen::random_key(cli.bytes) {
        Ok(key) => {
            if let Err(e) = output::write_output(&key, &cli.format, cli.output_file.as_deref()) {
                log::error!("error writing output: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::Test(args)) => {
            logging::init(&args.log, false);
            let thresholds = build_thresholds(args.config_file.as_deref(), &args.thresholds);
            match testcmd::run(args, &thresholds) {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => {
                    log::error!("{}", e);
                    process::exit(1);
                }
            }
        }
        Some(Command::Check(args)) => {
            logging::init(&args.log, true);
            let thresholds = build_thresholds(args.config_file.as_deref(), &args.thresholds);
            if let Err(e) = check::run(args, &thresholds) {
                log::error!("{}", e);
                process::exit(1);
            }
        }
        None => {
            logging::init(&cli.log, false);
            run_generate(&cli);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_overrides() -> ThresholdArgs {
        ThresholdArgs {
            monobit_min: None,
            monobit_max: None,
            series_max: None,
            poker_min: None,
            poker_max: None,
            check_final_run: false,
        }
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let path = Path::new("/tmp/keyrand_missing_thresholds.toml");
        let result = layer_thresholds(Some(path), &no_overrides());
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_unparsable_config_is_an_error() {
        let path = std::env::temp_dir().join("keyrand_broken_thresholds.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, "[thresholds\nmonobit_min = ").unwrap();
        }
        let result = layer_thresholds(Some(&path), &no_overrides());
        assert!(result.is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_cli_overrides_layer_over_file() {
        let path = std::env::temp_dir().join("keyrand_layered_thresholds.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, "[thresholds]\nmonobit_min = 9000\nseries_max = 30\n").unwrap();
        }
        let args = ThresholdArgs {
            series_max: Some(25),
            ..no_overrides()
        };
        let t = layer_thresholds(Some(&path), &args).unwrap();
        assert_eq!(t.monobit_min, 9000); // from file
        assert_eq!(t.series_max, 25); // CLI wins over file
        assert_eq!(t.poker_min, 1.03); // default
        let _ = std::fs::remove_file(&path);
    }
}
