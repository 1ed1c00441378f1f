use std::fs;
use std::io::Read;

use keyrand::config::Thresholds;
use keyrand::error::Error;
use keyrand::suite;

use crate::cli::TestArgs;
use crate::output;

/// Reads the key, runs the four-test battery, prints one line per test and
/// an aggregate verdict. Returns whether every test passed.
pub fn run(args: &TestArgs, thresholds: &Thresholds) -> Result<bool, Error> {
    let key = read_key(args)?;
    log::info!("testing {}-byte key ({} bits)", key.len(), key.len() * 8);

    if key.len() != 2500 && using_default_windows(thresholds) {
        log::warn!(
            "default thresholds are calibrated for 2500-byte keys, got {} bytes",
            key.len()
        );
    }

    if let Some(ref fmt) = args.dump_format {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        output::format_output(&key, fmt, &mut out)?;
    }

    let outcome = suite::run_suite(&key, thresholds)?;

    for test in outcome.iter() {
        let verdict = if test.passed { "passed" } else { "FAILED" };
        println!("{:<24} {}  ({})", test.name, verdict, test.detail);
    }

    if outcome.all_passed() {
        println!("All tests passed");
    } else {
        println!("Key did not pass the battery");
    }

    Ok(outcome.all_passed())
}

fn read_key(args: &TestArgs) -> Result<Vec<u8>, Error> {
    match args.key_file {
        Some(ref path) => Ok(fs::read(path)?),
        None => {
            let mut key = Vec::new();
            std::io::stdin().lock().read_to_end(&mut key)?;
            Ok(key)
        }
    }
}

fn using_default_windows(t: &Thresholds) -> bool {
    let d = Thresholds::default();
    t.monobit_min == d.monobit_min
        && t.monobit_max == d.monobit_max
        && t.run_buckets == d.run_buckets
}
