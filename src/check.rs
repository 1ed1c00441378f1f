use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use keyrand::config::Thresholds;
use keyrand::error::Error;
use keyrand::{keygen, suite};

use crate::cli::CheckArgs;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Default)]
struct TrialStats {
    trials: u64,
    monobit_pass: u64,
    max_series_pass: u64,
    poker4_pass: u64,
    run_dist_pass: u64,
    all_pass: u64,
    gen_errors: u64,
}

impl TrialStats {
    fn pct(&self, pass_count: u64) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        100.0 * pass_count as f64 / self.trials as f64
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

fn install_signal_handlers() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = signal_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

fn print_progress(stats: &TrialStats, done: u64, total: u64) {
    let mut stderr = std::io::stderr().lock();
    writeln!(
        stderr,
        "--- Progress ({} / {} trials, all-pass {:.1}%) ---",
        done,
        total,
        stats.pct(stats.all_pass)
    )
    .ok();
}

fn print_final_report(stats: &TrialStats, elapsed_secs: f64) {
    println!(
        "Trials: {} | Generation errors: {} | Elapsed: {:.1}s",
        stats.trials, stats.gen_errors, elapsed_secs
    );
    if stats.trials == 0 {
        return;
    }

    println!("{:<24} {:>8} {:>8}", "Test", "Passed", "Rate");
    for (name, pass) in [
        ("Monobit", stats.monobit_pass),
        ("Max series length", stats.max_series_pass),
        ("Poker-4", stats.poker4_pass),
        ("Run-length distribution", stats.run_dist_pass),
        ("All four", stats.all_pass),
    ] {
        println!("{:<24} {:>8} {:>7.1}%", name, pass, stats.pct(pass));
    }
}

pub fn run(args: &CheckArgs, thresholds: &Thresholds) -> Result<(), Error> {
    thresholds.validate()?;

    if args.trials == 0 {
        return Err(Error::InvalidArgs("trial count must be > 0".into()));
    }
    if args.key_size != 2500 {
        log::warn!(
            "key_size {} != 2500 bytes; default thresholds are calibrated for 20000-bit keys",
            args.key_size
        );
    }

    install_signal_handlers();

    log::info!(
        "pass-rate check: trials={}, key_size={} bytes",
        args.trials,
        args.key_size
    );

    let mut stats = TrialStats::default();
    let start = Instant::now();
    let mut last_report = start;

    for done in 0..args.trials {
        if SHUTDOWN.load(Ordering::Relaxed) {
            break;
        }

        match keygen::random_key(args.key_size) {
            Ok(key) => {
                let outcome = suite::run_suite(&key, thresholds)?;
                stats.trials += 1;
                if outcome.monobit.passed {
                    stats.monobit_pass += 1;
                }
                if outcome.max_series.passed {
                    stats.max_series_pass += 1;
                }
                if outcome.poker4.passed {
                    stats.poker4_pass += 1;
                }
                if outcome.run_dist.passed {
                    stats.run_dist_pass += 1;
                }
                if outcome.all_passed() {
                    stats.all_pass += 1;
                }
            }
            Err(e) => {
                stats.gen_errors += 1;
                log::debug!("key generation failed: {}", e);
            }
        }

        if last_report.elapsed().as_secs() >= args.report_interval {
            print_progress(&stats, done + 1, args.trials);
            last_report = Instant::now();
        }
    }

    let elapsed = start.elapsed().as_secs_f64();

    if SHUTDOWN.load(Ordering::Relaxed) {
        log::warn!("interrupted after {} trials, printing partial results", stats.trials);
    }

    print_final_report(&stats, elapsed);

    Ok(())
}
