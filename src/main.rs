// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use log::error;
use rtl_fm_rs::cli::{build_config, Cli};
use rtl_fm_rs::pipeline::Receiver;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Printing to stdout would corrupt raw PCM output, so every
    // diagnostic goes to stderr via stderrlog.
    let verbosity = (2 + cli.verbose as usize).saturating_sub(cli.quiet as usize);
    if stderrlog::new().verbosity(verbosity).init().is_err() {
        eprintln!("failed to initialize logger");
    }

    let (dongle, plan, demod, output) = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    static SHUTDOWN: AtomicBool = AtomicBool::new(false);
    if let Err(e) = ctrlc::set_handler(|| {
        SHUTDOWN.swap(true, Ordering::Relaxed);
    }) {
        error!("failed to install signal handler: {}", e);
        return ExitCode::FAILURE;
    }

    let receiver = Receiver::new(dongle, plan, demod, output);
    match receiver.run(&SHUTDOWN) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}
