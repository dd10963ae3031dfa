/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */
use pagerank_rt::cli::{cli_main, diagnostic, init_env_logger};

fn main() {
    let result = init_env_logger().and_then(|()| cli_main(std::env::args_os()));
    if let Err(err) = result {
        eprintln!("{}", diagnostic(&err));
        std::process::exit(1);
    }
}
