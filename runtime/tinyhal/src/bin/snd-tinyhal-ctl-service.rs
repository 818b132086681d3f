// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

use {
    clap::Parser,
    runtime_core::{cmdline::*, LogLevel},
    std::path::PathBuf,
    tinyhal_route_protocols::config::RouteSource,
    tinyhal_runtime::{TinyhalParams, TinyhalRuntime},
};

struct TinyhalServiceCmd;

#[derive(Parser, Default)]
#[command(name = "snd-tinyhal-ctl-service")]
struct Arguments {
    /// The numeric identifier of sound card in Linux sound subsystem.
    card_id: u32,

    /// The name of board to select route configuration, 'tiny_hw' by default.
    #[arg(long, short)]
    board: Option<String>,

    /// The directory to find route configuration, '/system/etc/sound' by default.
    #[arg(long, short)]
    config_dir: Option<PathBuf>,

    /// The level to debug runtime, disabled as a default.
    #[arg(long, short, value_enum)]
    log_level: Option<LogLevel>,
}

impl ServiceCmd<Arguments, TinyhalParams, TinyhalRuntime> for TinyhalServiceCmd {
    fn params(args: &Arguments) -> (TinyhalParams, Option<LogLevel>) {
        let source = RouteSource::new(args.config_dir.as_deref(), args.board.as_deref());
        let params = TinyhalParams {
            card_id: args.card_id,
            source,
        };
        (params, args.log_level)
    }
}

fn main() {
    TinyhalServiceCmd::run()
}
