mod api;
mod banner;
mod cli;
mod config;
mod events;
mod logging;
mod pipeline;
mod query;
mod records;
mod search;
mod sheet;
mod writer;

use clap::Parser;
use events::{ConsoleSink, EventSink, UiEvent};

fn main() {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    if !cli.no_banner {
        banner::print();
    }

    let config = cli.config();
    let sink = ConsoleSink::new();
    let result = cli
        .command
        .into_job(&*sink)
        .and_then(|job| pipeline::run(&config, &job, &*sink));

    if let Err(e) = result {
        sink.send(UiEvent::Error(format!("{:#}", e)));
        std::process::exit(1);
    }
}
