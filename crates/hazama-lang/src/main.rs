#![forbid(unsafe_code)]

//! `hazama-lang` binary entry point.

use hazama_lang::{cli, commands, logging};

fn main() {
    let opts = cli::Opts::parse();
    logging::init(&opts.log_filter, opts.log_json);

    match commands::run(&opts) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
