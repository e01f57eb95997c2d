use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use address_parser::{evaluate_parser, AddressParserContext, Dataset, ParserModule};
use clap::Parser;

/// Parse the addresses given as arguments, or one per line from STDIN, and
/// print one JSON list of labeled components per address.
/// Evaluate the model on labeled address files instead (with -t option)
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// read the model from a directory (DIR)
    #[arg(short, long, value_name = "DIR", env = "ADDRESS_PARSER_DIR")]
    model: PathBuf,
    /// language of the addresses, selects language specific dictionary entries
    #[arg(short, long, default_value = "en")]
    language: String,
    /// country of the addresses
    #[arg(short, long, default_value = "us")]
    country: String,
    /// report the performance of the model on labeled data files
    #[arg(short = 't', long = "test")]
    evaluate: bool,
    /// addresses to parse, or labeled data files in test mode
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,
}

fn main() -> address_parser::Result<()> {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("{:?}", argv);

    let module = ParserModule::new();
    module.setup(&argv.model)?;

    if argv.evaluate {
        let mut dataset = Dataset::default();
        for fpath in &argv.inputs {
            dataset.read_file(fpath)?;
        }
        log::info!("read {} labeled addresses", dataset.len());
        let parser = module.parser()?;
        let evaluation = evaluate_parser(&parser, &dataset);
        println!("{}", evaluation);
    } else {
        let mut ctx = AddressParserContext::new();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut emit = |address: &str| -> address_parser::Result<()> {
            let response = module.parse(address, &argv.language, &argv.country, &mut ctx)?;
            serde_json::to_writer(&mut out, &response).map_err(io::Error::from)?;
            writeln!(out)?;
            Ok(())
        };
        if argv.inputs.is_empty() {
            for line in io::stdin().lock().lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    emit(&line)?;
                }
            }
        } else {
            for address in &argv.inputs {
                emit(address)?;
            }
        }
    }

    module.teardown();
    Ok(())
}
