#![forbid(unsafe_code)]

//! dipsign CLI: wrap an XML document in an enveloping XML-DSig signature and
//! print the result base64-encoded.

use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "dipsign",
    about = "Sign an XML document (enveloping XML-DSig, RSA-PSS/SHA-256) and print it base64-encoded",
    version
)]
struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Private key (PKCS#8, PEM or DER)
    key: PathBuf,

    /// Signer certificate (X.509, PEM or DER)
    cert: PathBuf,

    /// Unsigned XML document
    xml: PathBuf,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dipsign::run(&cli.key, &cli.cert, &cli.xml) {
        Ok(encoded) => println!("{encoded}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
