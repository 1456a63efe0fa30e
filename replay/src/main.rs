use std::{
    io::{self, Write},
    path::PathBuf,
};

use structopt::StructOpt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use replay::{error::Error, summary, trace::Sides};

/// Lists the requests captured in a message log.
#[derive(StructOpt)]
struct Args {
    /// Capture side(s) to read: client, service or both.
    #[structopt(short, long, default_value = "both")]
    side: Sides,

    /// Print the body of each request.
    #[structopt(short, long)]
    body: bool,

    #[structopt(short, long)]
    verbose: bool,

    #[structopt(parse(from_os_str))]
    input: PathBuf,
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(fmt::layer().without_time().with_writer(io::stderr))
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;

    for message in replay::trace::open(&args.input, args.side)? {
        let message = message?;
        writeln!(out, "{}", summary(&message))?;

        if args.body {
            if let Some(body) = message.body() {
                writeln!(out, "{}", body.to_xml_string()?)?;
            }
        }

        count += 1;
    }

    tracing::info!(requests = count, input = %args.input.display(), "done");
    Ok(())
}
