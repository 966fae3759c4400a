/*
    List every source file under the mapped directories, with the name
    it implies and whether resolving that name actually finds it.
*/

use prefix_resolver::catalog::{catalog, Status};
use prefix_resolver::cli::ResolverArgs;
use prefix_resolver::FsLoader;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(flatten)]
    resolver: ResolverArgs,

    /// Print entries as a JSON array
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    prefix_resolver::util::init_logging();
    let args = Args::parse();

    let resolver = args.resolver.build_resolver(FsLoader::new())?;
    let entries = catalog(&resolver)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        match entry.status {
            Status::Resolvable => println!("{}", entry),
            Status::Shadowed { .. } => println!("{}", entry.to_string().yellow()),
            Status::Unreachable => println!("{}", entry.to_string().red()),
        }
    }
    Ok(())
}
