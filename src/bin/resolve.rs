/*
    Resolve one or more qualified names to source files, using mappings
    from a TOML config file and/or the command line.

    Prints `NAME => PATH` for every name found, `NAME: not found` otherwise.
*/

use prefix_resolver::cli::ResolverArgs;
use prefix_resolver::FsLoader;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(flatten)]
    resolver: ResolverArgs,

    /// Fully-qualified names to resolve
    #[arg(required = true)]
    names: Vec<String>,

    /// Only check that the files exist; don't load them
    #[arg(long, default_value_t = false)]
    no_load: bool,

    /// Print every prefix and candidate file tried
    #[arg(long, default_value_t = false)]
    explain: bool,
}

fn main() -> Result<()> {
    prefix_resolver::util::init_logging();
    let args = Args::parse();

    let resolver = args.resolver.build_resolver(FsLoader::new())?;

    let mut missing = 0;
    for name in &args.names {
        if args.explain {
            let resolution = resolver.explain(name)?;
            println!("{}:", name.bold());
            for probe in &resolution.probes {
                println!("    {}", probe);
            }
        }

        let found =
            if args.no_load { resolver.locate(name)? } else { resolver.resolve(name)? };
        match found {
            Some(path) => println!("{} => {}", name, path.display().to_string().green()),
            None => {
                missing += 1;
                println!("{}: {}", name, "not found".red());
            }
        }
    }

    if missing > 0 {
        bail!("{} of {} name(s) could not be resolved", missing, args.names.len());
    }
    Ok(())
}
