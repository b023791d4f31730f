use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdgen::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let generated = cmdgen::run(&args)?;

    if args.output.is_none() {
        print!("{}", generated.python);
    }
    eprint!("{}", generated.rejections);

    let rejected = generated.rejected();
    if args.strict && rejected > 0 {
        bail!("{rejected} exported symbol(s) rejected");
    }
    Ok(())
}
