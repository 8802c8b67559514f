mod cache;
mod resolver;
mod shell;
#[cfg(test)]
mod testutil;
mod transport;

use clap::Parser;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Iterative DNS resolver: walks the delegation hierarchy down from a
/// root server instead of handing the work to a recursive resolver.
#[derive(Debug, Parser)]
#[command(name = "dnswalk", version, about)]
struct Args {
    /// Root server every resolution starts from - one of the 13
    /// published at https://www.iana.org/domains/root/servers
    #[arg(long, default_value = "199.7.83.42")]
    root_server: Ipv4Addr,

    /// Seconds to wait on each server before trying the next one.
    #[arg(long, default_value_t = 2)]
    timeout: u64,

    /// Destination port for queries. Anything but 53 only makes sense
    /// against a local zone server.
    #[arg(long, default_value_t = 53)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let transport =
        transport::QueryTransport::new(Duration::from_secs(args.timeout), args.port)?;
    let resolver = resolver::Resolver::new(transport, args.root_server);

    shell::run(resolver)?;
    Ok(())
}
