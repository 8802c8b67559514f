use crate::cache::CacheError;
use crate::resolver::{Resolution, Resolved, Resolver};
use dns_wire::RData;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "Enter a domain name or .exit > ";

/// Runs the interactive lookup loop until `.exit` or end of input.
pub fn run(mut resolver: Resolver) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // End of input is as final as .exit.
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('.') {
            if !run_command(&mut resolver, line) {
                return Ok(());
            }
            continue;
        }

        let resolution = resolver.resolve(line);
        print_summary(line, &resolution);
    }
}

/// Handles one dot-command; returns false when the loop should end.
/// Bad input is reported and never fatal.
fn run_command(resolver: &mut Resolver, line: &str) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        Some(".exit") => return false,
        Some(".list") => {
            for (index, name, entry) in resolver.cache().entries() {
                println!("{}: {} --> {}", index, name, entry.summary());
            }
        }
        Some(".clear") => resolver.cache_mut().clear(),
        Some(".remove") => match words.next().and_then(|word| word.parse::<usize>().ok()) {
            Some(index) => {
                if let Err(CacheError::InvalidIndex(_)) = resolver.cache_mut().remove(index) {
                    println!("Unable to read remove value");
                }
            }
            None => println!("Unable to read remove value"),
        },
        _ => println!("Unable to read command"),
    }
    true
}

fn print_summary(domain: &str, resolution: &Resolution) {
    println!();
    println!("Full Path for {}:", domain);
    for step in &resolution.path {
        println!("{}", step);
    }

    println!();
    println!("{} IPv4(s):", domain);
    match &resolution.outcome {
        Resolved::Addresses(records) => {
            if let Some(alias) = &resolution.alias {
                println!("cname: {}", alias);
            }
            for record in records {
                if let RData::A(addr) = &record.data {
                    println!("{}: {}", record.name, addr);
                }
            }
        }
        Resolved::NonExistent => println!("Domain does not exist"),
        Resolved::Incomplete => println!("No response"),
    }
    println!();
}
