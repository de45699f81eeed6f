use std::{
    io::{BufRead, Write, stdin, stdout},
    path::PathBuf,
};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use primdb::{
    Database, DatabaseConfig,
    shell::{Flow, HELP, Shell},
};

/// A small record database driven by one-line commands.
#[derive(Parser, Debug)]
#[command(name = "primdb", version, about)]
struct Args {
    /// Directory holding the catalog and table files
    #[arg(short = 'd', long, value_name = "DIR", env = "PRIMDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", env = "PRIMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single command and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Do not memoize SELECT results
    #[arg(long)]
    no_cache: bool,

    /// Only accept true/false, 1/0, yes/no and y/n as booleans
    #[arg(long)]
    strict_booleans: bool,

    /// Run drop_table and delete without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Do not report how long commands take
    #[arg(long)]
    no_timing: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(false)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let db = Database::open(&config)?;
    let mut shell = Shell::new(db, &config).with_confirmation(ask);

    if let Some(command) = &args.command {
        if let Flow::Continue(output) = shell.handle_line(command)
            && !output.is_empty()
        {
            println!("{output}");
        }
        return Ok(());
    }

    println!("*** primdb ***");
    println!("{HELP}\n");

    let mut buf = String::new();
    loop {
        print!(">>> ");
        stdout().flush().into_diagnostic()?;

        buf.clear();
        if stdin().lock().read_line(&mut buf).into_diagnostic()? == 0 {
            break;
        }

        match shell.handle_line(&buf) {
            Flow::Continue(output) if output.is_empty() => {}
            Flow::Continue(output) => println!("{output}"),
            Flow::Exit => break,
        }
    }

    let stats = shell.database().cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        invalidations = stats.invalidations,
        hit_rate = stats.hit_rate(),
        "result cache summary"
    );

    println!("Bye.");
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("primdb=debug")
    } else {
        EnvFilter::try_from_env("PRIMDB_LOG").unwrap_or_else(|_| EnvFilter::new("primdb=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// File settings first, then command-line overrides.
fn load_config(args: &Args) -> Result<DatabaseConfig> {
    let mut config = DatabaseConfig::load_or_default(args.config.as_deref())?;

    if let Some(data_dir) = &args.data_dir {
        config = config.with_data_dir(data_dir.clone());
    }
    if args.no_cache {
        config.cache_enabled = false;
    }
    if args.strict_booleans {
        config.strict_booleans = true;
    }
    if args.yes {
        config.confirm_destructive = false;
    }
    if args.no_timing {
        config.timing = false;
    }

    Ok(config)
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} ");
    if stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
