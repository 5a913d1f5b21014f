//! # polyflag zoo demo
//!
//! A sample CLI that resolves a polymorphic configuration tree from its
//! command line. It exists to demonstrate and manually verify polyflag's
//! features.
//!
//! ## Running
//!
//! Configuration flags follow `--`, so clap hands them over untouched:
//!
//! ```sh
//! cargo run --example zoo
//! cargo run --example zoo -- --show-config -- --zoo.star Penguin
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                      |
//! |--------------------------|-------------------------------------------------------------------------|
//! | Defaults only            | `cargo run --example zoo`                                               |
//! | Select a subtype         | `cargo run --example zoo -- -- --zoo.star Penguin --zoo.star.colony 40` |
//! | Alternate type name      | `cargo run --example zoo -- -- --zoo.star Pingu`                        |
//! | Sub-flag before selector | `cargo run --example zoo -- -- --zoo.star.colony 3 --zoo.star Penguin`  |
//! | List of records          | `cargo run --example zoo -- -- --zoo.residents Lion Penguin --zoo.residents.0.name Kim` |
//! | Dict of values           | `cargo run --example zoo -- -- --zoo.budgets fish=12.5 meat=40`         |
//! | Hidden path              | `cargo run --example zoo -- -- --zoo.residents.1.name Kim` fails    |
//! | Short path (ssnake)      | `cargo run --example zoo -- -- --keeper.shift night`                    |
//! | Show resolved config     | `cargo run --example zoo -- --show-config -- --zoo.star Penguin`        |
//! | Suggestions              | `cargo run --example zoo -- -- --zoo.titel Safari`                      |
//! | Parse logging            | `cargo run --example zoo -- --verbose`                                  |

mod schema;

use clap::Parser;

use polyflag::{Polyflag, ResolveArgs, RootSpec};

use schema::Zoo;

/// polyflag demo: resolve a zoo from the command line.
#[derive(Parser, Debug)]
#[command(name = "zoo")]
struct Cli {
    /// Log every parse pass to stderr.
    #[arg(long)]
    verbose: bool,

    #[command(flatten)]
    resolve: ResolveArgs,
}

fn print_zoo(zoo: &Zoo) {
    println!("{}", zoo.title);
    println!("  keeper: {} ({} shift)", zoo.keeper.name, zoo.keeper.shift);
    println!("  star:   {}", zoo.star.describe());
    for (i, animal) in zoo.residents.iter().enumerate() {
        println!("  #{i}:     {}", animal.describe());
    }
    for (item, amount) in &zoo.budgets {
        println!("  budget {item}: {amount:.2}");
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let registry = schema::registry().unwrap_or_else(|e| {
        eprintln!("Invalid schema:\n{e}");
        std::process::exit(2);
    });
    let parser = Polyflag::builder(registry)
        .add_root(RootSpec::new("zoo", "Zoo").ignore(["zoo.residents.1"]))
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Invalid parser:\n{e}");
            std::process::exit(2);
        });

    let action = cli.resolve.into_action();
    let resolved = parser.handle_and_print(&action).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    if let Some(ns) = resolved {
        match ns.get::<Zoo>("zoo") {
            Ok(zoo) => print_zoo(&zoo),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}
