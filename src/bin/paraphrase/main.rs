use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod add;
mod cat;
mod changelog;
mod common;
mod compact;
mod dump;
mod export;
mod feedback;
mod find;
mod git;
mod import;
mod info;
mod init;
mod search;

#[derive(Parser)]
#[clap(name = "Paraphrase")]
#[clap(bin_name = "paraphrase")]
#[clap(author, version, about = "Index text and look for duplicated content", long_about = None)]
struct Cli {
    /// path to the database file, or a directory containing one
    #[arg(long, global = true, default_value = ".")]
    db: PathBuf,

    /// increase log detail (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// creates a new database
    Init(init::Args),
    /// adds documents from directories or a stdin file list
    Add(add::Args),
    /// clones a git repository and adds its files
    Git(git::Args),
    /// finds documents by id, sha1 prefix, path glob or namespace glob
    #[command(alias = "ls")]
    Find(find::Args),
    /// prints the bodies of matching documents
    Cat(cat::Args),
    /// writes the bodies of matching documents into a directory tree
    Dump(dump::Args),
    /// finds documents similar to a text, file or stored document
    Search(search::Args),
    /// copies a subset of this database into a new one
    Export(export::Args),
    /// copies a subset of another database into this one
    Import(import::Args),
    /// shows settings and corpus statistics
    Info(info::Args),
    /// shows the audit log of database modifications
    Changelog(changelog::Args),
    /// compacts the database, keeping the original as a backup
    Compact(compact::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    common::setup_tracing(cli.verbose)?;

    let feedback = feedback::Feedback::default();

    match &cli.command {
        Command::Init(x) => init::run(&cli.db, x),
        Command::Add(x) => add::run(&cli.db, x),
        Command::Git(x) => git::run(&cli.db, x),
        Command::Find(x) => find::run(&cli.db, x),
        Command::Cat(x) => cat::run(&cli.db, x),
        Command::Dump(x) => dump::run(&cli.db, x),
        Command::Search(x) => search::run(&cli.db, x),
        Command::Export(x) => export::run(&cli.db, x, &feedback),
        Command::Import(x) => import::run(&cli.db, x, &feedback),
        Command::Info(x) => info::run(&cli.db, x),
        Command::Changelog(x) => changelog::run(&cli.db, x),
        Command::Compact(x) => compact::run(&cli.db, x, &feedback),
    }
}
