//! RAX FTP Client - Entry Point
//!
//! `rax-ftp-client [-v] <URL> <COMMAND>`; the URL path is the remote target.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{LevelFilter, info};

use rax_ftp_client::{ClientConfig, ConnectionDescriptor, FtpClient};

const ARG_URL: &str = "url";
const ARG_VERBOSE: &str = "verbose";
const ARG_LOCAL: &str = "local";

fn build_cli_args() -> Command {
    Command::new("rax-ftp-client")
        .about("Passive-mode FTP client")
        .arg(
            Arg::new(ARG_URL)
                .help("ftp://[user[:password]@]host[:port]/path")
                .num_args(1)
                .value_name("URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_VERBOSE)
                .help("show protocol traffic")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(Command::new("ls").about("List the remote directory"))
        .subcommand(
            Command::new("get")
                .about("Download the remote file")
                .arg(Arg::new(ARG_LOCAL).help("local file, stdout if omitted").num_args(1)),
        )
        .subcommand(
            Command::new("put")
                .about("Upload a local file to the remote path")
                .arg(Arg::new(ARG_LOCAL).num_args(1).required(true)),
        )
        .subcommand(Command::new("rm").about("Delete the remote file"))
        .subcommand(Command::new("mkdir").about("Create the remote directory"))
        .subcommand(Command::new("rmdir").about("Remove the remote directory"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    let level = match args.get_count(ARG_VERBOSE) {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG still overrides the -v level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let url = args
        .get_one::<String>(ARG_URL)
        .ok_or_else(|| anyhow!("no url given"))?;
    let descriptor = ConnectionDescriptor::from_url(url)?;
    let config = ClientConfig::load().context("failed to load client configuration")?;

    let Some((subcommand, sub_args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    info!("Connecting to {}:{}", descriptor.host(), descriptor.port());
    let mut client = FtpClient::open(descriptor, config).await?;
    let ret = run(&mut client, subcommand, sub_args).await;
    let quit = client.quit().await;

    ret?;
    quit?;
    Ok(())
}

async fn run(client: &mut FtpClient, subcommand: &str, args: &ArgMatches) -> anyhow::Result<()> {
    match subcommand {
        "ls" => {
            let listing = client.list(None).await?;
            print!("{listing}");
        }
        "get" => {
            let data = client.retrieve(None).await?;
            match args.get_one::<String>(ARG_LOCAL) {
                Some(local) => fs::write(local, &data)
                    .with_context(|| format!("failed to write {local}"))?,
                None => io::stdout().write_all(&data)?,
            }
        }
        "put" => {
            let local = args
                .get_one::<String>(ARG_LOCAL)
                .ok_or_else(|| anyhow!("no local file given"))?;
            let data = fs::read(Path::new(local)).with_context(|| format!("failed to read {local}"))?;
            client.store(None, &data).await?;
        }
        "rm" => {
            client.delete(None).await?;
        }
        "mkdir" => {
            client.make_directory(None).await?;
        }
        "rmdir" => {
            client.remove_directory(None).await?;
        }
        cmd => return Err(anyhow!("invalid subcommand {cmd}")),
    }
    Ok(())
}
