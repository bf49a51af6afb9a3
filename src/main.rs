use std::{
    fs,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use hodl_vault::{
    AccountId, Amount, FundingRail, Notifier, RailError, SystemClock, Vault, VaultEvent,
};

#[derive(Parser)]
#[command(
    name = "hodl-vault",
    version,
    about = "Custodial two-year time-lock vault"
)]
struct Cli {
    /// Vault state file (JSON); created on first deposit.
    #[arg(long, default_value = "vault.json")]
    state: PathBuf,

    /// Append-only journal of transfers and events (JSON lines).
    #[arg(long, default_value = "vault-journal.jsonl")]
    journal: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Credit an amount to an account and re-arm its two-year lock.
    Deposit {
        #[arg(long)]
        account: String,
        #[arg(long)]
        amount: Amount,
    },
    /// Release an account's full balance once its lock has matured.
    Withdraw {
        #[arg(long)]
        account: String,
    },
    /// Print an account's current balance.
    Balance {
        #[arg(long)]
        account: String,
    },
    /// Print an account's maturity timestamp (zero when no active deposit).
    Maturity {
        #[arg(long)]
        account: String,
    },
    /// Print the full account table with its content digest.
    Snapshot,
}

/// One line in the journal file.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JournalLine<'a> {
    Collect { account: &'a str, amount: Amount },
    Release { account: &'a str, amount: Amount },
    Event { event: &'a VaultEvent },
}

fn append_journal_line(path: &Path, line: &JournalLine<'_>) -> Result<(), std::io::Error> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let encoded = serde_json::to_string(line)?;
    writeln!(file, "{encoded}")
}

/// Rail that records each transfer in the journal. The actual movement of
/// value happens on whatever payment system consumes the journal; from the
/// vault's point of view a recorded transfer is a completed one.
struct JournalRail {
    path: PathBuf,
}

impl FundingRail for JournalRail {
    fn collect(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError> {
        let line = JournalLine::Collect {
            account: account.as_str(),
            amount,
        };
        append_journal_line(&self.path, &line)
            .map_err(|err| RailError::Unavailable(err.to_string()))
    }

    fn release(&mut self, account: &AccountId, amount: Amount) -> Result<(), RailError> {
        let line = JournalLine::Release {
            account: account.as_str(),
            amount,
        };
        append_journal_line(&self.path, &line)
            .map_err(|err| RailError::Unavailable(err.to_string()))
    }
}

/// Notifier that appends each event to the journal. Delivery is
/// fire-and-forget, so failures are logged and swallowed.
struct JournalNotifier {
    path: PathBuf,
}

impl Notifier for JournalNotifier {
    fn notify(&mut self, event: &VaultEvent) {
        if let Err(err) = append_journal_line(&self.path, &JournalLine::Event { event }) {
            tracing::warn!(%err, "failed to journal event");
        }
    }
}

fn load_vault(path: &Path) -> Result<Vault, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(Vault::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn save_vault(path: &Path, vault: &Vault) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(vault)?)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut vault = load_vault(&cli.state)?;
    let clock = SystemClock;
    let mut rail = JournalRail {
        path: cli.journal.clone(),
    };
    let mut notifier = JournalNotifier {
        path: cli.journal.clone(),
    };

    match cli.command {
        Command::Deposit { account, amount } => {
            let maturity = vault.deposit(&account, amount, &clock, &mut rail, &mut notifier)?;
            save_vault(&cli.state, &vault)?;
            println!(
                "deposited {amount} for {account}; balance {}, locked until {maturity}",
                vault.balance_of(&account)
            );
        }
        Command::Withdraw { account } => {
            let released = vault.withdraw(&account, &clock, &mut rail, &mut notifier)?;
            save_vault(&cli.state, &vault)?;
            println!("released {released} to {account}");
        }
        Command::Balance { account } => {
            println!("{}", vault.balance_of(&account));
        }
        Command::Maturity { account } => {
            println!("{}", vault.maturity_of(&account));
        }
        Command::Snapshot => {
            let snapshot = vault.snapshot();
            for (account, record) in &snapshot.accounts {
                println!(
                    "{account}: balance {} maturity {}",
                    record.balance, record.maturity
                );
            }
            println!("digest {}", hex::encode(snapshot.digest));
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
