use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "remindbot")]
#[command(author, version, about = "Telegram bot that remembers birthdays and reminders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling) together with the sweep scheduler
    Run,

    /// Run a single sweep now and send whatever is due
    Sweep {
        /// Only print what is due without sending or marking anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print stored entries as JSON
    Export {
        /// Only export entries of this chat (group ids are negative)
        #[arg(long, allow_negative_numbers = true)]
        chat: Option<i64>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
