//! Administrative console.
//!
//! Executes [`Command`]s against an economy and reports one line of output per
//! command. Also supports an async stream of commands.

use std::io::Write;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

use crate::command::Command;
use crate::context::ContextSet;
use crate::economy::{Economy, EconomyError};
use crate::model::Cause;
use crate::{Amount, amount};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Console {
    economy: Arc<Economy>,
}

/// Public API
impl Console {
    pub fn new(economy: Arc<Economy>) -> Self {
        Self { economy }
    }

    /// Run the console with the given command stream, writing replies to `out`
    pub async fn run(
        &self,
        mut stream: impl Stream<Item = Command> + Unpin,
        mut out: impl Write,
    ) {
        while let Some(command) = stream.next().await {
            // a failing command should not stop the console
            let reply = match self.execute(command) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(?command, "{e}");
                    continue;
                }
            };
            if let Err(e) = writeln!(out, "{reply}") {
                warn!("cannot write reply: {e}");
            }
        }
        if let Err(e) = out.flush() {
            warn!("cannot flush output: {e}");
        }
    }

    /// Execute a single command and return the reply
    pub fn execute(&self, command: Command) -> Result<String, EconomyError> {
        match command {
            Command::Version => Ok(format!("Running {NAME} v{VERSION}")),
            Command::Add(player) => self.adjust(player, Decimal::ONE),
            Command::Sub(player) => self.adjust(player, Decimal::NEGATIVE_ONE),
            Command::Flush => {
                self.economy.flush()?;
                Ok("Flushed all accounts. All data will be loaded from disk.".to_string())
            }
        }
    }
}

/// Private API
impl Console {
    /// Deposit (or withdraw, for a negative `units`) into the player's own
    /// account in the default currency.
    fn adjust(&self, player: Uuid, units: Amount) -> Result<String, EconomyError> {
        let currency = self.economy.default_currency()?;
        let account = self.economy.create_account(player)?;
        let cause = Cause::of(account.display_name()).with(NAME);
        let contexts = ContextSet::empty();

        let result = if units.is_sign_negative() {
            account.withdraw(&currency, -units, &cause, &contexts)
        } else {
            account.deposit(&currency, units, &cause, &contexts)
        };

        let balance = amount::display(account.balance(&currency, &contexts));
        if result.result().is_success() {
            Ok(format!("{} now has {balance}", account.display_name()))
        } else {
            Ok(format!(
                "{} still has {balance} ({})",
                account.display_name(),
                result.result()
            ))
        }
    }
}
