//! `rosapi run` — log in, run one command, print the reply.
//!
//! Usage: `rosapi run [OPTIONS] HOST COMMAND [name=value ...] [where name[=value] ...]`

use anyhow::{Context, Result};

use crate::{ConnectArgs, OutputFormat, line, render};

/// Arguments for `rosapi run`.
#[derive(clap::Args)]
#[command(trailing_var_arg = true)]
pub struct RunArgs {
    /// Device address.
    host: String,

    /// API user name.
    #[arg(short, long, default_value = "admin")]
    user: String,

    /// Password. Prompted for when neither this nor the variable is set.
    #[arg(long, env = "ROSAPI_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(flatten)]
    conn: ConnectArgs,

    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Command path followed by attributes and `where` queries.
    #[arg(required = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let req = line::parse_command(&self.command)?;
        let password = self.password()?;

        let mut session = self.conn.connect(&self.host)?;
        session
            .login(&self.user, &password)
            .with_context(|| format!("logging in to {} as {}", self.host, self.user))?;

        let reply = session.run_request(&req);
        session.disconnect();
        let rows = reply.with_context(|| format!("running {}", req.command()))?;
        render::print_reply(&rows, self.format)
    }

    /// `--password` or `ROSAPI_PASSWORD`, else a prompt without echo.
    fn password(&self) -> Result<String> {
        match &self.password {
            Some(p) => Ok(p.clone()),
            None => crate::prompt_password("Password: "),
        }
    }
}
