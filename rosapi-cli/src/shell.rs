//! Interactive shell.
//!
//! Holds at most one session. Lines starting with `/` are run directly
//! once logged in.

use anyhow::{Result, bail};
use rosapi::{Session, State};

use crate::{ConnectArgs, OutputFormat, line, render};

const HELP: &str = "\
commands:
  login ADDRESS [USER] [PASSWORD]   connect and log in
  run COMMAND [name=value ...] [where name[=value] ...]
  /COMMAND ...                      same as run, once logged in
  logout                            close the session
  greet | help | exit";

/// Shell state: the active session, if any.
struct Shell {
    conn: ConnectArgs,
    session: Option<Session>,
}

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Runs the shell until `exit` or end of input.
pub fn run(conn: ConnectArgs) -> Result<()> {
    let mut shell = Shell {
        conn,
        session: None,
    };
    while let Some(line) = crate::prompt(&shell.prompt())? {
        match shell.handle(&line) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("{e:#}"),
        }
    }
    println!();
    shell.logout();
    Ok(())
}

impl Shell {
    fn prompt(&self) -> String {
        match &self.session {
            Some(s) => format!("{}> ", s.address()),
            None => "> ".to_owned(),
        }
    }

    fn handle(&mut self, line: &str) -> Result<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        if verb.starts_with('/') && self.session.is_some() {
            return self.run(&tokens).map(|()| Flow::Continue);
        }
        match verb {
            "greet" => println!("Welcome to the RouterOS API command line"),
            "help" | "?" => println!("{HELP}"),
            "login" => self.login(args)?,
            "run" => self.run(args)?,
            "logout" => self.logout(),
            "exit" | "quit" => return Ok(Flow::Exit),
            other => bail!("unknown command {other:?}; try help"),
        }
        Ok(Flow::Continue)
    }

    fn login(&mut self, args: &[&str]) -> Result<()> {
        let Some((&address, rest)) = args.split_first() else {
            bail!("usage: login ADDRESS [USER] [PASSWORD]");
        };
        let user = match rest.first() {
            Some(u) => (*u).to_owned(),
            None => crate::prompt("Username: ")?.unwrap_or_default(),
        };
        let password = match rest.get(1) {
            Some(p) => (*p).to_owned(),
            None => crate::prompt_password("Password: ")?,
        };

        self.logout();
        let mut session = self.conn.connect(address)?;
        session.login(&user, &password)?;
        self.session = Some(session);
        Ok(())
    }

    fn run(&mut self, args: &[&str]) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            bail!("login first");
        };
        if args.is_empty() {
            bail!("usage: run COMMAND [name=value ...] [where ...]");
        }
        let req = line::parse_command(args)?;
        match session.run_request(&req) {
            Ok(rows) => render::print_reply(&rows, OutputFormat::Table)?,
            Err(e) => {
                render::print_error(&e);
                if session.state() == State::Closed {
                    self.session = None;
                    eprintln!("connection closed; login again");
                }
            }
        }
        Ok(())
    }

    fn logout(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect();
        }
    }
}
