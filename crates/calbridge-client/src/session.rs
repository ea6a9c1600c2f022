//! Interactive dashboard session.
//!
//! Reads one command per line, drives login, callback, range selection and
//! event fetches, and prints rendered views. Fetches run on background tasks;
//! their results are printed when they land, and only the latest one counts.

use std::io::Write;

use calbridge_core::{
    CalendarStore, DateRange, DisplayZone, OutputFormat, RangePreset, RenderOptions, parse_date,
    render,
};
use calbridge_protocol::{HealthStatus, UserInfo};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::actions;
use crate::api::BackendClient;
use crate::callback::{CallbackHandler, CallbackParams, CallbackState, ExchangedCodes};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::fetcher::{EventFetcher, SharedStore, shared};
use crate::login::{LoginInitiator, LoginOutcome};

const HELP: &str = "\
Commands:
  login                 open the Google sign-in page
  callback <url>        finish sign-in with the URL the browser landed on
  this-week             select the current week
  next-week             select next week
  this-month            select the current month
  range <from> <to>     select whole days, dates as YYYY-MM-DD
  fetch                 fetch events for the selected range
  show                  show the selected range and events
  me                    show the signed-in user
  logout                end the session
  health                check the backend
  quit                  leave";

const LOGOUT_FAILED_MESSAGE: &str = "Failed to logout. Please try again.";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Login,
    Callback(String),
    Select(RangePreset),
    Range { from: NaiveDate, to: NaiveDate },
    Fetch,
    Show,
    Me,
    Logout,
    Health,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parses a line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();
        let name = first.to_ascii_lowercase();

        let command = match name.as_str() {
            "login" => Self::Login,
            "callback" => match args.as_slice() {
                [url] => Self::Callback((*url).to_string()),
                _ => return Err("usage: callback <url>".to_string()),
            },
            "range" => match args.as_slice() {
                [preset] => Self::Select(preset.parse::<RangePreset>().map_err(|e| e.to_string())?),
                [from, to] => Self::Range {
                    from: parse_date(from).map_err(|e| e.to_string())?,
                    to: parse_date(to).map_err(|e| e.to_string())?,
                },
                _ => return Err("usage: range <from> <to>".to_string()),
            },
            "fetch" | "refresh" => Self::Fetch,
            "show" | "events" => Self::Show,
            "me" | "whoami" => Self::Me,
            "logout" => Self::Logout,
            "health" => Self::Health,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => match other.parse::<RangePreset>() {
                Ok(preset) => Self::Select(preset),
                Err(_) => {
                    return Err(format!(
                        "unknown command '{}', type 'help' for a list",
                        first
                    ));
                }
            },
        };

        Ok(Some(command))
    }
}

/// Whether the session keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Session presentation settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub format: OutputFormat,
    /// Open the consent page in the browser on `login`.
    pub open_browser: bool,
    /// Print a prompt before each command.
    pub prompt: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Tty,
            open_browser: true,
            prompt: false,
        }
    }
}

/// How a fetch task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOutcome {
    /// Its result is now on screen.
    Applied,
    /// A newer fetch had begun.
    Stale,
    /// Aborted by `logout` or `quit`.
    Cancelled,
    Failed,
}

impl FetchOutcome {
    fn of(joined: &Result<bool, JoinError>) -> Self {
        match joined {
            Ok(true) => Self::Applied,
            Ok(false) => Self::Stale,
            Err(e) if e.is_cancelled() => Self::Cancelled,
            Err(_) => Self::Failed,
        }
    }
}

/// A status line printed between views.
///
/// In JSON mode each notice is one object tagged by `notice`, so every line
/// of session output parses on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice<'a> {
    /// A new range was selected.
    Range { range: DateRange, label: String },
    /// A fetch was started.
    Fetching { range: DateRange, label: String },
    /// The consent page to open.
    LoginUrl { auth_url: &'a str },
    /// The callback was accepted.
    SignedIn { user: Option<&'a UserInfo> },
    /// The callback did not authenticate.
    CallbackFailed { reason: &'static str, message: String },
    /// Result of `me`.
    User { user: &'a UserInfo },
    NotSignedIn,
    SignedOut,
    Health { health: &'a HealthStatus },
    Help { text: &'static str },
    /// Any failure reported to the user.
    Error { message: String },
}

impl Notice<'_> {
    fn range(range: DateRange) -> Self {
        Notice::Range {
            range,
            label: range.label(),
        }
    }

    fn fetching(range: DateRange) -> Self {
        Notice::Fetching {
            range,
            label: range.label(),
        }
    }

    fn error(message: impl ToString) -> Self {
        Notice::Error {
            message: message.to_string(),
        }
    }

    /// Terminal rendering.
    pub fn to_tty(&self) -> String {
        match self {
            Notice::Range { label, .. } => format!("Range: {}", label),
            Notice::Fetching { label, .. } => format!("Fetching events for {}", label),
            Notice::LoginUrl { auth_url } => format!(
                "Sign in with Google:\n{}\nAfter consenting, paste the address you land on: callback <url>",
                auth_url
            ),
            Notice::SignedIn { user: Some(user) } => format!("Signed in as {}", user.email),
            Notice::SignedIn { user: None } => "Signed in".to_string(),
            Notice::CallbackFailed { message, .. } => {
                format!("{}\nRun 'login' to try again.", message)
            }
            Notice::User { user } => format!("Signed in as {} (id {})", user.email, user.id),
            Notice::NotSignedIn => "Not signed in. Run 'login' to sign in.".to_string(),
            Notice::SignedOut => "Signed out".to_string(),
            Notice::Health { health } => {
                let service = health.service.as_deref().unwrap_or("backend");
                let status = if health.ok { "ok" } else { "not ok" };
                match health.timestamp {
                    Some(ts) => format!("{}: {} at {}", service, status, ts.to_rfc3339()),
                    None => format!("{}: {}", service, status),
                }
            }
            Notice::Help { text } => (*text).to_string(),
            Notice::Error { message } => message.clone(),
        }
    }
}

/// An interactive session writing to `W`.
pub struct Session<W> {
    client: BackendClient,
    fetcher: EventFetcher,
    zone: DisplayZone,
    render_options: RenderOptions,
    options: SessionOptions,
    exchanged: ExchangedCodes,
    user: Option<UserInfo>,
    in_flight: JoinSet<bool>,
    out: W,
}

impl<W: Write> Session<W> {
    /// Creates a session on the current week.
    pub fn new(
        client: BackendClient,
        timezone: impl Into<String>,
        render_options: RenderOptions,
        options: SessionOptions,
        out: W,
    ) -> Self {
        let zone = render_options.zone;
        let store = shared(CalendarStore::new(
            zone.resolve(RangePreset::ThisWeek, Utc::now()),
        ));
        let fetcher = EventFetcher::new(client.clone(), store, timezone);

        Self {
            client,
            fetcher,
            zone,
            render_options,
            options,
            exchanged: ExchangedCodes::new(),
            user: None,
            in_flight: JoinSet::new(),
            out,
        }
    }

    /// Creates a session from configuration.
    pub fn from_config(config: &ClientConfig, options: SessionOptions, out: W) -> ClientResult<Self> {
        let client = BackendClient::from_config(config)?;
        let session = Self::new(
            client,
            config.event_timezone()?,
            config.render_options()?,
            options,
            out,
        )
        .with_max_pages(config.max_pages());
        Ok(session)
    }

    /// Follows up to `max_pages` event pages per fetch.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.fetcher = self.fetcher.with_max_pages(max_pages);
        self
    }

    pub fn store(&self) -> &SharedStore {
        self.fetcher.store()
    }

    /// The signed-in user, once known.
    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// Consumes the session and returns its output.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads commands until `quit` or end of input.
    ///
    /// At end of input, fetches still in flight are awaited and printed.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> ClientResult<()> {
        let mut lines = input.lines();
        self.print_prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        self.wait_for_fetches().await?;
                        return Ok(());
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        return Ok(());
                    }
                    self.print_prompt()?;
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_fetch_done(joined).await?;
                    self.print_prompt()?;
                }
            }
        }
    }

    /// Parses and runs one line; parse errors are printed, not returned.
    pub async fn handle_line(&mut self, line: &str) -> ClientResult<Flow> {
        match SessionCommand::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Ok(Flow::Continue),
            Err(message) => {
                self.notify(&Notice::error(message))?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Runs one command.
    ///
    /// Only output errors are returned; every other failure is printed and
    /// the session carries on.
    pub async fn execute(&mut self, command: SessionCommand) -> ClientResult<Flow> {
        debug!(?command, "session command");
        match command {
            SessionCommand::Login => self.login().await?,
            SessionCommand::Callback(url) => self.callback(&url).await?,
            SessionCommand::Select(preset) => {
                let range = self.zone.resolve(preset, Utc::now());
                self.store().write().await.set_date_range(range);
                self.notify(&Notice::range(range))?;
            }
            SessionCommand::Range { from, to } => match self.zone.whole_days(from, to) {
                Ok(range) => {
                    self.store().write().await.set_date_range(range);
                    self.notify(&Notice::range(range))?;
                }
                Err(e) => self.notify(&Notice::error(e))?,
            },
            SessionCommand::Fetch => {
                let range = self.fetcher.spawn(&mut self.in_flight).await;
                self.notify(&Notice::fetching(range))?;
                self.print_events().await?;
            }
            SessionCommand::Show => self.show().await?,
            SessionCommand::Me => self.me().await?,
            SessionCommand::Logout => self.logout().await?,
            SessionCommand::Health => self.health().await?,
            SessionCommand::Help => self.notify(&Notice::Help { text: HELP })?,
            SessionCommand::Quit => {
                self.in_flight.abort_all();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Awaits every fetch in flight, printing the one that lands last.
    pub async fn wait_for_fetches(&mut self) -> ClientResult<()> {
        while let Some(joined) = self.in_flight.join_next().await {
            self.on_fetch_done(joined).await?;
        }
        Ok(())
    }

    async fn on_fetch_done(&mut self, joined: Result<bool, JoinError>) -> ClientResult<()> {
        match FetchOutcome::of(&joined) {
            FetchOutcome::Applied => return self.print_events().await,
            FetchOutcome::Stale => debug!("stale fetch finished"),
            FetchOutcome::Cancelled => debug!("fetch cancelled"),
            FetchOutcome::Failed => {
                if let Err(e) = joined {
                    warn!(error = %e, "fetch task failed");
                }
            }
        }
        Ok(())
    }

    async fn login(&mut self) -> ClientResult<()> {
        let initiator = LoginInitiator::new(self.client.clone());
        match initiator.initiate().await {
            LoginOutcome::Redirect { auth_url } => {
                self.notify(&Notice::LoginUrl {
                    auth_url: &auth_url,
                })?;
                if self.options.open_browser {
                    if let Err(e) = actions::open_url(&auth_url) {
                        warn!(error = %e, "could not open browser");
                    }
                }
            }
            LoginOutcome::Failed { message } => self.notify(&Notice::error(message))?,
        }
        Ok(())
    }

    async fn callback(&mut self, url: &str) -> ClientResult<()> {
        let params = CallbackParams::parse(url);
        let mut handler = CallbackHandler::new(self.client.clone());

        match handler.handle(&params, &mut self.exchanged).await {
            CallbackState::Authenticated => {
                let user = match self.client.me().await {
                    Ok(user) => Some(user),
                    Err(e) => {
                        warn!(error = %e, "signed in but user lookup failed");
                        None
                    }
                };
                self.notify(&Notice::SignedIn {
                    user: user.as_ref(),
                })?;
                self.user = user;
                self.show().await?;
            }
            CallbackState::Failed(failure) => {
                let notice = Notice::CallbackFailed {
                    reason: failure.as_str(),
                    message: failure.to_string(),
                };
                self.notify(&notice)?;
            }
            CallbackState::Pending => {}
        }
        Ok(())
    }

    async fn me(&mut self) -> ClientResult<()> {
        match self.client.me().await {
            Ok(user) => {
                self.notify(&Notice::User { user: &user })?;
                self.user = Some(user);
            }
            Err(e) if e.is_unauthorized() => {
                self.user = None;
                self.notify(&Notice::NotSignedIn)?;
            }
            Err(e) => self.notify(&Notice::error(e))?,
        }
        Ok(())
    }

    async fn logout(&mut self) -> ClientResult<()> {
        match self.client.logout().await {
            Ok(_) => {
                self.user = None;
                self.in_flight.abort_all();
                self.store().write().await.reset();
                self.notify(&Notice::SignedOut)?;
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                self.notify(&Notice::error(LOGOUT_FAILED_MESSAGE))?;
            }
        }
        Ok(())
    }

    async fn health(&mut self) -> ClientResult<()> {
        match self.client.health().await {
            Ok(health) => self.notify(&Notice::Health { health: &health })?,
            Err(e) => self.notify(&Notice::error(format!("Health check failed: {}", e)))?,
        }
        Ok(())
    }

    async fn show(&mut self) -> ClientResult<()> {
        let range = *self.store().read().await.date_range();
        if self.options.format == OutputFormat::Tty {
            let who = self
                .user
                .as_ref()
                .map_or("not signed in", |u| u.email.as_str());
            writeln!(self.out, "[{}] {}", who, range)?;
        }
        self.print_events().await
    }

    async fn print_events(&mut self) -> ClientResult<()> {
        let view = {
            let store = self.store().read().await;
            render(store.state(), &self.render_options)
        };
        match self.options.format {
            OutputFormat::Tty => writeln!(self.out, "{}", view.to_tty())?,
            OutputFormat::Json => self.write_json(&view)?,
        }
        Ok(())
    }

    fn notify(&mut self, notice: &Notice<'_>) -> ClientResult<()> {
        match self.options.format {
            OutputFormat::Tty => writeln!(self.out, "{}", notice.to_tty())?,
            OutputFormat::Json => self.write_json(notice)?,
        }
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> ClientResult<()> {
        let json = serde_json::to_string(value).map_err(std::io::Error::from)?;
        writeln!(self.out, "{}", json)?;
        Ok(())
    }

    fn print_prompt(&mut self) -> ClientResult<()> {
        if self.options.prompt {
            write!(self.out, "calbridge> ")?;
            self.out.flush()?;
        }
        Ok(())
    }
}
