//! Interactive shell.
//!
//! The shell is the presentation layer of the console: it renders the connect
//! form and the dashboard, turns typed commands into console actions, and
//! performs navigations requested by the console.

use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use jornet_console_core::{
    auth::callback_code, scores::best_score, Console, ConsoleError, ConnectForm, ConnectView,
    Dashboard, DashboardView, Leaderboard, LeaderboardId, Navigation, OAuthOption,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

const HELP: &str = "\
Commands:
  connect [uuid]        Connect with an account UUID (empty creates a new account)
  oauth                 Show the OAuth connect link
  callback <code|url>   Complete an OAuth login
  whoami                Show the signed-in admin
  list                  List leaderboards
  create <name>         Create a leaderboard
  reset <id>            Delete all scores of a leaderboard
  scores <id>           Show the scores of a leaderboard
  refresh               Reload the dashboard
  logout                End the session
  status                Show session status
  help                  Show this help
  quit                  Exit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(String),
    OAuth,
    Callback(String),
    WhoAmI,
    List,
    Create(String),
    Reset(String),
    Scores(String),
    Refresh,
    Logout,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let required = |what: &str| -> Result<String> {
            if rest.is_empty() {
                bail!("usage: {} <{}>", name, what);
            }
            Ok(rest.to_string())
        };

        let command = match name.to_lowercase().as_str() {
            "connect" => Command::Connect(rest.to_string()),
            "oauth" => Command::OAuth,
            "callback" => Command::Callback(required("code|url")?),
            "whoami" => Command::WhoAmI,
            "list" | "ls" => Command::List,
            "create" => Command::Create(required("name")?),
            "reset" => Command::Reset(required("id")?),
            "scores" => Command::Scores(required("id")?),
            "refresh" => Command::Refresh,
            "logout" => Command::Logout,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(anyhow!("unknown command {:?}, try `help`", other)),
        };
        Ok(command)
    }
}

enum Event {
    Line(Option<String>),
    Navigate(Navigation),
}

pub struct Shell {
    console: Console,
    navigations: mpsc::UnboundedReceiver<Navigation>,
    form: ConnectForm,
    dashboard: Option<Dashboard>,
}

impl Shell {
    pub fn new(console: Console, navigations: mpsc::UnboundedReceiver<Navigation>) -> Self {
        Self {
            console,
            navigations,
            form: ConnectForm::mount(None),
            dashboard: None,
        }
    }

    /// Run until stdin closes or `quit`.
    pub async fn run(mut self, location: Option<&Url>) -> Result<()> {
        self.form = self.console.connect_form(location);
        if self.form.is_exchanging() {
            println!("Connecting with GitHub...");
            if let Some(Err(e)) = self.form.complete_oauth_exchange(self.console.auth()).await {
                warn!("OAuth exchange failed: {}", e);
                self.show_connect().await;
            }
        } else {
            self.show_connect().await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            while let Ok(target) = self.navigations.try_recv() {
                self.navigate(target).await;
            }

            let event = tokio::select! {
                line = lines.next_line() => Event::Line(line?),
                Some(target) = self.navigations.recv() => Event::Navigate(target),
            };

            match event {
                Event::Line(None) => break,
                Event::Line(Some(line)) if line.trim().is_empty() => continue,
                Event::Line(Some(line)) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => self.execute(command).await,
                    Err(e) => println!("{}", e),
                },
                Event::Navigate(target) => self.navigate(target).await,
            }
        }

        debug!("Shell exiting");
        Ok(())
    }

    async fn navigate(&mut self, target: Navigation) {
        debug!(path = target.path(), "Navigating");
        println!("-- {} --", target.path());
        // Unmounting the previous dashboard cancels its pending redirects.
        self.dashboard = None;

        match target {
            Navigation::Connect => {
                self.form = ConnectForm::mount(None);
                self.show_connect().await;
            }
            Navigation::Dashboard { new_account } => {
                let dashboard = self.console.mount_dashboard(new_account);
                if self.console.is_authenticated() {
                    println!("Loading...");
                    if let Err(e) = self.console.load_dashboard(&dashboard).await {
                        println!("Could not load the dashboard: {}", e);
                    }
                }
                self.dashboard = Some(dashboard);
                self.render();
            }
        }
    }

    async fn show_connect(&mut self) {
        self.form.load_oauth(self.console.auth()).await;
        match self.form.view() {
            ConnectView::Exchanging => println!("Connecting with GitHub..."),
            ConnectView::Form { oauth, error, .. } => {
                match oauth {
                    OAuthOption::Enabled {
                        provider,
                        authorize_url,
                    } => println!("Connect using {}: {}", provider, authorize_url),
                    OAuthOption::Disabled => println!("Connect using GitHub (disabled)"),
                }
                println!("Connect using UUID: `connect <uuid>`, or `connect` for a new account");
                if let Some(error) = error {
                    println!("{}", error);
                }
            }
        }
    }

    /// Re-evaluate the guard and print the mounted dashboard, if any.
    fn render(&mut self) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return;
        };
        match self.console.render_dashboard(dashboard) {
            DashboardView::Disconnected => {
                println!("You are disconnected, redirecting to login screen");
            }
            DashboardView::Loading => println!("Loading..."),
            DashboardView::Ready {
                identity,
                new_account,
                leaderboards,
                created,
                ..
            } => {
                println!("Signed in as {}", identity.label());
                if let Some(id) = new_account {
                    println!("You'll need to keep your account UUID to reconnect with it: {}", id);
                }
                if let Some(created) = created {
                    print_created(&created.name, created.access_key.as_deref());
                }
                print_leaderboards(&leaderboards);
            }
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Connect(identifier) => {
                self.form.set_identifier(identifier);
                if !self.form.can_submit() {
                    println!("Not a valid UUID, nothing was sent");
                    return;
                }
                if let Err(e) = self.form.submit(self.console.auth()).await {
                    println!("{}", self.form.error().unwrap_or(&e.to_string()));
                }
            }
            Command::OAuth => self.show_connect().await,
            Command::Callback(value) => {
                let result = match Url::parse(&value) {
                    Ok(location) if callback_code(&location).is_some() => {
                        self.form = ConnectForm::mount(Some(&location));
                        println!("Connecting with GitHub...");
                        self.form
                            .complete_oauth_exchange(self.console.auth())
                            .await
                            .unwrap_or(Ok(()))
                            .map_err(ConsoleError::from)
                    }
                    _ => self.console.acquire_by_oauth_code(&value).await,
                };
                if let Err(e) = result {
                    println!("{}", e);
                }
            }
            Command::WhoAmI => match self.console.sync().load_identity().await {
                Ok(identity) => println!("{} ({})", identity.label(), identity.id),
                Err(e) => println!("{}", e),
            },
            Command::List => match self.console.sync().load_leaderboards().await {
                Ok(leaderboards) => print_leaderboards(&leaderboards),
                Err(e) => println!("{}", e),
            },
            Command::Create(name) => {
                let sync = self.console.sync();
                sync.set_new_leaderboard_name(name);
                match sync.submit_new_leaderboard().await {
                    Ok(_) => {
                        if let Some(created) = sync.take_created_notice() {
                            print_created(&created.name, created.access_key.as_deref());
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Command::Reset(id) => {
                match self.console.reset_leaderboard(&LeaderboardId::new(id)).await {
                    Ok(()) => println!("Scores deleted, `refresh` to see updated counts"),
                    Err(e) => println!("{}", e),
                }
            }
            Command::Scores(id) => {
                match self.console.leaderboard_scores(&LeaderboardId::new(id)).await {
                    Ok(scores) => {
                        println!("{:>10}  {:<20}  {:<25}  Meta", "Score", "Player", "Timestamp");
                        for score in &scores {
                            println!(
                                "{:>10}  {:<20}  {:<25}  {}",
                                score.score,
                                score.player,
                                score.timestamp.to_rfc3339(),
                                score.meta.as_deref().unwrap_or("")
                            );
                        }
                        if let Some(best) = best_score(&scores) {
                            println!("Best: {} by {}", best.score, best.player);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Command::Refresh => match &self.dashboard {
                Some(dashboard) => {
                    if let Err(e) = self.console.load_dashboard(dashboard).await {
                        println!("{}", e);
                    }
                }
                None => {
                    if let Err(e) = self.console.sync().refresh().await {
                        println!("{}", e);
                    }
                }
            },
            Command::Logout => {
                self.console.logout();
                println!("Logged out");
            }
            Command::Status => {
                let state = self.console.session().snapshot();
                println!(
                    "authenticated: {}, identity: {}, leaderboards: {}",
                    state.is_authenticated(),
                    state.identity_label.as_deref().unwrap_or("-"),
                    self.console.leaderboards().len()
                );
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }

        // Any failure above may have ended the session.
        self.render();
    }
}

fn print_created(name: &str, access_key: Option<&str>) {
    match access_key {
        Some(key) => println!(
            "Created {:?}. Record its key now, it will not be shown again: {}",
            name, key
        ),
        None => println!("Created {:?}", name),
    }
}

fn print_leaderboards(leaderboards: &[Leaderboard]) {
    if leaderboards.is_empty() {
        println!("No leaderboards yet, `create <name>` to add one");
        return;
    }
    println!("{:<24}  {:>8}  ID", "Leaderboard", "Scores");
    for leaderboard in leaderboards {
        println!(
            "{:<24}  {:>8}  {}",
            leaderboard.name, leaderboard.score_count, leaderboard.id
        );
    }
}
