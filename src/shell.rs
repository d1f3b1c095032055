use crate::coincap::client::{AssetQuery, MarketSource};
use crate::coincap::error::MarketError;
use crate::coincap::model::{Asset, Rate};
use crate::config::Config;
use crate::listing::{Availability, Completion, ListingController, RequestTicket};
use crate::view::currency::{selectable_symbols, CurrencySelection, DEFAULT_SELECTION};
use crate::view::filters::{FilterKey, Filters};
use crate::view::table::TableRenderer;
use crate::view::viewport::Viewport;
use std::fmt::Write;
use std::future::Future;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

pub const HELP: &str = "\
Commands:
  search <term>              fetch assets matching <term>
  clear                      drop the search term and fetch again
  filter <name> <on|off>     show or hide a column
  filters                    list column toggles and the display currency
  currency <SYMBOL|default>  show prices in a fiat currency
  currencies                 list selectable currencies
  rank                       reverse the row order
  more / top                 next page / back to the first row
  show                       print the current page
  help                       this text
  quit                       leave";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Search(String),
    Clear,
    Filter(FilterKey, bool),
    Filters,
    Currency(String),
    Currencies,
    Rank,
    More,
    Top,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (word, rest) = match s.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (s, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" | "show" => Command::Show,
            "search" | "s" => Command::Search(rest.to_string()),
            "clear" => Command::Clear,
            "filter" | "f" => {
                let mut parts = rest.split_whitespace();
                let usage = || "usage: filter <name> <on|off>".to_string();
                let key: FilterKey = parts.next().ok_or_else(usage)?.parse()?;
                let value = match parts.next().map(|v| v.to_ascii_lowercase()) {
                    Some(v) if matches!(v.as_str(), "on" | "true" | "yes" | "1") => true,
                    Some(v) if matches!(v.as_str(), "off" | "false" | "no" | "0") => false,
                    _ => return Err(usage()),
                };
                Command::Filter(key, value)
            }
            "filters" => Command::Filters,
            "currency" | "c" if !rest.is_empty() => Command::Currency(rest.to_string()),
            "currency" | "c" => return Err("usage: currency <SYMBOL|default>".to_string()),
            "currencies" => Command::Currencies,
            "rank" => Command::Rank,
            "more" | "next" => Command::More,
            "top" => Command::Top,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        };
        Ok(command)
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Assets(RequestTicket, Result<Vec<Asset>, MarketError>),
    Rates(RequestTicket, Result<Vec<Rate>, MarketError>),
}

#[derive(Debug, PartialEq)]
pub enum Step {
    Print(String),
    Quit,
}

/// All view state of one terminal session. Only the shell loop mutates it;
/// fetches run as tasks and report back through `outcome_sender`.
pub struct Session<S> {
    source: S,
    controller: ListingController,
    filters: Filters,
    selection: CurrencySelection,
    viewport: Viewport,
    renderer: TableRenderer,
    search: String,
    limit: Option<u32>,
    pending_currency: Option<String>,
    outcome_sender: mpsc::UnboundedSender<FetchOutcome>,
}

impl<S> Session<S>
where
    S: MarketSource + Clone + Send + Sync + 'static,
{
    pub fn new(
        source: S,
        config: &Config,
        outcome_sender: mpsc::UnboundedSender<FetchOutcome>,
    ) -> Self {
        Self {
            source,
            controller: ListingController::new(),
            filters: config.filters,
            selection: CurrencySelection::default(),
            viewport: Viewport::new(config.page_size, config.top_threshold),
            renderer: TableRenderer {
                color: config.color,
            },
            search: String::new(),
            limit: config.limit,
            pending_currency: config.currency.clone(),
            outcome_sender,
        }
    }

    /// Kicks off the initial assets and rates fetches.
    pub fn start(&mut self) {
        self.spawn_assets_fetch();
        self.spawn_rates_fetch();
    }

    pub fn is_loading(&self) -> bool {
        self.controller.assets_availability() == Availability::Loading
            || self.controller.rates_availability() == Availability::Loading
    }

    fn spawn_assets_fetch(&mut self) {
        let ticket = self.controller.begin_assets();
        let query = AssetQuery::search(&self.search).with_limit(self.limit);
        let source = self.source.clone();
        let sender = self.outcome_sender.clone();

        trace!("Spawning assets fetch #{} for {:?}", ticket.generation, query);
        tokio::spawn(async move {
            let result = source.fetch_assets_list(&query).await;
            if sender.send(FetchOutcome::Assets(ticket, result)).is_err() {
                warn!("Session is gone, dropping assets response #{}", ticket.generation);
            }
        });
    }

    fn spawn_rates_fetch(&mut self) {
        let ticket = self.controller.begin_rates();
        let source = self.source.clone();
        let sender = self.outcome_sender.clone();

        trace!("Spawning rates fetch #{}", ticket.generation);
        tokio::spawn(async move {
            let result = source.fetch_rates_list().await;
            if sender.send(FetchOutcome::Rates(ticket, result)).is_err() {
                warn!("Session is gone, dropping rates response #{}", ticket.generation);
            }
        });
    }

    /// Folds a finished fetch into the session. Returns text to show, if any.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Option<String> {
        match outcome {
            FetchOutcome::Assets(ticket, result) => {
                match self.controller.complete_assets(ticket, result) {
                    Completion::Applied => {
                        self.viewport.scroll_top();
                        Some(self.render_page())
                    }
                    Completion::Failed => {
                        Some("Could not load assets, showing the previous listing.".to_string())
                    }
                    Completion::Stale => None,
                }
            }
            FetchOutcome::Rates(ticket, result) => {
                match self.controller.complete_rates(ticket, result) {
                    Completion::Applied => self
                        .pending_currency
                        .take()
                        .map(|symbol| self.select_currency(&symbol)),
                    Completion::Failed => {
                        self.pending_currency = None;
                        Some("Could not load exchange rates, prices stay in USD.".to_string())
                    }
                    Completion::Stale => None,
                }
            }
        }
    }

    pub fn handle(&mut self, command: Command) -> Step {
        debug!("Handling {:?}", command);
        let output = match command {
            Command::Search(term) => {
                self.search = term.trim().to_string();
                self.spawn_assets_fetch();
                if self.search.is_empty() {
                    "Loading all assets...".to_string()
                } else {
                    format!("Searching for '{}'...", self.search)
                }
            }
            Command::Clear => {
                self.search.clear();
                self.spawn_assets_fetch();
                "Search cleared, loading all assets...".to_string()
            }
            Command::Filter(key, value) => {
                self.filters.toggle(key, value);
                self.render_page()
            }
            Command::Filters => self.describe_filters(),
            Command::Currency(symbol) => self.select_currency(&symbol),
            Command::Currencies => {
                let rates = self.controller.rates().unwrap_or_default();
                format!("Currencies: {}", selectable_symbols(rates).join(", "))
            }
            Command::Rank => {
                self.controller.reverse_order();
                self.viewport.scroll_top();
                self.render_page()
            }
            Command::More => {
                let total = self.controller.assets().map_or(0, |a| a.len());
                if self.viewport.scroll_down(total) {
                    self.render_page()
                } else {
                    "Already at the last page.".to_string()
                }
            }
            Command::Top => {
                self.viewport.scroll_top();
                self.render_page()
            }
            Command::Show => self.render_page(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Step::Quit,
        };
        Step::Print(output)
    }

    fn select_currency(&mut self, symbol: &str) -> String {
        let rates = self.controller.rates().unwrap_or_default();
        let selected = self
            .selection
            .select(symbol, rates)
            .map(|currency| currency.symbol.clone());
        match selected {
            Ok(selected) => {
                info!("Display currency is now {}", selected);
                self.render_page()
            }
            Err(e) if self.controller.rates_availability() == Availability::Loading
                && !symbol.trim().eq_ignore_ascii_case(DEFAULT_SELECTION) =>
            {
                debug!("{}, retrying once rates arrive", e);
                self.pending_currency = Some(symbol.to_string());
                format!("Rates are still loading, {} will be applied once they arrive.", symbol.trim())
            }
            Err(e) => {
                warn!("{}", e);
                format!("{}, keeping {}.", e, self.selection.current().symbol)
            }
        }
    }

    fn describe_filters(&self) -> String {
        let mut out = String::new();
        for key in FilterKey::ALL {
            let state = if self.filters.get(key) { "on" } else { "off" };
            let _ = writeln!(out, "  {:<14} {:<3}  {}", key.name(), state, key.label());
        }
        let _ = write!(out, "  currency       {}", self.selection.current().symbol);
        out
    }

    pub fn render_page(&self) -> String {
        let assets = match self.controller.assets() {
            Some(assets) => assets,
            None if self.controller.assets_availability() == Availability::Loading => {
                return "Loading assets...".to_string();
            }
            None => return "No assets loaded.".to_string(),
        };
        if assets.is_empty() {
            return format!("No assets match '{}'.", self.search);
        }

        let range = self.viewport.visible(assets.len());
        let mut out = self.renderer.render(
            &assets[range.clone()],
            &self.filters,
            self.selection.current(),
        );
        let _ = write!(
            out,
            "{}-{} of {} in {}",
            range.start + 1,
            range.end,
            assets.len(),
            self.selection.current().symbol
        );
        if !self.search.is_empty() {
            let _ = write!(out, ", search '{}'", self.search);
        }
        if range.end < assets.len() {
            out.push_str(", `more` for the next page");
        }
        if self.viewport.shows_top_hint() {
            out.push_str(", `top` to go back");
        }
        out
    }
}

/// Runs the interactive loop on stdin until `quit`, end of input or Ctrl+C.
pub async fn run<S>(session: Session<S>, outcomes: mpsc::UnboundedReceiver<FetchOutcome>)
where
    S: MarketSource + Clone + Send + Sync + 'static,
{
    println!("{}", HELP);
    drive(
        session,
        outcomes,
        BufReader::new(tokio::io::stdin()),
        signal::ctrl_c(),
    )
    .await;
    info!("Session finished.");
}

/// Feeds `input` lines and fetch outcomes into the session until `quit`,
/// end of input or `shutdown` resolves.
pub async fn drive<S, R, F>(
    mut session: Session<S>,
    mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    input: R,
    shutdown: F,
) where
    S: MarketSource + Clone + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
    F: Future,
{
    let mut lines = input.lines();
    // polled across every turn, never recreated
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested. Stopping...");
                break;
            }
            Some(outcome) = outcomes.recv() => {
                if let Some(output) = session.apply(outcome) {
                    println!("{}", output);
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(command) => match session.handle(command) {
                        Step::Print(output) => println!("{}", output),
                        Step::Quit => break,
                    },
                    Err(e) => println!("{}\n{}", e, HELP),
                },
                Ok(None) => {
                    debug!("End of input");
                    while session.is_loading() {
                        match outcomes.recv().await {
                            Some(outcome) => {
                                if let Some(output) = session.apply(outcome) {
                                    println!("{}", output);
                                }
                            }
                            None => break,
                        }
                    }
                    break;
                }
                Err(e) => {
                    error!("Cannot read input: {}", e);
                    break;
                }
            }
        }
    }
}
