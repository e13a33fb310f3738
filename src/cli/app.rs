//! CLI module for the churchen client
//!
//! This module handles the command-line interface: one handler per flow,
//! all talking to the Churchen API through [`ApiClient`] and keeping their
//! state in the token ledger and the session store.

use std::{fs::read_to_string, path::PathBuf};

use log::{debug, info, warn};

use crate::{
    public_idea_paths, ApiClient, ChurnError, ChurnResult, Commands, Config, FeedItem, IdeaDraft,
    PublishReceipt, Result, ScoreTier, SessionStore, TokenLedger, CHURN_PATH, DRAFTS_PATH,
    FEED_PATH, HEALTH_PATH, PUBLISH_PATH,
};

/// Width of the token gauge in cells
const GAUGE_CELLS: usize = 20;
/// Balance shown as a "full" gauge
const GAUGE_FULL: f64 = 10.0;
/// Feed preview length in characters
const PREVIEW_CHARS: usize = 160;

/// CLI application handler - processes CLI commands against the API and
/// local state
pub struct App {
    /// Client bound to the configured API host
    client: ApiClient,

    /// Cosmetic token balance
    ledger: TokenLedger,

    /// Durable session state (last result, published id, live buffer)
    store: SessionStore,

    /// Application configuration
    config: Config,

    /// Explicit config file path, when one was given
    config_path: Option<PathBuf>,
}

impl App {
    /// Create a new CLI application from the given config
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let client = ApiClient::new(&config.api_base);
        let ledger = TokenLedger::open(config.ledger_path())?;
        let store = SessionStore::new(config.session_path());
        Ok(Self {
            client,
            ledger,
            store,
            config,
            config_path,
        })
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Churn {
                text,
                tags,
                file,
                json,
            } => self.handle_churn(text, tags, file, json).await?,

            Commands::Publish { json } => self.handle_publish(json).await?,

            Commands::Open { id } => self.handle_open(id).await?,

            Commands::Feed { limit, json } => self.handle_feed(limit, json).await?,

            Commands::Live { json } => self.handle_live(json)?,

            Commands::Balance => self.handle_balance(),

            Commands::Topup { amount } => self.handle_topup(amount)?,

            Commands::Health => self.handle_health().await?,

            Commands::Draft { text, tags, file } => self.handle_draft(text, tags, file).await?,

            Commands::Clear => self.handle_clear()?,

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset)?,
        }

        Ok(())
    }

    /// Resolve idea text from a positional argument or a file
    fn resolve_text(&self, text: Option<String>, file: Option<PathBuf>) -> Result<String> {
        match (text, file) {
            (Some(t), _) => Ok(t),
            (None, Some(path)) => {
                if !path.exists() {
                    return Err(ChurnError::ApplicationError {
                        message: format!("File not found: {}", path.display()),
                    });
                }
                Ok(read_to_string(path)?)
            }
            (None, None) => Err(ChurnError::precondition(
                "Please enter idea text (argument or --file).",
            )),
        }
    }

    /// Submission flow: POST the draft, decode, update session and ledger,
    /// render. Preconditions fail before any network call; a failed response
    /// changes no local state.
    async fn handle_churn(
        &mut self,
        text: Option<String>,
        tags: Option<String>,
        file: Option<PathBuf>,
        json: bool,
    ) -> Result<()> {
        let raw = self.resolve_text(text, file)?;
        let draft = IdeaDraft::new(&raw, tags)?;

        info!(
            "Submitting idea ({} chars, {} tags)",
            draft.text.chars().count(),
            draft.tags.len()
        );
        let response = self.client.post(CHURN_PATH, &draft.churn_body()).await?;
        if !response.ok {
            return Err(ChurnError::Api {
                message: response.error_message(),
            });
        }

        let result = ChurnResult::from_response(response.json()?)?;

        let mut session = self.store.load();
        session.record_churn(draft, result.clone());
        self.store.save(&mut session)?;

        if result.ai_used() {
            self.ledger.spend(self.config.token_cost)?;
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            self.display_result(&result);
        }
        Ok(())
    }

    /// Display the decoded churn result in text form
    fn display_result(&self, result: &ChurnResult) {
        match &result.answer {
            Some(answer) => println!("{}", console::style(&answer.text).bold()),
            None => println!("(no answer)"),
        }

        if let Some(ai) = &result.ai {
            if let Some(model) = &ai.model {
                println!("{}", console::style(format!("model: {}", model)).dim());
            }
            if let Some(error) = &ai.error {
                warn!("AI reported an error: {}", error);
            }
        }

        println!("\nReferences:");
        if result.refs.is_empty() {
            println!("  No references.");
        } else {
            for r in &result.refs {
                let title = r.title.as_deref().or(r.url.as_deref()).unwrap_or("-");
                match &r.url {
                    Some(url) => println!("  {} <{}>", title, url),
                    None => println!("  {}", title),
                }
                if let Some(snippet) = &r.snippet {
                    println!("    {}", console::style(snippet).dim());
                }
            }
        }

        if result.idea_id.is_empty() {
            println!("\nNo idea id returned; this result cannot be published.");
        } else {
            println!("\nIdea ID: {}", result.idea_id);
            if let Some(hash) = &result.hash {
                println!("Hash:    {}", hash);
            }
            println!(
                "{}",
                console::style("Run `churchen publish` to publish this idea.").dim()
            );
        }

        if result.ai_used() {
            println!(
                "Token balance: {:.2} (-{:.2})",
                self.ledger.balance(),
                self.config.token_cost
            );
        }
    }

    /// Publish flow: refused without a prior result; requires both the HTTP
    /// status and the payload's own `ok` flag.
    async fn handle_publish(&mut self, json: bool) -> Result<()> {
        let mut session = self.store.load();

        // Builds the body or refuses; no request goes out on refusal.
        let body = session.publish_body()?;

        info!("Publishing idea {}", body["ideaId"]);
        let response = self.client.post(PUBLISH_PATH, &body).await?;
        if !response.ok {
            return Err(ChurnError::Api {
                message: response.error_message(),
            });
        }

        let receipt = PublishReceipt::from_response(response.json()?);
        if !receipt.ok {
            return Err(ChurnError::Api {
                message: "Publish was not acknowledged by the server.".to_string(),
            });
        }

        // Prefer the server-returned id over the one we sent.
        let published = receipt
            .id
            .clone()
            .unwrap_or_else(|| body["ideaId"].as_str().unwrap_or("").to_string());
        session.published_id = Some(published.clone());
        self.store.save(&mut session)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        } else {
            println!("Published.");
            println!(
                "Public JSON: {}",
                self.client.url(&public_idea_paths(&published)[0])
            );
            println!(
                "{}",
                console::style("Run `churchen open` to fetch the public record.").dim()
            );
        }
        Ok(())
    }

    /// Open flow: probe the known public-idea paths in order; fall back to a
    /// clearly labeled local document when none answers with JSON.
    async fn handle_open(&self, id: Option<String>) -> Result<()> {
        let session = self.store.load();
        let id = session.open_candidate_id(id)?;

        for path in public_idea_paths(&id) {
            match self.client.get(&path).await {
                Ok(response) if response.ok => match response.json() {
                    Ok(doc) => {
                        debug!("Found public record at {}", path);
                        println!("{}", serde_json::to_string_pretty(doc)?);
                        return Ok(());
                    }
                    Err(_) => debug!("{} answered without JSON", path),
                },
                Ok(response) => debug!("{} answered HTTP {}", path, response.status),
                Err(e) => warn!("{} failed: {}", path, e),
            }
        }

        warn!("No server copy found for idea {}", id);
        println!(
            "{}",
            console::style("Local fallback - not a server record:").yellow()
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&session.local_fallback_doc(&id))?
        );
        Ok(())
    }

    /// Feed flow: one fixed-size page of published ideas
    async fn handle_feed(&self, limit: Option<usize>, json: bool) -> Result<()> {
        let limit = limit.unwrap_or(self.config.feed_limit);
        let path = format!("{}?limit={}", FEED_PATH, limit);
        let response = self.client.get(&path).await?;
        if !response.ok {
            return Err(ChurnError::Api {
                message: response.error_message(),
            });
        }

        let items = FeedItem::list_from_response(response.json()?)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        if items.is_empty() {
            println!("No published ideas yet.");
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let published = item
                .created_at
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("ID: {} | Published: {}", item.id, published);
            println!("{}", crate::preview_of(&item.text, PREVIEW_CHARS));

            if !item.tags.is_empty() {
                let tags = item
                    .tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Tags: {}", console::style(tags).cyan());
            }
        }

        println!(
            "\nFound {} idea{}",
            items.len(),
            if items.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    /// Live flow: render the bounded recent-match buffer
    fn handle_live(&self, json: bool) -> Result<()> {
        let session = self.store.load();

        if json {
            println!("{}", serde_json::to_string_pretty(session.live.entries())?);
            return Ok(());
        }

        if session.live.is_empty() {
            println!("Nothing yet.");
            return Ok(());
        }

        for m in session.live.entries() {
            let who = m.who.as_deref().unwrap_or("unknown");
            let title = m.title.as_deref().unwrap_or("");
            println!("{} - {}", console::style(who).bold(), title);

            if !m.tags.is_empty() {
                println!("  {}", console::style(m.tags.join(", ")).cyan());
            }

            let source = m.source.as_deref().unwrap_or("-");
            let score = match m.score {
                Some(score) => {
                    let text = format!("{:.2}", score);
                    match ScoreTier::of(score) {
                        ScoreTier::Strong => console::style(text).green(),
                        ScoreTier::Moderate => console::style(text).yellow(),
                        ScoreTier::Weak => console::style(text).dim(),
                    }
                }
                None => console::style("-".to_string()).dim(),
            };
            println!("  src: {} | score: {}", source, score);
        }
        Ok(())
    }

    /// Show the token balance with the demo gauge
    fn handle_balance(&self) {
        let balance = self.ledger.balance();
        let filled =
            (((balance / GAUGE_FULL).clamp(0.0, 1.0)) * GAUGE_CELLS as f64).round() as usize;
        println!(
            "Tokens: {:.2} [{}{}]",
            balance,
            "=".repeat(filled),
            " ".repeat(GAUGE_CELLS - filled)
        );
        println!("Used so far: {:.2}", self.ledger.used());
    }

    /// Credit demo tokens
    fn handle_topup(&mut self, amount: f64) -> Result<()> {
        if amount <= 0.0 {
            return Err(ChurnError::precondition("Top-up amount must be positive."));
        }
        self.ledger.add(amount)?;
        println!(
            "Credited {:.2} tokens (demo). Balance: {:.2}",
            amount,
            self.ledger.balance()
        );
        Ok(())
    }

    /// Health flow: only the HTTP status matters
    async fn handle_health(&self) -> Result<()> {
        let response = self.client.get(HEALTH_PATH).await?;
        if !response.ok {
            return Err(ChurnError::Api {
                message: response.error_message(),
            });
        }
        println!(
            "API at {} is healthy (HTTP {})",
            self.client.base_url(),
            response.status
        );
        Ok(())
    }

    /// Draft flow: send the text to the separate drafts ingest host
    async fn handle_draft(
        &self,
        text: Option<String>,
        tags: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<()> {
        let base = self.config.drafts_base.clone().ok_or_else(|| {
            ChurnError::precondition(
                "No drafts host configured. Run `churchen config --set drafts_base=URL` first.",
            )
        })?;

        let raw = self.resolve_text(text, file)?;
        let draft = IdeaDraft::new(&raw, tags)?;

        info!("Sending draft to {}", base);
        let client = ApiClient::new(&base);
        let response = client.post(DRAFTS_PATH, &draft.churn_body()).await?;
        if !response.ok {
            return Err(ChurnError::Api {
                message: response.error_message(),
            });
        }

        let data = response.json()?;
        if !data["ok"].as_bool().unwrap_or(false) {
            return Err(ChurnError::Api {
                message: "Draft was not acknowledged by the ingest host.".to_string(),
            });
        }

        match data["next"].as_str() {
            Some(next) => println!("Draft accepted. Next: {}", next),
            None => println!("Draft accepted."),
        }
        Ok(())
    }

    /// Reset the session; the token ledger stays untouched
    fn handle_clear(&self) -> Result<()> {
        self.store.clear()?;
        println!("Session cleared.");
        Ok(())
    }

    /// Configuration management
    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        if reset {
            self.config = Config::default();
            self.config.save(self.config_path.clone())?;
            println!("Configuration reset to defaults.");
        } else if let Some(ref assignment) = set {
            self.config.set(assignment)?;
            self.config.save(self.config_path.clone())?;
            println!("Configuration updated.");
        }

        if show || (set.is_none() && !reset) {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn app_in(dir: &std::path::Path) -> App {
        let mut config = Config::default();
        config.data_dir = dir.to_path_buf();
        App::new(config, None).unwrap()
    }

    #[test]
    fn test_resolve_text_prefers_argument() {
        let dir = tempdir().unwrap();
        let app = app_in(dir.path());
        let text = app
            .resolve_text(Some("inline".to_string()), Some(PathBuf::from("ignored")))
            .unwrap();
        assert_eq!(text, "inline");
    }

    #[test]
    fn test_resolve_text_reads_file() {
        let dir = tempdir().unwrap();
        let app = app_in(dir.path());

        let path = dir.path().join("idea.txt");
        std::fs::write(&path, "from file").unwrap();
        assert_eq!(app.resolve_text(None, Some(path)).unwrap(), "from file");

        let err = app
            .resolve_text(None, Some(dir.path().join("missing.txt")))
            .unwrap_err();
        assert!(matches!(err, ChurnError::ApplicationError { .. }));
    }

    #[test]
    fn test_resolve_text_without_input_is_a_precondition_failure() {
        let dir = tempdir().unwrap();
        let app = app_in(dir.path());
        let err = app.resolve_text(None, None).unwrap_err();
        assert!(matches!(err, ChurnError::Precondition { .. }));
    }

    #[test]
    fn test_topup_rejects_non_positive_amounts() {
        let dir = tempdir().unwrap();
        let mut app = app_in(dir.path());
        assert!(app.handle_topup(0.0).is_err());
        assert!(app.handle_topup(-1.0).is_err());
        app.handle_topup(5.0).unwrap();
        assert_eq!(app.ledger.balance(), 5.0);
    }
}
