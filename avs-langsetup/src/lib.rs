//! avs-langsetup library - deck language setup
//!
//! Writes a deck's `{frontLang, backLang}` config into Anki's media folder
//! and optionally bulk-adds or removes the per-note `av:front=` /
//! `av:back=` override tags, all through AnkiConnect.

use std::io::Write;

use clap::Parser;
use thiserror::Error;
use tracing::debug;

use avs_common::anki::AnkiConnectClient;
use avs_common::language::{deck_config_filename, LanguageConfig, TagPrefixes};

/// Command-line arguments for avs-langsetup
#[derive(Parser, Debug, Clone)]
#[command(name = "avs-langsetup")]
#[command(about = "Set deck-level language defaults (and optional note tags) for Anki Voice")]
#[command(version)]
pub struct Args {
    /// Deck name, exactly as shown in Anki (e.g. "Spanish 1")
    #[arg(long)]
    pub deck: String,

    /// BCP-47 language tag for the front (e.g. es-MX)
    #[arg(long)]
    pub front_lang: Option<String>,

    /// BCP-47 language tag for the back (e.g. en-US)
    #[arg(long)]
    pub back_lang: Option<String>,

    /// Also add av:front=/av:back= tags to every note in the deck
    #[arg(long)]
    pub tag_notes: bool,

    /// Remove av:front=/av:back= tags from every note in the deck
    #[arg(long)]
    pub remove_note_tags: bool,

    /// Print what would change without applying it
    #[arg(long)]
    pub dry_run: bool,

    /// AnkiConnect endpoint
    #[arg(long, env = "AVS_ANKICONNECT_URL", default_value = "http://127.0.0.1:8765")]
    pub connect_url: String,
}

/// Setup failures
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("--front-lang and --back-lang are required unless --remove-note-tags is given")]
    MissingLanguages,

    #[error("Deck '{deck}' not found. Known decks: {known:?}")]
    DeckNotFound { deck: String, known: Vec<String> },

    #[error(transparent)]
    Anki(#[from] avs_common::Error),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode deck config: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the tool will do to one deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPlan {
    pub deck: String,
    /// Deck config to write; `None` when only removing tags
    pub config: Option<LanguageConfig>,
    pub tag_notes: bool,
    pub remove_note_tags: bool,
    pub dry_run: bool,
    pub prefixes: TagPrefixes,
}

impl SetupPlan {
    /// Validate arguments. Languages are required unless only removing tags.
    pub fn from_args(args: &Args) -> Result<Self, SetupError> {
        let lang = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let config = match (lang(&args.front_lang), lang(&args.back_lang)) {
            (Some(front), Some(back)) => Some(LanguageConfig::new(front, back)),
            _ if args.remove_note_tags => None,
            _ => return Err(SetupError::MissingLanguages),
        };

        Ok(Self {
            deck: args.deck.clone(),
            config: if args.remove_note_tags { None } else { config },
            tag_notes: args.tag_notes && !args.remove_note_tags,
            remove_note_tags: args.remove_note_tags,
            dry_run: args.dry_run,
            prefixes: TagPrefixes::default(),
        })
    }

    fn marker(&self) -> &'static str {
        if self.dry_run {
            "[dry-run] "
        } else {
            ""
        }
    }
}

/// Apply a plan, reporting progress on `out`
pub async fn run(client: &AnkiConnectClient, plan: &SetupPlan, out: &mut impl Write) -> Result<(), SetupError> {
    let version = client.version().await?;
    writeln!(out, "Connected to AnkiConnect (version={}).", version)?;

    let decks = client.deck_names().await?;
    if !decks.iter().any(|d| d == &plan.deck) {
        let mut known = decks;
        known.sort();
        return Err(SetupError::DeckNotFound {
            deck: plan.deck.clone(),
            known,
        });
    }

    if let Some(config) = &plan.config {
        let filename = deck_config_filename(&plan.deck);
        let contents = config.to_json_pretty()?;
        if plan.dry_run {
            writeln!(out, "[dry-run] Would storeMediaFile: {}\n{}", filename, contents)?;
        } else {
            client.store_media_file(&filename, contents.as_bytes()).await?;
        }
        writeln!(out, "{}Wrote deck config media: {}", plan.marker(), filename)?;
    }

    let note_ids = client
        .find_notes(&format!("deck:\"{}\"", plan.deck))
        .await?;
    writeln!(out, "Deck '{}': {} notes.", plan.deck, note_ids.len())?;
    debug!(deck = %plan.deck, notes = note_ids.len(), "Found deck notes");

    if plan.tag_notes {
        if let Some(config) = &plan.config {
            let tags = plan.prefixes.tag_pair(
                config.front_lang.as_deref().unwrap_or_default(),
                config.back_lang.as_deref().unwrap_or_default(),
            );
            if note_ids.is_empty() {
                writeln!(out, "No notes found; skipping tag add.")?;
            } else if plan.dry_run {
                writeln!(out, "[dry-run] Would addTags to {} notes: {}", note_ids.len(), tags)?;
            } else {
                client.add_tags(&note_ids, &tags).await?;
            }
            writeln!(out, "{}Tagged notes with {}", plan.marker(), tags)?;
        }
    }

    if plan.remove_note_tags {
        let tokens = plan.prefixes.removal_tokens();
        if note_ids.is_empty() {
            writeln!(out, "No notes found; skipping tag removal.")?;
        } else if plan.dry_run {
            writeln!(out, "[dry-run] Would removeTags from {} notes: {}", note_ids.len(), tokens)?;
        } else {
            client.remove_tags(&note_ids, &tokens).await?;
        }
        writeln!(
            out,
            "{}Removed {}=/{}= tags from notes.",
            plan.marker(),
            plan.prefixes.front,
            plan.prefixes.back
        )?;
    }

    writeln!(out, "Done.")?;
    Ok(())
}
