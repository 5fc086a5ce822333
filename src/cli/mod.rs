//! Command-line interface for memovox.
//!
//! Provides commands for importing recordings, listing and inspecting
//! notes, draining the transcription queue, manual retries, AI summaries,
//! and settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::adapters::{BackendClient, TranscribeApi};
use crate::domain::{Note, Notice, TranscriptStatus};
use crate::notes::NoteService;
use crate::store::{self, FileStore, KvStore};

/// memovox - voice memo engine with a durable transcription queue
#[derive(Parser, Debug)]
#[command(name = "memovox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a finished recording and transcribe it
    Import {
        /// Path to the recorded audio file
        audio_file: PathBuf,

        /// Recording duration in milliseconds (0 if unknown)
        #[arg(long, default_value = "0")]
        duration_ms: u64,
    },

    /// List notes
    List {
        /// Filter by transcript status (pending, done, error)
        #[arg(short, long)]
        status: Option<StatusFilter>,

        /// Maximum number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show details of a note
    Show {
        /// Note ID (full UUID or unique prefix)
        note_id: String,
    },

    /// Drain the transcription queue once
    Process,

    /// Manually retry a failed transcription
    Retry {
        /// Note ID (full UUID or unique prefix)
        note_id: String,
    },

    /// Request an AI summary for a transcribed note
    Summarize {
        /// Note ID (full UUID or unique prefix)
        note_id: String,
    },

    /// Delete a note
    Delete {
        /// Note ID (full UUID or unique prefix)
        note_id: String,
    },

    /// Show queue and storage status
    Status,

    /// Show or change persisted settings
    Settings {
        /// Toggle haptic feedback
        #[arg(long, value_enum)]
        haptics: Option<Toggle>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Transcript status filter for `list`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Done,
    Error,
}

impl From<StatusFilter> for TranscriptStatus {
    fn from(f: StatusFilter) -> Self {
        match f {
            StatusFilter::Pending => TranscriptStatus::Pending,
            StatusFilter::Done => TranscriptStatus::Done,
            StatusFilter::Error => TranscriptStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Import {
                audio_file,
                duration_ms,
            } => import_recording(audio_file, duration_ms).await,
            Commands::List { status, limit } => list_notes(status, limit).await,
            Commands::Show { note_id } => show_note(&note_id).await,
            Commands::Process => process_queue().await,
            Commands::Retry { note_id } => retry_note(&note_id).await,
            Commands::Summarize { note_id } => summarize_note(&note_id).await,
            Commands::Delete { note_id } => delete_note(&note_id).await,
            Commands::Status => show_status().await,
            Commands::Settings { haptics } => manage_settings(haptics).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Assemble the service over the default store and configured backend
async fn open_service() -> Result<(NoteService, UnboundedReceiver<Notice>)> {
    let store: Arc<dyn KvStore> = Arc::new(FileStore::open_default()?);
    let api: Arc<dyn TranscribeApi> = Arc::new(BackendClient::from_config()?);
    let policy = crate::config::config()?.retry.clone();

    Ok(NoteService::load(store, api, policy).await)
}

/// Resolve a full UUID or unique id prefix against the collection
fn resolve_note_id(service: &NoteService, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = service
        .notes()
        .iter()
        .map(|n| n.id)
        .filter(|id| id.to_string().starts_with(input))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => anyhow::bail!("No note matches id: {}", input),
        _ => anyhow::bail!("Ambiguous id prefix: {} ({} matches)", input, matches.len()),
    }
}

/// Print any advisories the background queue emitted
fn print_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            Notice::WillRetryAutomatically { id, message } => {
                eprintln!(
                    "⚠️  Transcription error for {}: {}. Will retry automatically.",
                    short_id(id),
                    message
                );
            }
            Notice::MaxRetriesReached { id } => {
                eprintln!(
                    "❌ Transcription failed for {}: maximum retry attempts reached. Use `memovox retry` to try again.",
                    short_id(id)
                );
            }
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn status_str(status: TranscriptStatus) -> &'static str {
    match status {
        TranscriptStatus::Pending => "PEND",
        TranscriptStatus::Done => "DONE",
        TranscriptStatus::Error => "FAIL",
    }
}

fn format_duration(duration_ms: u64) -> String {
    let secs = duration_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One-line transcript preview for the list table. Counts chars, not
/// bytes: transcripts are arbitrary speech and byte slicing would split
/// multi-byte characters.
fn transcript_preview(transcript: &str) -> String {
    if transcript.chars().count() > 32 {
        let head: String = transcript.chars().take(29).collect();
        format!("{}...", head)
    } else {
        transcript.to_string()
    }
}

/// Import a recording: create the note and transcribe immediately
async fn import_recording(audio_file: PathBuf, duration_ms: u64) -> Result<()> {
    if !audio_file.exists() {
        anyhow::bail!("Audio file not found: {}", audio_file.display());
    }

    let audio_uri = audio_file
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", audio_file.display()))?
        .to_string_lossy()
        .to_string();

    let (service, mut notices) = open_service().await?;

    let note = service.create(audio_uri.clone(), duration_ms).await;
    println!("📥 Imported note {} ({})", short_id(note.id), audio_uri);

    println!("📝 Transcribing...");
    service.transcribe(note.id, audio_uri, false).await;
    print_notices(&mut notices);

    match service.get(note.id) {
        Some(note) if note.transcript_status == TranscriptStatus::Done => {
            println!("✅ Transcribed:");
            println!();
            println!("{}", note.transcript.unwrap_or_default());
        }
        Some(_) => {
            println!("⏳ Transcription pending; retries are scheduled. Run `memovox process` later.");
        }
        None => {}
    }

    Ok(())
}

/// List notes, most-recent-first
async fn list_notes(status: Option<StatusFilter>, limit: usize) -> Result<()> {
    let (service, _notices) = open_service().await?;

    let filter: Option<TranscriptStatus> = status.map(Into::into);
    let notes: Vec<Note> = service
        .notes()
        .into_iter()
        .filter(|n| filter.map_or(true, |s| n.transcript_status == s))
        .collect();

    if notes.is_empty() {
        println!("No notes");
        return Ok(());
    }

    println!();
    println!(
        "{:<10} {:<6} {:<8} {:<7} {:<20} {}",
        "ID", "STATUS", "DURATION", "RETRIES", "CREATED", "TRANSCRIPT"
    );
    println!("{}", "-".repeat(90));

    for note in notes.iter().take(limit) {
        let preview = note
            .transcript
            .as_deref()
            .map(transcript_preview)
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<10} {:<6} {:<8} {:<7} {:<20} {}",
            short_id(note.id),
            status_str(note.transcript_status),
            format_duration(note.duration_ms),
            note.retry_count,
            note.created_at.format("%Y-%m-%d %H:%M:%S"),
            preview
        );
    }

    let total = notes.len();
    if total > limit {
        println!();
        println!("  (showing {} of {} notes)", limit, total);
    }

    Ok(())
}

/// Show full note detail
async fn show_note(note_id: &str) -> Result<()> {
    let (service, _notices) = open_service().await?;
    let id = resolve_note_id(&service, note_id)?;

    let note = service
        .get(id)
        .with_context(|| format!("Note not found: {}", id))?;

    println!("Note:      {}", note.id);
    println!("Audio:     {}", note.audio_uri);
    println!("Duration:  {}", format_duration(note.duration_ms));
    println!("Created:   {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Status:    {}", status_str(note.transcript_status));
    println!("Queued:    {}", note.needs_transcription);
    println!("Retries:   {}", note.retry_count);
    if let Some(at) = note.last_retry_at {
        println!("Last fail: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(transcript) = &note.transcript {
        println!();
        println!("Transcript:");
        println!("{}", transcript);
    }

    if let Some(summary) = &note.ai_summary {
        println!();
        if let Some(title) = &note.ai_title_suggestion {
            println!("Suggested title: {}", title);
        }
        println!("Summary: {}", summary);
        if let Some(points) = &note.ai_key_points {
            for point in points {
                println!("  • {}", point);
            }
        }
    }

    Ok(())
}

/// Drain the transcription queue once
async fn process_queue() -> Result<()> {
    let (service, mut notices) = open_service().await?;

    let queued = service.queued_count();
    if queued == 0 {
        println!("✅ No queued transcriptions");
        return Ok(());
    }

    println!("📝 Found {} queued transcription(s), processing...", queued);
    let processed = service.drain_queue().await;
    print_notices(&mut notices);

    let remaining = service.queued_count();
    println!(
        "Done: {} attempted, {} still queued",
        processed, remaining
    );

    Ok(())
}

/// Manual retry for a failed note
async fn retry_note(note_id: &str) -> Result<()> {
    let (service, mut notices) = open_service().await?;
    let id = resolve_note_id(&service, note_id)?;

    println!("📝 Retrying transcription for {}...", short_id(id));
    service.retry(id).await?;
    print_notices(&mut notices);

    match service.get(id) {
        Some(note) if note.transcript_status == TranscriptStatus::Done => {
            println!("✅ Transcribed:");
            println!();
            println!("{}", note.transcript.unwrap_or_default());
        }
        Some(_) => {
            println!("⏳ Attempt failed; automatic retries are scheduled.");
        }
        None => {}
    }

    Ok(())
}

/// Request an AI summary
async fn summarize_note(note_id: &str) -> Result<()> {
    let (service, _notices) = open_service().await?;
    let id = resolve_note_id(&service, note_id)?;

    println!("✨ Requesting AI summary for {}...", short_id(id));
    let summary = service.summarize(id).await?;

    println!();
    if let Some(title) = &summary.title_suggestion {
        println!("Suggested title: {}", title);
    }
    println!("Summary: {}", summary.summary);
    for point in &summary.key_points {
        println!("  • {}", point);
    }

    Ok(())
}

/// Delete a note
async fn delete_note(note_id: &str) -> Result<()> {
    let (service, _notices) = open_service().await?;
    let id = resolve_note_id(&service, note_id)?;

    if service.delete(id).await {
        println!("🗑  Deleted note {}", short_id(id));
    } else {
        println!("Note not found: {}", id);
    }

    Ok(())
}

/// Show queue counters and storage info
async fn show_status() -> Result<()> {
    let store = FileStore::open_default()?;
    let (service, _notices) = open_service().await?;

    let notes = service.notes();
    let pending = notes
        .iter()
        .filter(|n| n.transcript_status == TranscriptStatus::Pending)
        .count();
    let done = notes
        .iter()
        .filter(|n| n.transcript_status == TranscriptStatus::Done)
        .count();
    let failed = notes
        .iter()
        .filter(|n| n.transcript_status == TranscriptStatus::Error)
        .count();

    let info = store::storage_info(&store).await;

    println!();
    println!("Voice Notes Status");
    println!("══════════════════════════════════════════════");
    println!();
    println!("Notes:");
    println!("  Pending:  {}", pending);
    println!("  Done:     {}", done);
    println!("  Failed:   {}", failed);
    println!("  Queued:   {}", service.queued_count());
    println!("  Total:    {}", notes.len());
    println!();
    println!("Storage:");
    println!("  Persisted notes: {}", info.count);
    println!("  Size:            {:.2} KB", info.size_bytes as f64 / 1024.0);

    Ok(())
}

/// Show or toggle settings
async fn manage_settings(haptics: Option<Toggle>) -> Result<()> {
    let store = FileStore::open_default()?;
    let mut settings = store::load_settings(&store).await;

    if let Some(toggle) = haptics {
        settings.haptics_enabled = matches!(toggle, Toggle::On);
        store::save_settings(&store, &settings).await;
    }

    println!(
        "Haptics: {}",
        if settings.haptics_enabled { "on" } else { "off" }
    );

    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let config = crate::config::config()?;

    println!();
    println!("memovox Configuration");
    println!("══════════════════════════════════════════════");
    println!();
    println!("Home:         {}", config.home.display());
    println!("Backend URL:  {}", config.backend_url);
    println!(
        "Config file:  {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    println!("Retry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff:      {:?}",
        config.retry.delays.iter().map(|d| d.as_millis()).collect::<Vec<_>>()
    );
    println!("  Queue gap:    {} ms", config.retry.queue_gap.as_millis());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_passes_short_transcripts_through() {
        assert_eq!(transcript_preview("buy milk"), "buy milk");
    }

    #[test]
    fn test_preview_multibyte_within_limit_is_not_truncated() {
        // 17 chars but 34 bytes; must print in full, not panic or truncate
        let greek = "α".repeat(17);
        assert_eq!(transcript_preview(&greek), greek);
    }

    #[test]
    fn test_preview_truncates_long_multibyte_on_char_boundary() {
        let long = "α".repeat(40);
        assert_eq!(transcript_preview(&long), format!("{}...", "α".repeat(29)));
    }
}
