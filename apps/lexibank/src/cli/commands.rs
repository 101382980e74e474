//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{BankCommand, CourseCommand};
use crate::api::{self, AppState};
use crate::config::{AppConfig, StorageConfig};
use crate::current_day;
use lexibank_core::formats::MAX_SNAPSHOT_SIZE;
use lexibank_core::{
    BankId, CourseId, Day, LexiError, NewCourse, NewWord, Recall, Repository, Snapshot, Stage,
    StageFilter, TransitionPolicy, WordId, WordImporter, snapshot_checksum, snapshot_from_bytes,
    snapshot_to_bytes,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for word imports (16 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LexiError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LexiError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LexiError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to a canonical regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LexiError> {
    let canonical = path.canonicalize().map_err(|e| {
        LexiError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LexiError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, LexiError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LexiError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(LexiError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LexiError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a file after path and size checks.
fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>, LexiError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated).map_err(|e| LexiError::IoError(format!("Read file: {}", e)))
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// With the file backend, the snapshot is written back after shutdown.
pub async fn cmd_server(config: &AppConfig, host: &str, port: u16) -> Result<(), LexiError> {
    let storage = &config.storage;
    let repo = load_or_create_repository(storage)?;

    println!("Lexibank Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", storage.backend);
    println!("  Database: {:?}", storage.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /status                 - Bank overview");
    println!("  GET  /banks, POST /banks     - List or create banks");
    println!("  GET  /banks/{{id}}/words       - List words (POST to add)");
    println!("  GET  /banks/{{id}}/stages      - Stage counts");
    println!("  POST /banks/{{id}}/review      - Record recalls");
    println!("  GET  /banks/{{id}}/due         - Due words");
    println!("  GET  /banks/{{id}}/grid        - Review grid");
    println!("  GET  /courses, POST /courses - List or create courses");
    println!("  GET  /courses/{{id}}/plan      - Course schedule");
    println!("  POST /export                 - Export snapshot");
    println!("  GET  /hash                   - Snapshot checksum");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(repo).with_grid_columns(config.review.grid_columns);
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state.clone()).await?;

    let repo = state.repository.read().await;
    save_repository(&repo, storage)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show banks and storage layout.
pub fn cmd_status(storage: &StorageConfig, json_mode: bool) -> Result<(), LexiError> {
    let repo = load_or_create_repository(storage)?;
    let overview = repo.bank_overview()?;
    let report = repo.storage_report()?;

    if json_mode {
        let output = serde_json::json!({
            "database": storage.database.to_string_lossy(),
            "backend": storage.backend,
            "banks": overview,
            "storage": report,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Lexibank Status");
    println!("===============");
    println!("Database: {:?}", storage.database);
    println!("Backend:  {}", storage.backend);
    println!();
    println!("Banks: {}", overview.len());
    for entry in &overview {
        println!(
            "  [{}] {:<24} {:>6} words  {:>3}% mastered",
            entry.bank.id,
            entry.bank.name,
            entry.word_count,
            entry.distribution.mastered_percent()
        );
    }
    println!();
    println!("Storage:");
    println!("  Keys:        {}", report.key_count);
    println!("  Chunk size:  {}", report.chunk_size);
    println!("  Value limit: {} bytes", report.value_limit);
    for collection in &report.collections {
        match collection.header {
            Some(h) => println!(
                "  {:<32} {} items in {} chunks",
                collection.key, h.total_count, h.chunk_count
            ),
            None => println!("  {:<32} (no header)", collection.key),
        }
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(storage: &StorageConfig, force: bool) -> Result<(), LexiError> {
    let db_path = &storage.database;
    if db_path.exists() {
        if !force {
            return Err(LexiError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| LexiError::IoError(format!("Remove old database: {}", e)))?;
    }

    match storage.backend.as_str() {
        "redb" => {
            let _repo = Repository::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        _ => {
            save_repository(&Repository::new(), storage)?;
            println!("Initialized new file database at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// BANK COMMANDS
// =============================================================================

/// Create, list, rename, delete or reset banks.
pub fn cmd_bank(
    storage: &StorageConfig,
    json_mode: bool,
    action: BankCommand,
) -> Result<(), LexiError> {
    let mut repo = load_or_create_repository(storage)?;

    match action {
        BankCommand::Create { name } => {
            let bank = repo.create_bank(&name, current_day())?;
            save_repository(&repo, storage)?;
            if json_mode {
                print_json(&bank);
            } else {
                println!("Created bank {} ({})", bank.id, bank.name);
            }
        }
        BankCommand::List => {
            let overview = repo.bank_overview()?;
            if json_mode {
                print_json(&overview);
            } else if overview.is_empty() {
                println!("No banks yet. Create one with: lexibank bank create <name>");
            } else {
                for entry in &overview {
                    println!(
                        "[{}] {} - {} words, created {}",
                        entry.bank.id, entry.bank.name, entry.word_count, entry.bank.created
                    );
                }
            }
        }
        BankCommand::Rename { id, name } => {
            let bank = repo.rename_bank(BankId(id), &name)?;
            save_repository(&repo, storage)?;
            println!("Renamed bank {} to {}", bank.id, bank.name);
        }
        BankCommand::Delete { id } => {
            repo.delete_bank(BankId(id))?;
            save_repository(&repo, storage)?;
            println!("Deleted bank {}", id);
        }
        BankCommand::Reset { id } => {
            let changed = repo.reset_progress(BankId(id))?;
            save_repository(&repo, storage)?;
            println!("Reset {} words in bank {} to stage 1", changed, id);
        }
    }

    Ok(())
}

// =============================================================================
// WORD COMMANDS
// =============================================================================

/// Add a single word.
pub fn cmd_add(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    term: &str,
    meaning: &str,
) -> Result<(), LexiError> {
    let mut repo = load_or_create_repository(storage)?;
    let outcome = repo.add_words(BankId(bank), &[NewWord::new(term, meaning)])?;
    save_repository(&repo, storage)?;

    if json_mode {
        print_json(&outcome);
    } else if let Some(id) = outcome.added.first() {
        println!("Added word {} to bank {}", id, bank);
    } else {
        println!("'{}' is already in bank {}", term.trim(), bank);
    }
    Ok(())
}

/// Import words from a file.
pub fn cmd_import(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    file: &Path,
    format: &str,
) -> Result<(), LexiError> {
    tracing::info!("Importing from {:?} (format: {})", file, format);

    let contents = read_input(file, MAX_IMPORT_FILE_SIZE)?;
    let words = WordImporter::parse(&contents, format)?;

    let mut repo = load_or_create_repository(storage)?;
    let outcome = repo.add_words(BankId(bank), &words)?;
    save_repository(&repo, storage)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    println!("Imported {} words", outcome.added.len());
    if !outcome.duplicates.is_empty() {
        println!("Skipped {} duplicates:", outcome.duplicates.len());
        for term in outcome.duplicates.iter().take(10) {
            println!("  {}", term);
        }
        if outcome.duplicates.len() > 10 {
            println!("  ... and {} more", outcome.duplicates.len() - 10);
        }
    }
    println!(
        "Bank {} now has {} words",
        bank,
        repo.word_count(BankId(bank))?
    );
    Ok(())
}

/// List the words of a bank.
pub fn cmd_words(storage: &StorageConfig, json_mode: bool, bank: u64) -> Result<(), LexiError> {
    let repo = load_or_create_repository(storage)?;
    let words = repo.words(BankId(bank))?;

    if json_mode {
        print_json(&words);
        return Ok(());
    }

    for word in &words {
        let reviewed = word
            .last_reviewed
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:>6}  S{}  {} = {}  (reviewed {})",
            word.id,
            word.stage.value(),
            word.term,
            word.meaning,
            reviewed
        );
    }
    println!("{} words", words.len());
    Ok(())
}

/// Change a word's term or meaning.
pub fn cmd_edit(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    word: u64,
    term: Option<&str>,
    meaning: Option<&str>,
) -> Result<(), LexiError> {
    if term.is_none() && meaning.is_none() {
        return Err(LexiError::InvalidWord(
            "nothing to change: pass --term and/or --meaning".to_string(),
        ));
    }

    let mut repo = load_or_create_repository(storage)?;
    let updated = repo.update_word(BankId(bank), WordId(word), term, meaning)?;
    save_repository(&repo, storage)?;

    if json_mode {
        print_json(&updated);
    } else {
        println!("Word {}: {} = {}", updated.id, updated.term, updated.meaning);
    }
    Ok(())
}

/// Remove words from a bank.
pub fn cmd_remove(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    words: &[u64],
) -> Result<(), LexiError> {
    let ids: Vec<WordId> = words.iter().copied().map(WordId).collect();
    let mut repo = load_or_create_repository(storage)?;
    let removed = repo.remove_words(BankId(bank), &ids)?;
    save_repository(&repo, storage)?;

    if json_mode {
        print_json(&serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {} words from bank {}", removed, bank);
    }
    Ok(())
}

// =============================================================================
// REVIEW COMMANDS
// =============================================================================

/// Record recall results.
pub fn cmd_review(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    mode: &str,
    correct: &[u64],
    incorrect: &[u64],
    day: Option<u32>,
) -> Result<(), LexiError> {
    let policy = TransitionPolicy::parse(mode)?;
    let results: Vec<(WordId, Recall)> = correct
        .iter()
        .map(|id| (WordId(*id), Recall::Correct))
        .chain(incorrect.iter().map(|id| (WordId(*id), Recall::Incorrect)))
        .collect();

    if results.is_empty() {
        return Err(LexiError::InvalidWord(
            "no results: pass --correct and/or --incorrect".to_string(),
        ));
    }

    let today = day.map(Day::new).unwrap_or_else(current_day);
    let mut repo = load_or_create_repository(storage)?;
    let outcome = repo.record_recalls(BankId(bank), &results, policy, today)?;
    save_repository(&repo, storage)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    for change in &outcome.changes {
        println!(
            "  word {:>6}: S{} -> S{}",
            change.word,
            change.from.value(),
            change.to.value()
        );
    }
    println!();
    print_distribution(&outcome.distribution);
    Ok(())
}

fn print_distribution(distribution: &lexibank_core::StageDistribution) {
    for (stage, count) in distribution.iter() {
        println!("  {:<22} {}", stage.to_string(), count);
    }
    println!(
        "  Mastered: {} / {} ({}%)",
        distribution.mastered(),
        distribution.total(),
        distribution.mastered_percent()
    );
}

/// Show the per-stage counts of a bank.
pub fn cmd_stages(storage: &StorageConfig, json_mode: bool, bank: u64) -> Result<(), LexiError> {
    let repo = load_or_create_repository(storage)?;
    let progress = repo.stage_progress(BankId(bank))?;

    if json_mode {
        print_json(&progress);
        return Ok(());
    }

    println!("Stages for bank {}", bank);
    println!("==================");
    print_distribution(&progress.distribution);
    match progress.lowest {
        Some(stage) if !progress.complete => println!("  Lowest stage: {}", stage),
        _ if progress.complete => println!("  Every word is mastered"),
        _ => println!("  Bank is empty"),
    }
    Ok(())
}

/// Show a bank as a review grid.
pub fn cmd_grid(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    columns: usize,
    stage: Option<u8>,
    all: bool,
) -> Result<(), LexiError> {
    let filter = match (stage, all) {
        (Some(value), _) => StageFilter::Only(Stage::new(value)?),
        (None, true) => StageFilter::All,
        (None, false) => StageFilter::Unmastered,
    };

    let repo = load_or_create_repository(storage)?;
    let grid = repo.review_grid(BankId(bank), filter, columns)?;

    if json_mode {
        print_json(&grid);
        return Ok(());
    }

    if grid.is_empty() {
        println!("Nothing to review");
        return Ok(());
    }
    for row in &grid.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|c| format!("{}#{} (S{})", c.term, c.word, c.stage.value()))
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!("{} cards", grid.cell_count());
    Ok(())
}

/// List words due for anti-forgetting review.
pub fn cmd_due(
    storage: &StorageConfig,
    json_mode: bool,
    bank: u64,
    day: Option<u32>,
) -> Result<(), LexiError> {
    let today = day.map(Day::new).unwrap_or_else(current_day);
    let repo = load_or_create_repository(storage)?;
    let due = repo.due_words(BankId(bank), today)?;

    if json_mode {
        print_json(&due);
        return Ok(());
    }

    if due.is_empty() {
        println!("Nothing due on {}", today);
        return Ok(());
    }
    for entry in &due {
        println!(
            "{:>6}  S{}  {}  ({} days overdue)",
            entry.word,
            entry.stage.value(),
            entry.term,
            entry.overdue_days
        );
    }
    println!("{} words due on {}", due.len(), today);
    Ok(())
}

// =============================================================================
// COURSE COMMANDS
// =============================================================================

/// Create, list, plan or delete courses.
pub fn cmd_course(
    storage: &StorageConfig,
    json_mode: bool,
    action: CourseCommand,
) -> Result<(), LexiError> {
    let mut repo = load_or_create_repository(storage)?;

    match action {
        CourseCommand::Create {
            name,
            bank,
            daily_new,
            start,
        } => {
            let course = repo.create_course(&NewCourse {
                name,
                bank: BankId(bank),
                daily_new,
                start: start.map(Day::new).unwrap_or_else(current_day),
            })?;
            save_repository(&repo, storage)?;
            if json_mode {
                print_json(&course);
            } else {
                println!(
                    "Created course {} ({}) over bank {}, {} new words per day from {}",
                    course.id, course.name, course.bank, course.daily_new, course.start
                );
            }
        }
        CourseCommand::List => {
            let courses = repo.courses()?;
            if json_mode {
                print_json(&courses);
            } else {
                for course in &courses {
                    println!(
                        "[{}] {} - bank {}, {} per day, starts {}",
                        course.id, course.name, course.bank, course.daily_new, course.start
                    );
                }
            }
        }
        CourseCommand::Plan { id, day } => {
            let plan = repo.course_plan(CourseId(id))?;
            match day.map(Day::new) {
                Some(day) => {
                    let words = plan.words_for(day);
                    if json_mode {
                        print_json(&serde_json::json!({
                            "day": day,
                            "agenda": plan.agenda(day),
                            "words": words,
                        }));
                    } else {
                        println!("{}: {} words", day, words.len());
                        let ids: Vec<String> = words.iter().map(|w| w.to_string()).collect();
                        println!("  {}", ids.join(", "));
                    }
                }
                None if json_mode => print_json(&plan),
                None => {
                    for entry in &plan.days {
                        let reviews: Vec<String> =
                            entry.review_of.iter().map(|d| d.to_string()).collect();
                        println!(
                            "{}: {} new, review [{}]",
                            entry.day,
                            entry.new_words.len(),
                            reviews.join(", ")
                        );
                    }
                    println!("{} study days", plan.study_days());
                }
            }
        }
        CourseCommand::Delete { id } => {
            repo.delete_course(CourseId(id))?;
            save_repository(&repo, storage)?;
            println!("Deleted course {}", id);
        }
    }

    Ok(())
}

// =============================================================================
// EXPORT / RESTORE / HASH
// =============================================================================

/// Export the whole database.
pub fn cmd_export(storage: &StorageConfig, output: &Path, format: &str) -> Result<(), LexiError> {
    let validated_output = validate_output_path(output)?;

    let repo = load_or_create_repository(storage)?;
    let snapshot = repo.snapshot()?;

    let data = match format {
        "snapshot" => {
            let data = snapshot_to_bytes(&snapshot)?;
            println!("Checksum: {}", snapshot_checksum(&snapshot)?);
            data
        }
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| LexiError::SerializationError(e.to_string()))?,
        _ => {
            return Err(LexiError::SerializationError(format!(
                "Unknown format: {}. Use: snapshot, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| LexiError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);
    Ok(())
}

/// Parse a binary snapshot, falling back to JSON.
fn parse_snapshot(data: &[u8]) -> Result<Snapshot, LexiError> {
    match snapshot_from_bytes(data) {
        Ok(snapshot) => Ok(snapshot),
        Err(binary_err) => serde_json::from_slice(data).map_err(|_| binary_err),
    }
}

/// Replace the whole database with a snapshot.
pub fn cmd_restore(storage: &StorageConfig, input: &Path) -> Result<(), LexiError> {
    let data = read_input(input, MAX_SNAPSHOT_SIZE as u64)?;
    let snapshot = parse_snapshot(&data)?;

    let mut repo = load_or_create_repository(storage)?;
    repo.restore(&snapshot)?;
    save_repository(&repo, storage)?;

    println!(
        "Restored {} banks, {} words, {} courses",
        snapshot.banks.len(),
        snapshot.word_count(),
        snapshot.courses.len()
    );
    Ok(())
}

/// Compute BLAKE3 hash of the snapshot.
pub fn cmd_hash(storage: &StorageConfig, json_mode: bool) -> Result<(), LexiError> {
    let repo = load_or_create_repository(storage)?;
    let snapshot = repo.snapshot()?;
    let checksum = snapshot_checksum(&snapshot)?;

    if json_mode {
        print_json(&serde_json::json!({
            "hash": checksum,
            "algorithm": "blake3",
            "banks": snapshot.banks.len(),
            "words": snapshot.word_count(),
        }));
    } else {
        println!("{}", checksum);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the repository described by `storage`.
///
/// The file backend reads the snapshot file, if any, into memory.
pub fn load_or_create_repository(storage: &StorageConfig) -> Result<Repository, LexiError> {
    let db_path = &storage.database;
    match storage.backend.as_str() {
        "redb" => Repository::with_redb(db_path)?.with_chunk_size(storage.chunk_size),
        _ => {
            let mut repo = Repository::new().with_chunk_size(storage.chunk_size)?;
            if db_path.exists() {
                let data = read_input(db_path, MAX_SNAPSHOT_SIZE as u64)?;
                repo.restore(&parse_snapshot(&data)?)?;
            }
            Ok(repo)
        }
    }
}

/// Persist a repository opened with the file backend.
pub fn save_repository(repo: &Repository, storage: &StorageConfig) -> Result<(), LexiError> {
    if repo.is_persistent() {
        // Redb commits every batch itself
        return Ok(());
    }
    let data = snapshot_to_bytes(&repo.snapshot()?)?;
    std::fs::write(&storage.database, &data)
        .map_err(|e| LexiError::IoError(format!("Write db: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn file_storage(dir: &Path) -> StorageConfig {
        StorageConfig {
            database: dir.join("bank.lxbk"),
            backend: "file".to_string(),
            chunk_size: 3,
        }
    }

    #[test]
    fn file_backend_roundtrips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = file_storage(dir.path());

        let mut repo = load_or_create_repository(&storage).expect("open");
        let bank = repo.create_bank("Travel", Day::new(5)).expect("bank").id;
        repo.add_words(bank, &[NewWord::new("ticket", "billete")])
            .expect("add");
        save_repository(&repo, &storage).expect("save");

        let reopened = load_or_create_repository(&storage).expect("reopen");
        assert_eq!(reopened.snapshot().expect("a"), repo.snapshot().expect("b"));
        assert_eq!(reopened.chunk_size(), 3);
    }

    #[test]
    fn redb_backend_needs_no_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            database: dir.path().join("bank.redb"),
            backend: "redb".to_string(),
            chunk_size: 50,
        };

        {
            let mut repo = load_or_create_repository(&storage).expect("open");
            repo.create_bank("Kitchen", Day::new(1)).expect("bank");
        }

        let repo = load_or_create_repository(&storage).expect("reopen");
        assert_eq!(repo.banks().expect("banks").len(), 1);
    }

    #[test]
    fn json_snapshot_accepted_on_restore() {
        let mut repo = Repository::new();
        repo.create_bank("Music", Day::new(2)).expect("bank");
        let snapshot = repo.snapshot().expect("snapshot");

        let json = serde_json::to_vec(&snapshot).expect("json");
        assert_eq!(parse_snapshot(&json).expect("parse"), snapshot);

        let binary = snapshot_to_bytes(&snapshot).expect("binary");
        assert_eq!(parse_snapshot(&binary).expect("parse"), snapshot);

        assert!(parse_snapshot(b"neither").is_err());
    }

    #[test]
    fn output_path_without_parent_uses_cwd() {
        let resolved = validate_output_path(Path::new("export.lxbk")).expect("resolve");
        assert_eq!(
            resolved.file_name().and_then(|n| n.to_str()),
            Some("export.lxbk")
        );
    }

    #[test]
    fn oversized_import_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "a:b\n").expect("write");
        assert!(validate_file_size(&path, 2).is_err());
        assert!(read_input(&path, 1024).is_ok());
    }
}
