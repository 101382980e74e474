//! # Repository Tier Tests (T0-T3)
//!
//! Each tier builds on the one before it.
//!
//! ## Tiers
//! - T0: Input Validation
//! - T1: Stage Transitions
//! - T2: Chunked Persistence
//! - T3: Snapshots & Courses

use lexibank_core::{
    BankId, Day, LexiError, NewWord, Recall, Repository, Stage, TransitionPolicy, WordId,
};

fn seeded(repo: &mut Repository, count: usize) -> BankId {
    let bank = repo.create_bank("Seed", Day(1)).expect("bank").id;
    let words: Vec<NewWord> = (0..count)
        .map(|i| NewWord::new(format!("word{}", i), format!("meaning {}", i)))
        .collect();
    repo.add_words(bank, &words).expect("add");
    bank
}

// =============================================================================
// TIER T0: INPUT VALIDATION
// =============================================================================

mod t0_input_validation {
    use super::*;
    use lexibank_core::WordImporter;

    /// T0.1: Blank terms are rejected and nothing is stored.
    #[test]
    fn blank_term_rejects_whole_batch() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 0);

        let result = repo.add_words(
            bank,
            &[NewWord::new("fine", "ok"), NewWord::new("   ", "blank")],
        );

        assert!(matches!(result, Err(LexiError::InvalidWord(_))));
        assert_eq!(repo.word_count(bank).expect("count"), 0);
    }

    /// T0.2: Bank names are trimmed and must not be empty.
    #[test]
    fn bank_names_validated() {
        let mut repo = Repository::new();
        assert!(matches!(
            repo.create_bank("  ", Day(0)),
            Err(LexiError::InvalidName(_))
        ));
        let bank = repo.create_bank("  Spanish  ", Day(0)).expect("bank");
        assert_eq!(bank.name, "Spanish");
    }

    /// T0.3: Text import feeds straight into a bank.
    #[test]
    fn text_import_adds_words() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 0);
        let words = WordImporter::parse_text("perro\tdog\ngato: cat\n").expect("parse");

        let outcome = repo.add_words(bank, &words).expect("add");
        assert_eq!(outcome.added, vec![WordId(1), WordId(2)]);
    }

    /// T0.4: Chunk size zero is refused.
    #[test]
    fn zero_chunk_size_refused() {
        assert!(matches!(
            Repository::new().with_chunk_size(0),
            Err(LexiError::InvalidChunkSize(0))
        ));
    }
}

// =============================================================================
// TIER T1: STAGE TRANSITIONS
// =============================================================================

mod t1_stage_transitions {
    use super::*;

    /// T1.1: Eight correct recalls take a word from S1 to S9.
    #[test]
    fn eight_correct_recalls_master_a_word() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 1);
        let results = vec![(WordId(1), Recall::Correct); 8];

        let outcome = repo
            .record_recalls(bank, &results, TransitionPolicy::ResetOnMiss, Day(2))
            .expect("record");

        assert_eq!(outcome.changes.last().expect("change").to, Stage::MASTERED);
        assert_eq!(outcome.distribution.mastered(), 1);
        assert_eq!(repo.stage_progress(bank).expect("progress").mastered_percent, 100);
    }

    /// T1.2: A grid miss resets to S1; an anti-forgetting miss steps back.
    #[test]
    fn miss_policies_differ() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 2);
        let climb = vec![
            (WordId(1), Recall::Correct),
            (WordId(1), Recall::Correct),
            (WordId(2), Recall::Correct),
            (WordId(2), Recall::Correct),
        ];
        repo.record_recalls(bank, &climb, TransitionPolicy::ResetOnMiss, Day(2))
            .expect("climb");

        repo.record_recalls(
            bank,
            &[(WordId(1), Recall::Incorrect)],
            TransitionPolicy::ResetOnMiss,
            Day(3),
        )
        .expect("grid miss");
        repo.record_recalls(
            bank,
            &[(WordId(2), Recall::Incorrect)],
            TransitionPolicy::StepBackOnMiss,
            Day(3),
        )
        .expect("anti-forgetting miss");

        assert_eq!(repo.word(bank, WordId(1)).expect("word").stage, Stage::NEW);
        assert_eq!(repo.word(bank, WordId(2)).expect("word").stage.value(), 2);
    }

    /// T1.3: Reviewed words drop out of the due list until their interval passes.
    #[test]
    fn due_list_follows_intervals() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 2);
        assert_eq!(repo.due_words(bank, Day(5)).expect("due").len(), 2);

        repo.record_recalls(
            bank,
            &[(WordId(1), Recall::Correct)],
            TransitionPolicy::StepBackOnMiss,
            Day(5),
        )
        .expect("record");

        // S2 interval is one day
        assert_eq!(repo.due_words(bank, Day(5)).expect("due").len(), 1);
        assert_eq!(repo.due_words(bank, Day(6)).expect("due").len(), 2);
    }

    /// T1.4: Resetting progress returns every word to a fresh S1.
    #[test]
    fn reset_progress_clears_review_state() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 3);
        repo.record_recalls(
            bank,
            &[(WordId(2), Recall::Correct)],
            TransitionPolicy::ResetOnMiss,
            Day(4),
        )
        .expect("record");

        assert_eq!(repo.reset_progress(bank).expect("reset"), 1);
        let word = repo.word(bank, WordId(2)).expect("word");
        assert_eq!(word.stage, Stage::NEW);
        assert_eq!(word.last_reviewed, None);
    }
}

// =============================================================================
// TIER T2: CHUNKED PERSISTENCE
// =============================================================================

mod t2_chunked_persistence {
    use super::*;
    use lexibank_core::KeyValueStore;

    /// T2.1: Data written through redb survives reopening.
    #[test]
    fn redb_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bank.redb");

        let bank = {
            let mut repo = Repository::with_redb(&path).expect("open");
            seeded(&mut repo, 450)
        };

        let repo = Repository::with_redb(&path).expect("reopen");
        assert!(repo.is_persistent());
        assert_eq!(repo.word_count(bank).expect("count"), 450);
        let words = repo.words(bank).expect("words");
        assert_eq!(words[449].term, "word449");
    }

    /// T2.2: Removing words shrinks the chunk count and drops stale chunks.
    #[test]
    fn removal_drops_stale_chunks() {
        let mut repo = Repository::new().with_chunk_size(10).expect("chunk size");
        let bank = seeded(&mut repo, 25);
        let ids: Vec<WordId> = (6..=25).map(WordId).collect();

        assert_eq!(repo.remove_words(bank, &ids).expect("remove"), 20);

        let prefix = format!("lexibank:bank:{}:words:chunk:", bank.0);
        let chunks = repo.backend().keys_with_prefix(&prefix).expect("scan");
        assert_eq!(chunks.len(), 1);
        assert_eq!(repo.words(bank).expect("words").len(), 5);
    }

    /// T2.3: A missing chunk is reported as corruption, not as fewer words.
    #[test]
    fn missing_chunk_is_corruption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bank.redb");
        let bank = {
            let mut repo = Repository::with_redb(&path)
                .expect("open")
                .with_chunk_size(10)
                .expect("chunk size");
            seeded(&mut repo, 30)
        };

        {
            let mut store = lexibank_core::RedbStore::open(&path).expect("store");
            let key = format!("lexibank:bank:{}:words:chunk:1", bank.0);
            assert!(store.remove(&key).expect("remove"));
        }

        let repo = Repository::with_redb(&path).expect("reopen");
        assert!(matches!(
            repo.words(bank),
            Err(LexiError::CorruptedChunk { .. })
        ));
    }

    /// T2.4: Words at the length limits still store once a bank outgrows
    /// one chunk.
    #[test]
    fn max_length_words_fit_value_limit() {
        use lexibank_core::chunking::read_header;
        use lexibank_core::primitives::{MAX_MEANING_LENGTH, MAX_TERM_LENGTH, MAX_VALUE_BYTES};

        let mut repo = Repository::new();
        let bank = repo.create_bank("Long", Day(1)).expect("bank").id;
        let words: Vec<NewWord> = (0..150)
            .map(|i| {
                let term = format!("{:03}{}", i, "t".repeat(MAX_TERM_LENGTH - 3));
                let fill = if i % 2 == 0 { "m" } else { "\u{1}" };
                NewWord::new(term, fill.repeat(MAX_MEANING_LENGTH))
            })
            .collect();

        let outcome = repo.add_words(bank, &words).expect("add");
        assert_eq!(outcome.added.len(), 150);

        let base = format!("lexibank:bank:{}:words", bank.0);
        let header = read_header(repo.backend(), &base)
            .expect("header")
            .expect("present");
        assert!(header.chunk_count > 1);
        assert_eq!(header.total_count, 150);
        for key in repo.backend().keys_with_prefix(&format!("{}:chunk:", base)).expect("scan") {
            let value = repo.backend().get(&key).expect("get").expect("value");
            assert!(value.len() <= MAX_VALUE_BYTES);
        }

        let stored = repo.words(bank).expect("words");
        assert_eq!(stored.len(), 150);
        assert_eq!(stored[149].meaning, "\u{1}".repeat(MAX_MEANING_LENGTH));
    }
}

// =============================================================================
// TIER T3: SNAPSHOTS & COURSES
// =============================================================================

mod t3_snapshots_and_courses {
    use super::*;
    use lexibank_core::{
        BankSnapshot, Course, CourseId, KeyValueStore, NewCourse, Snapshot, Word, WordBank,
        snapshot_from_bytes, snapshot_to_bytes,
    };

    /// Restoring `snapshot` must fail and leave `repo` as it was.
    fn assert_restore_rejected(repo: &mut Repository, snapshot: &Snapshot) {
        let before = repo.snapshot().expect("snapshot");
        let result = repo.restore(snapshot);
        assert!(
            matches!(result, Err(LexiError::InvalidConfig(_))),
            "unexpected result: {:?}",
            result
        );
        assert_eq!(repo.snapshot().expect("snapshot"), before);
    }

    /// T3.1: A snapshot moves a repository from memory into redb unchanged.
    #[test]
    fn snapshot_moves_between_backends() {
        let mut memory = Repository::new();
        let bank = seeded(&mut memory, 12);
        memory
            .record_recalls(
                bank,
                &[(WordId(3), Recall::Correct)],
                TransitionPolicy::ResetOnMiss,
                Day(9),
            )
            .expect("record");

        let bytes = snapshot_to_bytes(&memory.snapshot().expect("snapshot")).expect("encode");
        let snapshot = snapshot_from_bytes(&bytes).expect("decode");

        let dir = tempfile::tempdir().expect("tempdir");
        let mut disk = Repository::with_redb(dir.path().join("copy.redb")).expect("open");
        disk.restore(&snapshot).expect("restore");

        assert_eq!(disk.snapshot().expect("snapshot"), snapshot);
        assert_eq!(disk.word(bank, WordId(3)).expect("word").stage.value(), 2);
    }

    /// T3.2: A course plan covers every word exactly once as new material.
    #[test]
    fn course_plan_covers_bank() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 23);
        let course = repo
            .create_course(&NewCourse {
                name: "Ten a day".to_string(),
                bank,
                daily_new: 10,
                start: Day(30),
            })
            .expect("course");

        let plan = repo.course_plan(course.id).expect("plan");
        let introduced: usize = plan.days.iter().map(|d| d.new_words.len()).sum();

        assert_eq!(introduced, 23);
        assert_eq!(plan.study_days(), 3);
        assert_eq!(plan.last_day(), Some(Day(47)));
    }

    /// T3.3: Deleting a course leaves its bank alone.
    #[test]
    fn delete_course_keeps_bank() {
        let mut repo = Repository::new();
        let bank = seeded(&mut repo, 3);
        let course = repo
            .create_course(&NewCourse {
                name: "Quick".to_string(),
                bank,
                daily_new: 1,
                start: Day(0),
            })
            .expect("course");

        repo.delete_course(course.id).expect("delete");
        assert!(repo.courses().expect("courses").is_empty());
        assert_eq!(repo.word_count(bank).expect("count"), 3);
        assert!(matches!(
            repo.delete_course(course.id),
            Err(LexiError::CourseNotFound(_))
        ));
    }

    /// T3.4: Two banks sharing an id are refused and leave no orphan chunks.
    #[test]
    fn restore_rejects_duplicate_bank_ids() {
        let mut repo = Repository::new();
        seeded(&mut repo, 4);

        let mut source = Repository::new();
        let bank = seeded(&mut source, 450);
        let mut snapshot = source.snapshot().expect("snapshot");
        snapshot.banks.push(BankSnapshot {
            bank: WordBank::new(bank, "Other", Day(2)),
            words: vec![Word::new(WordId(451), "extra", "one more")],
        });

        assert_restore_rejected(&mut repo, &snapshot);
        let chunks = repo
            .backend()
            .keys_with_prefix(&format!("lexibank:bank:{}:words:chunk:", bank.0))
            .expect("scan");
        assert_eq!(chunks.len(), 1);
    }

    /// T3.5: Bank names that differ only by case are refused.
    #[test]
    fn restore_rejects_case_duplicate_bank_names() {
        let mut repo = Repository::new();
        let mut snapshot = Snapshot::default();
        for (id, name) in [(1, "Animals"), (2, "ANIMALS")] {
            snapshot.banks.push(BankSnapshot {
                bank: WordBank::new(BankId(id), name, Day(1)),
                words: Vec::new(),
            });
        }

        assert_restore_rejected(&mut repo, &snapshot);
    }

    /// T3.6: A course whose bank is absent is refused.
    #[test]
    fn restore_rejects_course_without_bank() {
        let mut repo = Repository::new();
        let mut snapshot = Repository::new().snapshot().expect("snapshot");
        snapshot.courses.push(Course {
            id: CourseId(1),
            name: "Orphan".to_string(),
            bank: BankId(9),
            daily_new: 3,
            start: Day(0),
        });

        assert_restore_rejected(&mut repo, &snapshot);
    }

    /// T3.7: Word ids are global and terms unique per bank, ignoring case.
    #[test]
    fn restore_rejects_duplicate_words() {
        let mut repo = Repository::new();
        let mut source = Repository::new();
        seeded(&mut source, 3);
        let second = source.create_bank("Second", Day(1)).expect("bank").id;
        source
            .add_words(second, &[NewWord::new("uno", "one")])
            .expect("add");
        let snapshot = source.snapshot().expect("snapshot");

        let mut same_id = snapshot.clone();
        same_id.banks[1].words[0].id = same_id.banks[0].words[0].id;
        assert_restore_rejected(&mut repo, &same_id);

        let mut same_term = snapshot.clone();
        same_term.banks[0].words[1].term = "WORD0".to_string();
        assert_restore_rejected(&mut repo, &same_term);

        repo.restore(&snapshot).expect("valid snapshot restores");
        assert_eq!(repo.snapshot().expect("snapshot"), snapshot);
    }
}
