mod common;

use std::sync::Arc;

use chrono::Duration;
use lesson_core::model::{ActivityKind, TopicStatus, TransitionError};
use lesson_core::time::fixed_now;
use services::{
    ActivityInput, ActivityUpdate, LessonOutcome, PuzzleView, RecordedSpeech, SessionError,
    SessionOrchestrator,
};

use common::{chapter, orchestrator, seeded_store, topic, user};

async fn start(orch: &mut SessionOrchestrator, topic_id: &str, kind: ActivityKind) -> PuzzleView {
    orch.start_activity(&user(), &chapter(), &topic(topic_id), kind)
        .await
        .unwrap()
}

async fn send(orch: &mut SessionOrchestrator, input: ActivityInput) -> ActivityUpdate {
    orch.submit(input, fixed_now()).await.unwrap()
}

async fn finish_flashcards(orch: &mut SessionOrchestrator) -> LessonOutcome {
    loop {
        if let Some(outcome) = send(orch, ActivityInput::NextCard).await.outcome {
            return outcome;
        }
    }
}

async fn finish_matching(orch: &mut SessionOrchestrator) -> LessonOutcome {
    let Some(PuzzleView::Matching { source, target, .. }) = orch.current_puzzle_state() else {
        panic!("matching not running");
    };
    let mut last = None;
    for item in &source {
        let partner = target.iter().find(|t| t.pair_key == item.pair_key).unwrap();
        send(orch, ActivityInput::Select { item_id: item.id.clone() }).await;
        last = send(
            orch,
            ActivityInput::Select {
                item_id: partner.id.clone(),
            },
        )
        .await
        .outcome;
    }
    last.expect("matching finished")
}

async fn finish_quiz(orch: &mut SessionOrchestrator) -> LessonOutcome {
    loop {
        let Some(PuzzleView::Quiz { question, .. }) = orch.current_puzzle_state() else {
            panic!("quiz not running");
        };
        let update = send(
            orch,
            ActivityInput::Answer {
                choice: question.correct_answer,
            },
        )
        .await;
        if let Some(outcome) = update.outcome {
            return outcome;
        }
    }
}

async fn answer_quiz_wrong(orch: &mut SessionOrchestrator) -> ActivityUpdate {
    let Some(PuzzleView::Quiz { question, .. }) = orch.current_puzzle_state() else {
        panic!("quiz not running");
    };
    let wrong = question
        .options
        .iter()
        .find(|o| **o != question.correct_answer)
        .unwrap()
        .clone();
    send(orch, ActivityInput::Answer { choice: wrong }).await
}

async fn finish_scramble(orch: &mut SessionOrchestrator) -> LessonOutcome {
    loop {
        let Some(PuzzleView::Scramble { puzzle, .. }) = orch.current_puzzle_state() else {
            panic!("scramble not running");
        };
        for ch in puzzle.target_word().chars() {
            let Some(PuzzleView::Scramble { puzzle, .. }) = orch.current_puzzle_state() else {
                panic!("scramble not running");
            };
            let letter = puzzle.letter_pool().iter().find(|l| l.ch == ch).unwrap().id;
            send(orch, ActivityInput::PlaceLetter { letter_id: letter }).await;
        }
        if let Some(outcome) = send(orch, ActivityInput::CheckWord).await.outcome {
            return outcome;
        }
    }
}

async fn finish_speaking(orch: &mut SessionOrchestrator) -> LessonOutcome {
    loop {
        let Some(PuzzleView::SpeakIt { word, .. }) = orch.current_puzzle_state() else {
            panic!("speak-it not running");
        };
        send(
            orch,
            ActivityInput::Transcript {
                text: format!("I said {}", word.headword.to_lowercase()),
            },
        )
        .await;
        if let Some(outcome) = send(orch, ActivityInput::NextWord).await.outcome {
            return outcome;
        }
    }
}

fn completed(outcome: &LessonOutcome) -> (ActivityKind, u32, u32, bool) {
    match outcome {
        LessonOutcome::Completed {
            kind,
            score,
            total,
            replay,
            ..
        } => (*kind, *score, *total, *replay),
        LessonOutcome::Failed { .. } => panic!("expected completion, got {outcome:?}"),
    }
}

#[tokio::test]
async fn flashcard_completion_unlocks_matching_only() {
    let store = seeded_store().await;
    let speech = Arc::new(RecordedSpeech::new());
    let mut orch = orchestrator(Arc::new(store), Arc::clone(&speech));

    let view = start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    assert!(matches!(view, PuzzleView::Flashcard { position: 0, len: 6, .. }));

    let outcome = finish_flashcards(&mut orch).await;
    assert_eq!(completed(&outcome), (ActivityKind::Flashcard, 6, 6, false));
    assert!(orch.current_puzzle_state().is_none());

    let progress = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();
    assert!(progress.is_unlocked(ActivityKind::Matching));
    for kind in [ActivityKind::Quiz, ActivityKind::Scrambled, ActivityKind::SpeakIt] {
        assert!(!progress.is_unlocked(kind));
    }
    assert_eq!(
        speech.spoken(),
        vec!["Hello", "Apple", "Water", "Book", "School", "Friend"]
    );
}

#[tokio::test]
async fn replaying_a_completed_activity_changes_nothing() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));

    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    finish_flashcards(&mut orch).await;
    let before = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();

    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    let outcome = finish_flashcards(&mut orch).await;
    assert_eq!(completed(&outcome), (ActivityKind::Flashcard, 6, 6, true));
    let LessonOutcome::Completed { progress, .. } = outcome else {
        unreachable!();
    };
    assert_eq!(progress, before);
}

#[tokio::test]
async fn locked_activities_cannot_start() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));

    let err = orch
        .start_activity(&user(), &chapter(), &topic("greetings"), ActivityKind::Quiz)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition(TransitionError::Locked {
            kind: ActivityKind::Quiz
        })
    ));

    let err = orch
        .start_activity(&user(), &chapter(), &topic("family"), ActivityKind::Flashcard)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition(TransitionError::TopicLocked)
    ));
}

#[tokio::test]
async fn inputs_for_another_activity_are_rejected() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));

    let err = orch
        .submit(ActivityInput::CheckWord, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NoActiveActivity));

    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    let err = orch
        .submit(ActivityInput::CheckWord, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InputMismatch {
            active: ActivityKind::Flashcard,
            input: "check_word"
        }
    ));
    // the activity keeps running
    assert!(matches!(
        orch.current_puzzle_state(),
        Some(PuzzleView::Flashcard { .. })
    ));
}

#[tokio::test]
async fn matching_round_scores_full_and_flashes_wrong_pairs() {
    let store = seeded_store().await;
    let speech = Arc::new(RecordedSpeech::new());
    let mut orch = orchestrator(Arc::new(store), Arc::clone(&speech));
    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    finish_flashcards(&mut orch).await;

    let view = start(&mut orch, "greetings", ActivityKind::Matching).await;
    let PuzzleView::Matching {
        source,
        target,
        total,
        ..
    } = view
    else {
        panic!("expected matching view");
    };
    assert_eq!(total, 5);
    assert_eq!(source.len(), 5);
    assert_eq!(target.len(), 5);

    // a wrong pair is flagged until the flash expires
    let wrong = target
        .iter()
        .find(|t| t.pair_key != source[0].pair_key)
        .unwrap();
    send(&mut orch, ActivityInput::Select { item_id: source[0].id.clone() }).await;
    let update = send(&mut orch, ActivityInput::Select { item_id: wrong.id.clone() }).await;
    assert!(matches!(
        update.view,
        PuzzleView::Matching {
            wrong_pair: Some(_),
            score: 0,
            ..
        }
    ));
    assert!(orch.tick(fixed_now()).is_none());
    let cleared = orch.tick(fixed_now() + Duration::milliseconds(800)).unwrap();
    assert!(matches!(
        cleared,
        PuzzleView::Matching {
            wrong_pair: None,
            selected: None,
            ..
        }
    ));
    assert!(speech.spoken().contains(&source[0].text));

    let outcome = finish_matching(&mut orch).await;
    assert_eq!(completed(&outcome), (ActivityKind::Matching, 5, 5, false));
}

#[tokio::test]
async fn quiz_failure_does_not_unlock_scrambled() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));
    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    finish_flashcards(&mut orch).await;
    start(&mut orch, "greetings", ActivityKind::Matching).await;
    finish_matching(&mut orch).await;

    let view = start(&mut orch, "greetings", ActivityKind::Quiz).await;
    assert!(matches!(view, PuzzleView::Quiz { lives: 3, len: 6, .. }));

    answer_quiz_wrong(&mut orch).await;
    let update = answer_quiz_wrong(&mut orch).await;
    assert!(matches!(update.view, PuzzleView::Quiz { lives: 1, position: 2, .. }));
    assert!(update.outcome.is_none());
    let progress = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();
    assert!(!progress.is_completed(ActivityKind::Quiz));

    let update = answer_quiz_wrong(&mut orch).await;
    assert_eq!(
        update.outcome,
        Some(LessonOutcome::Failed {
            kind: ActivityKind::Quiz,
            score: 0,
            total: 6
        })
    );
    assert!(orch.current_puzzle_state().is_none());
    let progress = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();
    assert!(!progress.is_unlocked(ActivityKind::Scrambled));
}

#[tokio::test]
async fn full_topic_run_unlocks_next_topic() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store.clone()), Arc::new(RecordedSpeech::new()));

    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    finish_flashcards(&mut orch).await;
    start(&mut orch, "greetings", ActivityKind::Matching).await;
    finish_matching(&mut orch).await;

    start(&mut orch, "greetings", ActivityKind::Quiz).await;
    answer_quiz_wrong(&mut orch).await;
    let outcome = finish_quiz(&mut orch).await;
    assert_eq!(completed(&outcome), (ActivityKind::Quiz, 5, 6, false));

    let view = start(&mut orch, "greetings", ActivityKind::Scrambled).await;
    let PuzzleView::Scramble { puzzle, .. } = view else {
        panic!("expected scramble view");
    };
    assert_eq!(puzzle.target_word(), "HELLO");
    let outcome = finish_scramble(&mut orch).await;
    assert_eq!(completed(&outcome), (ActivityKind::Scrambled, 6, 6, false));

    start(&mut orch, "greetings", ActivityKind::SpeakIt).await;
    let outcome = finish_speaking(&mut orch).await;
    let LessonOutcome::Completed {
        topic_completed,
        progress,
        ..
    } = &outcome
    else {
        panic!("expected completion");
    };
    assert!(*topic_completed);
    assert_eq!(progress.status(), TopicStatus::Completed);

    // a fresh session sees the next topic open
    let mut fresh = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));
    let next = fresh
        .progress_snapshot(&user(), &chapter(), &topic("family"))
        .await
        .unwrap();
    assert_eq!(next.status(), TopicStatus::Unlocked);
    assert!(next.is_unlocked(ActivityKind::Flashcard));
    start(&mut fresh, "family", ActivityKind::Flashcard).await;
}

#[tokio::test]
async fn abandoning_persists_nothing() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));

    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    send(&mut orch, ActivityInput::NextCard).await;
    assert_eq!(orch.abandon(), Some(ActivityKind::Flashcard));
    assert_eq!(orch.abandon(), None);

    let progress = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();
    assert!(!progress.is_completed(ActivityKind::Flashcard));
}

#[tokio::test]
async fn speak_it_requires_a_matching_transcript() {
    let store = seeded_store().await;
    let mut orch = orchestrator(Arc::new(store), Arc::new(RecordedSpeech::new()));
    start(&mut orch, "greetings", ActivityKind::Flashcard).await;
    finish_flashcards(&mut orch).await;
    start(&mut orch, "greetings", ActivityKind::Matching).await;
    finish_matching(&mut orch).await;
    start(&mut orch, "greetings", ActivityKind::Quiz).await;
    finish_quiz(&mut orch).await;
    start(&mut orch, "greetings", ActivityKind::Scrambled).await;
    finish_scramble(&mut orch).await;

    start(&mut orch, "greetings", ActivityKind::SpeakIt).await;
    let update = send(
        &mut orch,
        ActivityInput::Transcript {
            text: "yellow".into(),
        },
    )
    .await;
    assert!(matches!(
        update.view,
        PuzzleView::SpeakIt {
            correct: false,
            heard: Some(_),
            position: 0,
            ..
        }
    ));
    let update = send(&mut orch, ActivityInput::NextWord).await;
    assert!(matches!(update.view, PuzzleView::SpeakIt { position: 0, .. }));

    let update = send(&mut orch, ActivityInput::SkipWord).await;
    assert!(matches!(update.view, PuzzleView::SpeakIt { position: 1, .. }));
}
