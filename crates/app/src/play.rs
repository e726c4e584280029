use std::fmt::Write as _;

use services::{ActivityInput, LessonOutcome, PuzzleView};

/// One line typed by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayCommand {
    Input(ActivityInput),
    Show,
    Help,
    Quit,
}

pub const PLAY_HELP: &str = "\
commands:
  flip | next | prev            flashcards
  select <item-id>              matching
  answer <text>                 quiz
  place <tile-id> | remove <slot> | check    scramble
  say <transcript> | next | skip             speak-it
  show | help | quit";

/// Parse a command line. `next` means the next card or the next word
/// depending on `speaking`.
pub fn parse_command(line: &str, speaking: bool) -> Result<PlayCommand, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, r)| (v, r.trim()));

    let need_text = |what: &str| {
        if rest.is_empty() {
            Err(format!("`{verb}` needs {what}"))
        } else {
            Ok(rest.to_owned())
        }
    };
    let need_index = |what: &str| {
        rest.parse::<usize>()
            .map_err(|_| format!("`{verb}` needs {what}"))
    };

    let command = match verb {
        "flip" => PlayCommand::Input(ActivityInput::FlipCard),
        "next" if speaking => PlayCommand::Input(ActivityInput::NextWord),
        "next" => PlayCommand::Input(ActivityInput::NextCard),
        "prev" => PlayCommand::Input(ActivityInput::PreviousCard),
        "select" => PlayCommand::Input(ActivityInput::Select {
            item_id: need_text("an item id")?,
        }),
        "answer" => PlayCommand::Input(ActivityInput::Answer {
            choice: need_text("an option")?,
        }),
        "place" => PlayCommand::Input(ActivityInput::PlaceLetter {
            letter_id: need_index("a tile id")?,
        }),
        "remove" => PlayCommand::Input(ActivityInput::RemoveLetter {
            slot: need_index("a slot number")?,
        }),
        "check" => PlayCommand::Input(ActivityInput::CheckWord),
        "say" => PlayCommand::Input(ActivityInput::Transcript {
            text: need_text("a transcript")?,
        }),
        "skip" => PlayCommand::Input(ActivityInput::SkipWord),
        "show" | "" => PlayCommand::Show,
        "help" | "?" => PlayCommand::Help,
        "quit" | "exit" => PlayCommand::Quit,
        other => return Err(format!("unknown command `{other}`")),
    };
    Ok(command)
}

/// Plain-text rendering of a puzzle view.
pub fn render_view(view: &PuzzleView) -> String {
    let mut out = String::new();
    match view {
        PuzzleView::Flashcard {
            position,
            len,
            word,
            flipped,
        } => {
            let _ = writeln!(out, "card {}/{len}", position + 1);
            if *flipped {
                let _ = writeln!(out, "  {}", word.translation);
                if let Some(example) = &word.example_translation {
                    let _ = writeln!(out, "  {example}");
                }
            } else {
                let _ = writeln!(out, "  {}", word.headword);
                if let Some(phonetic) = &word.phonetic {
                    let _ = writeln!(out, "  {phonetic}");
                }
                if let Some(example) = &word.example_sentence {
                    let _ = writeln!(out, "  {example}");
                }
            }
        }
        PuzzleView::Matching {
            source,
            target,
            selected,
            wrong_pair,
            score,
            total,
        } => {
            let _ = writeln!(out, "matched {score}/{total}");
            for (left, right) in source.iter().zip(target) {
                let mark = |id: &str, solved: bool| {
                    if solved {
                        "="
                    } else if selected.as_deref() == Some(id) {
                        ">"
                    } else if wrong_pair
                        .as_ref()
                        .is_some_and(|(a, b)| a == id || b == id)
                    {
                        "x"
                    } else {
                        " "
                    }
                };
                let _ = writeln!(
                    out,
                    "  {} {:<14} {:<20} {} {:<14} {}",
                    mark(&left.id, left.solved),
                    left.id,
                    left.text,
                    mark(&right.id, right.solved),
                    right.id,
                    right.text
                );
            }
        }
        PuzzleView::Quiz {
            position,
            len,
            question,
            score,
            lives,
        } => {
            let _ = writeln!(
                out,
                "question {}/{len}  score {score}  lives {lives}",
                position + 1
            );
            let _ = writeln!(out, "  {}", question.prompt);
            for option in &question.options {
                let _ = writeln!(out, "   - {option}");
            }
        }
        PuzzleView::Scramble {
            position,
            len,
            puzzle,
            wrong,
        } => {
            let _ = writeln!(out, "word {}/{len}", position + 1);
            let _ = writeln!(out, "  slots: {}", puzzle.assembled());
            let tiles: Vec<String> = puzzle
                .letter_pool()
                .iter()
                .map(|l| format!("{}:{}", l.id, l.ch))
                .collect();
            let _ = writeln!(out, "  tiles: {}", tiles.join(" "));
            if *wrong {
                let _ = writeln!(out, "  not quite, keep editing");
            }
        }
        PuzzleView::SpeakIt {
            position,
            len,
            word,
            correct,
            heard,
        } => {
            let _ = writeln!(out, "say {}/{len}: {}", position + 1, word.headword);
            if *correct {
                let _ = writeln!(out, "  correct");
            } else if let Some(heard) = heard {
                let _ = writeln!(out, "  heard \"{heard}\", try again or skip");
            }
        }
        PuzzleView::Finished { kind } => {
            let _ = writeln!(out, "{kind} finished");
        }
    }
    out
}

pub fn render_outcome(outcome: &LessonOutcome) -> String {
    match outcome {
        LessonOutcome::Completed {
            kind,
            score,
            total,
            unlocked,
            topic_completed,
            replay,
            ..
        } => {
            let mut line = format!("{kind} completed: {score}/{total}");
            if *replay {
                line.push_str(" (already completed, progress unchanged)");
            }
            if let Some(next) = unlocked {
                let _ = write!(line, "; unlocked {next}");
            }
            if *topic_completed {
                line.push_str("; topic completed");
            }
            line
        }
        LessonOutcome::Failed { kind, score, total } => {
            format!("{kind} failed: {score}/{total}, progress unchanged")
        }
    }
}
