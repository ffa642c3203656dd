use std::error::Error;
use std::sync::Arc;

use classroom_core::model::{
    AnnotationId, ArticleId, Formatting, IdentityDraft, Question, QuizId, QuizResult,
    ReactionKind, ScrollPosition, SlideId,
};
use services::{
    AppServices, CollaborativeNotes, FlushOutcome, IdentityPrompt, QuestionInput, QuizError,
    QuizPhase, QuizSession, SubmitOutcome,
};

use crate::console::{ConfirmOnConsole, Console};

type CommandResult = Result<(), Box<dyn Error>>;

const QUIZ_HELP: &str = "Answer with a letter (choice) or text (open questions). /n next, /p previous, /s hand in, /q quit";
const NOTES_HELP: &str = "Lines are appended to the note. /save, /bold <from> <to>, /italic <from> <to>, /list <from> <to>, /read <percent>, /show, /q";

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

pub async fn quiz(services: &AppServices, console: &Console, quiz_id: QuizId) -> CommandResult {
    let mut session = services.quiz_session(quiz_id);
    session.load().await?;
    {
        let engine = session.engine();
        let engine = engine.lock().await;
        if let Some(quiz) = engine.quiz() {
            console.say(&format!("{} ({} questions)", quiz.title(), quiz.len())).await?;
            if !quiz.description().is_empty() {
                console.say(quiz.description()).await?;
            }
            if let Some(limit) = quiz.time_limit() {
                console.say(&format!("Time limit: {} minutes", limit / 60)).await?;
            }
        }
    }

    let mut current = services.identity().current().await.map(|identity| {
        IdentityDraft::new(identity.student_name(), identity.class_group())
    });
    loop {
        let Some(draft) = console.identity_draft(current.as_ref()).await else {
            return Ok(());
        };
        match session.begin(draft.clone()).await {
            Ok(()) => break,
            Err(QuizError::Identity(err)) => {
                console.say(&format!("{err}")).await?;
                current = Some(draft);
            }
            Err(err) => return Err(err.into()),
        }
    }
    console.say(QUIZ_HELP).await?;
    run_quiz(&mut session, console).await
}

async fn run_quiz(session: &mut QuizSession, console: &Console) -> CommandResult {
    loop {
        let screen = {
            let engine = session.engine();
            let engine = engine.lock().await;
            if let QuizPhase::Results(result) = engine.phase() {
                console.say("Time is up.").await?;
                return print_result(console, result).await;
            }
            let (Some((index, total)), Some(question)) =
                (engine.position(), engine.current_question())
            else {
                return Ok(());
            };
            let timer = engine
                .countdown()
                .map(|tick| format!(" [{tick}]"))
                .unwrap_or_default();
            render_question(index, total, question, engine.input(), &timer)
        };
        console.say(&screen).await?;

        let Some(line) = console.read_line("> ").await? else {
            return Ok(());
        };
        let engine = session.engine();
        let mut engine = engine.lock().await;
        if let QuizPhase::Results(_) = engine.phase() {
            // the countdown handed in while we were waiting
            continue;
        }
        let outcome = match line.trim() {
            "/q" => return Ok(()),
            "/n" => engine.next(),
            "/p" => engine.prev(),
            "/s" => {
                drop(engine);
                let mut confirm = ConfirmOnConsole(console);
                match session.submit(&mut confirm).await {
                    Ok(SubmitOutcome::Completed(result)) => {
                        return print_result(console, &result).await;
                    }
                    Ok(SubmitOutcome::Declined) => Ok(()),
                    Err(err) => Err(err),
                }
            }
            answer => {
                let input = parse_answer(engine.current_question(), answer);
                engine.set_input(input)
            }
        };
        if let Err(err) = outcome {
            console.say(&format!("! {err}")).await?;
        }
    }
}

fn render_question(
    index: usize,
    total: usize,
    question: &Question,
    input: &QuestionInput,
    timer: &str,
) -> String {
    let mut out = format!(
        "\nQuestion {} of {total}{timer} · {} · {} pt\n{}",
        index + 1,
        question.kind().label(),
        question.points(),
        question.text()
    );
    for (slot, answer) in question.answers().iter().enumerate() {
        let marker = if *input == QuestionInput::Choice(answer.id) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!("\n {marker} {}) {}", letter(slot), answer.text));
    }
    if let QuestionInput::Text(text) = input {
        out.push_str(&format!("\n  your answer: {text}"));
    }
    out
}

fn letter(slot: usize) -> char {
    u8::try_from(slot)
        .ok()
        .and_then(|slot| b'A'.checked_add(slot))
        .map_or('?', char::from)
}

fn parse_answer(question: Option<&Question>, raw: &str) -> QuestionInput {
    let Some(question) = question else {
        return QuestionInput::Empty;
    };
    if question.kind().accepts_text() {
        return QuestionInput::Text(raw.to_owned());
    }
    let picked = raw
        .chars()
        .next()
        .filter(|_| raw.chars().count() == 1)
        .map(|c| c.to_ascii_uppercase())
        .and_then(|c| {
            question
                .answers()
                .iter()
                .enumerate()
                .find(|(slot, _)| letter(*slot) == c)
        });
    match picked {
        Some((_, answer)) => QuestionInput::Choice(answer.id),
        None => QuestionInput::Text(raw.to_owned()),
    }
}

async fn print_result(console: &Console, result: &QuizResult) -> CommandResult {
    console.say(&format!("\nResult: {}", result.summary_line())).await?;
    for outcome in &result.results {
        let mark = if outcome.is_correct { "✓" } else { "✗" };
        let mut line = format!(
            " {mark} question {}: {} pt",
            outcome.question_id, outcome.points_earned
        );
        if let Some(correct) = &outcome.correct_answer {
            line.push_str(&format!(" (answer: {correct})"));
        }
        if !outcome.explanation.is_empty() {
            line.push_str(&format!("\n     {}", outcome.explanation));
        }
        if !outcome.feedback.is_empty() {
            line.push_str(&format!("\n     {}", outcome.feedback));
        }
        console.say(&line).await?;
    }
    Ok(())
}

//
// ─── NOTES ─────────────────────────────────────────────────────────────────────
//

pub async fn notes(
    services: &AppServices,
    console: &Arc<Console>,
    article_id: ArticleId,
) -> CommandResult {
    let prompt: Arc<dyn IdentityPrompt> = console.clone();
    let mut notes = services.notes(article_id.clone()).with_prompt(prompt);
    let loaded = notes.load().await;
    let meter = services.progress(article_id.clone());
    let ticker = meter.spawn_periodic(services.persister_config().flush_interval);
    let interactions = services.interactions(article_id);

    let mut status = notes.subscribe();
    let watcher = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let state = *status.borrow_and_update();
            tracing::info!(status = state.status.label(), version = %state.version, "note");
        }
    });

    if services.identity().current().await.is_none() {
        console
            .say("Reading anonymously; you will be asked for your name and class when you first write.")
            .await?;
    } else if !loaded {
        console.say("The class note could not be loaded; starting empty.").await?;
    }
    show_note(console, &notes).await?;
    console.say(NOTES_HELP).await?;

    while let Some(line) = console.read_line("notes> ").await? {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("/q") => break,
            Some("/show") => {
                console
                    .say(&format!("{} ({})\n{}", notes.version(), notes.status().label(), notes.content()))
                    .await?;
            }
            Some("/read") => {
                match words.next().and_then(|raw| raw.parse::<f64>().ok()) {
                    Some(percent) => {
                        let completion = meter.record_scroll(ScrollPosition {
                            scroll_top: percent,
                            viewport_height: 0.0,
                            document_height: 100.0,
                        });
                        interactions.record_scroll(percent);
                        console.say(&format!("read {}%", completion.rounded())).await?;
                    }
                    None => console.say("! /read needs a percentage").await?,
                }
            }
            Some("/save") => {
                if first_write(services, console, &mut notes).await? {
                    let outcome = notes.save_now().await;
                    console.say(&describe(&outcome)).await?;
                }
            }
            Some(cmd @ ("/bold" | "/italic" | "/list")) => {
                if !first_write(services, console, &mut notes).await? {
                    continue;
                }
                let formatting = match cmd {
                    "/bold" => Formatting::Bold,
                    "/italic" => Formatting::Italic,
                    _ => Formatting::ListItem,
                };
                let range = words
                    .next()
                    .zip(words.next())
                    .and_then(|(from, to)| Some(from.parse::<usize>().ok()?..to.parse::<usize>().ok()?));
                let applied = range.is_some_and(|range| notes.apply_formatting(formatting, range));
                if !applied {
                    console.say("! not a valid range in the note").await?;
                }
            }
            _ => {
                if !first_write(services, console, &mut notes).await? {
                    continue;
                }
                let mut content = notes.content();
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(&line);
                notes.edit(content);
            }
        }
    }

    ticker.stop();
    meter.close().await;
    let outcome = notes.close().await;
    watcher.abort();
    console.say(&describe(&outcome)).await?;
    Ok(())
}

/// Anonymous readers are asked who they are on their first write, then the
/// class note is fetched so the write lands on top of it.
async fn first_write(
    services: &AppServices,
    console: &Console,
    notes: &mut CollaborativeNotes,
) -> Result<bool, Box<dyn Error>> {
    if services.identity().current().await.is_some() {
        return Ok(true);
    }
    if let Err(err) = services.identity().require(console).await {
        console.say(&format!("! {err}")).await?;
        return Ok(false);
    }
    if !notes.load().await {
        console.say("The class note could not be loaded; starting empty.").await?;
    }
    show_note(console, notes).await?;
    Ok(true)
}

async fn show_note(console: &Console, notes: &CollaborativeNotes) -> CommandResult {
    console
        .say(&format!(
            "{} · by {}{}\n{}",
            notes.version(),
            notes.contributors().join(", "),
            if notes.is_locked() { " · locked" } else { "" },
            notes.content()
        ))
        .await?;
    Ok(())
}

fn describe(outcome: &FlushOutcome) -> String {
    match outcome {
        FlushOutcome::Clean => "nothing to save".to_owned(),
        FlushOutcome::Saved(version) => format!("saved as {version}"),
        FlushOutcome::Failed(err) => format!("! save failed: {err}"),
    }
}

//
// ─── LISTINGS ──────────────────────────────────────────────────────────────────
//

pub async fn reactions(
    services: &AppServices,
    console: &Console,
    article_id: ArticleId,
    toggle: Option<ReactionKind>,
) -> CommandResult {
    let mut reactions = services.reactions(article_id.clone());
    reactions.load().await;
    if let Some(kind) = toggle {
        services
            .interactions(article_id)
            .click("reaction-btn")
            .await;
        match reactions.toggle(kind).await {
            Ok(result) => {
                console
                    .say(&format!("{} {:?} ({})", kind.emoji(), result.action, result.count))
                    .await?;
            }
            Err(err) => console.say(&format!("! reaction not saved: {err}")).await?,
        }
    }
    let counts = reactions.counts();
    let line = ReactionKind::ALL
        .iter()
        .map(|kind| format!("{} {}", kind.emoji(), counts.get(*kind)))
        .collect::<Vec<_>>()
        .join("  ");
    console.say(&line).await?;
    Ok(())
}

pub async fn progress(services: &AppServices, console: &Console) -> CommandResult {
    let Some(identity) = services.identity().current().await else {
        console.say("No name and class saved yet; nothing to show.").await?;
        return Ok(());
    };
    let records = services
        .remote()
        .fetch_progress(&identity)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not load reading progress");
            Vec::new()
        });
    if records.is_empty() {
        console.say("No reading progress yet.").await?;
    }
    for record in records {
        console
            .say(&format!(
                "{:>3}%  {:>5}s  {}",
                record.completion.rounded(),
                record.time_spent,
                if record.article_title.is_empty() {
                    record.article_id.as_str()
                } else {
                    record.article_title.as_str()
                }
            ))
            .await?;
    }
    Ok(())
}

pub async fn annotations(
    services: &AppServices,
    console: &Console,
    slide: SlideId,
    like: Option<AnnotationId>,
) -> CommandResult {
    let mut board = services.annotations(slide);
    board.load().await;
    if let Some(id) = like {
        match board.like(id).await {
            Ok(likes) => console.say(&format!("annotation {id}: {likes} likes")).await?,
            Err(err) => console.say(&format!("! like not saved: {err}")).await?,
        }
    }
    for annotation in board.annotations() {
        console
            .say(&format!(
                "#{} {}: {} (♥ {}, {} replies)",
                annotation.id,
                annotation.student_name,
                annotation.note,
                annotation.likes_count,
                annotation.replies_count
            ))
            .await?;
    }
    Ok(())
}

pub async fn glossary(services: &AppServices, console: &Console, search: Option<String>) -> CommandResult {
    let terms = services.remote().glossary_terms().await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not load glossary");
        Vec::new()
    });
    if terms.is_empty() {
        console.say("The glossary is empty or unavailable.").await?;
    }
    for term in terms
        .iter()
        .filter(|term| search.as_deref().is_none_or(|word| term.matches(word)))
    {
        console.say(&format!("{}: {}", term.term, term.definition)).await?;
    }
    Ok(())
}

pub async fn timeline(services: &AppServices, console: &Console) -> CommandResult {
    let mut events = services.remote().timeline_events().await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not load timeline");
        Vec::new()
    });
    if events.is_empty() {
        console.say("The timeline is empty or unavailable.").await?;
    }
    events.sort_by_key(|event| event.date);
    for event in events {
        let stars = "*".repeat(usize::from(event.importance.min(5)));
        console
            .say(&format!("{}  {stars:<5} {}", event.date, event.title))
            .await?;
        if !event.short_description.is_empty() {
            console.say(&format!("            {}", event.short_description)).await?;
        }
    }
    Ok(())
}

pub async fn logout(services: &AppServices, console: &Console) -> CommandResult {
    match services.identity().current().await {
        Some(identity) => {
            services.identity().forget().await?;
            console
                .say(&format!(
                    "Forgot {} ({}).",
                    identity.student_name(),
                    identity.class_group()
                ))
                .await?;
        }
        None => console.say("No name and class saved.").await?,
    }
    Ok(())
}
