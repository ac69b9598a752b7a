use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use directories::ProjectDirs;
use quiz_core::{QuizSettings, QuizSettingsDraft};
use services::QuizService;
use storage::sqlite::SqliteStore;
use storage::{JsonFileSource, QuestionSource, StaticSource};

/// Global options shared by every subcommand.
pub struct Context {
    pub bank: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
}

pub struct PlayOptions {
    pub areas: Vec<String>,
    pub boost: Option<f64>,
    pub count: usize,
    pub extra: Option<PathBuf>,
}

impl Context {
    fn settings(&self) -> Result<QuizSettings> {
        let Some(path) = &self.config else {
            return Ok(QuizSettings::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let draft: QuizSettingsDraft = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(draft.validate()?)
    }

    fn db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db {
            return Ok(path.clone());
        }
        match ProjectDirs::from("", "", "quiz") {
            Some(dirs) => Ok(dirs.data_local_dir().join("quiz.db")),
            None => bail!("cannot determine a data directory; pass --db"),
        }
    }

    /// Service with restored progress and no bank.
    fn open(&self) -> Result<QuizService> {
        let path = self.db_path()?;
        let store = SqliteStore::open(&path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        let service = QuizService::new(self.settings()?, Arc::new(store));
        Ok(match self.seed {
            Some(seed) => service.with_seed(seed),
            None => service,
        })
    }

    /// Service with restored progress and a loaded bank.
    fn bootstrap(&self) -> Result<QuizService> {
        let mut service = self.open()?;
        let source: Box<dyn QuestionSource> = match &self.bank {
            Some(path) => Box::new(JsonFileSource::new(path)),
            None => Box::new(StaticSource::default()),
        };
        service.load_questions(source.as_ref()).with_context(|| {
            if self.bank.is_some() {
                "failed to load the question bank".to_owned()
            } else {
                "no cached question bank; pass --bank <FILE>".to_owned()
            }
        })?;
        Ok(service)
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn summary(ctx: &Context) -> Result<()> {
    let service = ctx.bootstrap()?;
    let summary = service.summary();

    println!("questions: {}", summary.question_count);
    println!(
        "viewed:    {} ({})",
        summary.viewed_count,
        percent(summary.viewed_ratio)
    );
    println!(
        "incorrect: {} ({})",
        summary.incorrect_count,
        percent(summary.incorrect_ratio)
    );

    let width = summary
        .areas
        .iter()
        .map(|a| a.area.chars().count())
        .max()
        .unwrap_or(0);
    for area in &summary.areas {
        let average = area
            .average
            .map_or_else(|| "-".to_owned(), |avg| format!("{avg:.2}"));
        println!(
            "  {:<width$}  avg {:>4}  viewed {}/{}",
            area.area, average, area.viewed, area.total
        );
    }
    Ok(())
}

pub fn areas(ctx: &Context) -> Result<()> {
    let service = ctx.bootstrap()?;
    for area in service.areas() {
        println!("{area} ({})", service.bank().count_for_area(area));
    }
    Ok(())
}

fn parse_answer(line: &str) -> Option<Option<bool>> {
    match line.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" => Some(Some(true)),
        "f" | "false" | "n" | "no" => Some(Some(false)),
        "q" | "quit" => Some(None),
        _ => None,
    }
}

/// Run an interactive session reading answers from `input`.
///
/// Stops after `count` questions, on `q`, or at end of input.
pub fn play<R: BufRead, W: Write>(
    ctx: &Context,
    options: &PlayOptions,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let mut service = ctx.bootstrap()?;
    if let Some(path) = &options.extra {
        let extra = JsonFileSource::new(path).fetch()?;
        let added = service.add_extra_questions(extra);
        writeln!(out, "added {added} extra questions")?;
    }

    let areas: Vec<String> = if options.areas.is_empty() {
        service.areas().to_vec()
    } else {
        options.areas.clone()
    };

    let mut answered = 0;
    let mut correct = 0;
    'session: for round in 1..=options.count {
        let selection = service.next_question(&areas, options.boost)?;
        let question = &selection.question;
        writeln!(
            out,
            "[{round}/{}] {}: {}",
            options.count,
            question.area(),
            question.text()
        )?;

        let answer = loop {
            write!(out, "true or false? [t/f/q] ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break 'session;
            }
            match parse_answer(&line) {
                Some(Some(answer)) => break answer,
                Some(None) => break 'session,
                None => writeln!(out, "please answer t or f")?,
            }
        };

        let outcome = service.answer(question, answer);
        answered += 1;
        if outcome.record.correct {
            correct += 1;
            writeln!(out, "correct")?;
        } else {
            writeln!(out, "wrong: the statement is {}", question.is_true())?;
        }
    }

    writeln!(out, "score: {correct}/{answered}")?;
    Ok(())
}

pub fn reset(ctx: &Context) -> Result<()> {
    let mut service = ctx.open()?;
    if !service.reset() {
        bail!("progress was cleared in memory but could not be saved");
    }
    println!("progress reset");
    Ok(())
}

pub fn clear_cache(ctx: &Context) -> Result<()> {
    ctx.open()?.clear_cached_questions()?;
    println!("question cache cleared");
    Ok(())
}

pub fn add(ctx: &Context, file: &Path) -> Result<()> {
    let mut service = ctx.bootstrap()?;
    let extra = JsonFileSource::new(file).fetch()?;
    let offered = extra.len();
    let added = service.add_extra_questions(extra);
    println!("{added} of {offered} questions are new");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const BANK: &str = r#"[
        {"area": "Physics", "text": "Light travels faster than sound", "true": true},
        {"area": "Biology", "text": "Spiders are insects", "true": false}
    ]"#;

    fn context(dir: &TempDir) -> Context {
        let bank = dir.path().join("bank.json");
        fs::write(&bank, BANK).unwrap();
        Context {
            bank: Some(bank),
            db: Some(dir.path().join("quiz.db")),
            config: None,
            seed: Some(7),
        }
    }

    fn options(count: usize) -> PlayOptions {
        PlayOptions {
            areas: Vec::new(),
            boost: None,
            count,
            extra: None,
        }
    }

    #[test]
    fn parse_answer_accepts_short_and_long_forms() {
        assert_eq!(parse_answer("t\n"), Some(Some(true)));
        assert_eq!(parse_answer(" FALSE "), Some(Some(false)));
        assert_eq!(parse_answer("q"), Some(None));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[test]
    fn play_records_answers_and_reports_score() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();

        play(&ctx, &options(2), &mut Cursor::new("x\nt\nt\n"), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("please answer t or f"));
        assert!(text.contains("/2\n"));
        assert!(ctx.bootstrap().unwrap().progress().viewed_count() >= 1);
    }

    #[test]
    fn play_stops_at_end_of_input() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut out = Vec::new();

        play(&ctx, &options(5), &mut Cursor::new("f\n"), &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("/1\n"));
    }

    #[test]
    fn config_file_is_validated() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let config = dir.path().join("settings.json");
        fs::write(&config, r#"{"smoothing": 2.0}"#).unwrap();
        ctx.config = Some(config);

        assert!(ctx.settings().is_err());
    }

    #[test]
    fn bootstrap_without_bank_or_cache_explains_itself() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.bank = None;

        let err = ctx.bootstrap().err().unwrap();
        assert!(format!("{err:#}").contains("--bank"));
    }
}
