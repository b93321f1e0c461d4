mod achievements;
mod challenge;
mod clock;
mod cork;
mod db;
mod engine;
mod error;
mod level;
mod library;
mod model;
mod output;
mod profile;
mod progress;
mod streak;

use crate::clock::{date_of, resolve_now};
use crate::db::{read_db, resolve_db_path, update_db};
use crate::engine::{apply_event, Effect, Event};
use crate::error::CliError;
use crate::library::{list_books, make_book, next_book_id, select_book_index};
use crate::model::{Book, BookStatus, CorkItem};
use crate::output::{render_progress_bar, render_simple_table, Styler};
use crate::profile::build_summary;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum StatusArg {
    ToRead,
    Reading,
    Finished,
    Abandoned,
}

impl StatusArg {
    fn to_status(self) -> BookStatus {
        match self {
            StatusArg::ToRead => BookStatus::ToRead,
            StatusArg::Reading => BookStatus::Reading,
            StatusArg::Finished => BookStatus::Finished,
            StatusArg::Abandoned => BookStatus::Abandoned,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "shelf", version, about = "Local reading tracker with XP, streaks, and achievements")]
struct Cli {
    /// Overrides the DB path for this invocation.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Adds a book to the library.
    Add(AddArgs),
    List(ListArgs),
    Show(SelectorArgs),
    Remove(SelectorArgs),
    /// Records reading progress on a book and applies XP, streak,
    /// challenge, and achievement rules.
    Progress(ProgressArgs),
    /// Publishes a review for a book (finishes it, one review per book).
    Review(ReviewArgs),
    Cork(CorkArgs),
    /// Shows the gamification profile: level, streaks, goals, challenge.
    Profile(ProfileArgs),
    Achievements,
    /// Sets the monthly finished-books goal.
    Goal(GoalArgs),
}

#[derive(Args, Debug)]
struct AddArgs {
    title: String,

    #[arg(long)]
    author: String,

    /// Total pages, >= 1
    #[arg(long)]
    pages: u32,

    #[arg(long)]
    genre: Option<String>,

    /// RFC3339 with offset (no implicit system clock)
    #[arg(long)]
    ts: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Book selector: exact id (b0001) or unique title prefix (case-insensitive)
    book: String,
}

#[derive(Args, Debug)]
struct ProgressArgs {
    /// Book selector: exact id (b0001) or unique title prefix (case-insensitive)
    book: String,

    /// Absolute page position. Out-of-range values are clamped. Defaults
    /// to the book's current page.
    #[arg(long)]
    page: Option<i64>,

    /// Defaults to the book's current status.
    #[arg(long, value_enum)]
    status: Option<StatusArg>,

    /// RFC3339 with offset (no implicit system clock)
    #[arg(long)]
    ts: Option<String>,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Book selector: exact id (b0001) or unique title prefix (case-insensitive)
    book: String,

    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: u8,

    #[arg(long)]
    text: String,

    /// RFC3339 with offset (no implicit system clock)
    #[arg(long)]
    ts: Option<String>,
}

#[derive(Args, Debug)]
struct CorkArgs {
    #[command(subcommand)]
    command: CorkCommand,
}

#[derive(Subcommand, Debug)]
enum CorkCommand {
    /// Uploads an illustration to the cork board.
    Upload(CorkUploadArgs),
    /// Toggles an item in the favorites set.
    Favorite(CorkFavoriteArgs),
    List(CorkListArgs),
}

#[derive(Args, Debug)]
struct CorkUploadArgs {
    #[arg(long)]
    image: String,

    #[arg(long = "book-title")]
    book_title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated tags
    #[arg(long)]
    tags: Option<String>,

    /// RFC3339 with offset (no implicit system clock)
    #[arg(long)]
    ts: Option<String>,
}

#[derive(Args, Debug)]
struct CorkFavoriteArgs {
    /// Cork item id (own uploads or anyone else's)
    item: String,
}

#[derive(Args, Debug)]
struct CorkListArgs {
    /// Only items in the favorites set
    #[arg(long)]
    favorites: bool,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// RFC3339 with offset; pins "this month" and challenge expiry
    #[arg(long)]
    ts: Option<String>,
}

#[derive(Args, Debug)]
struct GoalArgs {
    /// Books per month, >= 1
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    monthly: u32,
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code
        }
    };

    std::process::exit(exit);
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SHELF_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(obj).map_err(|_| CliError::io("DB IO error"))?;
    println!("{}", s);
    Ok(())
}

fn resolve_color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    true
}

fn print_effects(styler: &Styler, effects: &[Effect]) {
    for e in effects.iter() {
        match e {
            Effect::LevelUp { new_level } => {
                print_line(&styler.yellow(&format!("Level up! You are now level {}", new_level)));
            }
            Effect::AchievementUnlocked { id } => {
                let label = match achievements::find_def(id) {
                    Some(def) => format!("{} {} ({})", def.icon, def.title, def.id),
                    None => id.clone(),
                };
                print_line(&styler.green(&format!("Achievement unlocked: {}", label)));
            }
        }
    }
}

fn book_progress_label(book: &Book) -> String {
    format!(
        "{} ({}) {}/{} [{}]",
        book.title,
        book.id,
        book.current_page,
        book.total_pages,
        book.status.as_str()
    )
}

fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = resolve_db_path(cli.db.as_deref())?;
    let styler = Styler::new(resolve_color_enabled(cli.no_color));

    match cli.command {
        Command::Add(args) => {
            let now = resolve_now(args.ts.as_deref())?;
            let today = date_of(now);

            let created = update_db(&db_path, now, |db| {
                let title = args.title.trim();
                let duplicate = db
                    .profile
                    .books
                    .iter()
                    .any(|b| b.title.eq_ignore_ascii_case(title));
                if duplicate {
                    return Err(CliError::conflict(format!(
                        "Already in library: {}",
                        title
                    )));
                }

                let id = next_book_id(db);
                let book = make_book(
                    id,
                    &args.title,
                    &args.author,
                    args.pages,
                    args.genre.as_deref(),
                    today,
                )?;
                db.profile.books.push(book.clone());
                Ok(book)
            })?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    book: Book,
                }
                print_json(&Out { book: created })?;
            } else {
                print_line(&format!(
                    "Added: {} by {} ({}, {} pages)",
                    created.title, created.author, created.id, created.total_pages
                ));
            }

            Ok(())
        }

        Command::List(args) => {
            let now = resolve_now(None)?;
            let db = read_db(&db_path, now)?;
            let books = list_books(&db.profile, args.status.map(StatusArg::to_status));

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    books: Vec<Book>,
                }
                print_json(&Out { books })?;
            } else if books.is_empty() {
                print_line(&styler.gray("(library is empty)"));
            } else {
                let rows: Vec<Vec<String>> = books
                    .iter()
                    .map(|b| {
                        vec![
                            b.id.clone(),
                            b.title.clone(),
                            b.author.clone(),
                            format!("{}/{}", b.current_page, b.total_pages),
                            b.status.as_str().to_string(),
                            b.genre.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();

                print_line(&render_simple_table(
                    &["id", "title", "author", "pages", "status", "genre"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Show(args) => {
            let now = resolve_now(None)?;
            let db = read_db(&db_path, now)?;
            let idx = select_book_index(&db.profile, &args.book)?;
            let book = db.profile.books[idx].clone();

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    book: Book,
                }
                print_json(&Out { book })?;
            } else {
                print_line(&format!("{} by {} ({})", book.title, book.author, book.id));
                print_line(&format!(
                    "pages: {}/{}",
                    book.current_page, book.total_pages
                ));
                print_line(&format!("status: {}", book.status.as_str()));
                if let Some(g) = book.genre.as_deref() {
                    print_line(&format!("genre: {}", g));
                }
                print_line(&format!("added: {}", book.added_date));
                if let Some(ts) = book.started_at {
                    print_line(&format!("started: {}", ts.to_rfc3339()));
                }
                if let Some(ts) = book.finished_at {
                    print_line(&format!("finished: {}", ts.to_rfc3339()));
                }
                if let Some(r) = book.rating {
                    print_line(&format!("rating: {}/5", r));
                }
                if let Some(rv) = book.review.as_deref() {
                    print_line(&format!("review: {}", rv));
                }
            }

            Ok(())
        }

        Command::Remove(args) => {
            let now = resolve_now(None)?;
            let removed = update_db(&db_path, now, |db| {
                let idx = select_book_index(&db.profile, &args.book)?;
                Ok(db.profile.books.remove(idx))
            })?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    removed: Book,
                }
                print_json(&Out { removed })?;
            } else {
                print_line(&format!("Removed: {} ({})", removed.title, removed.id));
            }

            Ok(())
        }

        Command::Progress(args) => {
            let now = resolve_now(args.ts.as_deref())?;

            struct OutRow {
                book: Book,
                xp: u64,
                level: u32,
                effects: Vec<Effect>,
            }

            let out = update_db(&db_path, now, |db| {
                let idx = select_book_index(&db.profile, &args.book)?;
                let target = &db.profile.books[idx];
                let event = Event::PageUpdate {
                    book_id: target.id.clone(),
                    page: args.page.unwrap_or(target.current_page as i64),
                    status: args
                        .status
                        .map(StatusArg::to_status)
                        .unwrap_or(target.status),
                };

                let (updated, effects) = apply_event(&db.profile, event, now)?;
                db.profile = updated;

                Ok(OutRow {
                    book: db.profile.books[idx].clone(),
                    xp: db.profile.xp,
                    level: db.profile.level,
                    effects,
                })
            })?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    book: Book,
                    xp: u64,
                    level: u32,
                    effects: Vec<Effect>,
                }
                print_json(&Out {
                    book: out.book,
                    xp: out.xp,
                    level: out.level,
                    effects: out.effects,
                })?;
            } else {
                print_line(&format!("Progress: {}", book_progress_label(&out.book)));
                print_effects(&styler, &out.effects);
            }

            Ok(())
        }

        Command::Review(args) => {
            let now = resolve_now(args.ts.as_deref())?;

            struct OutRow {
                book: Book,
                xp: u64,
                level: u32,
                effects: Vec<Effect>,
            }

            let out = update_db(&db_path, now, |db| {
                let idx = select_book_index(&db.profile, &args.book)?;
                let event = Event::ReviewPublished {
                    book_id: db.profile.books[idx].id.clone(),
                    rating: args.rating,
                    text: args.text.clone(),
                };

                let (updated, effects) = apply_event(&db.profile, event, now)?;
                db.profile = updated;

                Ok(OutRow {
                    book: db.profile.books[idx].clone(),
                    xp: db.profile.xp,
                    level: db.profile.level,
                    effects,
                })
            })?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    book: Book,
                    xp: u64,
                    level: u32,
                    effects: Vec<Effect>,
                }
                print_json(&Out {
                    book: out.book,
                    xp: out.xp,
                    level: out.level,
                    effects: out.effects,
                })?;
            } else {
                print_line(&format!(
                    "Review published: {} ({}) {}/5",
                    out.book.title,
                    out.book.id,
                    out.book.rating.unwrap_or(0)
                ));
                print_effects(&styler, &out.effects);
            }

            Ok(())
        }

        Command::Cork(args) => match args.command {
            CorkCommand::Upload(a) => {
                let now = resolve_now(a.ts.as_deref())?;

                struct OutRow {
                    item: CorkItem,
                    xp: u64,
                    level: u32,
                    effects: Vec<Effect>,
                }

                let out = update_db(&db_path, now, |db| {
                    let id = cork::next_cork_id(db);
                    let item = cork::make_cork_item(
                        id,
                        &a.image,
                        &db.profile.username,
                        a.book_title.as_deref(),
                        a.description.as_deref(),
                        a.tags.as_deref(),
                        now,
                    )?;

                    let (updated, effects) =
                        apply_event(&db.profile, Event::CorkUploaded { item: item.clone() }, now)?;
                    db.profile = updated;

                    Ok(OutRow {
                        item,
                        xp: db.profile.xp,
                        level: db.profile.level,
                        effects,
                    })
                })?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        item: CorkItem,
                        xp: u64,
                        level: u32,
                        effects: Vec<Effect>,
                    }
                    print_json(&Out {
                        item: out.item,
                        xp: out.xp,
                        level: out.level,
                        effects: out.effects,
                    })?;
                } else {
                    print_line(&format!("Uploaded: {} ({})", out.item.image_url, out.item.id));
                    print_effects(&styler, &out.effects);
                }

                Ok(())
            }

            CorkCommand::Favorite(a) => {
                let now = resolve_now(None)?;

                struct OutRow {
                    favorited: bool,
                    favorites: Vec<String>,
                    effects: Vec<Effect>,
                }

                let out = update_db(&db_path, now, |db| {
                    let (updated, effects) = apply_event(
                        &db.profile,
                        Event::CorkFavoriteToggled {
                            item_id: a.item.clone(),
                        },
                        now,
                    )?;
                    db.profile = updated;

                    Ok(OutRow {
                        favorited: db.profile.cork_favorites.contains(&a.item),
                        favorites: db.profile.cork_favorites.clone(),
                        effects,
                    })
                })?;

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        item: String,
                        favorited: bool,
                        favorites: Vec<String>,
                        effects: Vec<Effect>,
                    }
                    print_json(&Out {
                        item: a.item,
                        favorited: out.favorited,
                        favorites: out.favorites,
                        effects: out.effects,
                    })?;
                } else {
                    if out.favorited {
                        print_line(&format!("Favorited: {}", a.item));
                    } else {
                        print_line(&format!("Unfavorited: {}", a.item));
                    }
                    print_effects(&styler, &out.effects);
                }

                Ok(())
            }

            CorkCommand::List(a) => {
                let now = resolve_now(None)?;
                let db = read_db(&db_path, now)?;

                let items: Vec<CorkItem> = db
                    .profile
                    .cork_items
                    .iter()
                    .filter(|c| !a.favorites || db.profile.cork_favorites.contains(&c.id))
                    .cloned()
                    .collect();

                if cli.format == Format::Json {
                    #[derive(serde::Serialize)]
                    struct Out {
                        items: Vec<CorkItem>,
                        favorites: Vec<String>,
                    }
                    print_json(&Out {
                        items,
                        favorites: db.profile.cork_favorites.clone(),
                    })?;
                } else if items.is_empty() {
                    print_line(&styler.gray("(no cork items)"));
                } else {
                    let rows: Vec<Vec<String>> = items
                        .iter()
                        .map(|c| {
                            vec![
                                c.id.clone(),
                                c.book_title.clone().unwrap_or_default(),
                                c.tags.join(","),
                                if db.profile.cork_favorites.contains(&c.id) {
                                    "*".to_string()
                                } else {
                                    String::new()
                                },
                            ]
                        })
                        .collect();
                    print_line(&render_simple_table(
                        &["id", "book", "tags", "fav"],
                        &rows,
                    ));
                }

                Ok(())
            }
        },

        Command::Profile(args) => {
            let now = resolve_now(args.ts.as_deref())?;
            let db = read_db(&db_path, now)?;
            let summary = build_summary(&db.profile, now);

            if cli.format == Format::Json {
                print_json(&summary)?;
            } else {
                let bar_width = 10;

                print_line(&format!("{} (level {})", summary.username, summary.level));
                print_line(&format!(
                    "xp: {} ({}/{} into level)",
                    summary.xp, summary.level_progress.into_level, summary.level_progress.span
                ));

                let last = summary
                    .last_read_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "never".to_string());
                print_line(&format!(
                    "streak: {} days (longest {}), last read {}",
                    summary.current_streak, summary.longest_streak, last
                ));

                print_line(&format!(
                    "monthly goal: {}/{} books ({}%) {}",
                    summary.monthly_goal.finished_this_month,
                    summary.monthly_goal.target,
                    summary.monthly_goal.percent,
                    render_progress_bar(summary.monthly_goal.percent, bar_width)
                ));

                let ch = &summary.challenge;
                let mut line = format!(
                    "challenge: {} {}/{} {} ({}%) {}",
                    ch.title,
                    ch.current,
                    ch.target,
                    ch.unit,
                    ch.percent,
                    render_progress_bar(ch.percent, bar_width)
                );
                if ch.complete {
                    line = format!("{} {}", line, styler.green("complete!"));
                }
                if ch.expired {
                    line = format!("{} {}", line, styler.gray("(expired)"));
                }
                print_line(&line);

                print_line(&format!(
                    "achievements: {}/{} unlocked",
                    summary.achievements.unlocked, summary.achievements.total
                ));
                print_line(&format!(
                    "library: {} books ({} reading, {} finished)",
                    summary.library.total, summary.library.reading, summary.library.finished
                ));
            }

            Ok(())
        }

        Command::Achievements => {
            let now = resolve_now(None)?;
            let db = read_db(&db_path, now)?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Row {
                    id: &'static str,
                    title: &'static str,
                    description: &'static str,
                    icon: &'static str,
                    category: achievements::Category,
                    target_count: u32,
                    unlocked: bool,
                    unlocked_at: Option<chrono::DateTime<chrono::Utc>>,
                }

                #[derive(serde::Serialize)]
                struct Out {
                    achievements: Vec<Row>,
                }

                let rows: Vec<Row> = achievements::CATALOG
                    .iter()
                    .map(|def| {
                        let state = db
                            .profile
                            .achievements
                            .iter()
                            .find(|s| s.id == def.id);
                        Row {
                            id: def.id,
                            title: def.title,
                            description: def.description,
                            icon: def.icon,
                            category: def.category,
                            target_count: def.rule.target_count(),
                            unlocked: state.map_or(false, |s| s.unlocked),
                            unlocked_at: state.and_then(|s| s.unlocked_at),
                        }
                    })
                    .collect();

                print_json(&Out { achievements: rows })?;
            } else {
                let rows: Vec<Vec<String>> = achievements::CATALOG
                    .iter()
                    .map(|def| {
                        let state = db
                            .profile
                            .achievements
                            .iter()
                            .find(|s| s.id == def.id);
                        let unlocked = state.map_or(false, |s| s.unlocked);
                        let mark = if unlocked {
                            styler.green("[x]")
                        } else {
                            "[ ]".to_string()
                        };
                        let date = state
                            .and_then(|s| s.unlocked_at)
                            .map(|t| t.date_naive().to_string())
                            .unwrap_or_default();
                        vec![
                            mark,
                            def.icon.to_string(),
                            def.id.to_string(),
                            def.title.to_string(),
                            def.description.to_string(),
                            date,
                        ]
                    })
                    .collect();

                print_line(&render_simple_table(
                    &["", "", "id", "title", "description", "unlocked"],
                    &rows,
                ));
            }

            Ok(())
        }

        Command::Goal(args) => {
            let now = resolve_now(None)?;
            let goal = update_db(&db_path, now, |db| {
                db.profile.monthly_goal = args.monthly;
                Ok(db.profile.monthly_goal)
            })?;

            if cli.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    monthly_goal: u32,
                }
                print_json(&Out { monthly_goal: goal })?;
            } else {
                print_line(&format!("Monthly goal set to {} books", goal));
            }

            Ok(())
        }
    }
}
