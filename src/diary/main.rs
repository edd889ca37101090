use clap::Parser;
use diary::api::{ConfigAction, DiaryApi, DiaryPaths};
use diary::config::DiaryConfig;
use diary::error::{DiaryError, Result};
use diary::feed::fs::JsonFileFeed;
use diary::grouper::DisplayZone;
use diary::logging;
use diary::model::{EntryDraft, EntryPatch};
use diary::timestamp::parse_user_time;
use directories::ProjectDirs;
use std::io::Read;
use std::path::PathBuf;

mod args;
mod print;
use args::{Cli, Commands};

const HOME_ENV: &str = "DIARY_HOME";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: DiaryApi<JsonFileFeed>,
    zone: DisplayZone,
    page_size: usize,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let mut ctx = init_context()?;

    match cli.command {
        Some(Commands::Add { content, image, at }) => handle_add(&mut ctx, content, image, at),
        Some(Commands::List { offset, limit }) => handle_list(&mut ctx, offset, limit),
        Some(Commands::Search {
            term,
            offset,
            limit,
        }) => handle_search(&mut ctx, term, offset, limit),
        Some(Commands::Show { ids }) => handle_show(&ctx, ids),
        Some(Commands::Edit {
            id,
            content,
            image,
            clear_image,
            at,
        }) => handle_edit(&mut ctx, id, content, image, clear_image, at),
        Some(Commands::Delete { ids }) => handle_delete(&mut ctx, ids),
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        None => handle_list(&mut ctx, 0, None),
    }
}

fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "diary", "diary")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            DiaryError::Config(format!(
                "Could not determine a data directory; set {}",
                HOME_ENV
            ))
        })
}

fn init_context() -> Result<AppContext> {
    let paths = DiaryPaths::new(data_dir()?);
    let config = DiaryConfig::load(paths.config_dir())?;
    let backend = JsonFileFeed::at(paths.data_file(&config));
    let api = DiaryApi::connect(backend, config.grouper(), paths);

    Ok(AppContext {
        api,
        zone: config.timezone,
        page_size: config.page_size,
    })
}

fn handle_add(
    ctx: &mut AppContext,
    content: Option<String>,
    image: Option<String>,
    at: Option<String>,
) -> Result<()> {
    let content = match content.as_deref() {
        None | Some("-") => read_stdin()?,
        Some(text) => text.to_string(),
    };

    let mut draft = EntryDraft::new(content.trim_end());
    if let Some(image) = image {
        draft = draft.with_image(image);
    }
    if let Some(at) = at {
        draft = draft.with_timestamp(parse_time(&at, &ctx.zone)?);
    }

    let result = ctx.api.add_entry(draft)?;
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &mut AppContext, offset: usize, limit: Option<usize>) -> Result<()> {
    let result = ctx.api.list(offset, limit.unwrap_or(ctx.page_size))?;
    if let Some(window) = &result.window {
        print::print_window(window, &ctx.zone);
    }
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_search(
    ctx: &mut AppContext,
    term: String,
    offset: usize,
    limit: Option<usize>,
) -> Result<()> {
    let result = ctx
        .api
        .search(&term, offset, limit.unwrap_or(ctx.page_size))?;
    if let Some(window) = &result.window {
        print::print_window(window, &ctx.zone);
    }
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &AppContext, ids: Vec<String>) -> Result<()> {
    let result = ctx.api.show(&ids)?;
    print::print_full_entries(&result.affected_entries, &ctx.zone);
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_edit(
    ctx: &mut AppContext,
    id: String,
    content: Option<String>,
    image: Option<String>,
    clear_image: bool,
    at: Option<String>,
) -> Result<()> {
    let mut patch = EntryPatch::new();
    match content.as_deref() {
        Some("-") => patch = patch.content(read_stdin()?.trim_end()),
        Some(text) => patch = patch.content(text),
        None => {}
    }
    if let Some(image) = image {
        patch = patch.image(image);
    }
    if clear_image {
        patch = patch.clear_image();
    }
    if let Some(at) = at {
        patch = patch.timestamp(parse_time(&at, &ctx.zone)?);
    }

    let result = ctx.api.edit_entry(&id, &patch)?;
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_delete(ctx: &mut AppContext, ids: Vec<String>) -> Result<()> {
    let result = ctx.api.delete_entries(&ids)?;
    print::print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };

    let result = ctx.api.config(action.clone())?;
    if let (ConfigAction::ShowAll, Some(config)) = (&action, &result.config) {
        print::print_config(config);
    }
    print::print_messages(&result.messages);
    if result.has_errors() {
        return Err(DiaryError::Config("invalid configuration request".to_string()));
    }
    Ok(())
}

fn parse_time(text: &str, zone: &DisplayZone) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_user_time(text, zone)
        .map_err(|e| DiaryError::Api(format!("Invalid time '{}': {}", text, e)))
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(DiaryError::Io)?;
    Ok(buffer)
}
