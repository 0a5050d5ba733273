use crate::app::{AppContext, Result, StorywatchError};
use crate::domain::Story;
use crate::sync::ViewKind;

pub async fn sync(ctx: &mut AppContext, pages: Option<u32>, full: bool) -> Result<()> {
    let options = ctx.sync_options(pages, !full);
    let report = ctx.sync.sync(options).await?;

    for story in &report.updated {
        print_story(story);
    }

    println!(
        "Sync complete: {} new or updated stories from {} of {} pages",
        report.updated.len(),
        report.pages_visited,
        report.total_pages
    );
    Ok(())
}

pub async fn scrape(ctx: &mut AppContext, page: u32, all: bool) -> Result<()> {
    let stories = ctx.sync.scrape_listing_page(page, !all).await?;

    if stories.is_empty() {
        println!("No new stories on page {}", page);
        return Ok(());
    }

    for story in &stories {
        print_story(story);
    }
    Ok(())
}

pub async fn refresh(ctx: &mut AppContext, id: i64) -> Result<()> {
    if ctx.sync.cache().get(id).is_none() {
        return Err(StorywatchError::StoryNotFound(id));
    }

    if ctx.sync.refresh_detail(id).await? {
        println!("Story {} updated", id);
    } else {
        println!("Story {} unchanged", id);
    }
    Ok(())
}

pub async fn pages(ctx: &AppContext) -> Result<()> {
    println!("{}", ctx.sync.page_count().await?);
    Ok(())
}

pub fn watch(ctx: &mut AppContext, id: i64, reset: bool) -> Result<()> {
    report(ctx.sync.watch(id, reset)?, id, "Watching");
    Ok(())
}

pub fn ignore(ctx: &mut AppContext, id: i64, reset: bool) -> Result<()> {
    report(ctx.sync.ignore(id, reset)?, id, "Ignoring");
    Ok(())
}

pub fn acknowledge(ctx: &mut AppContext, id: i64) -> Result<()> {
    report(ctx.sync.acknowledge(id)?, id, "Acknowledged");
    Ok(())
}

pub fn set_title(ctx: &mut AppContext, id: i64, title: String) -> Result<()> {
    report(ctx.sync.set_title(id, title)?, id, "Title set for");
    Ok(())
}

pub fn set_priority(ctx: &mut AppContext, id: i64, priority: Option<f64>) -> Result<()> {
    report(ctx.sync.set_priority(id, priority)?, id, "Priority set for");
    Ok(())
}

pub fn set_description(ctx: &mut AppContext, id: i64, description: Option<String>) -> Result<()> {
    report(ctx.sync.set_description(id, description)?, id, "Description set for");
    Ok(())
}

pub fn set_marker(ctx: &mut AppContext, id: i64, marker: Option<String>) -> Result<()> {
    report(ctx.sync.set_update_marker(id, marker)?, id, "Marker set for");
    Ok(())
}

pub fn show(ctx: &AppContext, view: ViewKind) -> Result<()> {
    let entries = ctx.sync.view(view);

    if entries.is_empty() {
        println!("Nothing to show");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}

pub fn open_story(ctx: &AppContext, id: i64) -> Result<()> {
    let story = ctx
        .sync
        .cache()
        .get(id)
        .ok_or(StorywatchError::StoryNotFound(id))?;

    open::that(&story.url)?;
    Ok(())
}

fn print_story(story: &Story) {
    println!("{}\n\t{}", story.id, story.title);
}

fn report(changed: bool, id: i64, action: &str) {
    if changed {
        println!("{} story {}", action, id);
    } else {
        println!("Story {} is not known here; nothing changed", id);
    }
}
