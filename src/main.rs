use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use animecovers::cache::ImageStore;
use animecovers::config::AppConfig;
use animecovers::images::{save_cover, HttpImageSource, ImageSource};
use animecovers::models::AnimeInfo;
use animecovers::pipeline::{BindingState, CoverLoader, CoverSlot, FetchOptions};
use animecovers::providers::{build_client, SearchChain};
use dotenv::dotenv;
use env_logger::Env;
use log::info;

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "退出"];

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    let runtime = tokio::runtime::Runtime::new()?;

    let search_client = build_client(
        &config.user_agent,
        Duration::from_secs(config.search_timeout),
        config.proxy.as_deref(),
    )?;
    let chain = SearchChain::standard(search_client);

    let store = Arc::new(ImageStore::new(config.cache_capacity));
    info!("Image cache initialized ({} entries)", store.capacity());

    let source: Arc<dyn ImageSource> = Arc::new(HttpImageSource::new(
        &config.user_agent,
        Duration::from_secs(config.cover_timeout),
        config.proxy.as_deref(),
    )?);
    let mut loader: CoverLoader<CoverSlot> = CoverLoader::new(
        Arc::clone(&store),
        source,
        runtime.handle().clone(),
        FetchOptions::covers(&config),
    );

    println!("=== Anime cover finder ===");
    println!("Sources: Bangumi, Wikipedia, AniList");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some(title) = prompt(&mut lines, "\nAnime title ('quit' to exit): ")? else {
            break;
        };
        if QUIT_WORDS.contains(&title.to_lowercase().as_str()) {
            break;
        }
        if title.is_empty() {
            println!("Please enter a title");
            continue;
        }

        let candidates = runtime.block_on(chain.search_all(&title));
        let Some(found) = candidates.first().cloned() else {
            print_suggestions(&title);
            continue;
        };
        loader.prefetch(candidates.iter().filter_map(AnimeInfo::cover_key));

        let Some(key) = found.cover_key() else {
            println!("{} ({}) has no cover image", found.title, found.source);
            continue;
        };

        println!("Loading cover of {} from {}...", found.title, found.source);
        let slot = CoverSlot::new();
        loader.request_image(key, slot.clone());
        let tick = Duration::from_millis(config.tick_millis.max(1));
        while !slot.is_settled() {
            loader.pump();
            std::thread::sleep(tick);
        }

        match slot.state() {
            BindingState::Displayed(image) => {
                let (width, height) = image.dimensions();
                println!("Cover ready: {}x{}", width, height);

                let Some(dir) = prompt(&mut lines, "Save to directory (Enter for default): ")? else {
                    break;
                };
                let dir = if dir.is_empty() { config.download_dir.clone() } else { dir };
                match save_cover(&image, &found.title, Path::new(&dir)) {
                    Ok(path) => println!("Cover saved: {}", path.display()),
                    Err(e) => println!("Could not save cover: {}", e),
                }
            }
            BindingState::Failed(e) => println!("Failed to load cover: {}", e),
            BindingState::Idle | BindingState::Loading => {}
        }
    }

    Ok(())
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;
    lines.next().transpose().map(|line| line.map(|l| l.trim().to_string()))
}

fn print_suggestions(title: &str) {
    println!("No source knows an anime called '{}'", title);
    println!("Suggestions:");
    println!("1. Check the spelling of the title");
    println!("2. Try the Japanese or English title");
    println!("3. Make sure the anime has an official cover");
}
