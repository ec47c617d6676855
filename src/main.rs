//! Command-line front-end for the plant disease classifier.
//!
//! Classifies a leaf photo (or the bundled sample image when no path is
//! given) and prints the ranked predictions. With `--info`, also fetches a
//! symptom/management summary for the top prediction from the configured
//! chat-completion API; ctrl-c cancels the pending lookup without killing
//! the classification output already printed.

use anyhow::{bail, Context, Result};
use leafscan::ai::AiService;
use leafscan::classifier::{self, Classifier};
use leafscan::config::{self, AiConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct CliArgs {
    assets_dir: PathBuf,
    image: Option<PathBuf>,
    fetch_info: bool,
}

const USAGE: &str = "Usage: leafscan [OPTIONS] [IMAGE]

Classify a plant leaf photo. Without IMAGE, the bundled sample image in
the assets directory is used.

Options:
  --assets <DIR>   Assets directory with the model and label files
                   (default: ./assets, or LEAFSCAN_ASSETS_DIR)
  --info           Fetch a symptom/management summary for the top result
  -h, --help       Show this help";

fn parse_args() -> Result<CliArgs> {
    let default_assets = std::env::var("LEAFSCAN_ASSETS_DIR").unwrap_or_else(|_| "assets".into());
    let mut args = CliArgs {
        assets_dir: PathBuf::from(default_assets),
        image: None,
        fetch_info: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--assets" => {
                let dir = iter.next().context("--assets requires a directory")?;
                args.assets_dir = PathBuf::from(dir);
            }
            "--info" => args.fetch_info = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("Unknown option '{}'\n{}", flag, USAGE),
            path => {
                if args.image.is_some() {
                    bail!("Only one image path may be given\n{}", USAGE);
                }
                args.image = Some(PathBuf::from(path));
            }
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = parse_args()?;

    if !classifier::assets_available(&args.assets_dir) {
        bail!(
            "Model assets not found in {:?} (expected {} and {})",
            args.assets_dir,
            classifier::MODEL_FILE,
            classifier::LABELS_FILE
        );
    }

    let image_path = match args.image {
        Some(path) => path,
        None => classifier::sample_image_path(&args.assets_dir)
            .context("No image given and no bundled sample image found")?,
    };

    let clf = Arc::new(Classifier::load(&args.assets_dir)?);

    log::info!("Classifying {:?}", image_path);
    let clf_for_task = clf.clone();
    let path_for_task = image_path.clone();
    let predictions = tokio::task::spawn_blocking(move || {
        clf_for_task.recognize_file(&path_for_task)
    })
    .await
    .context("Classification task panicked")??;

    if predictions.is_empty() {
        println!("No disease detected");
        return Ok(());
    }

    for prediction in &predictions {
        println!("{}", prediction);
    }

    if !args.fetch_info {
        return Ok(());
    }

    let config = AiConfig::from_env();
    if !config.is_configured() {
        println!(
            "Disease info unavailable: set {} to enable lookups",
            config::API_KEY_ENV
        );
        return Ok(());
    }

    let disease = classifier::pretty_label(&predictions[0].title);
    let service = AiService::new(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    println!("Fetching disease info for '{}'...", disease);
    match service.get_disease_info_cancellable(&disease, &cancel).await {
        Ok(Some(info)) => {
            println!("Symptoms:   {}", info.symptoms);
            println!("Management: {}", info.management);
        }
        Ok(None) => println!("Lookup cancelled"),
        Err(e) => {
            log::error!("Failed to fetch disease info for '{}': {}", disease, e);
            println!("Error: {}", e);
        }
    }

    Ok(())
}
