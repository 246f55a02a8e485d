use genstudio::{
    logger::{self, LoggerConfig},
    AspectRatio, Config, GenerationRequest, QualityTier, StudioClient,
};
use std::env;
use std::process;

const USAGE: &str = "Usage:
  genstudio serve
  genstudio generate <prompt> [--ratio 1:1|4:3|3:4|16:9|9:16] [--pro] [--persist]";

struct GenerateArgs {
    prompt: String,
    aspect_ratio: AspectRatio,
    tier: QualityTier,
    persist: bool,
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs, String> {
    let mut prompt = Vec::new();
    let mut aspect_ratio = AspectRatio::default();
    let mut tier = QualityTier::Fast;
    let mut persist = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ratio" => {
                let value = iter.next().ok_or("--ratio needs a value")?;
                aspect_ratio = value.parse().map_err(|e| format!("{}", e))?;
            }
            "--pro" => tier = QualityTier::Pro,
            "--persist" => persist = true,
            other => prompt.push(other.to_string()),
        }
    }

    Ok(GenerateArgs {
        prompt: prompt.join(" "),
        aspect_ratio,
        tier,
        persist,
    })
}

async fn generate(config: &Config, args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = StudioClient::new(config);
    let request = GenerationRequest::builder(args.prompt)
        .aspect_ratio(args.aspect_ratio)
        .tier(args.tier)
        .build()?;

    log::info!(
        "🎨 Generating {} image ({}) for: {}",
        request.aspect_ratio(),
        request.tier(),
        request.prompt()
    );

    if args.persist {
        let url = client.generate_and_persist(&request).await?;
        println!("{}", url);
    } else {
        match client.generate_result(&request).await {
            genstudio::GenerationResult::Image(data_url) => {
                log::info!("✅ Received image ({} chars)", data_url.len());
                println!("{}", data_url);
            }
            genstudio::GenerationResult::Error(message) => return Err(message.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenv::from_filename(".env.local").is_ok() | dotenv::dotenv().is_ok();

    if let Err(e) = logger::init_with_config(LoggerConfig::from_env()) {
        eprintln!("Failed to initialise logging: {}", e);
    }
    if dotenv_loaded {
        log::info!("✅ Environment file loaded");
    } else {
        log::warn!("⚠️  No .env or .env.local file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        Some("serve") => genstudio::server::run(&config)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Some("generate") => match parse_generate_args(&args[1..]) {
            Ok(generate_args) => generate(&config, generate_args).await,
            Err(e) => Err(e.into()),
        },
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if let Err(e) = outcome {
        log::error!("❌ {}", e);
        process::exit(1);
    }
}
