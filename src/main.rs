use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voicecast::cast::CastClient;
use voicecast::channels::{Channel, ConsoleChannel, SlackChannel};
use voicecast::engine::{default_library_path, find_style};
use voicecast::synthesis::WorkerOptions;
use voicecast::{Notifier, PlaybackCoordinator, Settings, SynthesisWorker, Voicevox, wav};

/// Voicecast - speak text on a Google Home with VOICEVOX
#[derive(Parser)]
#[command(name = "voicecast", version, about)]
struct Cli {
    /// Directory of YAML settings files
    #[arg(short, long, env = "VOICECAST_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Speak lines typed on the console (default)
    Console,
    /// Speak messages that mention the Slack bot
    Slack,
    /// Speak one message and exit
    Say {
        /// Text to speak
        text: String,
    },
    /// Print the duration of a WAV file in seconds
    Duration {
        /// WAV file produced by the engine
        file: PathBuf,
    },
    /// Show engine and device information
    Info,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // GOOGLE_HOME_DEBUG=on is the historical debug switch
    let legacy_debug = std::env::var("GOOGLE_HOME_DEBUG").is_ok_and(|v| v == "on");
    let verbose = if legacy_debug { cli.verbose.max(1) } else { cli.verbose };

    let filter = match verbose {
        0 => "info,voicecast=info",
        1 => "info,voicecast=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Console);

    if let Command::Duration { file } = &command {
        let secs = wav::duration(file)?;
        println!("{secs:.3}");
        return Ok(());
    }

    let settings = Settings::load(cli.settings_dir.as_deref())?;

    match command {
        Command::Info => {
            info(&settings);
            Ok(())
        }
        Command::Say { text } => {
            let notifier = start(&settings).await?;
            notifier.speak(&text).await?;
            Ok(())
        }
        Command::Slack => {
            settings.slack.validate()?;
            let mut slack = SlackChannel::new(&settings.slack);
            serve(&settings, &mut slack).await
        }
        Command::Console | Command::Duration { .. } => {
            let mut console = ConsoleChannel::stdio();
            serve(&settings, &mut console).await
        }
    }
}

async fn serve(settings: &Settings, channel: &mut dyn Channel) -> anyhow::Result<()> {
    let notifier = start(settings).await?;
    notifier.run(channel).await?;
    Ok(())
}

/// Bring up the engine thread and the playback side
async fn start(settings: &Settings) -> anyhow::Result<Notifier> {
    settings.google_home.validate()?;

    let library = settings.voicevox.library_path.clone();
    let options = WorkerOptions::from(&settings.voicevox);

    tracing::info!(
        speaker_id = options.speaker_id,
        dict = %options.initialize.open_jtalk_dict_dir.display(),
        "starting synthesis worker"
    );

    let worker = tokio::task::spawn_blocking(move || {
        SynthesisWorker::spawn(move || Voicevox::load(library.as_deref()), options)
    })
    .await??;

    tracing::info!(
        device = %settings.google_home.device_name,
        addr = %settings.google_home.addr,
        port = settings.google_home.port,
        "ready"
    );

    Ok(Notifier::new(
        worker,
        PlaybackCoordinator::new(CastClient::new()),
        settings.google_home.clone(),
    ))
}

fn info(settings: &Settings) {
    let library = settings
        .voicevox
        .library_path
        .clone()
        .unwrap_or_else(default_library_path);

    println!("engine library:  {}", library.display());
    let speaker_id = settings.voicevox.speaker_id;
    match Voicevox::load(settings.voicevox.library_path.as_deref()) {
        Ok(engine) => {
            println!("engine version:  {}", engine.version());
            match engine.supported_devices() {
                Ok(devices) => println!("devices:         {devices}"),
                Err(e) => println!("devices:         unavailable ({e})"),
            }
            match engine.speakers() {
                Ok(speakers) => {
                    match find_style(&speakers, speaker_id) {
                        Some((speaker, style)) => {
                            println!("speaker id:      {speaker_id} ({} / {})", speaker.name, style.name);
                        }
                        None => println!("speaker id:      {speaker_id} (not in this engine)"),
                    }
                    println!("voices:");
                    for speaker in &speakers {
                        for style in &speaker.styles {
                            let marker = if style.id == speaker_id { '*' } else { ' ' };
                            println!("  {marker} {:>3}  {} / {}", style.id, speaker.name, style.name);
                        }
                    }
                }
                Err(e) => {
                    println!("speaker id:      {speaker_id}");
                    println!("voices:          unavailable ({e})");
                }
            }
        }
        Err(e) => {
            println!("engine version:  unavailable ({e})");
            println!("speaker id:      {speaker_id}");
        }
    }
    println!("dictionary:      {}", settings.voicevox.open_jtalk_dict_dir.display());

    let device = &settings.google_home;
    println!(
        "device:          {} ({}) at {}:{}",
        device.device_name, device.device, device.addr, device.port
    );
    println!("interface:       {}", device.iface().unwrap_or("any"));
    println!("volume:          {}", device.volume);
    println!("max duration:    {}s", device.max_duration);
}
