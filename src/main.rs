use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use autoscan::backend::{Backend, LogUi, ScanTools, UiMessage, UiSet};
use autoscan::config::{Config, DriveCredentials};
use autoscan::drive::{DriveClient, DriveUploader, OAuthApp};
use autoscan::hardware::{Buttons, Gpio, Lcd, LedController, LedMode, LedUi};
use autoscan::status::{
    ControlPoller, PollSchedule, StatusClient, StatusPoller, StatusView, TerminalControls,
    TerminalDisplay,
};
use autoscan::{logging, web};

#[derive(Parser)]
#[command(name = "autoscan", version)]
#[command(about = "Scan documents from a sheet-fed scanner straight into Google Drive")]
struct Cli {
    /// Config file (default: $AUTOSCAN_CONFIG, then autoscan.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scan backend and web UI
    Serve(ServeArgs),
    /// Follow a server's status in the terminal until Ctrl-C
    Watch {
        #[arg(long)]
        url: Option<String>,
    },
    /// Print a server's current status once
    Status {
        #[arg(long)]
        url: Option<String>,
    },
    /// Start a scan round on a server
    Scan {
        #[arg(long)]
        url: Option<String>,
        /// Scan both sides of each page
        #[arg(long)]
        duplex: bool,
    },
    /// Authorize Google Drive access and write the credentials file
    Configure {
        #[arg(long, value_name = "PATH")]
        credentials: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    listen: Option<String>,
    /// Directory with static files
    #[arg(long = "static", value_name = "DIR")]
    static_dir: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    credentials: Option<PathBuf>,
    /// Enable GPIO buttons
    #[arg(long)]
    buttons: bool,
    /// Enable GPIO LEDs
    #[arg(long)]
    leds: bool,
    /// Enable the Adafruit 16x2 LCD
    #[arg(long)]
    lcd: bool,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(dir) = self.static_dir {
            config.static_dir = Some(dir);
        }
        if let Some(path) = self.credentials {
            config.credentials_path = path;
        }
        config.gpio.use_buttons |= self.buttons;
        config.gpio.use_leds |= self.leds;
        config.lcd.enabled |= self.lcd;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let mut config = Config::load(cli.config.as_deref()).await;

    match cli.command {
        Commands::Serve(args) => {
            args.apply(&mut config);
            serve(config).await
        }
        Commands::Watch { url } => watch(&config, url).await,
        Commands::Status { url } => {
            let client = StatusClient::new(url.as_deref().unwrap_or(&config.server_url))?;
            let record = client.status().await.context("fetching status")?;
            println!("{}", TerminalDisplay::<std::io::Stdout>::format_line(&StatusView::render(&record)));
            Ok(())
        }
        Commands::Scan { url, duplex } => {
            let client = StatusClient::new(url.as_deref().unwrap_or(&config.server_url))?;
            client
                .trigger_scan(duplex)
                .await
                .context("starting scan")?;
            println!("scan started");
            Ok(())
        }
        Commands::Configure { credentials } => {
            let path = credentials.unwrap_or_else(|| config.credentials_path.clone());
            configure(&path).await
        }
    }
}

async fn watch(config: &Config, url: Option<String>) -> Result<()> {
    let url = url.unwrap_or_else(|| config.server_url.clone());
    let client = Arc::new(StatusClient::new(&url).with_context(|| format!("bad url {url:?}"))?);
    let schedule = PollSchedule::from(&config.poll);
    info!(%url, "Watching server status");

    let controls = ControlPoller::new(client.clone(), TerminalControls::stdout(), schedule);
    let display = StatusPoller::new(client, TerminalDisplay::stdout(), schedule);
    tokio::select! {
        _ = controls.run() => {}
        _ = display.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }
    Ok(())
}

struct Led {
    commands: mpsc::Sender<LedMode>,
    task: JoinHandle<()>,
}

impl Led {
    async fn open(gpio: &Gpio, [a, b]: [u32; 2]) -> Result<Self> {
        let pin_a = gpio.output(a).await?;
        let pin_b = gpio.output(b).await?;
        let (commands, task) = LedController::spawn(pin_a, pin_b);
        Ok(Self { commands, task })
    }

    async fn shutdown(self) {
        LedController::stop(self.commands, self.task).await;
    }
}

async fn serve(config: Config) -> Result<()> {
    let credentials = DriveCredentials::load(&config.credentials_path)
        .await
        .context("reading credentials; run `autoscan configure` first")?;
    let drive = DriveClient::connect(&credentials)
        .await
        .context("connecting to Google Drive")?;
    let uploader = Arc::new(DriveUploader::new(drive, credentials.parent_folder.clone()));

    let gpio = Gpio::new(&config.gpio.base_path);
    let mut ui = UiSet::new().with(Arc::new(LogUi));
    let mut leds = Vec::new();
    let mut progress = None;

    if config.gpio.use_leds {
        // Status LED blinks green while we run; progress LED follows the rounds.
        let status = Led::open(&gpio, config.gpio.pin_led1)
            .await
            .context("status LED")?;
        status.commands.send(LedMode::Green).await?;
        status.commands.send(LedMode::Blink).await?;
        let round = Led::open(&gpio, config.gpio.pin_led2)
            .await
            .context("progress LED")?;
        round.commands.send(LedMode::Green).await?;
        ui.push(Arc::new(LedUi::new(round.commands.clone())));
        progress = Some(round.commands.clone());
        leds.push(status);
        leds.push(round);
    }

    let mut lcd_keys = None;
    if config.lcd.enabled {
        let (lcd_ui, keys) = Lcd::spawn(&config.lcd.binary).context("setting up LCD")?;
        ui.push(Arc::new(lcd_ui));
        lcd_keys = Some(keys);
    }

    let tools = ScanTools::new(&config.scanimage, &config.convert);
    let backend = Arc::new(Backend::new(tools, uploader, Arc::new(ui)));

    if config.gpio.use_buttons {
        let buttons = Buttons::open(&gpio, config.gpio.button_pins())
            .await
            .context("setting up buttons")?;
        tokio::spawn(buttons.run(backend.clone(), progress));
    }
    if let Some(keys) = lcd_keys {
        let backend = backend.clone();
        tokio::spawn(async move {
            if let Err(err) = keys.run(backend).await {
                error!(error = %err, "LCD stopped");
            }
        });
    }

    backend.announce(&UiMessage::idle("Autoscan Ready.", "Just started."));

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("bad listen address {:?}", config.listen))?;
    let (bound, server) = web::bind(backend, config.static_dir.clone(), addr, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
        }
    })?;
    info!(%bound, "Running");
    server.await;
    info!("Shutting down");

    for led in leds {
        led.shutdown().await;
    }
    Ok(())
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

async fn prompt(lines: &mut StdinLines, label: &str) -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    match lines.next_line().await? {
        Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        _ => bail!("no input for {}", label.trim_end_matches([':', ' '])),
    }
}

async fn configure(path: &Path) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let client_id = prompt(&mut lines, "Client ID: ").await?;
    let client_secret = prompt(&mut lines, "Client secret: ").await?;

    let app = OAuthApp::new(&client_id, &client_secret);
    println!("Visit this URL to authorize Drive access:\n\n  {}\n", app.authorize_url()?);
    let code = prompt(&mut lines, "Authorization code: ").await?;

    let http = reqwest::Client::new();
    let token = app
        .exchange_code(&http, &code)
        .await
        .context("exchanging authorization code")?;
    let Some(refresh_token) = token.refresh_token else {
        bail!("Google returned no refresh token; revoke access and try again");
    };
    let parent_folder = prompt(&mut lines, "Folder ID: ").await?;

    let credentials = DriveCredentials {
        client_id,
        client_secret,
        refresh_token,
        parent_folder,
    };
    credentials
        .save(path)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Wrote credentials");
    Ok(())
}
