use clap::{Parser, Subcommand};
use llm_bridge::chat::{
    ChatContext, ChatSend, ChatSettings, DirectChat, DisabledEvaluator, Evaluator, ShellEvaluator,
    ToolLoop, TranscriptEntry, TranslatingChat,
};
use llm_bridge::translate::anthropic_types::Message;
use llm_bridge::translate::RequestDefaults;
use llm_bridge::transport::HttpTransport;
use llm_bridge::{
    build_router, AppState, BackendSelector, BridgeConfig, ExecutorDispatch, SelectorHandle,
    SharedLogger,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "llm-bridge",
    about = "Let Anthropic Messages clients talk to OpenAI-compatible backends",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend to use: primary, secondary (overrides config)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Log file path
    #[arg(long, global = true, default_value = "llm-bridge.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve /v1/messages over HTTP (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run a single chat turn and print the transcript
    Chat {
        prompt: String,

        /// Allow the model to run shell expressions locally
        #[arg(long)]
        allow_eval: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_bridge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = BridgeConfig::find_and_load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = BackendSelector::from(backend);
    }

    let logger = SharedLogger::new(&cli.log_file)?;
    let selector = SelectorHandle::new(config.backend.clone());
    let client = HttpTransport::default_client()?;

    let primary = Arc::new(HttpTransport::for_endpoint(client.clone(), &config.primary)?);
    let secondary = Arc::new(HttpTransport::for_endpoint(client, &config.secondary)?);

    info!("  Backend:    {}", config.backend);
    info!("  Primary:    {}", primary.url());
    info!("  Secondary:  {}", secondary.url());

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let dispatch = ExecutorDispatch::new(primary, selector.clone())
                .with_secondary_transport(secondary)
                .with_defaults(RequestDefaults::with_temperature(
                    config.defaults.executor_temperature,
                ))
                .with_logger(logger.clone());

            logger.info(
                "startup",
                format!("Starting llm-bridge backend={} port={}", config.backend, port),
            );

            let state = Arc::new(AppState {
                dispatch: Arc::new(dispatch),
                selector,
                logger,
            });

            let bind_addr = format!("0.0.0.0:{port}");
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            info!("Listening on http://{}", bind_addr);
            info!("  ANTHROPIC_BASE_URL=http://localhost:{} <your client>", port);

            axum::serve(listener, build_router(state)).await?;
        }
        Command::Chat { prompt, allow_eval } => {
            let evaluator: Arc<dyn Evaluator> = if allow_eval {
                Arc::new(ShellEvaluator::default())
            } else {
                Arc::new(DisabledEvaluator)
            };
            let ctx = ChatContext::new(
                ChatSettings::from_config(&config.chat, &config.defaults),
                ToolLoop::new(config.chat.eval_tool.clone(), evaluator),
                logger,
            );
            let transcript = ctx.transcript.clone();

            let direct = Arc::new(DirectChat::new(primary, ctx.clone()));
            let chat = TranslatingChat::new(direct, secondary, selector, ctx);

            transcript.push(TranscriptEntry::User(prompt.clone()));
            let result = chat.send(vec![Message::user(prompt)]).await;
            println!("{}", transcript.render());
            result?;
        }
    }

    Ok(())
}
