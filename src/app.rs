use crate::cli::Args;
use crate::commands::create_command_registry;
use crate::config::{Config, Settings};
use crate::core::error::ChatError;
use crate::functions::FunctionRegistry;
use crate::input::TerminalOperator;
use crate::providers::factory::ProviderFactory;
use crate::session::{Session, SessionOptions};
use is_terminal::IsTerminal;
use tracing::info;

pub struct Application {
    session: Session,
}

impl Application {
    pub fn new(args: Args, config: Config) -> Result<Self, ChatError> {
        let settings: Settings = config.resolve(&args)?;
        let provider =
            ProviderFactory::new().create(&settings.provider, &settings.provider_config)?;
        let functions = FunctionRegistry::with_builtins(&settings.functions);
        info!(
            provider = provider.name(),
            model = %settings.model,
            functions = ?functions.names(),
            "starting session"
        );

        let operator =
            TerminalOperator::new(create_command_registry(), Config::input_history_path())?;
        let clear_screen = settings.clear_screen && std::io::stdout().is_terminal();

        let session = Session::new(
            provider,
            functions,
            Box::new(operator),
            Box::new(console::Term::stdout()),
            SessionOptions {
                model: settings.model,
                system_prompt: settings.system_prompt,
                clear_screen,
                history_dir: Config::history_dir(),
            },
        );

        Ok(Self { session })
    }

    /// Runs the session until the operator leaves or presses Ctrl-C.
    ///
    /// On a terminal the line editor turns Ctrl-C at the prompt into an exit,
    /// and the signal branch below covers requests in flight. Without a
    /// terminal the read blocks this thread, so a worker watches the signal.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        self.session.greet()?;

        if !std::io::stdin().is_terminal() {
            tokio::spawn(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(0);
                }
            });
        }

        let result = tokio::select! {
            result = self.session.run() => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                Ok(())
            }
        };

        info!(
            model = self.session.model(),
            messages = self.session.conversation().len(),
            "session finished"
        );
        self.session.shutdown();
        result
    }
}
