use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Chat with a language model that can call functions",
    long_about = None
)]
pub struct Args {
    /// Provider to use [possible values: openai, openrouter, deepseek]
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// System prompt that opens the conversation
    #[arg(short, long)]
    pub system: Option<String>,

    /// Do not clear the terminal between renders
    #[arg(long)]
    pub no_clear: bool,

    /// Log requests and dispatches to stderr
    #[arg(short, long)]
    pub verbose: bool,
}
