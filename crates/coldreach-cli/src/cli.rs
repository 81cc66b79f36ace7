use clap::Parser;

use coldreach_core::Provider;

#[derive(Parser, Debug)]
#[command(
    name = "coldreach",
    version,
    about = "Research a company, draft an outreach email, and send it only after you approve"
)]
pub struct Cli {
    /// Company name (or domain) to research
    pub company: String,

    /// Company homepage to scrape
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Generation backend: primary (openai) or secondary (anthropic)
    #[arg(long, default_value = "primary")]
    pub provider: Provider,

    /// Model id; defaults to the provider's configured model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Approve the draft without prompting
    #[arg(long)]
    pub yes: bool,
}
