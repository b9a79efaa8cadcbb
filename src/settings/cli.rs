use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "feedgate", about = "Backend-for-frontend for the media feed")]
pub struct Cli {
    /// Path to a TOML settings file, without or with extension.
    #[arg(long)]
    pub settings: Option<String>,
}
