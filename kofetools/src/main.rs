use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use kofe_bot::commands::{clear_bot_commands, menu_commands, register_bot_commands};
use kofe_server::config::ServerConfig;
use teloxide::Bot;

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Operator tools for the Kofe bot and server")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clear every command scope and install the default menu (/start, /board, /admin)
    #[clap(name = "set-commands")]
    SetCommands,
    /// Remove the bot's command menu from every scope
    #[clap(name = "clear-commands")]
    ClearCommands,
    /// Print the configuration currently in effect (secrets are not shown)
    #[clap(name = "env")]
    Env,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::SetCommands => set_commands().await,
        Command::ClearCommands => clear_commands().await,
        Command::Env => print_env(),
    }
}

async fn set_commands() -> Result<()> {
    let bot = bot_from_env()?;
    register_bot_commands(&bot).await?;
    println!("The command menu has been installed:");
    for cmd in menu_commands() {
        println!("  /{} — {}", cmd.command, cmd.description);
    }
    Ok(())
}

async fn clear_commands() -> Result<()> {
    let bot = bot_from_env()?;
    clear_bot_commands(&bot).await?;
    println!("The command menu has been cleared from all scopes.");
    Ok(())
}

fn bot_from_env() -> Result<Bot> {
    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set. Add it to the environment or .env file."))?;
    Ok(Bot::new(token))
}

fn print_env() -> Result<()> {
    let config = ServerConfig::from_env_or_default();
    println!("------------------------------ Kofe configuration ------------------------------");
    println!("Server address:       {}:{}", config.host, config.port);
    println!("Database URL:         {}", config.database_url);
    println!("Static files:         {}", config.static_dir);
    println!("Payment timeout:      {}h", config.payment_timeout.num_hours());
    println!("Public base URL:      {}", config.bot.base_url);
    println!("Admin chat id:        {}", config.bot.admin_chat_id);
    println!("Barista chat id:      {}", config.bot.barista_id);
    println!("Epay client id:       {}", config.epay.client_id);
    println!("Epay terminal id:     {}", config.epay.terminal_id);
    println!("Epay OAuth URL:       {}", config.epay.oauth_url);
    println!("Epay invoice URL:     {}", config.epay.invoice_url);
    println!("Epay payment page:    {}", config.epay.payment_page_url);
    println!("--------------------------------------------------------------------------------");
    println!("TELEGRAM_BOT_TOKEN and EPAY_CLIENT_SECRET are read but never printed.");
    Ok(())
}
