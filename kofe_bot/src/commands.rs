//! The command menu Telegram shows next to the text box.
use teloxide::{
    prelude::*,
    types::{BotCommand, BotCommandScope},
    utils::command::BotCommands,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "🏁 Перезапустить бота")]
    Start,
    #[command(description = "📋 Открыть доску заказов (для бариста)")]
    Board,
    #[command(description = "👑 Панель администратора")]
    Admin,
}

/// The menu entries as sent to `setMyCommands`.
pub fn menu_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "🏁 Перезапустить бота"),
        BotCommand::new("board", "📋 Открыть доску заказов (для бариста)"),
        BotCommand::new("admin", "👑 Панель администратора"),
    ]
}

/// Clears every scope Telegram caches commands under. Stale scoped entries otherwise shadow the
/// default menu.
pub async fn clear_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    for scope in [BotCommandScope::Default, BotCommandScope::AllPrivateChats, BotCommandScope::AllGroupChats] {
        bot.delete_my_commands().scope(scope).await?;
    }
    Ok(())
}

/// Wipes all scopes and installs the default menu.
pub async fn register_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    clear_bot_commands(bot).await?;
    bot.set_my_commands(menu_commands()).scope(BotCommandScope::Default).await?;
    Ok(())
}
