//! Conversation CLI commands: list, history, delete.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use parley_types::chat::MessageRole;

use crate::state::AppState;

/// List a user's conversations.
///
/// ```bash
/// parley conversations alice
/// parley conversations alice --json
/// ```
pub async fn list_conversations(state: &AppState, user_id: &str, json: bool) -> Result<()> {
    let summaries = state.chat_service.list_conversations(user_id).await?;

    if json {
        let conversations: Vec<_> = summaries
            .iter()
            .map(|s| json!({ "sessionID": s.session_id, "messageCount": s.message_count }))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "conversations": conversations }))?
        );
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!(
            "  {} No conversations found for '{}'.",
            style("i").blue().bold(),
            style(user_id).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
    ]);

    for summary in &summaries {
        table.add_row(vec![
            Cell::new(&summary.session_id).fg(Color::Cyan),
            Cell::new(summary.message_count.to_string()).fg(Color::White),
        ]);
    }

    println!();
    println!("  Conversations for '{}'", style(user_id).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(summaries.len()).bold(),
        if summaries.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print a conversation transcript in append order.
pub async fn show_history(state: &AppState, user_id: &str, session_id: &str, json: bool) -> Result<()> {
    let messages = state.chat_service.history(user_id, session_id).await?;

    if json {
        let messages: Vec<_> = messages
            .iter()
            .map(|m| json!({ "type": m.role.as_str(), "content": m.content }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "messages": messages }))?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} Conversation '{}' is empty.",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for message in &messages {
        let speaker = match message.role {
            MessageRole::Human => style(message.role.speaker()).green().bold(),
            MessageRole::Ai => style(message.role.speaker()).cyan().bold(),
            _ => style(message.role.speaker()).dim(),
        };
        println!("  {speaker}: {}", message.content);
    }
    println!();

    Ok(())
}

/// Delete a conversation transcript.
pub async fn delete_conversation(
    state: &AppState,
    user_id: &str,
    session_id: &str,
    json: bool,
) -> Result<()> {
    state
        .chat_service
        .delete_conversation(user_id, session_id)
        .await?;

    if json {
        println!("{}", json!({ "success": true }));
    } else {
        println!();
        println!(
            "  {} Deleted conversation '{}' for '{}'.",
            style("✓").green().bold(),
            style(session_id).cyan(),
            style(user_id).cyan()
        );
        println!();
    }

    Ok(())
}
