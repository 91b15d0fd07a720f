//! Campaign commands: send-batch, campaign *, import-emails

use std::io::Read;

use colored::Colorize;

use crate::cli::CampaignCommands;
use crate::interfaces::cli::CliError;
use crate::services::{AppServices, CampaignStatus, ProcessOutcome};

/// 处理一行邮件列表（cron 入口）
pub async fn send_batch(services: &AppServices) -> Result<(), CliError> {
    match services.campaign.process_one().await? {
        ProcessOutcome::Paused => {
            println!("{}", "Campaign is paused, nothing sent.".yellow());
        }
        ProcessOutcome::Exhausted => {
            println!(
                "{}",
                "No pending addresses left. Campaign has been paused.".yellow()
            );
        }
        ProcessOutcome::Sent { email, code } => {
            println!(
                "{} {} {}",
                "✓ Sent to".green().bold(),
                email.cyan(),
                format!("({})", code).dimmed()
            );
        }
        ProcessOutcome::Failed { email, error } => {
            println!(
                "{} {}: {}",
                "✗ Delivery failed for".red().bold(),
                email.cyan(),
                error
            );
        }
    }
    Ok(())
}

pub async fn run_campaign_command(
    services: &AppServices,
    action: CampaignCommands,
) -> Result<(), CliError> {
    let campaign = &services.campaign;
    match action {
        CampaignCommands::Start => {
            campaign.set_state(crate::storage::CampaignState::Running).await?;
            println!("{}", "Campaign started".green().bold());
        }
        CampaignCommands::Pause => {
            campaign.set_state(crate::storage::CampaignState::Paused).await?;
            println!("{}", "Campaign paused".yellow().bold());
        }
        CampaignCommands::Interval { minutes } => {
            campaign.set_interval(minutes).await?;
            println!(
                "{} {} minute(s)",
                "Send interval set to".green(),
                minutes.to_string().cyan()
            );
        }
        CampaignCommands::ResetFailed => {
            let requeued = campaign.reset_failed().await?;
            println!(
                "{} {} address(es)",
                "Re-queued".green(),
                requeued.to_string().cyan()
            );
        }
        CampaignCommands::Status => {}
    }

    print_status(&campaign.status().await?);
    Ok(())
}

fn print_status(status: &CampaignStatus) {
    println!();
    println!("{}", "Campaign status".bold().underline());
    println!("  {:<10} {}", "State:", status.state.to_string().cyan());
    println!("  {:<10} {} min", "Interval:", status.interval_minutes);
    println!(
        "  {:<10} {}",
        "Pending:",
        status.counts.pending.to_string().yellow()
    );
    println!("  {:<10} {}", "Sent:", status.counts.sent.to_string().green());
    println!("  {:<10} {}", "Failed:", status.counts.failed.to_string().red());
}

/// 从文件或 stdin（`-`）导入邮件地址
pub async fn import_emails(services: &AppServices, file: &str) -> Result<(), CliError> {
    let text = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::CommandError(format!("Failed to read stdin: {}", e)))?;
        buf
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| CliError::CommandError(format!("Failed to read {}: {}", file, e)))?
    };

    let summary = services.campaign.import_emails(&text).await?;
    println!(
        "{} {} added, {} skipped, {} invalid",
        "Import finished:".green().bold(),
        summary.added.to_string().cyan(),
        summary.skipped,
        summary.invalid
    );
    Ok(())
}
