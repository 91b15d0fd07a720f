//! 管理员账号命令

use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::interfaces::cli::CliError;
use crate::services::AppServices;

/// 从不同来源获取密码
fn get_password(password: Option<String>, stdin: bool) -> Result<String, CliError> {
    if stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::CommandError(format!("Failed to read from stdin: {}", e)))?;
        Ok(line.trim().to_string())
    } else if let Some(pwd) = password {
        Ok(pwd)
    } else {
        prompt_password_with_confirm()
    }
}

/// 交互式输入密码（带确认）
fn prompt_password_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::CommandError(
            "No password provided. Use --password or --stdin flag, or run interactively."
                .to_string(),
        ));
    }

    let read = |prompt: &str| -> Result<String, CliError> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        rpassword::read_password()
            .map_err(|e| CliError::CommandError(format!("Failed to read password: {}", e)))
    };

    let password = read("Enter password: ")?;
    let confirm = read("Confirm password: ")?;
    if password != confirm {
        return Err(CliError::CommandError("Passwords do not match".to_string()));
    }
    Ok(password)
}

pub async fn create_admin(
    services: &AppServices,
    username: &str,
    email: &str,
    password: Option<String>,
    stdin: bool,
) -> Result<(), CliError> {
    let password = get_password(password, stdin)?;
    let user = services
        .identity
        .create_admin(username, email, &password)
        .await?;
    println!(
        "{} {} <{}>",
        "✓ Admin account created:".green().bold(),
        user.username.cyan(),
        user.email
    );
    Ok(())
}

pub async fn promote_user(services: &AppServices, email: &str) -> Result<(), CliError> {
    let user = services.identity.promote(email).await?;
    println!(
        "{} {} <{}>",
        "✓ Promoted to admin:".green().bold(),
        user.username.cyan(),
        user.email
    );
    Ok(())
}
