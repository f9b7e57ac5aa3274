use daytask_core::auth::AuthClient;
use daytask_core::ActorMode;

use crate::commands::common::{resolve_password, Context};
use crate::error::CliError;

fn auth_client(context: &Context) -> Result<AuthClient, CliError> {
    Ok(AuthClient::new(
        &context.config.api_base_url,
        context.config.request_timeout(),
    )?)
}

pub async fn run_login(
    email: &str,
    password: Option<String>,
    context: &Context,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    let session = auth_client(context)?.login(email, &password).await?;
    let username = session.user.username.clone();
    let email = session.user.email.clone();

    let workspace = &context.workspace;
    let transition = workspace.sign_in(session).await?;
    println!("Signed in as {username} <{email}>");

    if !transition.is_login() {
        return Ok(());
    }
    match workspace.mode() {
        ActorMode::OnlineUser if workspace.merge_due() => {
            let reason = workspace.status().last_error.unwrap_or_default();
            println!("Merging local records failed; retried on next sync. {reason}");
        }
        ActorMode::OnlineUser => println!("Local records merged into your account"),
        _ => println!("Offline: local records will be merged once the server is reachable"),
    }
    Ok(())
}

pub async fn run_register(
    username: &str,
    email: &str,
    password: Option<String>,
    context: &Context,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    let message = auth_client(context)?
        .register(username, email, &password, &password)
        .await?;

    if message.is_empty() {
        println!("Account created; run `daytask login --email {email}`");
    } else {
        println!("{message}");
    }
    Ok(())
}

pub async fn run_logout(context: &Context) -> Result<(), CliError> {
    let workspace = &context.workspace;
    if !workspace.identity().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }

    let queued =
        workspace.tasks().pending_len().await? + workspace.notes().pending_len().await?;
    workspace.sign_out().await?;
    println!("Signed out");
    if queued > 0 {
        println!("{queued} unsynced change(s) discarded");
    }
    Ok(())
}
