use aayojana_core::hooks::RoleResolver;
use aayojana_core::model::Role;
use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Session, create_spinner};
use crate::render::Render;

pub async fn run(session: &Session, grant: Option<Role>) -> Result<()> {
    let user = session.require_user()?;
    let resolver = RoleResolver::new(session.store.clone(), session.auth.clone());

    let spinner = create_spinner(format!("Loading roles for {user}"));
    resolver.refresh_roles().await;
    spinner.finish_and_clear();

    if let Some(role) = grant {
        if resolver.has_role(role) {
            println!("You already have the {} role", role.render());
        } else {
            resolver.add_role(role).await?;
            println!("{} {}", "Granted".green(), role.render());
        }
    }

    let roles = resolver.roles();
    println!("{}", user.bold());
    if roles.is_empty() {
        println!("   {}", "No roles".dimmed());
    }
    for role in roles {
        println!("   {}", role.render());
    }

    Ok(())
}
