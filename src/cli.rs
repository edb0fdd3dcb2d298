// Terminal front end
// Wires the session layer together once and dispatches a single command

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use serde::Serialize;
use std::sync::Arc;

use crate::api;
use crate::auth::permissions::{self, RouteDecision};
use crate::auth::{
    LoginRequest, MemoryTokenStore, RefreshCoordinator, SessionHandle, SqliteTokenStore,
    TokenStore,
};
use crate::config::{Command, Config, TokenStorage};
use crate::error::ApiError;
use crate::http_client::ApiClient;
use crate::models::{MeUpdate, User};

/// Build the client stack described by `config`
pub fn build_session(config: &Config) -> Result<SessionHandle> {
    let tokens: Arc<dyn TokenStore> = match config.token_storage {
        TokenStorage::Sqlite(ref path) => {
            tracing::debug!("Using token database: {}", path.display());
            Arc::new(SqliteTokenStore::open(path)?)
        }
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
    };

    let api = ApiClient::new(
        &config.api_base_url,
        tokens,
        Arc::new(RefreshCoordinator::new()),
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;

    Ok(SessionHandle::new(Arc::new(api)))
}

/// Run one command against the API
pub async fn run(session: &SessionHandle, command: Command) -> Result<()> {
    if command.requires_session() {
        session.bootstrap().await;
        if permissions::route_guard(&session.session()) != RouteDecision::Render {
            anyhow::bail!("Not logged in. Run `parko login` first.");
        }
    }

    let api = session.api().as_ref();

    match command {
        Command::Login { username, password } => {
            let credentials = prompt_credentials(username, password)?;
            let user = session
                .login(&credentials)
                .await
                .context("Login failed")?;
            println!("Logged in as {} ({})", user.display_name(), user.role);
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = current_user(session)?;
            print_user(&user);
        }
        Command::Refresh => {
            session.refresh().await.context("Token refresh failed")?;
            println!("Tokens refreshed");
        }
        Command::SetLanguage { language } => {
            let update = MeUpdate {
                language: Some(language),
                ..Default::default()
            };
            let user = session
                .update_profile(&update)
                .await
                .map_err(explain)?;
            println!("Language set to {}", user.language);
        }
        Command::Cars(args) => match args.id {
            Some(id) => print_json(&api::cars::get(api, id).await.map_err(explain)?)?,
            None => {
                let params = api::cars::ListCarsParams {
                    page: args.page,
                    search: args.search,
                    status: args.status,
                    brand: args.brand,
                    ..Default::default()
                };
                print_json(&api::cars::list(api, &params).await.map_err(explain)?)?;
            }
        },
        Command::Fuel(args) => {
            let params = api::fuel::ListFuelParams {
                page: args.page,
                car: args.car,
                year: args.year,
                month: args.month,
                ..Default::default()
            };
            print_json(&api::fuel::list(api, &params).await.map_err(explain)?)?;
        }
        Command::Insurances(args) => {
            let params = api::insurances::ListInsurancesParams {
                page: args.page,
                car: args.car,
                search: args.search,
                ..Default::default()
            };
            print_json(&api::insurances::list(api, &params).await.map_err(explain)?)?;
        }
        Command::Inspections(args) => {
            let params = api::inspections::ListInspectionsParams {
                page: args.page,
                car: args.car,
                search: args.search,
                ..Default::default()
            };
            print_json(&api::inspections::list(api, &params).await.map_err(explain)?)?;
        }
        Command::Users { page } => {
            let params = api::users::ListUsersParams { page };
            print_json(&api::users::list(api, &params).await.map_err(explain)?)?;
        }
        Command::Report(args) => {
            if !permissions::can_view_reports(session.user().as_ref()) {
                anyhow::bail!("Your role cannot view cost reports");
            }
            let params = api::reports::MaintenanceCostsParams {
                from: args.from,
                to: args.to,
                car: args.car,
            };
            let report = api::reports::maintenance_costs(api, &params)
                .await
                .map_err(explain)?;
            print_json(&report)?;
        }
    }

    Ok(())
}

fn current_user(session: &SessionHandle) -> Result<User> {
    session.user().context("No user in session")
}

fn prompt_credentials(username: Option<String>, password: Option<String>) -> Result<LoginRequest> {
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    if username.trim().is_empty() || password.is_empty() {
        anyhow::bail!("Username and password cannot be empty");
    }

    Ok(LoginRequest::new(username.trim(), password))
}

/// Turn API errors into messages a terminal user can act on
fn explain(err: ApiError) -> anyhow::Error {
    if err.is_forbidden() {
        anyhow::anyhow!("Not allowed for your role ({})", err)
    } else if err.is_unauthorized() {
        anyhow::anyhow!("Session expired. Run `parko login` again.")
    } else {
        anyhow::Error::new(err)
    }
}

fn print_user(user: &User) {
    println!("  User:      {} ({})", user.display_name(), user.username);
    println!("  Role:      {}", user.role);
    println!("  Language:  {}", user.language);
    if let Some(ref company) = user.company_name {
        println!("  Company:   {}", company);
    }
    println!(
        "  Can edit cars: {}, users: {}, view reports: {}",
        yes_no(permissions::can_edit_cars(Some(user))),
        yes_no(permissions::can_edit_users(Some(user))),
        yes_no(permissions::can_view_reports(Some(user)))
    );
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
