//! Command implementations

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use reqwest::Method;
use tracing::{debug, instrument};
use viaggi_session::{
    Credentials, FileStore, HttpExchange, MemoryStore, Registration, Session, SessionManager,
    SqliteStore, Store,
};

use crate::config::{Config, Storage};
use crate::opt::Command;

/// Session manager the commands run against
pub type Manager = SessionManager<Store, HttpExchange>;

/// Builds the session manager described by the configuration
pub async fn session_manager(config: &Config) -> Result<Manager> {
    let store: Store = match &config.storage {
        Storage::Memory => MemoryStore::new().into(),
        Storage::File { path } => {
            let dir = path.clone().unwrap_or_else(Storage::default_dir);
            debug!(dir = ?dir, "Using file token storage");
            FileStore::new(dir).into()
        }
        Storage::Sqlite {
            path,
            max_connections,
            migrate,
        } => SqliteStore::open(path, *max_connections, *migrate)
            .await
            .wrap_err_with(|| format!("Cannot open token database {}", path.display()))?
            .into(),
    };

    let exchange = HttpExchange::new(config.api.clone())?;
    Ok(SessionManager::new(store, exchange, config.session.clone()))
}

/// Executes single command
#[instrument(skip_all)]
pub async fn run(manager: &Manager, command: Command) -> Result<()> {
    manager.initialize().await;

    match command {
        Command::Login { email, password } => {
            let credentials = Credentials::new(email, password);
            match manager.login(&credentials).await {
                Ok(session) => print_session(&session),
                Err(err) => {
                    let message = err.message(&manager.settings().fallback_message);
                    return Err(err).wrap_err(message);
                }
            }
        }

        Command::Logout => {
            manager.logout().await;
            println!("Logged out");
        }

        Command::Status => print_session(&manager.revalidate().await),

        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let registration = Registration {
                first_name,
                last_name,
                email,
                password,
            };
            registration.validate(&confirm_password)?;
            manager.exchange().register(&registration).await?;
            println!("Registered {}, you can log in now", registration.email);
        }

        Command::Get { path } => {
            let request = manager.authorize(manager.exchange().request(Method::GET, &path)?);
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                bail!("{path} answered with {status}: {body}");
            }
            println!("{body}");
        }
    }

    Ok(())
}

fn print_session(session: &Session) {
    if !session.is_authenticated() {
        println!("Not logged in");
        return;
    }

    println!("Logged in");
    if let Some(user_id) = session.user_id() {
        println!("  user:    {user_id}");
    }
    if let Some(role) = session.role() {
        println!("  role:    {role}");
    }
    if let Some(expires_at) = session.expires_at() {
        println!("  expires: {expires_at}");
    }
}
