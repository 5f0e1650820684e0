use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "viaggi", about = "Viaggi travel storefront session client")]
pub struct Opt {
    /// Config file path
    #[arg(short, long, value_parser, default_value = "config.toml")]
    pub config: clio::Input,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Logs in, persisting the session token
    Login {
        /// Account e-mail
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "VIAGGI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forgets the persisted session
    Logout,

    /// Shows the current session
    Status,

    /// Registers a new account
    Register {
        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Account e-mail
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "VIAGGI_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeated password
        #[arg(long, env = "VIAGGI_PASSWORD_CONFIRM", hide_env_values = true)]
        confirm_password: String,
    },

    /// Sends an authorized GET request to the backend and prints the response
    Get {
        /// Resource path, eg. `/prenotazioni/mie`
        path: String,
    },
}
