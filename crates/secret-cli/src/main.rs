//! secret-protect - protect, unprotect and re-key secrets from the shell
//!
//! Protected output is a JSON envelope on stdout. Passwords come from the
//! command line, the environment, or an interactive prompt.

mod envelope;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use tracing::{debug, info};
use zeroize::Zeroizing;

use envelope::Envelope;
use secret_core::facility::{facility_for, install_default_facility};
use secret_core::{
    AsciiCategory, PasswordOptions, PasswordProtect, ProtectedValue, ProtectionScope,
    SettingsManager, RAND,
};

/// Secret protection toolkit
#[derive(Parser, Debug)]
#[command(name = "secret-protect")]
#[command(author = "Thrzn41")]
#[command(version = "0.1.0")]
#[command(about = "Protect secrets with a password or the local user/machine scope")]
struct Args {
    /// Settings directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random ASCII password
    Password {
        #[arg(long, default_value = "16")]
        length: usize,
        #[arg(long)]
        no_upper: bool,
        #[arg(long)]
        no_lower: bool,
        #[arg(long)]
        no_digits: bool,
    },

    /// Protect text (argument or stdin) and print the envelope
    Protect {
        /// Text to protect; read from stdin when omitted
        #[arg(long)]
        text: Option<String>,

        #[arg(long, value_enum, default_value = "password")]
        with: Method,

        /// Scope for local protection
        #[arg(long, value_enum, default_value = "current-user")]
        scope: Scope,

        #[arg(long, env = "SECRET_PROTECT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Read an envelope (file or stdin) and print the plaintext
    Unprotect {
        envelope: Option<PathBuf>,

        #[arg(long, env = "SECRET_PROTECT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Re-key a password envelope under a new password
    Reprotect {
        envelope: Option<PathBuf>,

        #[arg(long, env = "SECRET_PROTECT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long, env = "SECRET_PROTECT_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Print the effective settings
    Settings {
        /// Write the effective settings to the settings file
        #[arg(long)]
        write: bool,

        /// Delete the settings file and fall back to defaults
        #[arg(long, conflicts_with = "write")]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    Password,
    Local,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scope {
    CurrentUser,
    LocalMachine,
}

impl From<Scope> for ProtectionScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::CurrentUser => ProtectionScope::CurrentUser,
            Scope::LocalMachine => ProtectionScope::LocalMachine,
        }
    }
}

fn config_dir(args: &Args) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(dir) = &args.config_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("com", "thrzn41", "secret-protect")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| "Could not determine config directory".into())
}

fn password_or_prompt(
    password: Option<String>,
    prompt: &str,
) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    match password {
        Some(password) => Ok(Zeroizing::new(password)),
        None => Ok(Zeroizing::new(rpassword::prompt_password(prompt)?)),
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    let mut input = Zeroizing::new(String::new());
    match path {
        Some(path) => input.push_str(&std::fs::read_to_string(path)?),
        None => {
            io::stdin().read_to_string(&mut input)?;
        }
    }
    Ok(input)
}

fn read_envelope(path: Option<&PathBuf>) -> Result<Envelope, Box<dyn std::error::Error>> {
    let input = read_input(path)?;
    Ok(serde_json::from_str(&input)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries envelopes and plaintext, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let config_dir = config_dir(&args)?;
    let mut settings = SettingsManager::new(&config_dir)
        .map_err(|e| format!("Failed to load settings: {}", e))?;
    debug!("Using settings from {:?}", config_dir);

    match args.command {
        Command::Password {
            length,
            no_upper,
            no_lower,
            no_digits,
        } => {
            let mut category = AsciiCategory::NONE;
            if !no_upper {
                category |= AsciiCategory::UPPER_ALPHABET;
            }
            if !no_lower {
                category |= AsciiCategory::LOWER_ALPHABET;
            }
            if !no_digits {
                category |= AsciiCategory::NUMBER;
            }
            if category == AsciiCategory::NONE {
                return Err("At least one character category is required".into());
            }

            let chars = Zeroizing::new(RAND.ascii_chars(length, category));
            let password: Zeroizing<String> = Zeroizing::new(chars.iter().collect());
            println!("{}", password.as_str());
        }

        Command::Protect {
            text,
            with,
            scope,
            password,
        } => {
            let text = match text {
                Some(text) => Zeroizing::new(text),
                None => read_input(None)?,
            };
            let text = text.trim_end_matches(['\r', '\n']);

            let envelope = match with {
                Method::Password => {
                    let password = password_or_prompt(password, "Password: ")?;
                    Envelope::seal_with_password(
                        text,
                        password.as_bytes(),
                        settings.get().salt_source(),
                        PasswordOptions::from_settings(settings.get()),
                    )?
                }
                Method::Local => {
                    install_facility(&settings)?;
                    Envelope::seal_local(text, settings.get().entropy_source(), scope.into())?
                }
            };

            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }

        Command::Unprotect { envelope, password } => {
            let envelope = read_envelope(envelope.as_ref())?;

            let plain = if envelope.needs_password() {
                let password = password_or_prompt(password, "Password: ")?;
                envelope
                    .open_with_password(password.as_bytes())?
                    .ok_or("Not a password envelope")?
                    .decrypt_to_secret_string()
            } else {
                install_facility(&settings)?;
                envelope
                    .open_local()?
                    .ok_or("Not a local envelope")?
                    .decrypt_to_secret_string()
            }
            .map_err(|e| format!("Failed to unprotect: {}", e))?;

            println!("{}", plain.expose());
        }

        Command::Reprotect {
            envelope,
            password,
            new_password,
        } => {
            let envelope = read_envelope(envelope.as_ref())?;
            if !envelope.needs_password() {
                return Err("Only password envelopes can be re-keyed".into());
            }

            let password = password_or_prompt(password, "Current password: ")?;
            let source = envelope
                .open_with_password(password.as_bytes())?
                .ok_or("Not a password envelope")?;

            // Check the old password before asking for a new one
            source
                .decrypt()
                .map_err(|e| format!("Failed to unprotect: {}", e))?;

            let new_password = password_or_prompt(new_password, "New password: ")?;
            let target = PasswordProtect::new(
                new_password.as_bytes(),
                settings.get().salt_source(),
                PasswordOptions::from_settings(settings.get()),
            )?;
            let converted = source.convert_to(target)?;

            info!("Re-keyed envelope");
            println!(
                "{}",
                serde_json::to_string_pretty(&Envelope::from_password_protected(&converted)?)?
            );
        }

        Command::Settings { write, reset } => {
            if reset {
                settings.reset().await?;
            } else if write {
                settings.save().await?;
            }
            println!("{}", serde_json::to_string_pretty(settings.get())?);
        }
    }

    Ok(())
}

fn install_facility(settings: &SettingsManager) -> Result<(), Box<dyn std::error::Error>> {
    let facility = facility_for(settings.get())?;
    info!("Local protection via {}", facility.backend_name());
    if install_default_facility(facility).is_err() {
        debug!("Default facility already installed");
    }
    Ok(())
}
