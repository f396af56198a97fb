//! `estate`: command-line client for the estate marketplace admin API.
//!
//! # Usage
//!
//! ```text
//! estate feedback --name Ada --email ada@example.com --message "Lovely site"
//! estate --url http://localhost:5000 --user root@example.com --password secret dashboard
//! estate --config ~/.config/estate/config.toml analytics transactions
//! ```

mod client;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use estate_core::{
  feedback::{FeedbackForm, FieldErrors},
  filter::DashboardQuery,
  user::{Role, UserStatus, UserUpdate},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "estate", about = "Client for the estate marketplace admin API")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the estate server (default: http://localhost:5000).
  #[arg(long, env = "ESTATE_URL")]
  url: Option<String>,

  /// Account email used for Basic authentication.
  #[arg(long, env = "ESTATE_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "ESTATE_PASSWORD")]
  password: Option<String>,

  /// Print raw JSON instead of a summary.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Send the public contact form.
  Feedback {
    #[arg(long, default_value = "")]
    name:    String,
    #[arg(long, default_value = "")]
    email:   String,
    #[arg(long, default_value = "")]
    message: String,
  },
  /// Show the admin dashboard, optionally filtered.
  Dashboard {
    #[arg(long)]
    user_date_from:     Option<String>,
    #[arg(long)]
    user_date_to:       Option<String>,
    #[arg(long)]
    property_date_from: Option<String>,
    #[arg(long)]
    property_date_to:   Option<String>,
    #[arg(long)]
    property_status:    Option<String>,
    #[arg(long)]
    user_role:          Option<String>,
  },
  /// List users, newest first.
  Users {
    /// Fetch page by page with this page size.
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Change a user's role and/or status.
  SetUser {
    id:     Uuid,
    #[arg(long, value_parser = parse_role)]
    role:   Option<Role>,
    #[arg(long, value_parser = parse_status)]
    status: Option<UserStatus>,
  },
  /// Permanently delete a user.
  DeleteUser { id: Uuid },
  /// Show marketplace analytics.
  Analytics {
    #[arg(value_enum)]
    view: AnalyticsView,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AnalyticsView {
  Properties,
  Transactions,
}

fn parse_role(s: &str) -> Result<Role, String> { Role::parse(s).map_err(|e| e.to_string()) }

fn parse_status(s: &str) -> Result<UserStatus, String> {
  UserStatus::parse(s).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:5000".to_string()),
    username: args
      .user
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  tracing::debug!(url = %api_config.base_url, "using server");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command, args.json).await
}

async fn run(client: &ApiClient, command: Command, json: bool) -> Result<()> {
  match command {
    Command::Feedback { name, email, message } => {
      let form = FeedbackForm { name, email, message };
      match client.submit_feedback(&form).await {
        Ok(reply) => println!("{reply}"),
        Err(e) => {
          if let Some(fields) = e.downcast_ref::<FieldErrors>() {
            render::field_errors(fields);
          }
          return Err(e);
        }
      }
    }

    Command::Dashboard {
      user_date_from,
      user_date_to,
      property_date_from,
      property_date_to,
      property_status,
      user_role,
    } => {
      let query = DashboardQuery {
        user_date_from,
        user_date_to,
        property_date_from,
        property_date_to,
        property_status,
        user_role,
      };
      let dashboard = client.dashboard(&query).await?;
      if json {
        render::json(&dashboard)?;
      } else {
        render::dashboard(&dashboard);
      }
    }

    Command::Users { limit: None } => {
      let users = client.list_users().await?;
      if json {
        render::json(&users)?;
      } else {
        render::users(&users);
      }
    }

    Command::Users { limit: Some(limit) } => {
      let mut cursor = None;
      loop {
        let page = client.list_users_page(limit, cursor.as_deref()).await?;
        if json {
          render::json(&page.users)?;
        } else {
          render::users(&page.users);
        }
        match page.next {
          Some(next) => cursor = Some(next),
          None => break,
        }
      }
    }

    Command::SetUser { id, role, status } => {
      let user = client.update_user(id, &UserUpdate { role, status }).await?;
      if json {
        render::json(&user)?;
      } else {
        render::users(std::slice::from_ref(&user));
      }
    }

    Command::DeleteUser { id } => {
      println!("{}", client.delete_user(id).await?);
    }

    Command::Analytics { view: AnalyticsView::Properties } => {
      let analytics = client.property_analytics().await?;
      if json {
        render::json(&analytics)?;
      } else {
        render::property_analytics(&analytics);
      }
    }

    Command::Analytics { view: AnalyticsView::Transactions } => {
      let analytics = client.transaction_analytics().await?;
      if json {
        render::json(&analytics)?;
      } else {
        render::transaction_analytics(&analytics);
      }
    }
  }
  Ok(())
}
