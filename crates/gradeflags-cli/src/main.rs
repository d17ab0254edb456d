//! `gradeflags`: admin CLI for the grades feature toggles.
//!
//! # Usage
//!
//! ```
//! gradeflags status --course course-v1:edX+DemoX+2024
//! gradeflags global set on --all-courses
//! gradeflags course set course-v1:edX+DemoX+2024 off
//! gradeflags --config ~/.config/gradeflags/config.toml batch show
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use gradeflags_core::{
  course::CourseKey,
  toggle::{
    BatchSetting, CourseToggle, DEFAULT_BATCH_SIZE, GlobalToggle, NewBatchSetting,
    NewCourseToggle, NewGlobalToggle,
  },
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gradeflags", about = "Manage persistent-grades feature toggles")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the gradeflags server (default: http://localhost:8130).
  #[arg(long, env = "GRADEFLAGS_URL", global = true)]
  url: Option<String>,

  /// Admin username.
  #[arg(long, env = "GRADEFLAGS_USER", global = true)]
  user: Option<String>,

  /// Admin password (plaintext).
  #[arg(long, env = "GRADEFLAGS_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  /// Log HTTP requests to stderr.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Resolve whether persistent grades are enabled.
  Status {
    /// Course to check; repeat for several. Omit for the global answer.
    #[arg(long = "course", value_name = "COURSE_KEY")]
    courses: Vec<CourseKey>,
  },
  /// The platform-wide toggle.
  Global {
    #[command(subcommand)]
    action: GlobalAction,
  },
  /// Per-course toggles.
  Course {
    #[command(subcommand)]
    action: CourseAction,
  },
  /// The grade-computation batch setting.
  Batch {
    #[command(subcommand)]
    action: BatchAction,
  },
}

#[derive(Subcommand, Debug)]
enum GlobalAction {
  Show,
  History {
    #[arg(long)]
    limit: Option<usize>,
  },
  Set {
    state: Switch,
    /// Enable for every course regardless of per-course toggles.
    #[arg(long)]
    all_courses: bool,
  },
}

#[derive(Subcommand, Debug)]
enum CourseAction {
  /// Current toggle of every course that has one.
  List,
  Show { course_id: CourseKey },
  History { course_id: CourseKey },
  Set { course_id: CourseKey, state: Switch },
}

#[derive(Subcommand, Debug)]
enum BatchAction {
  Show,
  Set {
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    size: u32,
    /// Courses to compute grades for.
    courses: Vec<CourseKey>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
  On,
  Off,
}

impl Switch {
  fn enabled(self) -> bool { matches!(self, Switch::On) }
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

/// CLI flags override the config file, which overrides defaults.
fn api_config(args: &Args, file_cfg: ConfigFile) -> ApiConfig {
  let pick = |flag: &Option<String>, file: String| {
    flag.clone().or_else(|| (!file.is_empty()).then_some(file))
  };
  ApiConfig {
    base_url: pick(&args.url, file_cfg.url)
      .unwrap_or_else(|| "http://localhost:8130".to_string()),
    username: pick(&args.user, file_cfg.username).unwrap_or_default(),
    password: pick(&args.password, file_cfg.password).unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let default_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let config = api_config(&args, file_cfg);
  let changed_by = (!config.username.is_empty()).then(|| config.username.clone());
  let client = ApiClient::new(config)?;

  run(&client, args.command, changed_by).await
}

async fn run(client: &ApiClient, command: Command, changed_by: Option<String>) -> Result<()> {
  match command {
    Command::Status { courses } => match courses.as_slice() {
      [] => {
        let r = client.enabled(None).await?;
        println!("persistent grades: {}", on_off(r.enabled));
      }
      [one] => {
        let r = client.enabled(Some(one)).await?;
        let course_id = r.course_id.as_ref().unwrap_or(one);
        println!("{course_id}: {}", on_off(r.enabled));
      }
      many => {
        let r = client.enabled_bulk(many).await?;
        println!("persistent grades: {}", on_off(r.enabled));
        for (course_id, enabled) in &r.courses {
          println!("{course_id}: {}", on_off(*enabled));
        }
      }
    },

    Command::Global { action } => match action {
      GlobalAction::Show => match client.global().await? {
        Some(g) => print_global(&g),
        None => println!("no global toggle recorded (disabled)"),
      },
      GlobalAction::History { limit } => {
        for g in client.global_history(limit).await? {
          print_global(&g);
        }
      }
      GlobalAction::Set { state, all_courses } => {
        let input = NewGlobalToggle {
          changed_by,
          ..NewGlobalToggle::new(state.enabled()).for_all_courses(all_courses)
        };
        print_global(&client.record_global(&input).await?);
      }
    },

    Command::Course { action } => match action {
      CourseAction::List => {
        for c in client.courses().await? {
          print_course(&c);
        }
      }
      CourseAction::Show { course_id } => match client.course(&course_id).await? {
        Some(c) => print_course(&c),
        None => println!("no toggle recorded for {course_id} (disabled)"),
      },
      CourseAction::History { course_id } => {
        for c in client.course_history(&course_id).await? {
          print_course(&c);
        }
      }
      CourseAction::Set { course_id, state } => {
        let input = NewCourseToggle {
          changed_by,
          ..NewCourseToggle::new(course_id, state.enabled())
        };
        print_course(&client.record_course(&input).await?);
      }
    },

    Command::Batch { action } => match action {
      BatchAction::Show => match client.batch().await? {
        Some(b) => print_batch(&b),
        None => println!("no batch setting recorded (batch size {DEFAULT_BATCH_SIZE})"),
      },
      BatchAction::Set { size, courses } => {
        let course_ids = courses
          .iter()
          .map(CourseKey::as_str)
          .collect::<Vec<_>>()
          .join("\n");
        let input = NewBatchSetting { changed_by, ..NewBatchSetting::new(size, course_ids) };
        print_batch(&client.record_batch(&input).await?);
      }
    },
  }

  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn on_off(enabled: bool) -> &'static str {
  if enabled { "enabled" } else { "disabled" }
}

fn by(changed_by: &Option<String>) -> &str { changed_by.as_deref().unwrap_or("unknown") }

fn print_global(g: &GlobalToggle) {
  println!(
    "{g} (all courses: {}), changed {} by {}",
    g.enabled_for_all_courses,
    g.change_date.format("%Y-%m-%d %H:%M:%S UTC"),
    by(&g.changed_by),
  );
}

fn print_course(c: &CourseToggle) {
  println!(
    "{c}, changed {} by {}",
    c.change_date.format("%Y-%m-%d %H:%M:%S UTC"),
    by(&c.changed_by),
  );
}

fn print_batch(b: &BatchSetting) {
  println!(
    "batch size {} ({}), changed {} by {}",
    b.batch_size,
    on_off(b.enabled),
    b.change_date.format("%Y-%m-%d %H:%M:%S UTC"),
    by(&b.changed_by),
  );
  for course_id in b.course_ids.split_whitespace() {
    println!("  {course_id}");
  }
}
