const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

macro_rules! env_or {
  ($key:literal, $default:literal) => {
    option_env!($key).unwrap_or($default)
  };
}

/// Build metadata stamped in by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
  pub version: &'static str,
  /// Unix milliseconds, 0 when unknown.
  pub build_time: u64,
  pub branch: &'static str,
  pub commit: &'static str,
  pub profile: &'static str,
}

impl Default for BuildInfo {
  fn default() -> Self {
    Self {
      version: env!("CARGO_PKG_VERSION"),
      build_time: option_env!("BUILD_TIME")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0),
      branch: env_or!("GIT_BRANCH", "unknown"),
      commit: env_or!("GIT_COMMIT", "unknown"),
      profile: if cfg!(debug_assertions) {
        "debug"
      } else {
        "release"
      },
    }
  }
}

impl BuildInfo {
  pub fn commit_short(&self) -> &'static str {
    self.commit.get(..7).unwrap_or(self.commit)
  }
}

pub fn print_banner(info: &BuildInfo) {
  println!();
  println!("{GREEN}   _____ __                   __                    __{RESET}");
  println!("{GREEN}  / ___// /_____ _____ ____  / /_  ____ _____  ____/ /{RESET}");
  println!("{GREEN}  \\__ \\/ __/ __ `/ __ `/ _ \\/ __ \\/ __ `/ __ \\/ __  / {RESET}");
  println!("{GREEN} ___/ / /_/ /_/ / /_/ /  __/ / / / /_/ / / / / /_/ /  {RESET}");
  println!("{GREEN}/____/\\__/\\__,_/\\__, /\\___/_/ /_/\\__,_/_/ /_/\\__,_/   {RESET}");
  println!("{GREEN}               /____/{RESET}");
  println!("{DIM}========================================{RESET}");
  println!();

  print_row("Version", info.version, CYAN);
  print_row("Branch", info.branch, RESET);
  print_row("Commit", info.commit_short(), RESET);
  print_row("Profile", info.profile, YELLOW);
  println!();
}

fn print_row(label: &str, value: &str, color: &str) {
  println!("  {BOLD}{label:<14}{RESET}{color}{value}{RESET}");
}
