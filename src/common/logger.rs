use std::{
  fs::{self, File, OpenOptions},
  io::{self, BufRead, BufReader, Write},
  path::Path,
  sync::{Arc, Mutex, OnceLock},
};

use tracing_subscriber::{EnvFilter, fmt::{self, time::LocalTime}, prelude::*};

use crate::configs::Config;

pub(crate) static GLOBAL_FILE_WRITER: OnceLock<CircularFileWriter> = OnceLock::new();

/// `println!` that is also mirrored into the log file, for output produced
/// before the subscriber exists.
#[macro_export]
macro_rules! log_println {
    () => {{
        std::println!();
        $crate::common::logger::append_to_file_raw("\n");
    }};
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        std::println!("{}", msg);
        $crate::common::logger::append_to_file_raw(&format!("{}\n", msg));
    }};
}

pub fn append_to_file_raw(msg: &str) {
  if let Some(mut writer) = GLOBAL_FILE_WRITER.get().cloned() {
    let clean_msg = strip_ansi_escapes(msg);
    let _ = writer.write_all(clean_msg.as_bytes());
  }
}

fn strip_ansi_escapes(s: &str) -> String {
  let mut result = String::with_capacity(s.len());
  let mut in_escape = false;
  for c in s.chars() {
    if c == '\x1b' {
      in_escape = true;
    } else if in_escape {
      if c.is_ascii_alphabetic() {
        in_escape = false;
      }
    } else {
      result.push(c);
    }
  }
  result
}

/// Builds the filter directive from `[logging]`: the base level followed by
/// any extra per-target filters.
pub fn filter_directive(config: &Config) -> String {
  let level = config.logging.level.as_deref().unwrap_or("info");
  match config.logging.filters.as_deref() {
    Some(filters) if !filters.is_empty() => format!("{},{}", level, filters),
    _ => level.to_string(),
  }
}

type TimeFormat = &'static [time::format_description::BorrowedFormatItem<'static>];

fn local_timer() -> LocalTime<TimeFormat> {
  LocalTime::new(time::macros::format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
  ))
}

pub fn init(config: &Config) {
  // RUST_LOG wins over the configured directive
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

  let stdout_layer = fmt::layer()
    .with_timer(local_timer())
    .with_target(true)
    .with_thread_ids(true)
    .with_line_number(true)
    .with_file(false);

  let file_layer = config.logging.file.as_ref().map(|file_config| {
    if let Some(parent) = Path::new(&file_config.path).parent() {
      if let Err(e) = fs::create_dir_all(parent) {
        eprintln!("Failed to create log directory: {}", e);
      }
    }

    let writer = CircularFileWriter::new(file_config.path.clone(), file_config.max_lines);
    let _ = GLOBAL_FILE_WRITER.set(writer.clone());
    fmt::layer()
      .with_writer(writer)
      .with_timer(local_timer())
      .with_target(true)
      .with_thread_ids(true)
      .with_line_number(true)
      .with_file(false)
      .with_ansi(false)
  });

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stdout_layer)
    .with(file_layer)
    .init();
}

/// Appends to a file and periodically prunes old lines to stay under a
/// maximum line count.
#[derive(Clone)]
pub(crate) struct CircularFileWriter {
  path: String,
  max_lines: u32,
  state: Arc<Mutex<WriterState>>,
}

struct WriterState {
  lines_since_prune: u32,
}

impl CircularFileWriter {
  fn new(path: String, max_lines: u32) -> Self {
    Self {
      path,
      max_lines,
      state: Arc::new(Mutex::new(WriterState {
        lines_since_prune: 0,
      })),
    }
  }

  fn prune(&self) -> io::Result<()> {
    if !Path::new(&self.path).exists() {
      return Ok(());
    }

    let reader = BufReader::new(File::open(&self.path)?);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    if lines.len() > self.max_lines as usize {
      let start = lines.len() - self.max_lines as usize;
      let mut file = File::create(&self.path)?;
      for line in &lines[start..] {
        writeln!(file, "{}", line)?;
      }
    }
    Ok(())
  }
}

impl io::Write for CircularFileWriter {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)?;

    file.write_all(buf)?;

    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
    state.lines_since_prune += buf.iter().filter(|&&b| b == b'\n').count() as u32;

    // 10% of max_lines, never less than 50
    let prune_threshold = (self.max_lines / 10).max(50);
    if state.lines_since_prune >= prune_threshold {
      if let Err(e) = self.prune() {
        eprintln!("Failed to prune log file: {}", e);
      }
      state.lines_since_prune = 0;
    }

    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<'a> fmt::MakeWriter<'a> for CircularFileWriter {
  type Writer = Self;

  fn make_writer(&'a self) -> Self::Writer {
    self.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::configs::LoggingConfig;

  #[test]
  fn test_strip_ansi_escapes() {
    assert_eq!(strip_ansi_escapes("\x1b[32mINFO\x1b[0m ready"), "INFO ready");
  }

  #[test]
  fn test_filter_directive_defaults_to_info() {
    let config = Config::default();
    assert_eq!(filter_directive(&config), "info");
  }

  #[test]
  fn test_filter_directive_appends_filters() {
    let config = Config {
      logging: LoggingConfig {
        level: Some("debug".into()),
        filters: Some("hyper=warn,reqwest=warn".into()),
        file: None,
      },
      ..Config::default()
    };
    assert_eq!(filter_directive(&config), "debug,hyper=warn,reqwest=warn");
  }

  #[test]
  fn test_circular_writer_prunes_to_max_lines() {
    let path = std::env::temp_dir().join(format!("stagehand-log-{}.log", std::process::id()));
    let _ = fs::remove_file(&path);
    let mut writer = CircularFileWriter::new(path.to_string_lossy().into_owned(), 20);

    for i in 0..60 {
      writeln!(writer, "line {}", i).unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert!(lines.len() <= 20 + 10);
    assert_eq!(lines.last(), Some(&"line 59"));
    let _ = fs::remove_file(&path);
  }
}
